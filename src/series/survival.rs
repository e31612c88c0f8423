use serde::Serialize;

use crate::chart::{AxisRange, DashStyle, LineSeries, LineStyle, Marker, XyPoint};
use crate::criteria::SelectionCriteria;
use crate::error::{DashError, Result};
use crate::filter::filter;
use crate::schema::survival;
use crate::series::{capitalize, require_rows};
use crate::store::RecordTable;

const DEFAULT_STAGE_COLOR: &str = "#1f77b4";
const DEFAULT_MAX_TIME: f64 = 5.0;

/// Line dash by the region's position in the user's selection.
const REGION_DASHES: [DashStyle; 3] = [DashStyle::Solid, DashStyle::ShortDash, DashStyle::LongDash];

fn stage_color(stage: &str) -> &'static str {
    match stage {
        "stage1" => "#00AA00",
        "stage2" => "#FF6600",
        "stage3" => "#CC0000",
        "stage4" => "#6600CC",
        _ => DEFAULT_STAGE_COLOR,
    }
}

fn stage_marker(stage: &str) -> Marker {
    match stage {
        "stage2" => Marker::Square,
        "stage3" => Marker::Diamond,
        "stage4" => Marker::TriangleUp,
        _ => Marker::Circle,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SurvivalLine {
    pub region: String,
    pub stage: String,
    pub series: LineSeries,
}

#[derive(Debug, Clone, Serialize)]
pub struct SurvivalChart {
    pub title: String,
    pub site: String,
    /// Region-major, then stage, both in selection order
    pub lines: Vec<SurvivalLine>,
    pub x_range: AxisRange,
    pub y_range: AxisRange,
    pub x_title: String,
    pub y_title: String,
}

struct SurvivalRow {
    region: String,
    stage: String,
    time: f64,
    pct: f64,
}

/// One line per selected (region, stage) pair that has rows.
pub fn build_survival(table: &RecordTable, criteria: &SelectionCriteria) -> Result<SurvivalChart> {
    let criteria = criteria.clone().normalized();
    let site = match criteria.require_site() {
        Ok(site) if !criteria.regions.is_empty() && !criteria.stages.is_empty() => site,
        _ => {
            return Err(DashError::MissingCriteria(
                "region(s), cancer type, and stage(s)".into(),
            ))
        }
    };

    let rows = filter(table, &criteria)?;
    require_rows(&rows)?;

    let rows: Vec<SurvivalRow> = rows
        .texts(survival::REGION)?
        .into_iter()
        .zip(rows.texts(survival::STAGE)?)
        .zip(rows.floats(survival::TIME_YEARS)?)
        .zip(rows.floats(survival::SURVIVAL_PCT)?)
        .filter_map(|(((region, stage), time), pct)| {
            Some(SurvivalRow {
                region: region?,
                stage: stage?,
                time: time?,
                pct: pct?,
            })
        })
        .collect();

    let mut lines = Vec::new();
    for (idx, selected) in criteria.regions.iter().enumerate() {
        let dash = REGION_DASHES.get(idx).copied().unwrap_or(DashStyle::Solid);
        for stage in &criteria.stages {
            let mut points: Vec<XyPoint> = rows
                .iter()
                .filter(|r| r.region == selected.value() && &r.stage == stage)
                .map(|r| XyPoint { x: r.time, y: r.pct })
                .collect();
            if points.is_empty() {
                continue;
            }
            points.sort_by(|a, b| a.x.total_cmp(&b.x));

            let style = LineStyle::new(stage_color(stage), dash, 2).with_marker(stage_marker(stage));
            lines.push(SurvivalLine {
                region: selected.value().to_string(),
                stage: stage.clone(),
                series: LineSeries::new(
                    format!("{} - {}", capitalize(stage), selected.label()),
                    points,
                    style,
                ),
            });
        }
    }

    let max_time = rows
        .iter()
        .map(|r| r.time)
        .reduce(f64::max)
        .unwrap_or(DEFAULT_MAX_TIME);

    Ok(SurvivalChart {
        title: format!("Survival Curves for {} Cancer", capitalize(site)),
        site: site.to_string(),
        lines,
        x_range: AxisRange {
            min: 0.0,
            max: max_time + 0.5,
        },
        y_range: AxisRange {
            min: 0.0,
            max: 105.0,
        },
        x_title: "Survival time (Years)".to_string(),
        y_title: "Survival rate (%)".to_string(),
    })
}
