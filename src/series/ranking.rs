use serde::Serialize;

use crate::chart::AxisRange;
use crate::criteria::{SelectionCriteria, YearSelection};
use crate::error::{DashError, Result};
use crate::filter::filter;
use crate::schema::{incidence, values};
use crate::store::RecordTable;
use crate::trend::round2;

const MALE_FILL: &str = "rgba(31, 119, 180, 0.7)";
const MALE_LINE: &str = "rgba(31, 119, 180, 1.0)";
const FEMALE_FILL: &str = "rgba(255, 127, 14, 0.7)";
const FEMALE_LINE: &str = "rgba(255, 127, 14, 1.0)";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedBar {
    pub site: String,
    pub rate: f64,
    /// Bar text, 2 decimals
    pub label: String,
}

/// One side of the paired bar layout, highest rate first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedSeries {
    pub name: String,
    pub fill_color: String,
    pub line_color: String,
    pub bars: Vec<RankedBar>,
}

impl RankedSeries {
    pub fn sites(&self) -> Vec<&str> {
        self.bars.iter().map(|b| b.site.as_str()).collect()
    }

    fn max_rate(&self) -> Option<f64> {
        self.bars.iter().map(|b| b.rate).reduce(f64::max)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RankingChart {
    pub title: String,
    pub year: i32,
    pub male: RankedSeries,
    pub female: RankedSeries,
    /// Shared by both panels
    pub x_range: AxisRange,
    pub x_title: String,
}

struct SiteRate {
    site: String,
    sex: String,
    rate: f64,
}

fn top_for_sex(rows: &[SiteRate], sex: &str, top_n: usize) -> Vec<RankedBar> {
    let mut picked: Vec<&SiteRate> = rows.iter().filter(|r| r.sex == sex).collect();
    // sort_by is stable, so equal rates keep row order
    picked.sort_by(|a, b| b.rate.total_cmp(&a.rate));
    picked
        .into_iter()
        .take(top_n)
        .map(|r| RankedBar {
            site: r.site.clone(),
            rate: r.rate,
            label: format!("{:.2}", round2(r.rate)),
        })
        .collect()
}

/// Top `top_n` sites per sex for one year, "All sites" excluded.
///
/// Without a year the latest year in the table is used.
pub fn build_top_cancers(
    table: &RecordTable,
    criteria: &SelectionCriteria,
    top_n: usize,
) -> Result<RankingChart> {
    let year = match criteria.year {
        YearSelection::Specific(year) => year,
        YearSelection::All => table
            .years(incidence::YEAR)?
            .into_iter()
            .flatten()
            .max()
            .ok_or(DashError::EmptySelection)?,
    };

    let rows = filter(table, &SelectionCriteria::new().with_year(year))?;
    let rows: Vec<SiteRate> = rows
        .texts(incidence::SITE)?
        .into_iter()
        .zip(rows.texts(incidence::SEX)?)
        .zip(rows.floats(incidence::RATE)?)
        .filter_map(|((site, sex), rate)| {
            let site = site?;
            if site == values::ALL_SITES {
                return None;
            }
            Some(SiteRate {
                site,
                sex: sex?,
                rate: rate?,
            })
        })
        .collect();

    let male = RankedSeries {
        name: values::MALE.to_string(),
        fill_color: MALE_FILL.to_string(),
        line_color: MALE_LINE.to_string(),
        bars: top_for_sex(&rows, values::MALE, top_n),
    };
    let female = RankedSeries {
        name: values::FEMALE.to_string(),
        fill_color: FEMALE_FILL.to_string(),
        line_color: FEMALE_LINE.to_string(),
        bars: top_for_sex(&rows, values::FEMALE, top_n),
    };

    // One empty side falls back to the other's maximum.
    let max_rate = match (male.max_rate(), female.max_rate()) {
        (Some(m), Some(f)) => m.max(f),
        (Some(m), None) => m,
        (None, Some(f)) => f,
        (None, None) => return Err(DashError::EmptySelection),
    };

    Ok(RankingChart {
        title: format!("Top {top_n} Cancers by ASR - Male vs Female ({year})"),
        year,
        male,
        female,
        x_range: AxisRange::padded(max_rate),
        x_title: "Age-Standardized Rate (ASR)".to_string(),
    })
}
