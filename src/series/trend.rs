use std::collections::BTreeMap;
use std::fmt::Write as FmtWrite;

use serde::Serialize;

use crate::chart::{AxisRange, DashStyle, LineSeries, LineStyle, Marker, XyPoint};
use crate::criteria::{SelectionCriteria, SexSelection};
use crate::error::{DashError, Result};
use crate::filter::{combine_sexes, filter};
use crate::schema::incidence;
use crate::store::RecordTable;
use crate::trend::{round3, TrendModel};

const HISTORICAL_COLOR: &str = "#1f77b4";
const FITTED_COLOR: &str = "#ff7f0e";
const PROJECTION_COLOR: &str = "#2ca02c";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YearValue {
    pub year: i32,
    pub value: f64,
}

/// Historical rates, the fitted line and its projection to future years.
#[derive(Debug, Clone, Serialize)]
pub struct TrendChart {
    pub title: String,
    pub site: String,
    pub sex: String,
    pub historical: LineSeries,
    pub fitted: LineSeries,
    /// Legend-less segment from the last fitted point to the first projection
    pub connector: Option<LineSeries>,
    pub projection: LineSeries,
    pub r_squared: f64,
    pub predictions: Vec<YearValue>,
    pub summary: String,
    pub x_title: String,
    pub y_title: String,
    pub y_range: AxisRange,
}

/// One `(year, rate)` pair per year for the selected site and sex.
///
/// Rates are rounded to 3 decimals, summed across sexes for `Both`, then
/// averaged per year.
pub fn yearly_rates(table: &RecordTable, site: &str, sex: &SexSelection) -> Result<Vec<(i32, f64)>> {
    let selection = SelectionCriteria::new().with_site(site).with_sex(sex.clone());
    let mut rows = filter(table, &selection)?;
    if *sex == SexSelection::Both {
        rows = combine_sexes(&rows)?;
    }

    let years = rows.years(incidence::YEAR)?;
    let rates = rows.floats(incidence::RATE)?;

    let mut by_year: BTreeMap<i32, (f64, usize)> = BTreeMap::new();
    for (year, rate) in years.into_iter().zip(rates) {
        if let (Some(year), Some(rate)) = (year, rate) {
            let entry = by_year.entry(year).or_insert((0.0, 0));
            entry.0 += round3(rate);
            entry.1 += 1;
        }
    }
    Ok(by_year
        .into_iter()
        .map(|(year, (sum, n))| (year, sum / n as f64))
        .collect())
}

fn to_points(pairs: impl Iterator<Item = (i32, f64)>) -> Vec<XyPoint> {
    pairs.map(|(x, y)| XyPoint { x: x as f64, y }).collect()
}

pub fn build_trend(
    table: &RecordTable,
    criteria: &SelectionCriteria,
    future_years: &[i32],
) -> Result<TrendChart> {
    let (site, sex) = match (criteria.require_site(), criteria.require_sex()) {
        (Ok(site), Ok(sex)) => (site, sex),
        _ => return Err(DashError::MissingCriteria("both sex and cancer type".into())),
    };

    let historical = yearly_rates(table, site, sex)?;
    if historical.is_empty() {
        return Err(DashError::EmptySelection);
    }
    let model = TrendModel::fit(&historical)?;

    let years: Vec<i32> = historical.iter().map(|(y, _)| *y).collect();
    let fitted = model.predict(&years);
    let projected = model.predict(future_years);
    let r_squared = model.r_squared(&historical);

    let historical_series = LineSeries::new(
        "Historical ASR",
        to_points(historical.iter().copied()),
        LineStyle::new(HISTORICAL_COLOR, DashStyle::Solid, 3).with_marker(Marker::Circle),
    );
    let fitted_series = LineSeries::new(
        "Fitted Model",
        to_points(years.iter().copied().zip(fitted.iter().copied())),
        LineStyle::new(FITTED_COLOR, DashStyle::Dash, 2),
    );
    let projection_series = LineSeries::new(
        "Future Predictions",
        to_points(future_years.iter().copied().zip(projected.iter().copied())),
        LineStyle::new(PROJECTION_COLOR, DashStyle::Dot, 3).with_marker(Marker::Diamond),
    );

    let connector = match (years.last().zip(fitted.last()), future_years.first().zip(projected.first())) {
        (Some((&y0, &v0)), Some((&y1, &v1))) => {
            let mut series = LineSeries::new(
                "Connection",
                vec![
                    XyPoint { x: y0 as f64, y: v0 },
                    XyPoint { x: y1 as f64, y: v1 },
                ],
                LineStyle::new(PROJECTION_COLOR, DashStyle::Dot, 2),
            );
            series.show_in_legend = false;
            Some(series)
        }
        _ => None,
    };

    let predictions: Vec<YearValue> = future_years
        .iter()
        .zip(&projected)
        .map(|(&year, &value)| YearValue { year, value })
        .collect();

    let mut summary = format!("R² Score: {r_squared:.3}\n\nFuture Predictions:\n");
    for p in &predictions {
        let _ = writeln!(summary, "Year {}: {:.2}", p.year, p.value);
    }

    let max_rate = historical
        .iter()
        .map(|(_, r)| *r)
        .chain(projected.iter().copied())
        .fold(0.0_f64, f64::max);

    Ok(TrendChart {
        title: format!(
            "Cancer incidence trend with future predictions for {} and ({}) sex",
            site,
            sex.label()
        ),
        site: site.to_string(),
        sex: sex.label().to_string(),
        historical: historical_series,
        fitted: fitted_series,
        connector,
        projection: projection_series,
        r_squared,
        predictions,
        summary,
        x_title: "Year".to_string(),
        y_title: "ASR (per 100,000)".to_string(),
        y_range: AxisRange::padded(max_rate),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TableKind;
    use polars::prelude::*;

    fn table() -> RecordTable {
        let raw = df!(
            "Population" => ["Thailand"; 7],
            "Sex" => ["Male", "Female", "Male", "Female", "Male", "Female", "Male"],
            "Site" => ["Lung", "Lung", "Lung", "Lung", "Lung", "Lung", "Liver"],
            "Year" => ["2018", "2018", "2019", "2019", "2020", "2020", "2018"],
            "ASR World" => ["6", "4", "7", "5", "8", "6", "30"]
        )
        .unwrap();
        RecordTable::from_frame(TableKind::Incidence, raw).unwrap()
    }

    #[test]
    fn both_sexes_sum_per_year() {
        let rates = yearly_rates(&table(), "Lung", &SexSelection::Both).unwrap();
        assert_eq!(rates, vec![(2018, 10.0), (2019, 12.0), (2020, 14.0)]);
    }

    #[test]
    fn trend_chart_projects_forward() {
        let criteria = SelectionCriteria::new()
            .with_site("Lung")
            .with_sex(SexSelection::Both);
        let chart = build_trend(&table(), &criteria, &[2023, 2026]).unwrap();

        assert_eq!(chart.historical.ys(), vec![10.0, 12.0, 14.0]);
        assert_eq!(chart.fitted.points.len(), 3);
        assert!((chart.predictions[0].value - 20.0).abs() < 0.01);
        assert!((chart.predictions[1].value - 26.0).abs() < 0.01);
        assert!((chart.r_squared - 1.0).abs() < 0.001);
        assert!(chart.summary.starts_with("R² Score: 1.000"));
        assert!(chart.summary.contains("Year 2023: 20.00"));

        let connector = chart.connector.unwrap();
        assert!(!connector.show_in_legend);
        assert_eq!(connector.points[0].x, 2020.0);
        assert_eq!(connector.points[1].x, 2023.0);
        assert!((chart.y_range.max - 26.0 * 1.1).abs() < 0.01);
    }

    #[test]
    fn single_sex_uses_only_that_sex() {
        let criteria = SelectionCriteria::new()
            .with_site("Lung")
            .with_sex(SexSelection::Specific("Female".into()));
        let chart = build_trend(&table(), &criteria, &[2023]).unwrap();
        assert_eq!(chart.historical.ys(), vec![4.0, 5.0, 6.0]);
    }

    #[test]
    fn one_year_of_data_is_insufficient() {
        let criteria = SelectionCriteria::new()
            .with_site("Liver")
            .with_sex(SexSelection::Specific("Male".into()));
        let err = build_trend(&table(), &criteria, &[2023]).unwrap_err();
        assert!(matches!(err, DashError::InsufficientData(1)));
    }

    #[test]
    fn missing_site_or_sex_is_reported() {
        let criteria = SelectionCriteria::new().with_site("Lung");
        let err = build_trend(&table(), &criteria, &[2023]).unwrap_err();
        assert!(matches!(err, DashError::MissingCriteria(_)));
    }

    #[test]
    fn unknown_site_is_empty_selection() {
        let criteria = SelectionCriteria::new()
            .with_site("Kidney")
            .with_sex(SexSelection::Both);
        let err = build_trend(&table(), &criteria, &[2023]).unwrap_err();
        assert!(matches!(err, DashError::EmptySelection));
    }
}
