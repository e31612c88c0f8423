//! Linear trend fitting and forward projection over yearly rates.

use std::collections::BTreeSet;

use crate::error::{DashError, Result};

/// Round to 3 decimal places, the precision every projector output uses.
pub fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Ordinary least-squares line over a standardized year axis.
///
/// Years are centred and scaled (population standard deviation) before the
/// fit; predictions apply the same transform, so fitted values are those of a
/// plain OLS line through the points.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendModel {
    year_mean: f64,
    year_scale: f64,
    intercept: f64,
    slope: f64,
}

impl TrendModel {
    /// Fit on `(year, rate)` pairs. Needs at least two distinct years.
    pub fn fit(series: &[(i32, f64)]) -> Result<Self> {
        let distinct: BTreeSet<i32> = series.iter().map(|(y, _)| *y).collect();
        if distinct.len() < 2 {
            return Err(DashError::InsufficientData(distinct.len()));
        }

        let n = series.len() as f64;
        let year_mean = series.iter().map(|(y, _)| *y as f64).sum::<f64>() / n;
        let variance = series
            .iter()
            .map(|(y, _)| (*y as f64 - year_mean).powi(2))
            .sum::<f64>()
            / n;
        let year_scale = variance.sqrt();

        // On a centred axis the intercept is the mean rate.
        let intercept = series.iter().map(|(_, r)| *r).sum::<f64>() / n;
        let sxy: f64 = series
            .iter()
            .map(|(y, r)| ((*y as f64 - year_mean) / year_scale) * (r - intercept))
            .sum();
        let sxx: f64 = series
            .iter()
            .map(|(y, _)| ((*y as f64 - year_mean) / year_scale).powi(2))
            .sum();

        Ok(Self {
            year_mean,
            year_scale,
            intercept,
            slope: sxy / sxx,
        })
    }

    fn value_at(&self, year: i32) -> f64 {
        let z = (year as f64 - self.year_mean) / self.year_scale;
        self.intercept + self.slope * z
    }

    /// One prediction per input year, rounded to 3 decimals.
    pub fn predict(&self, years: &[i32]) -> Vec<f64> {
        years.iter().map(|y| round3(self.value_at(*y))).collect()
    }

    /// Change in rate per calendar year.
    pub fn slope_per_year(&self) -> f64 {
        self.slope / self.year_scale
    }

    /// Coefficient of determination against the historical points.
    ///
    /// Uses the rounded predictions, matching what the chart displays. A
    /// constant series that the line reproduces exactly scores 1.0.
    pub fn r_squared(&self, actual: &[(i32, f64)]) -> f64 {
        if actual.is_empty() {
            return 0.0;
        }
        let years: Vec<i32> = actual.iter().map(|(y, _)| *y).collect();
        let predicted = self.predict(&years);
        let mean = actual.iter().map(|(_, r)| *r).sum::<f64>() / actual.len() as f64;

        let ss_res: f64 = actual
            .iter()
            .zip(&predicted)
            .map(|((_, r), p)| (r - p).powi(2))
            .sum();
        let ss_tot: f64 = actual.iter().map(|(_, r)| (r - mean).powi(2)).sum();

        if ss_tot == 0.0 {
            return if ss_res == 0.0 { 1.0 } else { 0.0 };
        }
        1.0 - ss_res / ss_tot
    }
}
