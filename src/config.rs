//! Configuration for the dashboard core.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::Result;
use crate::schema::TableKind;

/// Where the source tables live and how charts are parameterised.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Directory the table files are resolved against
    pub data_dir: PathBuf,
    pub incidence_file: String,
    pub incidence_by_age_file: String,
    pub region_file: String,
    pub survival_file: String,
    pub province_region_file: String,
    /// Population label the incidence table is restricted to
    pub population: String,
    /// Years the trend chart projects to
    pub future_years: Vec<i32>,
    /// Bars per sex in the ranking chart
    pub top_n: usize,
    /// Year the region table describes (title only)
    pub map_year: i32,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            incidence_file: "asr_th_vol6_11.csv".to_string(),
            incidence_by_age_file: "asr_th_vol6_11_agegroup.csv".to_string(),
            region_file: "all_region.csv".to_string(),
            survival_file: "surv_table_hr.csv".to_string(),
            province_region_file: "provice_healthregion.csv".to_string(),
            population: "Thailand".to_string(),
            future_years: vec![2023, 2026, 2030],
            top_n: 10,
            map_year: 2020,
        }
    }
}

impl DashboardConfig {
    /// Read a JSON config; missing keys fall back to the defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = serde_json::from_str(&text)?;
        Ok(config)
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn table_path(&self, kind: TableKind) -> PathBuf {
        let file = match kind {
            TableKind::Incidence => &self.incidence_file,
            TableKind::IncidenceByAge => &self.incidence_by_age_file,
            TableKind::Region => &self.region_file,
            TableKind::Survival => &self.survival_file,
            TableKind::ProvinceRegion => &self.province_region_file,
        };
        self.data_dir.join(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: DashboardConfig =
            serde_json::from_str(r#"{"data_dir": "/srv/asr", "future_years": [2025]}"#).unwrap();
        assert_eq!(config.future_years, vec![2025]);
        assert_eq!(config.population, "Thailand");
        assert_eq!(config.top_n, 10);
        assert_eq!(
            config.table_path(TableKind::Survival),
            PathBuf::from("/srv/asr/surv_table_hr.csv")
        );
    }
}
