//! Request-scoped selection criteria.
//!
//! Aggregate choices ("Both" sexes, "all" years, the all-regions rows) are
//! explicit variants rather than magic strings mixed into category lists.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{DashError, Result};
use crate::schema::survival;

pub const MAX_REGIONS: usize = 3;
pub const MAX_STAGES: usize = 4;

/// Sex selection. `Both` asks for a combined series summed across sexes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SexSelection {
    Both,
    Specific(String),
}

impl SexSelection {
    /// Canonical aggregate sentinel is "Both"; older spellings are accepted.
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "Both" | "Both sex" | "Both sexes" | "Both Sexes" => SexSelection::Both,
            other => SexSelection::Specific(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            SexSelection::Both => "Both",
            SexSelection::Specific(s) => s,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum YearSelection {
    #[default]
    All,
    Specific(i32),
}

/// One entry of the multi-select region list.
///
/// `AllRegions` selects the pre-aggregated rows tagged "all"; it is a category
/// of its own, not a wildcard over the other regions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RegionSelection {
    AllRegions,
    Specific(String),
}

impl RegionSelection {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            survival::ALL_REGIONS => RegionSelection::AllRegions,
            other => RegionSelection::Specific(other.to_string()),
        }
    }

    /// Value stored in the table's region column.
    pub fn value(&self) -> &str {
        match self {
            RegionSelection::AllRegions => survival::ALL_REGIONS,
            RegionSelection::Specific(id) => id,
        }
    }

    pub fn label(&self) -> String {
        match self {
            RegionSelection::AllRegions => "All Regions".to_string(),
            RegionSelection::Specific(id) => format!("Region {id}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelectionCriteria {
    pub year: YearSelection,
    pub site: Option<String>,
    pub sex: Option<SexSelection>,
    pub regions: Vec<RegionSelection>,
    pub stages: Vec<String>,
}

impl SelectionCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_site(mut self, site: impl Into<String>) -> Self {
        self.site = Some(site.into());
        self
    }

    pub fn with_sex(mut self, sex: SexSelection) -> Self {
        self.sex = Some(sex);
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = YearSelection::Specific(year);
        self
    }

    pub fn with_regions<I, S>(mut self, regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.regions = regions
            .into_iter()
            .map(|r| RegionSelection::parse(r.as_ref()))
            .collect();
        self
    }

    pub fn with_stages<I, S>(mut self, stages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stages = stages.into_iter().map(Into::into).collect();
        self
    }

    /// Keep the first 3 regions and first 4 stages, in selection order.
    pub fn normalized(mut self) -> Self {
        if self.regions.len() > MAX_REGIONS {
            warn!(
                "{} regions selected, keeping the first {}",
                self.regions.len(),
                MAX_REGIONS
            );
            self.regions.truncate(MAX_REGIONS);
        }
        if self.stages.len() > MAX_STAGES {
            warn!(
                "{} stages selected, keeping the first {}",
                self.stages.len(),
                MAX_STAGES
            );
            self.stages.truncate(MAX_STAGES);
        }
        self
    }

    pub(crate) fn require_site(&self) -> Result<&str> {
        match self.site.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => Ok(s),
            _ => Err(DashError::MissingCriteria("a cancer type".into())),
        }
    }

    pub(crate) fn require_sex(&self) -> Result<&SexSelection> {
        self.sex
            .as_ref()
            .ok_or_else(|| DashError::MissingCriteria("a sex".into()))
    }
}

// ── Wire form ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawYear {
    Number(i32),
    Text(String),
}

/// Criteria as sent by the UI layer: plain strings, "all"/"Both" sentinels.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawCriteria {
    year: Option<RawYear>,
    site: Option<String>,
    sex: Option<String>,
    regions: Vec<String>,
    stages: Vec<String>,
}

impl RawCriteria {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

impl SelectionCriteria {
    /// Parse the UI's JSON form. Malformed input is an `InvalidCriteria`.
    pub fn from_json(text: &str) -> Result<Self> {
        let raw = RawCriteria::from_json(text)
            .map_err(|e| DashError::InvalidCriteria(e.to_string()))?;
        SelectionCriteria::try_from(raw)
    }
}

impl TryFrom<RawCriteria> for SelectionCriteria {
    type Error = DashError;

    fn try_from(raw: RawCriteria) -> Result<Self> {
        let year = match raw.year {
            None => YearSelection::All,
            Some(RawYear::Number(y)) => YearSelection::Specific(y),
            Some(RawYear::Text(t)) => match t.trim() {
                "" | "all" => YearSelection::All,
                other => YearSelection::Specific(other.parse().map_err(|_| {
                    DashError::InvalidCriteria(format!("year '{other}' is not a number"))
                })?),
            },
        };
        let criteria = SelectionCriteria {
            year,
            site: raw.site.filter(|s| !s.trim().is_empty()),
            sex: raw
                .sex
                .filter(|s| !s.trim().is_empty())
                .map(|s| SexSelection::parse(&s)),
            regions: raw
                .regions
                .iter()
                .map(|r| RegionSelection::parse(r))
                .collect(),
            stages: raw.stages,
        };
        Ok(criteria.normalized())
    }
}
