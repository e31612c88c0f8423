/// Column-name constants for the cancer-trends tables.
/// Source headers are renamed onto these canonical names at load time.
use serde::Serialize;

// ── Incidence columns ───────────────────────────────────────────────────────
pub mod incidence {
    pub const POPULATION: &str = "population";
    pub const SEX: &str = "sex";
    pub const SITE: &str = "site";
    pub const YEAR: &str = "year";
    pub const RATE: &str = "rate";
}

// ── Incidence-by-age columns ────────────────────────────────────────────────
pub mod age {
    pub const SEX: &str = "sex";
    pub const SITE: &str = "site";
    pub const YEAR: &str = "year";
    pub const AGE_GROUP: &str = "age_group";
    pub const RATE: &str = "rate";

    /// Fixed ordering of the 16 five-year age bins.
    pub const ORDER: [&str; 16] = [
        "0-", "5-", "10-", "15-", "20-", "25-", "30-", "35-", "40-", "45-", "50-", "55-", "60-",
        "65-", "70-", "75+",
    ];
}

// ── Health-region columns ───────────────────────────────────────────────────
pub mod region {
    pub const HEALTH_REGION: &str = "health_region";
    pub const SEX: &str = "sex";
    pub const SITE: &str = "site";
    pub const RATE: &str = "rate";
}

// ── Survival columns ────────────────────────────────────────────────────────
pub mod survival {
    pub const REGION: &str = "region";
    pub const CANCER: &str = "cancer";
    pub const STAGE: &str = "stage";
    pub const TIME_YEARS: &str = "time_years";
    pub const SURVIVAL_PCT: &str = "survival_pct";

    /// Region value carried by the pre-aggregated national rows.
    pub const ALL_REGIONS: &str = "all";
}

// ── Province ↔ health-region mapping columns ────────────────────────────────
pub mod province {
    pub const PROVINCE_CODE: &str = "province_code";
    pub const PROVINCE_NAME: &str = "province_name";
    pub const HEALTH_REGION: &str = "health_region";
}

// ── Category values ─────────────────────────────────────────────────────────
pub mod values {
    pub const MALE: &str = "Male";
    pub const FEMALE: &str = "Female";
    pub const ALL_SITES: &str = "All sites";
}

/// Storage type a column is coerced to after loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Year,
    Rate,
}

/// One declared column: canonical name, accepted source headers, and type.
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub ty: ColumnType,
}

const fn spec(
    name: &'static str,
    aliases: &'static [&'static str],
    ty: ColumnType,
) -> ColumnSpec {
    ColumnSpec { name, aliases, ty }
}

const INCIDENCE_COLUMNS: [ColumnSpec; 5] = [
    spec(incidence::POPULATION, &["Population"], ColumnType::Text),
    spec(incidence::SEX, &["Sex"], ColumnType::Text),
    spec(incidence::SITE, &["Site"], ColumnType::Text),
    spec(incidence::YEAR, &["Year"], ColumnType::Year),
    spec(incidence::RATE, &["ASR World", "ASR"], ColumnType::Rate),
];

const AGE_COLUMNS: [ColumnSpec; 5] = [
    spec(age::SEX, &["Sex"], ColumnType::Text),
    spec(age::SITE, &["Site"], ColumnType::Text),
    spec(age::YEAR, &["Year"], ColumnType::Year),
    spec(age::AGE_GROUP, &["Age_Group", "AgeGroup"], ColumnType::Text),
    spec(age::RATE, &["ASR", "ASR World"], ColumnType::Rate),
];

const REGION_COLUMNS: [ColumnSpec; 4] = [
    spec(region::HEALTH_REGION, &["healthregion", "HealthRegion"], ColumnType::Text),
    spec(region::SEX, &["Sex"], ColumnType::Text),
    spec(region::SITE, &["Site"], ColumnType::Text),
    spec(region::RATE, &["ASR World", "ASR"], ColumnType::Rate),
];

const SURVIVAL_COLUMNS: [ColumnSpec; 5] = [
    spec(survival::REGION, &["Region"], ColumnType::Text),
    spec(survival::CANCER, &["Cancer"], ColumnType::Text),
    spec(survival::STAGE, &["Stage"], ColumnType::Text),
    spec(survival::TIME_YEARS, &["time", "TimeYears"], ColumnType::Rate),
    spec(survival::SURVIVAL_PCT, &["surv_time", "SurvivalPercent"], ColumnType::Rate),
];

const PROVINCE_COLUMNS: [ColumnSpec; 3] = [
    spec(province::PROVINCE_CODE, &["provine_code", "ProvinceCode"], ColumnType::Text),
    spec(province::PROVINCE_NAME, &["province", "ProvinceName"], ColumnType::Text),
    spec(province::HEALTH_REGION, &["HealthRegion"], ColumnType::Text),
];

/// The five source tables the dashboard knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Incidence,
    IncidenceByAge,
    Region,
    Survival,
    ProvinceRegion,
}

impl TableKind {
    pub const ALL: [TableKind; 5] = [
        TableKind::Incidence,
        TableKind::IncidenceByAge,
        TableKind::Region,
        TableKind::Survival,
        TableKind::ProvinceRegion,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TableKind::Incidence => "incidence",
            TableKind::IncidenceByAge => "incidence_by_age",
            TableKind::Region => "region",
            TableKind::Survival => "survival",
            TableKind::ProvinceRegion => "province_region",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == raw.trim())
    }

    pub fn columns(self) -> &'static [ColumnSpec] {
        match self {
            TableKind::Incidence => &INCIDENCE_COLUMNS,
            TableKind::IncidenceByAge => &AGE_COLUMNS,
            TableKind::Region => &REGION_COLUMNS,
            TableKind::Survival => &SURVIVAL_COLUMNS,
            TableKind::ProvinceRegion => &PROVINCE_COLUMNS,
        }
    }

    /// Canonical name for a source header, if this table declares it.
    pub fn canonical_name(self, header: &str) -> Option<&'static str> {
        let header = header.trim();
        self.columns()
            .iter()
            .find(|c| c.name == header || c.aliases.contains(&header))
            .map(|c| c.name)
    }

    /// Column holding the cancer site selection for this table.
    pub fn site_column(self) -> Option<&'static str> {
        match self {
            TableKind::Incidence => Some(incidence::SITE),
            TableKind::IncidenceByAge => Some(age::SITE),
            TableKind::Region => Some(region::SITE),
            TableKind::Survival => Some(survival::CANCER),
            TableKind::ProvinceRegion => None,
        }
    }

    pub fn sex_column(self) -> Option<&'static str> {
        match self {
            TableKind::Incidence | TableKind::IncidenceByAge | TableKind::Region => Some("sex"),
            _ => None,
        }
    }

    pub fn year_column(self) -> Option<&'static str> {
        match self {
            TableKind::Incidence | TableKind::IncidenceByAge => Some("year"),
            _ => None,
        }
    }

    pub fn region_column(self) -> Option<&'static str> {
        match self {
            TableKind::Region => Some(region::HEALTH_REGION),
            TableKind::Survival => Some(survival::REGION),
            _ => None,
        }
    }

    pub fn stage_column(self) -> Option<&'static str> {
        match self {
            TableKind::Survival => Some(survival::STAGE),
            _ => None,
        }
    }

    pub fn rate_column(self) -> Option<&'static str> {
        match self {
            TableKind::Incidence | TableKind::IncidenceByAge | TableKind::Region => Some("rate"),
            TableKind::Survival => Some(survival::SURVIVAL_PCT),
            TableKind::ProvinceRegion => None,
        }
    }
}

/// Position of an age group in the fixed ordering; unknown labels sort last.
pub fn age_group_rank(label: &str) -> usize {
    let label = label.trim();
    age::ORDER
        .iter()
        .position(|g| *g == label)
        .unwrap_or(age::ORDER.len())
}
