//! Which filters each chart shows, what they offer and what they start at.

use serde::Serialize;

use crate::chart::ChartKind;
use crate::criteria::{RegionSelection, SelectionCriteria, SexSelection};
use crate::options::OptionSet;
use crate::schema::{survival, TableKind};
use crate::series::title_case;
use crate::store::DataStore;

const DEFAULT_SITE: &str = "Breast";
const DEFAULT_SURVIVAL_SITE: &str = "breast";
const DEFAULT_SURVIVAL_REGION: &str = "2";
const DEFAULT_STAGES: [&str; 4] = ["stage1", "stage2", "stage3", "stage4"];
const FALLBACK_YEAR: i32 = 2020;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
}

impl SelectOption {
    fn plain(value: &str) -> Self {
        Self {
            label: value.to_string(),
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Selector {
    pub options: Vec<SelectOption>,
    pub multi: bool,
}

impl Selector {
    fn single(options: Vec<SelectOption>) -> Self {
        Self {
            options,
            multi: false,
        }
    }

    fn multi(options: Vec<SelectOption>) -> Self {
        Self {
            options,
            multi: true,
        }
    }

    pub fn values(&self) -> Vec<&str> {
        self.options.iter().map(|o| o.value.as_str()).collect()
    }
}

/// Filter panel for one chart kind. A `None` selector is hidden.
#[derive(Debug, Clone, Serialize)]
pub struct FilterPanel {
    pub kind: ChartKind,
    pub year: Option<Selector>,
    pub site: Option<Selector>,
    pub sex: Option<Selector>,
    pub regions: Option<Selector>,
    pub stages: Option<Selector>,
    pub defaults: SelectionCriteria,
}

impl FilterPanel {
    fn hidden(kind: ChartKind, defaults: SelectionCriteria) -> Self {
        Self {
            kind,
            year: None,
            site: None,
            sex: None,
            regions: None,
            stages: None,
            defaults,
        }
    }

    /// Panel for `kind`, with options read from the loaded tables.
    ///
    /// An unavailable table yields visible selectors with no options.
    pub fn for_kind(kind: ChartKind, store: &DataStore) -> Self {
        let options = |table: TableKind| store.options(table).cloned().unwrap_or_default();

        match kind {
            ChartKind::Trend | ChartKind::RegionalMap => {
                let table = if kind == ChartKind::Trend {
                    TableKind::Incidence
                } else {
                    TableKind::Region
                };
                let set = options(table);
                let mut panel = Self::hidden(
                    kind,
                    SelectionCriteria::new()
                        .with_site(DEFAULT_SITE)
                        .with_sex(SexSelection::Both),
                );
                panel.site = Some(site_selector(&set, false));
                panel.sex = Some(sex_selector(&set));
                panel
            }
            ChartKind::AgeDistribution => {
                let set = options(TableKind::IncidenceByAge);
                let mut panel =
                    Self::hidden(kind, SelectionCriteria::new().with_site(DEFAULT_SITE));
                panel.site = Some(site_selector(&set, false));
                panel
            }
            ChartKind::TopCancers => {
                let years = options(TableKind::Incidence).years.unwrap_or_default();
                let default_year = years.first().copied().unwrap_or(FALLBACK_YEAR);
                let mut panel = Self::hidden(kind, SelectionCriteria::new().with_year(default_year));
                panel.year = Some(Selector::single(
                    years.iter().map(|y| SelectOption::plain(&y.to_string())).collect(),
                ));
                panel
            }
            ChartKind::Survival => {
                let set = options(TableKind::Survival);
                let mut panel = Self::hidden(kind, survival_defaults());
                panel.site = Some(site_selector(&set, true));
                panel.regions = Some(region_selector(&set));
                panel.stages = Some(Selector::multi(
                    set.stages
                        .unwrap_or_default()
                        .iter()
                        .map(|s| SelectOption {
                            label: title_case(s),
                            value: s.clone(),
                        })
                        .collect(),
                ));
                panel
            }
        }
    }
}

/// Survival selection the dashboard starts with.
pub fn survival_defaults() -> SelectionCriteria {
    SelectionCriteria::new()
        .with_site(DEFAULT_SURVIVAL_SITE)
        .with_regions([survival::ALL_REGIONS, DEFAULT_SURVIVAL_REGION])
        .with_stages(DEFAULT_STAGES)
}

fn site_selector(set: &OptionSet, title_labels: bool) -> Selector {
    let sites = set.cancer_types.clone().unwrap_or_default();
    Selector::single(
        sites
            .iter()
            .map(|s| SelectOption {
                label: if title_labels { title_case(s) } else { s.clone() },
                value: s.clone(),
            })
            .collect(),
    )
}

fn sex_selector(set: &OptionSet) -> Selector {
    let mut options = vec![SelectOption {
        label: "Both Sexes".to_string(),
        value: SexSelection::Both.label().to_string(),
    }];
    options.extend(
        set.sex_options
            .iter()
            .flatten()
            .map(|s| SelectOption::plain(s)),
    );
    Selector::single(options)
}

fn region_selector(set: &OptionSet) -> Selector {
    let mut options: Vec<SelectOption> = set
        .health_regions
        .iter()
        .flatten()
        .filter(|r| r.as_str() != survival::ALL_REGIONS)
        .map(|r| {
            let selection = RegionSelection::Specific(r.clone());
            SelectOption {
                label: selection.label(),
                value: r.clone(),
            }
        })
        .collect();
    options.push(SelectOption {
        label: RegionSelection::AllRegions.label(),
        value: RegionSelection::AllRegions.value().to_string(),
    });
    Selector::multi(options)
}
