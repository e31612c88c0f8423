//! Request dispatch: one trigger plus criteria in, one chart outcome out.

use log::debug;

use crate::chart::{ChartBundle, ChartKind, ChartOutcome, Placeholder};
use crate::config::DashboardConfig;
use crate::criteria::SelectionCriteria;
use crate::error::Result;
use crate::panel::{survival_defaults, FilterPanel};
use crate::schema::TableKind;
use crate::series::{age, choropleth, ranking, survival, trend};
use crate::store::DataStore;

/// What the user did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Picked a chart; it becomes the current one
    Select(ChartKind),
    /// Re-render the current chart with the panel's values
    ApplyFilters,
}

impl Trigger {
    /// Chart names select that chart; "apply" or "apply_filters" re-render.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "apply" | "apply_filters" => Some(Trigger::ApplyFilters),
            other => ChartKind::parse(other).map(Trigger::Select),
        }
    }
}

pub struct Dashboard {
    config: DashboardConfig,
    store: DataStore,
}

impl Dashboard {
    /// Load every table named by `config`. Never fails; missing tables only
    /// degrade the charts that read them.
    pub fn load(config: DashboardConfig) -> Self {
        let store = DataStore::load(&config);
        Self { config, store }
    }

    pub fn from_store(config: DashboardConfig, store: DataStore) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn store(&self) -> &DataStore {
        &self.store
    }

    pub fn panel(&self, kind: ChartKind) -> FilterPanel {
        FilterPanel::for_kind(kind, &self.store)
    }

    /// Resolve the trigger against the previously shown chart and render.
    ///
    /// Returns the chart now shown, which the caller keeps as the next
    /// `previous`.
    pub fn handle(
        &self,
        trigger: Trigger,
        previous: ChartKind,
        criteria: &SelectionCriteria,
    ) -> (ChartKind, ChartOutcome) {
        let kind = match trigger {
            Trigger::Select(kind) => kind,
            Trigger::ApplyFilters => previous,
        };
        (kind, self.render(kind, criteria))
    }

    /// [`handle`](Self::handle) for criteria in their JSON wire form.
    ///
    /// Criteria that do not parse become an `InvalidCriteria` placeholder for
    /// the chart that would have been shown.
    pub fn handle_json(
        &self,
        trigger: Trigger,
        previous: ChartKind,
        criteria_json: &str,
    ) -> (ChartKind, ChartOutcome) {
        match SelectionCriteria::from_json(criteria_json) {
            Ok(criteria) => self.handle(trigger, previous, &criteria),
            Err(e) => {
                let kind = match trigger {
                    Trigger::Select(kind) => kind,
                    Trigger::ApplyFilters => previous,
                };
                debug!("{} criteria rejected: {}", kind.name(), e);
                (kind, ChartOutcome::Placeholder(Placeholder::from(e)))
            }
        }
    }

    /// Build `kind`, turning any failure into a placeholder.
    pub fn render(&self, kind: ChartKind, criteria: &SelectionCriteria) -> ChartOutcome {
        debug!("Rendering {} with {:?}", kind.name(), criteria);
        match self.build(kind, criteria) {
            Ok(bundle) => ChartOutcome::Ready(bundle),
            Err(e) => {
                debug!("{} shows a placeholder: {}", kind.name(), e);
                ChartOutcome::Placeholder(Placeholder::from(e))
            }
        }
    }

    fn build(&self, kind: ChartKind, criteria: &SelectionCriteria) -> Result<ChartBundle> {
        let bundle = match kind {
            ChartKind::Trend => ChartBundle::Trend(trend::build_trend(
                self.store.table(TableKind::Incidence)?,
                criteria,
                &self.config.future_years,
            )?),
            ChartKind::RegionalMap => ChartBundle::RegionalMap(choropleth::build_region_map(
                self.store.table(TableKind::Region)?,
                self.store.table(TableKind::ProvinceRegion)?,
                criteria,
                self.config.map_year,
            )?),
            ChartKind::AgeDistribution => ChartBundle::AgeDistribution(
                age::build_age_distribution(self.store.table(TableKind::IncidenceByAge)?, criteria)?,
            ),
            ChartKind::TopCancers => ChartBundle::TopCancers(ranking::build_top_cancers(
                self.store.table(TableKind::Incidence)?,
                criteria,
                self.config.top_n,
            )?),
            ChartKind::Survival => ChartBundle::Survival(survival::build_survival(
                self.store.table(TableKind::Survival)?,
                &with_survival_fallbacks(criteria),
            )?),
        };
        Ok(bundle)
    }
}

/// Empty region or stage lists fall back to the panel defaults.
fn with_survival_fallbacks(criteria: &SelectionCriteria) -> SelectionCriteria {
    let defaults = survival_defaults();
    let mut criteria = criteria.clone();
    if criteria.regions.is_empty() {
        criteria.regions = defaults.regions;
    }
    if criteria.stages.is_empty() {
        criteria.stages = defaults.stages;
    }
    criteria
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::PlaceholderReason;
    use crate::criteria::SexSelection;
    use crate::store::RecordTable;
    use polars::prelude::*;

    fn dashboard() -> Dashboard {
        let incidence = df!(
            "Population" => ["Thailand"; 4],
            "Sex" => ["Male", "Female", "Male", "Female"],
            "Site" => ["Lung", "Lung", "Lung", "Lung"],
            "Year" => ["2018", "2018", "2019", "2019"],
            "ASR World" => ["6", "4", "7", "5"]
        )
        .unwrap();
        let store = DataStore::empty()
            .with_table(RecordTable::from_frame(TableKind::Incidence, incidence).unwrap());
        Dashboard::from_store(DashboardConfig::default(), store)
    }

    #[test]
    fn trigger_names_parse() {
        assert_eq!(Trigger::parse("apply"), Some(Trigger::ApplyFilters));
        assert_eq!(
            Trigger::parse("survival"),
            Some(Trigger::Select(ChartKind::Survival))
        );
        assert_eq!(Trigger::parse("btn-table"), None);
    }

    #[test]
    fn apply_replays_the_previous_chart() {
        let d = dashboard();
        let criteria = SelectionCriteria::new()
            .with_site("Lung")
            .with_sex(SexSelection::Both);

        let (kind, outcome) = d.handle(Trigger::Select(ChartKind::Trend), ChartKind::TopCancers, &criteria);
        assert_eq!(kind, ChartKind::Trend);
        assert!(matches!(outcome.bundle(), Some(ChartBundle::Trend(_))));

        let (kind, outcome) = d.handle(Trigger::ApplyFilters, kind, &SelectionCriteria::new());
        assert_eq!(kind, ChartKind::Trend);
        assert_eq!(
            outcome.placeholder().map(|p| p.reason),
            Some(PlaceholderReason::MissingCriteria)
        );
    }

    #[test]
    fn charts_on_missing_tables_degrade() {
        let d = dashboard();
        let (_, outcome) = d.handle(
            Trigger::Select(ChartKind::Survival),
            ChartKind::Trend,
            &SelectionCriteria::new().with_site("breast"),
        );
        assert_eq!(
            outcome.placeholder().map(|p| p.reason),
            Some(PlaceholderReason::DataUnavailable)
        );

        // the incidence charts still work
        let (_, outcome) = d.handle(
            Trigger::Select(ChartKind::TopCancers),
            ChartKind::Survival,
            &SelectionCriteria::new(),
        );
        assert!(outcome.bundle().is_some());
    }

    #[test]
    fn unparseable_criteria_become_a_placeholder() {
        let d = dashboard();
        let (kind, outcome) = d.handle_json(
            Trigger::ApplyFilters,
            ChartKind::TopCancers,
            r#"{"year": "next year"}"#,
        );
        assert_eq!(kind, ChartKind::TopCancers);
        assert_eq!(
            outcome.placeholder().map(|p| p.reason),
            Some(PlaceholderReason::InvalidCriteria)
        );

        let (kind, outcome) = d.handle_json(Trigger::Select(ChartKind::Trend), ChartKind::TopCancers, "{site");
        assert_eq!(kind, ChartKind::Trend);
        assert_eq!(
            outcome.placeholder().map(|p| p.reason),
            Some(PlaceholderReason::InvalidCriteria)
        );

        let (_, outcome) = d.handle_json(
            Trigger::Select(ChartKind::Trend),
            ChartKind::Trend,
            r#"{"site": "Lung", "sex": "Both"}"#,
        );
        assert!(outcome.bundle().is_some());
    }

    #[test]
    fn survival_lists_fall_back_to_defaults() {
        let filled = with_survival_fallbacks(&SelectionCriteria::new().with_site("lung"));
        assert_eq!(filled.regions.len(), 2);
        assert_eq!(filled.stages.len(), 4);
        assert_eq!(filled.site.as_deref(), Some("lung"));
    }
}
