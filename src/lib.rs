pub mod chart;
pub mod config;
pub mod criteria;
pub mod dashboard;
pub mod error;
pub mod filter;
pub mod options;
pub mod panel;
pub mod schema;
pub mod series;
pub mod store;
pub mod trend;

#[cfg(feature = "python")]
mod python;

pub use chart::{ChartBundle, ChartKind, ChartOutcome, Placeholder};
pub use config::DashboardConfig;
pub use criteria::{RawCriteria, RegionSelection, SelectionCriteria, SexSelection, YearSelection};
pub use dashboard::{Dashboard, Trigger};
pub use error::{DashError, Result};
pub use options::OptionSet;
pub use panel::FilterPanel;
pub use schema::TableKind;
pub use store::{DataStore, RecordTable};
