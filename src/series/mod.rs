//! One builder per chart kind. Each is a pure function of already-loaded
//! tables and the request's criteria.

pub mod age;
pub mod choropleth;
pub mod ranking;
pub mod survival;
pub mod trend;

use crate::error::{DashError, Result};
use crate::store::RecordTable;

pub(crate) fn require_rows(table: &RecordTable) -> Result<()> {
    if table.is_empty() {
        return Err(DashError::EmptySelection);
    }
    Ok(())
}

/// "stage1" → "Stage1".
pub(crate) fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// "colon rectum" → "Colon Rectum".
pub(crate) fn title_case(s: &str) -> String {
    s.split(' ').map(capitalize).collect::<Vec<_>>().join(" ")
}
