use std::collections::BTreeSet;

use serde::Serialize;

use crate::error::Result;
use crate::schema::TableKind;
use crate::store::RecordTable;

/// Sorted distinct values per recognised column.
///
/// A `None` field means the table has no such column; `Some(vec![])` means the
/// column exists but holds no values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OptionSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancer_types: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sex_options: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_groups: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub years: Option<Vec<i32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_regions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stages: Option<Vec<String>>,
}

/// Derive the option set of a table.
pub fn extract(table: &RecordTable) -> Result<OptionSet> {
    let kind = table.kind();
    let text = |column: Option<&str>| -> Result<Option<Vec<String>>> {
        column.map(|c| distinct_texts(table, c)).transpose()
    };

    let age_column = match kind {
        TableKind::IncidenceByAge => Some(crate::schema::age::AGE_GROUP),
        _ => None,
    };
    let years = match kind.year_column() {
        Some(c) => {
            let set: BTreeSet<i32> = table.years(c)?.into_iter().flatten().collect();
            Some(set.into_iter().collect())
        }
        None => None,
    };

    Ok(OptionSet {
        cancer_types: text(kind.site_column())?,
        sex_options: text(kind.sex_column())?,
        age_groups: text(age_column)?,
        years,
        health_regions: text(kind.region_column())?,
        stages: text(kind.stage_column())?,
    })
}

fn distinct_texts(table: &RecordTable, column: &str) -> Result<Vec<String>> {
    let set: BTreeSet<String> = table
        .texts(column)?
        .into_iter()
        .flatten()
        .filter(|v| !v.is_empty())
        .collect();
    Ok(set.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn incidence() -> RecordTable {
        let raw = df!(
            "Population" => ["Thailand"; 4],
            "Sex" => ["Male", "Female", "Male", "Female"],
            "Site" => ["Lung", "Breast", "Liver", "Lung"],
            "Year" => ["2019", "2010", "2018", "2019"],
            "ASR World" => ["1", "2", "3", "4"]
        )
        .unwrap();
        RecordTable::from_frame(TableKind::Incidence, raw).unwrap()
    }

    #[test]
    fn extract_sorts_and_dedups() {
        let options = extract(&incidence()).unwrap();
        assert_eq!(
            options.cancer_types,
            Some(vec!["Breast".to_string(), "Liver".into(), "Lung".into()])
        );
        assert_eq!(options.sex_options, Some(vec!["Female".to_string(), "Male".into()]));
        // numeric, not lexical
        assert_eq!(options.years, Some(vec![2010, 2018, 2019]));
        assert_eq!(options.stages, None);
        assert_eq!(options.health_regions, None);
    }

    #[test]
    fn extract_is_idempotent() {
        let table = incidence();
        assert_eq!(extract(&table).unwrap(), extract(&table).unwrap());
    }

    #[test]
    fn empty_column_is_present_but_empty() {
        let table = incidence().empty_like();
        let options = extract(&table).unwrap();
        assert_eq!(options.cancer_types, Some(vec![]));
        assert_eq!(options.age_groups, None);
    }
}
