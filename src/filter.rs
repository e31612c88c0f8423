use polars::prelude::*;

use crate::criteria::{SelectionCriteria, SexSelection, YearSelection, MAX_REGIONS, MAX_STAGES};
use crate::error::{DashError, Result};
use crate::store::RecordTable;

/// Rows of `table` matching every active criterion.
///
/// Criteria naming a column the table does not have are ignored. `Both` sex
/// applies no sex filter; use [`combine_sexes`] for the summed series. No
/// match yields an empty table, not an error.
pub fn filter(table: &RecordTable, criteria: &SelectionCriteria) -> Result<RecordTable> {
    let kind = table.kind();
    let mut conditions: Vec<Expr> = Vec::new();

    if let (Some(site), Some(column)) = (criteria.site.as_deref(), kind.site_column()) {
        conditions.push(col(column).eq(lit(site.trim())));
    }
    if let (Some(SexSelection::Specific(sex)), Some(column)) = (&criteria.sex, kind.sex_column()) {
        conditions.push(col(column).eq(lit(sex.as_str())));
    }
    if let (YearSelection::Specific(year), Some(column)) = (criteria.year, kind.year_column()) {
        conditions.push(col(column).eq(lit(year)));
    }
    if let Some(column) = kind.region_column() {
        let regions: Vec<&str> = criteria
            .regions
            .iter()
            .take(MAX_REGIONS)
            .map(|r| r.value())
            .collect();
        if !regions.is_empty() {
            conditions.push(is_one_of(column, &regions));
        }
    }
    if let Some(column) = kind.stage_column() {
        let stages: Vec<&str> = criteria
            .stages
            .iter()
            .take(MAX_STAGES)
            .map(|s| s.as_str())
            .collect();
        if !stages.is_empty() {
            conditions.push(is_one_of(column, &stages));
        }
    }

    let Some(predicate) = conditions.into_iter().reduce(|a, b| a.and(b)) else {
        return Ok(table.clone());
    };

    let df = table.frame().clone().lazy().filter(predicate).collect()?;
    Ok(RecordTable::from_coerced(kind, df))
}

fn is_one_of(column: &str, values: &[&str]) -> Expr {
    let allowed = Series::new("allowed".into(), values);
    col(column).is_in(lit(allowed).implode(), false)
}

/// Sum the rate across all sexes, grouped by the remaining dimensions.
///
/// The result keeps the table's shape with the sex column set to "Both".
pub fn combine_sexes(table: &RecordTable) -> Result<RecordTable> {
    let kind = table.kind();
    let (Some(sex), Some(rate)) = (kind.sex_column(), kind.rate_column()) else {
        return Err(DashError::InvalidCriteria(format!(
            "{} has no sex dimension",
            kind.name()
        )));
    };
    let keys: Vec<Expr> = kind
        .columns()
        .iter()
        .filter(|c| c.name != sex && c.name != rate)
        .map(|c| col(c.name))
        .collect();
    let ordered: Vec<Expr> = kind.columns().iter().map(|c| col(c.name)).collect();

    let df = table
        .frame()
        .clone()
        .lazy()
        .group_by_stable(keys)
        .agg([col(rate).sum()])
        .with_columns([lit(SexSelection::Both.label()).alias(sex)])
        .select(ordered)
        .collect()?;
    Ok(RecordTable::from_coerced(kind, df))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{incidence, survival, TableKind};

    fn incidence() -> RecordTable {
        let raw = df!(
            "Population" => ["Thailand"; 6],
            "Sex" => ["Male", "Female", "Male", "Female", "Male", "Female"],
            "Site" => ["Lung", "Lung", "Lung", "Lung", "Liver", "Liver"],
            "Year" => ["2018", "2018", "2019", "2019", "2018", "2018"],
            "ASR World" => ["20.5", "10.25", "21.0", "11.0", "30.0", "12.0"]
        )
        .unwrap();
        RecordTable::from_frame(TableKind::Incidence, raw).unwrap()
    }

    fn survival() -> RecordTable {
        let raw = df!(
            "region" => ["all", "2", "3", "2", "2"],
            "cancer" => ["breast"; 5],
            "stage" => ["stage1", "stage1", "stage1", "stage3", "stage4"],
            "time" => ["1", "1", "1", "1", "1"],
            "surv_time" => ["95", "94", "93", "70", "40"]
        )
        .unwrap();
        RecordTable::from_frame(TableKind::Survival, raw).unwrap()
    }

    #[test]
    fn no_active_criteria_returns_everything() {
        let table = incidence();
        let out = filter(&table, &SelectionCriteria::new()).unwrap();
        assert_eq!(out.height(), table.height());
    }

    #[test]
    fn every_returned_row_matches() {
        let criteria = SelectionCriteria::new()
            .with_site("Lung")
            .with_sex(SexSelection::Specific("Male".into()))
            .with_year(2019);
        let out = filter(&incidence(), &criteria).unwrap();
        assert_eq!(out.height(), 1);
        assert_eq!(out.floats(incidence::RATE).unwrap(), vec![Some(21.0)]);
    }

    #[test]
    fn both_sexes_does_not_filter_sex() {
        let criteria = SelectionCriteria::new()
            .with_site("Lung")
            .with_sex(SexSelection::Both);
        assert_eq!(filter(&incidence(), &criteria).unwrap().height(), 4);
    }

    #[test]
    fn no_match_is_an_empty_table() {
        let criteria = SelectionCriteria::new().with_site("Kidney");
        let out = filter(&incidence(), &criteria).unwrap();
        assert!(out.is_empty());
        assert_eq!(out.kind(), TableKind::Incidence);
    }

    #[test]
    fn all_regions_is_a_literal_category() {
        let criteria = SelectionCriteria::new()
            .with_regions(["all"])
            .with_stages(["stage1"]);
        let out = filter(&survival(), &criteria).unwrap();
        assert_eq!(out.texts(survival::REGION).unwrap(), vec![Some("all".to_string())]);
    }

    #[test]
    fn region_and_stage_lists_are_membership_tests() {
        let criteria = SelectionCriteria::new()
            .with_regions(["2"])
            .with_stages(["stage1", "stage3"]);
        let out = filter(&survival(), &criteria).unwrap();
        assert_eq!(out.height(), 2);
    }

    #[test]
    fn combined_sexes_sum_male_and_female() {
        let criteria = SelectionCriteria::new().with_site("Lung");
        let lung = filter(&incidence(), &criteria).unwrap();
        let both = combine_sexes(&lung).unwrap();
        assert_eq!(both.years(incidence::YEAR).unwrap(), vec![Some(2018), Some(2019)]);
        assert_eq!(both.floats(incidence::RATE).unwrap(), vec![Some(30.75), Some(32.0)]);
        assert_eq!(
            both.texts(incidence::SEX).unwrap(),
            vec![Some("Both".to_string()), Some("Both".to_string())]
        );
    }

    #[test]
    fn combine_sexes_rejects_survival() {
        assert!(combine_sexes(&survival()).is_err());
    }
}
