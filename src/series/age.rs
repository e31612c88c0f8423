use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::chart::{AxisRange, CategoryPoint, CategorySeries};
use crate::criteria::SelectionCriteria;
use crate::error::Result;
use crate::filter::filter;
use crate::schema::{age, age_group_rank, values};
use crate::series::require_rows;
use crate::store::RecordTable;
use crate::trend::round3;

const MALE_COLOR: &str = "rgba(31, 119, 180, 1)";
const FEMALE_COLOR: &str = "rgba(255, 127, 14, 1)";
const COMBINED_COLOR: &str = "#2ca02c";

/// What the x-axis categories of each frame are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeAxis {
    AgeGroup,
    /// No row carries an age group; frames compare sexes instead
    Sex,
}

/// One animation frame.
#[derive(Debug, Clone, Serialize)]
pub struct AgeFrame {
    pub year: i32,
    pub series: Vec<CategorySeries>,
    /// Global maximum across all frames, so the scale holds still
    pub y_max: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgeChart {
    pub title: String,
    pub site: String,
    pub axis: AgeAxis,
    /// Category order shared by every frame
    pub categories: Vec<String>,
    pub frames: Vec<AgeFrame>,
    pub y_range: AxisRange,
}

struct AgeRow {
    year: i32,
    sex: Option<String>,
    age_group: Option<String>,
    rate: f64,
}

/// Sort key for age labels: fixed order first, unknown labels after, by text.
fn age_key(label: &str) -> (usize, String) {
    (age_group_rank(label), label.trim().to_string())
}

/// Male first, then Female, then anything else alphabetically.
fn sex_key(label: &str) -> (u8, String) {
    let rank = match label {
        values::MALE => 0,
        values::FEMALE => 1,
        _ => 2,
    };
    (rank, label.to_string())
}

fn sex_color(label: &str) -> &'static str {
    match label {
        values::MALE => MALE_COLOR,
        values::FEMALE => FEMALE_COLOR,
        _ => COMBINED_COLOR,
    }
}

/// Mean rate per category, categories ordered by `key`.
fn mean_by<K: Ord>(
    rows: &[&AgeRow],
    category: impl Fn(&AgeRow) -> Option<&str>,
    key: impl Fn(&str) -> K,
) -> Vec<CategoryPoint> {
    let mut groups: BTreeMap<K, (String, f64, usize)> = BTreeMap::new();
    for &row in rows {
        if let Some(c) = category(row) {
            let entry = groups.entry(key(c)).or_insert((c.to_string(), 0.0, 0));
            entry.1 += row.rate;
            entry.2 += 1;
        }
    }
    groups
        .into_values()
        .map(|(category, sum, n)| CategoryPoint {
            category,
            value: sum / n as f64,
        })
        .collect()
}

pub fn build_age_distribution(
    table: &RecordTable,
    criteria: &SelectionCriteria,
) -> Result<AgeChart> {
    let site = criteria.require_site()?;
    let rows = filter(table, &SelectionCriteria::new().with_site(site))?;
    require_rows(&rows)?;

    let rows: Vec<AgeRow> = rows
        .years(age::YEAR)?
        .into_iter()
        .zip(rows.texts(age::SEX)?)
        .zip(rows.texts(age::AGE_GROUP)?)
        .zip(rows.floats(age::RATE)?)
        .filter_map(|(((year, sex), age_group), rate)| {
            Some(AgeRow {
                year: year?,
                sex: sex.filter(|s| !s.is_empty()),
                age_group: age_group.filter(|g| !g.trim().is_empty()),
                rate: round3(rate?),
            })
        })
        .collect();

    let years: BTreeSet<i32> = rows.iter().map(|r| r.year).collect();
    let mut sexes: Vec<&str> = rows
        .iter()
        .filter_map(|r| r.sex.as_deref())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    sexes.sort_by_key(|s| sex_key(s));

    let has_age_groups = rows.iter().any(|r| r.age_group.is_some());
    let axis = if has_age_groups {
        AgeAxis::AgeGroup
    } else {
        AgeAxis::Sex
    };

    let mut frames: Vec<AgeFrame> = Vec::new();
    for year in years {
        let year_rows: Vec<&AgeRow> = rows.iter().filter(|r| r.year == year).collect();
        let mut series = Vec::new();

        match axis {
            AgeAxis::AgeGroup if sexes.len() > 1 => {
                for sex in &sexes {
                    let sex_rows: Vec<&AgeRow> = year_rows
                        .iter()
                        .copied()
                        .filter(|r| r.sex.as_deref() == Some(*sex))
                        .collect();
                    let points = mean_by(&sex_rows, |r| r.age_group.as_deref(), age_key);
                    if !points.is_empty() {
                        series.push(CategorySeries {
                            name: sex.to_string(),
                            color: sex_color(sex).to_string(),
                            points,
                        });
                    }
                }
            }
            AgeAxis::AgeGroup => {
                let points = mean_by(&year_rows, |r| r.age_group.as_deref(), age_key);
                if !points.is_empty() {
                    series.push(CategorySeries {
                        name: "ASR".to_string(),
                        color: COMBINED_COLOR.to_string(),
                        points,
                    });
                }
            }
            AgeAxis::Sex => {
                let points = mean_by(&year_rows, |r| r.sex.as_deref(), sex_key);
                if !points.is_empty() {
                    series.push(CategorySeries {
                        name: "ASR".to_string(),
                        color: COMBINED_COLOR.to_string(),
                        points,
                    });
                }
            }
        }

        if !series.is_empty() {
            frames.push(AgeFrame {
                year,
                series,
                y_max: 0.0,
            });
        }
    }

    let global_max = frames
        .iter()
        .flat_map(|f| f.series.iter())
        .flat_map(|s| s.points.iter())
        .map(|p| p.value)
        .fold(0.0_f64, f64::max);
    for frame in &mut frames {
        frame.y_max = global_max;
    }

    let mut categories: Vec<String> = frames
        .iter()
        .flat_map(|f| f.series.iter())
        .flat_map(|s| s.points.iter())
        .map(|p| p.category.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    match axis {
        AgeAxis::AgeGroup => categories.sort_by_key(|c| age_key(c)),
        AgeAxis::Sex => categories.sort_by_key(|c| sex_key(c)),
    }

    let title = match axis {
        AgeAxis::AgeGroup => format!("ASR by Age Group Over Time: {site}"),
        AgeAxis::Sex => format!("ASR by Sex Animation: {site}"),
    };

    Ok(AgeChart {
        title,
        site: site.to_string(),
        axis,
        categories,
        frames,
        y_range: AxisRange::padded(global_max),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DashError;
    use crate::schema::TableKind;
    use polars::prelude::*;

    fn table(sexes: [&str; 8], groups: [&str; 8]) -> RecordTable {
        let raw = df!(
            "Sex" => sexes,
            "Site" => ["Breast"; 8],
            "Year" => ["2019", "2019", "2019", "2018", "2018", "2018", "2019", "2019"],
            "Age_Group" => groups,
            "ASR" => ["75", "1", "10", "70", "2", "12", "5", "999"]
        )
        .unwrap();
        RecordTable::from_frame(TableKind::IncidenceByAge, raw).unwrap()
    }

    #[test]
    fn frames_follow_fixed_age_order() {
        let t = table(
            ["Female"; 8],
            ["75+", "0-", "10-", "75+", "0-", "10-", "999", "999"],
        );
        let chart = build_age_distribution(&t, &SelectionCriteria::new().with_site("Breast")).unwrap();

        assert_eq!(chart.axis, AgeAxis::AgeGroup);
        assert_eq!(chart.categories, vec!["0-", "10-", "75+", "999"]);
        let years: Vec<i32> = chart.frames.iter().map(|f| f.year).collect();
        assert_eq!(years, vec![2018, 2019]);

        let first = &chart.frames[0].series[0];
        assert_eq!(first.categories(), vec!["0-", "10-", "75+"]);
        let second = &chart.frames[1].series[0];
        assert_eq!(second.categories(), vec!["0-", "10-", "75+", "999"]);
        // the two "999" rows average
        assert_eq!(second.points[3].value, (5.0 + 999.0) / 2.0);
    }

    #[test]
    fn every_frame_carries_the_global_max() {
        let t = table(
            ["Male", "Female", "Male", "Female", "Male", "Female", "Male", "Female"],
            ["0-", "0-", "5-", "0-", "0-", "5-", "10-", "10-"],
        );
        let chart = build_age_distribution(&t, &SelectionCriteria::new().with_site("Breast")).unwrap();
        for frame in &chart.frames {
            assert_eq!(frame.y_max, 999.0);
            let names: Vec<&str> = frame.series.iter().map(|s| s.name.as_str()).collect();
            assert_eq!(names, vec!["Male", "Female"]);
        }
        assert!((chart.y_range.max - 999.0 * 1.1).abs() < 1e-9);
    }

    #[test]
    fn missing_age_groups_fall_back_to_sex_axis() {
        let t = table(
            ["Male", "Female", "Male", "Female", "Male", "Female", "Male", "Female"],
            [""; 8],
        );
        let chart = build_age_distribution(&t, &SelectionCriteria::new().with_site("Breast")).unwrap();
        assert_eq!(chart.axis, AgeAxis::Sex);
        assert_eq!(chart.categories, vec!["Male", "Female"]);
    }

    #[test]
    fn site_is_required_and_must_match() {
        let t = table(["Male"; 8], ["0-"; 8]);
        assert!(matches!(
            build_age_distribution(&t, &SelectionCriteria::new()),
            Err(DashError::MissingCriteria(_))
        ));
        assert!(matches!(
            build_age_distribution(&t, &SelectionCriteria::new().with_site("Lung")),
            Err(DashError::EmptySelection)
        ));
    }
}
