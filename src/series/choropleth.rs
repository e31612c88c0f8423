use polars::prelude::*;
use serde::Serialize;

use crate::chart::AxisRange;
use crate::criteria::{SelectionCriteria, SexSelection};
use crate::error::{DashError, Result};
use crate::filter::filter;
use crate::schema::{province, region};
use crate::series::require_rows;
use crate::store::RecordTable;

const ROW: &str = "_row";
const REGION_KEY: &str = "_region";

/// One province polygon's shading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProvinceShade {
    pub province_code: String,
    pub province_name: String,
    pub health_region: String,
    /// `None` when the province's health region has no rate; drawn unshaded
    pub rate: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChoroplethChart {
    pub title: String,
    pub site: String,
    pub sex: String,
    /// Every province of the mapping table, in mapping order
    pub provinces: Vec<ProvinceShade>,
    pub color_range: Option<AxisRange>,
    pub color_scale: String,
    /// Column of `provinces` matched against the boundary features
    pub location_key: String,
    pub feature_id_key: String,
}

/// Health-region rates for one site, summed over sexes for `Both`.
fn region_rates(regions: &RecordTable, site: &str, sex: &SexSelection) -> Result<DataFrame> {
    let rows = filter(
        regions,
        &SelectionCriteria::new().with_site(site).with_sex(sex.clone()),
    )?;
    require_rows(&rows)?;

    Ok(rows
        .frame()
        .clone()
        .lazy()
        .group_by_stable([col(region::HEALTH_REGION)])
        .agg([col(region::RATE).sum()])
        .select([
            col(region::HEALTH_REGION).alias(REGION_KEY),
            col(region::RATE),
        ])
        .collect()?)
}

fn text_column(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    let ca = df.column(name)?.str()?;
    Ok(ca
        .into_iter()
        .map(|v| v.unwrap_or_default().to_string())
        .collect())
}

/// Shade every province by its health region's rate.
///
/// The mapping is left-joined, so provinces without a matching region row
/// stay in the output with no rate.
pub fn build_region_map(
    regions: &RecordTable,
    provinces: &RecordTable,
    criteria: &SelectionCriteria,
    map_year: i32,
) -> Result<ChoroplethChart> {
    let site = criteria.require_site()?;
    let sex = criteria.require_sex()?;
    let rates = region_rates(regions, site, sex)?;

    let joined = provinces
        .frame()
        .clone()
        .lazy()
        .with_row_index(ROW, None)
        .join(
            rates.lazy(),
            [col(province::HEALTH_REGION)],
            [col(REGION_KEY)],
            JoinArgs::new(JoinType::Left),
        )
        .sort([ROW], SortMultipleOptions::default())
        .select([
            col(province::PROVINCE_CODE),
            col(province::PROVINCE_NAME),
            col(province::HEALTH_REGION),
            col(region::RATE),
        ])
        .collect()?;

    let codes = text_column(&joined, province::PROVINCE_CODE)?;
    let names = text_column(&joined, province::PROVINCE_NAME)?;
    let health_regions = text_column(&joined, province::HEALTH_REGION)?;
    let rates: Vec<Option<f64>> = joined.column(region::RATE)?.f64()?.into_iter().collect();

    let shades: Vec<ProvinceShade> = codes
        .into_iter()
        .zip(names)
        .zip(health_regions)
        .zip(rates)
        .map(|(((province_code, province_name), health_region), rate)| ProvinceShade {
            province_code,
            province_name,
            health_region,
            rate,
        })
        .collect();

    let present = shades.iter().filter_map(|s| s.rate);
    let color_range = present
        .clone()
        .reduce(f64::min)
        .zip(present.reduce(f64::max))
        .map(|(min, max)| AxisRange { min, max });
    if color_range.is_none() {
        return Err(DashError::EmptySelection);
    }

    Ok(ChoroplethChart {
        title: format!(
            "ASR of {} cancer of {} by Health Region : Year {}",
            site,
            sex.label(),
            map_year
        ),
        site: site.to_string(),
        sex: sex.label().to_string(),
        provinces: shades,
        color_range,
        color_scale: "Blues".to_string(),
        location_key: province::PROVINCE_CODE.to_string(),
        feature_id_key: "properties.pro_code".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TableKind;

    fn regions() -> RecordTable {
        let raw = df!(
            "healthregion" => [1.0f64, 1.0, 2.0, 2.0, 3.0],
            "Sex" => ["Male", "Female", "Male", "Female", "Male"],
            "Site" => ["Lung", "Lung", "Lung", "Lung", "Liver"],
            "ASR World" => [10.0f64, 4.0, 8.0, 3.0, 20.0]
        )
        .unwrap();
        RecordTable::from_frame(TableKind::Region, raw).unwrap()
    }

    fn provinces() -> RecordTable {
        let raw = df!(
            "provine_code" => ["50", "10", "40", "90"],
            "province" => ["Chiang Mai", "Bangkok", "Khon Kaen", "Songkhla"],
            "health_region" => ["1", "13", "2", "1"]
        )
        .unwrap();
        RecordTable::from_frame(TableKind::ProvinceRegion, raw).unwrap()
    }

    #[test]
    fn both_sexes_sum_and_unmatched_provinces_stay() {
        let criteria = SelectionCriteria::new()
            .with_site("Lung")
            .with_sex(SexSelection::Both);
        let chart = build_region_map(&regions(), &provinces(), &criteria, 2020).unwrap();

        let codes: Vec<&str> = chart.provinces.iter().map(|p| p.province_code.as_str()).collect();
        assert_eq!(codes, vec!["50", "10", "40", "90"]);
        let rates: Vec<Option<f64>> = chart.provinces.iter().map(|p| p.rate).collect();
        assert_eq!(rates, vec![Some(14.0), None, Some(11.0), Some(14.0)]);
        assert_eq!(chart.color_range, Some(AxisRange { min: 11.0, max: 14.0 }));
        assert_eq!(
            chart.title,
            "ASR of Lung cancer of Both by Health Region : Year 2020"
        );
    }

    #[test]
    fn specific_sex_uses_only_its_rows() {
        let criteria = SelectionCriteria::new()
            .with_site("Lung")
            .with_sex(SexSelection::Specific("Female".into()));
        let chart = build_region_map(&regions(), &provinces(), &criteria, 2020).unwrap();
        assert_eq!(chart.provinces[0].rate, Some(4.0));
        assert_eq!(chart.provinces[2].rate, Some(3.0));
    }

    #[test]
    fn site_with_no_region_rows_is_empty_selection() {
        let criteria = SelectionCriteria::new()
            .with_site("Kidney")
            .with_sex(SexSelection::Both);
        assert!(matches!(
            build_region_map(&regions(), &provinces(), &criteria, 2020),
            Err(DashError::EmptySelection)
        ));
    }
}
