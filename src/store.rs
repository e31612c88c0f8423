use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use log::{info, warn};
use polars::prelude::*;

use crate::config::DashboardConfig;
use crate::error::{DashError, Result};
use crate::options::{self, OptionSet};
use crate::schema::{incidence, ColumnType, TableKind};

/// An immutable, schema-checked table.
///
/// Columns are renamed to the canonical names in `schema`, restricted to the
/// declared set, and coerced to their declared types.
#[derive(Debug, Clone)]
pub struct RecordTable {
    kind: TableKind,
    df: DataFrame,
}

/// Row-level restrictions applied while loading.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Keep only incidence rows with this population label
    pub population: Option<String>,
}

impl RecordTable {
    /// Validate and coerce a raw frame into the declared shape for `kind`.
    pub fn from_frame(kind: TableKind, raw: DataFrame) -> Result<Self> {
        let df = canonicalize(kind, raw)?;
        let df = coerce(kind, df)?;
        Ok(Self { kind, df })
    }

    pub(crate) fn from_coerced(kind: TableKind, df: DataFrame) -> Self {
        Self { kind, df }
    }

    pub fn kind(&self) -> TableKind {
        self.kind
    }

    pub fn frame(&self) -> &DataFrame {
        &self.df
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// Same kind, no rows.
    pub fn empty_like(&self) -> Self {
        Self {
            kind: self.kind,
            df: self.df.clear(),
        }
    }

    pub(crate) fn texts(&self, column: &str) -> Result<Vec<Option<String>>> {
        let ca = self.df.column(column)?.str()?;
        Ok(ca.into_iter().map(|v| v.map(|s| s.to_string())).collect())
    }

    pub(crate) fn floats(&self, column: &str) -> Result<Vec<Option<f64>>> {
        let ca = self.df.column(column)?.f64()?;
        Ok(ca.into_iter().collect())
    }

    pub(crate) fn years(&self, column: &str) -> Result<Vec<Option<i32>>> {
        let ca = self.df.column(column)?.i32()?;
        Ok(ca.into_iter().collect())
    }
}

/// Load one source table.
///
/// CSV files are read with every column as text and then coerced; Parquet
/// files keep their stored types until coercion. Any failure is reported as
/// a `DataLoad` error naming the table.
pub fn load_table(path: &Path, kind: TableKind, options: &LoadOptions) -> Result<RecordTable> {
    load_table_inner(path, kind, options).map_err(|e| match e {
        DashError::DataLoad { .. } => e,
        other => DashError::load(kind.name(), other),
    })
}

fn load_table_inner(path: &Path, kind: TableKind, options: &LoadOptions) -> Result<RecordTable> {
    let raw = read_source(path)?;
    let mut table = RecordTable::from_frame(kind, raw)?;

    if let (TableKind::Incidence, Some(population)) = (kind, options.population.as_deref()) {
        let before = table.height();
        table.df = table
            .df
            .lazy()
            .filter(col(incidence::POPULATION).eq(lit(population)))
            .collect()?;
        info!(
            "{}: kept {} of {} rows for population '{}'",
            kind.name(),
            table.height(),
            before,
            population
        );
    }

    info!("Loaded {} ({} rows) from {}", kind.name(), table.height(), path.display());
    Ok(table)
}

fn read_source(path: &Path) -> Result<DataFrame> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "csv" => {
            let df = CsvReadOptions::default()
                .with_has_header(true)
                .with_infer_schema_length(Some(0)) // all columns as String
                .try_into_reader_with_file_path(Some(path.to_path_buf()))?
                .finish()?;
            Ok(df)
        }
        "parquet" => {
            let file = File::open(path)?;
            Ok(ParquetReader::new(file).finish()?)
        }
        _ => Err(DashError::UnsupportedFormat(path.display().to_string())),
    }
}

/// Trim headers, rename known aliases, check and select the declared columns.
fn canonicalize(kind: TableKind, mut df: DataFrame) -> Result<DataFrame> {
    let mut taken: Vec<&str> = Vec::new();
    let renamed: Vec<String> = df
        .get_column_names_str()
        .iter()
        .map(|header| match kind.canonical_name(header) {
            Some(name) if !taken.contains(&name) => {
                taken.push(name);
                name.to_string()
            }
            _ => header.trim().to_string(),
        })
        .collect();
    df.set_column_names(renamed.iter().map(String::as_str))?;

    for spec in kind.columns() {
        if df.column(spec.name).is_err() {
            return Err(DashError::MissingColumn(spec.name.to_string()));
        }
    }

    let names: Vec<&str> = kind.columns().iter().map(|c| c.name).collect();
    Ok(df.select(names)?)
}

/// Cast each declared column and drop rows whose numeric fields are unusable.
fn coerce(kind: TableKind, df: DataFrame) -> Result<DataFrame> {
    let mut casts: Vec<Expr> = Vec::new();
    let mut keep = lit(true);

    for spec in kind.columns() {
        let dtype = df.column(spec.name)?.dtype().clone();
        let source = if dtype == DataType::String {
            col(spec.name).str().strip_chars(lit(" \t\r\n"))
        } else {
            col(spec.name)
        };
        let expr = match spec.ty {
            // Numeric ids must read "2", never "2.0"
            ColumnType::Text if dtype.is_float() => {
                source.cast(DataType::Int64).cast(DataType::String)
            }
            ColumnType::Text if dtype == DataType::String => {
                source.str().replace(lit(r"^(\d+)\.0+$"), lit("$1"), false)
            }
            ColumnType::Text => source.cast(DataType::String),
            ColumnType::Year => source.cast(DataType::Float64).cast(DataType::Int32),
            ColumnType::Rate => source.cast(DataType::Float64),
        };
        casts.push(expr.alias(spec.name));

        match spec.ty {
            ColumnType::Text => {}
            ColumnType::Year => keep = keep.and(col(spec.name).is_not_null()),
            ColumnType::Rate => {
                keep = keep.and(
                    col(spec.name)
                        .is_not_null()
                        .and(col(spec.name).is_finite())
                        .and(col(spec.name).gt_eq(lit(0.0))),
                )
            }
        }
    }

    let before = df.height();
    let out = df.lazy().with_columns(casts).filter(keep).collect()?;
    let dropped = before - out.height();
    if dropped > 0 {
        warn!(
            "{}: dropped {} rows with missing, non-finite or negative numeric values",
            kind.name(),
            dropped
        );
    }
    Ok(out)
}

enum TableSlot {
    Ready { table: RecordTable, options: OptionSet },
    Unavailable(String),
}

/// All tables, loaded once at startup and never reloaded.
///
/// A table that failed to load stays unavailable; only the charts that need
/// it degrade.
pub struct DataStore {
    slots: HashMap<TableKind, TableSlot>,
}

impl DataStore {
    pub fn load(config: &DashboardConfig) -> Self {
        let load_options = LoadOptions {
            population: Some(config.population.clone()),
        };
        let mut store = Self::empty();
        for kind in TableKind::ALL {
            let path = config.table_path(kind);
            match load_table(&path, kind, &load_options) {
                Ok(table) => store.insert(table),
                Err(e) => {
                    warn!("{e}; charts using {} will show a placeholder", kind.name());
                    store
                        .slots
                        .insert(kind, TableSlot::Unavailable(e.to_string()));
                }
            }
        }
        store
    }

    pub fn empty() -> Self {
        Self {
            slots: HashMap::new(),
        }
    }

    /// Add an already-built table, computing its option set.
    pub fn with_table(mut self, table: RecordTable) -> Self {
        self.insert(table);
        self
    }

    fn insert(&mut self, table: RecordTable) {
        let kind = table.kind();
        let slot = match options::extract(&table) {
            Ok(options) => TableSlot::Ready { table, options },
            Err(e) => TableSlot::Unavailable(e.to_string()),
        };
        self.slots.insert(kind, slot);
    }

    pub fn table(&self, kind: TableKind) -> Result<&RecordTable> {
        match self.slots.get(&kind) {
            Some(TableSlot::Ready { table, .. }) => Ok(table),
            _ => Err(self.unavailable(kind)),
        }
    }

    /// Option set computed when the table was loaded.
    pub fn options(&self, kind: TableKind) -> Result<&OptionSet> {
        match self.slots.get(&kind) {
            Some(TableSlot::Ready { options, .. }) => Ok(options),
            _ => Err(self.unavailable(kind)),
        }
    }

    fn unavailable(&self, kind: TableKind) -> DashError {
        let reason = match self.slots.get(&kind) {
            Some(TableSlot::Unavailable(reason)) => reason.clone(),
            _ => "not loaded".to_string(),
        };
        DashError::TableUnavailable {
            table: kind.name().to_string(),
            reason,
        }
    }

    pub fn is_available(&self, kind: TableKind) -> bool {
        matches!(self.slots.get(&kind), Some(TableSlot::Ready { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{age, survival};

    fn raw_incidence() -> DataFrame {
        df!(
            "Population" => ["Thailand", "Thailand", "Bangkok"],
            "Sex" => ["Male", "Female", "Male"],
            "Site" => ["Lung", "Lung", "Lung"],
            "Year" => [" 2018 ", "2019.0", "2018"],
            "ASR World" => ["10.5", "n/a", "3.0"],
            "Notes" => ["a", "b", "c"]
        )
        .unwrap()
    }

    #[test]
    fn from_frame_renames_selects_and_coerces() {
        let table = RecordTable::from_frame(TableKind::Incidence, raw_incidence()).unwrap();
        // "n/a" rate is dropped
        assert_eq!(table.height(), 2);
        assert_eq!(table.frame().width(), 5);
        assert_eq!(table.years(incidence::YEAR).unwrap(), vec![Some(2018), Some(2018)]);
        assert_eq!(table.floats(incidence::RATE).unwrap(), vec![Some(10.5), Some(3.0)]);
    }

    #[test]
    fn missing_column_is_reported() {
        let raw = df!("Sex" => ["Male"], "Site" => ["Lung"]).unwrap();
        let err = RecordTable::from_frame(TableKind::IncidenceByAge, raw).unwrap_err();
        assert!(matches!(err, DashError::MissingColumn(ref c) if c == age::YEAR));
    }

    #[test]
    fn float_region_ids_become_integer_text() {
        let raw = df!(
            "region" => [2.0f64, 13.0],
            "cancer" => ["breast", "breast"],
            "stage" => ["stage1", "stage1"],
            "time" => [1.0f64, 1.0],
            "surv_time" => [90.0f64, 88.0]
        )
        .unwrap();
        let table = RecordTable::from_frame(TableKind::Survival, raw).unwrap();
        assert_eq!(
            table.texts(survival::REGION).unwrap(),
            vec![Some("2".to_string()), Some("13".to_string())]
        );
    }

    #[test]
    fn non_finite_rates_are_dropped() {
        let raw = df!(
            "Population" => ["Thailand"; 4],
            "Sex" => ["Male", "Male", "Female", "Female"],
            "Site" => ["Lung", "Liver", "Lung", "Liver"],
            "Year" => ["2018"; 4],
            "ASR World" => ["NaN", "5", "inf", "4"]
        )
        .unwrap();
        let table = RecordTable::from_frame(TableKind::Incidence, raw).unwrap();
        assert_eq!(table.floats(incidence::RATE).unwrap(), vec![Some(5.0), Some(4.0)]);
    }

    #[test]
    fn text_region_ids_lose_trailing_zero_decimals() {
        let raw = df!(
            "region" => ["2.0", "13.00", "all", "2.5"],
            "cancer" => ["breast"; 4],
            "stage" => ["stage1"; 4],
            "time" => ["1"; 4],
            "surv_time" => ["90", "88", "91", "80"]
        )
        .unwrap();
        let table = RecordTable::from_frame(TableKind::Survival, raw).unwrap();
        assert_eq!(
            table.texts(survival::REGION).unwrap(),
            vec![
                Some("2".to_string()),
                Some("13".to_string()),
                Some("all".to_string()),
                Some("2.5".to_string())
            ]
        );
    }

    #[test]
    fn unsupported_extension_is_a_load_error() {
        let err = load_table(
            Path::new("tables/asr.xlsx"),
            TableKind::Incidence,
            &LoadOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, DashError::DataLoad { ref table, .. } if table == "incidence"));
    }

    #[test]
    fn unavailable_tables_are_reported_per_kind() {
        let config = DashboardConfig::default().with_data_dir("/nonexistent/cancer-trends");
        let store = DataStore::load(&config);
        assert!(!store.is_available(TableKind::Survival));
        assert!(matches!(
            store.table(TableKind::Survival),
            Err(DashError::TableUnavailable { .. })
        ));
    }
}
