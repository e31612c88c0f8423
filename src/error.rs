use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashError {
    #[error("Failed to load {table}: {reason}")]
    DataLoad { table: String, reason: String },

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Unsupported source format: {0}")]
    UnsupportedFormat(String),

    #[error("Table not available: {table} ({reason})")]
    TableUnavailable { table: String, reason: String },

    #[error("No data available for selected filters")]
    EmptySelection,

    #[error("Insufficient data for prediction (need at least 2 data points, got {0})")]
    InsufficientData(usize),

    #[error("Please select {0}")]
    MissingCriteria(String),

    #[error("Invalid selection: {0}")]
    InvalidCriteria(String),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DashError>;

impl DashError {
    pub(crate) fn load(table: impl Into<String>, reason: impl ToString) -> Self {
        DashError::DataLoad {
            table: table.into(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(feature = "python")]
impl From<DashError> for pyo3::PyErr {
    fn from(err: DashError) -> pyo3::PyErr {
        pyo3::exceptions::PyRuntimeError::new_err(err.to_string())
    }
}
