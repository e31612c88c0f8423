use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyModule;
use pyo3_polars::PyDataFrame;

use crate::chart::ChartKind;
use crate::config::DashboardConfig;
use crate::dashboard::{Dashboard, Trigger};
use crate::error::DashError;
use crate::schema::{self, TableKind};

fn table_kind(name: &str) -> PyResult<TableKind> {
    TableKind::parse(name).ok_or_else(|| PyValueError::new_err(format!("unknown table '{name}'")))
}

fn chart_kind(name: &str) -> PyResult<ChartKind> {
    ChartKind::parse(name).ok_or_else(|| PyValueError::new_err(format!("unknown chart '{name}'")))
}

fn to_json<T: serde::Serialize>(value: &T) -> PyResult<String> {
    Ok(serde_json::to_string(value).map_err(DashError::from)?)
}

#[pyclass(name = "Dashboard")]
pub struct PyDashboard {
    inner: Dashboard,
}

#[pymethods]
impl PyDashboard {
    /// Load all tables. `data_dir` overrides the config's directory.
    #[new]
    #[pyo3(signature = (config_path=None, data_dir=None))]
    fn new(config_path: Option<&str>, data_dir: Option<&str>) -> PyResult<Self> {
        let mut config = match config_path {
            Some(path) => DashboardConfig::from_json_file(path)?,
            None => DashboardConfig::default(),
        };
        if let Some(dir) = data_dir {
            config = config.with_data_dir(dir);
        }
        Ok(Self {
            inner: Dashboard::load(config),
        })
    }

    /// Option set of one table, as JSON.
    fn options(&self, table: &str) -> PyResult<String> {
        let options = self.inner.store().options(table_kind(table)?)?;
        to_json(options)
    }

    /// Filter panel of one chart kind, as JSON.
    fn panel(&self, kind: &str) -> PyResult<String> {
        to_json(&self.inner.panel(chart_kind(kind)?))
    }

    /// Returns `(shown_kind, outcome_json)`; keep `shown_kind` as the next
    /// `previous`.
    #[pyo3(signature = (trigger, previous="trend", criteria_json="{}"))]
    fn handle(&self, trigger: &str, previous: &str, criteria_json: &str) -> PyResult<(String, String)> {
        let trigger = Trigger::parse(trigger)
            .ok_or_else(|| PyValueError::new_err(format!("unknown trigger '{trigger}'")))?;
        let previous = chart_kind(previous)?;

        let (kind, outcome) = self.inner.handle_json(trigger, previous, criteria_json);
        Ok((kind.name().to_string(), to_json(&outcome)?))
    }

    fn is_available(&self, table: &str) -> PyResult<bool> {
        Ok(self.inner.store().is_available(table_kind(table)?))
    }

    /// Loaded table with canonical column names.
    fn table(&self, name: &str) -> PyResult<PyDataFrame> {
        let table = self.inner.store().table(table_kind(name)?)?;
        Ok(PyDataFrame(table.frame().clone()))
    }

    #[getter]
    fn incidence(&self) -> PyResult<PyDataFrame> {
        self.table(TableKind::Incidence.name())
    }

    #[getter]
    fn survival(&self) -> PyResult<PyDataFrame> {
        self.table(TableKind::Survival.name())
    }
}

/// Export column names as Python submodules
fn add_schema_exports(m: &Bound<'_, PyModule>) -> PyResult<()> {
    let incidence = PyModule::new(m.py(), "incidence")?;
    incidence.add("POPULATION", schema::incidence::POPULATION)?;
    incidence.add("SEX", schema::incidence::SEX)?;
    incidence.add("SITE", schema::incidence::SITE)?;
    incidence.add("YEAR", schema::incidence::YEAR)?;
    incidence.add("RATE", schema::incidence::RATE)?;
    m.add_submodule(&incidence)?;

    let age = PyModule::new(m.py(), "age")?;
    age.add("SEX", schema::age::SEX)?;
    age.add("SITE", schema::age::SITE)?;
    age.add("YEAR", schema::age::YEAR)?;
    age.add("AGE_GROUP", schema::age::AGE_GROUP)?;
    age.add("RATE", schema::age::RATE)?;
    age.add("ORDER", schema::age::ORDER.to_vec())?;
    m.add_submodule(&age)?;

    let region = PyModule::new(m.py(), "region")?;
    region.add("HEALTH_REGION", schema::region::HEALTH_REGION)?;
    region.add("SEX", schema::region::SEX)?;
    region.add("SITE", schema::region::SITE)?;
    region.add("RATE", schema::region::RATE)?;
    m.add_submodule(&region)?;

    let survival = PyModule::new(m.py(), "survival")?;
    survival.add("REGION", schema::survival::REGION)?;
    survival.add("CANCER", schema::survival::CANCER)?;
    survival.add("STAGE", schema::survival::STAGE)?;
    survival.add("TIME_YEARS", schema::survival::TIME_YEARS)?;
    survival.add("SURVIVAL_PCT", schema::survival::SURVIVAL_PCT)?;
    survival.add("ALL_REGIONS", schema::survival::ALL_REGIONS)?;
    m.add_submodule(&survival)?;

    let province = PyModule::new(m.py(), "province")?;
    province.add("PROVINCE_CODE", schema::province::PROVINCE_CODE)?;
    province.add("PROVINCE_NAME", schema::province::PROVINCE_NAME)?;
    province.add("HEALTH_REGION", schema::province::HEALTH_REGION)?;
    m.add_submodule(&province)?;

    Ok(())
}

#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyDashboard>()?;
    add_schema_exports(m)?;
    Ok(())
}
