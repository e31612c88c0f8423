//! The wheel layout must agree with the extension module's init symbol.

const PYPROJECT: &str = include_str!("../pyproject.toml");
const BINDINGS: &str = include_str!("../src/python.rs");
const PACKAGE_INIT: &str = include_str!("../python/cancer_trends/__init__.py");

fn maturin_value(key: &str) -> Option<&'static str> {
    let table = PYPROJECT.split("[tool.maturin]").nth(1)?;
    table
        .lines()
        .take_while(|line| !line.trim_start().starts_with('['))
        .filter_map(|line| line.split_once('='))
        .find(|(k, _)| k.trim() == key)
        .map(|(_, v)| v.trim())
}

#[test]
fn extension_module_name_matches_the_pymodule() {
    assert_eq!(maturin_value("module-name"), Some("\"cancer_trends._core\""));
    assert!(BINDINGS.contains("#[pymodule]\nfn _core("));
    assert!(PACKAGE_INIT.contains("from ._core import Dashboard"));
}

#[test]
fn wheel_builds_with_the_python_feature() {
    assert_eq!(maturin_value("features"), Some("[\"python\"]"));
    assert_eq!(maturin_value("python-source"), Some("\"python\""));
}
