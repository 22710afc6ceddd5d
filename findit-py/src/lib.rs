//! Python bindings for the findit image matching library.
//!
//! Exposes a `FindIt` class with the `load_template` / `find` / `clear`
//! session API. Results come back as plain Python dicts.

use numpy::{PyReadonlyArray2, PyUntypedArrayMethods};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;

use findit::{
    EngineOptions, ErrorCategory, ExecuteOptions, FindItError, MatchResult, Matcher as RustMatcher,
    RasterBuffer, Verbosity,
};

/// Convert a FindItError to a Python exception.
fn to_py_err(err: FindItError) -> PyErr {
    match err.category() {
        ErrorCategory::Configuration | ErrorCategory::Input => {
            PyValueError::new_err(err.to_string())
        }
        ErrorCategory::EmptyInput | ErrorCategory::External => {
            PyRuntimeError::new_err(err.to_string())
        }
    }
}

fn raster_from_array(array: &PyReadonlyArray2<'_, u8>) -> PyResult<RasterBuffer> {
    let shape = array.shape();
    let height = shape[0];
    let width = shape[1];
    let data = array.as_slice()?.to_vec();
    RasterBuffer::new(data, width, height).map_err(to_py_err)
}

/// Decodes either a path or an in-memory array; exactly one must be set.
fn resolve_image(
    what: &str,
    path: Option<&str>,
    object: Option<PyReadonlyArray2<'_, u8>>,
) -> PyResult<Option<RasterBuffer>> {
    match (path, object) {
        (Some(_), Some(_)) => Err(PyValueError::new_err(format!(
            "{what}: pass either a path or an array, not both"
        ))),
        (Some(path), None) => findit::image::io::load_gray_image(path)
            .map(Some)
            .map_err(to_py_err),
        (None, Some(object)) => raster_from_array(&object).map(Some),
        (None, None) => Ok(None),
    }
}

fn result_to_py(py: Python<'_>, result: &MatchResult) -> PyResult<Py<PyAny>> {
    let text = serde_json::to_string(result)
        .map_err(|e| PyRuntimeError::new_err(e.to_string()))?;
    let loaded = py.import("json")?.call_method1("loads", (text,))?;
    Ok(loaded.unbind())
}

fn options_from_kwargs(
    py: Python<'_>,
    kwargs: Option<&Bound<'_, PyDict>>,
) -> PyResult<EngineOptions> {
    let Some(kwargs) = kwargs else {
        return Ok(EngineOptions::default());
    };
    let text: String = py
        .import("json")?
        .call_method1("dumps", (kwargs,))?
        .extract()?;
    let value: serde_json::Value =
        serde_json::from_str(&text).map_err(|e| PyValueError::new_err(e.to_string()))?;
    EngineOptions::from_json(value).map_err(to_py_err)
}

/// Matching session over a set of engines.
///
/// Args:
///     engine: engine names to run, in order (default: ["template"])
///     pro_mode: return full engine content instead of the brief view
///     **kwargs: `engine_<name>_<option>` settings
#[pyclass]
pub struct FindIt {
    inner: RustMatcher,
}

#[pymethods]
impl FindIt {
    #[new]
    #[pyo3(signature = (engine = None, pro_mode = false, **kwargs))]
    fn new(
        py: Python<'_>,
        engine: Option<Vec<String>>,
        pro_mode: bool,
        kwargs: Option<&Bound<'_, PyDict>>,
    ) -> PyResult<Self> {
        let engines = engine.unwrap_or_else(|| vec!["template".to_string()]);
        let options = options_from_kwargs(py, kwargs)?;
        let inner = RustMatcher::with_options(engines, options)
            .map_err(to_py_err)?
            .with_verbosity(Verbosity::from_pro_mode(pro_mode));
        Ok(Self { inner })
    }

    /// Register a template by path or as a 2D uint8 array.
    #[pyo3(signature = (name, pic_path = None, pic_object = None))]
    fn load_template(
        &mut self,
        name: &str,
        pic_path: Option<&str>,
        pic_object: Option<PyReadonlyArray2<'_, u8>>,
    ) -> PyResult<()> {
        if let (Some(path), None) = (pic_path, pic_object.as_ref()) {
            return self.inner.load_template_path(name, path).map_err(to_py_err);
        }
        let raster = resolve_image("template", pic_path, pic_object)?
            .ok_or_else(|| PyValueError::new_err("template: pic_path or pic_object is required"))?;
        self.inner.load_template(name, raster).map_err(to_py_err)
    }

    /// Match every loaded template against the target.
    ///
    /// Returns:
    ///     dict with `target_name`, `target_path` and `data`
    #[pyo3(signature = (
        target_pic_name,
        target_pic_path = None,
        target_pic_object = None,
        mask_pic_path = None,
        mask_pic_object = None
    ))]
    fn find(
        &self,
        py: Python<'_>,
        target_pic_name: &str,
        target_pic_path: Option<&str>,
        target_pic_object: Option<PyReadonlyArray2<'_, u8>>,
        mask_pic_path: Option<&str>,
        mask_pic_object: Option<PyReadonlyArray2<'_, u8>>,
    ) -> PyResult<Py<PyAny>> {
        let target = resolve_image("target", target_pic_path, target_pic_object)?.ok_or_else(|| {
            PyValueError::new_err("target: target_pic_path or target_pic_object is required")
        })?;
        let mask = resolve_image("mask", mask_pic_path, mask_pic_object)?;
        let extras = match &mask {
            Some(mask) => ExecuteOptions::with_mask(mask.view()),
            None => ExecuteOptions::default(),
        };

        let mut result = self
            .inner
            .find(target_pic_name, target.view(), &extras)
            .map_err(to_py_err)?;
        result.target_path = target_pic_path.map(str::to_string);
        result_to_py(py, &result)
    }

    /// Drop every loaded template.
    fn clear(&mut self) {
        self.inner.clear();
    }

    #[getter]
    fn engines(&self) -> Vec<String> {
        self.inner.engine_names().to_vec()
    }

    #[getter]
    fn template_names(&self) -> Vec<String> {
        self.inner.store().names().map(str::to_string).collect()
    }

    fn __repr__(&self) -> String {
        format!(
            "FindIt(engines={:?}, templates={})",
            self.inner.engine_names(),
            self.inner.store().len()
        )
    }
}

/// Python module for findit.
#[pymodule]
fn _findit(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<FindIt>()?;
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    Ok(())
}
