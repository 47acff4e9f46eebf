use axiomkit_xlsx_codec::conf::FORMAT_XLSX;
use axiomkit_xlsx_codec::spec::{
    EnumHeaderSpec, Key, SpecXlsxCodecContext, SpecXlsxCodecOptions, Value, XlsxCodecError,
};
use axiomkit_xlsx_codec::XlsxCodec as RsXlsxCodec;
use indexmap::IndexMap;
use pyo3::exceptions::{PyRuntimeError, PyTypeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyAny, PyBool, PyBytes, PyDict, PyFloat, PyInt, PyList, PyString, PyTuple};

const N_BRIDGE_ABI_VERSION: u64 = 1;
const C_BRIDGE_CONTRACT_VERSION: &str = "axiomkit.xlsx.codec.v1";

#[pyclass(name = "XlsxCodec")]
struct PyXlsxCodec {
    inner: RsXlsxCodec,
}

#[pymethods]
impl PyXlsxCodec {
    #[new]
    #[pyo3(signature = (**defaults))]
    fn new(defaults: Option<&Bound<'_, PyDict>>) -> PyResult<Self> {
        let cfg_context = parse_spec_xlsx_codec_context(defaults)?;
        let cfg_options = SpecXlsxCodecOptions::default().overlay(&cfg_context);
        Ok(Self {
            inner: RsXlsxCodec::new(cfg_options),
        })
    }

    #[getter]
    fn key_separator(&self) -> String {
        self.inner.options().key_separator.clone()
    }

    #[getter]
    fn no_headers(&self) -> bool {
        self.inner.options().no_headers
    }

    #[getter]
    fn as_collection(&self) -> bool {
        self.inner.options().as_collection
    }

    fn supports_encoding(&self, format: &str) -> bool {
        self.inner.supports_encoding(format)
    }

    fn supports_decoding(&self, format: &str) -> bool {
        self.inner.supports_decoding(format)
    }

    #[pyo3(signature = (data, format = FORMAT_XLSX, **context))]
    fn encode<'py>(
        &self,
        py: Python<'py>,
        data: &Bound<'py, PyAny>,
        format: &str,
        context: Option<&Bound<'py, PyDict>>,
    ) -> PyResult<Bound<'py, PyBytes>> {
        let value = convert_py_to_value(data)?;
        let cfg_context = parse_spec_xlsx_codec_context(context)?;

        let v_bytes = py
            .allow_threads(|| self.inner.encode_as(&value, format, &cfg_context))
            .map_err(derive_py_err)?;
        Ok(PyBytes::new(py, &v_bytes))
    }

    #[pyo3(signature = (data, format = FORMAT_XLSX, **context))]
    fn decode<'py>(
        &self,
        py: Python<'py>,
        data: &[u8],
        format: &str,
        context: Option<&Bound<'py, PyDict>>,
    ) -> PyResult<Bound<'py, PyAny>> {
        let cfg_context = parse_spec_xlsx_codec_context(context)?;

        let value = py
            .allow_threads(|| self.inner.decode_as(data, format, &cfg_context))
            .map_err(derive_py_err)?;
        convert_value_to_py(py, &value)
    }
}

fn derive_py_err(err: XlsxCodecError) -> PyErr {
    match &err {
        XlsxCodecError::InvalidTextEncoding | XlsxCodecError::UnsupportedFormat(_) => {
            PyValueError::new_err(err.to_string())
        }
        XlsxCodecError::MalformedDocument(_) | XlsxCodecError::Write(_) => {
            PyRuntimeError::new_err(err.to_string())
        }
    }
}

fn parse_spec_xlsx_codec_context(
    obj: Option<&Bound<'_, PyDict>>,
) -> PyResult<SpecXlsxCodecContext> {
    let mut cfg_context = SpecXlsxCodecContext::default();
    let Some(obj) = obj else {
        return Ok(cfg_context);
    };

    for (key, val) in obj.iter() {
        let c_key = key.extract::<String>()?;
        if val.is_none() {
            continue;
        }
        match c_key.as_str() {
            "key_separator" | "xlsx_key_separator" => {
                cfg_context.key_separator = Some(val.extract::<String>()?);
            }
            "headers" | "xlsx_headers" => {
                cfg_context.headers = Some(parse_header_spec(&val)?);
            }
            "escape_formulas" | "xlsx_escape_formulas" => {
                cfg_context.escape_formulas = Some(val.extract::<bool>()?);
            }
            "no_headers" => cfg_context.no_headers = Some(val.extract::<bool>()?),
            "output_utf8_bom" => cfg_context.output_utf8_bom = Some(val.extract::<bool>()?),
            "as_collection" => cfg_context.as_collection = Some(val.extract::<bool>()?),
            _ => {
                return Err(PyValueError::new_err(format!(
                    "Unknown xlsx codec option: {c_key:?}."
                )));
            }
        }
    }
    Ok(cfg_context)
}

fn parse_header_spec(obj: &Bound<'_, PyAny>) -> PyResult<EnumHeaderSpec> {
    if let Ok(dict_header) = obj.downcast::<PyDict>() {
        let mut dict_label_by_key = IndexMap::with_capacity(dict_header.len());
        for (key, label) in dict_header.iter() {
            dict_label_by_key.insert(key.extract::<String>()?, label.extract::<String>()?);
        }
        return Ok(EnumHeaderSpec::Mapping(dict_label_by_key));
    }
    if let Ok(l_columns) = obj.extract::<Vec<String>>() {
        return Ok(EnumHeaderSpec::Columns(l_columns));
    }

    Err(PyValueError::new_err(
        "headers must be sequence[str], dict[str, str], or None.",
    ))
}

fn convert_py_to_key(obj: &Bound<'_, PyAny>) -> PyResult<Key> {
    if let Ok(c_key) = obj.downcast::<PyString>() {
        return Ok(Key::Name(c_key.extract::<String>()?));
    }
    if obj.is_instance_of::<PyInt>() && !obj.is_instance_of::<PyBool>() {
        return obj
            .extract::<u64>()
            .map(Key::Index)
            .map_err(|_| PyValueError::new_err("Integer keys must be non-negative."));
    }

    Err(PyTypeError::new_err(format!(
        "Mapping keys must be str or int, got: {}",
        obj.get_type().name()?
    )))
}

fn convert_py_to_value(obj: &Bound<'_, PyAny>) -> PyResult<Value> {
    if obj.is_none() {
        return Ok(Value::Null);
    }
    if let Ok(b) = obj.downcast::<PyBool>() {
        return Ok(Value::Bool(b.is_true()));
    }
    if obj.is_instance_of::<PyInt>() {
        return Ok(Value::Integer(obj.extract::<i64>()?));
    }
    if let Ok(f) = obj.downcast::<PyFloat>() {
        return Ok(Value::Float(f.value()));
    }
    if obj.is_instance_of::<PyString>() {
        return Ok(Value::String(obj.extract::<String>()?));
    }
    if let Ok(dict_obj) = obj.downcast::<PyDict>() {
        let mut dict_entries = IndexMap::with_capacity(dict_obj.len());
        for (key, val) in dict_obj.iter() {
            dict_entries.insert(convert_py_to_key(&key)?, convert_py_to_value(&val)?);
        }
        return Ok(Value::Mapping(dict_entries));
    }
    if let Ok(l_items) = obj.downcast::<PyList>() {
        return l_items
            .iter()
            .map(|item| convert_py_to_value(&item))
            .collect::<PyResult<Vec<_>>>()
            .map(Value::Sequence);
    }
    if let Ok(tup_items) = obj.downcast::<PyTuple>() {
        return tup_items
            .iter()
            .map(|item| convert_py_to_value(&item))
            .collect::<PyResult<Vec<_>>>()
            .map(Value::Sequence);
    }

    Err(PyTypeError::new_err(format!(
        "Unsupported value type for xlsx encoding: {}",
        obj.get_type().name()?
    )))
}

fn convert_value_to_py<'py>(py: Python<'py>, value: &Value) -> PyResult<Bound<'py, PyAny>> {
    let obj = match value {
        Value::Null => py.None().into_bound(py),
        Value::Bool(val) => PyBool::new(py, *val).to_owned().into_any(),
        Value::Integer(val) => (*val).into_pyobject(py)?.into_any(),
        Value::Float(val) => PyFloat::new(py, *val).into_any(),
        Value::String(val) => PyString::new(py, val).into_any(),
        Value::Sequence(items) => {
            let l_items = items
                .iter()
                .map(|item| convert_value_to_py(py, item))
                .collect::<PyResult<Vec<_>>>()?;
            PyList::new(py, l_items)?.into_any()
        }
        Value::Mapping(entries) => {
            let dict_obj = PyDict::new(py);
            for (key, val) in entries {
                let obj_val = convert_value_to_py(py, val)?;
                match key {
                    Key::Index(idx) => dict_obj.set_item(*idx, obj_val)?,
                    Key::Name(name) => dict_obj.set_item(name, obj_val)?,
                }
            }
            dict_obj.into_any()
        }
    };
    Ok(obj)
}

#[pymodule]
fn _axiomkit_xlsx_codec_rs(_py: Python<'_>, module: &Bound<'_, PyModule>) -> PyResult<()> {
    module.add_class::<PyXlsxCodec>()?;
    module.add("FORMAT_XLSX", FORMAT_XLSX)?;
    module.add("__bridge_abi__", N_BRIDGE_ABI_VERSION)?;
    module.add("__bridge_contract__", C_BRIDGE_CONTRACT_VERSION)?;
    Ok(())
}
