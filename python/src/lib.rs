use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    str::FromStr,
};

use pmtconv::{ConvertError, Converter, DType, Native, NativeArray, NativeInt, Scalar};
use pmtval::{Complex64, Value, ValueError};
use pyo3::{
    IntoPyObjectExt,
    exceptions::{PyTypeError, PyValueError},
    prelude::*,
    types::{PyBool, PyBytes, PyComplex, PyDict, PyFloat, PyInt, PyList, PyString, PyTuple},
};

fn convert_err(err: ConvertError) -> PyErr {
    match err {
        ConvertError::UnsupportedValueKind(_)
        | ConvertError::UnsupportedNativeType(_)
        | ConvertError::UnsupportedDType(_)
        | ConvertError::ScalarCoercion { .. }
        | ConvertError::UnhashableKey(_)
        | ConvertError::Value(ValueError::WrongType { .. }) => {
            PyErr::new::<PyTypeError, _>(err.to_string())
        }
        _ => PyErr::new::<PyValueError, _>(err.to_string()),
    }
}

fn value_err(err: ValueError) -> PyErr {
    convert_err(ConvertError::Value(err))
}

/// Immutable message value.
#[pyclass(frozen, name = "Pmt")]
pub struct PyPmt(Value);

#[pymethods]
impl PyPmt {
    #[getter]
    fn tag(&self) -> &'static str {
        self.0.tag().into()
    }

    fn __repr__(&self) -> String {
        format!("Pmt({})", self.0)
    }

    fn __str__(&self) -> String {
        self.0.to_string()
    }

    fn __eq__(&self, other: &Bound<'_, PyAny>) -> PyResult<Py<PyAny>> {
        let py = other.py();
        match other.cast::<PyPmt>() {
            Ok(other) => (other.get().0 == self.0).into_py_any(py),
            Err(_) => Ok(py.NotImplemented()),
        }
    }

    fn __hash__(&self) -> isize {
        let mut hasher = DefaultHasher::new();
        self.0.hash(&mut hasher);
        hasher.finish() as isize
    }

    fn __len__(&self) -> PyResult<usize> {
        self.0.length().map_err(value_err)
    }
}

/// Typed numeric buffer, the host side of a uniform vector.
#[pyclass(frozen, name = "TypedArray")]
pub struct PyTypedArray(NativeArray);

#[pymethods]
impl PyTypedArray {
    #[new]
    #[pyo3(signature = (dtype, values, shape = None))]
    fn new(dtype: &str, values: &Bound<'_, PyAny>, shape: Option<Vec<usize>>) -> PyResult<Self> {
        let dtype = DType::from_str(dtype).map_err(|_| {
            PyErr::new::<PyValueError, _>(format!("Unknown dtype '{}'", dtype))
        })?;
        let scalars = values
            .try_iter()?
            .map(|item| scalar_from_py(&item?))
            .collect::<PyResult<Vec<_>>>()?;
        let shape = shape.unwrap_or_else(|| vec![scalars.len()]);
        NativeArray::from_scalars(dtype, &shape, scalars)
            .map(PyTypedArray)
            .map_err(convert_err)
    }

    #[getter]
    fn dtype(&self) -> String {
        self.0.dtype().to_string()
    }

    #[getter]
    fn shape<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyTuple>> {
        PyTuple::new(py, self.0.shape())
    }

    /// Extent of the first dimension.
    fn __len__(&self) -> usize {
        self.0.shape().first().copied().unwrap_or(0)
    }

    /// Elements as a flat list, in row-major order.
    fn tolist<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyList>> {
        let items = self
            .0
            .elements()
            .map(|scalar| native_into_py(py, Native::from(scalar)))
            .collect::<PyResult<Vec<_>>>()?;
        PyList::new(py, items)
    }

    fn __repr__(&self) -> String {
        format!(
            "TypedArray(dtype='{}', shape={:?})",
            self.0.dtype(),
            self.0.shape()
        )
    }
}

fn int_from_py(obj: &Bound<'_, PyAny>) -> PyResult<NativeInt> {
    match obj.extract::<i64>() {
        Ok(i) => Ok(NativeInt::Signed(i)),
        Err(_) => Ok(NativeInt::Unsigned(obj.extract::<u64>()?)),
    }
}

fn scalar_from_py(obj: &Bound<'_, PyAny>) -> PyResult<Scalar> {
    if let Ok(b) = obj.cast::<PyBool>() {
        return Ok(Scalar::Int(b.is_true() as i64));
    }
    if obj.is_instance_of::<PyInt>() {
        return Ok(match int_from_py(obj)? {
            NativeInt::Signed(i) => Scalar::Int(i),
            NativeInt::Unsigned(u) => Scalar::UInt(u),
        });
    }
    if let Ok(f) = obj.cast::<PyFloat>() {
        return Ok(Scalar::Float(f.value()));
    }
    if let Ok(c) = obj.cast::<PyComplex>() {
        return Ok(Scalar::Complex(Complex64::new(c.real(), c.imag())));
    }
    Err(PyErr::new::<PyTypeError, _>(format!(
        "Expected a number, got '{}'",
        obj.get_type().name()?
    )))
}

fn native_from_py(obj: &Bound<'_, PyAny>) -> PyResult<Native> {
    if obj.is_none() {
        return Ok(Native::None);
    }
    // bool is a subclass of int, check it first
    if let Ok(b) = obj.cast::<PyBool>() {
        return Ok(Native::Bool(b.is_true()));
    }
    if let Ok(s) = obj.cast::<PyString>() {
        return Ok(Native::Str(s.to_cow()?.into_owned()));
    }
    if let Ok(b) = obj.cast::<PyBytes>() {
        return Ok(Native::Bytes(b.as_bytes().to_vec()));
    }
    if obj.is_instance_of::<PyInt>() {
        return Ok(Native::Int(int_from_py(obj)?));
    }
    if let Ok(f) = obj.cast::<PyFloat>() {
        return Ok(Native::Float(f.value()));
    }
    if let Ok(c) = obj.cast::<PyComplex>() {
        return Ok(Native::Complex(Complex64::new(c.real(), c.imag())));
    }
    if let Ok(tuple) = obj.cast::<PyTuple>() {
        let items = tuple
            .iter()
            .map(|item| native_from_py(&item))
            .collect::<PyResult<Vec<_>>>()?;
        return Ok(Native::Tuple(items));
    }
    if let Ok(list) = obj.cast::<PyList>() {
        let items = list
            .iter()
            .map(|item| native_from_py(&item))
            .collect::<PyResult<Vec<_>>>()?;
        return Ok(Native::List(items));
    }
    if let Ok(dict) = obj.cast::<PyDict>() {
        let entries = dict
            .iter()
            .map(|(key, item)| Ok((native_from_py(&key)?, native_from_py(&item)?)))
            .collect::<PyResult<Vec<_>>>()?;
        return Ok(Native::Dict(entries));
    }
    if let Ok(array) = obj.cast::<PyTypedArray>() {
        return Ok(Native::Array(array.get().0.clone()));
    }
    Err(PyErr::new::<PyTypeError, _>(format!(
        "Cannot convert object of type '{}' to a Pmt",
        obj.get_type().name()?
    )))
}

fn native_into_py(py: Python<'_>, native: Native) -> PyResult<Bound<'_, PyAny>> {
    match native {
        Native::None => Ok(py.None().into_bound(py)),
        Native::Bool(b) => b.into_bound_py_any(py),
        Native::Str(s) => s.into_bound_py_any(py),
        Native::Bytes(bytes) => Ok(PyBytes::new(py, &bytes).into_any()),
        Native::Int(NativeInt::Signed(i)) => i.into_bound_py_any(py),
        Native::Int(NativeInt::Unsigned(u)) => u.into_bound_py_any(py),
        Native::Float(x) => x.into_bound_py_any(py),
        Native::Complex(c) => Ok(PyComplex::from_doubles(py, c.re, c.im).into_any()),
        Native::Tuple(items) => {
            let items = items
                .into_iter()
                .map(|item| native_into_py(py, item))
                .collect::<PyResult<Vec<_>>>()?;
            Ok(PyTuple::new(py, items)?.into_any())
        }
        Native::List(items) => {
            let items = items
                .into_iter()
                .map(|item| native_into_py(py, item))
                .collect::<PyResult<Vec<_>>>()?;
            Ok(PyList::new(py, items)?.into_any())
        }
        Native::Dict(entries) => {
            let dict = PyDict::new(py);
            for (key, item) in entries {
                let key = key.into_key().map_err(convert_err)?;
                dict.set_item(native_into_py(py, key)?, native_into_py(py, item)?)?;
            }
            Ok(dict.into_any())
        }
        Native::Array(array) => Ok(Bound::new(py, PyTypedArray(array))?.into_any()),
    }
}

fn value_from_py(obj: &Bound<'_, PyAny>) -> PyResult<Value> {
    if let Ok(pmt) = obj.cast::<PyPmt>() {
        return Ok(pmt.get().0.clone());
    }
    let native = native_from_py(obj)?;
    Converter::global().from_native(&native).map_err(convert_err)
}

#[pyfunction]
#[pyo3(signature = (obj, like = None))]
/// Converts a Python object to a Pmt, shaped after `like` when given.
fn to_pmt(obj: &Bound<'_, PyAny>, like: Option<&Bound<'_, PyPmt>>) -> PyResult<PyPmt> {
    match like {
        None => value_from_py(obj).map(PyPmt),
        Some(schema) => {
            let native = native_from_py(obj)?;
            Converter::global()
                .encode_as(&native, &schema.get().0)
                .map(PyPmt)
                .map_err(convert_err)
        }
    }
}

#[pyfunction]
/// Converts a Pmt back to plain Python objects.
fn to_python<'py>(pmt: &Bound<'py, PyPmt>) -> PyResult<Bound<'py, PyAny>> {
    let native = Converter::global()
        .to_native(&pmt.get().0)
        .map_err(convert_err)?;
    native_into_py(pmt.py(), native)
}

#[pyfunction]
fn make_symbol(name: &str) -> PyPmt {
    PyPmt(Value::symbol(name))
}

#[pyfunction]
/// Returns a new dict Pmt with `key` bound to `value`; `d` is left untouched.
fn dict_add(
    d: &Bound<'_, PyPmt>,
    key: &Bound<'_, PyAny>,
    value: &Bound<'_, PyAny>,
) -> PyResult<PyPmt> {
    d.get()
        .0
        .dict_add(value_from_py(key)?, value_from_py(value)?)
        .map(PyPmt)
        .map_err(value_err)
}

#[pymodule]
#[pyo3(name = "_pmt")]
fn pmtpy_sys(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyPmt>()?;
    m.add_class::<PyTypedArray>()?;

    m.add_function(wrap_pyfunction!(to_pmt, m)?)?;
    m.add_function(wrap_pyfunction!(to_python, m)?)?;
    m.add_function(wrap_pyfunction!(make_symbol, m)?)?;
    m.add_function(wrap_pyfunction!(dict_add, m)?)?;
    Ok(())
}
