//! Typed views over the runtime's packed calling convention: every call
//! passes an array of tagged value unions in and gets one tagged union out.

use std::ffi::{c_char, c_int, CStr, CString};

use crate::error::{Result, RuntimeError};
use crate::ffi;
use crate::module::Module;
use crate::ndarray::NDArray;

/// Owned byte buffer handed to the runtime as a (data, size) pair, used for
/// the serialized parameter dictionary.
#[derive(Clone, Debug, Default)]
pub struct ByteArray {
    bytes: Vec<u8>,
}

impl ByteArray {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn data(&self) -> &[u8] {
        &self.bytes
    }

    /// The ffi pair borrows `self`; it must not outlive the call it is
    /// passed to.
    pub(crate) fn as_ffi(&self) -> ffi::TVMByteArray {
        ffi::TVMByteArray {
            data: self.bytes.as_ptr() as *const c_char,
            size: self.bytes.len(),
        }
    }
}

impl From<Vec<u8>> for ByteArray {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

/// One argument of a packed call.
#[derive(Debug)]
pub enum ArgValue<'a> {
    Int(i64),
    Float(f64),
    Str(CString),
    Bytes(&'a ByteArray),
    NDArray(&'a NDArray),
    Module(&'a Module),
    Null,
}

impl ArgValue<'_> {
    pub fn string(s: &str) -> Result<ArgValue<'static>> {
        Ok(ArgValue::Str(CString::new(s)?))
    }
}

impl From<i64> for ArgValue<'static> {
    fn from(v: i64) -> Self {
        ArgValue::Int(v)
    }
}

impl From<f64> for ArgValue<'static> {
    fn from(v: f64) -> Self {
        ArgValue::Float(v)
    }
}

/// The tagged return slot of a packed call.
#[derive(Debug)]
pub enum RetValue {
    Int(i64),
    Float(f64),
    Str(String),
    Module(Module),
    NDArray(NDArray),
    Handle(*mut std::ffi::c_void),
    Null,
}

impl RetValue {
    /// Safety: `value` and `code` must come from a successful packed call.
    pub(crate) unsafe fn from_ffi(value: ffi::TVMValue, code: c_int) -> Result<RetValue> {
        let ret = match code {
            ffi::TYPE_INT | ffi::TYPE_UINT => RetValue::Int(value.v_int64),
            ffi::TYPE_FLOAT => RetValue::Float(value.v_float64),
            ffi::TYPE_NULL => RetValue::Null,
            ffi::TYPE_STR => {
                RetValue::Str(CStr::from_ptr(value.v_str).to_string_lossy().into_owned())
            }
            ffi::TYPE_MODULE_HANDLE => RetValue::Module(Module::from_handle(value.v_handle)),
            // Returned arrays stay owned by the runtime; wrap them as views
            // and copy out before the next call.
            ffi::TYPE_ARRAY_HANDLE | ffi::TYPE_NDARRAY_HANDLE => {
                RetValue::NDArray(NDArray::from_view(value.v_handle as ffi::ArrayHandle))
            }
            ffi::TYPE_HANDLE | ffi::TYPE_FUNC_HANDLE | ffi::TYPE_OBJECT_HANDLE => {
                RetValue::Handle(value.v_handle)
            }
            other => {
                return Err(RuntimeError::TypeMismatch {
                    expected: "a known packed return".to_string(),
                    found: format!("type code {other}"),
                })
            }
        };
        Ok(ret)
    }

    fn kind(&self) -> &'static str {
        match self {
            RetValue::Int(_) => "int",
            RetValue::Float(_) => "float",
            RetValue::Str(_) => "string",
            RetValue::Module(_) => "module",
            RetValue::NDArray(_) => "ndarray",
            RetValue::Handle(_) => "handle",
            RetValue::Null => "null",
        }
    }

    pub fn into_module(self) -> Result<Module> {
        match self {
            RetValue::Module(m) => Ok(m),
            other => Err(RuntimeError::TypeMismatch {
                expected: "module".to_string(),
                found: other.kind().to_string(),
            }),
        }
    }

    pub fn into_ndarray(self) -> Result<NDArray> {
        match self {
            RetValue::NDArray(a) => Ok(a),
            other => Err(RuntimeError::TypeMismatch {
                expected: "ndarray".to_string(),
                found: other.kind().to_string(),
            }),
        }
    }

    pub fn as_i64(&self) -> Result<i64> {
        match self {
            RetValue::Int(v) => Ok(*v),
            other => Err(RuntimeError::TypeMismatch {
                expected: "int".to_string(),
                found: other.kind().to_string(),
            }),
        }
    }
}
