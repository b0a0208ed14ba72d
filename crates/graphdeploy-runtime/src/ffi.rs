//! Runtime-loaded graph runtime C API via dlopen.
//!
//! The runtime shared library is an opaque collaborator; binding it at run
//! time instead of link time means the workspace builds and unit-tests on
//! machines without the external stack installed. The library name defaults
//! to `libtvm_runtime.so` and can be overridden with the
//! `GRAPHDEPLOY_RUNTIME_LIB` environment variable.

use std::ffi::{c_char, c_int, c_void, CStr};
use std::sync::OnceLock;

use libloading::Library;

use crate::error::RuntimeError;

pub const DEFAULT_LIBRARY: &str = "libtvm_runtime.so";
pub const LIBRARY_ENV: &str = "GRAPHDEPLOY_RUNTIME_LIB";

// ---------------------------------------------------------------------------
// Packed-call type codes
// ---------------------------------------------------------------------------

pub const TYPE_INT: c_int = 0;
pub const TYPE_UINT: c_int = 1;
pub const TYPE_FLOAT: c_int = 2;
pub const TYPE_HANDLE: c_int = 3;
pub const TYPE_NULL: c_int = 4;
pub const TYPE_DATA_TYPE: c_int = 5;
pub const TYPE_DEVICE: c_int = 6;
pub const TYPE_ARRAY_HANDLE: c_int = 7;
pub const TYPE_OBJECT_HANDLE: c_int = 8;
pub const TYPE_MODULE_HANDLE: c_int = 9;
pub const TYPE_FUNC_HANDLE: c_int = 10;
pub const TYPE_STR: c_int = 11;
pub const TYPE_BYTES: c_int = 12;
pub const TYPE_NDARRAY_HANDLE: c_int = 13;

// Opaque handles
pub type FunctionHandle = *mut c_void;
pub type ModuleHandle = *mut c_void;
pub type StreamHandle = *mut c_void;
pub type ArrayHandle = *mut DLTensor;

// ---------------------------------------------------------------------------
// C struct layouts shared with the runtime
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DLDataType {
    pub code: u8,
    pub bits: u8,
    pub lanes: u16,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DLDevice {
    pub device_type: c_int,
    pub device_id: c_int,
}

#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct DLTensor {
    pub data: *mut c_void,
    pub device: DLDevice,
    pub ndim: c_int,
    pub dtype: DLDataType,
    pub shape: *mut i64,
    pub strides: *mut i64,
    pub byte_offset: u64,
}

/// (data, size) pair used to hand the parameter blob to the runtime.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct TVMByteArray {
    pub data: *const c_char,
    pub size: usize,
}

/// One slot of the packed calling convention; the paired type code says
/// which field is live.
#[repr(C)]
#[derive(Clone, Copy)]
pub union TVMValue {
    pub v_int64: i64,
    pub v_float64: f64,
    pub v_handle: *mut c_void,
    pub v_str: *const c_char,
    pub v_type: DLDataType,
    pub v_device: DLDevice,
}

// ---------------------------------------------------------------------------
// C API function signatures
// ---------------------------------------------------------------------------

type FnGetLastError = unsafe extern "C" fn() -> *const c_char;
type FnFuncGetGlobal = unsafe extern "C" fn(*const c_char, *mut FunctionHandle) -> c_int;
type FnFuncCall = unsafe extern "C" fn(
    FunctionHandle,
    *mut TVMValue,
    *mut c_int,
    c_int,
    *mut TVMValue,
    *mut c_int,
) -> c_int;
type FnFuncFree = unsafe extern "C" fn(FunctionHandle) -> c_int;
type FnModGetFunction =
    unsafe extern "C" fn(ModuleHandle, *const c_char, c_int, *mut FunctionHandle) -> c_int;
type FnModFree = unsafe extern "C" fn(ModuleHandle) -> c_int;
type FnArrayAlloc = unsafe extern "C" fn(
    *const i64,
    c_int,
    c_int,
    c_int,
    c_int,
    c_int,
    c_int,
    *mut ArrayHandle,
) -> c_int;
type FnArrayFree = unsafe extern "C" fn(ArrayHandle) -> c_int;
type FnArrayCopyFromBytes = unsafe extern "C" fn(ArrayHandle, *mut c_void, usize) -> c_int;
type FnArrayCopyToBytes = unsafe extern "C" fn(ArrayHandle, *mut c_void, usize) -> c_int;
type FnSynchronize = unsafe extern "C" fn(c_int, c_int, StreamHandle) -> c_int;

// ---------------------------------------------------------------------------
// Loaded API table
// ---------------------------------------------------------------------------

pub struct RuntimeApi {
    _lib: Library,
    pub get_last_error: FnGetLastError,
    pub func_get_global: FnFuncGetGlobal,
    pub func_call: FnFuncCall,
    pub func_free: FnFuncFree,
    pub mod_get_function: FnModGetFunction,
    pub mod_free: FnModFree,
    pub array_alloc: FnArrayAlloc,
    pub array_free: FnArrayFree,
    pub array_copy_from_bytes: FnArrayCopyFromBytes,
    pub array_copy_to_bytes: FnArrayCopyToBytes,
    pub synchronize: FnSynchronize,
}

// Safety: the loaded function pointers are process-global and the runtime
// is internally synchronized.
unsafe impl Send for RuntimeApi {}
unsafe impl Sync for RuntimeApi {}

static RUNTIME_API: OnceLock<Option<RuntimeApi>> = OnceLock::new();

pub fn library_name() -> String {
    std::env::var(LIBRARY_ENV).unwrap_or_else(|_| DEFAULT_LIBRARY.to_string())
}

impl RuntimeApi {
    fn try_load() -> Option<Self> {
        let lib = unsafe { Library::new(library_name()) }.ok()?;
        unsafe {
            let api = RuntimeApi {
                get_last_error: *lib.get::<FnGetLastError>(b"TVMGetLastError\0").ok()?,
                func_get_global: *lib.get::<FnFuncGetGlobal>(b"TVMFuncGetGlobal\0").ok()?,
                func_call: *lib.get::<FnFuncCall>(b"TVMFuncCall\0").ok()?,
                func_free: *lib.get::<FnFuncFree>(b"TVMFuncFree\0").ok()?,
                mod_get_function: *lib.get::<FnModGetFunction>(b"TVMModGetFunction\0").ok()?,
                mod_free: *lib.get::<FnModFree>(b"TVMModFree\0").ok()?,
                array_alloc: *lib.get::<FnArrayAlloc>(b"TVMArrayAlloc\0").ok()?,
                array_free: *lib.get::<FnArrayFree>(b"TVMArrayFree\0").ok()?,
                array_copy_from_bytes: *lib
                    .get::<FnArrayCopyFromBytes>(b"TVMArrayCopyFromBytes\0")
                    .ok()?,
                array_copy_to_bytes: *lib
                    .get::<FnArrayCopyToBytes>(b"TVMArrayCopyToBytes\0")
                    .ok()?,
                synchronize: *lib.get::<FnSynchronize>(b"TVMSynchronize\0").ok()?,
                _lib: lib,
            };
            Some(api)
        }
    }
}

/// The process-global runtime API table, or `LibraryUnavailable` if the
/// shared library (or one of its symbols) cannot be resolved.
pub fn api() -> Result<&'static RuntimeApi, RuntimeError> {
    RUNTIME_API
        .get_or_init(RuntimeApi::try_load)
        .as_ref()
        .ok_or_else(|| RuntimeError::LibraryUnavailable(library_name()))
}

pub fn available() -> bool {
    api().is_ok()
}

/// Translate a nonzero return code into the error taxonomy, attaching the
/// runtime's own last-error text.
pub fn check(api: &RuntimeApi, code: c_int, context: &'static str) -> Result<(), RuntimeError> {
    if code == 0 {
        return Ok(());
    }
    let message = unsafe {
        let ptr = (api.get_last_error)();
        if ptr.is_null() {
            String::new()
        } else {
            CStr::from_ptr(ptr).to_string_lossy().into_owned()
        }
    };
    Err(RuntimeError::Call {
        context,
        code,
        message,
    })
}
