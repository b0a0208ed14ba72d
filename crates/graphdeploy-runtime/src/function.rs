//! Owned handles to the runtime's packed functions.

use std::ffi::{c_char, c_int, c_void, CString};
use std::ptr;

use crate::error::{Result, RuntimeError};
use crate::ffi;
use crate::value::{ArgValue, RetValue};

#[derive(Debug)]
pub struct Function {
    handle: ffi::FunctionHandle,
    is_global: bool,
}

// Safety: runtime function handles are internally synchronized.
unsafe impl Send for Function {}

impl Function {
    pub(crate) fn from_handle(handle: ffi::FunctionHandle, is_global: bool) -> Self {
        Function { handle, is_global }
    }

    /// Looks up a function registered globally with the runtime.
    pub fn global(name: &str) -> Result<Function> {
        let api = ffi::api()?;
        let c_name = CString::new(name)?;
        let mut handle = ptr::null_mut() as ffi::FunctionHandle;
        ffi::check(
            api,
            unsafe { (api.func_get_global)(c_name.as_ptr(), &mut handle) },
            "TVMFuncGetGlobal",
        )?;
        if handle.is_null() {
            return Err(RuntimeError::NullHandle(name.to_string()));
        }
        Ok(Function::from_handle(handle, true))
    }

    /// Resolves the first of several registry names; runtimes of different
    /// vintages register the same entry under different names.
    pub fn global_any(names: &[&str]) -> Result<Function> {
        for name in names {
            if let Ok(func) = Function::global(name) {
                return Ok(func);
            }
        }
        ffi::api()?;
        Err(RuntimeError::NullHandle(names.join(" | ")))
    }

    pub fn handle(&self) -> ffi::FunctionHandle {
        self.handle
    }

    /// One packed call: marshal the arguments into tagged value slots,
    /// call through, unmarshal the tagged return slot.
    pub fn invoke(&self, args: &[ArgValue<'_>]) -> Result<RetValue> {
        let api = ffi::api()?;

        // Byte-array arguments are passed as a pointer to a (data, size)
        // pair; the pairs must stay alive across the call.
        let byte_pairs: Vec<ffi::TVMByteArray> = args
            .iter()
            .filter_map(|a| match a {
                ArgValue::Bytes(b) => Some(b.as_ffi()),
                _ => None,
            })
            .collect();

        let mut pair_idx = 0;
        let mut values: Vec<ffi::TVMValue> = Vec::with_capacity(args.len());
        let mut codes: Vec<c_int> = Vec::with_capacity(args.len());
        for arg in args {
            let (value, code) = match arg {
                ArgValue::Int(v) => (ffi::TVMValue { v_int64: *v }, ffi::TYPE_INT),
                ArgValue::Float(v) => (ffi::TVMValue { v_float64: *v }, ffi::TYPE_FLOAT),
                ArgValue::Str(s) => (
                    ffi::TVMValue {
                        v_str: s.as_ptr() as *const c_char,
                    },
                    ffi::TYPE_STR,
                ),
                ArgValue::Bytes(_) => {
                    let pair = &byte_pairs[pair_idx];
                    pair_idx += 1;
                    (
                        ffi::TVMValue {
                            v_handle: pair as *const _ as *mut c_void,
                        },
                        ffi::TYPE_BYTES,
                    )
                }
                ArgValue::NDArray(a) => (
                    ffi::TVMValue {
                        v_handle: a.handle() as *mut c_void,
                    },
                    ffi::TYPE_ARRAY_HANDLE,
                ),
                ArgValue::Module(m) => (
                    ffi::TVMValue {
                        v_handle: m.handle(),
                    },
                    ffi::TYPE_MODULE_HANDLE,
                ),
                ArgValue::Null => (
                    ffi::TVMValue {
                        v_handle: ptr::null_mut(),
                    },
                    ffi::TYPE_NULL,
                ),
            };
            values.push(value);
            codes.push(code);
        }

        let mut ret_value = ffi::TVMValue { v_int64: 0 };
        let mut ret_code: c_int = ffi::TYPE_NULL;
        ffi::check(
            api,
            unsafe {
                (api.func_call)(
                    self.handle,
                    values.as_mut_ptr(),
                    codes.as_mut_ptr(),
                    args.len() as c_int,
                    &mut ret_value,
                    &mut ret_code,
                )
            },
            "TVMFuncCall",
        )?;

        unsafe { RetValue::from_ffi(ret_value, ret_code) }
    }
}

impl Drop for Function {
    fn drop(&mut self) {
        // Global registry entries are owned by the runtime.
        if !self.is_global && !self.handle.is_null() {
            if let Ok(api) = ffi::api() {
                unsafe {
                    (api.func_free)(self.handle);
                }
            }
        }
    }
}
