//! Runtime modules: compiled kernel libraries and runtime-created modules
//! such as the graph executor.

use std::ffi::{c_int, CString};
use std::path::Path;
use std::ptr;

use crate::error::{Result, RuntimeError};
use crate::ffi;
use crate::function::Function;
use crate::value::ArgValue;

/// Registry names of the module loader across runtime vintages.
const LOAD_FROM_FILE: &[&str] = &["runtime.ModuleLoadFromFile", "module._LoadFromFile"];

#[derive(Debug)]
pub struct Module {
    handle: ffi::ModuleHandle,
}

// Safety: runtime module handles are internally synchronized.
unsafe impl Send for Module {}

impl Module {
    pub(crate) fn from_handle(handle: ffi::ModuleHandle) -> Self {
        Module { handle }
    }

    pub fn handle(&self) -> ffi::ModuleHandle {
        self.handle
    }

    /// Loads a compiled module from a shared library (or other artifact the
    /// runtime understands); the loader dispatches on the file extension.
    pub fn load(path: &Path) -> Result<Module> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| RuntimeError::BadModulePath(path.to_path_buf()))?;
        let path_str = path.to_string_lossy();

        let loader = Function::global_any(LOAD_FROM_FILE)?;
        let ret = loader.invoke(&[ArgValue::string(&path_str)?, ArgValue::string(ext)?])?;
        ret.into_module()
    }

    /// Resolves a function exported by this module.
    pub fn get_function(&self, name: &str, query_imports: bool) -> Result<Function> {
        let api = ffi::api()?;
        let c_name = CString::new(name)?;
        let mut handle = ptr::null_mut() as ffi::FunctionHandle;
        ffi::check(
            api,
            unsafe {
                (api.mod_get_function)(
                    self.handle,
                    c_name.as_ptr(),
                    query_imports as c_int,
                    &mut handle,
                )
            },
            "TVMModGetFunction",
        )?;
        if handle.is_null() {
            return Err(RuntimeError::NullHandle(name.to_string()));
        }
        Ok(Function::from_handle(handle, false))
    }
}

impl Drop for Module {
    fn drop(&mut self) {
        if !self.handle.is_null() {
            if let Ok(api) = ffi::api() {
                unsafe {
                    (api.mod_free)(self.handle);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_requires_an_extension() {
        let err = Module::load(Path::new("/tmp/deploy_lib")).unwrap_err();
        assert!(matches!(err, RuntimeError::BadModulePath(_)));
    }
}
