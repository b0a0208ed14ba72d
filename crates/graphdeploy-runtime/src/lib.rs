//! Typed frontend over the external graph runtime's C API.
//!
//! The runtime is an opaque collaborator reached through `dlopen`; this
//! crate wraps its packed calling convention, module and tensor handles,
//! and the graph executor into safe types implementing the
//! [`graphdeploy_core`] backend seam.

pub mod error;
pub mod executor;
pub mod ffi;
pub mod function;
pub mod module;
pub mod ndarray;
pub mod smoke;
pub mod value;

pub use error::{Result, RuntimeError};
pub use executor::{GraphExecutor, GraphRuntimeBackend};
pub use function::Function;
pub use module::Module;
pub use ndarray::NDArray;
pub use smoke::{smoke_test, SmokeReport};
pub use value::{ArgValue, ByteArray, RetValue};

/// Whether the runtime shared library is resolvable in this process.
pub fn runtime_available() -> bool {
    ffi::available()
}
