use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("graph runtime library `{0}` is not available")]
    LibraryUnavailable(String),

    #[error("runtime call `{context}` failed with code {code}: {message}")]
    Call {
        context: &'static str,
        code: i32,
        message: String,
    },

    #[error("requested `{0}` handle is null")]
    NullHandle(String),

    #[error("expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("byte size mismatch: got {got}, expected {expected}")]
    SizeMismatch { got: usize, expected: usize },

    #[error("tensor has no elements")]
    EmptyTensor,

    #[error("module path `{0}` has no file extension")]
    BadModulePath(PathBuf),

    #[error("string contains an interior nul byte")]
    Nul(#[from] std::ffi::NulError),
}
