//! Build-side orchestration: drive the external compiler, link the kernel
//! shared library, verify the emitted bundle, and fetch the demo assets.

pub mod config;
pub mod driver;
pub mod error;
pub mod fetch;
pub mod link;

pub use config::BuildConfig;
pub use driver::{build_artifacts, BuildReport, CompilerDriver};
pub use error::{BuildError, Result};
pub use fetch::{fetch_assets, DemoAssets};
