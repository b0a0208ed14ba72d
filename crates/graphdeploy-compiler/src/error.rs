use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BuildError>;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("failed to launch the compiler driver `{program}`: {source}")]
    DriverLaunch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("compiler driver exited with status {status}:\n{stderr}")]
    DriverFailed { status: i32, stderr: String },

    #[error("failed to launch the linker `{program}`: {source}")]
    LinkerLaunch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("linker exited with status {status}:\n{stderr}")]
    LinkFailed { status: i32, stderr: String },

    #[error("compiler did not produce {0}")]
    MissingArtifact(PathBuf),

    #[error("failed to download {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("malformed label table: {0}")]
    BadLabelTable(String),

    #[error("invalid build config: {0}")]
    BadConfig(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
