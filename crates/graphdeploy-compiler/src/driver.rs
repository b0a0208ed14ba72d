//! Drives the external compiler. The compiler stack is Python-hosted, so
//! the build step renders a small build program from the [`BuildConfig`]
//! and runs it under the configured interpreter with the target directory
//! as its one argument. Everything inside that program — model zoo fetch,
//! graph optimization, kernel codegen — is the external stack's work.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use graphdeploy_core::ArtifactBundle;

use crate::config::BuildConfig;
use crate::error::{BuildError, Result};
use crate::link;

pub const PYTHON_ENV: &str = "GRAPHDEPLOY_PYTHON";
pub const DEFAULT_PYTHON: &str = "python3";

#[derive(Clone, Debug)]
pub struct CompilerDriver {
    python: String,
}

impl CompilerDriver {
    pub fn new(python: impl Into<String>) -> Self {
        Self {
            python: python.into(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(std::env::var(PYTHON_ENV).unwrap_or_else(|_| DEFAULT_PYTHON.to_string()))
    }

    pub fn python(&self) -> &str {
        &self.python
    }

    /// The build program handed to the interpreter. Saves the object file,
    /// graph JSON, and parameter blob under their fixed names in
    /// `sys.argv[1]`; linking happens back on our side.
    pub fn render_build_program(config: &BuildConfig) -> String {
        let [c, h, w] = config.image_shape;
        format!(
            r#"import os
import sys

import tvm
from tvm import relay
from tvm.relay import testing

target_dir = sys.argv[1]

batch_size = {batch}
image_shape = ({c}, {h}, {w})

net, params = testing.resnet.get_workload(
    num_layers={layers}, batch_size=batch_size, image_shape=image_shape)

with relay.build_config(opt_level={opt}):
    graph, lib, params = relay.build_module.build(net, "{target}", params=params)

lib.save(os.path.join(target_dir, "deploy_lib.o"))
with open(os.path.join(target_dir, "deploy_graph.json"), "w") as fo:
    fo.write(graph)
with open(os.path.join(target_dir, "deploy_param.params"), "wb") as fo:
    fo.write(relay.save_param_dict(params))
"#,
            batch = config.batch_size,
            c = c,
            h = h,
            w = w,
            layers = config.num_layers,
            opt = config.opt_level,
            target = config.target,
        )
    }

    /// Runs the build program; a nonzero exit propagates with the driver's
    /// stderr attached.
    pub fn run(&self, config: &BuildConfig, target_dir: &Path) -> Result<()> {
        let program = Self::render_build_program(config);
        debug!(python = %self.python, dir = %target_dir.display(), "running compiler driver");

        let output = Command::new(&self.python)
            .arg("-c")
            .arg(&program)
            .arg(target_dir)
            .output()
            .map_err(|source| BuildError::DriverLaunch {
                program: self.python.clone(),
                source,
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        for line in stderr.lines() {
            debug!(target: "compiler", "{line}");
        }
        if !output.status.success() {
            return Err(BuildError::DriverFailed {
                status: output.status.code().unwrap_or(-1),
                stderr: stderr.into_owned(),
            });
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct BuildReport {
    pub bundle: ArtifactBundle,
    pub elapsed: Duration,
}

/// The whole build step: drive the compiler, check what it emitted, link
/// the object file into the deployable shared library.
pub fn build_artifacts(
    driver: &CompilerDriver,
    config: &BuildConfig,
    target_dir: &Path,
) -> Result<BuildReport> {
    std::fs::create_dir_all(target_dir)?;
    let start = Instant::now();

    driver.run(config, target_dir)?;

    let bundle = ArtifactBundle::in_dir(target_dir);
    for path in [
        bundle.kernel_object_path(),
        bundle.graph_path(),
        bundle.params_path(),
    ] {
        require_artifact(&path)?;
    }

    link::create_shared(&bundle.kernel_lib_path(), &[&bundle.kernel_object_path()])?;
    require_artifact(&bundle.kernel_lib_path())?;

    let report = BuildReport {
        bundle,
        elapsed: start.elapsed(),
    };
    info!(
        dir = %target_dir.display(),
        elapsed_ms = report.elapsed.as_millis() as u64,
        "artifact bundle built"
    );
    Ok(report)
}

fn require_artifact(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(BuildError::MissingArtifact(PathBuf::from(path)))
    }
}
