use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};

/// Serialized computation graph description, produced by the external compiler.
pub const GRAPH_FILE: &str = "deploy_graph.json";
/// Object file emitted by the external compiler's kernel codegen.
pub const KERNEL_OBJECT_FILE: &str = "deploy_lib.o";
/// Shared library linked from the object file; loaded by the runtime.
pub const KERNEL_LIB_FILE: &str = "deploy_lib.so";
/// Serialized parameter dictionary (learned weights).
pub const PARAMS_FILE: &str = "deploy_param.params";

/// The three deployment files under their fixed names in one directory.
///
/// The bundle's internal compatibility is the external toolchain's contract;
/// only presence and basic well-formedness are checked here.
#[derive(Clone, Debug)]
pub struct ArtifactBundle {
    dir: PathBuf,
}

impl ArtifactBundle {
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn graph_path(&self) -> PathBuf {
        self.dir.join(GRAPH_FILE)
    }

    pub fn kernel_object_path(&self) -> PathBuf {
        self.dir.join(KERNEL_OBJECT_FILE)
    }

    pub fn kernel_lib_path(&self) -> PathBuf {
        self.dir.join(KERNEL_LIB_FILE)
    }

    pub fn params_path(&self) -> PathBuf {
        self.dir.join(PARAMS_FILE)
    }

    /// Fails on the first deployment file missing from the directory.
    /// The object file is a build intermediate and is not required.
    pub fn verify(&self) -> Result<()> {
        for path in [self.graph_path(), self.kernel_lib_path(), self.params_path()] {
            ensure!(path.is_file(), "missing bundle file: {}", path.display());
        }
        Ok(())
    }

    pub fn read_graph_json(&self) -> Result<String> {
        let path = self.graph_path();
        fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))
    }

    pub fn read_params(&self) -> Result<Vec<u8>> {
        let path = self.params_path();
        let params =
            fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
        ensure!(!params.is_empty(), "parameter blob {} is empty", path.display());
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn paths_use_fixed_names() {
        let bundle = ArtifactBundle::in_dir("/tmp/deploy");
        assert!(bundle.graph_path().ends_with("deploy_graph.json"));
        assert!(bundle.kernel_object_path().ends_with("deploy_lib.o"));
        assert!(bundle.kernel_lib_path().ends_with("deploy_lib.so"));
        assert!(bundle.params_path().ends_with("deploy_param.params"));
    }

    #[test]
    fn verify_reports_first_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = ArtifactBundle::in_dir(dir.path());

        let err = bundle.verify().unwrap_err();
        assert!(err.to_string().contains(GRAPH_FILE));

        fs::write(bundle.graph_path(), "{}").unwrap();
        let err = bundle.verify().unwrap_err();
        assert!(err.to_string().contains(KERNEL_LIB_FILE));

        fs::write(bundle.kernel_lib_path(), b"\x7fELF").unwrap();
        fs::write(bundle.params_path(), b"params").unwrap();
        bundle.verify().unwrap();
    }

    #[test]
    fn empty_params_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = ArtifactBundle::in_dir(dir.path());
        fs::write(bundle.params_path(), b"").unwrap();
        assert!(bundle.read_params().is_err());
    }
}
