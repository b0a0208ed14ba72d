//! Links the compiler's object file into the deployable shared library,
//! the same job the external stack's own shared-library helper does with
//! the system C compiler.

use std::ffi::OsString;
use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::error::{BuildError, Result};

pub const LINKER_ENV: &str = "CC";
pub const DEFAULT_LINKER: &str = "cc";

pub fn linker_program() -> String {
    std::env::var(LINKER_ENV).unwrap_or_else(|_| DEFAULT_LINKER.to_string())
}

fn link_args(output: &Path, objects: &[&Path]) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-shared".into(), "-fPIC".into(), "-o".into()];
    args.push(output.into());
    args.extend(objects.iter().map(|o| OsString::from(*o)));
    args
}

pub fn create_shared(output: &Path, objects: &[&Path]) -> Result<()> {
    let program = linker_program();
    let args = link_args(output, objects);
    debug!(linker = %program, output = %output.display(), "linking shared library");

    let cmd_output = Command::new(&program)
        .args(&args)
        .output()
        .map_err(|source| BuildError::LinkerLaunch { program, source })?;

    if !cmd_output.status.success() {
        return Err(BuildError::LinkFailed {
            status: cmd_output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&cmd_output.stderr).into_owned(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_args_shape() {
        let args = link_args(
            Path::new("/out/deploy_lib.so"),
            &[Path::new("/out/deploy_lib.o")],
        );
        let args: Vec<String> = args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            vec!["-shared", "-fPIC", "-o", "/out/deploy_lib.so", "/out/deploy_lib.o"]
        );
    }

    #[test]
    fn failed_link_carries_status_and_stderr() {
        // An object file that is not an object file: the real system linker
        // rejects it and we keep its diagnostics.
        let dir = tempfile::tempdir().unwrap();
        let obj = dir.path().join("deploy_lib.o");
        std::fs::write(&obj, "not an object file").unwrap();
        let out = dir.path().join("deploy_lib.so");

        match create_shared(&out, &[&obj]) {
            Err(BuildError::LinkFailed { status, .. }) => assert_ne!(status, 0),
            // Environments without a system compiler surface a launch error.
            Err(BuildError::LinkerLaunch { .. }) => {}
            other => panic!("expected a linker error, got {other:?}"),
        }
    }
}
