//! The build step against stub externals: a writable target directory must
//! end up holding the three named deployment files. The stubs stand in for
//! the compiler driver and the system linker so the property holds on
//! machines without the external stack.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use graphdeploy_compiler::{build_artifacts, BuildConfig, CompilerDriver};
use graphdeploy_core::{ArtifactBundle, GRAPH_FILE, KERNEL_LIB_FILE, PARAMS_FILE};

fn write_executable(path: &Path, script: &str) {
    fs::write(path, script).unwrap();
    let mut perms = fs::metadata(path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).unwrap();
}

#[test]
fn build_produces_the_three_named_files() {
    let tools = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();

    // Invoked as `<stub> -c <program> <target_dir>`: emits what the real
    // compiler driver would.
    let stub_compiler = tools.path().join("stub-compiler");
    write_executable(
        &stub_compiler,
        "#!/bin/sh\ndir=\"$3\"\n\
         printf '{\"nodes\": []}' > \"$dir/deploy_graph.json\"\n\
         printf 'obj' > \"$dir/deploy_lib.o\"\n\
         printf 'params' > \"$dir/deploy_param.params\"\n",
    );

    // Invoked as `<stub> -shared -fPIC -o <output> <objects...>`.
    let stub_linker = tools.path().join("stub-linker");
    write_executable(&stub_linker, "#!/bin/sh\nprintf 'lib' > \"$4\"\n");
    std::env::set_var("CC", &stub_linker);

    let driver = CompilerDriver::new(stub_compiler.to_string_lossy().into_owned());
    let report = build_artifacts(&driver, &BuildConfig::default(), target.path()).unwrap();

    for name in [GRAPH_FILE, KERNEL_LIB_FILE, PARAMS_FILE] {
        assert!(
            target.path().join(name).is_file(),
            "expected {name} in the target directory"
        );
    }
    report.bundle.verify().unwrap();
    assert_eq!(report.bundle.dir(), target.path());

    // A second build over the same directory overwrites in place.
    let bundle = ArtifactBundle::in_dir(target.path());
    build_artifacts(&driver, &BuildConfig::default(), target.path()).unwrap();
    bundle.verify().unwrap();
}
