//! End-to-end check against the real graph runtime. Requires the external
//! stack installed and a bundle already built, e.g.:
//!
//! ```text
//! graphdeploy build /tmp/deploy
//! GRAPHDEPLOY_BUNDLE_DIR=/tmp/deploy cargo test -p graphdeploy-runtime -- --ignored
//! ```

use std::path::PathBuf;

use graphdeploy_core::Device;
use graphdeploy_runtime::{runtime_available, smoke_test, GraphRuntimeBackend};

#[test]
#[ignore = "requires the external runtime and a built bundle"]
fn reload_and_run_real_bundle() {
    assert!(runtime_available(), "graph runtime library not found");

    let dir = PathBuf::from(
        std::env::var("GRAPHDEPLOY_BUNDLE_DIR").expect("GRAPHDEPLOY_BUNDLE_DIR not set"),
    );

    let report = smoke_test(&GraphRuntimeBackend::new(), &dir, Device::Cpu).expect("smoke test");
    assert_eq!(report.outputs, 1);
    assert_eq!(report.output_shape.0.to_vec(), vec![1, 1000]);
}
