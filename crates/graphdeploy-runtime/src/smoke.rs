//! Reload-and-run smoke test: one inference pass over a random input.

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use rand::Rng;
use tracing::info;

use graphdeploy_core::{ArtifactBundle, Device, GraphBackend, InferenceSession, Shape, Tensor};

#[derive(Debug)]
pub struct SmokeReport {
    pub outputs: usize,
    pub output_shape: Shape,
    pub elapsed: Duration,
}

/// Verifies the bundle in `dir`, loads a session, runs one pass with a
/// uniformly random input of the declared shape, and discards the result.
pub fn smoke_test<B: GraphBackend>(backend: &B, dir: &Path, device: Device) -> Result<SmokeReport> {
    let bundle = ArtifactBundle::in_dir(dir);
    bundle.verify()?;

    let mut session = backend
        .load(&bundle, device)
        .with_context(|| format!("{} failed to load the bundle", backend.name()))?;

    let input_spec = session
        .spec()
        .inputs
        .first()
        .context("model spec declares no inputs")?;
    let name = input_spec.name.0.clone();
    let shape = input_spec.shape.clone();

    let mut rng = rand::thread_rng();
    let data: Vec<f32> = (0..shape.numel()).map(|_| rng.gen::<f32>()).collect();
    let input = Tensor::from_f32(shape, &data)?;

    let start = Instant::now();
    let outputs = session.infer(vec![(name, input)])?;
    let elapsed = start.elapsed();

    let first = outputs.first().context("inference produced no outputs")?;
    let report = SmokeReport {
        outputs: outputs.len(),
        output_shape: first.desc.shape.clone(),
        elapsed,
    };
    info!(
        outputs = report.outputs,
        shape = %report.output_shape,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "smoke test passed"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use graphdeploy_core::{DType, ModelSpec};
    use std::fs;

    /// Stands in for the real runtime behind the same seam; echoes a fixed
    /// logits tensor.
    struct FakeBackend;

    struct FakeSession {
        spec: ModelSpec,
    }

    impl GraphBackend for FakeBackend {
        type Session = FakeSession;

        fn name(&self) -> &'static str {
            "fake"
        }

        fn load(&self, bundle: &ArtifactBundle, _device: Device) -> Result<Self::Session> {
            bundle.verify()?;
            Ok(FakeSession {
                spec: ModelSpec::resnet18(1),
            })
        }
    }

    impl InferenceSession for FakeSession {
        fn spec(&self) -> &ModelSpec {
            &self.spec
        }

        fn infer(&mut self, inputs: Vec<(String, Tensor)>) -> Result<Vec<Tensor>> {
            let (name, input) = &inputs[0];
            if name != "data" {
                bail!("unexpected input name {name}");
            }
            if input.desc.dtype != DType::F32 {
                bail!("unexpected input dtype {}", input.desc.dtype);
            }
            let out_shape = self.spec.outputs[0].shape.clone();
            Ok(vec![Tensor::from_f32(
                out_shape.clone(),
                &vec![0.0; out_shape.numel()],
            )?])
        }
    }

    fn write_bundle(dir: &Path) {
        let bundle = ArtifactBundle::in_dir(dir);
        fs::write(bundle.graph_path(), "{\"nodes\": []}").unwrap();
        fs::write(bundle.kernel_lib_path(), b"\x7fELF").unwrap();
        fs::write(bundle.params_path(), b"params").unwrap();
    }

    #[test]
    fn smoke_runs_one_pass() {
        let dir = tempfile::tempdir().unwrap();
        write_bundle(dir.path());

        let report = smoke_test(&FakeBackend, dir.path(), Device::Cpu).unwrap();
        assert_eq!(report.outputs, 1);
        assert_eq!(report.output_shape, Shape::from_slice(&[1, 1000]));
    }

    #[test]
    fn smoke_requires_a_complete_bundle() {
        let dir = tempfile::tempdir().unwrap();
        // No files written: the bundle check fails before any load.
        let err = smoke_test(&FakeBackend, dir.path(), Device::Cpu).unwrap_err();
        assert!(err.to_string().contains("missing bundle file"));
    }
}
