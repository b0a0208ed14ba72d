use anyhow::Result;

use crate::{ArtifactBundle, Device, ModelSpec, Tensor};

/// A runtime able to turn an artifact bundle into an inference session.
pub trait GraphBackend: Send + Sync + 'static {
    type Session: InferenceSession;

    fn name(&self) -> &'static str;
    fn load(&self, bundle: &ArtifactBundle, device: Device) -> Result<Self::Session>;
}

pub trait InferenceSession: Send + 'static {
    fn spec(&self) -> &ModelSpec;

    /// Inputs are host tensors keyed by the model's input names; outputs
    /// come back as host tensors in the model spec's output order.
    fn infer(&mut self, inputs: Vec<(String, Tensor)>) -> Result<Vec<Tensor>>;
}
