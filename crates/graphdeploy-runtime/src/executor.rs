//! Graph executor sessions over a deployed artifact bundle.
//!
//! Loading assembles the executor from the bundle's three files: the kernel
//! shared library becomes a runtime module, the graph JSON plus device pick
//! the execution plan, and the parameter blob fills the weights.

use anyhow::{Context, Result};
use tracing::{debug, info};

use graphdeploy_core::{ArtifactBundle, Device, GraphBackend, InferenceSession, ModelSpec, Tensor};

use crate::function::Function;
use crate::module::Module;
use crate::ndarray::NDArray;
use crate::value::{ArgValue, ByteArray};

/// Registry names of the executor factory across runtime vintages.
const CREATE_EXECUTOR: &[&str] = &["tvm.graph_executor.create", "tvm.graph_runtime.create"];

pub struct GraphRuntimeBackend;

impl GraphRuntimeBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GraphRuntimeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBackend for GraphRuntimeBackend {
    type Session = GraphExecutor;

    fn name(&self) -> &'static str {
        "graph-runtime"
    }

    fn load(&self, bundle: &ArtifactBundle, device: Device) -> Result<Self::Session> {
        bundle.verify()?;

        let graph_json = bundle.read_graph_json()?;
        let kernels = Module::load(&bundle.kernel_lib_path())
            .context("failed to load the kernel shared library")?;

        let create = Function::global_any(CREATE_EXECUTOR)
            .context("graph executor factory not registered with the runtime")?;
        let executor = create
            .invoke(&[
                ArgValue::string(&graph_json)?,
                ArgValue::Module(&kernels),
                ArgValue::Int(device.type_code() as i64),
                ArgValue::Int(device.id() as i64),
            ])
            .context("failed to create the graph executor")?
            .into_module()?;

        let load_params = executor.get_function("load_params", false)?;
        let set_input = executor.get_function("set_input", false)?;
        let run = executor.get_function("run", false)?;
        let get_output = executor.get_function("get_output", false)?;

        let params = ByteArray::from(bundle.read_params()?);
        debug!(bytes = params.len(), "loading parameter blob");
        load_params
            .invoke(&[ArgValue::Bytes(&params)])
            .context("failed to load parameters")?;

        info!(dir = %bundle.dir().display(), %device, "graph executor ready");

        Ok(GraphExecutor {
            spec: ModelSpec::resnet18(1),
            device,
            set_input,
            run,
            get_output,
            _executor: executor,
            _kernels: kernels,
        })
    }
}

pub struct GraphExecutor {
    spec: ModelSpec,
    device: Device,
    set_input: Function,
    run: Function,
    get_output: Function,
    // Handle lifetimes: member functions borrow from the executor module,
    // which in turn imports the kernel module.
    _executor: Module,
    _kernels: Module,
}

impl InferenceSession for GraphExecutor {
    fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    fn infer(&mut self, inputs: Vec<(String, Tensor)>) -> Result<Vec<Tensor>> {
        for (name, tensor) in &inputs {
            let staged = NDArray::from_tensor(tensor, self.device)
                .with_context(|| format!("failed to stage input `{name}`"))?;
            self.set_input
                .invoke(&[ArgValue::string(name)?, ArgValue::NDArray(&staged)])
                .with_context(|| format!("failed to set input `{name}`"))?;
        }

        self.run.invoke(&[]).context("inference run failed")?;

        let mut outputs = Vec::with_capacity(self.spec.outputs.len());
        for index in 0..self.spec.outputs.len() {
            let array = self
                .get_output
                .invoke(&[ArgValue::Int(index as i64)])?
                .into_ndarray()?;
            outputs.push(array.to_tensor()?);
        }
        Ok(outputs)
    }
}
