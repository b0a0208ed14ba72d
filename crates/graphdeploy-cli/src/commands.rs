use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use graphdeploy_compiler::{build_artifacts, fetch_assets, BuildConfig, CompilerDriver};
use graphdeploy_core::{ArtifactBundle, Device, GraphBackend, InferenceSession};
use graphdeploy_runtime::{smoke_test, GraphRuntimeBackend};

use crate::imagenet;

pub fn load_config(path: Option<&Path>) -> Result<BuildConfig> {
    match path {
        Some(path) => BuildConfig::from_file(path)
            .with_context(|| format!("failed to load build config {}", path.display())),
        None => Ok(BuildConfig::default()),
    }
}

pub fn build(target_dir: &Path, config: &BuildConfig) -> Result<()> {
    info!("building ...");
    let driver = CompilerDriver::from_env();
    build_artifacts(&driver, config, target_dir)?;
    info!("build was successful");
    Ok(())
}

pub fn check(target_dir: &Path, device: Device) -> Result<()> {
    info!("testing the build ...");
    let report = smoke_test(&GraphRuntimeBackend::new(), target_dir, device)?;
    info!(
        outputs = report.outputs,
        shape = %report.output_shape,
        "test was successful"
    );
    Ok(())
}

pub fn deploy(target_dir: &Path, device: Device, config: &BuildConfig) -> Result<()> {
    build(target_dir, config)?;
    check(target_dir, device)
}

pub async fn classify(target_dir: &Path, device: Device) -> Result<()> {
    let workdir = std::env::current_dir()?;
    let assets = fetch_assets(&workdir).await?;
    let labels = imagenet::load_labels(&assets.labels_csv)?;

    let img = image::open(&assets.image)
        .with_context(|| format!("failed to open {}", assets.image.display()))?;
    let input = imagenet::preprocess(&img)?;

    let bundle = ArtifactBundle::in_dir(target_dir);
    let mut session = GraphRuntimeBackend::new().load(&bundle, device)?;
    let input_name = session
        .spec()
        .inputs
        .first()
        .context("model spec declares no inputs")?
        .name
        .0
        .clone();

    let outputs = session.infer(vec![(input_name, input)])?;
    let logits = outputs
        .first()
        .context("inference produced no outputs")?
        .to_f32()?;

    let top = imagenet::top_k(&logits, 5);
    for (rank, (class, score)) in top.iter().enumerate() {
        let label = labels.get(*class).map(String::as_str).unwrap_or("?");
        info!(rank = rank + 1, class, score, label, "prediction");
    }
    let (best, _) = top.first().context("no predictions")?;
    println!(
        "{} is: {}",
        assets.image.display(),
        labels.get(*best).map(String::as_str).unwrap_or("?")
    );
    Ok(())
}
