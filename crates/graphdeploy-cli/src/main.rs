mod cli;
mod commands;
mod imagenet;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use graphdeploy_core::Device;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    std::env::set_var("RUST_LOG", &cli.log);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let device: Device = cli.device.parse()?;
    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Build { target_dir } => commands::build(&target_dir, &config),
        Command::Check { target_dir } => commands::check(&target_dir, device),
        Command::Deploy { target_dir } => commands::deploy(&target_dir, device, &config),
        Command::Classify { target_dir } => commands::classify(&target_dir, device).await,
    }
}
