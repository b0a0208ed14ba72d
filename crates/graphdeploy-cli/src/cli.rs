use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "graphdeploy", version, about = "Compile and smoke-test a deployable ResNet-18 bundle")]
pub struct Cli {
    /// Log level (RUST_LOG syntax)
    #[arg(long, default_value = "info", global = true)]
    pub log: String,

    /// Device for inference (cpu or cuda:N)
    #[arg(long, default_value = "cpu", global = true)]
    pub device: String,

    /// Optional JSON build config overriding the defaults
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile the model into a deployable artifact bundle
    Build {
        /// Directory receiving the bundle
        target_dir: PathBuf,
    },
    /// Reload an existing bundle and run one random-input inference pass
    Check {
        /// Directory holding the bundle
        target_dir: PathBuf,
    },
    /// Build, then check: the end-to-end deployment flow
    Deploy {
        /// Directory receiving the bundle
        target_dir: PathBuf,
    },
    /// Download the demo image and labels, then classify the image
    Classify {
        /// Directory holding the bundle
        target_dir: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_subcommand_takes_exactly_one_directory() {
        for sub in ["build", "check", "deploy", "classify"] {
            // Missing the directory: refuses to parse.
            assert!(
                Cli::try_parse_from(["graphdeploy", sub]).is_err(),
                "{sub} accepted zero arguments"
            );
            // Exactly one: parses.
            assert!(
                Cli::try_parse_from(["graphdeploy", sub, "/tmp/deploy"]).is_ok(),
                "{sub} rejected its directory"
            );
            // Anything extra: refuses to parse.
            assert!(
                Cli::try_parse_from(["graphdeploy", sub, "/tmp/deploy", "extra"]).is_err(),
                "{sub} accepted a stray argument"
            );
        }
    }

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["graphdeploy", "check", "/tmp/deploy"]).unwrap();
        assert_eq!(cli.device, "cpu");
        assert_eq!(cli.log, "info");
        assert!(cli.config.is_none());
        match cli.command {
            Command::Check { target_dir } => assert_eq!(target_dir, PathBuf::from("/tmp/deploy")),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn device_flag_is_global() {
        let cli =
            Cli::try_parse_from(["graphdeploy", "check", "/tmp/deploy", "--device", "cuda:0"])
                .unwrap();
        assert_eq!(cli.device, "cuda:0");
    }
}
