// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use shuttercam::Config;
use shuttercam::backends::camera::CameraBackendType;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "shuttercam")]
#[command(about = "Single-screen camera with a crystallize effect")]
#[command(version = shuttercam::constants::app_version())]
#[command(subcommand_required = false)]
struct Cli {
    /// Configuration file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Camera backend, overrides the configuration file
    #[arg(short, long, global = true, value_enum)]
    backend: Option<CameraBackendType>,

    /// Source image for the file backend
    #[arg(short, long, global = true)]
    source: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the interactive camera screen in the terminal (default)
    Terminal,

    /// List available cameras
    List,

    /// Take a single photo without the interactive screen
    Photo {
        /// Apply the crystallize effect
        #[arg(short, long)]
        effect: bool,

        /// Output directory (default: ~/Pictures/ShutterCam)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=shuttercam=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }
    if let Some(source) = cli.source {
        config.source_path = Some(source);
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("shuttercam-worker")
        .build()?;

    match cli.command {
        None | Some(Commands::Terminal) => shuttercam::terminal::run(&config, runtime.handle()),
        Some(Commands::List) => cli::list_cameras(&config),
        Some(Commands::Photo { effect, output }) => {
            cli::take_photo(&config, &runtime, effect, output)
        }
    }
}
