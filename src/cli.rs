// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines the daemon subcommands and their arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "slipway")]
#[command(about = "Webhook-driven build/test/deploy pipelines for Docker and Podman")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the webhook listener and pipeline daemon
    Serve {
        /// Path to the daemon configuration file
        #[arg(short, long, default_value = "slipway.yml")]
        config: PathBuf,
    },

    /// Validate the configuration and the engine connection, then exit
    Check {
        /// Path to the daemon configuration file
        #[arg(short, long, default_value = "slipway.yml")]
        config: PathBuf,
    },
}
