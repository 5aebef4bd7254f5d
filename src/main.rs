// ABOUTME: Entry point for the slipway daemon.
// ABOUTME: Parses arguments, wires the pipeline core, and serves webhooks.

mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use slipway::config::AppConfig;
use slipway::error::Result;
use slipway::exec::ShellRunner;
use slipway::gateway::Gateway;
use slipway::pipeline::{FailureEscalator, LockTable, PipelineOrchestrator, StageExecutor};
use slipway::runtime::BollardClient;
use slipway::sinks::{FileLogSink, NotificationSink, SlackNotifier};
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let result = run(cli).await;

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Serve { config } => serve(&config).await,
        Commands::Check { config } => check(&config).await,
    }
}

async fn serve(config_path: &Path) -> Result<()> {
    let config = Arc::new(AppConfig::load(config_path)?);

    let runtime = BollardClient::connect(&config.runtime_socket)?;
    runtime.ping().await?;
    tracing::info!("Connected to container engine at {}", config.runtime_socket);

    let runtime = Arc::new(runtime);
    let locks = Arc::new(LockTable::new());
    let executor = StageExecutor::new(
        runtime,
        locks,
        Arc::new(ShellRunner),
        config.projects_dir.clone(),
    );
    let orchestrator = Arc::new(PipelineOrchestrator::new(executor));

    let notifier: Option<Arc<dyn NotificationSink>> = config
        .slack_webhook_url
        .as_ref()
        .map(|url| Arc::new(SlackNotifier::new(url)) as Arc<dyn NotificationSink>);
    if notifier.is_none() {
        tracing::info!("No notification webhook configured, reports are persisted only");
    }
    let escalator = Arc::new(FailureEscalator::new(
        Arc::new(FileLogSink::new(config.logs_dir.clone())),
        notifier,
    ));

    let listener = TcpListener::bind(&config.bind_addr).await?;
    let gateway = Arc::new(Gateway::new(config, orchestrator, escalator));
    gateway.serve(listener).await?;

    Ok(())
}

async fn check(config_path: &Path) -> Result<()> {
    let config = AppConfig::load(config_path)?;

    let runtime = BollardClient::connect(&config.runtime_socket)?;
    runtime.ping().await?;

    println!("Configuration OK");
    println!("Engine socket: {}", config.runtime_socket);
    println!("Projects dir:  {}", config.projects_dir.display());
    println!("Logs dir:      {}", config.logs_dir.display());
    println!(
        "Webhook secret: {}",
        if config.webhook_secret.is_some() {
            "configured"
        } else {
            "MISSING (all webhooks will be rejected)"
        }
    );
    Ok(())
}
