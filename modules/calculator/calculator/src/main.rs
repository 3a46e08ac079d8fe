//! Calculation service binary.
//!
//! Configuration is layered:
//! 1) defaults -> 2) YAML (`--config`) -> 3) env (`CALCULATOR__*`) -> 4) CLI overrides

use std::path::PathBuf;

use anyhow::{Context, Result};
use calc_bootstrap::{init_logging, load_layered, to_yaml, wait_for_shutdown};
use calc_transport_grpc::bind_tcp;
use calculator::{CalculatorConfig, CalculatorModule};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

/// Calculation service: integer arithmetic over gRPC
#[derive(Parser)]
#[command(name = "calculator-server")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address override, e.g. 0.0.0.0:50052
    #[arg(short, long)]
    listen: Option<String>,

    /// Print effective configuration (YAML) and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Validate configuration and exit
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_layered(&CalculatorConfig::default(), cli.config.as_deref(), "CALCULATOR")?;
    if let Some(listen) = cli.listen {
        config.listen_addr = listen;
    }

    init_logging(&config.logging, cli.verbose);

    if cli.print_config {
        println!("Effective configuration:\n{}", to_yaml(&config)?);
        return Ok(());
    }

    config.validate().context("invalid calculator configuration")?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config).await,
        Commands::Check => {
            println!("Configuration is valid");
            println!("{}", to_yaml(&config)?);
            Ok(())
        }
    }
}

async fn run_server(config: CalculatorConfig) -> Result<()> {
    let listener = bind_tcp(&config.listen_addr)
        .await
        .with_context(|| format!("calculation service cannot listen on {}", config.listen_addr))?;

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = wait_for_shutdown().await {
            tracing::error!(error = %e, "signal handling failed, shutting down");
        }
        signal_cancel.cancel();
    });

    CalculatorModule::new().serve(listener, cancel).await?;
    Ok(())
}
