//! # Autodialer
//!
//! `autodialer serve` runs the dialer until Ctrl-C; `autodialer check-config`
//! validates configuration and prints it with secrets masked.

use anyhow::Context;
use autodialer::config::DialerConfig;
use autodialer::logging::init_structured_logging;
use autodialer::orchestration::DialerSystem;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "autodialer")]
#[command(about = "Sequential outbound call dispatcher")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Configuration file (default: config/autodialer.toml, optional)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the dispatch worker, staleness sweeper and HTTP server
    Serve,

    /// Validate configuration and print it with secrets masked
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = DialerConfig::load(cli.config.as_deref()).context("loading configuration")?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::CheckConfig => {
            let redacted = serde_json::to_string_pretty(&config.redacted())
                .context("rendering configuration")?;
            println!("{redacted}");
            println!("✅ Configuration is valid");
            Ok(())
        }
    }
}

async fn serve(config: DialerConfig) -> anyhow::Result<()> {
    init_structured_logging(&config.logging);

    let system = DialerSystem::bootstrap(config)
        .await
        .context("bootstrapping autodialer")?;

    system
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
            info!("🛑 Ctrl-C received");
        })
        .await
        .context("running autodialer")?;

    info!("👋 Autodialer stopped");
    Ok(())
}
