//! SGLGB Daemon - assessment lifecycle service
//!
//! The SGLGB daemon provides:
//! - REST API for periods, barangays and assessments
//! - BLGU answer and evidence endpoints
//! - Assessor validation, review and queue endpoints
//! - Finalization and seal determination for administrators

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sglgb_daemon::config::DaemonConfig;
use sglgb_daemon::error::{DaemonError, DaemonResult};
use sglgb_daemon::server::Server;

/// SGLGB Daemon CLI
#[derive(Parser)]
#[command(name = "sglgbd")]
#[command(about = "SGLGB Daemon - assessment lifecycle and validation service", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "SGLGB_CONFIG")]
    config: Option<String>,

    /// Listen address (overrides the configuration file)
    #[arg(short, long, env = "SGLGB_LISTEN_ADDR")]
    listen: Option<String>,

    /// Indicator catalogue JSON file (overrides the configuration file)
    #[arg(long, env = "SGLGB_CATALOGUE")]
    catalogue: Option<String>,

    /// Log level
    #[arg(long, env = "SGLGB_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Enable JSON logging
    #[arg(long, env = "SGLGB_LOG_JSON")]
    json: bool,
}

#[tokio::main]
async fn main() -> DaemonResult<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| cli.log_level.clone().into());

    if cli.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // Load configuration
    let mut config = DaemonConfig::load(cli.config.as_deref())
        .map_err(|e| DaemonError::Config(e.to_string()))?;

    // Override with CLI args
    if let Some(listen) = &cli.listen {
        config.server.listen_addr = listen
            .parse()
            .map_err(|e| DaemonError::Config(format!("Invalid listen address: {}", e)))?;
    }
    if let Some(path) = &cli.catalogue {
        config.catalogue_path = Some(path.into());
    }

    // Print startup banner
    println!(
        r#"
  ____   ____ _     ____ ____
 / ___| / ___| |   / ___| __ )
 \___ \| |  _| |  | |  _|  _ \
  ___) | |_| | |__| |_| | |_) |
 |____/ \____|_____\____|____/

  Seal of Good Local Governance for Barangays
  Version: {}
  Evidence: {}
  Listening: {}
"#,
        env!("CARGO_PKG_VERSION"),
        config.evidence.backend,
        config.server.listen_addr
    );

    // Create and run server
    let server = Server::new(config)?;
    server.run().await
}
