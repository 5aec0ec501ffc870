//! Telegate telemetry server
//!
//! Serves the device telemetry API (reads, writes and deletes of time series
//! and attributes) together with health and Prometheus endpoints.
//!
//! Usage:
//! ```bash
//! # Defaults: 127.0.0.1:8081, API mounted at /api/plugins/telemetry
//! telegate-server
//!
//! # With config file (env vars override it)
//! TELEGATE_LOG_LEVEL=debug telegate-server --config telegate.yaml
//!
//! # Print the effective configuration
//! telegate-server check-config --config telegate.yaml
//! ```
//!
//! Test with:
//! ```bash
//! curl -X POST http://localhost:8081/api/plugins/telemetry/DEVICE/$DEVICE_ID/timeseries/ANY \
//!   -H "x-tenant-id: $TENANT_ID" \
//!   -d '{"temperature": 21.5}'
//!
//! curl "http://localhost:8081/api/plugins/telemetry/DEVICE/$DEVICE_ID/values/timeseries?keys=temperature"
//! ```

mod app;
mod config;

use anyhow::Context;
use clap::{Parser, Subcommand};
use config::ServerConfig;
use telegate_observability::init_logging;
use tokio::net::TcpListener;
use tracing::{error, info};

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("TELEGATE_BUILD_SHA"), ")");

#[derive(Parser)]
#[command(name = "telegate-server")]
#[command(version = VERSION)]
#[command(about = "Telegate device telemetry API server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to configuration file (YAML or TOML)
    #[arg(
        short,
        long,
        value_name = "FILE",
        env = "TELEGATE_CONFIG",
        global = true
    )]
    config: Option<String>,

    /// Port to listen on, overriding config and environment
    #[arg(short, long, value_name = "PORT", global = true)]
    port: Option<u16>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server (default if no command specified)
    Serve,
    /// Validate the configuration and print the effective settings
    CheckConfig,
}

fn load_config(cli: &Cli) -> anyhow::Result<ServerConfig> {
    let mut config = match &cli.config {
        Some(path) => ServerConfig::from_file(path)?,
        None => ServerConfig::default(),
    };
    config.merge_env()?;
    if let Some(port) = cli.port {
        config.port = port;
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::CheckConfig => {
            println!("{}", serde_yaml::to_string(&config)?);
            Ok(())
        }
        Commands::Serve => serve(config).await,
    }
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    init_logging(&config.logging)?;

    let state = app::AppState::new(&config)?;
    let app = app::build_app(&config, &state);

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!(
        address = %addr,
        version = VERSION,
        base_path = %config.base_path,
        default_limit = config.telemetry.default_limit,
        "Telegate server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_check_config() {
        let cli = Cli::try_parse_from(["telegate-server", "check-config", "--port", "9001"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::CheckConfig)));
        assert_eq!(cli.port, Some(9001));
    }

    #[test]
    fn test_cli_defaults_to_serve() {
        let cli = Cli::try_parse_from(["telegate-server"]).unwrap();
        assert!(cli.command.is_none());
    }
}
