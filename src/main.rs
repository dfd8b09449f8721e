//! Villa Server
//!
//! Backend and admin console API for a lakeside villa marketing site.

use clap::{Arg, Command};
use std::path::PathBuf;
use tokio::signal;
use tracing::{info, warn};
use villa_server::{api, core::Config, AppState, Result};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let matches = Command::new("villa-server")
        .version(villa_server::VERSION)
        .about("Backend and admin console API for the villa marketing site.")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path"),
        )
        .arg(
            Arg::new("http-addr")
                .long("http-addr")
                .value_name("ADDR")
                .help("HTTP server bind address"),
        )
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .value_name("DIR")
                .help("Data directory path"),
        )
        .arg(
            Arg::new("upload-dir")
                .long("upload-dir")
                .value_name("DIR")
                .help("Uploaded media directory path"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level (trace, debug, info, warn, error)"),
        )
        .get_matches();

    // Load configuration
    let mut config = if let Some(config_path) = matches.get_one::<String>("config") {
        Config::from_file(config_path)?
    } else {
        Config::load()?
    };

    // Apply CLI overrides
    apply_cli_overrides(&mut config, &matches)?;

    // Initialize logging at the configured level unless RUST_LOG overrides
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .init();

    info!("Starting {} v{}", villa_server::NAME, villa_server::VERSION);
    info!(
        "Property: {} | store: {} | workers: {}",
        config.ai.property_name,
        config.store_path().display(),
        config.optimal_worker_threads()
    );

    if !config.ai.api_key.is_empty() {
        info!("AI collaborator configured ({})", config.ai.text_model);
    } else {
        warn!("OPENAI_API_KEY not set; SEO and analysis endpoints will report unavailable");
    }

    villa_server::system::metrics::init_registry();

    // Build application state: store, media library, collaborator clients
    let state = AppState::from_config(config)?;
    let addr = state.config.server.http_addr;

    // Serve until a shutdown signal arrives
    tokio::select! {
        result = api::start_server(addr, state) => result?,
        _ = shutdown_signal() => {
            warn!("Received shutdown signal, stopping");
        }
    }

    info!("Shutdown complete");
    Ok(())
}

/// Apply command line argument overrides to configuration
fn apply_cli_overrides(config: &mut Config, matches: &clap::ArgMatches) -> Result<()> {
    if let Some(addr) = matches.get_one::<String>("http-addr") {
        config.server.http_addr = addr
            .parse()
            .map_err(|e| villa_server::Error::config(format!("Invalid HTTP address: {}", e)))?;
    }

    if let Some(data_dir) = matches.get_one::<String>("data-dir") {
        config.store.data_dir = PathBuf::from(data_dir);
    }

    if let Some(upload_dir) = matches.get_one::<String>("upload-dir") {
        config.media.upload_dir = PathBuf::from(upload_dir);
    }

    if let Some(level) = matches.get_one::<String>("log-level") {
        config.logging.level = level.clone();
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }
}
