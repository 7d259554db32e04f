//! # Domo Web Gateway Binary
//!
//! Starts the hardware controller and serves the two-route HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Serve real hardware with the stock pin map
//! domo_web --config /etc/domo/domo.toml
//!
//! # Development mode: simulation backend, verbose logs
//! domo_web --simulate -v
//! ```
//!
//! On SIGINT the gateway stops accepting requests, drives every actuator
//! back to the safe default and releases the lines.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

use domo_common::config::NodeConfig;
use domo_common::io::registry::LineRegistry;
use domo_hal::backends::register_all;
use domo_hal::{BackendRegistry, Controller};
use domo_web::routes;

/// Domo Web - HTTP gateway for the domo hardware controller
#[derive(Parser, Debug)]
#[command(name = "domo_web")]
#[command(version)]
#[command(about = "HTTP gateway exposing the domo hardware controller")]
struct Args {
    /// Path to the node configuration file.
    #[arg(short, long, default_value = "/etc/domo/domo.toml")]
    config: PathBuf,

    /// Force the simulation backend (ignores the configured backend)
    #[arg(short = 's', long)]
    simulate: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("domo_web failed: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    setup_tracing(&args);

    info!("domo_web v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = NodeConfig::load_or_default(&args.config)?;
    let registry = Arc::new(LineRegistry::from_config(&config)?);

    let backend_name = if args.simulate {
        info!("Simulation mode enabled");
        "sim".to_string()
    } else {
        config.backend.clone()
    };

    let mut backends = BackendRegistry::new();
    register_all(&mut backends);
    let backend = backends.create(&backend_name)?;

    let controller = Controller::new(registry, backend, &config)?;

    let app = routes::router(controller.clone());
    let listener = tokio::net::TcpListener::bind(config.listen).await?;
    info!("gateway listening on {}", config.listen);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Lines back to the safe default before exit.
    tokio::task::spawn_blocking(move || controller.shutdown()).await??;
    info!("domo_web shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install SIGINT handler");
    info!("Received shutdown signal");
}

/// Setup tracing subscriber based on CLI arguments.
fn setup_tracing(args: &Args) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
