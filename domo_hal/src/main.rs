//! # Domo HAL Bring-up CLI
//!
//! One-shot controller operations for wiring checks and bring-up, without
//! the HTTP gateway. Each invocation claims the lines afresh and starts from
//! the initialized all-outputs-off state.
//!
//! # Usage
//!
//! ```bash
//! # Print the status snapshot using the simulation backend
//! domo_hal --simulate status
//!
//! # Drive the red LED on real hardware
//! domo_hal --config /etc/domo/domo.toml set ledRed on
//!
//! # Verbose logging
//! domo_hal -s -v status
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

use domo_common::config::NodeConfig;
use domo_common::io::line::Action;
use domo_common::io::registry::LineRegistry;
use domo_hal::backends::register_all;
use domo_hal::{BackendRegistry, Controller};

/// Domo HAL - one-shot hardware controller operations
#[derive(Parser, Debug)]
#[command(name = "domo_hal")]
#[command(version)]
#[command(about = "Bring-up CLI for the domo hardware controller")]
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

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the current status snapshot
    Status,
    /// Drive an actuator and print the resulting snapshot
    Set {
        /// Device name (ledRed, ledYellow, ledGreen)
        device: String,
        /// "on" or "off"
        action: String,
    },
}

fn main() {
    if let Err(e) = run() {
        error!("domo_hal failed: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    setup_tracing(&args);

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

    let snapshot = match &args.command {
        Command::Status => controller.get_status()?,
        Command::Set { device, action } => {
            let action: Action = action.parse()?;
            controller.set_actuator(device, action.is_on())?
        }
    };
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
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
