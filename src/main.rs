//! Substrate node inspection CLI.
//!
//! # Architecture Overview
//!
//! ```text
//!   CLI flags / env / TOML
//!           │
//!           ▼
//!     ┌───────────┐   connect (bounded)   ┌──────────────────┐
//!     │  driver   │──────────────────────▶│ SubstrateClient  │◀──── ws:// node
//!     └─────┬─────┘                       └────────┬─────────┘
//!           │ operation mode                       │ best-block pushes
//!           ▼                                      ▼
//!     console output  ◀── NotificationHandler ◀── Subscription
//! ```

use std::process::ExitCode;

use clap::Parser;

use node_probe::chain::SubstrateConnector;
use node_probe::cli::Cli;
use node_probe::driver::{exit_status, Driver, DriverError, EXIT_FAILURE};
use node_probe::lifecycle::signals::spawn_ctrl_c_listener;
use node_probe::lifecycle::Shutdown;
use node_probe::observability::logging;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match cli.resolve_config() {
        Ok(config) => config,
        Err(e) => {
            let e = DriverError::from(e);
            println!("error occurred ({}): {}", e.kind(), e);
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    if let Err(e) = logging::init(&config.observability) {
        eprintln!("failed to initialize logging: {}", e);
    }

    tracing::info!(
        endpoint = %config.node.endpoint,
        mode = %config.run.mode,
        idle_secs = config.run.idle().as_secs(),
        "node-probe v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let shutdown = Shutdown::new();
    let _signals = spawn_ctrl_c_listener(shutdown.clone());

    let connector = SubstrateConnector::new(config.transfer.call.clone());
    let mut driver = Driver::new(connector, config).with_shutdown(shutdown);

    let outcome = driver.run().await;
    match &outcome {
        Ok(()) => println!("successfully exited"),
        Err(e) => {
            tracing::error!(kind = e.kind(), error = %e, "Run failed");
            println!("error occurred ({}): {}", e.kind(), e);
        }
    }

    ExitCode::from(exit_status(&outcome))
}
