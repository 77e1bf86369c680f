//! OS signal handling.
//!
//! Ctrl+C ends the idle window early; the run still completes normally.

use crate::lifecycle::shutdown::Shutdown;

/// Spawn a task that triggers `shutdown` on the first Ctrl+C.
pub fn spawn_ctrl_c_listener(shutdown: Shutdown) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Interrupt received, ending idle period");
                shutdown.trigger();
            }
            Err(e) => tracing::error!("Failed to listen for interrupt: {}", e),
        }
    })
}
