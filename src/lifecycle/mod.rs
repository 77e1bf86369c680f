//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Connect → wait for ready (bounded) → hand client to driver
//!
//! Shutdown (shutdown.rs):
//!     Latched flag that ends the idle window early
//!
//! Signals (signals.rs):
//!     SIGINT → trigger shutdown
//! ```

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
