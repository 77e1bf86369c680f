//! Substrate node inspection library.
//!
//! Connects to a node, runs one demo operation (constants, transfer, balance
//! watch, event stream, metadata) and prints the results.

pub mod chain;
pub mod cli;
pub mod config;
pub mod driver;
pub mod lifecycle;
pub mod notify;
pub mod observability;

pub use config::schema::ProbeConfig;
pub use driver::Driver;
pub use lifecycle::Shutdown;
