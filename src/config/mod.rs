//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → CLI / environment overrides
//!     → validation.rs (semantic checks)
//!     → ProbeConfig (validated, immutable)
//!     → handed to the driver at startup
//! ```
//!
//! # Design Decisions
//! - All fields have defaults so a run needs no file at all
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::ConfigError;
pub use schema::{
    AccountsConfig, NodeConfig, ObservabilityConfig, OperationMode, ProbeConfig, RunConfig,
    TransferConfig,
};
