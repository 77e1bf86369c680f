//! Chain integration subsystem.
//!
//! # Data Flow
//! ```text
//! Secret URIs (config)
//!     → keyring.rs (sr25519 dev identities)
//! Endpoint (config)
//!     → substrate.rs (WebSocket session, metadata)
//!     → client.rs traits (constants, balances, transfers, streams)
//! ```
//!
//! # Security Constraints
//! - Secret URIs are never logged
//! - Only dev/test identities are expected; this is not a wallet

pub mod client;
pub mod keyring;
pub mod substrate;
pub mod types;

pub use client::{ChainApi, ConnectionProvider};
pub use keyring::DevIdentity;
pub use substrate::{SubstrateClient, SubstrateConnector};
pub use types::{ChainError, ChainResult};
