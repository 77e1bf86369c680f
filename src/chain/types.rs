//! Chain-facing types and error definitions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while talking to the node.
#[derive(Debug, Error)]
pub enum ChainError {
    /// Transport could not be established or was lost.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Client did not become ready in time.
    #[error("Node not ready after {0} seconds")]
    ConnectTimeout(u64),

    /// Constant, storage or metadata lookup failed.
    #[error("Query error: {0}")]
    Query(String),

    /// Signing or submitting an extrinsic failed.
    #[error("Submission error: {0}")]
    Submission(String),

    /// Node data could not be decoded against the runtime metadata.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Secret URI could not be turned into a signing identity.
    #[error("Keyring error: {0}")]
    Keyring(String),

    /// The push stream behind a subscription ended unexpectedly.
    #[error("Subscription '{0}' closed by the node")]
    SubscriptionClosed(&'static str),
}

impl ChainError {
    /// Short category label for operator-facing reports.
    pub fn kind(&self) -> &'static str {
        match self {
            ChainError::Connection(_) | ChainError::ConnectTimeout(_) => "connection",
            ChainError::Query(_) => "query",
            ChainError::Submission(_) => "submission",
            ChainError::Decode(_) => "decode",
            ChainError::Keyring(_) => "keyring",
            ChainError::SubscriptionClosed(_) => "subscription",
        }
    }
}

/// Result type for chain operations.
pub type ChainResult<T> = Result<T, ChainError>;

/// Balance of a single account, in planck.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    /// Spendable balance.
    pub free: u128,
    /// Balance held by the runtime (deposits, bonds).
    pub reserved: u128,
    /// Balance that cannot be used for transfers.
    pub frozen: u128,
}

/// Where in block execution an event was emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    ApplyExtrinsic(u32),
    Finalization,
    Initialization,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::ApplyExtrinsic(index) => write!(f, "ApplyExtrinsic({})", index),
            Phase::Finalization => f.write_str("Finalization"),
            Phase::Initialization => f.write_str("Initialization"),
        }
    }
}

/// One data field attached to an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventField {
    /// Declared type name from the metadata (e.g. `T::AccountId`).
    pub type_name: String,
    /// Rendered value, or the reason it could not be rendered.
    pub value: Result<String, String>,
}

impl EventField {
    pub fn decoded(type_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            value: Ok(value.into()),
        }
    }

    pub fn undecodable(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            value: Err(reason.into()),
        }
    }
}

/// A decoded event together with its execution phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub phase: Phase,
    /// Pallet name (e.g. `Balances`).
    pub section: String,
    /// Event variant name (e.g. `Transfer`).
    pub method: String,
    pub fields: Vec<EventField>,
}

/// All events of one block, in emission order.
///
/// A slot holds `Err(reason)` when the event itself could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventBatch {
    pub block_number: u64,
    pub block_hash: String,
    pub records: Vec<Result<EventRecord, String>>,
}

impl EventBatch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Progress of a submitted extrinsic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxStatusUpdate {
    Validated,
    Broadcasted,
    NoLongerInBestBlock,
    InBestBlock { block_hash: String, extrinsic_hash: String },
    InFinalizedBlock { block_hash: String, extrinsic_hash: String },
    Invalid(String),
    Dropped(String),
    Error(String),
}

impl TxStatusUpdate {
    /// Whether no further updates will follow this one.
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            TxStatusUpdate::InFinalizedBlock { .. }
                | TxStatusUpdate::Invalid(_)
                | TxStatusUpdate::Dropped(_)
                | TxStatusUpdate::Error(_)
        )
    }

    /// Whether the pool or the node gave up on the extrinsic.
    pub fn is_rejected(&self) -> bool {
        matches!(
            self,
            TxStatusUpdate::Invalid(_) | TxStatusUpdate::Dropped(_) | TxStatusUpdate::Error(_)
        )
    }
}

impl std::fmt::Display for TxStatusUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TxStatusUpdate::Validated => f.write_str("Ready"),
            TxStatusUpdate::Broadcasted => f.write_str("Broadcast"),
            TxStatusUpdate::NoLongerInBestBlock => f.write_str("Retracted"),
            TxStatusUpdate::InBestBlock { block_hash, .. } => write!(f, "InBlock({})", block_hash),
            TxStatusUpdate::InFinalizedBlock { block_hash, .. } => {
                write!(f, "Finalized({})", block_hash)
            }
            TxStatusUpdate::Invalid(message) => write!(f, "Invalid({})", message),
            TxStatusUpdate::Dropped(message) => write!(f, "Dropped({})", message),
            TxStatusUpdate::Error(message) => write!(f, "Error({})", message),
        }
    }
}

/// Counts of what one pallet exposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PalletSummary {
    pub name: String,
    pub index: u8,
    pub calls: usize,
    pub events: usize,
    pub constants: usize,
    pub storage_entries: usize,
}

/// Condensed view of the runtime metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataSummary {
    pub spec_name: String,
    pub spec_version: u32,
    pub pallets: Vec<PalletSummary>,
}
