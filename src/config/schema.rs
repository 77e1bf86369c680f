//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for `node-probe`.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProbeConfig {
    /// Node endpoint and connection settings.
    pub node: NodeConfig,

    /// Which demo operation to run and for how long to wait afterwards.
    pub run: RunConfig,

    /// Dev identities used for queries and transfers.
    pub accounts: AccountsConfig,

    /// Transfer parameters.
    pub transfer: TransferConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,
}

/// Node connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NodeConfig {
    /// WebSocket endpoint (e.g., "ws://127.0.0.1:9944").
    pub endpoint: String,

    /// Maximum time to wait for the client to become ready, in seconds.
    pub connect_timeout_secs: u64,
}

impl NodeConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            endpoint: "ws://127.0.0.1:9944".to_string(),
            connect_timeout_secs: 30,
        }
    }
}

/// Demo operation selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ValueEnum, Default)]
#[serde(rename_all = "kebab-case")]
pub enum OperationMode {
    /// Print the existential deposit and the sender/recipient free balances.
    Constants,
    /// Transfer funds from the sender to the recipient and follow its status.
    Transfer,
    /// Follow the sender's balance as it changes.
    WatchBalance,
    /// Print every system event batch.
    #[default]
    Events,
    /// Print a summary of the runtime metadata.
    Metadata,
}

impl OperationMode {
    /// How long the driver idles after the operation when no override is configured.
    pub fn default_idle(self) -> Duration {
        match self {
            OperationMode::Constants | OperationMode::Metadata => Duration::ZERO,
            OperationMode::Transfer => Duration::from_secs(6),
            OperationMode::WatchBalance => Duration::from_secs(60),
            OperationMode::Events => Duration::from_secs(600),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OperationMode::Constants => "constants",
            OperationMode::Transfer => "transfer",
            OperationMode::WatchBalance => "watch-balance",
            OperationMode::Events => "events",
            OperationMode::Metadata => "metadata",
        }
    }
}

impl std::fmt::Display for OperationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Run configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RunConfig {
    /// Operation to perform once connected.
    pub mode: OperationMode,

    /// Idle window override in seconds. `None` uses the mode's default.
    pub idle_secs: Option<u64>,

    /// In `metadata` mode, print the encoded metadata instead of the summary.
    pub raw_metadata: bool,
}

impl RunConfig {
    /// Effective idle window for the configured mode.
    pub fn idle(&self) -> Duration {
        self.idle_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| self.mode.default_idle())
    }
}

/// Dev identity configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AccountsConfig {
    /// Secret URI of the signing/queried account.
    pub sender_uri: String,

    /// Secret URI of the receiving account.
    pub recipient_uri: String,
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            sender_uri: "//Alice".to_string(),
            recipient_uri: "//Bob".to_string(),
        }
    }
}

/// Transfer configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Amount in planck (smallest unit).
    pub amount: u128,

    /// Name of the call in the Balances pallet.
    pub call: String,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            amount: 1_000_000_000_000,
            call: "transfer_allow_death".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter used when `RUST_LOG` is not set.
    pub log_level: String,

    /// Emit logs as JSON lines instead of the human format.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "node_probe=info".to_string(),
            json_logs: false,
        }
    }
}
