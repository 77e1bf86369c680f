//! Command-line interface.

use std::path::PathBuf;

use clap::Parser;

use crate::config::loader::load_config;
use crate::config::{ConfigError, OperationMode, ProbeConfig};

#[derive(Parser, Debug, Default)]
#[command(name = "node-probe")]
#[command(version)]
#[command(about = "Connect to a Substrate node, query it, and print what it pushes", long_about = None)]
pub struct Cli {
    /// TOML configuration file; every setting has a default.
    #[arg(short, long, env = "NODE_PROBE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Node WebSocket endpoint.
    #[arg(short, long, env = "NODE_PROBE_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Operation to run once connected.
    #[arg(short, long, value_enum, env = "NODE_PROBE_MODE")]
    pub mode: Option<OperationMode>,

    /// Seconds to keep listening after the operation.
    #[arg(long)]
    pub idle_secs: Option<u64>,

    /// Seconds to wait for the node to become ready.
    #[arg(long)]
    pub connect_timeout_secs: Option<u64>,

    /// Transfer amount in planck.
    #[arg(long)]
    pub amount: Option<u128>,

    /// Secret URI of the sending / watched account.
    #[arg(long)]
    pub from: Option<String>,

    /// Secret URI of the receiving account.
    #[arg(long)]
    pub to: Option<String>,

    /// In metadata mode, print the encoded metadata as served by the node.
    #[arg(long)]
    pub raw: bool,

    /// Emit logs as JSON.
    #[arg(long)]
    pub json_logs: bool,
}

impl Cli {
    /// Load the configuration file (if any), apply flag overrides, validate.
    pub fn resolve_config(&self) -> Result<ProbeConfig, ConfigError> {
        load_config(self.config.as_deref(), |config| self.apply(config))
    }

    /// Overwrite config values with the flags that were given.
    pub fn apply(&self, config: &mut ProbeConfig) {
        if let Some(endpoint) = &self.endpoint {
            config.node.endpoint = endpoint.clone();
        }
        if let Some(secs) = self.connect_timeout_secs {
            config.node.connect_timeout_secs = secs;
        }
        if let Some(mode) = self.mode {
            config.run.mode = mode;
        }
        if let Some(secs) = self.idle_secs {
            config.run.idle_secs = Some(secs);
        }
        if let Some(amount) = self.amount {
            config.transfer.amount = amount;
        }
        if let Some(from) = &self.from {
            config.accounts.sender_uri = from.clone();
        }
        if let Some(to) = &self.to {
            config.accounts.recipient_uri = to.clone();
        }
        if self.raw {
            config.run.raw_metadata = true;
        }
        if self.json_logs {
            config.observability.json_logs = true;
        }
    }
}
