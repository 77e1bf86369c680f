//! Chain client facade.
//!
//! # Responsibilities
//! - Define what the driver needs from a node ([`ChainApi`])
//! - Define how a ready client is obtained ([`ConnectionProvider`])
//!
//! The driver depends only on these traits; [`crate::chain::substrate`]
//! implements them over a live WebSocket session.

use async_trait::async_trait;
use subxt::utils::AccountId32;

use crate::chain::keyring::DevIdentity;
use crate::chain::types::{
    AccountBalance, ChainResult, EventBatch, MetadataSummary, TxStatusUpdate,
};
use crate::notify::Subscription;

/// Stream of event batches, one per imported block.
pub type EventStream = Subscription<ChainResult<EventBatch>>;

/// Stream of balance values, emitted whenever the balance changes.
pub type BalanceStream = Subscription<ChainResult<AccountBalance>>;

/// Stream of status updates for one submitted extrinsic.
pub type TxStatusStream = Subscription<ChainResult<TxStatusUpdate>>;

/// Typed access to a connected node.
#[async_trait]
pub trait ChainApi: Send + Sync {
    /// Look up a runtime constant and render it for display.
    async fn constant(&self, pallet: &str, name: &str) -> ChainResult<String>;

    /// Read an account's balance at the latest block.
    async fn account_balance(&self, account: &AccountId32) -> ChainResult<AccountBalance>;

    /// Follow an account's balance. The current value is sent first.
    async fn watch_balance(&self, account: &AccountId32) -> ChainResult<BalanceStream>;

    /// Sign and submit a balance transfer, then follow its progress.
    async fn transfer(
        &self,
        from: &DevIdentity,
        to: &AccountId32,
        amount: u128,
    ) -> ChainResult<TxStatusStream>;

    /// Follow every event the runtime emits, batched per block.
    async fn subscribe_events(&self) -> ChainResult<EventStream>;

    /// Fetch and condense the runtime metadata.
    async fn metadata(&self) -> ChainResult<MetadataSummary>;

    /// Fetch the runtime metadata exactly as the node serves it (`0x`-prefixed
    /// SCALE bytes).
    async fn raw_metadata(&self) -> ChainResult<String>;
}

/// Establishes sessions to a node endpoint.
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    type Client: ChainApi;

    /// Resolve once the client is ready to serve requests.
    async fn connect(&self, endpoint: &str) -> ChainResult<Self::Client>;
}
