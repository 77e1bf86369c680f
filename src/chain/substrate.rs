//! Substrate node client over WebSocket.
//!
//! # Responsibilities
//! - Connect to a node and fetch its runtime metadata
//! - Query constants and account storage dynamically (no generated code)
//! - Submit signed balance transfers and follow their status
//! - Turn best-block imports into event and balance streams
//! - Hand out the runtime metadata, condensed or as the node encodes it

use async_trait::async_trait;
use subxt::backend::rpc::{RpcClient, RpcParams};
use subxt::blocks::Block;
use subxt::dynamic::{self, Value};
use subxt::events::{EventDetails, Phase as RuntimePhase};
use subxt::ext::scale_value::{At, Composite, ValueDef};
use subxt::storage::Storage;
use subxt::tx::TxStatus;
use subxt::utils::AccountId32;
use subxt::{Metadata, OnlineClient, PolkadotConfig};

use crate::chain::client::{
    BalanceStream, ChainApi, ConnectionProvider, EventStream, TxStatusStream,
};
use crate::chain::keyring::DevIdentity;
use crate::chain::types::{
    AccountBalance, ChainError, ChainResult, EventBatch, EventField, EventRecord,
    MetadataSummary, PalletSummary, Phase, TxStatusUpdate,
};
use crate::notify::Subscription;

type Client = OnlineClient<PolkadotConfig>;

/// Opens [`SubstrateClient`] sessions.
#[derive(Debug, Clone)]
pub struct SubstrateConnector {
    transfer_call: String,
}

impl SubstrateConnector {
    /// `transfer_call` is the Balances call used by [`ChainApi::transfer`].
    pub fn new(transfer_call: impl Into<String>) -> Self {
        Self {
            transfer_call: transfer_call.into(),
        }
    }
}

#[async_trait]
impl ConnectionProvider for SubstrateConnector {
    type Client = SubstrateClient;

    async fn connect(&self, endpoint: &str) -> ChainResult<SubstrateClient> {
        tracing::debug!(endpoint = %endpoint, "Connecting to node");

        // Plain ws:// is only accepted by the insecure constructor.
        let rpc = if endpoint.starts_with("wss://") {
            RpcClient::from_url(endpoint).await
        } else {
            RpcClient::from_insecure_url(endpoint).await
        }
        .map_err(|e| ChainError::Connection(format!("{}: {}", endpoint, e)))?;
        let api = Client::from_rpc_client(rpc.clone())
            .await
            .map_err(|e| ChainError::Connection(format!("{}: {}", endpoint, e)))?;

        let runtime = api.runtime_version();
        tracing::info!(
            endpoint = %endpoint,
            spec_version = runtime.spec_version,
            transaction_version = runtime.transaction_version,
            "Node client ready"
        );

        Ok(SubstrateClient {
            api,
            rpc,
            transfer_call: self.transfer_call.clone(),
        })
    }
}

/// Live client bound to one node session.
#[derive(Clone)]
pub struct SubstrateClient {
    api: Client,
    rpc: RpcClient,
    transfer_call: String,
}

impl std::fmt::Debug for SubstrateClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubstrateClient")
            .field("spec_version", &self.api.runtime_version().spec_version)
            .field("transfer_call", &self.transfer_call)
            .finish()
    }
}

#[async_trait]
impl ChainApi for SubstrateClient {
    async fn constant(&self, pallet: &str, name: &str) -> ChainResult<String> {
        let address = dynamic::constant(pallet, name);
        let thunk = self
            .api
            .constants()
            .at(&address)
            .map_err(|e| ChainError::Query(format!("constant {}.{}: {}", pallet, name, e)))?;
        let value = thunk
            .to_value()
            .map_err(|e| ChainError::Decode(format!("constant {}.{}: {}", pallet, name, e)))?;

        Ok(render_value(&value))
    }

    async fn account_balance(&self, account: &AccountId32) -> ChainResult<AccountBalance> {
        let storage = self
            .api
            .storage()
            .at_latest()
            .await
            .map_err(|e| ChainError::Query(format!("latest block: {}", e)))?;
        fetch_balance(&storage, account).await
    }

    async fn watch_balance(&self, account: &AccountId32) -> ChainResult<BalanceStream> {
        let initial = self.account_balance(account).await?;
        let mut blocks = self
            .api
            .blocks()
            .subscribe_best()
            .await
            .map_err(|e| ChainError::Connection(format!("block subscription: {}", e)))?;
        let account = account.clone();

        Ok(Subscription::spawn("balance", move |tx| async move {
            let mut last = initial;
            if tx.send(Ok(initial)).is_err() {
                return;
            }

            while let Some(block) = blocks.next().await {
                let block = match block {
                    Ok(block) => block,
                    Err(e) => {
                        let _ = tx.send(Err(ChainError::Connection(e.to_string())));
                        return;
                    }
                };

                match fetch_balance(&block.storage(), &account).await {
                    Ok(balance) if balance == last => {}
                    Ok(balance) => {
                        last = balance;
                        if tx.send(Ok(balance)).is_err() {
                            return;
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(Err(e));
                        return;
                    }
                }
            }

            let _ = tx.send(Err(ChainError::SubscriptionClosed("balance")));
        }))
    }

    async fn transfer(
        &self,
        from: &DevIdentity,
        to: &AccountId32,
        amount: u128,
    ) -> ChainResult<TxStatusStream> {
        let call = dynamic::tx(
            "Balances",
            self.transfer_call.as_str(),
            vec![
                Value::unnamed_variant("Id", [Value::from_bytes(to.0)]),
                Value::u128(amount),
            ],
        );

        let mut progress = self
            .api
            .tx()
            .sign_and_submit_then_watch_default(&call, from.keypair())
            .await
            .map_err(|e| ChainError::Submission(e.to_string()))?;

        tracing::info!(
            from = %from.account(),
            to = %to,
            amount = %amount,
            call = %self.transfer_call,
            "Transfer submitted"
        );

        Ok(Subscription::spawn("tx-status", move |tx| async move {
            while let Some(status) = progress.next().await {
                let update = match status {
                    Ok(status) => status_update(status),
                    Err(e) => {
                        let _ = tx.send(Err(ChainError::Submission(e.to_string())));
                        return;
                    }
                };
                let done = update.is_final();
                if tx.send(Ok(update)).is_err() || done {
                    return;
                }
            }
        }))
    }

    async fn subscribe_events(&self) -> ChainResult<EventStream> {
        let mut blocks = self
            .api
            .blocks()
            .subscribe_best()
            .await
            .map_err(|e| ChainError::Connection(format!("block subscription: {}", e)))?;

        let api = self.api.clone();

        Ok(Subscription::spawn("events", move |tx| async move {
            while let Some(block) = blocks.next().await {
                let batch = match block {
                    // Metadata is read per block so runtime upgrades are picked up.
                    Ok(block) => collect_events(&block, &api.metadata()).await,
                    Err(e) => Err(ChainError::Connection(e.to_string())),
                };
                let failed = batch.is_err();
                if tx.send(batch).is_err() || failed {
                    return;
                }
            }

            let _ = tx.send(Err(ChainError::SubscriptionClosed("events")));
        }))
    }

    async fn metadata(&self) -> ChainResult<MetadataSummary> {
        let metadata = self.api.metadata();

        let spec_name = self
            .api
            .constants()
            .at(&dynamic::constant("System", "Version"))
            .ok()
            .and_then(|thunk| thunk.to_value().ok())
            .and_then(|version| {
                version
                    .at("spec_name")
                    .and_then(|name| name.as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "unknown".to_string());

        let pallets = metadata
            .pallets()
            .map(|pallet| PalletSummary {
                name: pallet.name().to_string(),
                index: pallet.index(),
                calls: pallet.call_variants().map_or(0, |v| v.len()),
                events: pallet.event_variants().map_or(0, |v| v.len()),
                constants: pallet.constants().count(),
                storage_entries: pallet.storage().map_or(0, |s| s.entries().len()),
            })
            .collect();

        Ok(MetadataSummary {
            spec_name,
            spec_version: self.api.runtime_version().spec_version,
            pallets,
        })
    }

    async fn raw_metadata(&self) -> ChainResult<String> {
        self.rpc
            .request("state_getMetadata", RpcParams::new())
            .await
            .map_err(|e| ChainError::Query(format!("state_getMetadata: {}", e)))
    }
}

async fn fetch_balance(
    storage: &Storage<PolkadotConfig, Client>,
    account: &AccountId32,
) -> ChainResult<AccountBalance> {
    let query = dynamic::storage("System", "Account", vec![Value::from_bytes(account.0)]);
    let Some(thunk) = storage
        .fetch(&query)
        .await
        .map_err(|e| ChainError::Query(format!("System.Account({}): {}", account, e)))?
    else {
        // Reaped or never funded.
        return Ok(AccountBalance::default());
    };

    let info = thunk
        .to_value()
        .map_err(|e| ChainError::Decode(format!("System.Account({}): {}", account, e)))?;

    balance_from_account_info(&info).ok_or_else(|| {
        ChainError::Decode(format!("System.Account({}): missing data.free", account))
    })
}

/// Pull the balance out of a decoded `AccountInfo`. `None` without `data.free`.
///
/// Runtimes before the fungible migration report `misc_frozen` instead of
/// `frozen`.
fn balance_from_account_info<T>(info: &Value<T>) -> Option<AccountBalance> {
    let data = info.at("data");
    let amount = |field: &str| data.at(field).and_then(|v| v.as_u128());

    Some(AccountBalance {
        free: amount("free")?,
        reserved: amount("reserved").unwrap_or_default(),
        frozen: amount("frozen")
            .or_else(|| amount("misc_frozen"))
            .unwrap_or_default(),
    })
}

async fn collect_events(
    block: &Block<PolkadotConfig, Client>,
    metadata: &Metadata,
) -> ChainResult<EventBatch> {
    let events = block
        .events()
        .await
        .map_err(|e| ChainError::Query(format!("events of block {:?}: {}", block.hash(), e)))?;

    let decoded = events
        .iter()
        .map(|event| {
            event
                .map(|details| event_record(&details, metadata))
                .map_err(|e| e.to_string())
        })
        .collect();

    Ok(EventBatch {
        block_number: block.number().into(),
        block_hash: format!("{:?}", block.hash()),
        records: pad_undecoded(decoded, events.len() as usize),
    })
}

/// Give every event the block declares a slot.
///
/// Event boundaries are only known by decoding, so iteration stops at the
/// first event that fails; the ones after it become placeholder slots.
fn pad_undecoded(
    mut records: Vec<Result<EventRecord, String>>,
    total: usize,
) -> Vec<Result<EventRecord, String>> {
    let decoded = records.len();
    records.extend((decoded..total).map(|index| {
        Err(format!(
            "event #{} not reached, an earlier event in the block failed to decode",
            index
        ))
    }));
    records
}

fn event_record(details: &EventDetails<PolkadotConfig>, metadata: &Metadata) -> EventRecord {
    let types = metadata.types();
    let type_names: Vec<String> = details
        .event_metadata()
        .variant
        .fields
        .iter()
        .map(|field| {
            let path = types
                .resolve(field.ty.id)
                .map(|ty| ty.path.segments.as_slice())
                .unwrap_or_default();
            field_label(path, field.type_name.as_deref())
        })
        .collect();

    let fields = match details.field_values() {
        Ok(values) => type_names
            .into_iter()
            .zip(values.values())
            .map(|(type_name, value)| EventField::decoded(type_name, render_value(value)))
            .collect(),
        Err(e) => {
            let reason = e.to_string();
            type_names
                .into_iter()
                .map(|type_name| EventField::undecodable(type_name, reason.clone()))
                .collect()
        }
    };

    EventRecord {
        phase: phase_from_runtime(details.phase()),
        section: details.pallet_name().to_string(),
        method: details.variant_name().to_string(),
        fields,
    }
}

/// Label for an event field: the resolved type's name (`AccountId32`), else
/// the declared name (`T::Balance`).
fn field_label(path: &[String], type_name: Option<&str>) -> String {
    path.last()
        .map(String::as_str)
        .or(type_name)
        .unwrap_or("Unknown")
        .to_string()
}

fn phase_from_runtime(phase: RuntimePhase) -> Phase {
    match phase {
        RuntimePhase::ApplyExtrinsic(index) => Phase::ApplyExtrinsic(index),
        RuntimePhase::Finalization => Phase::Finalization,
        RuntimePhase::Initialization => Phase::Initialization,
    }
}

fn status_update(status: TxStatus<PolkadotConfig, Client>) -> TxStatusUpdate {
    match status {
        TxStatus::Validated => TxStatusUpdate::Validated,
        TxStatus::Broadcasted { .. } => TxStatusUpdate::Broadcasted,
        TxStatus::NoLongerInBestBlock => TxStatusUpdate::NoLongerInBestBlock,
        TxStatus::InBestBlock(tx) => TxStatusUpdate::InBestBlock {
            block_hash: format!("{:?}", tx.block_hash()),
            extrinsic_hash: format!("{:?}", tx.extrinsic_hash()),
        },
        TxStatus::InFinalizedBlock(tx) => TxStatusUpdate::InFinalizedBlock {
            block_hash: format!("{:?}", tx.block_hash()),
            extrinsic_hash: format!("{:?}", tx.extrinsic_hash()),
        },
        TxStatus::Error { message } => TxStatusUpdate::Error(message),
        TxStatus::Invalid { message } => TxStatusUpdate::Invalid(message),
        TxStatus::Dropped { message } => TxStatusUpdate::Dropped(message),
    }
}

/// Display a decoded value: plain numbers as digits, account ids as SS58,
/// everything else in scale-value notation.
fn render_value<T>(value: &Value<T>) -> String {
    if let Some(n) = value.as_u128() {
        return n.to_string();
    }
    if let Some(account) = as_account_id(value) {
        return account.to_string();
    }
    value.to_string()
}

fn as_account_id<T>(value: &Value<T>) -> Option<AccountId32> {
    let mut current = value;
    loop {
        match &current.value {
            // Newtype wrappers such as `AccountId32([u8; 32])`.
            ValueDef::Composite(Composite::Unnamed(inner)) if inner.len() == 1 => {
                current = &inner[0];
            }
            ValueDef::Composite(composite) if composite.values().count() == 32 => {
                let bytes = composite
                    .values()
                    .map(|byte| byte.as_u128().and_then(|b| u8::try_from(b).ok()))
                    .collect::<Option<Vec<u8>>>()?;
                return <[u8; 32]>::try_from(bytes).ok().map(AccountId32);
            }
            _ => return None,
        }
    }
}
