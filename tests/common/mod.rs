//! Shared utilities for driver and pipeline tests.

use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use node_probe::chain::client::{BalanceStream, EventStream, TxStatusStream};
use node_probe::chain::types::{
    AccountBalance, EventBatch, EventField, EventRecord, MetadataSummary, PalletSummary, Phase,
    TxStatusUpdate,
};
use node_probe::chain::{ChainApi, ChainError, ChainResult, ConnectionProvider, DevIdentity};
use node_probe::config::{OperationMode, ProbeConfig};
use node_probe::notify::Subscription;
use subxt::utils::AccountId32;

/// Output sink whose contents can be read after the driver is done with it.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub fn account(uri: &str) -> AccountId32 {
    DevIdentity::from_uri(uri).unwrap().account().clone()
}

#[derive(Default)]
struct MockState {
    existential_deposit: u128,
    balances: HashMap<[u8; 32], AccountBalance>,
    balance_queries: usize,
    balance_updates: Vec<u128>,
    event_batches: Vec<Result<EventBatch, String>>,
    tx_statuses: Vec<TxStatusUpdate>,
    transfers: Vec<(AccountId32, AccountId32, u128)>,
}

/// Scripted in-memory node.
#[derive(Clone, Default)]
pub struct MockChain {
    state: Arc<Mutex<MockState>>,
}

#[allow(dead_code)]
impl MockChain {
    pub fn new() -> Self {
        let chain = Self::default();
        {
            let mut state = chain.state.lock().unwrap();
            state.existential_deposit = 500;
            state.balances.insert(
                account("//Alice").0,
                AccountBalance {
                    free: 1_000_000_000_000_000,
                    reserved: 0,
                    frozen: 0,
                },
            );
            state.balances.insert(
                account("//Bob").0,
                AccountBalance {
                    free: 2_000,
                    reserved: 10,
                    frozen: 0,
                },
            );
        }
        chain
    }

    pub fn with_event_batches(self, batches: Vec<Result<EventBatch, String>>) -> Self {
        self.state.lock().unwrap().event_batches = batches;
        self
    }

    pub fn with_tx_statuses(self, statuses: Vec<TxStatusUpdate>) -> Self {
        self.state.lock().unwrap().tx_statuses = statuses;
        self
    }

    pub fn with_balance_updates(self, updates: Vec<u128>) -> Self {
        self.state.lock().unwrap().balance_updates = updates;
        self
    }

    pub fn balance_queries(&self) -> usize {
        self.state.lock().unwrap().balance_queries
    }

    pub fn transfers(&self) -> Vec<(AccountId32, AccountId32, u128)> {
        self.state.lock().unwrap().transfers.clone()
    }
}

#[async_trait]
impl ChainApi for MockChain {
    async fn constant(&self, pallet: &str, name: &str) -> ChainResult<String> {
        match (pallet, name) {
            ("Balances", "ExistentialDeposit") => {
                Ok(self.state.lock().unwrap().existential_deposit.to_string())
            }
            _ => Err(ChainError::Query(format!("constant {}.{} not found", pallet, name))),
        }
    }

    async fn account_balance(&self, account: &AccountId32) -> ChainResult<AccountBalance> {
        let mut state = self.state.lock().unwrap();
        state.balance_queries += 1;
        Ok(state.balances.get(&account.0).copied().unwrap_or_default())
    }

    async fn watch_balance(&self, account: &AccountId32) -> ChainResult<BalanceStream> {
        let initial = self.account_balance(account).await?;
        let updates = self.state.lock().unwrap().balance_updates.clone();
        Ok(Subscription::spawn("balance", move |tx| async move {
            let _ = tx.send(Ok(initial));
            for free in updates {
                let _ = tx.send(Ok(AccountBalance { free, ..initial }));
            }
        }))
    }

    async fn transfer(
        &self,
        from: &DevIdentity,
        to: &AccountId32,
        amount: u128,
    ) -> ChainResult<TxStatusStream> {
        let statuses = {
            let mut state = self.state.lock().unwrap();
            let sender = state.balances.entry(from.account().0).or_default();
            if sender.free < amount {
                return Err(ChainError::Submission("Inability to pay some fees".to_string()));
            }
            sender.free -= amount;
            state.balances.entry(to.0).or_default().free += amount;
            state
                .transfers
                .push((from.account().clone(), to.clone(), amount));
            state.tx_statuses.clone()
        };

        Ok(Subscription::spawn("tx-status", move |tx| async move {
            for status in statuses {
                let _ = tx.send(Ok(status));
            }
        }))
    }

    async fn subscribe_events(&self) -> ChainResult<EventStream> {
        let batches = self.state.lock().unwrap().event_batches.clone();
        Ok(Subscription::spawn("events", move |tx| async move {
            for batch in batches {
                let _ = tx.send(batch.map_err(ChainError::Connection));
            }
        }))
    }

    async fn metadata(&self) -> ChainResult<MetadataSummary> {
        Ok(MetadataSummary {
            spec_name: "node-template".to_string(),
            spec_version: 100,
            pallets: vec![PalletSummary {
                name: "Balances".to_string(),
                index: 5,
                calls: 9,
                events: 21,
                constants: 5,
                storage_entries: 8,
            }],
        })
    }

    async fn raw_metadata(&self) -> ChainResult<String> {
        // "meta" magic followed by the version byte.
        Ok("0x6d6574610f".to_string())
    }
}

/// Hands out a [`MockChain`], or fails like an unreachable node.
pub struct MockProvider {
    pub chain: MockChain,
    pub failure: Option<String>,
}

#[allow(dead_code)]
impl MockProvider {
    pub fn new(chain: MockChain) -> Self {
        Self {
            chain,
            failure: None,
        }
    }

    pub fn unreachable(reason: &str) -> Self {
        Self {
            chain: MockChain::new(),
            failure: Some(reason.to_string()),
        }
    }
}

#[async_trait]
impl ConnectionProvider for MockProvider {
    type Client = MockChain;

    async fn connect(&self, endpoint: &str) -> ChainResult<MockChain> {
        match &self.failure {
            Some(reason) => Err(ChainError::Connection(format!("{}: {}", endpoint, reason))),
            None => Ok(self.chain.clone()),
        }
    }
}

/// A node that accepts the socket but never becomes ready.
pub struct PendingProvider;

#[async_trait]
impl ConnectionProvider for PendingProvider {
    type Client = MockChain;

    async fn connect(&self, _endpoint: &str) -> ChainResult<MockChain> {
        std::future::pending::<ChainResult<MockChain>>().await
    }
}

#[allow(dead_code)]
pub fn config(mode: OperationMode, idle_secs: u64) -> ProbeConfig {
    let mut config = ProbeConfig::default();
    config.run.mode = mode;
    config.run.idle_secs = Some(idle_secs);
    config.node.connect_timeout_secs = 1;
    config
}

#[allow(dead_code)]
pub fn record(phase: Phase, section: &str, method: &str, fields: Vec<EventField>) -> EventRecord {
    EventRecord {
        phase,
        section: section.to_string(),
        method: method.to_string(),
        fields,
    }
}

#[allow(dead_code)]
pub fn batch(block_number: u64, records: Vec<Result<EventRecord, String>>) -> EventBatch {
    EventBatch {
        block_number,
        block_hash: format!("0x{:064x}", block_number),
        records,
    }
}
