//! Session driver.
//!
//! # Data Flow
//! ```text
//! ProbeConfig
//!     → startup::connect_ready (bounded wait for a ready client)
//!     → one OperationMode (query / transfer / watch / events / metadata)
//!     → idle window, pumping the live subscription if any
//!     → explicit unsubscribe → exit status
//! ```
//!
//! # Design Decisions
//! - Steps run strictly in order; any error aborts the run
//! - Subscriptions are consumed in delivery order while the idle timer runs
//! - Ctrl+C ends the idle window early without failing the run, even when
//!   it arrives before the window starts
//! - A transfer the node rejects fails the run once its status is printed

pub mod error;

use std::io::{self, Write};
use std::pin::Pin;

use tokio::time::Sleep;

use crate::chain::client::{BalanceStream, EventStream, TxStatusStream};
use crate::chain::{ChainApi, ChainError, ChainResult, ConnectionProvider, DevIdentity};
use crate::config::{OperationMode, ProbeConfig};
use crate::lifecycle::startup::connect_ready;
use crate::lifecycle::Shutdown;
use crate::notify::{NotificationHandler, Subscription};

pub use error::{exit_status, DriverError, EXIT_FAILURE, EXIT_SUCCESS};

/// Subscription left running by an operation.
enum Live {
    Nothing,
    Events(EventStream),
    Balance { label: String, stream: BalanceStream },
    Transfer(TxStatusStream),
}

/// Runs one session against a node.
pub struct Driver<P: ConnectionProvider> {
    provider: P,
    config: ProbeConfig,
    shutdown: Shutdown,
    out: Box<dyn Write + Send>,
}

impl<P: ConnectionProvider> Driver<P> {
    /// Create a driver writing to stdout.
    pub fn new(provider: P, config: ProbeConfig) -> Self {
        Self {
            provider,
            config,
            shutdown: Shutdown::new(),
            out: Box::new(io::stdout()),
        }
    }

    /// Redirect console output.
    pub fn with_output(mut self, out: Box<dyn Write + Send>) -> Self {
        self.out = out;
        self
    }

    /// Share an existing shutdown coordinator.
    pub fn with_shutdown(mut self, shutdown: Shutdown) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Connect, run the configured operation, idle, and return.
    pub async fn run(&mut self) -> Result<(), DriverError> {
        let endpoint = self.config.node.endpoint.clone();
        let client = connect_ready(
            &self.provider,
            &endpoint,
            self.config.node.connect_timeout(),
        )
        .await?;
        writeln!(self.out, "connection to node is OK.")?;

        let mode = self.config.run.mode;
        tracing::info!(endpoint = %endpoint, mode = %mode, "Running operation");

        let live = match mode {
            OperationMode::Constants => {
                self.print_constants(&client).await?;
                Live::Nothing
            }
            OperationMode::Transfer => Live::Transfer(self.start_transfer(&client).await?),
            OperationMode::WatchBalance => {
                let identity = DevIdentity::from_uri(&self.config.accounts.sender_uri)?;
                let stream = client.watch_balance(identity.account()).await?;
                writeln!(self.out, "Subscribed to {} account.", identity.label())?;
                Live::Balance {
                    label: identity.label().to_string(),
                    stream,
                }
            }
            OperationMode::Events => Live::Events(client.subscribe_events().await?),
            OperationMode::Metadata => {
                self.print_metadata(&client).await?;
                Live::Nothing
            }
        };

        self.idle(live).await?;

        writeln!(self.out, "game over")?;
        tracing::info!(mode = %mode, "Run complete");
        Ok(())
    }

    async fn print_constants<C: ChainApi>(&mut self, client: &C) -> Result<(), DriverError> {
        let deposit = client.constant("Balances", "ExistentialDeposit").await?;
        writeln!(self.out, "const value existentialDeposit is: {}", deposit)?;

        for uri in [
            &self.config.accounts.sender_uri,
            &self.config.accounts.recipient_uri,
        ] {
            let identity = DevIdentity::from_uri(uri)?;
            let balance = client.account_balance(identity.account()).await?;
            writeln!(self.out, "{} balance is: {}", identity.label(), balance.free)?;
        }
        Ok(())
    }

    async fn print_metadata<C: ChainApi>(&mut self, client: &C) -> Result<(), DriverError> {
        writeln!(self.out, "print metadata:")?;
        if self.config.run.raw_metadata {
            let raw = client.raw_metadata().await?;
            tracing::debug!(hex_len = raw.len(), "Fetched raw metadata");
            writeln!(self.out, "{}", raw)?;
        } else {
            let summary = client.metadata().await?;
            writeln!(self.out, "{}", serde_json::to_string_pretty(&summary)?)?;
        }
        Ok(())
    }

    async fn start_transfer<C: ChainApi>(&mut self, client: &C) -> Result<TxStatusStream, DriverError> {
        let from = DevIdentity::from_uri(&self.config.accounts.sender_uri)?;
        let to = DevIdentity::from_uri(&self.config.accounts.recipient_uri)?;
        let amount = self.config.transfer.amount;

        let stream = client.transfer(&from, to.account(), amount).await?;
        writeln!(
            self.out,
            "transfer of {} from {} to {} submitted",
            amount,
            from.label(),
            to.label()
        )?;
        Ok(stream)
    }

    /// Wait out the idle window, printing whatever the live subscription delivers.
    async fn idle(&mut self, live: Live) -> Result<(), DriverError> {
        let idle = self.config.run.idle();
        tracing::debug!(idle_secs = idle.as_secs(), "Idling");

        let deadline = tokio::time::sleep(idle);
        tokio::pin!(deadline);
        let shutdown = &self.shutdown;
        let out = &mut self.out;

        match live {
            Live::Nothing => {
                tokio::select! {
                    _ = &mut deadline => {}
                    _ = shutdown.triggered() => {}
                }
            }
            Live::Events(mut stream) => {
                let mut handler = NotificationHandler::new(out);
                let result = pump(&mut stream, deadline, shutdown, |batch| {
                    Ok(handler.handle(&batch)?)
                })
                .await;
                let (batches, records, malformed) = handler.stats();
                tracing::info!(batches, records, malformed, "Event subscription finished");
                stream.unsubscribe();
                result?;
            }
            Live::Balance { label, mut stream } => {
                let result = pump(&mut stream, deadline, shutdown, |balance| {
                    Ok(writeln!(out, "{} account (sub): free={}", label, balance.free)?)
                })
                .await;
                stream.unsubscribe();
                result?;
            }
            Live::Transfer(mut stream) => {
                let result = pump(&mut stream, deadline, shutdown, |status| {
                    writeln!(out, "Tx status: {}", status)?;
                    if status.is_rejected() {
                        tracing::error!(status = %status, "Transfer rejected");
                        return Err(ChainError::Submission(format!("transfer {}", status)).into());
                    }
                    Ok(())
                })
                .await;
                stream.unsubscribe();
                result?;
            }
        }
        Ok(())
    }
}

/// Feed items from `stream` to `on_item` until the deadline passes or
/// shutdown is requested. A stream that ends early leaves the wait running.
async fn pump<T, F>(
    stream: &mut Subscription<ChainResult<T>>,
    mut deadline: Pin<&mut Sleep>,
    shutdown: &Shutdown,
    mut on_item: F,
) -> Result<(), DriverError>
where
    F: FnMut(T) -> Result<(), DriverError>,
{
    let mut open = true;
    loop {
        tokio::select! {
            biased;
            _ = &mut deadline => return Ok(()),
            _ = shutdown.triggered() => return Ok(()),
            item = stream.next(), if open => match item {
                Some(Ok(item)) => on_item(item)?,
                Some(Err(e)) => {
                    tracing::error!(subscription = stream.name(), error = %e, "Subscription failed");
                    return Err(e.into());
                }
                None => {
                    tracing::debug!(subscription = stream.name(), "Subscription ended");
                    open = false;
                }
            },
        }
    }
}
