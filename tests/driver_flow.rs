//! End-to-end driver runs against a scripted node.

use std::time::{Duration, Instant};

use node_probe::chain::types::{EventField, Phase, TxStatusUpdate};
use node_probe::chain::{ChainApi, ChainError};
use node_probe::config::OperationMode;
use node_probe::driver::{exit_status, Driver, DriverError};
use node_probe::Shutdown;

mod common;

use common::{account, batch, config, record, MockChain, MockProvider, PendingProvider, SharedBuffer};

async fn run(
    provider: MockProvider,
    mode: OperationMode,
    idle_secs: u64,
) -> (Result<(), DriverError>, String) {
    let out = SharedBuffer::default();
    let mut driver = Driver::new(provider, config(mode, idle_secs)).with_output(Box::new(out.clone()));
    let result = driver.run().await;
    (result, out.contents())
}

#[tokio::test]
async fn test_events_rendered_in_delivery_order() {
    let chain = MockChain::new().with_event_batches(vec![
        Ok(batch(
            1,
            vec![
                Ok(record(
                    Phase::ApplyExtrinsic(0),
                    "balances",
                    "Transfer",
                    vec![EventField::decoded("AccountId", "5F...")],
                )),
                Ok(record(Phase::ApplyExtrinsic(1), "system", "ExtrinsicSuccess", vec![])),
            ],
        )),
        Ok(batch(
            2,
            vec![Ok(record(Phase::Finalization, "system", "NewAccount", vec![]))],
        )),
    ]);

    let (result, output) = run(MockProvider::new(chain), OperationMode::Events, 1).await;
    assert!(result.is_ok());
    assert_eq!(exit_status(&result), 0);

    let expected = "connection to node is OK.\n\
                    \nReceived 2 events:\n\
                    balances:Transfer:: ( phase= ApplyExtrinsic(0) )\n\
                    \t\tAccountId: 5F...\n\n\
                    system:ExtrinsicSuccess:: ( phase= ApplyExtrinsic(1) )\n\
                    \nReceived 1 events:\n\
                    system:NewAccount:: ( phase= Finalization )\n\
                    game over\n";
    assert_eq!(output, expected);
}

#[tokio::test]
async fn test_malformed_events_do_not_end_subscription() {
    let chain = MockChain::new().with_event_batches(vec![
        Ok(batch(
            1,
            vec![
                Err("cannot decode variant 42".to_string()),
                Ok(record(
                    Phase::ApplyExtrinsic(0),
                    "balances",
                    "Deposit",
                    vec![
                        EventField::undecodable("T::Balance", "not enough data"),
                        EventField::decoded("T::AccountId", "5G..."),
                    ],
                )),
            ],
        )),
        Ok(batch(
            2,
            vec![Ok(record(Phase::Initialization, "system", "Remarked", vec![]))],
        )),
    ]);

    let (result, output) = run(MockProvider::new(chain), OperationMode::Events, 1).await;
    assert!(result.is_ok());
    assert!(output.contains("<undecodable event: cannot decode variant 42>"));
    assert!(output.contains("\t\tT::Balance: <undecodable: not enough data>"));
    assert!(output.contains("\t\tT::AccountId: 5G..."));
    assert!(output.contains("system:Remarked:: ( phase= Initialization )"));
}

#[tokio::test]
async fn test_lost_event_stream_is_fatal() {
    let chain = MockChain::new().with_event_batches(vec![
        Ok(batch(1, vec![])),
        Err("socket closed".to_string()),
    ]);

    let (result, output) = run(MockProvider::new(chain), OperationMode::Events, 5).await;
    let err = result.unwrap_err();
    assert_eq!(err.kind(), "connection");
    assert!(output.contains("Received 0 events:"));
    assert!(!output.contains("game over"));
}

#[tokio::test]
async fn test_connect_timeout_is_fatal() {
    let out = SharedBuffer::default();
    let mut driver = Driver::new(PendingProvider, config(OperationMode::Events, 600))
        .with_output(Box::new(out.clone()));

    let started = Instant::now();
    let result = tokio::time::timeout(Duration::from_secs(10), driver.run())
        .await
        .expect("driver must not hang on a node that never becomes ready");

    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(matches!(
        result,
        Err(DriverError::Chain(ChainError::ConnectTimeout(1)))
    ));
    assert_eq!(exit_status(&result), 1);
    assert_eq!(out.contents(), "");
}

#[tokio::test]
async fn test_unreachable_node_is_fatal() {
    let (result, output) = run(
        MockProvider::unreachable("connection refused"),
        OperationMode::Constants,
        0,
    )
    .await;
    let err = result.unwrap_err();
    assert_eq!(err.kind(), "connection");
    assert!(err.to_string().contains("connection refused"));
    assert_eq!(exit_status(&Err::<(), _>(err)), 1);
    assert!(output.is_empty());
}

#[tokio::test]
async fn test_constants_mode() {
    let (result, output) = run(MockProvider::new(MockChain::new()), OperationMode::Constants, 0).await;
    assert!(result.is_ok());
    assert_eq!(
        output,
        "connection to node is OK.\n\
         const value existentialDeposit is: 500\n\
         Alice balance is: 1000000000000000\n\
         Bob balance is: 2000\n\
         game over\n"
    );
}

#[tokio::test]
async fn test_balance_query_is_read_only() {
    let chain = MockChain::new();
    let alice = account("//Alice");

    let first = chain.account_balance(&alice).await.unwrap();
    let second = chain.account_balance(&alice).await.unwrap();
    assert_eq!(first, second);

    let (_, first_run) = run(MockProvider::new(chain.clone()), OperationMode::Constants, 0).await;
    let (_, second_run) = run(MockProvider::new(chain.clone()), OperationMode::Constants, 0).await;
    assert_eq!(first_run, second_run);
    assert_eq!(chain.balance_queries(), 6);
}

#[tokio::test]
async fn test_transfer_mode_prints_status_updates() {
    let chain = MockChain::new().with_tx_statuses(vec![
        TxStatusUpdate::Validated,
        TxStatusUpdate::Broadcasted,
        TxStatusUpdate::InBestBlock {
            block_hash: "0xaa".to_string(),
            extrinsic_hash: "0x01".to_string(),
        },
        TxStatusUpdate::InFinalizedBlock {
            block_hash: "0xaa".to_string(),
            extrinsic_hash: "0x01".to_string(),
        },
    ]);

    let (result, output) = run(MockProvider::new(chain.clone()), OperationMode::Transfer, 1).await;
    assert!(result.is_ok());
    assert!(output.contains("transfer of 1000000000000 from Alice to Bob submitted\n"));
    assert!(output.contains(
        "Tx status: Ready\nTx status: Broadcast\nTx status: InBlock(0xaa)\nTx status: Finalized(0xaa)\n"
    ));

    let transfers = chain.transfers();
    assert_eq!(transfers.len(), 1);
    assert_eq!(transfers[0].1, account("//Bob"));

    let bob = chain.account_balance(&account("//Bob")).await.unwrap();
    assert_eq!(bob.free, 2_000 + 1_000_000_000_000);
}

#[tokio::test]
async fn test_rejected_transfer_is_fatal() {
    let chain = MockChain::new();
    let mut config = config(OperationMode::Transfer, 1);
    config.accounts.sender_uri = "//Dave".to_string();

    let out = SharedBuffer::default();
    let mut driver = Driver::new(MockProvider::new(chain), config).with_output(Box::new(out.clone()));
    let result = driver.run().await;

    assert_eq!(result.unwrap_err().kind(), "submission");
    assert!(!out.contents().contains("submitted"));
}

#[tokio::test]
async fn test_transfer_rejected_by_pool_is_fatal() {
    let chain = MockChain::new().with_tx_statuses(vec![
        TxStatusUpdate::Validated,
        TxStatusUpdate::Invalid("bad signature".to_string()),
    ]);

    let (result, output) = run(MockProvider::new(chain), OperationMode::Transfer, 5).await;
    assert_eq!(exit_status(&result), 1);
    assert_eq!(result.unwrap_err().kind(), "submission");
    assert!(output.contains("Tx status: Ready\nTx status: Invalid(bad signature)\n"));
    assert!(!output.contains("game over"));
}

#[tokio::test]
async fn test_watch_balance_mode() {
    let chain = MockChain::new().with_balance_updates(vec![999]);

    let (result, output) = run(MockProvider::new(chain), OperationMode::WatchBalance, 1).await;
    assert!(result.is_ok());
    assert!(output.contains(
        "Subscribed to Alice account.\n\
         Alice account (sub): free=1000000000000000\n\
         Alice account (sub): free=999\n"
    ));
}

#[tokio::test]
async fn test_metadata_mode() {
    let (result, output) = run(MockProvider::new(MockChain::new()), OperationMode::Metadata, 0).await;
    assert!(result.is_ok());
    assert!(output.contains("print metadata:\n"));
    assert!(output.contains("\"spec_name\": \"node-template\""));
    assert!(output.contains("\"name\": \"Balances\""));
}

#[tokio::test]
async fn test_raw_metadata_mode() {
    let mut config = config(OperationMode::Metadata, 0);
    config.run.raw_metadata = true;

    let out = SharedBuffer::default();
    let mut driver = Driver::new(MockProvider::new(MockChain::new()), config)
        .with_output(Box::new(out.clone()));
    assert!(driver.run().await.is_ok());

    let output = out.contents();
    assert!(output.contains("print metadata:\n0x6d6574610f\n"));
    assert!(!output.contains("spec_name"));
}

#[tokio::test]
async fn test_shutdown_ends_idle_early() {
    let shutdown = Shutdown::new();
    let out = SharedBuffer::default();
    let mut driver = Driver::new(
        MockProvider::new(MockChain::new()),
        config(OperationMode::Events, 600),
    )
    .with_output(Box::new(out.clone()))
    .with_shutdown(shutdown.clone());

    let trigger = shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.trigger();
    });

    let result = tokio::time::timeout(Duration::from_secs(10), driver.run())
        .await
        .expect("shutdown should end the idle window");
    assert!(result.is_ok());
    assert!(out.contents().ends_with("game over\n"));
}

#[tokio::test]
async fn test_interrupt_before_idle_is_kept() {
    let shutdown = Shutdown::new();
    let out = SharedBuffer::default();
    let mut driver = Driver::new(
        MockProvider::new(MockChain::new()),
        config(OperationMode::Events, 600),
    )
    .with_output(Box::new(out.clone()))
    .with_shutdown(shutdown.clone());

    // Arrives while nothing is waiting on it yet.
    shutdown.trigger();

    let started = Instant::now();
    let result = tokio::time::timeout(Duration::from_secs(5), driver.run())
        .await
        .expect("an early interrupt should still end the idle window");
    assert!(result.is_ok());
    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(out.contents().ends_with("game over\n"));
}
