mod common;

use cardledger::LedgerError;
use cardledger::infrastructure::in_memory_card::{CardFault, SimulatedCard};
use common::{BLOCK, Harness, OTHER_UID_HEX, UID_HEX, other_uid};
use serde_json::json;

#[tokio::test]
async fn test_no_card_is_silent() {
    let harness = Harness::new();
    harness.connect().await;

    let outcome = harness.engine.tick().await;
    assert!(outcome.command.is_none());
    assert!(outcome.observation.is_none());
    assert!(harness.broker.published().await.is_empty());
    assert_eq!(harness.reader.release_count().await, 0);
}

#[tokio::test]
async fn test_repeated_scans_each_report() {
    let harness = Harness::with_card(100).await;

    for _ in 0..3 {
        let outcome = harness.engine.tick().await;
        assert_eq!(outcome.observation.unwrap().unwrap().balance, 100);
    }

    assert_eq!(
        harness.status_reports().await,
        vec![json!({"uid": UID_HEX, "balance": 100}); 3]
    );
    assert_eq!(harness.reader.write_count().await, 0);
}

#[tokio::test]
async fn test_scan_follows_card_swaps() {
    let harness = Harness::with_card(100).await;
    harness
        .reader
        .insert_card(other_uid(), SimulatedCard::with_balance(BLOCK, 7))
        .await;

    harness.engine.tick().await;
    harness.reader.present(&other_uid()).await;
    harness.engine.tick().await;
    harness.reader.remove().await;
    harness.engine.tick().await;

    assert_eq!(
        harness.status_reports().await,
        vec![
            json!({"uid": UID_HEX, "balance": 100}),
            json!({"uid": OTHER_UID_HEX, "balance": 7}),
        ]
    );
}

#[tokio::test]
async fn test_scan_failures_publish_nothing() {
    let harness = Harness::with_card(100).await;

    harness.reader.inject(CardFault::Authenticate).await;
    let outcome = harness.engine.tick().await;
    assert!(matches!(
        outcome.observation,
        Some(Err(LedgerError::Authentication { .. }))
    ));

    harness.reader.clear_faults().await;
    harness.reader.inject(CardFault::Read).await;
    let outcome = harness.engine.tick().await;
    assert!(matches!(outcome.observation, Some(Err(LedgerError::Read { .. }))));

    assert!(harness.status_reports().await.is_empty());

    harness.reader.clear_faults().await;
    harness.engine.tick().await;
    assert_eq!(harness.status_reports().await.len(), 1);
}

#[tokio::test]
async fn test_blank_card_reads_zero() {
    let harness = Harness::new();
    harness.connect().await;
    harness
        .reader
        .insert_card(other_uid(), SimulatedCard::new(Default::default()))
        .await;
    harness.reader.present(&other_uid()).await;

    let observation = harness.engine.scan().await.unwrap().unwrap();
    assert_eq!(observation.balance, 0);
    assert_eq!(observation.uid, other_uid());
}
