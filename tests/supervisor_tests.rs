mod common;

use cardledger::infrastructure::in_memory_card::SimulatedCard;
use cardledger::infrastructure::in_memory_network::InMemoryNetwork;
use common::{BLOCK, Harness, UID_HEX, test_config, top_up, uid};
use std::time::Duration;
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn test_establish_retries_with_fixed_delay() {
    let harness = Harness::new();
    harness.broker.refuse_connections(3).await;

    let start = Instant::now();
    let attempts = harness
        .supervisor
        .establish(harness.engine.message_channel())
        .await;

    assert_eq!(attempts, 4);
    assert_eq!(start.elapsed(), Duration::from_secs(15));
    assert!(harness.broker.is_connected().await);
    assert_eq!(
        harness.broker.subscriptions().await,
        vec!["rfid/test/card/topup".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn test_establish_has_no_attempt_cap() {
    let harness = Harness::new();
    harness.broker.refuse_connections(100).await;

    let attempts = harness
        .supervisor
        .establish(harness.engine.message_channel())
        .await;
    assert_eq!(attempts, 101);
}

#[tokio::test(start_paused = true)]
async fn test_network_association_is_bounded() {
    let harness = Harness::with_config(test_config(), InMemoryNetwork::unreachable());

    let start = Instant::now();
    assert!(!harness.supervisor.connect_network().await);
    assert_eq!(start.elapsed(), Duration::from_secs(20));
    assert_eq!(harness.network.associations().await, vec!["edge".to_string()]);

    // messaging setup still goes ahead
    harness.connect().await;
    assert!(harness.broker.is_connected().await);
}

#[tokio::test(start_paused = true)]
async fn test_network_association_waits_for_link() {
    let mut config = test_config();
    config.network.ssid = "RCA".to_string();
    let harness = Harness::with_config(config, InMemoryNetwork::after_checks(3));

    let start = Instant::now();
    assert!(harness.supervisor.connect_network().await);
    assert_eq!(start.elapsed(), Duration::from_secs(3));
    assert_eq!(harness.network.associations().await, vec!["RCA".to_string()]);

    // already up: no second association
    assert!(harness.supervisor.connect_network().await);
    assert_eq!(harness.network.associations().await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_lost_link_is_recovered_by_step() {
    let harness = Harness::with_card(100).await;
    harness.broker.drop_link().await;
    harness.broker.refuse_connections(1).await;

    let outcome = harness.engine.step(&harness.supervisor).await;
    assert!(outcome.link_lost);
    assert!(harness.broker.is_connected().await);
    assert_eq!(harness.broker.connect_attempts().await, 3);

    // subscription restored, commands flow again
    harness.deliver_top_up(top_up(UID_HEX, 25)).await;
    let outcome = harness.engine.step(&harness.supervisor).await;
    assert!(!outcome.link_lost);
    assert_eq!(outcome.command.unwrap().unwrap().new_balance, 125);
}

#[tokio::test(start_paused = true)]
async fn test_run_ticks_at_configured_interval() {
    let mut config = test_config();
    config.timing.tick_interval_ms = 250;
    let harness = Harness::with_config(config, InMemoryNetwork::available());
    harness
        .reader
        .insert_card(uid(), SimulatedCard::with_balance(BLOCK, 42))
        .await;
    harness.reader.present(&uid()).await;

    let start = Instant::now();
    let summary = harness.engine.run(&harness.supervisor, Some(4)).await;

    assert_eq!(summary.ticks, 4);
    assert_eq!(summary.observations, 4);
    assert_eq!(summary.top_ups_applied, 0);
    assert_eq!(start.elapsed(), Duration::from_millis(1_000));
    assert_eq!(harness.status_reports().await.len(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_recovery_reassociates_dropped_network() {
    let harness = Harness::with_card(100).await;
    assert_eq!(harness.network.associations().await.len(), 1);

    harness.network.disconnect().await;
    harness.broker.drop_link().await;

    let outcome = harness.engine.step(&harness.supervisor).await;
    assert!(outcome.link_lost);
    assert_eq!(harness.network.associations().await.len(), 2);
    assert!(harness.broker.is_connected().await);
}
