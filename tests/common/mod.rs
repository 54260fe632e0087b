#![allow(dead_code)]

use cardledger::domain::card::CardIdentity;
use cardledger::domain::ports::Message;
use cardledger::infrastructure::in_memory_broker::InMemoryBroker;
use cardledger::infrastructure::in_memory_card::{InMemoryCardReader, SimulatedCard};
use cardledger::infrastructure::in_memory_network::InMemoryNetwork;
use cardledger::{ConnectionSupervisor, ControllerConfig, TopUpEngine};
use serde_json::{Value, json};
use std::sync::Arc;

pub const UID_HEX: &str = "04A1B2C3";
pub const OTHER_UID_HEX: &str = "DEADBEEF";
pub const BLOCK: u8 = 8;

pub fn uid() -> CardIdentity {
    UID_HEX.parse().unwrap()
}

pub fn other_uid() -> CardIdentity {
    OTHER_UID_HEX.parse().unwrap()
}

pub fn test_config() -> ControllerConfig {
    ControllerConfig {
        namespace: "rfid/test".to_string(),
        ..Default::default()
    }
}

/// An engine and supervisor wired to in-memory collaborators, with handles
/// kept for inspection.
pub struct Harness {
    pub reader: InMemoryCardReader,
    pub broker: InMemoryBroker,
    pub network: InMemoryNetwork,
    pub engine: TopUpEngine,
    pub supervisor: ConnectionSupervisor,
    pub config: Arc<ControllerConfig>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(test_config(), InMemoryNetwork::available())
    }

    pub fn with_config(config: ControllerConfig, network: InMemoryNetwork) -> Self {
        let config = Arc::new(config);
        let reader = InMemoryCardReader::new();
        let broker = InMemoryBroker::new();
        let engine = TopUpEngine::new(
            Box::new(reader.clone()),
            Box::new(broker.clone()),
            Arc::clone(&config),
        );
        let supervisor = ConnectionSupervisor::new(Box::new(network.clone()), Arc::clone(&config));
        Self {
            reader,
            broker,
            network,
            engine,
            supervisor,
            config,
        }
    }

    /// A connected harness with card `uid()` holding `balance` in the field.
    pub async fn with_card(balance: u32) -> Self {
        let harness = Self::new();
        harness.connect().await;
        harness
            .reader
            .insert_card(uid(), SimulatedCard::with_balance(BLOCK, balance))
            .await;
        harness.reader.present(&uid()).await;
        harness
    }

    pub async fn connect(&self) {
        self.supervisor.start(self.engine.message_channel()).await;
    }

    pub async fn deliver_top_up(&self, body: Value) {
        let topic = self.engine.topics().top_up.clone();
        self.broker.deliver(Message::new(topic, body.to_string())).await;
    }

    pub async fn balance_reports(&self) -> Vec<Value> {
        self.broker.published_on(&self.engine.topics().balance).await
    }

    pub async fn status_reports(&self) -> Vec<Value> {
        self.broker.published_on(&self.engine.topics().status).await
    }

    pub async fn balance(&self) -> Option<u32> {
        self.reader.balance(&uid(), BLOCK).await
    }
}

pub fn top_up(uid: &str, amount: i64) -> Value {
    json!({ "uid": uid, "amount": amount })
}
