use crate::domain::ports::{Message, MessageChannel};
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct BrokerState {
    connected: bool,
    refuse_connects: u32,
    connect_attempts: u32,
    subscriptions: Vec<String>,
    inbound: VecDeque<Message>,
    published: Vec<Message>,
}

impl BrokerState {
    fn ensure_connected(&self) -> Result<()> {
        if self.connected {
            Ok(())
        } else {
            Err(LedgerError::Connectivity("not connected to broker".to_string()))
        }
    }
}

/// A broker and client in one, held in memory.
///
/// Sessions are clean: reconnecting drops previous subscriptions. Messages
/// delivered for topics nobody subscribed to are discarded at poll time.
#[derive(Default, Clone)]
pub struct InMemoryBroker {
    state: Arc<RwLock<BrokerState>>,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a message for the controller.
    pub async fn deliver(&self, message: Message) {
        self.state.write().await.inbound.push_back(message);
    }

    /// Makes the next `count` connection attempts fail.
    pub async fn refuse_connections(&self, count: u32) {
        self.state.write().await.refuse_connects = count;
    }

    /// Severs the client's connection as if the broker went away.
    pub async fn drop_link(&self) {
        let mut state = self.state.write().await;
        state.connected = false;
        state.subscriptions.clear();
    }

    pub async fn is_connected(&self) -> bool {
        self.state.read().await.connected
    }

    pub async fn connect_attempts(&self) -> u32 {
        self.state.read().await.connect_attempts
    }

    pub async fn subscriptions(&self) -> Vec<String> {
        self.state.read().await.subscriptions.clone()
    }

    pub async fn published(&self) -> Vec<Message> {
        self.state.read().await.published.clone()
    }

    /// Published messages on `topic`, payloads parsed as JSON.
    pub async fn published_on(&self, topic: &str) -> Vec<serde_json::Value> {
        self.state
            .read()
            .await
            .published
            .iter()
            .filter(|m| m.topic == topic)
            .filter_map(|m| serde_json::from_slice(&m.payload).ok())
            .collect()
    }

    /// Hands over everything published so far and forgets it.
    pub async fn take_published(&self) -> Vec<Message> {
        std::mem::take(&mut self.state.write().await.published)
    }
}

#[async_trait]
impl MessageChannel for InMemoryBroker {
    async fn connect(&self) -> Result<()> {
        let mut state = self.state.write().await;
        state.connect_attempts += 1;
        if state.refuse_connects > 0 {
            state.refuse_connects -= 1;
            return Err(LedgerError::Connectivity("connection refused".to_string()));
        }
        state.connected = true;
        state.subscriptions.clear();
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<()> {
        let mut state = self.state.write().await;
        state.ensure_connected()?;
        if !state.subscriptions.iter().any(|t| t == topic) {
            state.subscriptions.push(topic.to_string());
        }
        Ok(())
    }

    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<()> {
        let mut state = self.state.write().await;
        state.ensure_connected()?;
        state.published.push(Message::new(topic, payload));
        Ok(())
    }

    async fn poll_once(&self) -> Result<Option<Message>> {
        let mut state = self.state.write().await;
        state.ensure_connected()?;
        while let Some(message) = state.inbound.pop_front() {
            if state.subscriptions.contains(&message.topic) {
                return Ok(Some(message));
            }
        }
        Ok(None)
    }
}
