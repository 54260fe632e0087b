use super::card::{AuthKey, BalanceBlock, CardIdentity};
use crate::error::Result;
use async_trait::async_trait;

/// A message as it travels over the publish/subscribe channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl Message {
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// Access to whichever card is currently in the reader's field.
#[async_trait]
pub trait CardChannel: Send + Sync {
    /// Idle-aware presence probe. `false` is the normal "nothing there" answer.
    async fn detect(&self) -> bool;
    /// Runs anti-collision; only meaningful right after a successful `detect`.
    async fn read_identity(&self) -> Result<CardIdentity>;
    /// Opens an authenticated session on the sector holding `block`.
    async fn authenticate(&self, block: u8, key: &AuthKey, identity: &CardIdentity) -> bool;
    /// Reads a block of the authenticated sector; fails with `Read`.
    async fn read_block(&self, block: u8) -> Result<BalanceBlock>;
    /// Writes a whole block atomically; fails with `Write`.
    async fn write_block(&self, block: u8, data: &BalanceBlock) -> Result<()>;
    /// Drops any authenticated session. Safe to call with none open.
    async fn release_session(&self);
}

/// Publish/subscribe transport towards the control plane.
#[async_trait]
pub trait MessageChannel: Send + Sync {
    /// Opens a session with the broker; fails with `Connectivity`.
    async fn connect(&self) -> Result<()>;
    /// Registers interest in `topic` for the current session.
    async fn subscribe(&self, topic: &str) -> Result<()>;
    /// Fire-and-forget send; fails with `Connectivity` when the link is down.
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<()>;
    /// Returns immediately, with at most one delivered message.
    async fn poll_once(&self) -> Result<Option<Message>>;
}

/// The wireless link underneath the message channel.
#[async_trait]
pub trait NetworkLink: Send + Sync {
    async fn is_connected(&self) -> bool;
    /// Starts association; completion is observed through `is_connected`.
    async fn associate(&self, ssid: &str, password: &str);
}

pub type CardChannelBox = Box<dyn CardChannel>;
pub type MessageChannelBox = Box<dyn MessageChannel>;
pub type NetworkLinkBox = Box<dyn NetworkLink>;
