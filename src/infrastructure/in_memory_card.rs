use crate::domain::card::{AuthKey, BalanceBlock, CardIdentity};
use crate::domain::codec;
use crate::domain::ports::CardChannel;
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Reader stage that can be made to fail on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardFault {
    AntiCollision,
    Authenticate,
    Read,
    Write,
}

/// A card as the simulated reader sees it: its sector key and block contents.
#[derive(Debug, Clone)]
pub struct SimulatedCard {
    pub key: AuthKey,
    pub blocks: HashMap<u8, BalanceBlock>,
}

impl SimulatedCard {
    pub fn new(key: AuthKey) -> Self {
        Self {
            key,
            blocks: HashMap::new(),
        }
    }

    /// A factory-keyed card holding `balance` in `block` with a zeroed tail.
    pub fn with_balance(block: u8, balance: u32) -> Self {
        let mut card = Self::new(AuthKey::FACTORY);
        card.blocks.insert(block, codec::encode(balance, &[0; 12]));
        card
    }
}

#[derive(Default)]
struct ReaderState {
    cards: HashMap<CardIdentity, SimulatedCard>,
    in_field: Option<CardIdentity>,
    /// Card and sector of the open authenticated session.
    session: Option<(CardIdentity, u8)>,
    faults: HashSet<CardFault>,
    release_calls: usize,
    writes: Vec<(CardIdentity, u8, BalanceBlock)>,
}

impl ReaderState {
    fn sector_session(&self, block: u8) -> Option<&CardIdentity> {
        match (&self.session, &self.in_field) {
            (Some((uid, sector)), Some(present)) if uid == present && *sector == block / 4 => {
                Some(uid)
            }
            _ => None,
        }
    }
}

/// A card reader backed by memory, for tests and scenario replay.
///
/// Clones share state, so a test can keep a handle while the engine owns
/// another.
#[derive(Default, Clone)]
pub struct InMemoryCardReader {
    state: Arc<RwLock<ReaderState>>,
}

impl InMemoryCardReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a card the reader can later be shown.
    pub async fn insert_card(&self, identity: CardIdentity, card: SimulatedCard) {
        self.state.write().await.cards.insert(identity, card);
    }

    /// Puts a known card in the field. Returns `false` for an unknown card.
    pub async fn present(&self, identity: &CardIdentity) -> bool {
        let mut state = self.state.write().await;
        if !state.cards.contains_key(identity) {
            return false;
        }
        state.in_field = Some(identity.clone());
        true
    }

    /// Takes the card out of the field. Any session dies with it.
    pub async fn remove(&self) {
        let mut state = self.state.write().await;
        state.in_field = None;
        state.session = None;
    }

    pub async fn inject(&self, fault: CardFault) {
        self.state.write().await.faults.insert(fault);
    }

    pub async fn clear_faults(&self) {
        self.state.write().await.faults.clear();
    }

    pub async fn block(&self, identity: &CardIdentity, block: u8) -> Option<BalanceBlock> {
        let state = self.state.read().await;
        state.cards.get(identity)?.blocks.get(&block).copied()
    }

    pub async fn balance(&self, identity: &CardIdentity, block: u8) -> Option<u32> {
        self.block(identity, block).await.map(|b| codec::decode(&b))
    }

    pub async fn cards(&self) -> Vec<(CardIdentity, SimulatedCard)> {
        let state = self.state.read().await;
        state
            .cards
            .iter()
            .map(|(uid, card)| (uid.clone(), card.clone()))
            .collect()
    }

    pub async fn release_count(&self) -> usize {
        self.state.read().await.release_calls
    }

    pub async fn write_count(&self) -> usize {
        self.state.read().await.writes.len()
    }

    pub async fn session_open(&self) -> bool {
        self.state.read().await.session.is_some()
    }
}

#[async_trait]
impl CardChannel for InMemoryCardReader {
    async fn detect(&self) -> bool {
        self.state.read().await.in_field.is_some()
    }

    async fn read_identity(&self) -> Result<CardIdentity> {
        let state = self.state.read().await;
        if state.faults.contains(&CardFault::AntiCollision) {
            return Err(LedgerError::AntiCollision("collision detected".to_string()));
        }
        state
            .in_field
            .clone()
            .ok_or_else(|| LedgerError::AntiCollision("card left the field".to_string()))
    }

    async fn authenticate(&self, block: u8, key: &AuthKey, identity: &CardIdentity) -> bool {
        let mut state = self.state.write().await;
        if state.faults.contains(&CardFault::Authenticate)
            || state.in_field.as_ref() != Some(identity)
        {
            return false;
        }
        let key_matches = state
            .cards
            .get(identity)
            .is_some_and(|card| card.key == *key);
        if key_matches {
            state.session = Some((identity.clone(), block / 4));
        }
        key_matches
    }

    async fn read_block(&self, block: u8) -> Result<BalanceBlock> {
        let state = self.state.read().await;
        let read_error = |reason: &str| LedgerError::Read {
            block,
            reason: reason.to_string(),
        };
        if state.faults.contains(&CardFault::Read) {
            return Err(read_error("no response from card"));
        }
        let uid = state
            .sector_session(block)
            .ok_or_else(|| read_error("sector not authenticated"))?;
        Ok(state
            .cards
            .get(uid)
            .and_then(|card| card.blocks.get(&block).copied())
            .unwrap_or_default())
    }

    async fn write_block(&self, block: u8, data: &BalanceBlock) -> Result<()> {
        let mut state = self.state.write().await;
        let write_error = |reason: &str| LedgerError::Write {
            block,
            reason: reason.to_string(),
        };
        if state.faults.contains(&CardFault::Write) {
            return Err(write_error("card did not acknowledge"));
        }
        let uid = state
            .sector_session(block)
            .cloned()
            .ok_or_else(|| write_error("sector not authenticated"))?;
        if let Some(card) = state.cards.get_mut(&uid) {
            card.blocks.insert(block, *data);
        }
        state.writes.push((uid, block, *data));
        Ok(())
    }

    async fn release_session(&self) {
        let mut state = self.state.write().await;
        state.release_calls += 1;
        state.session = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid() -> CardIdentity {
        CardIdentity::new(vec![0x04, 0xA1, 0xB2, 0xC3])
    }

    #[tokio::test]
    async fn test_read_write_needs_session() {
        let reader = InMemoryCardReader::new();
        reader.insert_card(uid(), SimulatedCard::with_balance(8, 100)).await;
        assert!(reader.present(&uid()).await);

        assert!(reader.read_block(8).await.is_err());
        assert!(reader.authenticate(8, &AuthKey::FACTORY, &uid()).await);

        let block = reader.read_block(8).await.unwrap();
        assert_eq!(codec::decode(&block), 100);

        reader.write_block(8, &codec::encode(7, &[0; 12])).await.unwrap();
        assert_eq!(reader.balance(&uid(), 8).await, Some(7));

        reader.release_session().await;
        assert!(!reader.session_open().await);
        assert!(reader.write_block(8, &block).await.is_err());
    }

    #[tokio::test]
    async fn test_session_is_per_sector() {
        let reader = InMemoryCardReader::new();
        reader.insert_card(uid(), SimulatedCard::with_balance(8, 1)).await;
        reader.present(&uid()).await;

        assert!(reader.authenticate(8, &AuthKey::FACTORY, &uid()).await);
        assert!(reader.read_block(9).await.is_ok());
        assert!(reader.read_block(12).await.is_err());
    }

    #[tokio::test]
    async fn test_wrong_key_fails_authentication() {
        let reader = InMemoryCardReader::new();
        reader
            .insert_card(uid(), SimulatedCard::new(AuthKey::new([1, 2, 3, 4, 5, 6])))
            .await;
        reader.present(&uid()).await;
        assert!(!reader.authenticate(8, &AuthKey::FACTORY, &uid()).await);
    }

    #[tokio::test]
    async fn test_detect_follows_field() {
        let reader = InMemoryCardReader::new();
        assert!(!reader.detect().await);
        assert!(!reader.present(&uid()).await);

        reader.insert_card(uid(), SimulatedCard::with_balance(8, 0)).await;
        reader.present(&uid()).await;
        assert!(reader.detect().await);
        assert_eq!(reader.read_identity().await.unwrap(), uid());

        reader.remove().await;
        assert!(!reader.detect().await);
    }

    #[tokio::test]
    async fn test_faults_apply_until_cleared() {
        let reader = InMemoryCardReader::new();
        reader.insert_card(uid(), SimulatedCard::with_balance(8, 0)).await;
        reader.present(&uid()).await;

        reader.inject(CardFault::AntiCollision).await;
        assert!(matches!(
            reader.read_identity().await,
            Err(LedgerError::AntiCollision(_))
        ));
        reader.clear_faults().await;
        assert!(reader.read_identity().await.is_ok());
    }
}
