use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Size of one MIFARE Classic data block.
pub const BLOCK_SIZE: usize = 16;
/// Bytes of the block that carry the balance.
pub const BALANCE_LEN: usize = 4;
/// Bytes after the balance that every write must carry over untouched.
pub const TAIL_LEN: usize = BLOCK_SIZE - BALANCE_LEN;

/// Unique identifier a card reports during anti-collision.
///
/// Identities compare by their raw bytes; on the wire they travel as
/// uppercase hexadecimal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CardIdentity(Vec<u8>);

impl CardIdentity {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for CardIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_upper(&self.0))
    }
}

impl FromStr for CardIdentity {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(LedgerError::Protocol("card uid is empty".to_string()));
        }
        hex::decode(trimmed)
            .map(Self)
            .map_err(|e| LedgerError::Protocol(format!("card uid {trimmed:?} is not hex: {e}")))
    }
}

impl Serialize for CardIdentity {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// The single sector key used for every card this controller touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AuthKey([u8; 6]);

impl AuthKey {
    /// Factory default key (`FF FF FF FF FF FF`).
    pub const FACTORY: Self = Self([0xFF; 6]);

    pub fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }
}

impl Default for AuthKey {
    fn default() -> Self {
        Self::FACTORY
    }
}

impl TryFrom<String> for AuthKey {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self> {
        let mut key = [0u8; 6];
        hex::decode_to_slice(value.trim(), &mut key).map_err(|e| {
            LedgerError::Config(format!("card key must be 12 hex digits ({value:?}): {e}"))
        })?;
        Ok(Self(key))
    }
}

impl From<AuthKey> for String {
    fn from(key: AuthKey) -> Self {
        hex::encode_upper(key.0)
    }
}

/// Raw contents of the block that holds the balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BalanceBlock([u8; BLOCK_SIZE]);

impl BalanceBlock {
    pub fn from_bytes(bytes: [u8; BLOCK_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; BLOCK_SIZE] {
        &self.0
    }

    /// The trailing payload that sits after the balance.
    pub fn tail(&self) -> [u8; TAIL_LEN] {
        let mut tail = [0u8; TAIL_LEN];
        tail.copy_from_slice(&self.0[BALANCE_LEN..]);
        tail
    }
}
