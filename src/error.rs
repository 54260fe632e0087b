use crate::domain::card::CardIdentity;
use thiserror::Error;

/// Every way a tick, a command or a scan can fail.
///
/// Failures from one command or one scan never leave the tick that produced
/// them; the engine logs them and carries on.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Connectivity error: {0}")]
    Connectivity(String),
    #[error("Malformed top-up payload: {0}")]
    Protocol(String),
    #[error("Top-up amount must be a positive integer, got {0:?}")]
    InvalidAmount(Option<i128>),
    #[error("No card present")]
    NoCardPresent,
    #[error("Anti-collision failed: {0}")]
    AntiCollision(String),
    #[error("Presented card {presented} does not match requested card {requested}")]
    IdentityMismatch {
        presented: CardIdentity,
        requested: CardIdentity,
    },
    #[error("Authentication failed for block {block}")]
    Authentication { block: u8 },
    #[error("Read of block {block} failed: {reason}")]
    Read { block: u8, reason: String },
    #[error("Write of block {block} failed: {reason}")]
    Write { block: u8, reason: String },
    #[error("Balance {balance} plus {amount} exceeds the representable range")]
    Overflow { balance: u32, amount: u128 },
    #[error("Scenario error: {0}")]
    Scenario(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl LedgerError {
    pub fn is_connectivity(&self) -> bool {
        matches!(self, LedgerError::Connectivity(_))
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
