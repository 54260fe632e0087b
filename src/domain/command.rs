use super::card::CardIdentity;
use crate::error::{LedgerError, Result};
use serde::Deserialize;

/// Wire shape of a top-up request as the control plane sends it.
#[derive(Debug, Deserialize)]
struct TopUpPayload {
    uid: Option<String>,
    /// Wide enough that any integer literal the control plane might send is
    /// classified by value rather than rejected as malformed.
    amount: Option<i128>,
}

/// A validated request to credit `amount` to the card `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopUpCommand {
    pub target: CardIdentity,
    amount: u128,
}

impl TopUpCommand {
    pub fn new(target: CardIdentity, amount: i128) -> Result<Self> {
        match u128::try_from(amount) {
            Ok(value) if value > 0 => Ok(Self {
                target,
                amount: value,
            }),
            _ => Err(LedgerError::InvalidAmount(Some(amount))),
        }
    }

    /// Parses and validates a raw payload from the top-up topic.
    ///
    /// Structural problems (not JSON, missing or non-hex `uid`, non-integer
    /// `amount`) are `Protocol` errors; a missing, zero or negative amount is
    /// `InvalidAmount`.
    pub fn from_payload(payload: &[u8]) -> Result<Self> {
        let parsed: TopUpPayload = serde_json::from_slice(payload)
            .map_err(|e| LedgerError::Protocol(e.to_string()))?;

        let target: CardIdentity = parsed
            .uid
            .ok_or_else(|| LedgerError::Protocol("missing field `uid`".to_string()))?
            .parse()?;

        match parsed.amount {
            Some(amount) => Self::new(target, amount),
            None => Err(LedgerError::InvalidAmount(None)),
        }
    }

    pub fn amount(&self) -> u128 {
        self.amount
    }

    /// Balance after crediting this command to `balance`.
    pub fn credit(&self, balance: u32) -> Result<u32> {
        u128::from(balance)
            .checked_add(self.amount)
            .and_then(|total| u32::try_from(total).ok())
            .ok_or(LedgerError::Overflow {
                balance,
                amount: self.amount,
            })
    }
}
