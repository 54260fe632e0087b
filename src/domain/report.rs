use super::card::CardIdentity;
use serde::Serialize;

/// Balance seen during a passive scan; nothing was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceObservation {
    pub uid: CardIdentity,
    pub balance: u32,
}

/// Balance confirmed on the card after a successful top-up write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceUpdateReport {
    pub uid: CardIdentity,
    pub new_balance: u32,
}
