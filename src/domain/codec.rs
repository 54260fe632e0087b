//! Conversion between a balance and the on-card block layout.
//!
//! Bytes `[0..4)` hold the balance as a big-endian `u32`; bytes `[4..16)` are
//! an opaque tail that is copied through unchanged.

use super::card::{BALANCE_LEN, BLOCK_SIZE, BalanceBlock, TAIL_LEN};

/// Reads the balance out of a block.
pub fn decode(block: &BalanceBlock) -> u32 {
    let mut balance = [0u8; BALANCE_LEN];
    balance.copy_from_slice(&block.as_bytes()[..BALANCE_LEN]);
    u32::from_be_bytes(balance)
}

/// Builds a block holding `balance` followed by `tail`.
pub fn encode(balance: u32, tail: &[u8; TAIL_LEN]) -> BalanceBlock {
    let mut bytes = [0u8; BLOCK_SIZE];
    bytes[..BALANCE_LEN].copy_from_slice(&balance.to_be_bytes());
    bytes[BALANCE_LEN..].copy_from_slice(tail);
    BalanceBlock::from_bytes(bytes)
}
