//! Monetary units and money range rules.

pub type Amount = u64;

/// Atomic units per whole coin.
pub const COIN: Amount = 100_000_000;

/// No amount larger than this (in atomic units) is valid.
pub const MAX_MONEY: Amount = 10_000_000_000 * COIN;

pub fn money_range(value: Amount) -> bool {
    value <= MAX_MONEY
}
