//! Confirmed and in-flight transaction bookkeeping.

use std::collections::HashSet;

use aurum_primitives::{Hash256, Transaction};
use serde::{Deserialize, Serialize};

/// Confirmed journal entries in arrival order, plus the transactions the
/// user has submitted but the scanner has not yet observed in a block.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TransactionJournal {
    transactions: Vec<Transaction>,
    locked_transactions: Vec<Transaction>,
}

impl TransactionJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a user-submitted transaction awaiting confirmation.
    pub fn add_unconfirmed(&mut self, transaction: Transaction) {
        self.locked_transactions.push(transaction);
    }

    /// Record a transaction the scanner found in a block. If we submitted
    /// it ourselves it is sitting in the locked list under the same hash;
    /// every such entry is replaced by the confirmed one.
    pub fn add_confirmed(&mut self, transaction: Transaction) {
        self.locked_transactions
            .retain(|locked| locked.hash != transaction.hash);
        self.transactions.push(transaction);
    }

    /// Drop every confirmed entry at or above the fork height.
    pub fn remove_forked(&mut self, fork_height: u64) {
        self.transactions
            .retain(|transaction| transaction.block_height < fork_height);
    }

    /// Drop every locked entry whose hash the submitter cancelled.
    pub fn remove_cancelled(&mut self, cancelled: &HashSet<Hash256>) {
        self.locked_transactions
            .retain(|transaction| !cancelled.contains(&transaction.hash));
    }

    /// Prepare for a rescan: in-flight entries will be rediscovered in the
    /// pool or a block, confirmed entries above the scan height rescanned.
    pub fn reset(&mut self, scan_height: u64) {
        self.locked_transactions.clear();
        self.transactions
            .retain(|transaction| transaction.block_height < scan_height);
    }

    pub fn locked_hashes(&self) -> HashSet<Hash256> {
        self.locked_transactions
            .iter()
            .map(|transaction| transaction.hash)
            .collect()
    }

    pub fn confirmed(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn unconfirmed(&self) -> &[Transaction] {
        &self.locked_transactions
    }
}
