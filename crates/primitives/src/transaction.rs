//! Wallet-side transaction data model.
//!
//! These are the types exchanged with the block scanner (raw transactions,
//! block info) and with the transaction builder (inputs, destinations,
//! obscured rings), plus the container's own ledger records.

use std::collections::HashMap;

use aurum_consensus::Amount;
use serde::{Deserialize, Serialize};

use crate::keys::{Hash256, KeyImage, PublicKey, SecretKey};

/// One output of a raw transaction: the one-time key and its amount.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyOutput {
    pub key: PublicKey,
    pub amount: Amount,
}

/// One input of a raw transaction, as read off the chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyInput {
    pub amount: Amount,
    pub key_image: KeyImage,
}

/// A transaction as parsed out of a block, before the container has decided
/// which outputs belong to it.
///
/// Coinbase transactions carry no inputs and no payment ID.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RawTransaction {
    Coinbase {
        hash: Hash256,
        transaction_public_key: PublicKey,
        unlock_time: u64,
        key_outputs: Vec<KeyOutput>,
    },
    Standard {
        hash: Hash256,
        transaction_public_key: PublicKey,
        unlock_time: u64,
        key_outputs: Vec<KeyOutput>,
        payment_id: String,
        key_inputs: Vec<KeyInput>,
    },
}

impl RawTransaction {
    pub fn hash(&self) -> Hash256 {
        match self {
            Self::Coinbase { hash, .. } | Self::Standard { hash, .. } => *hash,
        }
    }

    pub fn transaction_public_key(&self) -> PublicKey {
        match self {
            Self::Coinbase {
                transaction_public_key,
                ..
            }
            | Self::Standard {
                transaction_public_key,
                ..
            } => *transaction_public_key,
        }
    }

    pub fn unlock_time(&self) -> u64 {
        match self {
            Self::Coinbase { unlock_time, .. } | Self::Standard { unlock_time, .. } => *unlock_time,
        }
    }

    pub fn key_outputs(&self) -> &[KeyOutput] {
        match self {
            Self::Coinbase { key_outputs, .. } | Self::Standard { key_outputs, .. } => key_outputs,
        }
    }

    pub fn is_coinbase(&self) -> bool {
        matches!(self, Self::Coinbase { .. })
    }
}

/// A block distilled to what the wallet needs to sync it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletBlockInfo {
    pub coinbase_transaction: RawTransaction,
    pub transactions: Vec<RawTransaction>,
    pub block_height: u64,
    pub block_hash: Hash256,
    pub block_timestamp: u64,
}

/// An output owned by one of the container's sub-wallets.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInput {
    /// Spend tag for this output. View wallets cannot derive it and store
    /// `None` until a spend key becomes available.
    pub key_image: Option<KeyImage>,

    pub amount: Amount,

    /// Height of the block the output appeared in; forked inputs at or
    /// above a rollback height are discarded by it.
    pub block_height: u64,

    /// Transaction public key from the tx extra.
    pub transaction_public_key: PublicKey,

    /// Index of this output within its transaction.
    pub transaction_index: u64,

    /// Index of this output in the chain-global output set.
    pub global_output_index: u64,

    /// The derived one-time output key.
    pub key: PublicKey,

    /// Height the spend was confirmed at; zero while unspent.
    pub spend_height: u64,

    /// Dual-purpose: a block height up to `MAX_BLOCK_NUMBER`, a UNIX
    /// timestamp above it.
    pub unlock_time: u64,

    /// Hash of the transaction that created this output.
    pub parent_transaction_hash: Hash256,

    /// Coinbase outputs mature only after the mined-money unlock window.
    pub is_coinbase: bool,

    /// Hash of the submitted-but-unconfirmed transaction spending this
    /// input, if any. Cleared on confirmation or cancellation.
    pub locked_by: Option<Hash256>,
}

impl TransactionInput {
    pub fn is_spent(&self) -> bool {
        self.spend_height > 0
    }

    pub fn is_locked(&self) -> bool {
        self.locked_by.is_some()
    }
}

/// An input paired with the keys needed to sign for it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInputAndOwner {
    pub input: TransactionInput,
    pub public_spend_key: PublicKey,
    pub private_spend_key: SecretKey,
}

/// A confirmed or in-flight transaction from the container's point of
/// view: net amount deltas per owned sub-wallet, plus block metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Net change per owned public spend key. Positive is incoming,
    /// negative outgoing; one hash can touch several sub-wallets.
    pub transfers: HashMap<PublicKey, i64>,

    pub hash: Hash256,

    /// Always non-negative; zero together with non-coinbase marks a fusion
    /// transaction.
    pub fee: Amount,

    pub block_height: u64,

    pub timestamp: u64,

    /// Empty string when the transaction carried no payment ID.
    pub payment_id: String,

    pub unlock_time: u64,

    pub is_coinbase: bool,
}

impl Transaction {
    pub fn total_amount(&self) -> i64 {
        self.transfers.values().sum()
    }

    /// Anything zero-fee that is not a miner reward was a fusion; full
    /// validation of the fusion rules is the daemon's job.
    pub fn is_fusion(&self) -> bool {
        self.fee == 0 && !self.is_coinbase
    }
}

/// Where the transaction builder should send an output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDestination {
    pub receiver_public_spend_key: PublicKey,
    pub receiver_public_view_key: PublicKey,
    pub amount: Amount,
}

/// A chain-global output index with its one-time key, used as a ring
/// member.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalIndexKey {
    pub index: u64,
    pub key: PublicKey,
}

/// A real input hidden in a ring of decoys, ready for signing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObscuredInput {
    /// Ring members, the real output included.
    pub outputs: Vec<GlobalIndexKey>,

    /// Index of the real output within `outputs`.
    pub real_output: u64,

    pub real_transaction_public_key: PublicKey,

    /// Index of the real output within its parent transaction.
    pub real_output_transaction_index: u64,

    pub amount: Amount,

    pub owner_public_spend_key: PublicKey,

    pub owner_private_spend_key: SecretKey,
}
