//! The sub-wallet container: the wallet-side ledger of a CryptoNote-family
//! wallet.
//!
//! A container owns a set of sub-wallets sharing one private view key. The
//! block scanner feeds discovered outputs and transactions in; the
//! transaction builder takes spendable inputs out and reports submissions
//! back. Everything in between — spendability classification, balances,
//! fusion bucketing, fork rollback — lives here, behind one mutex so the
//! scanner and sender threads can share a container safely.

pub mod container;
pub mod errors;
pub mod journal;
pub mod sub_wallet;

pub use container::{FusionInputs, SubWalletContainer};
pub use errors::WalletError;
pub use journal::TransactionJournal;
pub use sub_wallet::SubWallet;
