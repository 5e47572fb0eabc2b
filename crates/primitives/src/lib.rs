//! Key types, the wallet data model, and address encoding.

pub mod address;
pub mod keys;
pub mod transaction;

pub use address::{address_to_keys, keys_to_address, AddressError};
pub use keys::{Hash256, KeyDerivation, KeyImage, PublicKey, SecretKey};
pub use transaction::{
    GlobalIndexKey, KeyInput, KeyOutput, ObscuredInput, RawTransaction, Transaction,
    TransactionDestination, TransactionInput, TxInputAndOwner, WalletBlockInfo,
};
