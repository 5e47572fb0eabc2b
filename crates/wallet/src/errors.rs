//! Wallet error taxonomy.

use aurum_crypto::CryptoError;
use aurum_primitives::AddressError;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WalletError {
    /// A spend-capable operation was called on a view-only wallet.
    IllegalViewWalletOperation,
    /// A view-only operation was called on a full wallet.
    IllegalNonViewWalletOperation,
    /// An imported key collides with an existing sub-wallet.
    SubWalletAlreadyExists,
    /// Input selection could not reach the requested amount.
    NotEnoughFunds,
    /// The container holds no primary sub-wallet. This indicates corrupted
    /// state: the constructor always creates one.
    NoPrimaryAddress,
    /// The caller referenced a public spend key the container does not own.
    SubWalletNotFound,
    /// An address failed to decode.
    InvalidAddress(AddressError),
    /// Key material failed to decode.
    Crypto(CryptoError),
}

impl std::fmt::Display for WalletError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WalletError::IllegalViewWalletOperation => {
                write!(f, "operation requires a spend key but this is a view wallet")
            }
            WalletError::IllegalNonViewWalletOperation => {
                write!(f, "operation is only valid on a view wallet")
            }
            WalletError::SubWalletAlreadyExists => {
                write!(f, "a sub-wallet with this spend key already exists")
            }
            WalletError::NotEnoughFunds => write!(f, "not enough unlocked funds"),
            WalletError::NoPrimaryAddress => write!(f, "container has no primary address"),
            WalletError::SubWalletNotFound => {
                write!(f, "no sub-wallet with the given public spend key")
            }
            WalletError::InvalidAddress(err) => write!(f, "invalid address: {err}"),
            WalletError::Crypto(err) => write!(f, "invalid key material: {err}"),
        }
    }
}

impl std::error::Error for WalletError {}

impl From<AddressError> for WalletError {
    fn from(err: AddressError) -> Self {
        WalletError::InvalidAddress(err)
    }
}

impl From<CryptoError> for WalletError {
    fn from(err: CryptoError) -> Self {
        WalletError::Crypto(err)
    }
}
