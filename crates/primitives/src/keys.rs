//! Fixed-size key and hash newtypes.
//!
//! All of these wrap 32 opaque bytes. Distinct types keep spend keys, view
//! keys, key images, and hashes from being interchanged by accident; the
//! bytes themselves are produced and consumed by the crypto crate.

use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

macro_rules! bytes32_newtype {
    ($name:ident) => {
        #[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub [u8; 32]);

        impl $name {
            pub const fn from_bytes(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }

            pub const fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            pub const fn to_bytes(self) -> [u8; 32] {
                self.0
            }

            pub fn from_hex(raw: &str) -> Option<Self> {
                let mut bytes = [0u8; 32];
                hex::decode_to_slice(raw, &mut bytes).ok()?;
                Some(Self(bytes))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), hex::encode(self.0))
            }
        }

        impl From<[u8; 32]> for $name {
            fn from(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }
        }
    };
}

bytes32_newtype!(PublicKey);
bytes32_newtype!(SecretKey);
bytes32_newtype!(KeyImage);
bytes32_newtype!(KeyDerivation);
bytes32_newtype!(Hash256);

impl Zeroize for SecretKey {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn hex_round_trip() {
        let key = PublicKey::from_bytes([0xab; 32]);
        let parsed = PublicKey::from_hex(&key.to_string()).expect("valid hex");
        assert_eq!(key, parsed);
        assert!(PublicKey::from_hex("zz").is_none());
        assert!(PublicKey::from_hex("abcd").is_none());
    }

    #[test]
    fn usable_as_set_key() {
        let mut images = HashSet::new();
        assert!(images.insert(KeyImage::from_bytes([1; 32])));
        assert!(!images.insert(KeyImage::from_bytes([1; 32])));
        assert!(images.insert(KeyImage::from_bytes([2; 32])));
    }

    #[test]
    fn secret_key_zeroizes() {
        let mut secret = SecretKey::from_bytes([0x5a; 32]);
        secret.zeroize();
        assert_eq!(secret, SecretKey::default());
    }
}
