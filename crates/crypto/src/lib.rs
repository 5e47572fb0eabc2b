//! Wallet-side CryptoNote key math.
//!
//! Everything a wallet needs to own outputs: key pairs, shared-secret
//! derivations, one-time output keys, and key images. Ring signature
//! construction and verification are the transaction builder's and the
//! daemon's business and do not live here.

use curve25519_dalek::edwards::{CompressedEdwardsY, EdwardsPoint};
use curve25519_dalek::scalar::Scalar;
use rand::rngs::OsRng;
use rand::RngCore;
use sha3::{Digest, Keccak256};
use zeroize::Zeroize;

use aurum_primitives::{address, KeyDerivation, KeyImage, PublicKey, SecretKey};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CryptoError {
    InvalidSecretKey,
    InvalidPublicKey,
    InvalidDerivation,
}

impl std::fmt::Display for CryptoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CryptoError::InvalidSecretKey => write!(f, "secret key is not a canonical scalar"),
            CryptoError::InvalidPublicKey => write!(f, "public key is not a valid curve point"),
            CryptoError::InvalidDerivation => write!(f, "key derivation is not a valid curve point"),
        }
    }
}

impl std::error::Error for CryptoError {}

/// Generate a fresh key pair from the OS entropy source.
pub fn generate_keys() -> (PublicKey, SecretKey) {
    let mut wide = [0u8; 64];
    OsRng.fill_bytes(&mut wide);
    let scalar = Scalar::from_bytes_mod_order_wide(&wide);
    wide.zeroize();

    let public = EdwardsPoint::mul_base(&scalar).compress();
    (
        PublicKey::from_bytes(public.to_bytes()),
        SecretKey::from_bytes(scalar.to_bytes()),
    )
}

/// Derive the public key of a secret scalar.
pub fn secret_key_to_public_key(secret_key: &SecretKey) -> Result<PublicKey, CryptoError> {
    let scalar = decode_scalar(secret_key)?;
    let public = EdwardsPoint::mul_base(&scalar).compress();
    Ok(PublicKey::from_bytes(public.to_bytes()))
}

/// Shared-secret derivation `8 * secret * public`, cofactor-cleared so both
/// sides of a transaction agree on it.
pub fn generate_key_derivation(
    public_key: &PublicKey,
    secret_key: &SecretKey,
) -> Result<KeyDerivation, CryptoError> {
    let point = decode_point(public_key).ok_or(CryptoError::InvalidPublicKey)?;
    let scalar = decode_scalar(secret_key)?;

    let shared = (scalar * point).mul_by_cofactor();
    Ok(KeyDerivation::from_bytes(shared.compress().to_bytes()))
}

/// The one-time output key `Hs(derivation || index) * G + spend_public`.
pub fn derive_public_key(
    derivation: &KeyDerivation,
    output_index: u64,
    public_spend_key: &PublicKey,
) -> Result<PublicKey, CryptoError> {
    let base = decode_point(public_spend_key).ok_or(CryptoError::InvalidPublicKey)?;
    let scalar = derivation_to_scalar(derivation, output_index);

    let one_time = EdwardsPoint::mul_base(&scalar) + base;
    Ok(PublicKey::from_bytes(one_time.compress().to_bytes()))
}

/// The key image of the output at `output_index`:
/// `x * Hp(P)` where `x = Hs(derivation || index) + spend_secret` and `P`
/// is the one-time output key for `x`.
pub fn derive_key_image(
    derivation: &KeyDerivation,
    output_index: u64,
    public_spend_key: &PublicKey,
    private_spend_key: &SecretKey,
) -> Result<KeyImage, CryptoError> {
    let spend_scalar = decode_scalar(private_spend_key)?;
    let one_time_public = derive_public_key(derivation, output_index, public_spend_key)?;

    let x = derivation_to_scalar(derivation, output_index) + spend_scalar;
    let image = x * hash_to_point(&one_time_public);
    Ok(KeyImage::from_bytes(image.compress().to_bytes()))
}

/// Hash arbitrary bytes onto the scalar field.
pub fn hash_to_scalar(data: &[u8]) -> Scalar {
    let digest = Keccak256::digest(data);
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&digest);
    Scalar::from_bytes_mod_order(bytes)
}

/// Deterministic one-way map from a public key to a curve point, used to
/// anchor key images. Wallet-side we only need determinism and one-wayness,
/// so the scalar-times-basepoint construction suffices.
pub fn hash_to_point(public_key: &PublicKey) -> EdwardsPoint {
    EdwardsPoint::mul_base(&hash_to_scalar(public_key.as_bytes()))
}

/// Encode the address owning `(private_spend_key, private_view_key)`.
pub fn private_keys_to_address(
    private_spend_key: &SecretKey,
    private_view_key: &SecretKey,
) -> Result<String, CryptoError> {
    let spend = secret_key_to_public_key(private_spend_key)?;
    let view = secret_key_to_public_key(private_view_key)?;
    Ok(address::keys_to_address(&spend, &view))
}

/// Encode the address owning `(public_spend_key, public_view_key)`.
pub fn public_keys_to_address(
    public_spend_key: &PublicKey,
    public_view_key: &PublicKey,
) -> String {
    address::keys_to_address(public_spend_key, public_view_key)
}

fn decode_scalar(secret_key: &SecretKey) -> Result<Scalar, CryptoError> {
    Option::from(Scalar::from_canonical_bytes(secret_key.to_bytes()))
        .ok_or(CryptoError::InvalidSecretKey)
}

fn decode_point(public_key: &PublicKey) -> Option<EdwardsPoint> {
    CompressedEdwardsY(public_key.to_bytes()).decompress()
}

fn derivation_to_scalar(derivation: &KeyDerivation, output_index: u64) -> Scalar {
    let mut buffer = Vec::with_capacity(32 + 10);
    buffer.extend_from_slice(derivation.as_bytes());
    write_varint(&mut buffer, output_index);
    hash_to_scalar(&buffer)
}

fn write_varint(out: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        out.push((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}
