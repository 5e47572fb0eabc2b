//! CryptoNote base58 address encoding and decoding.
//!
//! An address encodes `varint(prefix) || spend key || view key || checksum`
//! where the checksum is the first four bytes of the Keccak-256 of
//! everything before it. The base58 coding is block-wise: each 8-byte block
//! maps to a fixed 11 characters so the decoder never has to guess widths.

use aurum_consensus::constants::ADDRESS_BASE58_PREFIX;
use sha3::{Digest, Keccak256};

use crate::keys::PublicKey;

const ALPHABET: &[u8; 58] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

const FULL_BLOCK_SIZE: usize = 8;
const FULL_ENCODED_BLOCK_SIZE: usize = 11;

/// Encoded width for a trailing block of 0..=8 raw bytes.
const ENCODED_BLOCK_SIZES: [usize; 9] = [0, 2, 3, 5, 6, 7, 9, 10, 11];

const CHECKSUM_SIZE: usize = 4;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AddressError {
    InvalidLength,
    InvalidCharacter,
    InvalidChecksum,
    UnknownPrefix,
    Overflow,
}

impl std::fmt::Display for AddressError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AddressError::InvalidLength => write!(f, "invalid address length"),
            AddressError::InvalidCharacter => write!(f, "invalid base58 character"),
            AddressError::InvalidChecksum => write!(f, "address checksum mismatch"),
            AddressError::UnknownPrefix => write!(f, "unknown address prefix"),
            AddressError::Overflow => write!(f, "base58 block out of range"),
        }
    }
}

impl std::error::Error for AddressError {}

/// Encode a spend/view public key pair as an address string.
pub fn keys_to_address(public_spend_key: &PublicKey, public_view_key: &PublicKey) -> String {
    let mut payload = Vec::with_capacity(2 + 64 + CHECKSUM_SIZE);
    write_varint(&mut payload, ADDRESS_BASE58_PREFIX);
    payload.extend_from_slice(public_spend_key.as_bytes());
    payload.extend_from_slice(public_view_key.as_bytes());

    let digest = Keccak256::digest(&payload);
    payload.extend_from_slice(&digest[..CHECKSUM_SIZE]);

    base58_encode(&payload)
}

/// Decode an address back into its `(spend, view)` public keys.
pub fn address_to_keys(address: &str) -> Result<(PublicKey, PublicKey), AddressError> {
    let payload = base58_decode(address)?;
    if payload.len() < CHECKSUM_SIZE {
        return Err(AddressError::InvalidLength);
    }

    let (body, checksum) = payload.split_at(payload.len() - CHECKSUM_SIZE);
    let digest = Keccak256::digest(body);
    if checksum != &digest[..CHECKSUM_SIZE] {
        return Err(AddressError::InvalidChecksum);
    }

    let (prefix, keys) = read_varint(body)?;
    if prefix != ADDRESS_BASE58_PREFIX {
        return Err(AddressError::UnknownPrefix);
    }
    if keys.len() != 64 {
        return Err(AddressError::InvalidLength);
    }

    let mut spend = [0u8; 32];
    spend.copy_from_slice(&keys[..32]);
    let mut view = [0u8; 32];
    view.copy_from_slice(&keys[32..]);

    Ok((PublicKey::from_bytes(spend), PublicKey::from_bytes(view)))
}

fn write_varint(out: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        out.push((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

fn read_varint(data: &[u8]) -> Result<(u64, &[u8]), AddressError> {
    let mut value = 0u64;
    let mut shift = 0u32;
    for (idx, byte) in data.iter().enumerate() {
        if shift > 63 {
            return Err(AddressError::Overflow);
        }
        value |= u64::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            return Ok((value, &data[idx + 1..]));
        }
        shift += 7;
    }
    Err(AddressError::InvalidLength)
}

fn base58_encode(data: &[u8]) -> String {
    let full_blocks = data.len() / FULL_BLOCK_SIZE;
    let tail = data.len() % FULL_BLOCK_SIZE;
    let mut out =
        String::with_capacity(full_blocks * FULL_ENCODED_BLOCK_SIZE + ENCODED_BLOCK_SIZES[tail]);

    for block in data.chunks(FULL_BLOCK_SIZE) {
        encode_block(block, &mut out);
    }
    out
}

fn encode_block(block: &[u8], out: &mut String) {
    let mut value = 0u64;
    for byte in block {
        value = (value << 8) | u64::from(*byte);
    }

    let width = ENCODED_BLOCK_SIZES[block.len()];
    let mut digits = [0u8; FULL_ENCODED_BLOCK_SIZE];
    for digit in digits[..width].iter_mut().rev() {
        *digit = (value % 58) as u8;
        value /= 58;
    }
    for digit in &digits[..width] {
        out.push(ALPHABET[*digit as usize] as char);
    }
}

fn base58_decode(input: &str) -> Result<Vec<u8>, AddressError> {
    if input.is_empty() {
        return Err(AddressError::InvalidLength);
    }

    let bytes = input.as_bytes();
    let full_blocks = bytes.len() / FULL_ENCODED_BLOCK_SIZE;
    let tail = bytes.len() % FULL_ENCODED_BLOCK_SIZE;
    let tail_size = decoded_tail_size(tail)?;

    let mut out = Vec::with_capacity(full_blocks * FULL_BLOCK_SIZE + tail_size);
    for block in bytes.chunks(FULL_ENCODED_BLOCK_SIZE) {
        let raw_size = if block.len() == FULL_ENCODED_BLOCK_SIZE {
            FULL_BLOCK_SIZE
        } else {
            tail_size
        };
        decode_block(block, raw_size, &mut out)?;
    }
    Ok(out)
}

fn decoded_tail_size(encoded: usize) -> Result<usize, AddressError> {
    if encoded == 0 {
        return Ok(0);
    }
    ENCODED_BLOCK_SIZES
        .iter()
        .position(|size| *size == encoded)
        .ok_or(AddressError::InvalidLength)
}

fn decode_block(block: &[u8], raw_size: usize, out: &mut Vec<u8>) -> Result<(), AddressError> {
    let mut value = 0u64;
    for ch in block {
        let digit = base58_value(*ch).ok_or(AddressError::InvalidCharacter)?;
        value = value
            .checked_mul(58)
            .and_then(|v| v.checked_add(u64::from(digit)))
            .ok_or(AddressError::Overflow)?;
    }

    if raw_size < FULL_BLOCK_SIZE && value >> (8 * raw_size) != 0 {
        return Err(AddressError::Overflow);
    }

    for shift in (0..raw_size).rev() {
        out.push((value >> (8 * shift)) as u8);
    }
    Ok(())
}

fn base58_value(ch: u8) -> Option<u8> {
    ALPHABET.iter().position(|c| *c == ch).map(|idx| idx as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_keys() -> (PublicKey, PublicKey) {
        (
            PublicKey::from_bytes([0x11; 32]),
            PublicKey::from_bytes([0xee; 32]),
        )
    }

    #[test]
    fn address_round_trip() {
        let (spend, view) = sample_keys();
        let address = keys_to_address(&spend, &view);
        let (decoded_spend, decoded_view) = address_to_keys(&address).expect("valid address");
        assert_eq!(decoded_spend, spend);
        assert_eq!(decoded_view, view);
    }

    #[test]
    fn corrupted_checksum_rejected() {
        let (spend, view) = sample_keys();
        let mut address = keys_to_address(&spend, &view);
        let replacement = if address.ends_with('2') { '3' } else { '2' };
        address.pop();
        address.push(replacement);
        assert_eq!(
            address_to_keys(&address),
            Err(AddressError::InvalidChecksum)
        );
    }

    #[test]
    fn invalid_character_rejected() {
        let (spend, view) = sample_keys();
        let mut address = keys_to_address(&spend, &view);
        address.replace_range(0..1, "0");
        assert_eq!(
            address_to_keys(&address),
            Err(AddressError::InvalidCharacter)
        );
    }

    #[test]
    fn truncated_address_rejected() {
        let (spend, view) = sample_keys();
        let address = keys_to_address(&spend, &view);
        assert!(address_to_keys(&address[..address.len() - 3]).is_err());
    }

    #[test]
    fn base58_blocks_round_trip() {
        for len in 1..=24usize {
            let data: Vec<u8> = (0..len as u8).map(|b| b.wrapping_mul(37)).collect();
            let encoded = base58_encode(&data);
            let decoded = base58_decode(&encoded).expect("decodes");
            assert_eq!(decoded, data, "len {len}");
        }
    }
}
