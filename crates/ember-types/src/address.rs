//! Ethereum-style address parsing, validation, and EIP-55 checksums.

use thiserror::Error;
use tiny_keccak::{Hasher, Keccak};

/// Address length in bytes.
pub const ADDRESS_SIZE: usize = 20;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("address must be a non-empty string")]
    Empty,

    #[error("address must start with 0x")]
    MissingPrefix,

    #[error("invalid address length ({0}), expected 40 hex characters")]
    InvalidLength(usize),

    #[error("invalid hex in address: {0}")]
    InvalidHex(String),

    #[error("address checksum mismatch")]
    BadChecksum,
}

fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut out = [0u8; 32];
    hasher.finalize(&mut out);
    out
}

/// Parse a `0x`-prefixed hex address into its 20 bytes.
///
/// All-lowercase and all-uppercase forms are accepted as-is; mixed case must
/// carry a valid EIP-55 checksum.
pub fn parse_address(address: &str) -> Result<[u8; ADDRESS_SIZE], AddressError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(AddressError::Empty);
    }
    let body = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .ok_or(AddressError::MissingPrefix)?;
    if body.len() != ADDRESS_SIZE * 2 {
        return Err(AddressError::InvalidLength(body.len()));
    }

    let bytes = hex::decode(body).map_err(|e| AddressError::InvalidHex(e.to_string()))?;
    let mut out = [0u8; ADDRESS_SIZE];
    out.copy_from_slice(&bytes);

    let has_lower = body.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = body.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper && to_checksum_address(&out)[2..] != *body {
        return Err(AddressError::BadChecksum);
    }

    Ok(out)
}

/// Validate an address string.
pub fn is_valid_address(address: &str) -> bool {
    parse_address(address).is_ok()
}

/// Encode 20 address bytes in EIP-55 mixed-case form.
pub fn to_checksum_address(bytes: &[u8; ADDRESS_SIZE]) -> String {
    let lower = hex::encode(bytes);
    let hash = keccak256(lower.as_bytes());

    let mut out = String::with_capacity(2 + lower.len());
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let nibble = (hash[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0f;
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Parse and re-encode an address with its checksum.
pub fn checksum(address: &str) -> Result<String, AddressError> {
    parse_address(address).map(|bytes| to_checksum_address(&bytes))
}

/// Case-insensitive address comparison (prefix optional).
pub fn same_address(a: &str, b: &str) -> bool {
    fn body(s: &str) -> &str {
        let s = s.trim();
        s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s)
    }
    body(a).eq_ignore_ascii_case(body(b))
}

/// Left-pad an address to a 32-byte log topic.
pub fn address_to_topic(bytes: &[u8; ADDRESS_SIZE]) -> String {
    format!("0x{}{}", "0".repeat(24), hex::encode(bytes))
}

/// Extract the address held in the low 20 bytes of a 32-byte log topic.
pub fn topic_to_address(topic: &str) -> Option<String> {
    let body = topic.strip_prefix("0x").unwrap_or(topic);
    if body.len() != 64 || !body.is_ascii() {
        return None;
    }
    let bytes = hex::decode(&body[24..]).ok()?;
    let mut out = [0u8; ADDRESS_SIZE];
    out.copy_from_slice(&bytes);
    Some(to_checksum_address(&out))
}
