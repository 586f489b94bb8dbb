//! Hex quantity encoding (`0x`-prefixed, no leading zeros).

use crate::error::RpcError;
use serde::{Deserialize, Deserializer};

pub fn parse_u128(s: &str) -> Result<u128, RpcError> {
    let body = s
        .strip_prefix("0x")
        .ok_or_else(|| RpcError::InvalidQuantity(s.to_string()))?;
    if body.is_empty() {
        return Err(RpcError::InvalidQuantity(s.to_string()));
    }
    u128::from_str_radix(body, 16).map_err(|_| RpcError::InvalidQuantity(s.to_string()))
}

pub fn parse_u64(s: &str) -> Result<u64, RpcError> {
    let v = parse_u128(s)?;
    u64::try_from(v).map_err(|_| RpcError::InvalidQuantity(s.to_string()))
}

/// Parse a 32-byte big-endian data word, if it fits in 128 bits.
pub fn parse_word_u128(s: &str) -> Option<u128> {
    let body = s.strip_prefix("0x").unwrap_or(s);
    if body.len() != 64 || !body.is_ascii() || !body[..32].bytes().all(|b| b == b'0') {
        return None;
    }
    u128::from_str_radix(&body[32..], 16).ok()
}

pub fn encode(v: u128) -> String {
    format!("0x{:x}", v)
}

pub(crate) fn de_u64<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    let s = String::deserialize(d)?;
    parse_u64(&s).map_err(serde::de::Error::custom)
}

pub(crate) fn de_u128<'de, D: Deserializer<'de>>(d: D) -> Result<u128, D::Error> {
    let s = String::deserialize(d)?;
    parse_u128(&s).map_err(serde::de::Error::custom)
}

pub(crate) fn de_opt_u64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
    Option::<String>::deserialize(d)?
        .map(|s| parse_u64(&s).map_err(serde::de::Error::custom))
        .transpose()
}
