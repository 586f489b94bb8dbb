//! Persisted account record and transaction history entries.
//!
//! The record is camelCase JSON so files written by earlier wallet builds
//! keep loading: `to` is read as `counterparty`, missing `direction` means
//! sent, missing `timestamp` means 0, and `balance` may be a JSON number.

use crate::secret::{Pin, SecretPhrase};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Sent,
    Received,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    /// Transaction hash, or `"{tx_hash}:{log_index}"` for token transfers.
    pub hash: String,
    #[serde(default)]
    pub direction: Direction,
    #[serde(alias = "to")]
    pub counterparty: String,
    pub amount: Decimal,
    /// Unix seconds.
    #[serde(default)]
    pub timestamp: u64,
    /// Network key; `None` on records written before networks existed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    /// Token contract; `None` for the native currency.
    ///
    /// Token amounts are the raw transfer value over 10^18, whatever the
    /// token's own `decimals()`: 1 USDC (6 decimals) reads as 0.000000000001.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset: Option<String>,
    /// Free-form date text carried by records from older builds. Kept so a
    /// re-save does not lose it; new records leave it empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl TransactionRecord {
    pub fn is_native(&self) -> bool {
        self.asset.is_none()
    }

    /// Visible on `network`: tagged with it, or untagged.
    pub fn visible_on(&self, network: &str) -> bool {
        self.network.as_deref().map_or(true, |n| n == network)
    }
}

/// The account record as loaded from the store.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRecord {
    pub address: String,
    /// Absent on watch-only records.
    #[serde(default)]
    pub mnemonic: Option<SecretPhrase>,
    pub pin: Pin,
    #[serde(default)]
    pub balance: Decimal,
    #[serde(default)]
    pub history: Vec<TransactionRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_network: Option<String>,
}

/// Borrowed view used to write the live session without cloning secrets.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AccountRecordRef<'a> {
    pub address: &'a str,
    pub mnemonic: Option<&'a SecretPhrase>,
    pub pin: &'a Pin,
    pub balance: Decimal,
    pub history: &'a VecDeque<TransactionRecord>,
    pub active_network: &'a str,
}
