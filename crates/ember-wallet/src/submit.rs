//! Native transfer submission.
//!
//! Validation happens before any node is contacted. The broadcast is sent
//! exactly once: a lost response is ambiguous and is resolved by
//! `check_transaction` or the next reconcile pass, never by a resend.

use crate::error::WalletError;
use crate::record::{Direction, TransactionRecord};
use crate::session::Session;
use ember_crypto::TxIntent;
use ember_types::address::{parse_address, ADDRESS_SIZE};
use ember_types::units::{decimal_to_wei, parse_amount};
use rust_decimal::Decimal;
use std::time::{SystemTime, UNIX_EPOCH};

/// A validated transfer request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    /// Recipient as entered (trimmed).
    pub to: String,
    pub to_bytes: [u8; ADDRESS_SIZE],
    pub amount: Decimal,
    pub value_wei: u128,
}

impl TransferRequest {
    /// Check a recipient address and a positive amount with at most 18 decimals.
    pub fn parse(to: &str, amount_text: &str) -> Result<Self, WalletError> {
        let to = to.trim();
        if to.is_empty() {
            return Err(WalletError::InvalidInput("recipient is empty".into()));
        }
        let to_bytes = parse_address(to)
            .map_err(|e| WalletError::InvalidInput(format!("recipient: {}", e)))?;
        let amount = parse_amount(amount_text)
            .map_err(|e| WalletError::InvalidInput(format!("amount: {}", e)))?;
        let value_wei = decimal_to_wei(amount)
            .map_err(|e| WalletError::InvalidInput(format!("amount: {}", e)))?;
        Ok(Self {
            to: to.to_string(),
            to_bytes,
            amount,
            value_wei,
        })
    }
}

impl Session {
    /// Sign and broadcast a native transfer on the active network.
    ///
    /// On success the sent record is placed at the head of history and
    /// persisted. Node errors come back as [`WalletError::Chain`] with the
    /// node's message. The local balance is not adjusted.
    pub async fn submit(
        &self,
        to: &str,
        amount_text: &str,
    ) -> Result<TransactionRecord, WalletError> {
        if !self.can_sign() {
            return Err(WalletError::NotUnlocked);
        }
        let request = TransferRequest::parse(to, amount_text)?;

        let _op = self.op_lock().lock().await;
        let snapshot = self.snapshot(true)?;
        let client = snapshot.client.as_ref();
        let network = &snapshot.network;

        let nonce = client.get_transaction_count(&snapshot.address).await?;
        let gas_price = client.gas_price().await?;
        let intent = TxIntent::transfer(request.to_bytes, request.value_wei, nonce, gas_price);
        let signed = self.sign(&intent)?;

        log::info!(
            "broadcasting {} {} to {} on {} (nonce {})",
            request.amount,
            network.native_symbol,
            request.to,
            network.key,
            nonce
        );
        let hash = match client.broadcast(&signed.raw).await {
            Ok(hash) => hash,
            Err(e) => {
                log::warn!("broadcast on {} failed: {}", network.key, e);
                return Err(e.into());
            }
        };
        if !hash.eq_ignore_ascii_case(&signed.hash_hex()) {
            log::debug!("node returned hash {} for local {}", hash, signed.hash_hex());
        }

        let record = TransactionRecord {
            hash,
            direction: Direction::Sent,
            counterparty: request.to,
            amount: request.amount,
            timestamp: unix_now(),
            network: Some(network.key.clone()),
            asset: None,
            date: None,
        };
        if let Err(e) = self.merge_records(&snapshot.address, vec![record.clone()]) {
            log::error!("transaction {} was broadcast but not saved: {}", record.hash, e);
        }
        Ok(record)
    }
}

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
