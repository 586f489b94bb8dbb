//! History reconciliation over a trailing block window.
//!
//! Two sources are scanned:
//! - every block in the window, for native transfers to or from the account;
//! - `eth_getLogs` over the window, for ERC-20 `Transfer` events naming the
//!   account as sender or receiver.
//!
//! Token events are keyed `"{tx_hash}:{log_index}"` so several transfers in
//! one transaction stay distinct. Token amounts are read with 18 decimals.
//! Candidates are merged oldest first at the head of history, so the newest
//! ends up on top, and the hash index makes repeated passes idempotent.

use crate::error::WalletError;
use crate::record::{Direction, TransactionRecord};
use crate::session::Session;
use ember_rpc::quantity::parse_word_u128;
use ember_rpc::{Block, ChainClient, ChainTransaction, Log, LogFilter, TRANSFER_TOPIC};
use ember_types::address::{
    address_to_topic, checksum, parse_address, same_address, topic_to_address,
};
use ember_types::units::wei_to_decimal;
use std::collections::HashMap;

/// Outcome of one reconcile pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub from_block: u64,
    pub to_block: u64,
    /// Records not previously in history.
    pub added: usize,
}

impl Session {
    /// Reconcile over the configured default window.
    pub async fn sync_history(&self) -> Result<ReconcileReport, WalletError> {
        self.reconcile(self.config().reconcile_window).await
    }

    /// Scan the last `window_blocks` blocks (ending at the tip) of the active
    /// network and merge what concerns this account into history.
    ///
    /// On a node failure mid-pass, whatever was found before the failure is
    /// still merged and persisted before the error is returned.
    pub async fn reconcile(&self, window_blocks: u64) -> Result<ReconcileReport, WalletError> {
        let _op = self.op_lock().lock().await;
        let snapshot = self.snapshot(false)?;
        if window_blocks == 0 {
            return Ok(ReconcileReport::default());
        }

        let client = snapshot.client.as_ref();
        let tip = client.get_block_number().await?;
        let from_block = tip.saturating_sub(window_blocks - 1);
        log::debug!(
            "reconciling {} on {}: blocks {}..={}",
            snapshot.address,
            snapshot.network.key,
            from_block,
            tip
        );

        let mut scan = Scan::new(&snapshot.address, &snapshot.network.key)?;
        let outcome = scan.run(client, from_block, tip).await;
        let merged = self.merge_records(&snapshot.address, scan.finish());

        match (outcome, merged) {
            (Ok(()), Ok(added)) => {
                if added > 0 {
                    log::info!("reconcile on {} added {} record(s)", snapshot.network.key, added);
                }
                Ok(ReconcileReport {
                    from_block,
                    to_block: tip,
                    added,
                })
            }
            (Ok(()), Err(e)) => Err(e),
            (Err(e), merged) => {
                if let Err(pe) = merged {
                    log::error!("failed to save partial reconcile results: {}", pe);
                }
                log::warn!("reconcile on {} failed: {}", snapshot.network.key, e);
                Err(e)
            }
        }
    }
}

/// Position of a candidate for ordering: block, then natives before logs.
type Position = (u64, u8, u64);

struct Scan<'a> {
    address: &'a str,
    topic: String,
    network: &'a str,
    timestamps: HashMap<u64, u64>,
    found: Vec<(Position, TransactionRecord)>,
}

impl<'a> Scan<'a> {
    fn new(address: &'a str, network: &'a str) -> Result<Self, WalletError> {
        let bytes = parse_address(address)
            .map_err(|e| WalletError::KeyDerivation(format!("account address: {}", e)))?;
        Ok(Self {
            address,
            topic: address_to_topic(&bytes),
            network,
            timestamps: HashMap::new(),
            found: Vec::new(),
        })
    }

    async fn run(
        &mut self,
        client: &dyn ChainClient,
        from: u64,
        to: u64,
    ) -> Result<(), WalletError> {
        for number in from..=to {
            match client.get_block(number).await? {
                Some(block) => self.visit_block(&block),
                None => log::debug!("block {} not available yet", number),
            }
        }

        let sent = LogFilter::new(from, to)
            .topics(vec![Some(TRANSFER_TOPIC.to_string()), Some(self.topic.clone())]);
        let received = LogFilter::new(from, to).topics(vec![
            Some(TRANSFER_TOPIC.to_string()),
            None,
            Some(self.topic.clone()),
        ]);
        for filter in [sent, received] {
            for log in client.get_logs(&filter).await? {
                self.visit_log(&log);
            }
        }
        Ok(())
    }

    fn visit_block(&mut self, block: &Block) {
        self.timestamps.insert(block.number, block.timestamp);
        for (index, tx) in block.transactions.iter().enumerate() {
            if let Some(record) = self.native_record(block, tx) {
                self.found.push(((block.number, 0, index as u64), record));
            }
        }
    }

    fn native_record(&self, block: &Block, tx: &ChainTransaction) -> Option<TransactionRecord> {
        if tx.value == 0 {
            return None;
        }
        let sent = same_address(&tx.from, self.address);
        let received = tx.to.as_deref().map_or(false, |to| same_address(to, self.address));
        if !sent && !received {
            return None;
        }
        let (direction, counterparty) = if sent {
            (Direction::Sent, tx.to.clone().unwrap_or_default())
        } else {
            (Direction::Received, tx.from.clone())
        };
        let amount = match wei_to_decimal(tx.value) {
            Ok(a) => a,
            Err(e) => {
                log::warn!("skipping {}: {}", tx.hash, e);
                return None;
            }
        };
        Some(TransactionRecord {
            hash: tx.hash.clone(),
            direction,
            counterparty,
            amount,
            timestamp: block.timestamp,
            network: Some(self.network.to_string()),
            asset: None,
            date: None,
        })
    }

    fn visit_log(&mut self, log: &Log) {
        // Three topics: ERC-721 puts the token id in a fourth.
        if log.removed
            || log.topics.len() != 3
            || !log.topics[0].eq_ignore_ascii_case(TRANSFER_TOPIC)
        {
            return;
        }
        let (Some(tx_hash), Some(log_index), Some(block)) =
            (log.transaction_hash.as_deref(), log.log_index, log.block_number)
        else {
            return;
        };
        let (Some(from), Some(to)) =
            (topic_to_address(&log.topics[1]), topic_to_address(&log.topics[2]))
        else {
            return;
        };
        let Some(value) = parse_word_u128(&log.data) else {
            log::debug!("skipping token log {}:{} with unreadable amount", tx_hash, log_index);
            return;
        };
        // Zero-value transfers are a common address-poisoning vector.
        if value == 0 {
            return;
        }
        let Ok(amount) = wei_to_decimal(value) else {
            return;
        };

        let direction = if same_address(&from, self.address) {
            Direction::Sent
        } else {
            Direction::Received
        };
        let counterparty = match direction {
            Direction::Sent => to,
            Direction::Received => from,
        };
        let asset = checksum(&log.address).unwrap_or_else(|_| log.address.clone());
        let record = TransactionRecord {
            hash: format!("{}:{}", tx_hash, log_index),
            direction,
            counterparty,
            amount,
            timestamp: self.timestamps.get(&block).copied().unwrap_or(0),
            network: Some(self.network.to_string()),
            asset: Some(asset),
            date: None,
        };
        self.found.push(((block, 1, log_index), record));
    }

    /// Candidates oldest first.
    fn finish(mut self) -> Vec<TransactionRecord> {
        self.found.sort_by_key(|(position, _)| *position);
        self.found.into_iter().map(|(_, record)| record).collect()
    }
}
