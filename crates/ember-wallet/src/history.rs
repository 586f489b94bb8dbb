//! Ordered transaction history with a hash index for O(1) dedup.
//!
//! Newest records sit at the front. A record is a duplicate if its hash is
//! already present on the same network, or untagged (legacy records predate
//! network tagging and are assumed to belong to every network).

use crate::record::TransactionRecord;
use std::collections::{HashSet, VecDeque};

type Key = (Option<String>, String);

fn key_of(network: Option<&str>, hash: &str) -> Key {
    (network.map(str::to_string), hash.to_ascii_lowercase())
}

#[derive(Debug, Default, Clone)]
pub struct History {
    records: VecDeque<TransactionRecord>,
    index: HashSet<Key>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from persisted order (newest first). Later duplicates are dropped.
    pub fn from_records(records: Vec<TransactionRecord>) -> Self {
        let mut history = Self::new();
        for record in records {
            let network = record.network.clone();
            if history.contains(network.as_deref(), &record.hash) {
                continue;
            }
            history.index.insert(key_of(network.as_deref(), &record.hash));
            history.records.push_back(record);
        }
        history
    }

    /// Known on `network` (or untagged). `None` checks untagged entries only.
    pub fn contains(&self, network: Option<&str>, hash: &str) -> bool {
        let hash = hash.to_ascii_lowercase();
        if self.index.contains(&(None, hash.clone())) {
            return true;
        }
        match network {
            Some(n) => self.index.contains(&(Some(n.to_string()), hash)),
            None => false,
        }
    }

    /// Insert at the head. Returns `false` (and does nothing) for a duplicate.
    pub fn insert_front(&mut self, record: TransactionRecord) -> bool {
        if self.contains(record.network.as_deref(), &record.hash) {
            return false;
        }
        self.index.insert(key_of(record.network.as_deref(), &record.hash));
        self.records.push_front(record);
        true
    }

    /// Insert each record at the head in iteration order; returns how many were new.
    pub fn merge(&mut self, records: impl IntoIterator<Item = TransactionRecord>) -> usize {
        let mut added = 0;
        for record in records {
            if self.insert_front(record) {
                added += 1;
            }
        }
        added
    }

    pub fn records(&self) -> &VecDeque<TransactionRecord> {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &TransactionRecord> {
        self.records.iter()
    }

    /// Records tagged with `network` plus untagged ones, newest first.
    pub fn visible_on<'a>(&'a self, network: &'a str) -> impl Iterator<Item = &'a TransactionRecord> {
        self.records.iter().filter(move |r| r.visible_on(network))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.index.clear();
    }
}
