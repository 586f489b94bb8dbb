//! Shared fixtures: a scripted in-memory chain and session builders.

#![allow(dead_code)]

use async_trait::async_trait;
use ember_rpc::{Block, ChainClient, ChainConnector, ChainTransaction, Log, LogFilter, RpcError};
use ember_types::{NetworkDescriptor, NetworkRegistry};
use ember_wallet::{MemoryStore, MnemonicKeyProvider, Session, SessionConfig, Store};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub const DEV_PHRASE: &str = "test test test test test test test test test test test junk";
pub const DEV_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
pub const OTHER: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";
pub const PIN: &str = "4821";

pub const ONE_ETH: u128 = 1_000_000_000_000_000_000;

#[derive(Default)]
pub struct ChainState {
    pub balances: HashMap<String, u128>,
    pub tip: u64,
    pub blocks: HashMap<u64, Block>,
    pub logs: Vec<Log>,
    pub nonce: u64,
    pub gas_price: u128,
    pub broadcasts: Vec<Vec<u8>>,
    pub broadcast_error: Option<String>,
    pub fail_balance: bool,
    /// `get_block` fails for this block number.
    pub fail_block: Option<u64>,
    pub fail_logs: bool,
}

/// Parks one call until the test releases it.
#[derive(Default)]
pub struct Gate {
    pub reached: Notify,
    pub release: Notify,
}

/// Scripted node for one network. Every trait call bumps `calls`.
#[derive(Default)]
pub struct MockChain {
    pub state: Mutex<ChainState>,
    pub calls: AtomicUsize,
    gate: Mutex<Option<(&'static str, Arc<Gate>)>>,
}

impl MockChain {
    pub fn new() -> Arc<Self> {
        let chain = Self::default();
        chain.state.lock().unwrap().gas_price = 1_000_000_000;
        Arc::new(chain)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_balance(&self, address: &str, wei: u128) {
        self.state.lock().unwrap().balances.insert(address.to_lowercase(), wei);
    }

    pub fn add_block(&self, number: u64, timestamp: u64, transactions: Vec<ChainTransaction>) {
        let mut state = self.state.lock().unwrap();
        state.blocks.insert(
            number,
            Block {
                number,
                hash: Some(format!("0x{:064x}", number)),
                timestamp,
                transactions,
            },
        );
        state.tip = state.tip.max(number);
    }

    pub fn add_log(&self, log: Log) {
        self.state.lock().unwrap().logs.push(log);
    }

    /// Hold the next call to `method` until `release` is notified.
    pub fn hold(&self, method: &'static str) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        *self.gate.lock().unwrap() = Some((method, gate.clone()));
        gate
    }

    async fn pause(&self, method: &str) {
        let gate = {
            let mut slot = self.gate.lock().unwrap();
            match slot.as_ref() {
                Some((held, _)) if *held == method => slot.take().map(|(_, gate)| gate),
                _ => None,
            }
        };
        if let Some(gate) = gate {
            gate.reached.notify_one();
            gate.release.notified().await;
        }
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

fn node_error(message: &str) -> RpcError {
    RpcError::Rpc {
        code: -32000,
        message: message.to_string(),
        method: "mock".to_string(),
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn get_balance(&self, address: &str) -> Result<u128, RpcError> {
        self.hit();
        let state = self.state.lock().unwrap();
        if state.fail_balance {
            return Err(node_error("balance unavailable"));
        }
        Ok(state.balances.get(&address.to_lowercase()).copied().unwrap_or(0))
    }

    async fn get_transaction_count(&self, _address: &str) -> Result<u64, RpcError> {
        self.hit();
        Ok(self.state.lock().unwrap().nonce)
    }

    async fn gas_price(&self) -> Result<u128, RpcError> {
        self.hit();
        self.pause("gas_price").await;
        Ok(self.state.lock().unwrap().gas_price)
    }

    async fn broadcast(&self, raw_tx: &[u8]) -> Result<String, RpcError> {
        self.hit();
        let mut state = self.state.lock().unwrap();
        if let Some(message) = state.broadcast_error.clone() {
            return Err(node_error(&message));
        }
        state.broadcasts.push(raw_tx.to_vec());
        state.nonce += 1;
        Ok(format!("0x{}", hex_of(&ember_crypto::keccak256(raw_tx))))
    }

    async fn get_block_number(&self) -> Result<u64, RpcError> {
        self.hit();
        self.pause("get_block_number").await;
        Ok(self.state.lock().unwrap().tip)
    }

    async fn get_block(&self, number: u64) -> Result<Option<Block>, RpcError> {
        self.hit();
        let state = self.state.lock().unwrap();
        if state.fail_block == Some(number) {
            return Err(node_error("header not found"));
        }
        Ok(state.blocks.get(&number).cloned())
    }

    async fn get_transaction(&self, hash: &str) -> Result<Option<ChainTransaction>, RpcError> {
        self.hit();
        let state = self.state.lock().unwrap();
        Ok(state
            .blocks
            .values()
            .flat_map(|b| b.transactions.iter())
            .find(|tx| tx.hash.eq_ignore_ascii_case(hash))
            .cloned())
    }

    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<Log>, RpcError> {
        self.hit();
        let state = self.state.lock().unwrap();
        if state.fail_logs {
            return Err(node_error("query returned more than 10000 results"));
        }
        Ok(state
            .logs
            .iter()
            .filter(|log| {
                let block = log.block_number.unwrap_or(0);
                block >= filter.from_block && block <= filter.to_block
            })
            .filter(|log| {
                filter.topics.iter().enumerate().all(|(i, want)| match want {
                    Some(t) => log.topics.get(i).map_or(false, |have| have.eq_ignore_ascii_case(t)),
                    None => true,
                })
            })
            .cloned()
            .collect())
    }
}

fn hex_of(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Hands out one [`MockChain`] per network key.
#[derive(Default)]
pub struct MockConnector {
    pub chains: Mutex<HashMap<String, Arc<MockChain>>>,
}

impl MockConnector {
    pub fn chain(&self, key: &str) -> Arc<MockChain> {
        self.chains
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_insert_with(MockChain::new)
            .clone()
    }

    pub fn total_calls(&self) -> usize {
        self.chains.lock().unwrap().values().map(|c| c.calls()).sum()
    }
}

impl ChainConnector for MockConnector {
    fn connect(&self, network: &NetworkDescriptor) -> Result<Arc<dyn ChainClient>, RpcError> {
        Ok(self.chain(&network.key))
    }
}

/// Built-in networks plus a simulated one that seeds 10 units.
pub fn registry() -> NetworkRegistry {
    NetworkRegistry::builtin().with_network(
        NetworkDescriptor::new("devnet", "Local devnet", "http://localhost:8545", 31337, "ETH")
            .simulated(10 * ONE_ETH),
    )
}

pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub connector: Arc<MockConnector>,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            connector: Arc::new(MockConnector::default()),
        }
    }

    /// A fresh session over this fixture's store and chains.
    pub fn session(&self) -> Session {
        self.session_with(SessionConfig::default())
    }

    pub fn session_with(&self, config: SessionConfig) -> Session {
        Session::new(
            self.store.clone(),
            Arc::new(MnemonicKeyProvider::new()),
            self.connector.clone(),
            registry(),
            config,
        )
        .unwrap()
    }

    pub fn chain(&self, key: &str) -> Arc<MockChain> {
        self.connector.chain(key)
    }

    pub fn stored(&self, key: &str) -> Option<Vec<u8>> {
        self.store.get(key).unwrap()
    }

    pub fn stored_json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.stored(ember_wallet::WALLET_DATA_KEY).unwrap()).unwrap()
    }
}

pub fn native_tx(hash: &str, from: &str, to: &str, value: u128) -> ChainTransaction {
    ChainTransaction {
        hash: hash.to_string(),
        from: from.to_string(),
        to: Some(to.to_string()),
        value,
        nonce: 0,
        block_number: None,
    }
}

pub fn token_log(token: &str, from: &str, to: &str, value: u128, block: u64, index: u64) -> Log {
    let topic = |a: &str| {
        ember_types::address::address_to_topic(&ember_types::address::parse_address(a).unwrap())
    };
    Log {
        address: token.to_string(),
        topics: vec![ember_rpc::TRANSFER_TOPIC.to_string(), topic(from), topic(to)],
        data: format!("0x{:064x}", value),
        block_number: Some(block),
        transaction_hash: Some(format!("0x{:064x}", block * 1000 + index)),
        log_index: Some(index),
        removed: false,
    }
}
