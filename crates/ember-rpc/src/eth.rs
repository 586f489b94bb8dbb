//! Ethereum node RPC.
//!
//! Typed async methods for the `eth_*` endpoints the wallet needs: balance
//! and nonce lookup, gas price, blocks, transactions, logs, and raw
//! transaction broadcast.

use crate::client::{RpcClient, RpcConfig};
use crate::error::RpcError;
use crate::quantity::{self, de_opt_u64, de_u128, de_u64};
use serde::Deserialize;
use serde_json::{json, Value};

/// `keccak256("Transfer(address,address,uint256)")`, topic0 of ERC-20 transfers.
pub const TRANSFER_TOPIC: &str =
    "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef";

// =============================================================================
// Response Types
// =============================================================================

/// Transaction object as returned by `eth_getTransactionByHash` and inside
/// full blocks.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainTransaction {
    pub hash: String,
    pub from: String,
    /// `None` for contract creation.
    #[serde(default)]
    pub to: Option<String>,
    #[serde(deserialize_with = "de_u128")]
    pub value: u128,
    #[serde(deserialize_with = "de_u64")]
    pub nonce: u64,
    /// `None` while pending.
    #[serde(default, deserialize_with = "de_opt_u64")]
    pub block_number: Option<u64>,
}

/// Block with full transaction objects.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    #[serde(deserialize_with = "de_u64")]
    pub number: u64,
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(deserialize_with = "de_u64")]
    pub timestamp: u64,
    #[serde(default)]
    pub transactions: Vec<ChainTransaction>,
}

/// Event log entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Log {
    /// Emitting contract.
    pub address: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub data: String,
    #[serde(default, deserialize_with = "de_opt_u64")]
    pub block_number: Option<u64>,
    #[serde(default)]
    pub transaction_hash: Option<String>,
    #[serde(default, deserialize_with = "de_opt_u64")]
    pub log_index: Option<u64>,
    #[serde(default)]
    pub removed: bool,
}

/// `eth_getLogs` filter over an inclusive block range.
///
/// Each topic position is either a wildcard (`None`) or an exact match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFilter {
    pub from_block: u64,
    pub to_block: u64,
    pub address: Option<String>,
    pub topics: Vec<Option<String>>,
}

impl LogFilter {
    pub fn new(from_block: u64, to_block: u64) -> Self {
        Self {
            from_block,
            to_block,
            address: None,
            topics: Vec::new(),
        }
    }

    pub fn topics(mut self, topics: Vec<Option<String>>) -> Self {
        self.topics = topics;
        self
    }

    pub fn to_params(&self) -> Value {
        let mut filter = json!({
            "fromBlock": quantity::encode(self.from_block as u128),
            "toBlock": quantity::encode(self.to_block as u128),
            "topics": self.topics,
        });
        if let Some(address) = &self.address {
            filter["address"] = json!(address);
        }
        json!([filter])
    }
}

// =============================================================================
// EthRpc
// =============================================================================

/// Async RPC client for an Ethereum-compatible node.
pub struct EthRpc {
    client: RpcClient,
}

impl EthRpc {
    /// Create a client connected to the given URL.
    pub fn new(url: &str) -> Result<Self, RpcError> {
        Ok(Self {
            client: RpcClient::new(url)?,
        })
    }

    /// Create with full configuration.
    pub fn with_config(config: RpcConfig) -> Result<Self, RpcError> {
        Ok(Self {
            client: RpcClient::with_config(config)?,
        })
    }

    /// Get the underlying RPC client for custom calls.
    pub fn client(&self) -> &RpcClient {
        &self.client
    }

    async fn quantity(&self, method: &str, params: Value) -> Result<u128, RpcError> {
        let val = self.client.call(method, params).await?;
        let s = val.as_str().ok_or(RpcError::NoResult {
            context: method.to_string(),
        })?;
        quantity::parse_u128(s)
    }

    // =========================================================================
    // Chain Information
    // =========================================================================

    /// Chain id reported by the node.
    pub async fn chain_id(&self) -> Result<u64, RpcError> {
        let id = self.quantity("eth_chainId", json!([])).await?;
        u64::try_from(id).map_err(|_| RpcError::InvalidQuantity(id.to_string()))
    }

    /// Number of the most recent block.
    pub async fn block_number(&self) -> Result<u64, RpcError> {
        let n = self.quantity("eth_blockNumber", json!([])).await?;
        u64::try_from(n).map_err(|_| RpcError::InvalidQuantity(n.to_string()))
    }

    /// Current gas price in wei.
    pub async fn gas_price(&self) -> Result<u128, RpcError> {
        self.quantity("eth_gasPrice", json!([])).await
    }

    // =========================================================================
    // Account State
    // =========================================================================

    /// Native balance in wei at the latest block.
    pub async fn get_balance(&self, address: &str) -> Result<u128, RpcError> {
        self.quantity("eth_getBalance", json!([address, "latest"])).await
    }

    /// Next nonce, counting pending transactions.
    pub async fn get_transaction_count(&self, address: &str) -> Result<u64, RpcError> {
        let n = self
            .quantity("eth_getTransactionCount", json!([address, "pending"]))
            .await?;
        u64::try_from(n).map_err(|_| RpcError::InvalidQuantity(n.to_string()))
    }

    // =========================================================================
    // Blocks, Transactions, Logs
    // =========================================================================

    /// Block with full transaction objects, `None` past the tip.
    pub async fn get_block_by_number(&self, number: u64) -> Result<Option<Block>, RpcError> {
        let val = self
            .client
            .call(
                "eth_getBlockByNumber",
                json!([quantity::encode(number as u128), true]),
            )
            .await?;
        if val.is_null() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(val)?))
    }

    /// Transaction by hash, `None` if the node does not know it.
    pub async fn get_transaction_by_hash(
        &self,
        hash: &str,
    ) -> Result<Option<ChainTransaction>, RpcError> {
        let val = self
            .client
            .call("eth_getTransactionByHash", json!([hash]))
            .await?;
        if val.is_null() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(val)?))
    }

    /// Logs matching a filter.
    pub async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<Log>, RpcError> {
        let val = self.client.call("eth_getLogs", filter.to_params()).await?;
        if val.is_null() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_value(val)?)
    }

    /// Broadcast a signed transaction; returns its hash.
    ///
    /// Sent exactly once: a timed-out broadcast may still have reached the
    /// mempool, so repeating it is the caller's explicit decision.
    pub async fn send_raw_transaction(&self, raw_tx_hex: &str) -> Result<String, RpcError> {
        let val = self
            .client
            .call_once("eth_sendRawTransaction", json!([raw_tx_hex]))
            .await?;
        val.as_str()
            .map(|s| s.to_string())
            .ok_or(RpcError::NoResult {
                context: "eth_sendRawTransaction".into(),
            })
    }
}
