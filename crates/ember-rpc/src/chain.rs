//! Chain-access seams consumed by the wallet.
//!
//! A [`ChainClient`] is bound to exactly one network; a [`ChainConnector`]
//! hands out a client for whichever network the session activates.

use crate::client::RpcConfig;
use crate::error::RpcError;
use crate::eth::{Block, ChainTransaction, EthRpc, Log, LogFilter};
use async_trait::async_trait;
use ember_types::NetworkDescriptor;
use std::sync::Arc;

/// Query and broadcast surface of one network's node.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Native balance in wei.
    async fn get_balance(&self, address: &str) -> Result<u128, RpcError>;

    /// Next usable nonce (pending included).
    async fn get_transaction_count(&self, address: &str) -> Result<u64, RpcError>;

    /// Node-suggested gas price in wei.
    async fn gas_price(&self) -> Result<u128, RpcError>;

    /// Broadcast a signed raw transaction exactly once; returns its hash.
    async fn broadcast(&self, raw_tx: &[u8]) -> Result<String, RpcError>;

    async fn get_block_number(&self) -> Result<u64, RpcError>;

    /// Block with full transactions; `None` if it does not exist yet.
    async fn get_block(&self, number: u64) -> Result<Option<Block>, RpcError>;

    async fn get_transaction(&self, hash: &str) -> Result<Option<ChainTransaction>, RpcError>;

    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<Log>, RpcError>;
}

/// Produces a [`ChainClient`] for a network.
pub trait ChainConnector: Send + Sync {
    fn connect(&self, network: &NetworkDescriptor) -> Result<Arc<dyn ChainClient>, RpcError>;
}

#[async_trait]
impl ChainClient for EthRpc {
    async fn get_balance(&self, address: &str) -> Result<u128, RpcError> {
        EthRpc::get_balance(self, address).await
    }

    async fn get_transaction_count(&self, address: &str) -> Result<u64, RpcError> {
        EthRpc::get_transaction_count(self, address).await
    }

    async fn gas_price(&self) -> Result<u128, RpcError> {
        EthRpc::gas_price(self).await
    }

    async fn broadcast(&self, raw_tx: &[u8]) -> Result<String, RpcError> {
        let raw_hex = format!("0x{}", hex::encode(raw_tx));
        self.send_raw_transaction(&raw_hex).await
    }

    async fn get_block_number(&self) -> Result<u64, RpcError> {
        self.block_number().await
    }

    async fn get_block(&self, number: u64) -> Result<Option<Block>, RpcError> {
        self.get_block_by_number(number).await
    }

    async fn get_transaction(&self, hash: &str) -> Result<Option<ChainTransaction>, RpcError> {
        self.get_transaction_by_hash(hash).await
    }

    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<Log>, RpcError> {
        EthRpc::get_logs(self, filter).await
    }
}

/// Connects to each network's `rpc_endpoint` over HTTP JSON-RPC.
///
/// Timeout, retry, and auth settings come from the template config; its
/// `url` is replaced per network.
#[derive(Debug, Clone, Default)]
pub struct RpcConnector {
    template: RpcConfig,
}

impl RpcConnector {
    pub fn new(template: RpcConfig) -> Self {
        Self { template }
    }
}

impl ChainConnector for RpcConnector {
    fn connect(&self, network: &NetworkDescriptor) -> Result<Arc<dyn ChainClient>, RpcError> {
        log::debug!("connecting to {} at {}", network.key, network.rpc_endpoint);
        let config = RpcConfig {
            url: network.rpc_endpoint.clone(),
            ..self.template.clone()
        };
        Ok(Arc::new(EthRpc::with_config(config)?))
    }
}
