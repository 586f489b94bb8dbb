//! Ember chain access.
//!
//! Provides an async JSON-RPC 2.0 HTTP client for Ethereum-compatible
//! nodes, the typed [`EthRpc`] wrapper, and the [`ChainClient`] /
//! [`ChainConnector`] traits the wallet consumes.
//!
//! # Example
//!
//! ```ignore
//! use ember_rpc::EthRpc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let node = EthRpc::new("https://sepolia.drpc.org").unwrap();
//!     let tip = node.block_number().await.unwrap();
//!     println!("Height: {}", tip);
//! }
//! ```

pub mod chain;
pub mod client;
pub mod error;
pub mod eth;
pub mod quantity;

pub use chain::{ChainClient, ChainConnector, RpcConnector};
pub use client::{RpcClient, RpcConfig};
pub use error::RpcError;
pub use eth::{Block, ChainTransaction, EthRpc, Log, LogFilter, TRANSFER_TOPIC};
