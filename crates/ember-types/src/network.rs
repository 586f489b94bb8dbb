//! Network catalog.
//!
//! The registry is immutable data: which network is *active* is session
//! state and lives in the wallet crate.

use thiserror::Error;

/// Key of the network selected when nothing has been persisted yet.
pub const DEFAULT_NETWORK: &str = "sepolia";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("unknown network: {0}")]
    Unknown(String),
}

/// A catalog entry describing one EVM network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkDescriptor {
    /// Stable lookup key (e.g. `sepolia`).
    pub key: String,
    pub display_name: String,
    /// Default JSON-RPC endpoint.
    pub rpc_endpoint: String,
    /// EIP-155 chain id.
    pub chain_id: u64,
    /// Symbol of the native currency (ETH, POL, ...).
    pub native_symbol: String,
    /// Balance a freshly created wallet starts with, in wei.
    ///
    /// Zero for every real chain; only simulation networks seed a value.
    pub starting_balance_wei: u128,
}

impl NetworkDescriptor {
    pub fn new(
        key: &str,
        display_name: &str,
        rpc_endpoint: &str,
        chain_id: u64,
        native_symbol: &str,
    ) -> Self {
        Self {
            key: key.to_string(),
            display_name: display_name.to_string(),
            rpc_endpoint: rpc_endpoint.to_string(),
            chain_id,
            native_symbol: native_symbol.to_string(),
            starting_balance_wei: 0,
        }
    }

    /// Mark this network as simulated, seeding new wallets with `wei`.
    pub fn simulated(mut self, wei: u128) -> Self {
        self.starting_balance_wei = wei;
        self
    }

    pub fn is_simulated(&self) -> bool {
        self.starting_balance_wei > 0
    }
}

/// Built-in networks: (key, display name, endpoint, chain id, symbol).
const BUILTIN: [(&str, &str, &str, u64, &str); 5] = [
    ("mainnet", "Ethereum Mainnet", "https://ethereum-rpc.publicnode.com", 1, "ETH"),
    ("sepolia", "Sepolia Testnet", "https://sepolia.drpc.org", 11_155_111, "ETH"),
    ("holesky", "Holesky Testnet", "https://ethereum-holesky-rpc.publicnode.com", 17_000, "ETH"),
    ("polygon", "Polygon PoS", "https://polygon-rpc.com", 137, "POL"),
    ("amoy", "Polygon Amoy Testnet", "https://rpc-amoy.polygon.technology", 80_002, "POL"),
];

/// Immutable lookup table of known networks.
#[derive(Debug, Clone)]
pub struct NetworkRegistry {
    networks: Vec<NetworkDescriptor>,
}

impl Default for NetworkRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl NetworkRegistry {
    /// The built-in catalog.
    pub fn builtin() -> Self {
        let networks = BUILTIN
            .iter()
            .map(|(key, name, url, chain_id, symbol)| {
                NetworkDescriptor::new(key, name, url, *chain_id, symbol)
            })
            .collect();
        Self { networks }
    }

    /// A registry with no entries, for hosts that bring their own catalog.
    pub fn empty() -> Self {
        Self { networks: Vec::new() }
    }

    /// Add (or replace, by key) a network.
    pub fn with_network(mut self, network: NetworkDescriptor) -> Self {
        match self.networks.iter_mut().find(|n| n.key == network.key) {
            Some(existing) => *existing = network,
            None => self.networks.push(network),
        }
        self
    }

    /// Override the RPC endpoint of a known network.
    pub fn with_endpoint(mut self, key: &str, url: &str) -> Result<Self, NetworkError> {
        let entry = self
            .networks
            .iter_mut()
            .find(|n| n.key == key)
            .ok_or_else(|| NetworkError::Unknown(key.to_string()))?;
        entry.rpc_endpoint = url.to_string();
        Ok(self)
    }

    pub fn get(&self, key: &str) -> Result<&NetworkDescriptor, NetworkError> {
        self.networks
            .iter()
            .find(|n| n.key == key)
            .ok_or_else(|| NetworkError::Unknown(key.to_string()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.networks.iter().any(|n| n.key == key)
    }

    pub fn list(&self) -> &[NetworkDescriptor] {
        &self.networks
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.networks.iter().map(|n| n.key.as_str())
    }
}
