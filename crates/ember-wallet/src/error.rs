//! Wallet error types.

use ember_crypto::CryptoError;
use ember_rpc::RpcError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalletError {
    /// Wrong PIN on unlock, or a PIN that is not exactly 4 digits on create.
    #[error("invalid PIN")]
    InvalidPin,

    #[error("invalid seed phrase: {0}")]
    InvalidMnemonic(String),

    #[error("unknown network: {0}")]
    UnknownNetwork(String),

    #[error("wallet not unlocked")]
    NotUnlocked,

    #[error("no wallet found")]
    NoAccount,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Node or transport failure; the message is the node's, unaltered.
    #[error("{0}")]
    Chain(String),

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("corrupt wallet record: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<RpcError> for WalletError {
    fn from(e: RpcError) -> Self {
        Self::Chain(e.to_string())
    }
}

impl From<CryptoError> for WalletError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::InvalidMnemonic(msg) => Self::InvalidMnemonic(msg),
            other => Self::KeyDerivation(other.to_string()),
        }
    }
}

impl From<std::io::Error> for WalletError {
    fn from(e: std::io::Error) -> Self {
        Self::Persistence(e.to_string())
    }
}
