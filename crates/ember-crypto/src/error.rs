//! Crypto error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    #[error("key derivation failed: {0}")]
    Derivation(String),

    #[error("invalid secret key")]
    InvalidKey,

    #[error("signing failed: {0}")]
    Signing(String),
}
