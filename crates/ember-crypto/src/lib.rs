//! Crypto primitives for Ember.
//!
//! Keccak-256, RLP encoding, BIP-39 mnemonic handling with BIP-32 derivation
//! on the Ethereum path, and EIP-155 signing of legacy transfers.

pub mod error;
pub mod hd;
pub mod rlp;
pub mod tx;

pub use error::CryptoError;
pub use tx::{SignedTx, TxIntent};

use tiny_keccak::{Hasher, Keccak};

/// Keccak-256 (the pre-standard SHA-3 variant Ethereum uses).
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut keccak = Keccak::v256();
    let mut output = [0u8; 32];
    keccak.update(data);
    keccak.finalize(&mut output);
    output
}
