//! BIP-39 mnemonics and BIP-32 derivation on the Ethereum path.

use crate::error::CryptoError;
use crate::keccak256;
use bip39::{Language, Mnemonic};
use ember_types::address::ADDRESS_SIZE;
use k256::ecdsa::SigningKey;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use rand::RngCore;
use tiny_hderive::bip32::ExtendedPrivKey;
use zeroize::Zeroizing;

/// First account on coin type 60 (shared by every EVM network).
pub const DEFAULT_PATH: &str = "m/44'/60'/0'/0/0";

/// Entropy for a 12-word phrase.
const ENTROPY_BYTES: usize = 16;

/// Generate a fresh 12-word English phrase.
pub fn generate_phrase() -> Result<Zeroizing<String>, CryptoError> {
    let mut entropy = Zeroizing::new([0u8; ENTROPY_BYTES]);
    rand::thread_rng().fill_bytes(&mut entropy[..]);
    let mnemonic = Mnemonic::from_entropy_in(Language::English, &entropy[..])
        .map_err(|e| CryptoError::InvalidMnemonic(e.to_string()))?;
    Ok(Zeroizing::new(mnemonic.to_string()))
}

fn parse(phrase: &str) -> Result<Mnemonic, CryptoError> {
    Mnemonic::parse_in_normalized(Language::English, phrase)
        .map_err(|e| CryptoError::InvalidMnemonic(e.to_string()))
}

/// Check word list membership, word count, and checksum.
pub fn validate_phrase(phrase: &str) -> Result<(), CryptoError> {
    parse(phrase).map(|_| ())
}

/// Derive the secp256k1 secret key at `path`.
pub fn derive_secret(phrase: &str, path: &str) -> Result<Zeroizing<[u8; 32]>, CryptoError> {
    let mnemonic = parse(phrase)?;
    let seed = Zeroizing::new(mnemonic.to_seed_normalized(""));
    let ext = ExtendedPrivKey::derive(&seed[..], path)
        .map_err(|e| CryptoError::Derivation(format!("{:?}", e)))?;
    Ok(Zeroizing::new(ext.secret()))
}

/// Ethereum address of a secret key: last 20 bytes of keccak(pubkey).
pub fn secret_to_address(secret: &[u8; 32]) -> Result<[u8; ADDRESS_SIZE], CryptoError> {
    let key = SigningKey::from_slice(secret).map_err(|_| CryptoError::InvalidKey)?;
    let point = key.verifying_key().to_encoded_point(false);
    // Skip the 0x04 uncompressed tag.
    let hash = keccak256(&point.as_bytes()[1..]);
    let mut out = [0u8; ADDRESS_SIZE];
    out.copy_from_slice(&hash[12..]);
    Ok(out)
}

/// Address of the first account of a phrase.
pub fn phrase_to_address(phrase: &str) -> Result<[u8; ADDRESS_SIZE], CryptoError> {
    let secret = derive_secret(phrase, DEFAULT_PATH)?;
    secret_to_address(&secret)
}
