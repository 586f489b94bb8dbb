//! Key management.
//!
//! [`KeyProvider`] is the seam between the session and mnemonic/signing
//! cryptography. [`MnemonicKeyProvider`] is the BIP-39/BIP-32 implementation
//! backed by `ember-crypto`.

use crate::error::WalletError;
use crate::secret::SecretPhrase;
use ember_crypto::hd;
use ember_crypto::{SignedTx, TxIntent};
use ember_types::address::to_checksum_address;

pub trait KeyProvider: Send + Sync {
    /// Fresh phrase together with its checksummed address.
    fn generate(&self) -> Result<(SecretPhrase, String), WalletError>;

    /// Fails with [`WalletError::InvalidMnemonic`] carrying the parser's message.
    fn validate(&self, phrase: &SecretPhrase) -> Result<(), WalletError>;

    fn derive_address(&self, phrase: &SecretPhrase) -> Result<String, WalletError>;

    fn sign(
        &self,
        phrase: &SecretPhrase,
        chain_id: u64,
        intent: &TxIntent,
    ) -> Result<SignedTx, WalletError>;
}

/// BIP-39 English phrases derived on a fixed BIP-44 path.
#[derive(Debug, Clone)]
pub struct MnemonicKeyProvider {
    path: String,
}

impl MnemonicKeyProvider {
    pub fn new() -> Self {
        Self::with_path(hd::DEFAULT_PATH)
    }

    pub fn with_path(path: &str) -> Self {
        Self { path: path.to_string() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl Default for MnemonicKeyProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyProvider for MnemonicKeyProvider {
    fn generate(&self) -> Result<(SecretPhrase, String), WalletError> {
        let phrase = SecretPhrase::from(hd::generate_phrase()?);
        let address = self.derive_address(&phrase)?;
        Ok((phrase, address))
    }

    fn validate(&self, phrase: &SecretPhrase) -> Result<(), WalletError> {
        hd::validate_phrase(phrase.expose())?;
        Ok(())
    }

    fn derive_address(&self, phrase: &SecretPhrase) -> Result<String, WalletError> {
        let secret = hd::derive_secret(phrase.expose(), &self.path)?;
        let address = hd::secret_to_address(&secret)?;
        Ok(to_checksum_address(&address))
    }

    fn sign(
        &self,
        phrase: &SecretPhrase,
        chain_id: u64,
        intent: &TxIntent,
    ) -> Result<SignedTx, WalletError> {
        let secret = hd::derive_secret(phrase.expose(), &self.path)?;
        Ok(ember_crypto::tx::sign_transaction(&secret, chain_id, intent)?)
    }
}

/// Trim, lowercase, and collapse internal whitespace to single spaces.
pub fn normalize_phrase(input: &str) -> SecretPhrase {
    let mut out = String::with_capacity(input.len());
    for word in input.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        for c in word.chars() {
            out.extend(c.to_lowercase());
        }
    }
    SecretPhrase::new(out)
}

/// Live signing capability: a phrase bound to one chain id.
pub(crate) struct Signer {
    phrase: SecretPhrase,
    chain_id: u64,
}

impl Signer {
    pub(crate) fn new(phrase: SecretPhrase, chain_id: u64) -> Self {
        Self { phrase, chain_id }
    }

    pub(crate) fn phrase(&self) -> &SecretPhrase {
        &self.phrase
    }

    pub(crate) fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub(crate) fn rebind(&mut self, chain_id: u64) {
        self.chain_id = chain_id;
    }

    pub(crate) fn sign(
        &self,
        keys: &dyn KeyProvider,
        intent: &TxIntent,
    ) -> Result<SignedTx, WalletError> {
        keys.sign(&self.phrase, self.chain_id, intent)
    }

    pub(crate) fn wipe(&mut self) {
        self.phrase.wipe();
    }
}
