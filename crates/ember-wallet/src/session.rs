//! The wallet session.
//!
//! A [`Session`] owns the active network, a chain client bound to it, and,
//! while unlocked, the account's secrets, balance, and history. All methods
//! take `&self`: state sits behind a `std::sync::Mutex` that is never held
//! across an `.await`, and network-bound async operations are serialized by
//! an async operation lock so a network switch cannot interleave a signing
//! or scanning pass.

use crate::config::SessionConfig;
use crate::error::WalletError;
use crate::history::History;
use crate::keys::{normalize_phrase, KeyProvider, MnemonicKeyProvider, Signer};
use crate::record::{AccountRecord, AccountRecordRef, TransactionRecord};
use crate::secret::{Pin, SecretPhrase};
use crate::store::{Store, CURRENT_NETWORK_KEY, WALLET_DATA_KEY};
use ember_crypto::{SignedTx, TxIntent};
use ember_rpc::{ChainClient, ChainConnector, ChainTransaction, RpcConnector};
use ember_types::address::same_address;
use ember_types::units::wei_to_decimal;
use ember_types::{NetworkDescriptor, NetworkRegistry, DEFAULT_NETWORK};
use rust_decimal::Decimal;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use zeroize::Zeroizing;

/// Summary returned by the unlock/create/recover flows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unlocked {
    pub address: String,
    pub balance: Decimal,
    pub network: String,
    /// `false` for watch-only records without a phrase.
    pub can_sign: bool,
}

/// Secrets and account data present only while unlocked.
struct Live {
    signer: Option<Signer>,
    pin: Pin,
    balance: Decimal,
    history: History,
}

impl Live {
    fn wipe(&mut self) {
        if let Some(signer) = self.signer.as_mut() {
            signer.wipe();
        }
        self.signer = None;
        self.pin.wipe();
        self.balance = Decimal::ZERO;
        self.history.clear();
    }
}

pub(crate) struct SessionState {
    network: NetworkDescriptor,
    client: Arc<dyn ChainClient>,
    /// Survives `lock()` for display.
    address: Option<String>,
    live: Option<Live>,
}

/// What an async operation needs after the state lock is released.
pub(crate) struct Snapshot {
    pub client: Arc<dyn ChainClient>,
    pub network: NetworkDescriptor,
    pub address: String,
}

pub struct Session {
    store: Arc<dyn Store>,
    keys: Arc<dyn KeyProvider>,
    connector: Arc<dyn ChainConnector>,
    registry: NetworkRegistry,
    config: SessionConfig,
    state: Mutex<SessionState>,
    op_lock: tokio::sync::Mutex<()>,
}

impl Session {
    /// Build a session over explicit collaborators.
    ///
    /// The active network is read from the store's `current_network` key,
    /// falling back to the default network when absent or unknown.
    pub fn new(
        store: Arc<dyn Store>,
        keys: Arc<dyn KeyProvider>,
        connector: Arc<dyn ChainConnector>,
        registry: NetworkRegistry,
        config: SessionConfig,
    ) -> Result<Self, WalletError> {
        let saved = store
            .get(CURRENT_NETWORK_KEY)?
            .and_then(|bytes| String::from_utf8(bytes).ok());
        let network = match saved.as_deref() {
            Some(key) => match registry.get(key) {
                Ok(network) => network.clone(),
                Err(_) => {
                    log::warn!("saved network {} is not in the registry, using default", key);
                    default_network(&registry)?.clone()
                }
            },
            None => default_network(&registry)?.clone(),
        };
        let client = connector.connect(&network)?;
        log::debug!("session opened on {} (chain {})", network.key, network.chain_id);

        Ok(Self {
            store,
            keys,
            connector,
            registry,
            config,
            state: Mutex::new(SessionState {
                network,
                client,
                address: None,
                live: None,
            }),
            op_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// Session over the built-in networks, BIP-39 keys, and HTTP JSON-RPC.
    pub fn open(
        store: Arc<dyn Store>,
        registry: NetworkRegistry,
        config: SessionConfig,
    ) -> Result<Self, WalletError> {
        let connector = Arc::new(RpcConnector::new(config.rpc.clone()));
        Self::new(store, Arc::new(MnemonicKeyProvider::new()), connector, registry, config)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    // ── Account lifecycle ──

    pub fn has_account(&self) -> Result<bool, WalletError> {
        self.store.has(WALLET_DATA_KEY)
    }

    /// Unlock the persisted account with `pin`.
    ///
    /// A wrong PIN leaves both the session and the store untouched.
    pub async fn unlock(&self, pin: &str) -> Result<Unlocked, WalletError> {
        let _op = self.op_lock.lock().await;
        let record = self.load_record()?;
        if !record.pin.matches(pin) {
            log::warn!("unlock rejected: wrong PIN");
            return Err(WalletError::InvalidPin);
        }

        // Older stores carry the active network only inside the record.
        if !self.store.has(CURRENT_NETWORK_KEY)? {
            if let Some(key) = record.active_network.as_deref() {
                self.adopt_record_network(key)?;
            }
        }

        let AccountRecord {
            address: stored_address,
            mnemonic,
            pin,
            balance,
            history,
            ..
        } = record;

        let (address, corrected) = match &mnemonic {
            Some(phrase) => {
                let derived = self.keys.derive_address(phrase)?;
                let corrected = !same_address(&derived, &stored_address);
                if corrected {
                    log::warn!(
                        "stored address {} does not match its phrase, using {}",
                        stored_address,
                        derived
                    );
                }
                (derived, corrected)
            }
            None => (stored_address, false),
        };

        let can_sign = {
            let mut state = self.state();
            let chain_id = state.network.chain_id;
            let live = Live {
                signer: mnemonic.map(|phrase| Signer::new(phrase, chain_id)),
                pin,
                balance,
                history: History::from_records(history),
            };
            let can_sign = live.signer.is_some();
            log::info!(
                "unlocked {} on {}{}",
                address,
                state.network.key,
                if can_sign { "" } else { " (watch-only)" }
            );
            state.address = Some(address);
            state.live = Some(live);
            if corrected {
                if let Err(e) = self.write_record(&state) {
                    log::warn!("failed to save corrected address: {}", e);
                }
            }
            can_sign
        };

        if can_sign {
            self.refresh_balance().await;
        }
        self.unlocked_summary().ok_or(WalletError::NotUnlocked)
    }

    /// First step of the create flow: a fresh phrase and its address.
    /// Nothing is persisted.
    pub fn generate_mnemonic(&self) -> Result<(SecretPhrase, String), WalletError> {
        self.keys.generate()
    }

    /// Create (or overwrite) the account and leave the session unlocked.
    ///
    /// `None` generates a new phrase. The PIN must be exactly four digits.
    /// Waits for any in-flight submit or reconcile to finish first.
    pub async fn create_wallet(
        &self,
        mnemonic: Option<SecretPhrase>,
        pin: &str,
    ) -> Result<Unlocked, WalletError> {
        let pin = Pin::parse(pin).ok_or(WalletError::InvalidPin)?;
        let phrase = match mnemonic {
            Some(phrase) => {
                self.keys.validate(&phrase)?;
                phrase
            }
            None => self.keys.generate()?.0,
        };
        let address = self.keys.derive_address(&phrase)?;

        let _op = self.op_lock.lock().await;
        let mut state = self.state();
        let live = Live {
            signer: Some(Signer::new(phrase, state.network.chain_id)),
            pin,
            balance: starting_balance(&state.network),
            history: History::new(),
        };
        let previous_address = state.address.replace(address.clone());
        let previous_live = state.live.replace(live);
        if let Err(e) = self.write_record(&state) {
            state.address = previous_address;
            state.live = previous_live;
            return Err(e);
        }
        log::info!("created wallet {} on {}", address, state.network.key);
        summary_of(&state).ok_or(WalletError::NotUnlocked)
    }

    /// Restore from a phrase typed by the user.
    ///
    /// The phrase is normalized before validation; an invalid phrase leaves
    /// any existing account untouched.
    pub async fn recover_wallet(&self, phrase: &str, pin: &str) -> Result<Unlocked, WalletError> {
        let phrase = normalize_phrase(phrase);
        self.keys.validate(&phrase)?;
        self.create_wallet(Some(phrase), pin).await?;
        self.unlock(pin).await
    }

    /// Zero the secrets and forget balance and history. The address stays
    /// visible. Idempotent.
    pub fn lock(&self) {
        let mut state = self.state();
        if let Some(mut live) = state.live.take() {
            live.wipe();
            log::info!("session locked");
        }
    }

    // ── Network ──

    /// Make `key` the active network.
    ///
    /// The choice is persisted whether or not the session is unlocked. When
    /// unlocked the signer is rebound to the new chain id and the balance is
    /// reset to the network's starting value, then refreshed.
    pub async fn switch_network(&self, key: &str) -> Result<(), WalletError> {
        let network = self
            .registry
            .get(key)
            .map_err(|_| WalletError::UnknownNetwork(key.to_string()))?
            .clone();
        let _op = self.op_lock.lock().await;
        let client = self.connector.connect(&network)?;
        self.store.set(CURRENT_NETWORK_KEY, network.key.as_bytes())?;

        let unlocked = {
            let mut state = self.state();
            let from = std::mem::replace(&mut state.network, network);
            state.client = client;
            let chain_id = state.network.chain_id;
            let balance = starting_balance(&state.network);
            let unlocked = match state.live.as_mut() {
                Some(live) => {
                    if let Some(signer) = live.signer.as_mut() {
                        signer.rebind(chain_id);
                    }
                    live.balance = balance;
                    true
                }
                None => false,
            };
            if unlocked {
                if let Err(e) = self.write_record(&state) {
                    log::warn!("failed to save active network: {}", e);
                }
            }
            log::info!("switched network {} -> {}", from.key, state.network.key);
            unlocked
        };

        if unlocked {
            self.refresh_balance().await;
        }
        Ok(())
    }

    pub fn active_network(&self) -> NetworkDescriptor {
        self.state().network.clone()
    }

    pub fn networks(&self) -> &[NetworkDescriptor] {
        self.registry.list()
    }

    pub fn registry(&self) -> &NetworkRegistry {
        &self.registry
    }

    // ── Balance ──

    /// Fetch the native balance from the active network and persist it.
    ///
    /// Failures are logged and swallowed; the previous balance stays. Returns
    /// the new balance when one was stored.
    pub async fn refresh_balance(&self) -> Option<Decimal> {
        let snapshot = match self.snapshot(true) {
            Ok(s) => s,
            Err(_) => return None,
        };
        let wei = match snapshot.client.get_balance(&snapshot.address).await {
            Ok(wei) => wei,
            Err(e) => {
                log::warn!("balance refresh on {} failed: {}", snapshot.network.key, e);
                return None;
            }
        };
        let balance = match wei_to_decimal(wei) {
            Ok(b) => b,
            Err(e) => {
                log::warn!("balance on {} not representable: {}", snapshot.network.key, e);
                return None;
            }
        };

        let mut state = self.state();
        if state.network.key != snapshot.network.key {
            log::debug!("network changed during balance refresh, discarding result");
            return None;
        }
        let live = state.live.as_mut()?;
        live.balance = balance;
        if let Err(e) = self.write_record(&state) {
            log::warn!("failed to save balance: {}", e);
        }
        Some(balance)
    }

    // ── Accessors ──

    pub fn is_unlocked(&self) -> bool {
        self.state().live.is_some()
    }

    pub fn can_sign(&self) -> bool {
        self.state()
            .live
            .as_ref()
            .map_or(false, |live| live.signer.is_some())
    }

    pub fn address(&self) -> Option<String> {
        self.state().address.clone()
    }

    pub fn balance(&self) -> Option<Decimal> {
        self.state().live.as_ref().map(|live| live.balance)
    }

    /// Full history, newest first, across every network.
    pub fn history(&self) -> Vec<TransactionRecord> {
        self.state()
            .live
            .as_ref()
            .map(|live| live.history.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// History for the active network, plus untagged legacy records.
    pub fn visible_history(&self) -> Vec<TransactionRecord> {
        let state = self.state();
        match state.live.as_ref() {
            Some(live) => live.history.visible_on(&state.network.key).cloned().collect(),
            None => Vec::new(),
        }
    }

    pub fn unlocked_summary(&self) -> Option<Unlocked> {
        summary_of(&self.state())
    }

    /// Look a transaction up on the active network.
    ///
    /// Use after a broadcast whose outcome is unknown to the caller.
    pub async fn check_transaction(
        &self,
        hash: &str,
    ) -> Result<Option<ChainTransaction>, WalletError> {
        let client = self.state().client.clone();
        Ok(client.get_transaction(hash).await?)
    }

    // ── Internals shared with submit / reconcile ──

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn keys(&self) -> &dyn KeyProvider {
        self.keys.as_ref()
    }

    pub(crate) fn op_lock(&self) -> &tokio::sync::Mutex<()> {
        &self.op_lock
    }

    /// Capture what an async operation needs. `NotUnlocked` when locked, or
    /// when `require_signer` and the record is watch-only.
    pub(crate) fn snapshot(&self, require_signer: bool) -> Result<Snapshot, WalletError> {
        let state = self.state();
        let live = state.live.as_ref().ok_or(WalletError::NotUnlocked)?;
        if require_signer && live.signer.is_none() {
            return Err(WalletError::NotUnlocked);
        }
        let address = state.address.clone().ok_or(WalletError::NotUnlocked)?;
        Ok(Snapshot {
            client: state.client.clone(),
            network: state.network.clone(),
            address,
        })
    }

    /// Sign with the live signer.
    pub(crate) fn sign(&self, intent: &TxIntent) -> Result<SignedTx, WalletError> {
        let state = self.state();
        let signer = state
            .live
            .as_ref()
            .and_then(|live| live.signer.as_ref())
            .ok_or(WalletError::NotUnlocked)?;
        log::debug!("signing nonce {} for chain {}", intent.nonce, signer.chain_id());
        signer.sign(self.keys(), intent)
    }

    /// Fold `owner`'s records into history (head insertion, in order) and
    /// persist.
    ///
    /// If the session was locked meanwhile the stored record is updated
    /// instead, so a completed broadcast or scan is never lost. Records are
    /// dropped when neither the live account nor the stored one is `owner`.
    pub(crate) fn merge_records(
        &self,
        owner: &str,
        records: Vec<TransactionRecord>,
    ) -> Result<usize, WalletError> {
        if records.is_empty() {
            return Ok(0);
        }
        let mut state = self.state();
        let owner_is_live = state
            .address
            .as_deref()
            .map_or(false, |address| same_address(address, owner));
        if owner_is_live {
            if let Some(live) = state.live.as_mut() {
                let added = live.history.merge(records);
                if added > 0 {
                    self.write_record(&state)?;
                }
                return Ok(added);
            }
        }

        let mut record = self.load_record()?;
        if !same_address(&record.address, owner) {
            log::warn!(
                "dropping {} record(s) for {}: account was replaced",
                records.len(),
                owner
            );
            return Ok(0);
        }
        let mut history = History::from_records(std::mem::take(&mut record.history));
        let added = history.merge(records);
        if added > 0 {
            record.history = history.iter().cloned().collect();
            let bytes = Zeroizing::new(serde_json::to_vec(&record)?);
            self.store.set(WALLET_DATA_KEY, &bytes)?;
        }
        Ok(added)
    }

    fn load_record(&self) -> Result<AccountRecord, WalletError> {
        let bytes = self.store.get(WALLET_DATA_KEY)?.ok_or(WalletError::NoAccount)?;
        let bytes = Zeroizing::new(bytes);
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Overwrite the stored record with the live session.
    fn write_record(&self, state: &SessionState) -> Result<(), WalletError> {
        let (Some(live), Some(address)) = (state.live.as_ref(), state.address.as_deref()) else {
            return Err(WalletError::NotUnlocked);
        };
        let view = AccountRecordRef {
            address,
            mnemonic: live.signer.as_ref().map(Signer::phrase),
            pin: &live.pin,
            balance: live.balance,
            history: live.history.records(),
            active_network: &state.network.key,
        };
        let bytes = Zeroizing::new(serde_json::to_vec(&view)?);
        self.store.set(WALLET_DATA_KEY, &bytes)
    }

    fn adopt_record_network(&self, key: &str) -> Result<(), WalletError> {
        let network = match self.registry.get(key) {
            Ok(network) => network,
            Err(_) => {
                log::warn!("record names unknown network {}, ignoring", key);
                return Ok(());
            }
        };
        let mut state = self.state();
        if state.network.key != network.key {
            state.client = self.connector.connect(network)?;
            state.network = network.clone();
            log::debug!("adopted network {} from account record", key);
        }
        Ok(())
    }
}

fn default_network(registry: &NetworkRegistry) -> Result<&NetworkDescriptor, WalletError> {
    registry
        .get(DEFAULT_NETWORK)
        .ok()
        .or_else(|| registry.list().first())
        .ok_or_else(|| WalletError::UnknownNetwork(DEFAULT_NETWORK.to_string()))
}

fn starting_balance(network: &NetworkDescriptor) -> Decimal {
    wei_to_decimal(network.starting_balance_wei).unwrap_or_else(|e| {
        log::warn!("starting balance of {} not representable: {}", network.key, e);
        Decimal::ZERO
    })
}

fn summary_of(state: &SessionState) -> Option<Unlocked> {
    let live = state.live.as_ref()?;
    Some(Unlocked {
        address: state.address.clone()?,
        balance: live.balance,
        network: state.network.key.clone(),
        can_sign: live.signer.is_some(),
    })
}
