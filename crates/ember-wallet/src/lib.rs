//! Ember wallet core.
//!
//! A PIN-gated session over one mnemonic account on EVM networks: unlock,
//! network switching, balance refresh, native transfer submission, and
//! reconciliation of on-chain history into a persisted record.

pub mod config;
pub mod error;
pub mod history;
pub mod keys;
pub mod reconcile;
pub mod record;
pub mod secret;
pub mod session;
pub mod store;
pub mod submit;

pub use config::{SessionConfig, DEFAULT_RECONCILE_WINDOW};
pub use error::WalletError;
pub use history::History;
pub use keys::{normalize_phrase, KeyProvider, MnemonicKeyProvider};
pub use reconcile::ReconcileReport;
pub use record::{AccountRecord, Direction, TransactionRecord};
pub use secret::{Pin, SecretPhrase};
pub use session::{Session, Unlocked};
pub use store::{FileStore, MemoryStore, Store, CURRENT_NETWORK_KEY, WALLET_DATA_KEY};
pub use submit::TransferRequest;
