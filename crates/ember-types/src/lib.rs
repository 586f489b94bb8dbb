//! Core types and constants for the Ember wallet.
//!
//! This crate provides the foundational types used across all Ember crates:
//! the network catalog, Ethereum-style address parsing and checksumming, and
//! conversion between base units (wei) and display decimals.

pub mod address;
pub mod network;
pub mod units;

pub use address::AddressError;
pub use network::{NetworkDescriptor, NetworkError, NetworkRegistry, DEFAULT_NETWORK};
pub use units::UnitsError;

/// Display decimal type used for balances and amounts.
pub use rust_decimal::Decimal;
