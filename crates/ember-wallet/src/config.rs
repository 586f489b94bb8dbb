//! Session configuration.

use ember_rpc::RpcConfig;

/// Blocks scanned by [`Session::sync_history`](crate::Session::sync_history).
pub const DEFAULT_RECONCILE_WINDOW: u64 = 1000;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Trailing window, in blocks, for history reconciliation.
    pub reconcile_window: u64,
    /// Transport settings applied to every network's endpoint.
    pub rpc: RpcConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reconcile_window: DEFAULT_RECONCILE_WINDOW,
            rpc: RpcConfig::default(),
        }
    }
}
