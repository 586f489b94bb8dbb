//! RPC error types.

use thiserror::Error;

/// JSON-RPC 2.0 standard error codes.
pub mod codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;
    /// Node-specific server errors (nonce too low, insufficient funds, ...).
    pub const SERVER_ERROR: i64 = -32000;
}

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("HTTP error calling {method} at {url}: {source}")]
    Http {
        method: String,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} calling {method} at {url}: {body}")]
    HttpStatus {
        method: String,
        url: String,
        status: u16,
        body: String,
    },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{message}")]
    Rpc {
        code: i64,
        message: String,
        method: String,
    },

    #[error("no result in response ({context})")]
    NoResult { context: String },

    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("authentication failed at {url}")]
    AuthFailed { url: String },

    #[error("{0}")]
    Other(String),
}

impl RpcError {
    /// Whether a retry has a reasonable chance of succeeding.
    ///
    /// Node-reported errors are never transient: the request reached the
    /// node and was rejected.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http { source, .. } => {
                source.is_timeout() || source.is_connect() || source.is_request()
            }
            Self::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
