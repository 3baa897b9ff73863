//! Node client error taxonomy.
//!
//! Transport failures (`NetworkError`-shaped) are distinguished from a
//! node that responded but returned semantically invalid data
//! (`NodeProtocolError`-shaped).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("connecting to {url}: {source}")]
    Connection {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {method} timed out")]
    Timeout { method: String },

    #[error("{method} returned HTTP {status}: {body}")]
    HttpStatus {
        method: String,
        status: u16,
        body: String,
    },

    #[error("authentication failed for {url}")]
    AuthFailed { url: String },

    #[error("decoding response from {method}: {source}")]
    Json {
        method: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("node busy while calling {method}")]
    Busy { method: String },

    #[error("{method}: node returned no usable result")]
    NoResult { method: String },

    #[error("{method}: node response was semantically invalid: {reason}")]
    Protocol { method: String, reason: String },

    #[error("{0}")]
    Other(String),
}

impl RpcError {
    /// Transient failures worth a retry with backoff: connection hiccups,
    /// timeouts, 5xx, and busy responses.
    /// A 4xx (other than a transient busy signal) or a protocol-level
    /// error is not retried — retrying won't change a malformed request or
    /// a node that understood us and said no.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            RpcError::Connection { .. }
                | RpcError::Timeout { .. }
                | RpcError::Busy { .. }
                | RpcError::HttpStatus { status: 500..=599, .. }
        )
    }

    /// Whether this is the specific "preferred endpoint not implemented"
    /// signal the sticky legacy-endpoint fallback watches for.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RpcError::HttpStatus { status: 404, .. })
    }
}
