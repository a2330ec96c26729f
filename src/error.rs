// src/error.rs
//! Error taxonomy for the relay.
//!
//! Only the configuration variants ever stop the process. Everything else is
//! absorbed by the component that sees it and turned into diagnostics.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    /// A required configuration value is absent or blank.
    #[error("missing required configuration: {0}")]
    ConfigMissing(&'static str),

    /// A configuration value is present but cannot be parsed.
    #[error("invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: &'static str, reason: String },

    /// The HTTP call itself failed (connect, timeout, TLS...).
    #[error("transport failure: {0}")]
    TransportFailure(String),

    /// Upstream answered but the body is not in any shape we understand.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// GraphQL-level `errors` payload in an otherwise successful response.
    #[error("upstream domain error: {0}")]
    UpstreamDomainError(String),

    /// Messaging API did not acknowledge a send.
    #[error("delivery failure: {0}")]
    DeliveryFailure(String),

    /// Ledger or artifact could not be written.
    #[error("persistence error: {0}")]
    Persistence(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RelayError>;
