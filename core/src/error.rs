//! Error types for the Rundeck API client.
//!
//! # Design
//! Transport failures (no response, or a status other than the one the
//! operation expects) are kept in their own `TransportError` and travel
//! through `Error::Transport` untouched. Everything else describes what went
//! wrong while interpreting a response or preparing a request.

use thiserror::Error;

/// Failures originating from the HTTP exchange itself, before any body is
/// interpreted.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No response was received (connection refused, timeout, TLS, ...).
    #[error("request failed: {0}")]
    Network(String),

    /// The server answered with a status the operation does not accept.
    #[error("unexpected HTTP status {status} (expected {expected}): {body}")]
    UnexpectedStatus {
        status: u16,
        expected: u16,
        body: String,
    },
}

/// Errors returned by `RundeckClient` and `BlockingClient`.
#[derive(Debug, Error)]
pub enum Error {
    /// Network failure or non-matching status, propagated unchanged.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The response body did not match the expected schema.
    #[error("decode failed: {0}")]
    Decode(String),

    /// The request body could not be serialized or read.
    #[error("encode failed: {0}")]
    Encode(String),

    /// Invalid call-time configuration.
    #[error("invalid option: {0}")]
    Option(String),

    /// The server rejected one or more ACL policies. One line per policy.
    #[error("{0}")]
    PolicyValidation(String),
}

impl Error {
    /// True when the server answered 404 where another status was expected.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::Transport(TransportError::UnexpectedStatus { status: 404, .. })
        )
    }
}
