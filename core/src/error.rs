//! Error types for the task API client.
//!
//! # Design
//! Every failure that crosses the client boundary is an `HttpError`: a
//! message plus a numeric status. Status `0` covers transport and other
//! unexpected failures, `408` covers timeouts, and anything else is the
//! server's own status code. Callers classify with the `is_*` helpers rather
//! than matching on a variant hierarchy.

use thiserror::Error;

/// Status used for transport-level and otherwise unexpected failures.
pub const STATUS_NETWORK: u16 = 0;

/// Status used when a request exceeds the client's timeout.
pub const STATUS_TIMEOUT: u16 = 408;

/// Message attached to client-side timeouts.
pub const TIMEOUT_MESSAGE: &str = "Request timeout - Please check your connection";

/// A failed HTTP call.
///
/// Displays as its message alone, so the text can be shown to users as is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HttpError {
    pub message: String,
    pub status: u16,
}

impl HttpError {
    pub fn new(message: impl Into<String>, status: u16) -> Self {
        Self {
            message: message.into(),
            status,
        }
    }

    /// A transport or otherwise unexpected failure (status 0).
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(message, STATUS_NETWORK)
    }

    /// A request that did not finish within the configured timeout.
    pub fn timeout() -> Self {
        Self::new(TIMEOUT_MESSAGE, STATUS_TIMEOUT)
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }

    pub fn is_network_error(&self) -> bool {
        self.status == STATUS_NETWORK
    }

    pub fn is_timeout(&self) -> bool {
        self.status == STATUS_TIMEOUT
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }
}
