//! Shared error type across viewcount crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Missing or malformed slug.
    BadRequest,
    /// Counter store unreachable or misbehaving.
    StoreUnavailable,
    /// Invalid configuration.
    Config,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in logs and metrics labels.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::StoreUnavailable => "STORE_UNAVAILABLE",
            ClientCode::Config => "CONFIG",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, ViewError>;

/// Unified error type used by core and server.
#[derive(Debug, Error)]
pub enum ViewError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("store: {0}")]
    Store(String),
    #[error("config: {0}")]
    Config(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl ViewError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            ViewError::BadRequest(_) => ClientCode::BadRequest,
            ViewError::Store(_) => ClientCode::StoreUnavailable,
            ViewError::Config(_) => ClientCode::Config,
            ViewError::Internal(_) => ClientCode::Internal,
        }
    }
}
