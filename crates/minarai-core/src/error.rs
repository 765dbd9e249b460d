//! Shared error type across minarai crates.

use thiserror::Error;

/// Stable error codes, usable in logs and by callers that branch on kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Required construction input missing or malformed.
    InvalidArgument,
    /// Operation needs a capability that was never configured.
    MissingCapability,
    /// `initialize` was called more than once.
    AlreadyInitialized,
    /// Transport handle is gone.
    Closed,
    /// Payload could not be decoded or encoded.
    BadPayload,
    /// Transport-level failure (socket, HTTP).
    Transport,
    /// Internal error.
    Internal,
}

impl ErrorCode {
    /// String representation used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidArgument => "INVALID_ARGUMENT",
            ErrorCode::MissingCapability => "MISSING_CAPABILITY",
            ErrorCode::AlreadyInitialized => "ALREADY_INITIALIZED",
            ErrorCode::Closed => "CLOSED",
            ErrorCode::BadPayload => "BAD_PAYLOAD",
            ErrorCode::Transport => "TRANSPORT",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, MinaraiError>;

/// Unified error type used by core and client.
#[derive(Debug, Error)]
pub enum MinaraiError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("missing capability: {0}")]
    MissingCapability(String),
    #[error("session already initialized")]
    AlreadyInitialized,
    #[error("transport closed")]
    Closed,
    #[error("bad payload: {0}")]
    BadPayload(String),
    #[error("transport: {0}")]
    Transport(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl MinaraiError {
    /// Map the error to its stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            MinaraiError::InvalidArgument(_) => ErrorCode::InvalidArgument,
            MinaraiError::MissingCapability(_) => ErrorCode::MissingCapability,
            MinaraiError::AlreadyInitialized => ErrorCode::AlreadyInitialized,
            MinaraiError::Closed => ErrorCode::Closed,
            MinaraiError::BadPayload(_) => ErrorCode::BadPayload,
            MinaraiError::Transport(_) => ErrorCode::Transport,
            MinaraiError::Internal(_) => ErrorCode::Internal,
        }
    }
}

impl From<serde_json::Error> for MinaraiError {
    fn from(e: serde_json::Error) -> Self {
        MinaraiError::BadPayload(e.to_string())
    }
}
