//! Error types for the orchestration layer.
//!
//! Every error is returned synchronously at the call that detected it; none are
//! logged and swallowed inside the core. [`Error::as_label`] gives a stable
//! snake_case label for logs.

use std::time::Duration;

use clara_models::NameError;
use thiserror::Error;

use crate::codec::CodecError;
use crate::transport::TransportError;

pub type Result<T> = std::result::Result<T, Error>;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed canonical name or topic input. Always a caller bug.
    #[error("addressing error: {0}")]
    Addressing(#[from] NameError),

    /// A listener is already registered for this key; the registry is unchanged.
    #[error("duplicated subscription to: {key}")]
    DuplicateSubscription { key: String },

    /// Rejected locally before anything reached the transport.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The request was used after it had been dispatched.
    #[error("illegal state: {0}")]
    IllegalState(String),

    /// Publish, subscribe or query failure reported by the transport.
    #[error("transport error: {0}")]
    Transport(TransportError),

    /// No reply within the deadline. The request may still be processed remotely.
    #[error("no response after {timeout:?}")]
    Timeout { timeout: Duration },

    /// Control payload could not be encoded or decoded.
    #[error("control message error: {0}")]
    Codec(#[from] CodecError),

    /// Engine data could not be converted to or from bytes.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl Error {
    pub fn as_label(&self) -> &'static str {
        match self {
            Error::Addressing(_) => "addressing",
            Error::DuplicateSubscription { .. } => "duplicate_subscription",
            Error::InvalidArgument(_) => "invalid_argument",
            Error::IllegalState(_) => "illegal_state",
            Error::Transport(_) => "transport",
            Error::Timeout { .. } => "timeout",
            Error::Codec(_) => "codec",
            Error::Serialization(_) => "serialization",
        }
    }

    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        Error::InvalidArgument(message.into())
    }
}

impl From<TransportError> for Error {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout { timeout } => Error::Timeout { timeout },
            other => Error::Transport(other),
        }
    }
}
