use thiserror::Error;

use crate::error::StoreError;

/// Error returned by every repository behavior.
///
/// Adapter, decoration and store failures are carried unchanged so callers can
/// match on the original cause.
#[derive(Error, Debug)]
pub enum RepoError {
    /// A behavior ran before `inject_engine` bound an engine
    #[error("No engine bound to repository; call inject_engine first")]
    EngineNotBound,

    /// `inject_engine` was called on a repository that already has an engine
    #[error("Repository is already bound to an engine")]
    EngineAlreadyBound,

    /// A conversion adapter failed
    #[error(transparent)]
    Convert(#[from] ConvertError),

    /// A session option refused to decorate the session
    #[error("Session decoration failed: {message}")]
    Decorate { message: String },

    /// The store rejected an operation
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RepoError {
    /// Create a decoration error
    pub fn decorate(message: impl Into<String>) -> Self {
        Self::Decorate {
            message: message.into(),
        }
    }

    /// Returns the underlying store error, if any
    pub fn as_store(&self) -> Option<&StoreError> {
        match self {
            RepoError::Store(err) => Some(err),
            _ => None,
        }
    }
}

/// Errors raised by `IntoEntity` / `FromEntity` adapters.
#[derive(Error, Debug)]
pub enum ConvertError {
    /// A field could not be mapped
    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: String, reason: String },

    /// The sink refused to accept more entities
    #[error("Sink rejected entity: {0}")]
    Rejected(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ConvertError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }
}

/// Type alias for Result with RepoError
pub type RepoResult<T> = Result<T, RepoError>;
