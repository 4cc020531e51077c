//! Error types for onion_chain
//!
//! Two error types cover the chain lifecycle:
//!
//! - [`HandlerError`]: what a handler transform returns. Includes the
//!   [`HandlerError::Noop`] sentinel, which the runner absorbs silently.
//! - [`ChainError`]: assembly-time problems (lookup, config, serialization).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for chain assembly operations
pub type Result<T> = std::result::Result<T, ChainError>;

/// Error returned by a handler's `before` / `after` transform.
///
/// The runner checks for [`HandlerError::Noop`] by variant, never by message.
/// Every other variant is fatal to the run and is returned to the caller
/// unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HandlerError {
    /// The handler does not implement this phase.
    #[error("empty transform")]
    Noop,

    /// The transform ran and failed.
    #[error("handler '{handler}' failed: {message}")]
    Failed { handler: String, message: String },

    /// The transform could not interpret its input payload.
    #[error("invalid payload: {message}")]
    InvalidPayload { message: String },
}

impl HandlerError {
    /// Create a transform failure attributed to `handler`
    pub fn failed(handler: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            handler: handler.into(),
            message: message.into(),
        }
    }

    /// Create an invalid payload error
    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self::InvalidPayload {
            message: message.into(),
        }
    }

    /// Check if this is the "phase not implemented" sentinel
    pub fn is_noop(&self) -> bool {
        matches!(self, Self::Noop)
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self {
        Self::invalid_payload(err.to_string())
    }
}

/// Error raised while assembling or configuring a chain.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// A requested handler name has no match in the chain
    #[error("not found handler named: {name}")]
    HandlerNotFound { name: String },

    /// Configuration validation failed
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl ChainError {
    /// Create a handler-not-found error
    pub fn handler_not_found(name: impl Into<String>) -> Self {
        Self::HandlerNotFound { name: name.into() }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Name of the missing handler, if this is a lookup failure
    pub fn missing_name(&self) -> Option<&str> {
        match self {
            Self::HandlerNotFound { name } => Some(name),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ChainError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}
