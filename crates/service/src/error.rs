//! Service error types.

use common::Sku;
use domain::{CommandKind, DomainError};
use store::StoreError;
use thiserror::Error;

/// Errors that can occur while handling messages.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A command referenced a SKU with no known product.
    #[error("Invalid sku {0}")]
    InvalidSku(Sku),

    /// Domain error.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Product store error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Sending a notification failed.
    #[error("Notification error: {0}")]
    Notification(String),

    /// Publishing to the message broker failed.
    #[error("Publish error: {0}")]
    Publish(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A broker message could not be turned into a command.
    #[error("Invalid message on channel '{channel}': {reason}")]
    InvalidExternalMessage { channel: String, reason: String },

    /// No handler is registered for the command.
    #[error("No handler registered for command {0}")]
    NoCommandHandler(CommandKind),

    /// A handler was given a message it does not handle.
    #[error("Handler {handler} cannot handle {message}")]
    UnexpectedMessage {
        handler: &'static str,
        message: &'static str,
    },

    /// Two handlers were registered for the same command.
    #[error("Duplicate handler registered for command {0}")]
    DuplicateCommandHandler(CommandKind),
}

impl ServiceError {
    /// Returns true for a revision conflict reported by the store at commit.
    pub fn is_concurrency_conflict(&self) -> bool {
        matches!(
            self,
            ServiceError::Store(StoreError::ConcurrencyConflict { .. })
        )
    }
}

/// Convenience type alias for service results.
pub type Result<T> = std::result::Result<T, ServiceError>;
