use common::Sku;
use thiserror::Error;

use crate::store::Revision;

/// Errors that can occur when interacting with the product store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The stored revision did not match the revision the product was loaded at.
    #[error(
        "Concurrency conflict for product {sku}: expected revision {expected:?}, found {actual:?}"
    )]
    ConcurrencyConflict {
        sku: Sku,
        expected: Option<Revision>,
        actual: Option<Revision>,
    },

    /// The backing store could not be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for product store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
