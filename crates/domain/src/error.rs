//! Domain error types.

use common::{BatchRef, Sku};
use thiserror::Error;

/// Errors raised by the allocation aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// No batch of the product can satisfy the order line.
    #[error("Out of stock for sku {sku}")]
    OutOfStock { sku: Sku },

    /// The batch reference does not belong to the product.
    #[error("Unknown batch reference: {reference}")]
    UnknownBatch { reference: BatchRef },

    /// A batch was offered to a product with a different SKU.
    #[error("Batch {reference} has sku {batch_sku}, expected {product_sku}")]
    SkuMismatch {
        reference: BatchRef,
        batch_sku: Sku,
        product_sku: Sku,
    },

    /// The product already holds a batch with this reference.
    #[error("Duplicate batch reference: {reference}")]
    DuplicateBatch { reference: BatchRef },

    /// Order lines must ask for at least one unit.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },
}

/// Convenience type alias for domain results.
pub type Result<T> = std::result::Result<T, DomainError>;
