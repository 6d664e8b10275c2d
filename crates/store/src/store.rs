use async_trait::async_trait;
use common::{BatchRef, Sku};
use domain::Product;

use crate::Result;

/// Store-side revision of a product snapshot.
///
/// Every successful save of a product bumps its revision, whatever the
/// change. This is the token checked at commit; a product's own
/// `version_number` only counts allocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Revision(u64);

impl Revision {
    /// Revision of a product's first save.
    pub fn first() -> Self {
        Self(1)
    }

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A product as loaded from the store.
#[derive(Debug, Clone)]
pub struct StoredProduct {
    pub product: Product,
    pub revision: Revision,
}

/// A product to write, with the revision it was loaded at.
#[derive(Debug, Clone)]
pub struct PendingSave {
    pub product: Product,

    /// Revision found in the store when the product was loaded.
    /// `None` means the product must not exist yet.
    pub expected_revision: Option<Revision>,
}

impl PendingSave {
    /// Creates a save for a product that must not exist yet.
    pub fn new_product(product: Product) -> Self {
        Self {
            product,
            expected_revision: None,
        }
    }

    /// Creates a save for a product loaded at `revision`.
    pub fn existing(product: Product, revision: Revision) -> Self {
        Self {
            product,
            expected_revision: Some(revision),
        }
    }
}

/// Core trait for product persistence.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Loads the product with the given SKU.
    async fn get(&self, sku: &Sku) -> Result<Option<StoredProduct>>;

    /// Loads the product holding the batch with the given reference.
    async fn get_by_batchref(&self, reference: &BatchRef) -> Result<Option<StoredProduct>>;

    /// Writes products atomically - either all succeed or none do.
    ///
    /// Fails with `ConcurrencyConflict` if any stored revision differs from
    /// the expected one. On success returns the new revision of each
    /// product, in the order given.
    async fn save(&self, saves: Vec<PendingSave>) -> Result<Vec<Revision>>;

    /// Loads every product, ordered by SKU.
    async fn all(&self) -> Result<Vec<Product>>;

    /// Checks that the store answers, without loading products.
    async fn ping(&self) -> Result<()>;
}
