use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{BatchRef, Sku};
use domain::{Aggregate, Product};
use tokio::sync::RwLock;

use crate::{
    Result, StoreError,
    store::{PendingSave, ProductStore, Revision, StoredProduct},
};

/// In-memory product store.
///
/// Clones share the same underlying map, so a store handed to several units
/// of work sees every commit.
#[derive(Clone, Default)]
pub struct InMemoryProductStore {
    products: Arc<RwLock<HashMap<Sku, StoredProduct>>>,
}

impl InMemoryProductStore {
    /// Creates a new empty in-memory product store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of products stored.
    pub async fn product_count(&self) -> usize {
        self.products.read().await.len()
    }

    /// Removes every product.
    pub async fn clear(&self) {
        self.products.write().await.clear();
    }
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn get(&self, sku: &Sku) -> Result<Option<StoredProduct>> {
        let products = self.products.read().await;
        Ok(products.get(sku).cloned())
    }

    async fn get_by_batchref(&self, reference: &BatchRef) -> Result<Option<StoredProduct>> {
        let products = self.products.read().await;
        Ok(products
            .values()
            .find(|stored| stored.product.has_batch(reference))
            .cloned())
    }

    async fn save(&self, saves: Vec<PendingSave>) -> Result<Vec<Revision>> {
        let mut products = self.products.write().await;

        // Check every revision before writing anything
        for save in &saves {
            let sku = save.product.sku();
            let actual = products.get(sku).map(|stored| stored.revision);
            if actual != save.expected_revision {
                tracing::warn!(
                    aggregate = Product::aggregate_type(),
                    %sku,
                    ?actual,
                    expected = ?save.expected_revision,
                    "revision conflict on save"
                );
                return Err(StoreError::ConcurrencyConflict {
                    sku: sku.clone(),
                    expected: save.expected_revision,
                    actual,
                });
            }
        }

        let mut revisions = Vec::with_capacity(saves.len());
        for save in saves {
            let revision = save
                .expected_revision
                .map_or_else(Revision::first, Revision::next);
            let mut product = save.product;
            product.take_events();
            products.insert(product.sku().clone(), StoredProduct { product, revision });
            revisions.push(revision);
        }

        Ok(revisions)
    }

    async fn all(&self) -> Result<Vec<Product>> {
        let products = self.products.read().await;
        let mut all: Vec<_> = products
            .values()
            .map(|stored| stored.product.clone())
            .collect();
        all.sort_by(|a, b| a.sku().cmp(b.sku()));
        Ok(all)
    }

    async fn ping(&self) -> Result<()> {
        let _products = self.products.read().await;
        Ok(())
    }
}
