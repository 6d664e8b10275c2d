//! Session-scoped product repository.

use common::{BatchRef, Sku};
use domain::{Aggregate, Event, Product};
use store::{PendingSave, ProductStore, Revision, StoredProduct};

/// A product handed out by the session, with the store revision it was
/// loaded at.
#[derive(Debug)]
struct Tracked {
    product: Product,
    loaded: Option<Revision>,
}

/// Repository session over a [`ProductStore`].
///
/// Every product the session loads or accepts is kept in an ordered seen
/// set. Products are loaded from the store at most once per session and
/// handed out by mutable reference after that.
#[derive(Debug)]
pub struct Repository<S> {
    store: S,
    seen: Vec<Tracked>,
}

impl<S: ProductStore> Repository<S> {
    /// Creates an empty session over the store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            seen: Vec::new(),
        }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Tracks a product that is not yet persisted.
    pub fn add(&mut self, product: Product) -> &mut Product {
        let index = match self.position(|p| p.sku() == product.sku()) {
            Some(index) => {
                self.seen[index].product = product;
                index
            }
            None => {
                self.seen.push(Tracked {
                    product,
                    loaded: None,
                });
                self.seen.len() - 1
            }
        };
        &mut self.seen[index].product
    }

    /// Returns the product with the given SKU, loading it on first use.
    pub async fn get(&mut self, sku: &Sku) -> store::Result<Option<&mut Product>> {
        let index = match self.position(|p| p.sku() == sku) {
            Some(index) => Some(index),
            None => self.store.get(sku).await?.map(|stored| self.track(stored)),
        };
        Ok(index.map(|i| &mut self.seen[i].product))
    }

    /// Returns the product holding the given batch, loading it on first use.
    pub async fn get_by_batchref(
        &mut self,
        reference: &BatchRef,
    ) -> store::Result<Option<&mut Product>> {
        let index = match self.position(|p| p.has_batch(reference)) {
            Some(index) => Some(index),
            None => self
                .store
                .get_by_batchref(reference)
                .await?
                .map(|stored| self.track(stored)),
        };
        Ok(index.map(|i| &mut self.seen[i].product))
    }

    /// Returns the products seen by this session, in the order first touched.
    pub fn seen(&self) -> impl Iterator<Item = &Product> {
        self.seen.iter().map(|t| &t.product)
    }

    /// Removes and returns pending events from every seen product.
    pub fn drain_events(&mut self) -> Vec<Event> {
        self.seen
            .iter_mut()
            .flat_map(|t| t.product.take_events())
            .collect()
    }

    /// Writes every seen product to the store in one atomic save.
    pub async fn flush(&mut self) -> store::Result<()> {
        let saves = self
            .seen
            .iter()
            .map(|t| PendingSave {
                product: t.product.clone(),
                expected_revision: t.loaded,
            })
            .collect();

        let revisions = self.store.save(saves).await?;

        for (tracked, revision) in self.seen.iter_mut().zip(revisions) {
            tracked.loaded = Some(revision);
        }
        Ok(())
    }

    /// Forgets every seen product, dropping uncommitted changes.
    pub fn discard(&mut self) {
        self.seen.clear();
    }

    fn position(&self, predicate: impl Fn(&Product) -> bool) -> Option<usize> {
        self.seen.iter().position(|t| predicate(&t.product))
    }

    fn track(&mut self, stored: StoredProduct) -> usize {
        self.seen.push(Tracked {
            product: stored.product,
            loaded: Some(stored.revision),
        });
        self.seen.len() - 1
    }
}
