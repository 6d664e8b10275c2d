//! Unit of work over a product store.

use async_trait::async_trait;
use domain::Event;
use store::ProductStore;

use crate::error::Result;
use crate::repository::Repository;

/// Transaction boundary around one handler attempt.
///
/// Nothing is committed implicitly. Handlers call [`commit`] after a
/// successful mutation and the message bus calls [`rollback`] when an
/// attempt ends, discarding anything left uncommitted.
///
/// [`commit`]: UnitOfWork::commit
/// [`rollback`]: UnitOfWork::rollback
#[async_trait]
pub trait UnitOfWork: Send {
    /// The store behind the products repository.
    type Store: ProductStore;

    /// Returns the products repository for the current scope.
    fn products(&mut self) -> &mut Repository<Self::Store>;

    /// Persists every product touched in this scope.
    async fn commit(&mut self) -> Result<()>;

    /// Discards uncommitted changes.
    async fn rollback(&mut self);

    /// Drains the events raised by products touched in this scope.
    ///
    /// Products are visited in the order they were first touched and each
    /// event is returned exactly once.
    fn collect_new_events(&mut self) -> Vec<Event> {
        self.products().drain_events()
    }
}

/// Unit of work backed by any [`ProductStore`].
#[derive(Debug)]
pub struct StoreUnitOfWork<S> {
    products: Repository<S>,
    commits: usize,
}

impl<S: ProductStore> StoreUnitOfWork<S> {
    /// Creates a unit of work with a fresh repository session.
    pub fn new(store: S) -> Self {
        Self {
            products: Repository::new(store),
            commits: 0,
        }
    }

    /// Returns how many times this unit of work committed.
    pub fn commit_count(&self) -> usize {
        self.commits
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        self.products.store()
    }
}

#[async_trait]
impl<S: ProductStore> UnitOfWork for StoreUnitOfWork<S> {
    type Store = S;

    fn products(&mut self) -> &mut Repository<S> {
        &mut self.products
    }

    async fn commit(&mut self) -> Result<()> {
        self.products.flush().await?;
        self.commits += 1;
        Ok(())
    }

    async fn rollback(&mut self) {
        self.products.discard();
    }
}
