pub mod error;
pub mod memory;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryProductStore;
pub use store::{PendingSave, ProductStore, Revision, StoredProduct};
