//! Identifiers shared by every crate in the allocation workspace.

pub mod types;

pub use types::{BatchRef, OrderId, Sku, Version};
