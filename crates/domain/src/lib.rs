//! Domain layer for the stock allocation service.
//!
//! This crate provides the core domain abstractions including:
//! - Aggregate trait for entities that record domain events
//! - Product aggregate with batches and order line allocation
//! - Commands and events exchanged through the message bus

pub mod aggregate;
pub mod allocation;
pub mod error;
pub mod message;

pub use aggregate::Aggregate;
pub use allocation::{
    Allocate, AllocatedData, AllocationRequiredData, Batch, BatchCreatedData,
    BatchQuantityChangedData, ChangeBatchQuantity, Command, CommandKind, CreateBatch,
    DeallocatedData, Event, EventKind, OrderLine, OutOfStockData, Product,
};
pub use common::{BatchRef, OrderId, Sku, Version};
pub use error::DomainError;
pub use message::Message;
