//! Product aggregate and related types.

mod batch;
mod commands;
mod events;
mod order_line;
mod product;

pub use batch::Batch;
pub use commands::{Allocate, ChangeBatchQuantity, Command, CommandKind, CreateBatch};
pub use events::{
    AllocatedData, AllocationRequiredData, BatchCreatedData, BatchQuantityChangedData,
    DeallocatedData, Event, EventKind, OutOfStockData,
};
pub use order_line::OrderLine;
pub use product::Product;
