//! Default command and event handlers.

mod allocation;
mod batches;
mod notify;

pub use allocation::{AllocateHandler, ReallocateHandler};
pub use batches::{AddBatchHandler, ChangeBatchQuantityHandler};
pub use notify::{OutOfStockNotifier, PublishAllocated};

use crate::error::ServiceError;

fn unexpected(handler: &'static str, message: &'static str) -> ServiceError {
    ServiceError::UnexpectedMessage { handler, message }
}
