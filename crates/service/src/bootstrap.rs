//! Wiring of the default handlers into a message bus.

use std::sync::Arc;

use domain::{CommandKind, EventKind};

use crate::broker::MessageBroker;
use crate::config::Config;
use crate::error::Result;
use crate::handlers::{
    AddBatchHandler, AllocateHandler, ChangeBatchQuantityHandler, OutOfStockNotifier,
    PublishAllocated, ReallocateHandler,
};
use crate::messagebus::{HandlerRegistry, MessageBus};
use crate::notifications::Notifications;
use crate::unit_of_work::UnitOfWork;

/// Builds the registry of default handlers.
pub fn default_registry<U: UnitOfWork>(
    config: &Config,
    notifications: Arc<dyn Notifications>,
    broker: Arc<dyn MessageBroker>,
) -> Result<HandlerRegistry<U>> {
    HandlerRegistry::builder()
        .command(CommandKind::CreateBatch, Arc::new(AddBatchHandler))
        .command(CommandKind::Allocate, Arc::new(AllocateHandler))
        .command(
            CommandKind::ChangeBatchQuantity,
            Arc::new(ChangeBatchQuantityHandler),
        )
        .event(EventKind::BatchCreated, Arc::new(AddBatchHandler))
        .event(
            EventKind::BatchQuantityChanged,
            Arc::new(ChangeBatchQuantityHandler),
        )
        .event(EventKind::AllocationRequired, Arc::new(ReallocateHandler))
        .event(
            EventKind::Allocated,
            Arc::new(PublishAllocated::new(
                broker,
                config.line_allocated_channel.clone(),
            )),
        )
        .event(
            EventKind::OutOfStock,
            Arc::new(OutOfStockNotifier::new(
                notifications,
                config.out_of_stock_recipient.clone(),
            )),
        )
        .build()
}

/// Builds a message bus with the default handlers and the configured retry policy.
pub fn bootstrap<U: UnitOfWork>(
    config: &Config,
    notifications: Arc<dyn Notifications>,
    broker: Arc<dyn MessageBroker>,
) -> Result<MessageBus<U>> {
    let registry = default_registry(config, notifications, broker)?;
    Ok(MessageBus::new(registry, config.retry))
}
