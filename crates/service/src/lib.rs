//! Service layer for the stock allocation system.
//!
//! This crate provides the message bus and everything it drives:
//! - Repository sessions and the unit of work over a product store
//! - Command and event handlers with retry for event handlers
//! - Outbound notifications and broker publishing
//! - Translation of inbound broker messages and read-side views

pub mod bootstrap;
pub mod broker;
pub mod config;
pub mod error;
pub mod external;
pub mod handlers;
pub mod messagebus;
pub mod notifications;
pub mod repository;
pub mod retry;
pub mod unit_of_work;
pub mod views;

pub use bootstrap::{bootstrap, default_registry};
pub use broker::{InMemoryBroker, LogBroker, MessageBroker};
pub use config::Config;
pub use error::{Result, ServiceError};
pub use external::{CHANGE_BATCH_QUANTITY_CHANNEL, command_from_broker};
pub use messagebus::{
    CommandHandler, CommandOutcome, EventHandler, HandlerRegistry, HandlerRegistryBuilder,
    MessageBus,
};
pub use notifications::{InMemoryNotifications, LogNotifications, Notifications, SentNotification};
pub use repository::Repository;
pub use retry::RetryPolicy;
pub use unit_of_work::{StoreUnitOfWork, UnitOfWork};
pub use views::{AllocationView, allocations};
