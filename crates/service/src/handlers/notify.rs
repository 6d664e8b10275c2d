//! Outbound side effects of allocation events.

use std::sync::Arc;

use async_trait::async_trait;
use domain::Event;

use super::unexpected;
use crate::broker::MessageBroker;
use crate::error::Result;
use crate::messagebus::EventHandler;
use crate::notifications::Notifications;
use crate::unit_of_work::UnitOfWork;

/// Publishes `Allocated` events on a broker channel.
pub struct PublishAllocated {
    broker: Arc<dyn MessageBroker>,
    channel: String,
}

impl PublishAllocated {
    const NAME: &'static str = "publish_allocated";

    pub fn new(broker: Arc<dyn MessageBroker>, channel: impl Into<String>) -> Self {
        Self {
            broker,
            channel: channel.into(),
        }
    }
}

#[async_trait]
impl<U: UnitOfWork> EventHandler<U> for PublishAllocated {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn handle(&self, event: &Event, _uow: &mut U) -> Result<()> {
        let Event::Allocated(data) = event else {
            return Err(unexpected(Self::NAME, event.event_type()));
        };
        let payload = serde_json::to_value(data)?;
        self.broker.publish(&self.channel, payload).await
    }
}

/// Tells the stock team when a SKU runs out.
pub struct OutOfStockNotifier {
    notifications: Arc<dyn Notifications>,
    recipient: String,
}

impl OutOfStockNotifier {
    const NAME: &'static str = "notify_out_of_stock";

    pub fn new(notifications: Arc<dyn Notifications>, recipient: impl Into<String>) -> Self {
        Self {
            notifications,
            recipient: recipient.into(),
        }
    }
}

#[async_trait]
impl<U: UnitOfWork> EventHandler<U> for OutOfStockNotifier {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn handle(&self, event: &Event, _uow: &mut U) -> Result<()> {
        let Event::OutOfStock(data) = event else {
            return Err(unexpected(Self::NAME, event.event_type()));
        };
        self.notifications
            .send(&self.recipient, &format!("Out of stock for {}", data.sku))
            .await
    }
}
