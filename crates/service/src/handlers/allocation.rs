//! Order line allocation.

use async_trait::async_trait;
use domain::{Command, DomainError, Event};

use super::unexpected;
use crate::error::{Result, ServiceError};
use crate::messagebus::{CommandHandler, CommandOutcome, EventHandler};
use crate::unit_of_work::UnitOfWork;

/// Allocates an order line, returning the chosen batch.
#[derive(Debug, Clone, Default)]
pub struct AllocateHandler;

impl AllocateHandler {
    const NAME: &'static str = "allocate";
}

#[async_trait]
impl<U: UnitOfWork> CommandHandler<U> for AllocateHandler {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn handle(&self, command: &Command, uow: &mut U) -> Result<CommandOutcome> {
        let Command::Allocate(cmd) = command else {
            return Err(unexpected(Self::NAME, command.command_type()));
        };

        let line = cmd.line();
        let product = uow
            .products()
            .get(&line.sku)
            .await?
            .ok_or_else(|| ServiceError::InvalidSku(line.sku.clone()))?;
        let batchref = product.allocate(line)?;
        uow.commit().await?;

        metrics::counter!("allocations_total").increment(1);
        tracing::info!(orderid = %cmd.orderid, %batchref, "order line allocated");
        Ok(CommandOutcome::Allocated(batchref))
    }
}

/// Allocates a line released by a quantity change.
///
/// Running out of stock here is not a failure: the product is committed so
/// the `OutOfStock` event it recorded is delivered, and the line stays
/// unallocated.
#[derive(Debug, Clone, Default)]
pub struct ReallocateHandler;

impl ReallocateHandler {
    const NAME: &'static str = "reallocate";
}

#[async_trait]
impl<U: UnitOfWork> EventHandler<U> for ReallocateHandler {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn handle(&self, event: &Event, uow: &mut U) -> Result<()> {
        let Event::AllocationRequired(data) = event else {
            return Err(unexpected(Self::NAME, event.event_type()));
        };

        let line = data.line();
        let product = uow
            .products()
            .get(&line.sku)
            .await?
            .ok_or_else(|| ServiceError::InvalidSku(line.sku.clone()))?;

        match product.allocate(line) {
            Ok(batchref) => {
                metrics::counter!("allocations_total").increment(1);
                tracing::info!(orderid = %data.orderid, %batchref, "order line reallocated");
            }
            Err(DomainError::OutOfStock { sku }) => {
                tracing::warn!(orderid = %data.orderid, %sku, "no stock to reallocate order line");
            }
            Err(e) => return Err(e.into()),
        }

        uow.commit().await
    }
}
