//! Batch creation and quantity changes.

use async_trait::async_trait;
use chrono::NaiveDate;
use common::{BatchRef, Sku};
use domain::{Batch, Command, DomainError, Event, Product};

use super::unexpected;
use crate::error::Result;
use crate::messagebus::{CommandHandler, CommandOutcome, EventHandler};
use crate::unit_of_work::UnitOfWork;

/// Adds a batch, creating its product on first use.
///
/// Handles the `CreateBatch` command and the `BatchCreated` event.
#[derive(Debug, Clone, Default)]
pub struct AddBatchHandler;

impl AddBatchHandler {
    const NAME: &'static str = "add_batch";

    async fn add_batch<U: UnitOfWork>(
        uow: &mut U,
        reference: &BatchRef,
        sku: &Sku,
        qty: u32,
        eta: Option<NaiveDate>,
    ) -> Result<()> {
        let batch = Batch::new(reference.clone(), sku.clone(), qty, eta);

        let existing = uow.products().get(sku).await?;
        match existing {
            Some(product) => product.add_batch(batch)?,
            None => {
                uow.products().add(Product::new(sku.clone(), vec![batch]));
            }
        }

        tracing::debug!(%reference, %sku, qty, "batch added");
        uow.commit().await
    }
}

#[async_trait]
impl<U: UnitOfWork> CommandHandler<U> for AddBatchHandler {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn handle(&self, command: &Command, uow: &mut U) -> Result<CommandOutcome> {
        let Command::CreateBatch(cmd) = command else {
            return Err(unexpected(Self::NAME, command.command_type()));
        };
        Self::add_batch(uow, &cmd.reference, &cmd.sku, cmd.qty, cmd.eta).await?;
        Ok(CommandOutcome::Completed)
    }
}

#[async_trait]
impl<U: UnitOfWork> EventHandler<U> for AddBatchHandler {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn handle(&self, event: &Event, uow: &mut U) -> Result<()> {
        let Event::BatchCreated(data) = event else {
            return Err(unexpected(Self::NAME, event.event_type()));
        };
        Self::add_batch(uow, &data.reference, &data.sku, data.qty, data.eta).await
    }
}

/// Changes a batch's purchased quantity.
///
/// Handles the `ChangeBatchQuantity` command and the `BatchQuantityChanged`
/// event. Lines released by the change are raised as `AllocationRequired`.
#[derive(Debug, Clone, Default)]
pub struct ChangeBatchQuantityHandler;

impl ChangeBatchQuantityHandler {
    const NAME: &'static str = "change_batch_quantity";

    async fn change_quantity<U: UnitOfWork>(
        uow: &mut U,
        reference: &BatchRef,
        qty: u32,
    ) -> Result<()> {
        let product = uow
            .products()
            .get_by_batchref(reference)
            .await?
            .ok_or_else(|| DomainError::UnknownBatch {
                reference: reference.clone(),
            })?;
        product.change_batch_quantity(reference, qty)?;

        tracing::debug!(%reference, qty, "batch quantity changed");
        uow.commit().await
    }
}

#[async_trait]
impl<U: UnitOfWork> CommandHandler<U> for ChangeBatchQuantityHandler {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn handle(&self, command: &Command, uow: &mut U) -> Result<CommandOutcome> {
        let Command::ChangeBatchQuantity(cmd) = command else {
            return Err(unexpected(Self::NAME, command.command_type()));
        };
        Self::change_quantity(uow, &cmd.reference, cmd.qty).await?;
        Ok(CommandOutcome::Completed)
    }
}

#[async_trait]
impl<U: UnitOfWork> EventHandler<U> for ChangeBatchQuantityHandler {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn handle(&self, event: &Event, uow: &mut U) -> Result<()> {
        let Event::BatchQuantityChanged(data) = event else {
            return Err(unexpected(Self::NAME, event.event_type()));
        };
        Self::change_quantity(uow, &data.reference, data.qty).await
    }
}
