//! Allocation commands.

use chrono::NaiveDate;
use common::{BatchRef, OrderId, Sku};
use serde::{Deserialize, Serialize};

use super::OrderLine;

/// Intents handled by exactly one handler each.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Command {
    CreateBatch(CreateBatch),
    Allocate(Allocate),
    ChangeBatchQuantity(ChangeBatchQuantity),
}

/// Discriminant of [`Command`], used to key handler registrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    CreateBatch,
    Allocate,
    ChangeBatchQuantity,
}

impl CommandKind {
    /// Returns the stable command type name.
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::CreateBatch => "CreateBatch",
            CommandKind::Allocate => "Allocate",
            CommandKind::ChangeBatchQuantity => "ChangeBatchQuantity",
        }
    }
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Command {
    /// Returns the kind of this command.
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::CreateBatch(_) => CommandKind::CreateBatch,
            Command::Allocate(_) => CommandKind::Allocate,
            Command::ChangeBatchQuantity(_) => CommandKind::ChangeBatchQuantity,
        }
    }

    /// Returns the command type name.
    pub fn command_type(&self) -> &'static str {
        self.kind().as_str()
    }
}

/// Command to add a batch of stock, creating the product if needed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBatch {
    /// Reference of the new batch.
    #[serde(rename = "ref")]
    pub reference: BatchRef,

    /// SKU held by the batch.
    pub sku: Sku,

    /// Purchased quantity.
    pub qty: u32,

    /// Expected arrival, `None` when already in stock.
    pub eta: Option<NaiveDate>,
}

impl CreateBatch {
    /// Creates a new CreateBatch command.
    pub fn new(
        reference: impl Into<BatchRef>,
        sku: impl Into<Sku>,
        qty: u32,
        eta: Option<NaiveDate>,
    ) -> Self {
        Self {
            reference: reference.into(),
            sku: sku.into(),
            qty,
            eta,
        }
    }
}

/// Command to allocate an order line to the best available batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocate {
    pub orderid: OrderId,
    pub sku: Sku,
    pub qty: u32,
}

impl Allocate {
    /// Creates a new Allocate command.
    pub fn new(orderid: impl Into<OrderId>, sku: impl Into<Sku>, qty: u32) -> Self {
        Self {
            orderid: orderid.into(),
            sku: sku.into(),
            qty,
        }
    }

    /// Returns the order line to allocate.
    pub fn line(&self) -> OrderLine {
        OrderLine::new(self.orderid.clone(), self.sku.clone(), self.qty)
    }
}

/// Command to change a batch's purchased quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeBatchQuantity {
    /// The batch to change.
    #[serde(rename = "ref")]
    pub reference: BatchRef,

    /// New purchased quantity.
    pub qty: u32,
}

impl ChangeBatchQuantity {
    /// Creates a new ChangeBatchQuantity command.
    pub fn new(reference: impl Into<BatchRef>, qty: u32) -> Self {
        Self {
            reference: reference.into(),
            qty,
        }
    }
}

impl From<CreateBatch> for Command {
    fn from(cmd: CreateBatch) -> Self {
        Command::CreateBatch(cmd)
    }
}

impl From<Allocate> for Command {
    fn from(cmd: Allocate) -> Self {
        Command::Allocate(cmd)
    }
}

impl From<ChangeBatchQuantity> for Command {
    fn from(cmd: ChangeBatchQuantity) -> Self {
        Command::ChangeBatchQuantity(cmd)
    }
}
