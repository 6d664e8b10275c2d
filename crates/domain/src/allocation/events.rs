//! Allocation domain events.

use chrono::NaiveDate;
use common::{BatchRef, OrderId, Sku};
use serde::{Deserialize, Serialize};

use super::OrderLine;

/// Facts raised by the allocation domain or reported by collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    /// A batch was created upstream.
    BatchCreated(BatchCreatedData),

    /// A batch's purchased quantity was changed upstream.
    BatchQuantityChanged(BatchQuantityChangedData),

    /// An order line needs (re)allocation.
    AllocationRequired(AllocationRequiredData),

    /// An order line was allocated to a batch.
    Allocated(AllocatedData),

    /// An order line was released from its batch.
    Deallocated(DeallocatedData),

    /// No batch could satisfy an order line.
    OutOfStock(OutOfStockData),
}

/// Discriminant of [`Event`], used to key handler registrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    BatchCreated,
    BatchQuantityChanged,
    AllocationRequired,
    Allocated,
    Deallocated,
    OutOfStock,
}

impl EventKind {
    /// Returns the stable event type name.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::BatchCreated => "BatchCreated",
            EventKind::BatchQuantityChanged => "BatchQuantityChanged",
            EventKind::AllocationRequired => "AllocationRequired",
            EventKind::Allocated => "Allocated",
            EventKind::Deallocated => "Deallocated",
            EventKind::OutOfStock => "OutOfStock",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Event {
    /// Returns the kind of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::BatchCreated(_) => EventKind::BatchCreated,
            Event::BatchQuantityChanged(_) => EventKind::BatchQuantityChanged,
            Event::AllocationRequired(_) => EventKind::AllocationRequired,
            Event::Allocated(_) => EventKind::Allocated,
            Event::Deallocated(_) => EventKind::Deallocated,
            Event::OutOfStock(_) => EventKind::OutOfStock,
        }
    }

    /// Returns the event type name.
    pub fn event_type(&self) -> &'static str {
        self.kind().as_str()
    }
}

/// Data for BatchCreated event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchCreatedData {
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

/// Data for BatchQuantityChanged event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchQuantityChangedData {
    /// The batch whose quantity changed.
    #[serde(rename = "ref")]
    pub reference: BatchRef,

    /// New purchased quantity.
    pub qty: u32,
}

/// Data for AllocationRequired event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationRequiredData {
    pub orderid: OrderId,
    pub sku: Sku,
    pub qty: u32,
}

/// Data for Allocated event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocatedData {
    pub orderid: OrderId,
    pub sku: Sku,
    pub qty: u32,

    /// The batch the line was allocated to.
    pub batchref: BatchRef,
}

/// Data for Deallocated event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeallocatedData {
    pub orderid: OrderId,
    pub sku: Sku,
    pub qty: u32,
}

/// Data for OutOfStock event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutOfStockData {
    pub sku: Sku,
}

impl AllocationRequiredData {
    /// Returns the order line that needs allocating.
    pub fn line(&self) -> OrderLine {
        OrderLine::new(self.orderid.clone(), self.sku.clone(), self.qty)
    }
}

// Convenience constructors for events
impl Event {
    /// Creates a BatchCreated event.
    pub fn batch_created(
        reference: impl Into<BatchRef>,
        sku: impl Into<Sku>,
        qty: u32,
        eta: Option<NaiveDate>,
    ) -> Self {
        Event::BatchCreated(BatchCreatedData {
            reference: reference.into(),
            sku: sku.into(),
            qty,
            eta,
        })
    }

    /// Creates a BatchQuantityChanged event.
    pub fn batch_quantity_changed(reference: impl Into<BatchRef>, qty: u32) -> Self {
        Event::BatchQuantityChanged(BatchQuantityChangedData {
            reference: reference.into(),
            qty,
        })
    }

    /// Creates an AllocationRequired event for a line.
    pub fn allocation_required(line: &OrderLine) -> Self {
        Event::AllocationRequired(AllocationRequiredData {
            orderid: line.orderid.clone(),
            sku: line.sku.clone(),
            qty: line.qty,
        })
    }

    /// Creates an Allocated event.
    pub fn allocated(line: &OrderLine, batchref: BatchRef) -> Self {
        Event::Allocated(AllocatedData {
            orderid: line.orderid.clone(),
            sku: line.sku.clone(),
            qty: line.qty,
            batchref,
        })
    }

    /// Creates a Deallocated event.
    pub fn deallocated(line: &OrderLine) -> Self {
        Event::Deallocated(DeallocatedData {
            orderid: line.orderid.clone(),
            sku: line.sku.clone(),
            qty: line.qty,
        })
    }

    /// Creates an OutOfStock event.
    pub fn out_of_stock(sku: impl Into<Sku>) -> Self {
        Event::OutOfStock(OutOfStockData { sku: sku.into() })
    }
}
