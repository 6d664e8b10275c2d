//! Batch entity.

use chrono::NaiveDate;
use common::{BatchRef, Sku};
use serde::{Deserialize, Serialize};

use super::OrderLine;

/// A purchasable lot of stock for one SKU.
///
/// A batch without an `eta` is already in the warehouse. Batches are
/// identified by their reference; two batches with the same reference are
/// the same batch regardless of their allocations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    reference: BatchRef,
    sku: Sku,
    purchased_quantity: u32,
    eta: Option<NaiveDate>,

    /// Allocated lines in allocation order, each line at most once.
    allocations: Vec<OrderLine>,
}

impl Batch {
    /// Creates a new batch with no allocations.
    pub fn new(
        reference: impl Into<BatchRef>,
        sku: impl Into<Sku>,
        purchased_quantity: u32,
        eta: Option<NaiveDate>,
    ) -> Self {
        Self {
            reference: reference.into(),
            sku: sku.into(),
            purchased_quantity,
            eta,
            allocations: Vec::new(),
        }
    }

    /// Returns the batch reference.
    pub fn reference(&self) -> &BatchRef {
        &self.reference
    }

    /// Returns the SKU held by this batch.
    pub fn sku(&self) -> &Sku {
        &self.sku
    }

    /// Returns the expected arrival date, `None` when already in stock.
    pub fn eta(&self) -> Option<NaiveDate> {
        self.eta
    }

    /// Returns the quantity bought for this batch.
    pub fn purchased_quantity(&self) -> u32 {
        self.purchased_quantity
    }

    /// Returns the allocated lines in allocation order.
    pub fn allocations(&self) -> impl Iterator<Item = &OrderLine> {
        self.allocations.iter()
    }

    /// Returns the total quantity allocated to order lines.
    pub fn allocated_quantity(&self) -> i64 {
        self.allocations.iter().map(|line| i64::from(line.qty)).sum()
    }

    /// Returns the quantity still free for allocation.
    ///
    /// Negative only while a quantity reduction is being resolved.
    pub fn available_quantity(&self) -> i64 {
        i64::from(self.purchased_quantity) - self.allocated_quantity()
    }

    /// Returns true if the line is already allocated to this batch.
    pub fn is_allocated(&self, line: &OrderLine) -> bool {
        self.allocations.contains(line)
    }

    /// Returns true if the line matches this batch's SKU and fits in the
    /// available quantity.
    pub fn can_allocate(&self, line: &OrderLine) -> bool {
        self.sku == line.sku && self.available_quantity() >= i64::from(line.qty)
    }

    /// Records the line against this batch. Allocating a line twice is a no-op.
    pub(crate) fn allocate(&mut self, line: OrderLine) {
        if !self.is_allocated(&line) {
            self.allocations.push(line);
        }
    }

    /// Releases the most recently allocated line.
    pub(crate) fn deallocate_one(&mut self) -> Option<OrderLine> {
        self.allocations.pop()
    }

    pub(crate) fn set_purchased_quantity(&mut self, qty: u32) {
        self.purchased_quantity = qty;
    }
}

impl PartialEq for Batch {
    fn eq(&self, other: &Self) -> bool {
        self.reference == other.reference
    }
}

impl Eq for Batch {}

impl std::hash::Hash for Batch {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.reference.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch_and_line(sku: &str, batch_qty: u32, line_qty: u32) -> (Batch, OrderLine) {
        (
            Batch::new("batch-001", sku, batch_qty, None),
            OrderLine::new("order-123", sku, line_qty),
        )
    }

    #[test]
    fn allocating_reduces_available_quantity() {
        let (mut batch, line) = batch_and_line("SMALL-TABLE", 20, 2);
        batch.allocate(line);
        assert_eq!(batch.available_quantity(), 18);
        assert_eq!(batch.allocated_quantity(), 2);
    }

    #[test]
    fn can_allocate_if_available_greater_than_required() {
        let (batch, line) = batch_and_line("ELEGANT-LAMP", 20, 2);
        assert!(batch.can_allocate(&line));
    }

    #[test]
    fn cannot_allocate_if_available_smaller_than_required() {
        let (batch, line) = batch_and_line("ELEGANT-LAMP", 2, 20);
        assert!(!batch.can_allocate(&line));
    }

    #[test]
    fn can_allocate_if_available_equal_to_required() {
        let (batch, line) = batch_and_line("ELEGANT-LAMP", 2, 2);
        assert!(batch.can_allocate(&line));
    }

    #[test]
    fn cannot_allocate_if_skus_do_not_match() {
        let batch = Batch::new("batch-001", "UNCOMFORTABLE-CHAIR", 100, None);
        let line = OrderLine::new("order-123", "EXPENSIVE-TOASTER", 10);
        assert!(!batch.can_allocate(&line));
    }

    #[test]
    fn allocation_is_idempotent() {
        let (mut batch, line) = batch_and_line("ANGULAR-DESK", 20, 2);
        batch.allocate(line.clone());
        batch.allocate(line);
        assert_eq!(batch.available_quantity(), 18);
        assert_eq!(batch.allocations().count(), 1);
    }

    #[test]
    fn deallocate_one_releases_latest_line() {
        let mut batch = Batch::new("batch-001", "DECORATIVE-TRINKET", 20, None);
        batch.allocate(OrderLine::new("order-a", "DECORATIVE-TRINKET", 5));
        batch.allocate(OrderLine::new("order-b", "DECORATIVE-TRINKET", 3));

        let released = batch.deallocate_one().unwrap();
        assert_eq!(released.orderid.as_str(), "order-b");
        assert_eq!(batch.available_quantity(), 15);
    }

    #[test]
    fn lowering_purchased_quantity_can_go_negative() {
        let (mut batch, line) = batch_and_line("FLIMSY-DESK", 10, 8);
        batch.allocate(line);
        batch.set_purchased_quantity(5);
        assert_eq!(batch.available_quantity(), -3);
    }

    #[test]
    fn batches_are_equal_by_reference() {
        let a = Batch::new("batch-001", "LAMP", 10, None);
        let b = Batch::new("batch-001", "LAMP", 99, NaiveDate::from_ymd_opt(2030, 1, 1));
        assert_eq!(a, b);
    }
}
