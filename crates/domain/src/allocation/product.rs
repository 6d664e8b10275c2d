//! Product aggregate implementation.

use common::{BatchRef, OrderId, Sku, Version};
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;
use crate::error::{DomainError, Result};

use super::{Batch, Event, OrderLine};

/// Product aggregate root.
///
/// Owns every batch of one SKU and is the only way to allocate order lines
/// against them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Product identity.
    sku: Sku,

    /// Batches in the order they were added.
    batches: Vec<Batch>,

    /// Current version for optimistic concurrency.
    #[serde(default)]
    version_number: Version,

    /// Events raised since the last drain.
    #[serde(skip)]
    events: Vec<Event>,
}

impl Aggregate for Product {
    type Id = Sku;
    type Event = Event;

    fn aggregate_type() -> &'static str {
        "Product"
    }

    fn id(&self) -> &Sku {
        &self.sku
    }

    fn version(&self) -> Version {
        self.version_number
    }

    fn pending_events(&self) -> &[Event] {
        &self.events
    }

    fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}

// Query methods
impl Product {
    /// Creates a product at the initial version.
    pub fn new(sku: impl Into<Sku>, batches: Vec<Batch>) -> Self {
        Self {
            sku: sku.into(),
            batches,
            version_number: Version::initial(),
            events: Vec::new(),
        }
    }

    /// Returns the product SKU.
    pub fn sku(&self) -> &Sku {
        &self.sku
    }

    /// Returns the current version number.
    pub fn version_number(&self) -> Version {
        self.version_number
    }

    /// Returns all batches in the order they were added.
    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    /// Returns the batch with the given reference.
    pub fn batch(&self, reference: &BatchRef) -> Option<&Batch> {
        self.batches.iter().find(|b| b.reference() == reference)
    }

    /// Returns true if the product holds a batch with the given reference.
    pub fn has_batch(&self, reference: &BatchRef) -> bool {
        self.batch(reference).is_some()
    }

    /// Returns the references of the batches holding lines of an order.
    pub fn allocations_for(&self, orderid: &OrderId) -> Vec<&BatchRef> {
        self.batches
            .iter()
            .filter(|b| b.allocations().any(|line| &line.orderid == orderid))
            .map(Batch::reference)
            .collect()
    }
}

// Command methods
impl Product {
    /// Adds a new batch to the product.
    pub fn add_batch(&mut self, batch: Batch) -> Result<()> {
        if batch.sku() != &self.sku {
            return Err(DomainError::SkuMismatch {
                reference: batch.reference().clone(),
                batch_sku: batch.sku().clone(),
                product_sku: self.sku.clone(),
            });
        }

        if self.has_batch(batch.reference()) {
            return Err(DomainError::DuplicateBatch {
                reference: batch.reference().clone(),
            });
        }

        self.batches.push(batch);
        Ok(())
    }

    /// Allocates the line to the earliest batch that can hold it.
    ///
    /// Batches already in stock come before any batch with an ETA, then
    /// earlier ETAs win. A line that is already allocated keeps its batch.
    /// Records `Allocated` on success and `OutOfStock` when nothing fits.
    pub fn allocate(&mut self, line: OrderLine) -> Result<BatchRef> {
        if line.qty == 0 {
            return Err(DomainError::InvalidQuantity { quantity: line.qty });
        }

        if let Some(batch) = self.batches.iter().find(|b| b.is_allocated(&line)) {
            return Ok(batch.reference().clone());
        }

        let mut candidates: Vec<usize> = (0..self.batches.len())
            .filter(|&i| self.batches[i].sku() == &line.sku)
            .collect();
        candidates.sort_by_key(|&i| self.batches[i].eta());

        let Some(index) = candidates
            .into_iter()
            .find(|&i| self.batches[i].can_allocate(&line))
        else {
            self.events.push(Event::out_of_stock(line.sku.clone()));
            return Err(DomainError::OutOfStock { sku: line.sku });
        };

        let batch = &mut self.batches[index];
        batch.allocate(line.clone());
        let batchref = batch.reference().clone();

        self.version_number = self.version_number.next();
        self.events.push(Event::allocated(&line, batchref.clone()));

        Ok(batchref)
    }

    /// Sets a batch's purchased quantity, releasing lines until it fits.
    ///
    /// Lines are released most recent first. Each released line is recorded
    /// as `Deallocated` followed by `AllocationRequired`.
    pub fn change_batch_quantity(&mut self, reference: &BatchRef, qty: u32) -> Result<()> {
        let batch = self
            .batches
            .iter_mut()
            .find(|b| b.reference() == reference)
            .ok_or_else(|| DomainError::UnknownBatch {
                reference: reference.clone(),
            })?;

        batch.set_purchased_quantity(qty);

        while batch.available_quantity() < 0 {
            let Some(line) = batch.deallocate_one() else {
                break;
            };
            self.events.push(Event::deallocated(&line));
            self.events.push(Event::allocation_required(&line));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Days, NaiveDate};

    use super::*;
    use crate::allocation::events::EventKind;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn tomorrow() -> NaiveDate {
        today().checked_add_days(Days::new(1)).unwrap()
    }

    fn later() -> NaiveDate {
        today().checked_add_days(Days::new(10)).unwrap()
    }

    fn available(product: &Product, reference: &str) -> i64 {
        product
            .batch(&BatchRef::new(reference))
            .unwrap()
            .available_quantity()
    }

    #[test]
    fn test_prefers_warehouse_batches_to_shipments() {
        let mut product = Product::new(
            "RETRO-CLOCK",
            vec![
                Batch::new("shipment-batch", "RETRO-CLOCK", 100, Some(tomorrow())),
                Batch::new("in-stock-batch", "RETRO-CLOCK", 100, None),
            ],
        );

        let batchref = product
            .allocate(OrderLine::new("oref", "RETRO-CLOCK", 10))
            .unwrap();

        assert_eq!(batchref.as_str(), "in-stock-batch");
        assert_eq!(available(&product, "in-stock-batch"), 90);
        assert_eq!(available(&product, "shipment-batch"), 100);
    }

    #[test]
    fn test_prefers_earlier_batches() {
        let mut product = Product::new(
            "MINIMALIST-SPOON",
            vec![
                Batch::new("slow", "MINIMALIST-SPOON", 100, Some(later())),
                Batch::new("normal", "MINIMALIST-SPOON", 100, Some(tomorrow())),
                Batch::new("speedy", "MINIMALIST-SPOON", 100, Some(today())),
            ],
        );

        product
            .allocate(OrderLine::new("order1", "MINIMALIST-SPOON", 10))
            .unwrap();

        assert_eq!(available(&product, "speedy"), 90);
        assert_eq!(available(&product, "normal"), 100);
        assert_eq!(available(&product, "slow"), 100);
    }

    #[test]
    fn test_skips_batches_that_are_too_small() {
        let mut product = Product::new(
            "HIGHBROW-POSTER",
            vec![
                Batch::new("tiny", "HIGHBROW-POSTER", 5, None),
                Batch::new("big", "HIGHBROW-POSTER", 100, Some(later())),
            ],
        );

        let batchref = product
            .allocate(OrderLine::new("order1", "HIGHBROW-POSTER", 10))
            .unwrap();

        assert_eq!(batchref.as_str(), "big");
    }

    #[test]
    fn test_returns_allocated_batch_ref_and_records_event() {
        let mut product = Product::new(
            "HIGHBROW-POSTER",
            vec![Batch::new("in-stock", "HIGHBROW-POSTER", 100, None)],
        );
        let line = OrderLine::new("oref", "HIGHBROW-POSTER", 10);

        let batchref = product.allocate(line.clone()).unwrap();

        assert_eq!(batchref.as_str(), "in-stock");
        assert_eq!(
            product.pending_events(),
            &[Event::allocated(&line, BatchRef::new("in-stock"))]
        );
    }

    #[test]
    fn test_out_of_stock_fails_and_records_event() {
        let mut product = Product::new(
            "SMALL-FORK",
            vec![Batch::new("batch1", "SMALL-FORK", 10, None)],
        );
        product
            .allocate(OrderLine::new("order1", "SMALL-FORK", 10))
            .unwrap();
        product.take_events();

        let result = product.allocate(OrderLine::new("order2", "SMALL-FORK", 1));

        assert_eq!(
            result,
            Err(DomainError::OutOfStock {
                sku: Sku::new("SMALL-FORK")
            })
        );
        assert_eq!(product.pending_events(), &[Event::out_of_stock("SMALL-FORK")]);
    }

    #[test]
    fn test_out_of_stock_when_no_batches() {
        let mut product = Product::new("EMPTY-SHELF", vec![]);
        let result = product.allocate(OrderLine::new("order1", "EMPTY-SHELF", 1));
        assert!(matches!(result, Err(DomainError::OutOfStock { .. })));
        assert_eq!(product.version_number(), Version::initial());
    }

    #[test]
    fn test_increments_version_number() {
        let mut product = Product::new("SCANDI-PEN", vec![Batch::new("b1", "SCANDI-PEN", 100, None)]);
        product.allocate(OrderLine::new("o1", "SCANDI-PEN", 10)).unwrap();
        product.allocate(OrderLine::new("o2", "SCANDI-PEN", 10)).unwrap();
        assert_eq!(product.version_number(), Version::new(2));
    }

    #[test]
    fn test_allocating_same_line_twice_is_a_noop() {
        let mut product = Product::new(
            "ANGULAR-DESK",
            vec![
                Batch::new("exact", "ANGULAR-DESK", 10, None),
                Batch::new("spare", "ANGULAR-DESK", 10, Some(later())),
            ],
        );
        let line = OrderLine::new("o1", "ANGULAR-DESK", 10);

        let first = product.allocate(line.clone()).unwrap();
        product.take_events();
        let second = product.allocate(line).unwrap();

        assert_eq!(first, second);
        assert_eq!(available(&product, "exact"), 0);
        assert_eq!(available(&product, "spare"), 10);
        assert_eq!(product.version_number(), Version::new(1));
        assert!(product.pending_events().is_empty());
    }

    #[test]
    fn test_zero_quantity_line_is_rejected() {
        let mut product = Product::new("LAMP", vec![Batch::new("b1", "LAMP", 10, None)]);
        let result = product.allocate(OrderLine::new("o1", "LAMP", 0));
        assert_eq!(result, Err(DomainError::InvalidQuantity { quantity: 0 }));
        assert!(product.pending_events().is_empty());
    }

    #[test]
    fn test_add_batch_rejects_other_sku_and_duplicates() {
        let mut product = Product::new("LAMP", vec![Batch::new("b1", "LAMP", 10, None)]);

        let result = product.add_batch(Batch::new("b2", "TABLE", 10, None));
        assert!(matches!(result, Err(DomainError::SkuMismatch { .. })));

        let result = product.add_batch(Batch::new("b1", "LAMP", 5, None));
        assert!(matches!(result, Err(DomainError::DuplicateBatch { .. })));

        product.add_batch(Batch::new("b2", "LAMP", 5, None)).unwrap();
        assert_eq!(product.batches().len(), 2);
    }

    #[test]
    fn test_change_quantity_without_overflow_raises_nothing() {
        let mut product = Product::new("LAMP", vec![Batch::new("b1", "LAMP", 100, None)]);
        product.allocate(OrderLine::new("o1", "LAMP", 10)).unwrap();
        product.take_events();

        product.change_batch_quantity(&BatchRef::new("b1"), 50).unwrap();

        assert_eq!(available(&product, "b1"), 40);
        assert!(product.pending_events().is_empty());
    }

    #[test]
    fn test_change_quantity_releases_latest_lines_first() {
        let mut product = Product::new(
            "INDIFFERENT-TABLE",
            vec![
                Batch::new("batch1", "INDIFFERENT-TABLE", 50, None),
                Batch::new("batch2", "INDIFFERENT-TABLE", 50, Some(today())),
            ],
        );
        product
            .allocate(OrderLine::new("order1", "INDIFFERENT-TABLE", 20))
            .unwrap();
        product
            .allocate(OrderLine::new("order2", "INDIFFERENT-TABLE", 20))
            .unwrap();
        product.take_events();

        product
            .change_batch_quantity(&BatchRef::new("batch1"), 25)
            .unwrap();

        let released = OrderLine::new("order2", "INDIFFERENT-TABLE", 20);
        assert_eq!(available(&product, "batch1"), 5);
        assert_eq!(
            product.pending_events(),
            &[
                Event::deallocated(&released),
                Event::allocation_required(&released)
            ]
        );
    }

    #[test]
    fn test_change_quantity_releases_enough_lines() {
        let mut product = Product::new("LAMP", vec![Batch::new("b1", "LAMP", 30, None)]);
        for (order, qty) in [("o1", 10), ("o2", 10), ("o3", 10)] {
            product.allocate(OrderLine::new(order, "LAMP", qty)).unwrap();
        }
        product.take_events();

        product.change_batch_quantity(&BatchRef::new("b1"), 5).unwrap();

        let required: Vec<_> = product
            .pending_events()
            .iter()
            .filter(|e| e.kind() == EventKind::AllocationRequired)
            .collect();
        assert_eq!(required.len(), 3);
        assert_eq!(available(&product, "b1"), 5);
    }

    #[test]
    fn test_change_quantity_of_unknown_batch_fails() {
        let mut product = Product::new("LAMP", vec![]);
        let result = product.change_batch_quantity(&BatchRef::new("nope"), 5);
        assert!(matches!(result, Err(DomainError::UnknownBatch { .. })));
    }

    #[test]
    fn test_allocated_never_exceeds_purchased() {
        let mut product = Product::new(
            "STURDY-STOOL",
            vec![
                Batch::new("b1", "STURDY-STOOL", 40, None),
                Batch::new("b2", "STURDY-STOOL", 40, Some(tomorrow())),
            ],
        );

        for step in 0..40u32 {
            let orderid = format!("order-{step}");
            let _ = product.allocate(OrderLine::new(orderid, "STURDY-STOOL", step % 7 + 1));
            if step % 5 == 0 {
                let target = if step % 2 == 0 { "b1" } else { "b2" };
                product
                    .change_batch_quantity(&BatchRef::new(target), 40 - step % 30)
                    .unwrap();
            }

            for batch in product.batches() {
                assert!(batch.allocated_quantity() <= i64::from(batch.purchased_quantity()));
            }
        }
    }

    #[test]
    fn test_allocations_for_order() {
        let mut product = Product::new(
            "LAMP",
            vec![
                Batch::new("b1", "LAMP", 10, None),
                Batch::new("b2", "LAMP", 10, Some(later())),
            ],
        );
        product.allocate(OrderLine::new("o1", "LAMP", 10)).unwrap();
        product.allocate(OrderLine::new("o2", "LAMP", 5)).unwrap();

        let o1 = OrderId::new("o1");
        assert_eq!(product.allocations_for(&o1), vec![&BatchRef::new("b1")]);
    }

    #[test]
    fn test_serialization_skips_pending_events() {
        let mut product = Product::new("LAMP", vec![Batch::new("b1", "LAMP", 10, None)]);
        product.allocate(OrderLine::new("o1", "LAMP", 3)).unwrap();

        let json = serde_json::to_string(&product).unwrap();
        let deserialized: Product = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.version_number(), Version::new(1));
        assert_eq!(available(&deserialized, "b1"), 7);
        assert!(deserialized.pending_events().is_empty());
    }
}
