//! Order line value object.

use common::{OrderId, Sku};
use serde::{Deserialize, Serialize};

/// A request for `qty` units of `sku` on behalf of an order.
///
/// Order lines have no identity beyond their fields: two lines with the same
/// order id, sku and quantity are the same line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderLine {
    /// The order this line belongs to.
    pub orderid: OrderId,

    /// The product being ordered.
    pub sku: Sku,

    /// Units requested.
    pub qty: u32,
}

impl OrderLine {
    /// Creates a new order line.
    pub fn new(orderid: impl Into<OrderId>, sku: impl Into<Sku>, qty: u32) -> Self {
        Self {
            orderid: orderid.into(),
            sku: sku.into(),
            qty,
        }
    }
}
