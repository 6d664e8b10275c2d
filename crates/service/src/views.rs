//! Read-side queries over committed state.

use common::{BatchRef, OrderId, Sku};
use serde::{Deserialize, Serialize};
use store::ProductStore;

use crate::error::Result;

/// One batch holding a line of an order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AllocationView {
    pub sku: Sku,
    pub batchref: BatchRef,
}

/// Returns where the lines of an order are allocated, sorted by sku then batch.
pub async fn allocations<S>(orderid: &OrderId, store: &S) -> Result<Vec<AllocationView>>
where
    S: ProductStore + ?Sized,
{
    let mut views: Vec<AllocationView> = store
        .all()
        .await?
        .iter()
        .flat_map(|product| {
            product
                .allocations_for(orderid)
                .into_iter()
                .map(move |batchref| AllocationView {
                    sku: product.sku().clone(),
                    batchref: batchref.clone(),
                })
        })
        .collect();

    views.sort();
    Ok(views)
}
