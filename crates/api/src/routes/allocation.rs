//! Allocation endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::NaiveDate;
use common::{BatchRef, OrderId, Sku};
use domain::{Allocate, CreateBatch, Message};
use serde::{Deserialize, Serialize};
use service::{
    AllocationView, CHANGE_BATCH_QUANTITY_CHANNEL, MessageBus, StoreUnitOfWork, command_from_broker,
};
use store::ProductStore;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: ProductStore> {
    pub bus: MessageBus<StoreUnitOfWork<S>>,
    pub store: S,
}

impl<S: ProductStore + Clone> AppState<S> {
    /// Runs one message through the bus in a fresh unit of work.
    async fn dispatch(&self, message: Message) -> Result<Vec<service::CommandOutcome>, ApiError> {
        let mut uow = StoreUnitOfWork::new(self.store.clone());
        Ok(self.bus.handle(message, &mut uow).await?)
    }
}

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct AddBatchRequest {
    #[serde(rename = "ref")]
    pub reference: BatchRef,
    pub sku: Sku,
    pub qty: u32,
    pub eta: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct AllocateRequest {
    pub orderid: OrderId,
    pub sku: Sku,
    pub qty: u32,
}

// -- Response types --

#[derive(Serialize)]
pub struct AllocateResponse {
    pub batchref: BatchRef,
}

// -- Handlers --

/// POST /add_batch: add a batch of stock.
#[tracing::instrument(skip(state))]
pub async fn add_batch<S: ProductStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<AddBatchRequest>,
) -> Result<StatusCode, ApiError> {
    let cmd = CreateBatch::new(req.reference, req.sku, req.qty, req.eta);
    state.dispatch(Message::Command(cmd.into())).await?;
    Ok(StatusCode::CREATED)
}

/// POST /allocate: allocate an order line and return the chosen batch.
#[tracing::instrument(skip(state))]
pub async fn allocate<S: ProductStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<AllocateRequest>,
) -> Result<(StatusCode, Json<AllocateResponse>), ApiError> {
    let cmd = Allocate::new(req.orderid, req.sku, req.qty);
    let results = state.dispatch(Message::Command(cmd.into())).await?;

    let batchref = results
        .first()
        .and_then(|outcome| outcome.batchref())
        .cloned()
        .ok_or_else(|| ApiError::Internal("Allocation returned no batch".to_string()))?;

    Ok((StatusCode::CREATED, Json(AllocateResponse { batchref })))
}

/// POST /change_batch_quantity: apply an upstream batch quantity change.
#[tracing::instrument(skip(state))]
pub async fn change_batch_quantity<S: ProductStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(payload): Json<serde_json::Value>,
) -> Result<StatusCode, ApiError> {
    let cmd = command_from_broker(CHANGE_BATCH_QUANTITY_CHANNEL, &payload)?;
    state.dispatch(Message::Command(cmd)).await?;
    Ok(StatusCode::OK)
}

/// GET /allocations/{orderid}: list where an order's lines are allocated.
#[tracing::instrument(skip(state))]
pub async fn allocations<S: ProductStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(orderid): Path<String>,
) -> Result<Json<Vec<AllocationView>>, ApiError> {
    let views = service::allocations(&OrderId::new(orderid), &state.store).await?;
    if views.is_empty() {
        return Err(ApiError::NotFound("not found".to_string()));
    }
    Ok(Json(views))
}
