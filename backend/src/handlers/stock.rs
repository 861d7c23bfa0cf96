//! Stock ledger handlers: batches, consumption, adjustments, journal

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::{
    ConsumeStockInput, CorrectCostInput, CreateBatchInput, DamageAdjustmentInput,
    ManualAdjustmentInput, ProductStockInfo, StockBatch, StockChange, StockChangeReason,
};
use crate::services::{ConsumptionService, StockBatchService, StockChangeService};
use crate::AppState;
use shared::consumption::ConsumptionPlan;

/// Create a stock batch (initial entry or restock)
pub async fn create_batch(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(input): Json<CreateBatchInput>,
) -> AppResult<(StatusCode, Json<StockBatch>)> {
    let batch = StockBatchService::new(state.db.clone())
        .create_batch(user.0.business_id, user.0.user_id, input)
        .await?;

    Ok((StatusCode::CREATED, Json(batch)))
}

/// List a product's batches that still have stock, oldest first
pub async fn get_available_batches(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<Vec<StockBatch>>> {
    let batches = StockBatchService::new(state.db.clone())
        .get_available_batches(user.0.business_id, product_id)
        .await?;

    Ok(Json(batches))
}

/// Aggregated stock position for a product
pub async fn get_product_stock_info(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ProductStockInfo>> {
    let info = StockBatchService::new(state.db.clone())
        .get_product_stock_info(user.0.business_id, product_id)
        .await?;

    Ok(Json(info))
}

/// Correct a batch's cost price
pub async fn correct_cost_price(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(batch_id): Path<Uuid>,
    Json(input): Json<CorrectCostInput>,
) -> AppResult<Json<StockBatch>> {
    let batch = StockBatchService::new(state.db.clone())
        .correct_cost_price(user.0.business_id, user.0.user_id, batch_id, input)
        .await?;

    Ok(Json(batch))
}

/// Consume stock for a sale or equivalent outflow
pub async fn consume_stock(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(input): Json<ConsumeStockInput>,
) -> AppResult<Json<ConsumptionPlan>> {
    let result = ConsumptionService::new(state.db.clone())
        .consume_stock(user.0.business_id, user.0.user_id, input)
        .await?;

    Ok(Json(result))
}

/// Apply a manual operator adjustment against a batch
pub async fn adjust_stock_manually(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(input): Json<ManualAdjustmentInput>,
) -> AppResult<Json<StockChange>> {
    let entry = StockChangeService::new(state.db.clone())
        .adjust_stock_manually(user.0.business_id, user.0.user_id, input)
        .await?;

    Ok(Json(entry))
}

/// Write off damaged units from a batch
pub async fn adjust_stock_for_damage(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(input): Json<DamageAdjustmentInput>,
) -> AppResult<Json<StockChange>> {
    let entry = StockChangeService::new(state.db.clone())
        .adjust_stock_for_damage(user.0.business_id, user.0.user_id, input)
        .await?;

    Ok(Json(entry))
}

/// Query parameters for the journal listing
#[derive(Debug, Deserialize)]
pub struct ChangesQuery {
    pub reason: Option<StockChangeReason>,
}

/// List a product's journal entries, newest first
pub async fn get_stock_changes(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(product_id): Path<Uuid>,
    Query(query): Query<ChangesQuery>,
) -> AppResult<Json<Vec<StockChange>>> {
    let changes = StockChangeService::new(state.db.clone())
        .get_changes(user.0.business_id, product_id, query.reason)
        .await?;

    Ok(Json(changes))
}
