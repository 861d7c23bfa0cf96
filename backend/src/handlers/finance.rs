//! Supplier debt ledger handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::FinanceEntry;
use crate::services::FinanceService;
use crate::AppState;

/// List a supplier's ledger entries
pub async fn list_supplier_entries(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(supplier_id): Path<Uuid>,
) -> AppResult<Json<Vec<FinanceEntry>>> {
    let entries = FinanceService::new(state.db.clone())
        .list_supplier_entries(user.0.business_id, supplier_id)
        .await?;

    Ok(Json(entries))
}

/// Outstanding balance response
#[derive(Serialize)]
pub struct SupplierBalance {
    pub supplier_id: Uuid,
    pub balance: Decimal,
}

/// Outstanding balance owed to a supplier
pub async fn get_supplier_balance(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(supplier_id): Path<Uuid>,
) -> AppResult<Json<SupplierBalance>> {
    let balance = FinanceService::new(state.db.clone())
        .supplier_balance(user.0.business_id, supplier_id)
        .await?;

    Ok(Json(SupplierBalance {
        supplier_id,
        balance,
    }))
}

/// Soft-delete a ledger entry
pub async fn delete_entry(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(entry_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    FinanceService::new(state.db.clone())
        .soft_delete_entry(user.0.business_id, entry_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
