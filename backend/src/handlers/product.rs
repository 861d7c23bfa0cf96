//! Product catalog handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::models::{CreateProductInput, Product};
use crate::services::ProductService;
use crate::AppState;
use shared::types::{PaginatedResponse, Pagination};

/// Create a new product
pub async fn create_product(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(input): Json<CreateProductInput>,
) -> AppResult<(StatusCode, Json<Product>)> {
    let product = ProductService::new(state.db.clone())
        .create_product(user.0.business_id, input)
        .await?;

    Ok((StatusCode::CREATED, Json(product)))
}

/// List products for the current business
pub async fn list_products(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<PaginatedResponse<Product>>> {
    let products = ProductService::new(state.db.clone())
        .list_products(user.0.business_id, pagination)
        .await?;

    Ok(Json(products))
}

/// Get a single product
pub async fn get_product(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<Product>> {
    let product = ProductService::new(state.db.clone())
        .get_product(user.0.business_id, product_id)
        .await?;

    Ok(Json(product))
}

/// Soft-delete a product
pub async fn delete_product(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    ProductService::new(state.db.clone())
        .delete_product(user.0.business_id, product_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
