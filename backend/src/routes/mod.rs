//! API route definitions

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::handlers;
use crate::middleware::auth_middleware;
use crate::AppState;

/// All /api/v1 routes. Ledger routes require authentication; the health
/// check stays public.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/products", product_routes())
        .nest("/stock", stock_routes())
        .nest("/finance", finance_routes())
        .route_layer(axum_middleware::from_fn(auth_middleware))
        .route("/health", get(handlers::health::health))
}

fn product_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(handlers::product::create_product).get(handlers::product::list_products),
        )
        .route(
            "/:product_id",
            get(handlers::product::get_product).delete(handlers::product::delete_product),
        )
}

fn stock_routes() -> Router<AppState> {
    Router::new()
        .route("/batches", post(handlers::stock::create_batch))
        .route(
            "/batches/:batch_id/cost",
            put(handlers::stock::correct_cost_price),
        )
        .route(
            "/products/:product_id/batches",
            get(handlers::stock::get_available_batches),
        )
        .route(
            "/products/:product_id/info",
            get(handlers::stock::get_product_stock_info),
        )
        .route(
            "/products/:product_id/changes",
            get(handlers::stock::get_stock_changes),
        )
        .route("/consume", post(handlers::stock::consume_stock))
        .route(
            "/adjustments/manual",
            post(handlers::stock::adjust_stock_manually),
        )
        .route(
            "/adjustments/damage",
            post(handlers::stock::adjust_stock_for_damage),
        )
}

fn finance_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/suppliers/:supplier_id/entries",
            get(handlers::finance::list_supplier_entries),
        )
        .route(
            "/suppliers/:supplier_id/balance",
            get(handlers::finance::get_supplier_balance),
        )
        .route("/entries/:entry_id", delete(handlers::finance::delete_entry))
}
