//! Product catalog service
//!
//! Products carry a denormalized aggregate `stock` counter for fast list
//! views. The counter is maintained by the batch and consumption services;
//! batches remain the source of truth.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{ConsumptionMethod, CreateProductInput, Product};
use crate::services::finance::FinanceService;
use shared::types::{PaginatedResponse, Pagination, PaginationMeta};

/// Product catalog service
#[derive(Clone)]
pub struct ProductService {
    db: PgPool,
}

#[derive(Debug, FromRow)]
struct ProductRow {
    id: Uuid,
    business_id: Uuid,
    name: String,
    stock: i64,
    consumption_method: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            business_id: row.business_id,
            name: row.name,
            stock: row.stock,
            consumption_method: ConsumptionMethod::from_str(&row.consumption_method)
                .unwrap_or_default(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const PRODUCT_COLUMNS: &str =
    "id, business_id, name, stock, consumption_method, created_at, updated_at";

impl ProductService {
    /// Create a new ProductService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a product with zero stock
    pub async fn create_product(
        &self,
        business_id: Uuid,
        input: CreateProductInput,
    ) -> AppResult<Product> {
        input.validate()?;

        let method = input.consumption_method.unwrap_or_default();

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            INSERT INTO products (business_id, name, stock, consumption_method)
            VALUES ($1, $2, 0, $3)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(business_id)
        .bind(&input.name)
        .bind(method.as_str())
        .fetch_one(&self.db)
        .await?;

        tracing::info!(product_id = %row.id, name = %input.name, "Product created");

        Ok(row.into())
    }

    /// Get a product by id
    pub async fn get_product(&self, business_id: Uuid, product_id: Uuid) -> AppResult<Product> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE id = $1 AND business_id = $2 AND is_deleted = FALSE
            "#
        ))
        .bind(product_id)
        .bind(business_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        Ok(row.into())
    }

    /// List products for a business, newest first
    pub async fn list_products(
        &self,
        business_id: Uuid,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<Product>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products WHERE business_id = $1 AND is_deleted = FALSE",
        )
        .bind(business_id)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE business_id = $1 AND is_deleted = FALSE
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(business_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse {
            data: rows.into_iter().map(Product::from).collect(),
            pagination: PaginationMeta::new(pagination.page, pagination.per_page, total),
        })
    }

    /// Soft-delete a product and cascade the soft delete to any supplier
    /// debt entries tied to its batches. Batch and journal history stays.
    pub async fn delete_product(&self, business_id: Uuid, product_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let affected = sqlx::query(
            "UPDATE products SET is_deleted = TRUE, updated_at = NOW() \
             WHERE id = $1 AND business_id = $2 AND is_deleted = FALSE",
        )
        .bind(product_id)
        .bind(business_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if affected == 0 {
            return Err(AppError::NotFound("Product".to_string()));
        }

        FinanceService::soft_delete_for_product(&mut tx, business_id, product_id).await?;

        tx.commit().await?;

        tracing::info!(product_id = %product_id, "Product deleted");

        Ok(())
    }
}
