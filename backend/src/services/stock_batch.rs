//! Stock batch ledger service
//!
//! Batches are the audit-safe unit of cost history: they are created on
//! initial stock entry or restock, depleted by consumption, and never
//! physically deleted. Every mutation here commits together with its
//! journal entry and any supplier debt it implies.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{
    BatchStatus, CorrectCostInput, CreateBatchInput, ProductStockInfo, StockBatch,
    StockChangeReason,
};
use crate::services::finance::FinanceService;
use crate::services::stock_change::{NewStockChange, StockChangeService};
use shared::validation::{requires_supplier_debt, supplier_debt_amount};

/// Stock batch ledger service
#[derive(Clone)]
pub struct StockBatchService {
    db: PgPool,
}

/// Row for batch queries
#[derive(Debug, FromRow)]
pub(crate) struct StockBatchRow {
    pub id: Uuid,
    pub business_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i64,
    pub remaining_quantity: i64,
    pub cost_price: Decimal,
    pub status: String,
    pub supplier_id: Option<Uuid>,
    pub is_own_purchase: bool,
    pub is_credit: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub created_by: Uuid,
}

impl From<StockBatchRow> for StockBatch {
    fn from(row: StockBatchRow) -> Self {
        StockBatch {
            id: row.id,
            business_id: row.business_id,
            product_id: row.product_id,
            quantity: row.quantity,
            remaining_quantity: row.remaining_quantity,
            cost_price: row.cost_price,
            // status values are CHECK-constrained in the schema
            status: BatchStatus::from_str(&row.status).unwrap_or(BatchStatus::Active),
            supplier_id: row.supplier_id,
            is_own_purchase: row.is_own_purchase,
            is_credit: row.is_credit,
            notes: row.notes,
            created_at: row.created_at,
            created_by: row.created_by,
        }
    }
}

const BATCH_COLUMNS: &str = "id, business_id, product_id, quantity, remaining_quantity, \
     cost_price, status, supplier_id, is_own_purchase, is_credit, notes, created_at, created_by";

impl StockBatchService {
    /// Create a new StockBatchService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a stock batch (initial entry or restock).
    ///
    /// Commits the batch row, the product counter increment, the journal
    /// entry, and any supplier debt as one transaction.
    pub async fn create_batch(
        &self,
        business_id: Uuid,
        user_id: Uuid,
        input: CreateBatchInput,
    ) -> AppResult<StockBatch> {
        // Collects every violated constraint before anything is written
        input.validate()?;

        // Debt policy: credit purchase, not own, known supplier. Priced
        // before any write; an amount outside the money range is a
        // validation failure, not a mid-transaction abort.
        let debt_amount = if requires_supplier_debt(
            input.is_credit,
            input.is_own_purchase,
            input.supplier_id,
        ) {
            let amount =
                supplier_debt_amount(input.quantity, input.cost_price).ok_or_else(|| {
                    AppError::ValidationError(
                        "Quantity times cost price exceeds the supported amount range"
                            .to_string(),
                    )
                })?;
            Some(amount)
        } else {
            None
        };

        let mut tx = self.db.begin().await?;

        // Lock the product row; the counter update below must not race a
        // concurrent consumption of the same product
        let product_exists = sqlx::query_scalar::<_, i64>(
            "SELECT stock FROM products WHERE id = $1 AND business_id = $2 AND is_deleted = FALSE FOR UPDATE",
        )
        .bind(input.product_id)
        .bind(business_id)
        .fetch_optional(&mut *tx)
        .await?;

        if product_exists.is_none() {
            return Err(AppError::NotFound("Product".to_string()));
        }

        let batch: StockBatch = sqlx::query_as::<_, StockBatchRow>(&format!(
            r#"
            INSERT INTO stock_batches (
                business_id, product_id, quantity, remaining_quantity, cost_price,
                status, supplier_id, is_own_purchase, is_credit, notes, created_by
            )
            VALUES ($1, $2, $3, $3, $4, 'active', $5, $6, $7, $8, $9)
            RETURNING {BATCH_COLUMNS}
            "#
        ))
        .bind(business_id)
        .bind(input.product_id)
        .bind(input.quantity)
        .bind(input.cost_price)
        .bind(input.supplier_id)
        .bind(input.is_own_purchase)
        .bind(input.is_credit)
        .bind(&input.notes)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?
        .into();

        sqlx::query(
            "UPDATE products SET stock = stock + $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(input.quantity)
        .bind(input.product_id)
        .execute(&mut *tx)
        .await?;

        let reason = if input.restock {
            StockChangeReason::Restock
        } else {
            StockChangeReason::Creation
        };

        StockChangeService::append_change(
            &mut tx,
            business_id,
            user_id,
            NewStockChange {
                product_id: input.product_id,
                change: input.quantity,
                reason,
                cost_price: input.cost_price,
                batch_id: Some(batch.id),
                batch_consumptions: None,
                sale_id: None,
                supplier_id: input.supplier_id,
                is_own_purchase: Some(input.is_own_purchase),
                is_credit: Some(input.is_credit),
            },
        )
        .await?;

        // Debt reflects acquisition; written inside the same transaction
        // as the batch row.
        if let (Some(amount), Some(supplier_id)) = (debt_amount, input.supplier_id) {
            FinanceService::create_supplier_debt(
                &mut tx,
                business_id,
                user_id,
                supplier_id,
                batch.id,
                amount,
            )
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            batch_id = %batch.id,
            product_id = %input.product_id,
            quantity = input.quantity,
            "Stock batch created"
        );

        Ok(batch)
    }

    /// Get all batches of a product that still have stock to consume,
    /// oldest first. Reads the most recently committed state.
    pub async fn get_available_batches(
        &self,
        business_id: Uuid,
        product_id: Uuid,
    ) -> AppResult<Vec<StockBatch>> {
        let rows = sqlx::query_as::<_, StockBatchRow>(&format!(
            r#"
            SELECT {BATCH_COLUMNS}
            FROM stock_batches
            WHERE business_id = $1 AND product_id = $2
              AND remaining_quantity > 0 AND status = 'active'
            ORDER BY created_at ASC, id ASC
            "#
        ))
        .bind(business_id)
        .bind(product_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(StockBatch::from).collect())
    }

    /// Same read as `get_available_batches`, but row-locked inside the
    /// caller's transaction so concurrent consumers serialize.
    pub(crate) async fn fetch_available_for_update(
        tx: &mut Transaction<'_, Postgres>,
        business_id: Uuid,
        product_id: Uuid,
    ) -> AppResult<Vec<StockBatch>> {
        let rows = sqlx::query_as::<_, StockBatchRow>(&format!(
            r#"
            SELECT {BATCH_COLUMNS}
            FROM stock_batches
            WHERE business_id = $1 AND product_id = $2
              AND remaining_quantity > 0 AND status = 'active'
            ORDER BY created_at ASC, id ASC
            FOR UPDATE
            "#
        ))
        .bind(business_id)
        .bind(product_id)
        .fetch_all(&mut **tx)
        .await?;

        Ok(rows.into_iter().map(StockBatch::from).collect())
    }

    /// Fetch one batch by id, locked, verifying tenant ownership.
    pub(crate) async fn lock_batch(
        tx: &mut Transaction<'_, Postgres>,
        business_id: Uuid,
        batch_id: Uuid,
    ) -> AppResult<StockBatch> {
        let row = sqlx::query_as::<_, StockBatchRow>(&format!(
            "SELECT {BATCH_COLUMNS} FROM stock_batches WHERE id = $1 FOR UPDATE"
        ))
        .bind(batch_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Stock batch".to_string()))?;

        if row.business_id != business_id {
            return Err(AppError::Unauthorized(
                "Stock batch belongs to another business".to_string(),
            ));
        }

        Ok(row.into())
    }

    /// Correct a batch's cost price.
    ///
    /// Touches cost and status only; remaining quantity never changes via
    /// a correction. A zero-quantity journal entry records the new cost.
    pub async fn correct_cost_price(
        &self,
        business_id: Uuid,
        user_id: Uuid,
        batch_id: Uuid,
        input: CorrectCostInput,
    ) -> AppResult<StockBatch> {
        input.validate()?;

        let mut tx = self.db.begin().await?;

        let batch = Self::lock_batch(&mut tx, business_id, batch_id).await?;

        let updated: StockBatch = sqlx::query_as::<_, StockBatchRow>(&format!(
            r#"
            UPDATE stock_batches
            SET cost_price = $1, status = 'corrected'
            WHERE id = $2
            RETURNING {BATCH_COLUMNS}
            "#
        ))
        .bind(input.cost_price)
        .bind(batch_id)
        .fetch_one(&mut *tx)
        .await?
        .into();

        StockChangeService::append_change(
            &mut tx,
            business_id,
            user_id,
            NewStockChange {
                product_id: batch.product_id,
                change: 0,
                reason: StockChangeReason::CostCorrection,
                cost_price: input.cost_price,
                batch_id: Some(batch_id),
                batch_consumptions: None,
                sale_id: None,
                supplier_id: batch.supplier_id,
                is_own_purchase: Some(batch.is_own_purchase),
                is_credit: Some(batch.is_credit),
            },
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            batch_id = %batch_id,
            cost_price = %input.cost_price,
            "Batch cost price corrected"
        );

        Ok(updated)
    }

    /// Get the aggregated stock position for a product
    pub async fn get_product_stock_info(
        &self,
        business_id: Uuid,
        product_id: Uuid,
    ) -> AppResult<ProductStockInfo> {
        let product_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM products WHERE id = $1 AND business_id = $2 AND is_deleted = FALSE)",
        )
        .bind(product_id)
        .bind(business_id)
        .fetch_one(&self.db)
        .await?;

        if !product_exists {
            return Err(AppError::NotFound("Product".to_string()));
        }

        // unlike the consumption read, valuation counts corrected batches too
        let rows = sqlx::query_as::<_, StockBatchRow>(&format!(
            r#"
            SELECT {BATCH_COLUMNS}
            FROM stock_batches
            WHERE business_id = $1 AND product_id = $2 AND remaining_quantity > 0
            ORDER BY created_at ASC, id ASC
            "#
        ))
        .bind(business_id)
        .bind(product_id)
        .fetch_all(&self.db)
        .await?;
        let batches: Vec<StockBatch> = rows.into_iter().map(StockBatch::from).collect();

        let total_stock: i64 = batches.iter().map(|b| b.remaining_quantity).sum();
        let total_value: Decimal = batches.iter().map(|b| b.remaining_value()).sum();
        let average_cost_price = if total_stock > 0 {
            total_value / Decimal::from(total_stock)
        } else {
            Decimal::ZERO
        };

        Ok(ProductStockInfo {
            product_id,
            total_stock,
            total_value,
            average_cost_price,
            batches,
        })
    }
}
