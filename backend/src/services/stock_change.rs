//! Stock change journal service
//!
//! The journal is append-only: entries are never updated or deleted, and
//! every entry is written in the same transaction as the batch and counter
//! mutations it records. Manual and damage adjustments live here because
//! they are journal-first operations against a single batch.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{
    BatchConsumption, BatchStatus, DamageAdjustmentInput, ManualAdjustmentInput, StockChange,
    StockChangeReason,
};
use crate::services::finance::FinanceService;
use crate::services::stock_batch::StockBatchService;
use shared::validation::{supplier_debt_amount, validate_adjustment_bounds};

/// Stock change journal service
#[derive(Clone)]
pub struct StockChangeService {
    db: PgPool,
}

/// Journal entry fields supplied by the mutating operation
#[derive(Debug)]
pub(crate) struct NewStockChange {
    pub product_id: Uuid,
    pub change: i64,
    pub reason: StockChangeReason,
    pub cost_price: Decimal,
    pub batch_id: Option<Uuid>,
    pub batch_consumptions: Option<Vec<BatchConsumption>>,
    pub sale_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    pub is_own_purchase: Option<bool>,
    pub is_credit: Option<bool>,
}

#[derive(Debug, FromRow)]
struct StockChangeRow {
    id: Uuid,
    business_id: Uuid,
    product_id: Uuid,
    change: i64,
    reason: String,
    cost_price: Decimal,
    batch_id: Option<Uuid>,
    batch_consumptions: Option<serde_json::Value>,
    sale_id: Option<Uuid>,
    supplier_id: Option<Uuid>,
    is_own_purchase: Option<bool>,
    is_credit: Option<bool>,
    created_at: DateTime<Utc>,
    created_by: Uuid,
}

impl From<StockChangeRow> for StockChange {
    fn from(row: StockChangeRow) -> Self {
        StockChange {
            id: row.id,
            business_id: row.business_id,
            product_id: row.product_id,
            change: row.change,
            // reason values are CHECK-constrained in the schema
            reason: StockChangeReason::from_str(&row.reason)
                .unwrap_or(StockChangeReason::ManualAdjustment),
            cost_price: row.cost_price,
            batch_id: row.batch_id,
            batch_consumptions: row
                .batch_consumptions
                .and_then(|v| serde_json::from_value(v).ok()),
            sale_id: row.sale_id,
            supplier_id: row.supplier_id,
            is_own_purchase: row.is_own_purchase,
            is_credit: row.is_credit,
            created_at: row.created_at,
            created_by: row.created_by,
        }
    }
}

const CHANGE_COLUMNS: &str = "id, business_id, product_id, change, reason, cost_price, \
     batch_id, batch_consumptions, sale_id, supplier_id, is_own_purchase, is_credit, \
     created_at, created_by";

impl StockChangeService {
    /// Create a new StockChangeService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Append one journal entry inside the caller's transaction.
    /// Never called standalone: the entry must commit or roll back with
    /// the mutation it records.
    pub(crate) async fn append_change(
        tx: &mut Transaction<'_, Postgres>,
        business_id: Uuid,
        user_id: Uuid,
        new: NewStockChange,
    ) -> AppResult<StockChange> {
        let consumptions_json = new
            .batch_consumptions
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| AppError::InternalError(e.into()))?;

        let row = sqlx::query_as::<_, StockChangeRow>(&format!(
            r#"
            INSERT INTO stock_changes (
                business_id, product_id, change, reason, cost_price, batch_id,
                batch_consumptions, sale_id, supplier_id, is_own_purchase,
                is_credit, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {CHANGE_COLUMNS}
            "#
        ))
        .bind(business_id)
        .bind(new.product_id)
        .bind(new.change)
        .bind(new.reason.as_str())
        .bind(new.cost_price)
        .bind(new.batch_id)
        .bind(consumptions_json)
        .bind(new.sale_id)
        .bind(new.supplier_id)
        .bind(new.is_own_purchase)
        .bind(new.is_credit)
        .bind(user_id)
        .fetch_one(&mut **tx)
        .await?;

        Ok(row.into())
    }

    /// Apply a manual operator adjustment to a batch.
    ///
    /// The delta is bounded so the batch never exceeds its original
    /// quantity or drops below zero. When the batch was acquired on
    /// credit, the supplier ledger is adjusted proportionally in the
    /// same transaction.
    pub async fn adjust_stock_manually(
        &self,
        business_id: Uuid,
        user_id: Uuid,
        input: ManualAdjustmentInput,
    ) -> AppResult<StockChange> {
        input.validate()?;

        if input.quantity_change == 0 && input.new_cost_price.is_none() {
            return Err(AppError::ValidationError(
                "Adjustment must change quantity or cost price".to_string(),
            ));
        }

        let mut tx = self.db.begin().await?;

        let batch = StockBatchService::lock_batch(&mut tx, business_id, input.batch_id).await?;

        validate_adjustment_bounds(batch.remaining_quantity, batch.quantity, input.quantity_change)
            .map_err(AppError::ValidationError)?;

        let new_remaining = batch.remaining_quantity + input.quantity_change;
        let new_cost = input.new_cost_price.unwrap_or(batch.cost_price);
        // the depleted boundary wins; otherwise a cost correction marks the
        // batch, and an already-corrected batch keeps its marker
        let new_status = if new_remaining == 0 {
            BatchStatus::Depleted
        } else if input.new_cost_price.is_some() || batch.status == BatchStatus::Corrected {
            BatchStatus::Corrected
        } else {
            BatchStatus::Active
        };

        sqlx::query(
            "UPDATE stock_batches SET remaining_quantity = $1, cost_price = $2, status = $3 \
             WHERE id = $4",
        )
        .bind(new_remaining)
        .bind(new_cost)
        .bind(new_status.as_str())
        .bind(batch.id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE products SET stock = stock + $1, updated_at = NOW() \
             WHERE id = $2 AND business_id = $3",
        )
        .bind(input.quantity_change)
        .bind(batch.product_id)
        .bind(business_id)
        .execute(&mut *tx)
        .await?;

        let entry = Self::append_change(
            &mut tx,
            business_id,
            user_id,
            NewStockChange {
                product_id: batch.product_id,
                change: input.quantity_change,
                reason: StockChangeReason::ManualAdjustment,
                cost_price: new_cost,
                batch_id: Some(batch.id),
                batch_consumptions: None,
                sale_id: None,
                supplier_id: batch.supplier_id,
                is_own_purchase: Some(batch.is_own_purchase),
                is_credit: Some(batch.is_credit),
            },
        )
        .await?;

        // Quantity deltas on a credit batch move the supplier ledger at the
        // batch's acquisition cost, not the corrected one
        if batch.creates_supplier_debt() && input.quantity_change != 0 {
            let supplier_id = batch.supplier_id.ok_or_else(|| {
                AppError::InternalError(anyhow::anyhow!("credit batch without supplier"))
            })?;
            let amount = supplier_debt_amount(input.quantity_change, batch.cost_price)
                .ok_or_else(|| {
                    AppError::ValidationError(
                        "Adjustment times cost price exceeds the supported amount range"
                            .to_string(),
                    )
                })?;

            if input.quantity_change > 0 {
                FinanceService::create_supplier_debt(
                    &mut tx,
                    business_id,
                    user_id,
                    supplier_id,
                    batch.id,
                    amount,
                )
                .await?;
            } else {
                let refunded_debt_id =
                    FinanceService::find_debt_for_batch(&mut tx, business_id, batch.id).await?;
                FinanceService::create_supplier_refund(
                    &mut tx,
                    business_id,
                    user_id,
                    supplier_id,
                    batch.id,
                    refunded_debt_id,
                    amount,
                )
                .await?;
            }
        }

        tx.commit().await?;

        tracing::info!(
            batch_id = %batch.id,
            quantity_change = input.quantity_change,
            "Manual stock adjustment applied"
        );

        Ok(entry)
    }

    /// Write off damaged units from a batch.
    ///
    /// Damage never touches the supplier ledger: the debt reflects what
    /// was acquired, not what survived.
    pub async fn adjust_stock_for_damage(
        &self,
        business_id: Uuid,
        user_id: Uuid,
        input: DamageAdjustmentInput,
    ) -> AppResult<StockChange> {
        input.validate()?;

        let mut tx = self.db.begin().await?;

        let batch = StockBatchService::lock_batch(&mut tx, business_id, input.batch_id).await?;

        let change = -input.quantity;
        validate_adjustment_bounds(batch.remaining_quantity, batch.quantity, change)
            .map_err(AppError::ValidationError)?;

        let new_remaining = batch.remaining_quantity + change;

        sqlx::query(
            "UPDATE stock_batches SET remaining_quantity = $1, status = $2 WHERE id = $3",
        )
        .bind(new_remaining)
        .bind(BatchStatus::for_remaining(new_remaining).as_str())
        .bind(batch.id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE products SET stock = stock + $1, updated_at = NOW() \
             WHERE id = $2 AND business_id = $3",
        )
        .bind(change)
        .bind(batch.product_id)
        .bind(business_id)
        .execute(&mut *tx)
        .await?;

        let entry = Self::append_change(
            &mut tx,
            business_id,
            user_id,
            NewStockChange {
                product_id: batch.product_id,
                change,
                reason: StockChangeReason::Damage,
                cost_price: batch.cost_price,
                batch_id: Some(batch.id),
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
            batch_id = %batch.id,
            quantity = input.quantity,
            "Damage write-off applied"
        );

        Ok(entry)
    }

    /// Get journal entries for a product, newest first, optionally
    /// filtered by reason
    pub async fn get_changes(
        &self,
        business_id: Uuid,
        product_id: Uuid,
        reason: Option<StockChangeReason>,
    ) -> AppResult<Vec<StockChange>> {
        let rows = sqlx::query_as::<_, StockChangeRow>(&format!(
            r#"
            SELECT {CHANGE_COLUMNS}
            FROM stock_changes
            WHERE business_id = $1 AND product_id = $2
              AND ($3::text IS NULL OR reason = $3)
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(business_id)
        .bind(product_id)
        .bind(reason.map(|r| r.as_str()))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(StockChange::from).collect())
    }
}
