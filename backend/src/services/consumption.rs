//! Stock consumption service
//!
//! Wraps the pure planning core with transactional application: batches
//! are row-locked, the plan is computed against the locked snapshot, and
//! batch updates, the counter decrement and the sale journal entry commit
//! together. Insufficient stock aborts before any write.

use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{BatchStatus, ConsumeStockInput, ConsumptionMethod, StockChangeReason};
use crate::services::stock_batch::StockBatchService;
use crate::services::stock_change::{NewStockChange, StockChangeService};
use shared::consumption::{plan_consumption, ConsumptionPlan};

/// Stock consumption service
#[derive(Clone)]
pub struct ConsumptionService {
    db: PgPool,
}

impl ConsumptionService {
    /// Create a new ConsumptionService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Consume stock for a sale or equivalent outflow.
    ///
    /// All-or-nothing: if available stock cannot cover the requested
    /// quantity nothing is mutated.
    pub async fn consume_stock(
        &self,
        business_id: Uuid,
        user_id: Uuid,
        input: ConsumeStockInput,
    ) -> AppResult<ConsumptionPlan> {
        input.validate()?;

        let mut tx = self.db.begin().await?;
        let plan = Self::consume_in_tx(&mut tx, business_id, user_id, &input).await?;
        tx.commit().await?;

        tracing::info!(
            product_id = %input.product_id,
            quantity = input.quantity,
            average_cost = %plan.average_cost_price,
            "Stock consumed"
        );

        Ok(plan)
    }

    /// Stage a consumption inside an open transaction so an outer flow
    /// (e.g. a sale spanning several products) commits it atomically with
    /// its own records.
    pub async fn consume_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        business_id: Uuid,
        user_id: Uuid,
        input: &ConsumeStockInput,
    ) -> AppResult<ConsumptionPlan> {
        // Lock the product row first; concurrent consumers of the same
        // product serialize here and see each other's committed batches
        let configured_method = sqlx::query_scalar::<_, String>(
            "SELECT consumption_method FROM products \
             WHERE id = $1 AND business_id = $2 AND is_deleted = FALSE FOR UPDATE",
        )
        .bind(input.product_id)
        .bind(business_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        let method = input.method.unwrap_or_else(|| {
            ConsumptionMethod::from_str(&configured_method).unwrap_or_default()
        });

        let batches =
            StockBatchService::fetch_available_for_update(tx, business_id, input.product_id)
                .await?;

        let plan = plan_consumption(&batches, input.quantity, method)?;

        for consumed in &plan.consumptions {
            sqlx::query(
                "UPDATE stock_batches SET remaining_quantity = $1, status = $2 WHERE id = $3",
            )
            .bind(consumed.remaining_quantity)
            .bind(BatchStatus::for_remaining(consumed.remaining_quantity).as_str())
            .bind(consumed.batch_id)
            .execute(&mut **tx)
            .await?;
        }

        sqlx::query(
            "UPDATE products SET stock = stock - $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(input.quantity)
        .bind(input.product_id)
        .execute(&mut **tx)
        .await?;

        StockChangeService::append_change(
            tx,
            business_id,
            user_id,
            NewStockChange {
                product_id: input.product_id,
                change: -input.quantity,
                reason: StockChangeReason::Sale,
                cost_price: plan.average_cost_price,
                batch_id: Some(plan.primary_batch_id),
                batch_consumptions: Some(plan.consumptions.clone()),
                sale_id: input.sale_id,
                supplier_id: None,
                is_own_purchase: None,
                is_credit: None,
            },
        )
        .await?;

        Ok(plan)
    }
}
