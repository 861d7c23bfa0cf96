//! Supplier debt ledger service
//!
//! Debt and refund entries mirror credit acquisitions in the batch ledger.
//! Amounts are signed: debts positive, refunds negative, and a supplier's
//! balance is the plain sum of its non-deleted entries. Entries are never
//! physically deleted, only flagged.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{FinanceEntry, FinanceEntryType, FinanceSourceType};

/// Supplier debt ledger service
#[derive(Clone)]
pub struct FinanceService {
    db: PgPool,
}

#[derive(Debug, FromRow)]
struct FinanceEntryRow {
    id: Uuid,
    business_id: Uuid,
    source_type: String,
    source_id: Uuid,
    entry_type: String,
    amount: Decimal,
    batch_id: Option<Uuid>,
    refunded_debt_id: Option<Uuid>,
    is_deleted: bool,
    created_at: DateTime<Utc>,
    created_by: Uuid,
}

impl From<FinanceEntryRow> for FinanceEntry {
    fn from(row: FinanceEntryRow) -> Self {
        FinanceEntry {
            id: row.id,
            business_id: row.business_id,
            // source_type and entry_type values are CHECK-constrained in the schema
            source_type: FinanceSourceType::from_str(&row.source_type)
                .unwrap_or(FinanceSourceType::Supplier),
            source_id: row.source_id,
            entry_type: FinanceEntryType::from_str(&row.entry_type)
                .unwrap_or(FinanceEntryType::SupplierDebt),
            amount: row.amount,
            batch_id: row.batch_id,
            refunded_debt_id: row.refunded_debt_id,
            is_deleted: row.is_deleted,
            created_at: row.created_at,
            created_by: row.created_by,
        }
    }
}

const ENTRY_COLUMNS: &str = "id, business_id, source_type, source_id, entry_type, amount, \
     batch_id, refunded_debt_id, is_deleted, created_at, created_by";

impl FinanceService {
    /// Create a new FinanceService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Record a supplier debt for a credit acquisition.
    /// Only callable inside a caller's transaction so the debt cannot be
    /// detached from the batch mutation that caused it.
    pub(crate) async fn create_supplier_debt(
        tx: &mut Transaction<'_, Postgres>,
        business_id: Uuid,
        user_id: Uuid,
        supplier_id: Uuid,
        batch_id: Uuid,
        amount: Decimal,
    ) -> AppResult<FinanceEntry> {
        if amount <= Decimal::ZERO {
            return Err(AppError::ValidationError(
                "Debt amount must be positive".to_string(),
            ));
        }

        let row = sqlx::query_as::<_, FinanceEntryRow>(&format!(
            r#"
            INSERT INTO finance_entries (
                business_id, source_type, source_id, entry_type, amount,
                batch_id, created_by
            )
            VALUES ($1, 'supplier', $2, 'supplier_debt', $3, $4, $5)
            RETURNING {ENTRY_COLUMNS}
            "#
        ))
        .bind(business_id)
        .bind(supplier_id)
        .bind(amount)
        .bind(batch_id)
        .bind(user_id)
        .fetch_one(&mut **tx)
        .await?;

        tracing::debug!(
            supplier_id = %supplier_id,
            batch_id = %batch_id,
            amount = %amount,
            "Supplier debt recorded"
        );

        Ok(row.into())
    }

    /// Record a negative entry offsetting part of an earlier debt, e.g.
    /// when credit-acquired stock is returned via a manual adjustment.
    pub(crate) async fn create_supplier_refund(
        tx: &mut Transaction<'_, Postgres>,
        business_id: Uuid,
        user_id: Uuid,
        supplier_id: Uuid,
        batch_id: Uuid,
        refunded_debt_id: Option<Uuid>,
        amount: Decimal,
    ) -> AppResult<FinanceEntry> {
        if amount >= Decimal::ZERO {
            return Err(AppError::ValidationError(
                "Refund amount must be negative".to_string(),
            ));
        }

        let row = sqlx::query_as::<_, FinanceEntryRow>(&format!(
            r#"
            INSERT INTO finance_entries (
                business_id, source_type, source_id, entry_type, amount,
                batch_id, refunded_debt_id, created_by
            )
            VALUES ($1, 'supplier', $2, 'supplier_refund', $3, $4, $5, $6)
            RETURNING {ENTRY_COLUMNS}
            "#
        ))
        .bind(business_id)
        .bind(supplier_id)
        .bind(amount)
        .bind(batch_id)
        .bind(refunded_debt_id)
        .bind(user_id)
        .fetch_one(&mut **tx)
        .await?;

        tracing::debug!(
            supplier_id = %supplier_id,
            batch_id = %batch_id,
            amount = %amount,
            "Supplier refund recorded"
        );

        Ok(row.into())
    }

    /// Find the original debt entry for a batch, if one is still live
    pub(crate) async fn find_debt_for_batch(
        tx: &mut Transaction<'_, Postgres>,
        business_id: Uuid,
        batch_id: Uuid,
    ) -> AppResult<Option<Uuid>> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id FROM finance_entries
            WHERE business_id = $1 AND batch_id = $2
              AND entry_type = 'supplier_debt' AND is_deleted = FALSE
            ORDER BY created_at ASC, id ASC
            LIMIT 1
            "#,
        )
        .bind(business_id)
        .bind(batch_id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(id)
    }

    /// List a supplier's ledger entries, newest first, excluding
    /// soft-deleted rows
    pub async fn list_supplier_entries(
        &self,
        business_id: Uuid,
        supplier_id: Uuid,
    ) -> AppResult<Vec<FinanceEntry>> {
        let rows = sqlx::query_as::<_, FinanceEntryRow>(&format!(
            r#"
            SELECT {ENTRY_COLUMNS}
            FROM finance_entries
            WHERE business_id = $1 AND source_type = 'supplier' AND source_id = $2
              AND is_deleted = FALSE
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(business_id)
        .bind(supplier_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(FinanceEntry::from).collect())
    }

    /// Outstanding balance owed to a supplier: the signed sum of its
    /// non-deleted entries
    pub async fn supplier_balance(
        &self,
        business_id: Uuid,
        supplier_id: Uuid,
    ) -> AppResult<Decimal> {
        let balance = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT COALESCE(SUM(amount), 0)
            FROM finance_entries
            WHERE business_id = $1 AND source_type = 'supplier' AND source_id = $2
              AND is_deleted = FALSE
            "#,
        )
        .bind(business_id)
        .bind(supplier_id)
        .fetch_one(&self.db)
        .await?;

        Ok(balance)
    }

    /// Soft-delete a single ledger entry
    pub async fn soft_delete_entry(&self, business_id: Uuid, entry_id: Uuid) -> AppResult<()> {
        let affected = sqlx::query(
            "UPDATE finance_entries SET is_deleted = TRUE \
             WHERE id = $1 AND business_id = $2 AND is_deleted = FALSE",
        )
        .bind(entry_id)
        .bind(business_id)
        .execute(&self.db)
        .await?
        .rows_affected();

        if affected == 0 {
            return Err(AppError::NotFound("Finance entry".to_string()));
        }

        tracing::info!(entry_id = %entry_id, "Finance entry deleted");

        Ok(())
    }

    /// Soft-delete all ledger entries tied to a product's batches.
    /// Runs inside the product deletion transaction.
    pub(crate) async fn soft_delete_for_product(
        tx: &mut Transaction<'_, Postgres>,
        business_id: Uuid,
        product_id: Uuid,
    ) -> AppResult<u64> {
        let affected = sqlx::query(
            r#"
            UPDATE finance_entries SET is_deleted = TRUE
            WHERE business_id = $1 AND is_deleted = FALSE
              AND batch_id IN (
                  SELECT id FROM stock_batches WHERE product_id = $2 AND business_id = $1
              )
            "#,
        )
        .bind(business_id)
        .bind(product_id)
        .execute(&mut **tx)
        .await?
        .rows_affected();

        Ok(affected)
    }
}
