//! Supplier debt ledger models
//!
//! The finance ledger records payables created when inventory is acquired
//! on credit terms. Debt reflects acquisition, not sale: consuming stock
//! never changes debt, and damage write-offs are explicitly excluded.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Originating party of a finance entry
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FinanceSourceType {
    Supplier,
}

impl FinanceSourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FinanceSourceType::Supplier => "supplier",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "supplier" => Some(FinanceSourceType::Supplier),
            _ => None,
        }
    }
}

/// Direction of a supplier finance entry
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FinanceEntryType {
    SupplierDebt,
    SupplierRefund,
}

impl FinanceEntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FinanceEntryType::SupplierDebt => "supplier_debt",
            FinanceEntryType::SupplierRefund => "supplier_refund",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "supplier_debt" => Some(FinanceEntryType::SupplierDebt),
            "supplier_refund" => Some(FinanceEntryType::SupplierRefund),
            _ => None,
        }
    }
}

impl std::fmt::Display for FinanceEntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A supplier debt or refund entry in the unified finance ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinanceEntry {
    pub id: Uuid,
    pub business_id: Uuid,
    pub source_type: FinanceSourceType,
    /// Supplier the entry is owed to
    pub source_id: Uuid,
    pub entry_type: FinanceEntryType,
    /// Positive for debts, negative for refunds
    pub amount: Decimal,
    /// Batch whose acquisition created the obligation
    pub batch_id: Option<Uuid>,
    /// Original debt a refund entry offsets
    pub refunded_debt_id: Option<Uuid>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: Uuid,
}
