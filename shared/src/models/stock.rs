//! Stock batch ledger and stock change journal models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::ConsumptionMethod;

/// Lifecycle status of a stock batch
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    /// Has remaining quantity available for consumption
    Active,
    /// Fully consumed; kept as cost history, never deleted
    Depleted,
    /// Cost price was corrected after creation
    Corrected,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Active => "active",
            BatchStatus::Depleted => "depleted",
            BatchStatus::Corrected => "corrected",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(BatchStatus::Active),
            "depleted" => Some(BatchStatus::Depleted),
            "corrected" => Some(BatchStatus::Corrected),
            _ => None,
        }
    }

    /// Status a batch must carry for a given remaining quantity.
    /// The depleted transition happens exactly at the zero boundary.
    pub fn for_remaining(remaining_quantity: i64) -> Self {
        if remaining_quantity == 0 {
            BatchStatus::Depleted
        } else {
            BatchStatus::Active
        }
    }
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One discrete inventory acquisition with its own cost basis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockBatch {
    pub id: Uuid,
    pub business_id: Uuid,
    pub product_id: Uuid,
    /// Original acquired amount; immutable once set
    pub quantity: i64,
    /// Decreases as the batch is consumed; 0 <= remaining <= quantity
    pub remaining_quantity: i64,
    /// Unit cost; mutable only via an explicit cost correction
    pub cost_price: Decimal,
    pub status: BatchStatus,
    pub supplier_id: Option<Uuid>,
    pub is_own_purchase: bool,
    pub is_credit: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub created_by: Uuid,
}

impl StockBatch {
    /// Whether this acquisition must be mirrored by a supplier debt entry
    pub fn creates_supplier_debt(&self) -> bool {
        crate::validation::requires_supplier_debt(
            self.is_credit,
            self.is_own_purchase,
            self.supplier_id,
        )
    }

    /// Value of the stock still held in this batch
    pub fn remaining_value(&self) -> Decimal {
        self.cost_price * Decimal::from(self.remaining_quantity)
    }
}

/// Reason recorded with every stock change journal entry
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StockChangeReason {
    Creation,
    Sale,
    Restock,
    ManualAdjustment,
    Damage,
    CostCorrection,
}

impl StockChangeReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockChangeReason::Creation => "creation",
            StockChangeReason::Sale => "sale",
            StockChangeReason::Restock => "restock",
            StockChangeReason::ManualAdjustment => "manual_adjustment",
            StockChangeReason::Damage => "damage",
            StockChangeReason::CostCorrection => "cost_correction",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "creation" => Some(StockChangeReason::Creation),
            "sale" => Some(StockChangeReason::Sale),
            "restock" => Some(StockChangeReason::Restock),
            "manual_adjustment" => Some(StockChangeReason::ManualAdjustment),
            "damage" => Some(StockChangeReason::Damage),
            "cost_correction" => Some(StockChangeReason::CostCorrection),
            _ => None,
        }
    }
}

impl std::fmt::Display for StockChangeReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-batch share of a consumption that spanned one or more batches
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchConsumption {
    pub batch_id: Uuid,
    /// Unit cost of the batch at consumption time
    pub cost_price: Decimal,
    pub consumed_quantity: i64,
    /// Remaining quantity on the batch after this consumption
    pub remaining_quantity: i64,
}

/// Immutable journal entry recording one signed quantity delta
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockChange {
    pub id: Uuid,
    pub business_id: Uuid,
    pub product_id: Uuid,
    /// Positive for additions, negative for removals
    pub change: i64,
    pub reason: StockChangeReason,
    /// Unit cost at the time of the change
    pub cost_price: Decimal,
    /// Primary batch touched, when a single batch is identifiable
    pub batch_id: Option<Uuid>,
    /// Full breakdown when a sale spans multiple batches
    pub batch_consumptions: Option<Vec<BatchConsumption>>,
    pub sale_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    pub is_own_purchase: Option<bool>,
    pub is_credit: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub created_by: Uuid,
}

/// Aggregated stock position for a product
#[derive(Debug, Clone, Serialize)]
pub struct ProductStockInfo {
    pub product_id: Uuid,
    pub total_stock: i64,
    pub total_value: Decimal,
    pub average_cost_price: Decimal,
    pub batches: Vec<StockBatch>,
}

/// Input for creating a stock batch (initial entry or restock)
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBatchInput {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be positive"))]
    pub quantity: i64,
    #[validate(custom = "crate::validation::validate_cost_price")]
    pub cost_price: Decimal,
    pub supplier_id: Option<Uuid>,
    #[serde(default)]
    pub is_own_purchase: bool,
    #[serde(default)]
    pub is_credit: bool,
    #[validate(length(max = 1000, message = "Notes must be at most 1000 characters"))]
    pub notes: Option<String>,
    /// Restock of an already-tracked product rather than its first entry
    #[serde(default)]
    pub restock: bool,
}

/// Input for consuming stock (a sale or equivalent outflow)
#[derive(Debug, Deserialize, Validate)]
pub struct ConsumeStockInput {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be positive"))]
    pub quantity: i64,
    /// Overrides the product's configured method when set
    pub method: Option<ConsumptionMethod>,
    pub sale_id: Option<Uuid>,
}

/// Input for a manual operator adjustment against a specific batch
#[derive(Debug, Deserialize, Validate)]
pub struct ManualAdjustmentInput {
    pub batch_id: Uuid,
    /// Signed delta applied to the batch's remaining quantity
    pub quantity_change: i64,
    /// Bundled cost correction, applied together with the delta
    #[validate(custom = "crate::validation::validate_cost_price")]
    pub new_cost_price: Option<Decimal>,
    #[validate(length(max = 1000, message = "Notes must be at most 1000 characters"))]
    pub notes: Option<String>,
}

/// Input for a damage write-off against a specific batch
#[derive(Debug, Deserialize, Validate)]
pub struct DamageAdjustmentInput {
    pub batch_id: Uuid,
    /// Units written off; always positive, applied as a removal
    #[validate(range(min = 1, message = "Quantity must be positive"))]
    pub quantity: i64,
    #[validate(length(max = 1000, message = "Notes must be at most 1000 characters"))]
    pub notes: Option<String>,
}

/// Input for correcting a batch's cost price
#[derive(Debug, Deserialize, Validate)]
pub struct CorrectCostInput {
    #[validate(custom = "crate::validation::validate_cost_price")]
    pub cost_price: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_serialize_in_storage_form() {
        // the wire form and the TEXT column form must agree
        assert_eq!(
            serde_json::to_string(&BatchStatus::Depleted).unwrap(),
            "\"depleted\""
        );
        assert_eq!(
            serde_json::to_string(&StockChangeReason::ManualAdjustment).unwrap(),
            format!("\"{}\"", StockChangeReason::ManualAdjustment.as_str())
        );
        assert_eq!(
            serde_json::to_string(&ConsumptionMethod::Lifo).unwrap(),
            "\"lifo\""
        );
    }

    #[test]
    fn depleted_boundary_is_exact() {
        assert_eq!(BatchStatus::for_remaining(0), BatchStatus::Depleted);
        assert_eq!(BatchStatus::for_remaining(1), BatchStatus::Active);
    }
}
