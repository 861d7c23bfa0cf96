//! Product models
//!
//! Products own the aggregate stock counter; the counter itself is only
//! ever written through ledger operations, never directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Order in which stock batches are depleted when a product is sold
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConsumptionMethod {
    /// Oldest acquisition consumed first
    #[default]
    Fifo,
    /// Newest acquisition consumed first
    Lifo,
}

impl ConsumptionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsumptionMethod::Fifo => "fifo",
            ConsumptionMethod::Lifo => "lifo",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "fifo" => Some(ConsumptionMethod::Fifo),
            "lifo" => Some(ConsumptionMethod::Lifo),
            _ => None,
        }
    }
}

impl std::fmt::Display for ConsumptionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A sellable product tracked by the ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub business_id: Uuid,
    pub name: String,
    /// Aggregate counter; always equals the sum of `remaining_quantity`
    /// across the product's live batches
    pub stock: i64,
    /// Default batch-selection method for sales of this product
    pub consumption_method: ConsumptionMethod,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a product
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductInput {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,
    pub consumption_method: Option<ConsumptionMethod>,
}
