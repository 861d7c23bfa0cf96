//! FIFO/LIFO batch consumption planning
//!
//! Pure planning core: given the available batches of a product and a
//! quantity to consume, decide which batches are depleted in which order
//! and what the sale costs. Planning never mutates anything; the backend
//! applies a plan's batch updates, journal entry, and counter change as
//! one atomic commit.

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{BatchConsumption, BatchStatus, ConsumptionMethod, StockBatch};

/// Why a consumption could not be planned
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("consumption quantity must be positive, got {0}")]
    InvalidQuantity(i64),

    #[error("no stock batches available")]
    OutOfStock,

    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: i64, available: i64 },
}

/// The full outcome of planning one consumption
#[derive(Debug, Clone, Serialize)]
pub struct ConsumptionPlan {
    /// Per-batch breakdown in consumption order
    pub consumptions: Vec<BatchConsumption>,
    pub total_quantity: i64,
    /// Sum of cost_price x consumed_quantity over all touched batches
    pub total_cost: Decimal,
    /// total_cost / total_quantity, kept at full precision
    pub average_cost_price: Decimal,
    /// First batch touched
    pub primary_batch_id: Uuid,
}

/// Plan the depletion of exactly `quantity` units from `batches`.
///
/// Batches are ordered by `(created_at, id)`, ascending for FIFO and
/// descending for LIFO. The batch id tie-break keeps the order
/// deterministic when creation timestamps collide. All-or-nothing: if the
/// available quantity cannot satisfy the request, no partial plan is
/// returned.
pub fn plan_consumption(
    batches: &[StockBatch],
    quantity: i64,
    method: ConsumptionMethod,
) -> Result<ConsumptionPlan, PlanError> {
    if quantity <= 0 {
        return Err(PlanError::InvalidQuantity(quantity));
    }

    let mut ordered: Vec<&StockBatch> = batches
        .iter()
        .filter(|b| b.remaining_quantity > 0 && b.status == BatchStatus::Active)
        .collect();

    if ordered.is_empty() {
        return Err(PlanError::OutOfStock);
    }

    match method {
        ConsumptionMethod::Fifo => {
            ordered.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)))
        }
        ConsumptionMethod::Lifo => {
            ordered.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)))
        }
    }

    let available: i64 = ordered.iter().map(|b| b.remaining_quantity).sum();
    if available < quantity {
        return Err(PlanError::InsufficientStock {
            requested: quantity,
            available,
        });
    }

    let mut remaining_requested = quantity;
    let mut consumptions = Vec::new();
    let mut total_cost = Decimal::ZERO;

    for batch in ordered {
        if remaining_requested == 0 {
            break;
        }

        let consumed = remaining_requested.min(batch.remaining_quantity);
        remaining_requested -= consumed;
        total_cost += batch.cost_price * Decimal::from(consumed);

        consumptions.push(BatchConsumption {
            batch_id: batch.id,
            cost_price: batch.cost_price,
            consumed_quantity: consumed,
            remaining_quantity: batch.remaining_quantity - consumed,
        });
    }

    // quantity > 0 and available >= quantity, so at least one batch was touched
    let primary_batch_id = consumptions
        .first()
        .map(|c| c.batch_id)
        .ok_or(PlanError::OutOfStock)?;

    let average_cost_price = total_cost / Decimal::from(quantity);

    Ok(ConsumptionPlan {
        consumptions,
        total_quantity: quantity,
        total_cost,
        average_cost_price,
        primary_batch_id,
    })
}
