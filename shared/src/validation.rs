//! Validation helpers for the Retail Stock Ledger Platform

use rust_decimal::Decimal;
use uuid::Uuid;
use validator::ValidationError;

// ============================================================================
// Ledger Validations
// ============================================================================

/// Validate a unit cost price (must be non-negative)
pub fn validate_cost_price(cost_price: &Decimal) -> Result<(), ValidationError> {
    if *cost_price < Decimal::ZERO {
        let mut err = ValidationError::new("cost_price");
        err.message = Some("Cost price cannot be negative".into());
        return Err(err);
    }
    Ok(())
}

/// Validate that a signed adjustment keeps a batch inside its bounds:
/// remaining quantity can never go negative or exceed the original amount.
pub fn validate_adjustment_bounds(
    remaining_quantity: i64,
    quantity: i64,
    change: i64,
) -> Result<(), String> {
    let adjusted = remaining_quantity.checked_add(change).ok_or_else(|| {
        format!(
            "Adjustment of {} is out of range for a batch of {}",
            change, quantity
        )
    })?;
    if adjusted < 0 {
        return Err(format!(
            "Adjustment of {} would take remaining quantity below zero (currently {})",
            change, remaining_quantity
        ));
    }
    if adjusted > quantity {
        return Err(format!(
            "Adjustment of {} would exceed the batch's original quantity of {} (currently {})",
            change, quantity, remaining_quantity
        ));
    }
    Ok(())
}

// ============================================================================
// Supplier Debt Policy
// ============================================================================

/// Debt creation policy: all three conditions are required.
/// Credit purchase, not an own purchase, and a known supplier.
pub fn requires_supplier_debt(
    is_credit: bool,
    is_own_purchase: bool,
    supplier_id: Option<Uuid>,
) -> bool {
    is_credit && !is_own_purchase && supplier_id.is_some()
}

/// Ledger amount for a quantity at a unit cost. `None` when the product
/// exceeds the supported money range, which callers must reject as a
/// validation failure rather than let the arithmetic panic.
pub fn supplier_debt_amount(quantity: i64, cost_price: Decimal) -> Option<Decimal> {
    Decimal::from(quantity).checked_mul(cost_price)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_cost_price() {
        assert!(validate_cost_price(&Decimal::ZERO).is_ok());
        assert!(validate_cost_price(&Decimal::from(250)).is_ok());
        assert!(validate_cost_price(&Decimal::from(-1)).is_err());
    }

    #[test]
    fn test_adjustment_bounds() {
        // 0 <= remaining + change <= quantity
        assert!(validate_adjustment_bounds(5, 10, -5).is_ok());
        assert!(validate_adjustment_bounds(5, 10, 5).is_ok());
        assert!(validate_adjustment_bounds(5, 10, -6).is_err());
        assert!(validate_adjustment_bounds(5, 10, 6).is_err());
        assert!(validate_adjustment_bounds(0, 10, -1).is_err());
    }

    #[test]
    fn test_adjustment_bounds_extreme_deltas() {
        // deltas near the integer limits are rejected, never overflow
        assert!(validate_adjustment_bounds(5, 10, i64::MAX).is_err());
        assert!(validate_adjustment_bounds(5, 10, i64::MIN).is_err());
        assert!(validate_adjustment_bounds(i64::MAX, i64::MAX, i64::MIN).is_err());
    }

    #[test]
    fn test_supplier_debt_amount() {
        assert_eq!(
            supplier_debt_amount(10, Decimal::from(50)),
            Some(Decimal::from(500))
        );

        // amounts beyond the money range are refused, not computed
        let huge_cost = Decimal::from(10_000_000_000i64);
        assert_eq!(supplier_debt_amount(i64::MAX, huge_cost), None);
    }

    #[test]
    fn test_requires_supplier_debt_all_three_conditions() {
        let supplier = Some(Uuid::from_bytes([1; 16]));

        assert!(requires_supplier_debt(true, false, supplier));

        // Dropping any one condition produces no debt
        assert!(!requires_supplier_debt(false, false, supplier));
        assert!(!requires_supplier_debt(true, true, supplier));
        assert!(!requires_supplier_debt(true, false, None));
    }
}
