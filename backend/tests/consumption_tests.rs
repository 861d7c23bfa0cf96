//! Consumption engine tests
//!
//! Tests for FIFO/LIFO batch consumption planning:
//! - Ordering laws (oldest-first / newest-first with id tie-break)
//! - All-or-nothing behavior on insufficient stock
//! - Weighted average cost accuracy
//! - Stock conservation across a plan

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use shared::consumption::{plan_consumption, PlanError};
use shared::models::{BatchStatus, ConsumptionMethod, StockBatch};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn batch(seq: u8, created_secs: i64, remaining: i64, cost: &str) -> StockBatch {
    StockBatch {
        id: Uuid::from_bytes([seq; 16]),
        business_id: Uuid::from_bytes([0xB1; 16]),
        product_id: Uuid::from_bytes([0xA1; 16]),
        quantity: remaining,
        remaining_quantity: remaining,
        cost_price: dec(cost),
        status: BatchStatus::Active,
        supplier_id: None,
        is_own_purchase: false,
        is_credit: false,
        notes: None,
        created_at: Utc.timestamp_opt(created_secs, 0).single().unwrap(),
        created_by: Uuid::from_bytes([0xC1; 16]),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// FIFO walks batches oldest first and stops exactly at the quantity
    #[test]
    fn test_fifo_order_and_partial_last_batch() {
        let batches = vec![
            batch(1, 100, 10, "5.00"),
            batch(2, 200, 10, "6.00"),
            batch(3, 300, 10, "7.00"),
        ];

        let plan = plan_consumption(&batches, 25, ConsumptionMethod::Fifo).unwrap();

        assert_eq!(plan.consumptions.len(), 3);
        assert_eq!(plan.consumptions[0].consumed_quantity, 10);
        assert_eq!(plan.consumptions[1].consumed_quantity, 10);
        assert_eq!(plan.consumptions[2].consumed_quantity, 5);
        assert_eq!(plan.consumptions[2].remaining_quantity, 5);
        assert_eq!(plan.primary_batch_id, batches[0].id);
    }

    /// LIFO drains the newest batch before touching older ones
    #[test]
    fn test_lifo_prefers_newest_batch() {
        let batches = vec![batch(1, 100, 10, "5.00"), batch(2, 200, 10, "6.00")];

        let plan = plan_consumption(&batches, 4, ConsumptionMethod::Lifo).unwrap();

        assert_eq!(plan.consumptions.len(), 1);
        assert_eq!(plan.consumptions[0].batch_id, batches[1].id);
        assert_eq!(plan.consumptions[0].remaining_quantity, 6);
        // older batch untouched
        assert_eq!(batches[0].remaining_quantity, 10);
    }

    /// Average cost is the quantity-weighted mean at full precision
    #[test]
    fn test_weighted_average_cost() {
        // 10 units at 5.00 + 5 units at 8.00 = 90.00 over 15 units
        let batches = vec![batch(1, 100, 10, "5.00"), batch(2, 200, 10, "8.00")];

        let plan = plan_consumption(&batches, 15, ConsumptionMethod::Fifo).unwrap();

        assert_eq!(plan.total_cost, dec("90.00"));
        assert_eq!(plan.average_cost_price, dec("6.00"));
    }

    /// Requesting more than available fails without producing any plan
    #[test]
    fn test_insufficient_stock_is_all_or_nothing() {
        let batches = vec![batch(1, 100, 10, "5.00"), batch(2, 200, 4, "6.00")];

        let err = plan_consumption(&batches, 15, ConsumptionMethod::Fifo).unwrap_err();

        assert_eq!(
            err,
            PlanError::InsufficientStock {
                requested: 15,
                available: 14
            }
        );
    }

    /// Corrected batches still participate only when marked active
    #[test]
    fn test_non_active_batches_are_skipped() {
        let mut corrected = batch(1, 100, 10, "5.00");
        corrected.status = BatchStatus::Corrected;
        let active = batch(2, 200, 10, "6.00");

        let plan = plan_consumption(&[corrected, active.clone()], 5, ConsumptionMethod::Fifo)
            .unwrap();

        assert_eq!(plan.consumptions.len(), 1);
        assert_eq!(plan.consumptions[0].batch_id, active.id);
    }

    /// A single-batch sale leaves the batch and counter in the obvious state
    #[test]
    fn test_single_batch_sale() {
        let mut stock_batch = batch(1, 100, 20, "10.00");
        let plan = plan_consumption(
            std::slice::from_ref(&stock_batch),
            5,
            ConsumptionMethod::Fifo,
        )
        .unwrap();

        stock_batch.remaining_quantity = plan.consumptions[0].remaining_quantity;
        stock_batch.status = BatchStatus::for_remaining(stock_batch.remaining_quantity);

        assert_eq!(stock_batch.remaining_quantity, 15);
        assert_eq!(stock_batch.status, BatchStatus::Active);
        assert_eq!(plan.average_cost_price, dec("10.00"));
        assert_eq!(plan.total_cost, dec("50.00"));
    }

    /// End-to-end sale: apply the plan to an in-memory ledger and check
    /// that batch state and the aggregate counter stay consistent
    #[test]
    fn test_sale_scenario_preserves_conservation() {
        let mut batches = vec![
            batch(1, 100, 6, "10.00"),
            batch(2, 200, 6, "12.00"),
            batch(3, 300, 6, "14.00"),
        ];
        let mut product_stock: i64 = batches.iter().map(|b| b.remaining_quantity).sum();

        let plan = plan_consumption(&batches, 10, ConsumptionMethod::Fifo).unwrap();

        for consumed in &plan.consumptions {
            let b = batches.iter_mut().find(|b| b.id == consumed.batch_id).unwrap();
            b.remaining_quantity = consumed.remaining_quantity;
            b.status = BatchStatus::for_remaining(b.remaining_quantity);
        }
        product_stock -= plan.total_quantity;

        let ledger_total: i64 = batches.iter().map(|b| b.remaining_quantity).sum();
        assert_eq!(product_stock, ledger_total);
        assert_eq!(ledger_total, 8);

        // fully consumed batches flip to depleted, partially consumed stay active
        assert_eq!(batches[0].status, BatchStatus::Depleted);
        assert_eq!(batches[1].status, BatchStatus::Active);
        assert_eq!(batches[1].remaining_quantity, 2);
        assert_eq!(batches[2].status, BatchStatus::Active);

        // journal breakdown matches what was taken
        assert_eq!(plan.total_cost, dec("108.00")); // 6x10 + 4x12
        assert_eq!(plan.average_cost_price, dec("10.8"));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for a small ledger of active batches with distinct ages
    fn batches_strategy() -> impl Strategy<Value = Vec<StockBatch>> {
        prop::collection::vec((1i64..=50, 1i64..=1000), 1..8).prop_map(|specs| {
            specs
                .into_iter()
                .enumerate()
                .map(|(i, (qty, cost_cents))| {
                    let mut b = batch(i as u8 + 1, (i as i64 + 1) * 60, qty, "0");
                    b.cost_price = Decimal::new(cost_cents, 2);
                    b
                })
                .collect()
        })
    }

    fn method_strategy() -> impl Strategy<Value = ConsumptionMethod> {
        prop_oneof![Just(ConsumptionMethod::Fifo), Just(ConsumptionMethod::Lifo)]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Consumed quantities always sum to the requested quantity
        #[test]
        fn prop_consumed_sums_to_requested(
            batches in batches_strategy(),
            method in method_strategy(),
            quantity in 1i64..=100,
        ) {
            let available: i64 = batches.iter().map(|b| b.remaining_quantity).sum();

            match plan_consumption(&batches, quantity, method) {
                Ok(plan) => {
                    prop_assert!(quantity <= available);
                    let consumed: i64 = plan.consumptions.iter()
                        .map(|c| c.consumed_quantity)
                        .sum();
                    prop_assert_eq!(consumed, quantity);
                }
                Err(PlanError::InsufficientStock { requested, available: reported }) => {
                    prop_assert_eq!(requested, quantity);
                    prop_assert_eq!(reported, available);
                    prop_assert!(quantity > available);
                }
                Err(e) => return Err(TestCaseError::fail(format!("unexpected error: {e}"))),
            }
        }

        /// Every touched batch stays within its bounds and is touched once
        #[test]
        fn prop_batch_bounds_hold(
            batches in batches_strategy(),
            method in method_strategy(),
            quantity in 1i64..=100,
        ) {
            if let Ok(plan) = plan_consumption(&batches, quantity, method) {
                let mut seen = std::collections::HashSet::new();
                for c in &plan.consumptions {
                    prop_assert!(seen.insert(c.batch_id));
                    prop_assert!(c.consumed_quantity > 0);
                    prop_assert!(c.remaining_quantity >= 0);
                    let original = batches.iter().find(|b| b.id == c.batch_id).unwrap();
                    prop_assert_eq!(
                        c.remaining_quantity,
                        original.remaining_quantity - c.consumed_quantity
                    );
                }
            }
        }

        /// FIFO touches batches in nondecreasing age order; LIFO the reverse
        #[test]
        fn prop_ordering_law(
            batches in batches_strategy(),
            method in method_strategy(),
            quantity in 1i64..=100,
        ) {
            if let Ok(plan) = plan_consumption(&batches, quantity, method) {
                let ages: Vec<_> = plan.consumptions.iter()
                    .map(|c| {
                        batches.iter().find(|b| b.id == c.batch_id).unwrap().created_at
                    })
                    .collect();

                match method {
                    ConsumptionMethod::Fifo => {
                        prop_assert!(ages.windows(2).all(|w| w[0] <= w[1]));
                    }
                    ConsumptionMethod::Lifo => {
                        prop_assert!(ages.windows(2).all(|w| w[0] >= w[1]));
                    }
                }

                // every batch older (FIFO) than a touched one must be
                // exhausted before a newer batch is touched
                for c in &plan.consumptions[..plan.consumptions.len().saturating_sub(1)] {
                    prop_assert_eq!(c.remaining_quantity, 0);
                }
            }
        }

        /// total_cost equals the sum over batches of cost x consumed, and
        /// the average is total_cost / quantity exactly
        #[test]
        fn prop_weighted_average_exact(
            batches in batches_strategy(),
            method in method_strategy(),
            quantity in 1i64..=100,
        ) {
            if let Ok(plan) = plan_consumption(&batches, quantity, method) {
                let expected: Decimal = plan.consumptions.iter()
                    .map(|c| c.cost_price * Decimal::from(c.consumed_quantity))
                    .sum();
                prop_assert_eq!(plan.total_cost, expected);
                prop_assert_eq!(
                    plan.average_cost_price,
                    expected / Decimal::from(quantity)
                );
            }
        }

        /// The average cost is always bounded by the cheapest and most
        /// expensive batch touched
        #[test]
        fn prop_average_bounded_by_batch_costs(
            batches in batches_strategy(),
            method in method_strategy(),
            quantity in 1i64..=100,
        ) {
            if let Ok(plan) = plan_consumption(&batches, quantity, method) {
                let min = plan.consumptions.iter().map(|c| c.cost_price).min().unwrap();
                let max = plan.consumptions.iter().map(|c| c.cost_price).max().unwrap();
                prop_assert!(plan.average_cost_price >= min);
                prop_assert!(plan.average_cost_price <= max);
            }
        }

        /// Planning never mutates its inputs
        #[test]
        fn prop_planning_is_pure(
            batches in batches_strategy(),
            method in method_strategy(),
            quantity in 1i64..=200,
        ) {
            let before: Vec<i64> = batches.iter().map(|b| b.remaining_quantity).collect();
            let _ = plan_consumption(&batches, quantity, method);
            let after: Vec<i64> = batches.iter().map(|b| b.remaining_quantity).collect();
            prop_assert_eq!(before, after);
        }
    }
}
