//! Stock change journal tests
//!
//! Tests for journal entry conventions:
//! - Sign conventions per reason
//! - Reason storage strings
//! - Multi-batch sale breakdown serialization shape
//! - Journal deltas reconstruct the aggregate counter

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use shared::consumption::plan_consumption;
use shared::models::{BatchConsumption, BatchStatus, ConsumptionMethod, StockBatch, StockChangeReason};

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

    /// Reason strings are stable snake_case and round-trip
    #[test]
    fn test_reason_storage_strings() {
        let reasons = [
            (StockChangeReason::Creation, "creation"),
            (StockChangeReason::Sale, "sale"),
            (StockChangeReason::Restock, "restock"),
            (StockChangeReason::ManualAdjustment, "manual_adjustment"),
            (StockChangeReason::Damage, "damage"),
            (StockChangeReason::CostCorrection, "cost_correction"),
        ];

        for (reason, s) in reasons {
            assert_eq!(reason.as_str(), s);
            assert_eq!(StockChangeReason::from_str(s), Some(reason));
            assert!(s.chars().all(|c| c.is_lowercase() || c == '_'));
        }

        assert_eq!(StockChangeReason::from_str("theft"), None);
    }

    /// Additions are positive, removals negative, corrections zero
    #[test]
    fn test_sign_conventions() {
        let creation_change = 10i64;
        let restock_change = 5i64;
        let sale_change = -7i64;
        let damage_change = -2i64;
        let correction_change = 0i64;

        assert!(creation_change > 0);
        assert!(restock_change > 0);
        assert!(sale_change < 0);
        assert!(damage_change < 0);
        assert_eq!(correction_change, 0);

        // net effect of the sequence above
        let net: i64 = [
            creation_change,
            restock_change,
            sale_change,
            damage_change,
            correction_change,
        ]
        .iter()
        .sum();
        assert_eq!(net, 6);
    }

    /// A multi-batch sale's breakdown serializes as a JSON array with the
    /// per-batch fields the journal stores
    #[test]
    fn test_batch_consumptions_serialization() {
        let breakdown = vec![
            BatchConsumption {
                batch_id: Uuid::from_bytes([1; 16]),
                cost_price: dec("5.00"),
                consumed_quantity: 10,
                remaining_quantity: 0,
            },
            BatchConsumption {
                batch_id: Uuid::from_bytes([2; 16]),
                cost_price: dec("6.00"),
                consumed_quantity: 3,
                remaining_quantity: 7,
            },
        ];

        let json = serde_json::to_value(&breakdown).unwrap();
        let arr = json.as_array().unwrap();

        assert_eq!(arr.len(), 2);
        assert_eq!(arr[0]["consumed_quantity"], 10);
        assert_eq!(arr[1]["remaining_quantity"], 7);

        let parsed: Vec<BatchConsumption> = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, breakdown);
    }

    /// A sale journal entry records the plan's breakdown and weighted cost
    #[test]
    fn test_sale_entry_mirrors_plan() {
        let batches = vec![batch(1, 100, 10, "5.00"), batch(2, 200, 10, "6.00")];
        let plan = plan_consumption(&batches, 13, ConsumptionMethod::Fifo).unwrap();

        // the entry's change is the negated total quantity
        let change = -plan.total_quantity;
        assert_eq!(change, -13);

        // the recorded cost is the weighted average, not any single batch's
        assert_eq!(plan.average_cost_price, dec("68.00") / dec("13"));

        // the primary batch is the first one the plan touched
        assert_eq!(plan.primary_batch_id, plan.consumptions[0].batch_id);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    #[derive(Debug, Clone, Copy)]
    enum Event {
        Add(i64),
        Remove(i64),
        Correct,
    }

    fn event_strategy() -> impl Strategy<Value = Event> {
        prop_oneof![
            (1i64..=100).prop_map(Event::Add),
            (1i64..=100).prop_map(Event::Remove),
            Just(Event::Correct),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Replaying journal deltas reconstructs the aggregate counter:
        /// the counter is derived state, the journal is the source of truth
        #[test]
        fn prop_journal_replay_matches_counter(
            events in prop::collection::vec(event_strategy(), 0..40),
        ) {
            let mut counter: i64 = 0;
            let mut journal: Vec<i64> = Vec::new();

            for event in events {
                let change = match event {
                    Event::Add(q) => q,
                    // removals beyond availability are rejected upstream,
                    // so clamp the way the engine would
                    Event::Remove(q) => -q.min(counter),
                    Event::Correct => 0,
                };
                counter += change;
                journal.push(change);
            }

            let replayed: i64 = journal.iter().sum();
            prop_assert_eq!(replayed, counter);
            prop_assert!(counter >= 0);
        }

        /// A plan's breakdown always survives the JSONB round trip intact
        #[test]
        fn prop_breakdown_roundtrip(
            quantities in prop::collection::vec(1i64..=50, 1..6),
            request_frac in 1i64..=100,
        ) {
            let batches: Vec<StockBatch> = quantities
                .iter()
                .enumerate()
                .map(|(i, &q)| batch(i as u8 + 1, (i as i64 + 1) * 60, q, "3.50"))
                .collect();
            let available: i64 = quantities.iter().sum();
            let quantity = (request_frac * available / 100).max(1);

            if let Ok(plan) = plan_consumption(&batches, quantity, ConsumptionMethod::Fifo) {
                let json = serde_json::to_value(&plan.consumptions).unwrap();
                let parsed: Vec<BatchConsumption> = serde_json::from_value(json).unwrap();
                prop_assert_eq!(parsed, plan.consumptions);
            }
        }
    }
}
