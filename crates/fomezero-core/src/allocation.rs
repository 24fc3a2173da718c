//! # Proportional Allocation
//!
//! Splits a money total into weighted shares without losing or inventing a
//! cent.
//!
//! ## How It Works (largest remainder)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  allocate(R$ 10.00, weights [2, 1], First)                              │
//! │                                                                         │
//! │  1. Exact:     [6.666.., 3.333..]     total × w / Σw                    │
//! │  2. Floor:     [6.66, 3.33]           sum 9.99, one cent left over      │
//! │  3. Hand out:  [6.67, 3.33]           largest remainder first, ties go  │
//! │                                       to the slot end of the list       │
//! │                                                                         │
//! │  Σ shares == total, every share ≥ 0 for a non-negative total           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Two callers use it:
//! - [`distribute_discount`] breaks ties toward the LAST item.
//! - The FIFO collector splits each sale across the received payment lines
//!   breaking ties toward the FIRST line.

use std::cmp::Reverse;

use crate::error::{CoreResult, ValidationError};
use crate::money::Money;
use crate::types::NewSaleItem;
use crate::validation::{checked_subtotal, checked_total};

/// Which end of the list wins rounding ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResidualSlot {
    First,
    Last,
}

/// Splits `total` proportionally to `weights`.
///
/// Every share is floored, then the missing cents go one each to the shares
/// with the largest fractional remainder. Equal remainders are served from
/// the `slot` end. No share ever exceeds its exact value by a cent or more,
/// so a non-negative total never yields a negative share.
///
/// Negative weights count as zero. When no weight is positive the whole total
/// goes to the slot. An empty weight list yields an empty vector. A negative
/// total is split as its magnitude and negated.
///
/// ```rust
/// use fomezero_core::allocation::{allocate, ResidualSlot};
/// use fomezero_core::money::Money;
///
/// let shares = allocate(Money::from_cents(1000), &[1, 1, 1], ResidualSlot::First);
/// let cents: Vec<i64> = shares.iter().map(|m| m.cents()).collect();
/// assert_eq!(cents, vec![334, 333, 333]);
/// ```
pub fn allocate(total: Money, weights: &[i64], slot: ResidualSlot) -> Vec<Money> {
    if weights.is_empty() {
        return Vec::new();
    }
    if total.is_negative() {
        return allocate(-total, weights, slot)
            .into_iter()
            .map(|share| -share)
            .collect();
    }

    let slot_index = match slot {
        ResidualSlot::First => 0,
        ResidualSlot::Last => weights.len() - 1,
    };

    let total_cents = i128::from(total.cents());
    let clamped: Vec<i128> = weights.iter().map(|w| i128::from((*w).max(0))).collect();
    let weight_sum: i128 = clamped.iter().sum();

    if weight_sum == 0 {
        let mut shares = vec![Money::zero(); weights.len()];
        shares[slot_index] = total;
        return shares;
    }

    // (floor, remainder numerator) per slot; both fit in i64 once divided
    let exact: Vec<(i128, i128)> = clamped
        .iter()
        .map(|w| {
            let numerator = total_cents * w;
            (numerator / weight_sum, numerator % weight_sum)
        })
        .collect();
    let floored: i128 = exact.iter().map(|(floor, _)| floor).sum();
    let missing = usize::try_from(total_cents - floored).unwrap_or(0);

    let mut order: Vec<usize> = (0..weights.len()).collect();
    match slot {
        ResidualSlot::First => order.sort_by_key(|&i| (Reverse(exact[i].1), i)),
        ResidualSlot::Last => order.sort_by_key(|&i| (Reverse(exact[i].1), Reverse(i))),
    }

    let mut cents: Vec<i128> = exact.iter().map(|(floor, _)| *floor).collect();
    for &i in order.iter().take(missing) {
        cents[i] += 1;
    }

    cents
        .into_iter()
        .map(|c| Money::from_cents(c as i64))
        .collect()
}

/// Spreads a sale-level discount over its items.
///
/// Each item's weight is its pre-discount subtotal (`quantity × unit_price`).
/// Rounding ties go to the last item. The returned item totals add up exactly
/// to `Σ subtotal − total_discount` and no item discount is negative or larger
/// than its subtotal. Incoming `discount_cents` and `total_amount_cents` are
/// replaced.
///
/// ## Errors
/// - negative discount
/// - discount larger than the sum of subtotals
/// - a subtotal or their sum out of the cent range
pub fn distribute_discount(
    items: &[NewSaleItem],
    total_discount: Money,
) -> CoreResult<Vec<NewSaleItem>> {
    if total_discount.is_negative() {
        return Err(ValidationError::Negative {
            field: "discount".to_string(),
        }
        .into());
    }

    let subtotals = items
        .iter()
        .map(|item| checked_subtotal(Money::from_cents(item.unit_price_cents), item.quantity))
        .collect::<Result<Vec<Money>, _>>()?;
    let gross = subtotals
        .iter()
        .try_fold(Money::zero(), |sum, subtotal| checked_total("subtotal", sum, *subtotal))?;

    if total_discount > gross {
        return Err(ValidationError::Mismatch {
            field: "discount".to_string(),
            expected: gross,
            actual: total_discount,
        }
        .into());
    }

    let weights: Vec<i64> = subtotals.iter().map(Money::cents).collect();
    let discounts = allocate(total_discount, &weights, ResidualSlot::Last);

    Ok(items
        .iter()
        .zip(subtotals.iter().zip(discounts))
        .map(|(item, (subtotal, discount))| NewSaleItem {
            snack_id: item.snack_id.clone(),
            quantity: item.quantity,
            unit_price_cents: item.unit_price_cents,
            discount_cents: discount.cents(),
            total_amount_cents: (*subtotal - discount).cents(),
        })
        .collect())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    fn cents(shares: &[Money]) -> Vec<i64> {
        shares.iter().map(Money::cents).collect()
    }

    fn item(quantity: i64, unit: i64) -> NewSaleItem {
        NewSaleItem {
            snack_id: format!("snack-{unit}"),
            quantity,
            unit_price_cents: unit,
            discount_cents: 0,
            total_amount_cents: unit * quantity,
        }
    }

    #[test]
    fn test_residual_on_last() {
        let shares = allocate(Money::from_cents(1000), &[1, 1, 1], ResidualSlot::Last);
        assert_eq!(cents(&shares), vec![333, 333, 334]);
    }

    #[test]
    fn test_ties_go_to_slot_end() {
        let shares = allocate(Money::from_cents(2), &[1, 1, 1], ResidualSlot::Last);
        assert_eq!(cents(&shares), vec![0, 1, 1]);
        let shares = allocate(Money::from_cents(2), &[1, 1, 1], ResidualSlot::First);
        assert_eq!(cents(&shares), vec![1, 1, 0]);
    }

    #[test]
    fn test_small_weight_on_slot_never_goes_negative() {
        // exact shares 0.5, 1.5, 1.5, 1.5
        let shares = allocate(Money::from_cents(5), &[1, 3, 3, 3], ResidualSlot::First);
        assert_eq!(cents(&shares), vec![1, 2, 1, 1]);
    }

    #[test]
    fn test_largest_remainder_wins() {
        // exact 3.333.. and 6.666..
        let shares = allocate(Money::from_cents(1000), &[1, 2], ResidualSlot::First);
        assert_eq!(cents(&shares), vec![333, 667]);
    }

    #[test]
    fn test_negative_total_mirrors_positive() {
        let shares = allocate(Money::from_cents(-1000), &[1, 1, 1], ResidualSlot::Last);
        assert_eq!(cents(&shares), vec![-333, -333, -334]);
    }

    #[test]
    fn test_zero_weights_go_to_slot() {
        let shares = allocate(Money::from_cents(500), &[0, 0], ResidualSlot::First);
        assert_eq!(cents(&shares), vec![500, 0]);
        assert!(allocate(Money::from_cents(500), &[], ResidualSlot::First).is_empty());
    }

    #[test]
    fn test_shares_always_sum_to_total() {
        let weight_sets: [&[i64]; 3] = [&[1299, 350, 7, 10_000, 1], &[1, 3, 3, 3], &[1, 1, 0]];
        for weights in weight_sets {
            for total in [1, 2, 5, 99, 1000, 12_345, 99_999] {
                for slot in [ResidualSlot::First, ResidualSlot::Last] {
                    let shares = allocate(Money::from_cents(total), weights, slot);
                    assert_eq!(shares.iter().sum::<Money>().cents(), total);
                    assert!(shares.iter().all(|share| !share.is_negative()), "{shares:?}");
                }
            }
        }
    }

    #[test]
    fn test_distribute_discount_matches_final_total() {
        // subtotals 10.00, 20.00, 30.00; discount 10.00
        let items = vec![item(1, 1000), item(2, 1000), item(3, 1000)];
        let priced = distribute_discount(&items, Money::from_cents(1000)).unwrap();

        let discounts: Vec<i64> = priced.iter().map(|i| i.discount_cents).collect();
        assert_eq!(discounts, vec![167, 333, 500]);

        let total: i64 = priced.iter().map(|i| i.total_amount_cents).sum();
        assert_eq!(total, 5000);
    }

    #[test]
    fn test_distribute_discount_residual_on_last_item() {
        let items = vec![item(1, 100), item(1, 100), item(1, 100)];
        let priced = distribute_discount(&items, Money::from_cents(100)).unwrap();
        let discounts: Vec<i64> = priced.iter().map(|i| i.discount_cents).collect();
        assert_eq!(discounts, vec![33, 33, 34]);
        assert_eq!(priced.iter().map(|i| i.total_amount_cents).sum::<i64>(), 200);
    }

    #[test]
    fn test_distribute_discount_skips_free_items() {
        let items = vec![item(1, 1), item(1, 1), item(1, 0)];
        let priced = distribute_discount(&items, Money::from_cents(1)).unwrap();
        let discounts: Vec<i64> = priced.iter().map(|i| i.discount_cents).collect();
        assert_eq!(discounts, vec![0, 1, 0]);
        assert!(priced.iter().all(|i| i.total_amount_cents >= 0));
        assert_eq!(priced.iter().map(|i| i.total_amount_cents).sum::<i64>(), 1);
    }

    #[test]
    fn test_distribute_discount_rejects_overflowing_subtotal() {
        let huge = NewSaleItem {
            snack_id: "crate-of-coxinhas".to_string(),
            quantity: 3,
            unit_price_cents: i64::MAX / 2,
            discount_cents: 0,
            total_amount_cents: 0,
        };
        assert!(matches!(
            distribute_discount(&[huge], Money::zero()),
            Err(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));
    }

    #[test]
    fn test_distribute_discount_rejects_excess() {
        let items = vec![item(1, 100)];
        assert!(distribute_discount(&items, Money::from_cents(101)).is_err());
        assert!(distribute_discount(&items, Money::from_cents(-1)).is_err());
    }
}
