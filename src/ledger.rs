//! Delta-application arithmetic for the denormalized running totals.
//!
//! Every parent aggregate (IGP, water vendo, fund request) keeps totals that
//! must equal the sum over its qualifying detail records. Rather than
//! recomputing those sums on every write, services compute the signed
//! difference between a detail record's old and new contribution with the
//! functions here and patch the totals inside the same store transaction.
//!
//! These functions never touch the store. Totals that would go negative are
//! reported as [`LedgerError::Drift`] and never clamped: a negative total can
//! only mean a compensation bug or a lost update, and masking it would hide
//! exactly the drift this module exists to prevent.

use rust_decimal::Decimal;

use crate::entities::igp_transaction::ReceiptStatus;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("insufficient supply: {available} available, {requested} requested")]
    InsufficientSupply { available: i32, requested: i32 },

    #[error("{0}")]
    Drift(String),
}

/// Signed change a transaction edit applies to its supply and parent totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LedgerDelta {
    /// Change to the supply's consumed capacity (`quantity_sold`).
    pub capacity: i32,
    /// Change to the parent's `total_sold`.
    pub sold: i32,
    /// Change to the supply's and parent's revenue.
    pub revenue: Decimal,
}

impl LedgerDelta {
    pub fn is_zero(&self) -> bool {
        self.capacity == 0 && self.sold == 0 && self.revenue.is_zero()
    }
}

/// The fields of a transaction that determine its ledger contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxnSnapshot {
    pub quantity: i32,
    pub unit_price: Decimal,
    pub receipt_status: ReceiptStatus,
}

impl TxnSnapshot {
    /// Supply capacity held by this transaction. Pending sales hold capacity;
    /// cancelling releases it.
    fn capacity_use(&self) -> i32 {
        match self.receipt_status {
            ReceiptStatus::Cancelled => 0,
            _ => self.quantity,
        }
    }

    /// Contribution to sold totals. Only received transactions count.
    fn sold(&self) -> i32 {
        match self.receipt_status {
            ReceiptStatus::Received => self.quantity,
            _ => 0,
        }
    }

    fn revenue(&self) -> Decimal {
        match self.receipt_status {
            ReceiptStatus::Received => self.unit_price * Decimal::from(self.quantity),
            _ => Decimal::ZERO,
        }
    }
}

/// Delta between two versions of a transaction. `None` stands for absence:
/// `(None, Some)` is a create, `(Some, None)` a delete. When the receipt
/// status crosses into or out of `received`, the full amount enters or
/// leaves the sold/revenue totals, not just the quantity difference.
pub fn transaction_delta(old: Option<&TxnSnapshot>, new: Option<&TxnSnapshot>) -> LedgerDelta {
    let old_capacity = old.map_or(0, TxnSnapshot::capacity_use);
    let old_sold = old.map_or(0, TxnSnapshot::sold);
    let old_revenue = old.map_or(Decimal::ZERO, TxnSnapshot::revenue);
    let new_capacity = new.map_or(0, TxnSnapshot::capacity_use);
    let new_sold = new.map_or(0, TxnSnapshot::sold);
    let new_revenue = new.map_or(Decimal::ZERO, TxnSnapshot::revenue);

    LedgerDelta {
        capacity: new_capacity - old_capacity,
        sold: new_sold - old_sold,
        revenue: new_revenue - old_revenue,
    }
}

/// Running totals of a supply record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupplyTotals {
    pub quantity: i32,
    pub quantity_sold: i32,
    pub total_revenue: Decimal,
}

/// Applies a delta to a supply, enforcing the no-oversell invariant
/// (`quantity_sold <= quantity`) and non-negative totals.
pub fn apply_to_supply(totals: &SupplyTotals, delta: &LedgerDelta) -> Result<SupplyTotals, LedgerError> {
    let quantity_sold = totals.quantity_sold + delta.capacity;
    if quantity_sold > totals.quantity {
        return Err(LedgerError::InsufficientSupply {
            available: totals.quantity - totals.quantity_sold,
            requested: delta.capacity,
        });
    }
    if quantity_sold < 0 {
        return Err(LedgerError::Drift(format!(
            "supply quantity_sold would become {quantity_sold}"
        )));
    }
    let total_revenue = totals.total_revenue + delta.revenue;
    if total_revenue < Decimal::ZERO {
        return Err(LedgerError::Drift(format!(
            "supply revenue would become {total_revenue}"
        )));
    }
    Ok(SupplyTotals {
        quantity: totals.quantity,
        quantity_sold,
        total_revenue,
    })
}

/// Running totals of a parent aggregate (IGP).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentTotals {
    pub total_sold: i32,
    pub revenue: Decimal,
}

pub fn apply_to_parent(totals: &ParentTotals, delta: &LedgerDelta) -> Result<ParentTotals, LedgerError> {
    let total_sold = totals.total_sold + delta.sold;
    if total_sold < 0 {
        return Err(LedgerError::Drift(format!(
            "parent total_sold would become {total_sold}"
        )));
    }
    let revenue = totals.revenue + delta.revenue;
    if revenue < Decimal::ZERO {
        return Err(LedgerError::Drift(format!(
            "parent revenue would become {revenue}"
        )));
    }
    Ok(ParentTotals { total_sold, revenue })
}

/// Delta an administrative supply correction applies to the parent: signed
/// differences of the directly edited sold/revenue fields.
pub fn supply_edit_delta(
    old_sold: i32,
    new_sold: i32,
    old_revenue: Decimal,
    new_revenue: Decimal,
) -> LedgerDelta {
    LedgerDelta {
        capacity: new_sold - old_sold,
        sold: new_sold - old_sold,
        revenue: new_revenue - old_revenue,
    }
}

/// Signed change to a fund request's utilized funds from an expense edit.
pub fn expense_delta(old_amount: Decimal, new_amount: Decimal) -> Decimal {
    new_amount - old_amount
}

pub fn apply_utilized_funds(current: Decimal, delta: Decimal) -> Result<Decimal, LedgerError> {
    let utilized = current + delta;
    if utilized < Decimal::ZERO {
        return Err(LedgerError::Drift(format!(
            "utilized funds would become {utilized}"
        )));
    }
    Ok(utilized)
}

/// Applies a usage delta to a water supply, enforcing
/// `0 <= used_gallons <= supplied_gallons`.
pub fn apply_water_usage(
    supplied_gallons: i32,
    used_gallons: i32,
    delta: i32,
) -> Result<i32, LedgerError> {
    let used = used_gallons + delta;
    if used > supplied_gallons {
        return Err(LedgerError::InsufficientSupply {
            available: supplied_gallons - used_gallons,
            requested: delta,
        });
    }
    if used < 0 {
        return Err(LedgerError::Drift(format!(
            "used gallons would become {used}"
        )));
    }
    Ok(used)
}

/// Applies a signed money delta to a non-negative running total
/// (vendo revenue/expenses).
pub fn apply_money_total(current: Decimal, delta: Decimal, field: &str) -> Result<Decimal, LedgerError> {
    let next = current + delta;
    if next < Decimal::ZERO {
        return Err(LedgerError::Drift(format!("{field} would become {next}")));
    }
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn snap(quantity: i32, price: Decimal, status: ReceiptStatus) -> TxnSnapshot {
        TxnSnapshot {
            quantity,
            unit_price: price,
            receipt_status: status,
        }
    }

    #[test]
    fn create_received_contributes_full_amount() {
        let new = snap(10, dec!(25.00), ReceiptStatus::Received);
        let delta = transaction_delta(None, Some(&new));
        assert_eq!(delta.capacity, 10);
        assert_eq!(delta.sold, 10);
        assert_eq!(delta.revenue, dec!(250.00));
    }

    #[test]
    fn create_pending_holds_capacity_but_no_revenue() {
        let new = snap(4, dec!(25.00), ReceiptStatus::Pending);
        let delta = transaction_delta(None, Some(&new));
        assert_eq!(delta.capacity, 4);
        assert_eq!(delta.sold, 0);
        assert_eq!(delta.revenue, Decimal::ZERO);
    }

    #[test]
    fn marking_received_moves_full_amount_into_totals() {
        let old = snap(4, dec!(25.00), ReceiptStatus::Pending);
        let new = snap(4, dec!(25.00), ReceiptStatus::Received);
        let delta = transaction_delta(Some(&old), Some(&new));
        assert_eq!(delta.capacity, 0);
        assert_eq!(delta.sold, 4);
        assert_eq!(delta.revenue, dec!(100.00));
    }

    #[test]
    fn cancelling_received_reverses_everything() {
        let old = snap(4, dec!(25.00), ReceiptStatus::Received);
        let new = snap(4, dec!(25.00), ReceiptStatus::Cancelled);
        let delta = transaction_delta(Some(&old), Some(&new));
        assert_eq!(delta.capacity, -4);
        assert_eq!(delta.sold, -4);
        assert_eq!(delta.revenue, dec!(-100.00));
    }

    #[test]
    fn delete_applies_negative_contribution() {
        let old = snap(3, dec!(10.00), ReceiptStatus::Received);
        let delta = transaction_delta(Some(&old), None);
        assert_eq!(delta.capacity, -3);
        assert_eq!(delta.sold, -3);
        assert_eq!(delta.revenue, dec!(-30.00));
    }

    #[test]
    fn noop_edit_is_zero_delta() {
        let old = snap(7, dec!(12.50), ReceiptStatus::Received);
        let delta = transaction_delta(Some(&old), Some(&old.clone()));
        assert!(delta.is_zero());
    }

    #[test]
    fn oversell_is_rejected_before_any_write() {
        let totals = SupplyTotals {
            quantity: 10,
            quantity_sold: 10,
            total_revenue: dec!(250.00),
        };
        let new = snap(1, dec!(25.00), ReceiptStatus::Received);
        let delta = transaction_delta(None, Some(&new));
        let err = apply_to_supply(&totals, &delta).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientSupply {
                available: 0,
                requested: 1
            }
        );
    }

    #[test]
    fn quantity_increase_within_capacity_is_allowed() {
        let totals = SupplyTotals {
            quantity: 10,
            quantity_sold: 6,
            total_revenue: dec!(150.00),
        };
        let old = snap(6, dec!(25.00), ReceiptStatus::Received);
        let new = snap(10, dec!(25.00), ReceiptStatus::Received);
        let delta = transaction_delta(Some(&old), Some(&new));
        let updated = apply_to_supply(&totals, &delta).unwrap();
        assert_eq!(updated.quantity_sold, 10);
        assert_eq!(updated.total_revenue, dec!(250.00));
    }

    #[test]
    fn negative_totals_are_drift_not_clamped() {
        let totals = ParentTotals {
            total_sold: 2,
            revenue: dec!(20.00),
        };
        let old = snap(5, dec!(10.00), ReceiptStatus::Received);
        let delta = transaction_delta(Some(&old), None);
        assert!(matches!(
            apply_to_parent(&totals, &delta),
            Err(LedgerError::Drift(_))
        ));
    }

    #[test]
    fn water_overdraw_is_rejected() {
        assert!(matches!(
            apply_water_usage(100, 95, 10),
            Err(LedgerError::InsufficientSupply { available: 5, requested: 10 })
        ));
        assert_eq!(apply_water_usage(100, 95, 5).unwrap(), 100);
    }

    #[test]
    fn expense_delta_is_signed() {
        assert_eq!(expense_delta(dec!(100), dec!(250)), dec!(150));
        assert_eq!(expense_delta(dec!(250), dec!(100)), dec!(-150));
        assert_eq!(
            apply_utilized_funds(dec!(300), dec!(-150)).unwrap(),
            dec!(150)
        );
        assert!(apply_utilized_funds(dec!(100), dec!(-150)).is_err());
    }

    proptest! {
        /// Applying per-edit deltas over any sequence of edits to one
        /// transaction leaves the totals equal to a recompute from the final
        /// state.
        #[test]
        fn delta_chain_matches_recompute(
            quantities in proptest::collection::vec(0..500i32, 1..20),
            statuses in proptest::collection::vec(0..3usize, 1..20),
        ) {
            let price = dec!(7.25);
            let all = [ReceiptStatus::Pending, ReceiptStatus::Received, ReceiptStatus::Cancelled];
            let mut totals = ParentTotals { total_sold: 0, revenue: Decimal::ZERO };
            let mut current: Option<TxnSnapshot> = None;

            for (q, s) in quantities.iter().zip(statuses.iter().cycle()) {
                let next = snap(*q, price, all[*s]);
                let delta = transaction_delta(current.as_ref(), Some(&next));
                totals = apply_to_parent(&totals, &delta).unwrap();
                current = Some(next);
            }

            let last = current.unwrap();
            prop_assert_eq!(totals.total_sold, last.sold());
            prop_assert_eq!(totals.revenue, last.revenue());
        }

        /// A delta and its exact reversal cancel out.
        #[test]
        fn reversal_restores_totals(q in 1..1000i32) {
            let price = dec!(3.50);
            let start = ParentTotals { total_sold: 10, revenue: dec!(35.00) };
            let txn = snap(q, price, ReceiptStatus::Received);
            let forward = transaction_delta(None, Some(&txn));
            let backward = transaction_delta(Some(&txn), None);
            let there = apply_to_parent(&start, &forward).unwrap();
            let back = apply_to_parent(&there, &backward).unwrap();
            prop_assert_eq!(back, start);
        }
    }
}
