//! Order money math.
//!
//! Amounts are `Decimal` end to end and rounded half away from zero to two
//! places whenever a value is stored.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::PaymentStatus;

pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

pub fn line_subtotal(unit_price: Decimal, quantity: i32) -> Decimal {
    round2(unit_price * Decimal::from(quantity))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
}

impl OrderTotals {
    /// `total == round(subtotal + tax - discount, 2)`
    pub fn compute(
        line_subtotals: impl IntoIterator<Item = Decimal>,
        tax_rate: Decimal,
        discount: Decimal,
    ) -> Self {
        let subtotal = round2(line_subtotals.into_iter().sum());
        let tax = round2(subtotal * tax_rate);
        let discount = round2(discount);
        Self {
            subtotal,
            tax,
            discount,
            total: round2(subtotal + tax - discount),
        }
    }

    /// Largest discount that keeps the total non-negative.
    pub fn max_discount(&self) -> Decimal {
        self.subtotal + self.tax
    }
}

/// Derived payment position of an order; nothing of this is stored except
/// the status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Balance {
    pub total: Decimal,
    pub paid: Decimal,
    /// What is still owed, never below zero.
    pub balance: Decimal,
    /// Amount paid beyond the total, returned to the client as change.
    pub change_due: Decimal,
    pub payment_status: PaymentStatus,
}

impl Balance {
    pub fn new(total: Decimal, paid: Decimal) -> Self {
        let outstanding = round2(total - paid);
        Self {
            total,
            paid,
            balance: outstanding.max(Decimal::ZERO),
            change_due: (-outstanding).max(Decimal::ZERO),
            payment_status: payment_status(total, paid),
        }
    }
}

pub fn payment_status(total: Decimal, paid: Decimal) -> PaymentStatus {
    if paid <= Decimal::ZERO {
        PaymentStatus::Pending
    } else if paid >= total {
        PaymentStatus::Paid
    } else {
        PaymentStatus::Partial
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn service_and_products_with_vat() {
        let lines = [line_subtotal(d("500.00"), 1), line_subtotal(d("50.00"), 2)];
        let totals = OrderTotals::compute(lines, d("0.16"), Decimal::ZERO);

        assert_eq!(totals.subtotal, d("600.00"));
        assert_eq!(totals.tax, d("96.00"));
        assert_eq!(totals.total, d("696.00"));
    }

    #[test]
    fn reservation_price_with_vat() {
        let totals = OrderTotals::compute([d("300")], d("0.16"), Decimal::ZERO);
        assert_eq!(totals.subtotal, d("300.00"));
        assert_eq!(totals.tax, d("48.00"));
        assert_eq!(totals.total, d("348.00"));
    }

    #[test]
    fn discount_comes_off_the_total() {
        let totals = OrderTotals::compute([d("600")], d("0.16"), d("46"));
        assert_eq!(totals.total, d("650.00"));
        assert_eq!(totals.total, round2(totals.subtotal + totals.tax - totals.discount));
    }

    #[test]
    fn tax_rounds_half_away_from_zero() {
        // 10.03 * 0.16 = 1.6048
        assert_eq!(OrderTotals::compute([d("10.03")], d("0.16"), Decimal::ZERO).tax, d("1.60"));
        assert_eq!(OrderTotals::compute([d("0.0625")], d("0.16"), Decimal::ZERO).subtotal, d("0.06"));
        assert_eq!(round2(d("2.005")), d("2.01"));
    }

    #[test]
    fn empty_order_is_all_zero() {
        let totals = OrderTotals::compute(Vec::new(), d("0.16"), Decimal::ZERO);
        assert_eq!(totals.total, Decimal::ZERO);
    }

    #[test]
    fn full_payment_clears_the_balance() {
        let balance = Balance::new(d("696.00"), d("696.00"));
        assert_eq!(balance.balance, d("0.00"));
        assert_eq!(balance.change_due, Decimal::ZERO);
        assert_eq!(balance.payment_status, PaymentStatus::Paid);
    }

    #[test]
    fn overpayment_is_reported_as_change() {
        let balance = Balance::new(d("696.00"), d("700.00"));
        assert_eq!(balance.balance, Decimal::ZERO);
        assert_eq!(balance.change_due, d("4.00"));
        assert_eq!(balance.payment_status, PaymentStatus::Paid);
    }

    #[test]
    fn partial_and_pending() {
        assert_eq!(payment_status(d("696"), d("100")), PaymentStatus::Partial);
        assert_eq!(payment_status(d("696"), Decimal::ZERO), PaymentStatus::Pending);
        assert_eq!(Balance::new(d("696"), d("100")).balance, d("596.00"));
    }
}
