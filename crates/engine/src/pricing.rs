//! Invoice arithmetic.
//!
//! Pure functions: no storage access, so every rule here is unit tested.

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::{DiscountRate, EngineError, InvoiceLine, Product, ResultEngine};

/// Money totals of an invoice, all in minor units.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InvoiceTotals {
    pub subtotal: i64,
    pub discount_amount: i64,
    pub total_amount: i64,
    pub amount_paid: i64,
    pub balance_due: i64,
}

impl InvoiceTotals {
    /// Sum the lines, apply the discount and check the up-front payment.
    pub fn compute(
        lines: &[InvoiceLine],
        discount: DiscountRate,
        amount_paid: i64,
    ) -> ResultEngine<Self> {
        if amount_paid < 0 {
            return Err(EngineError::Validation(
                "Payment amount cannot be negative".to_string(),
            ));
        }

        let subtotal = lines
            .iter()
            .try_fold(0i64, |acc, line| acc.checked_add(line.line_total))
            .ok_or_else(|| EngineError::Validation("invoice total too large".to_string()))?;
        let discount_amount = discount.apply(subtotal);
        let total_amount = subtotal - discount_amount;

        if amount_paid > total_amount {
            return Err(EngineError::Overpayment(format!(
                "Payment amount ({amount_paid}) exceeds total invoice amount ({total_amount})"
            )));
        }

        Ok(Self {
            subtotal,
            discount_amount,
            total_amount,
            amount_paid,
            balance_due: total_amount - amount_paid,
        })
    }
}

/// Price one line at the product's current selling price.
pub fn price_line(product: &Product, quantity: i64) -> ResultEngine<InvoiceLine> {
    let line_total = product
        .selling_price
        .checked_mul(quantity)
        .ok_or_else(|| EngineError::Validation(format!("line total too large for {}", product.name)))?;

    Ok(InvoiceLine {
        product_id: product.id,
        product_name: product.name.clone(),
        quantity,
        unit_price: product.selling_price,
        tax_rate: product.tax_rate,
        line_total,
    })
}

/// Per-product `(quantity, subtotal)`, merging duplicate lines.
pub fn per_product(lines: &[InvoiceLine]) -> BTreeMap<Uuid, (i64, i64)> {
    let mut merged = BTreeMap::new();
    for line in lines {
        let entry = merged.entry(line.product_id).or_insert((0, 0));
        entry.0 += line.quantity;
        entry.1 += line.line_total;
    }
    merged
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn product(name: &str, price: i64) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: name.to_string(),
            product_code: format!("{name}-code"),
            cost_price: 0,
            selling_price: price,
            tax_rate: 0,
            category: None,
            supplier: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn single_line_partial_payment() {
        let widget = product("Widget", 1_000);
        let lines = vec![price_line(&widget, 3).unwrap()];
        let totals = InvoiceTotals::compute(&lines, DiscountRate::NONE, 1_000).unwrap();
        assert_eq!(
            totals,
            InvoiceTotals {
                subtotal: 3_000,
                discount_amount: 0,
                total_amount: 3_000,
                amount_paid: 1_000,
                balance_due: 2_000,
            }
        );
    }

    #[test]
    fn discount_then_full_payment() {
        let a = product("A", 5_000);
        let b = product("B", 2_500);
        let lines = vec![price_line(&a, 2).unwrap(), price_line(&b, 4).unwrap()];
        let discount = DiscountRate::from_percent(10.0).unwrap();
        let totals = InvoiceTotals::compute(&lines, discount, 18_000).unwrap();
        assert_eq!(totals.subtotal, 20_000);
        assert_eq!(totals.discount_amount, 2_000);
        assert_eq!(totals.total_amount, 18_000);
        assert_eq!(totals.balance_due, 0);
    }

    #[test]
    fn discount_rounds_half_up() {
        let a = product("A", 333);
        let lines = vec![price_line(&a, 1).unwrap()];
        let discount = DiscountRate::from_percent(12.5).unwrap();
        // 333 * 0.125 = 41.625
        let totals = InvoiceTotals::compute(&lines, discount, 0).unwrap();
        assert_eq!(totals.discount_amount, 42);
        assert_eq!(totals.total_amount, 291);
    }

    #[test]
    fn payment_above_total_is_rejected() {
        let a = product("A", 500);
        let lines = vec![price_line(&a, 1).unwrap()];
        let err = InvoiceTotals::compute(&lines, DiscountRate::NONE, 501).unwrap_err();
        assert!(matches!(err, EngineError::Overpayment(_)));
    }

    #[test]
    fn negative_payment_is_rejected() {
        let err = InvoiceTotals::compute(&[], DiscountRate::NONE, -1).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn duplicate_lines_are_merged_per_product() {
        let a = product("A", 100);
        let b = product("B", 10);
        let lines = vec![
            price_line(&a, 2).unwrap(),
            price_line(&b, 1).unwrap(),
            price_line(&a, 3).unwrap(),
        ];
        let merged = per_product(&lines);
        assert_eq!(merged[&a.id], (5, 500));
        assert_eq!(merged[&b.id], (1, 10));
    }
}
