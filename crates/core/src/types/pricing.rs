//! Cart and checkout totals.
//!
//! Tax applies to the discounted subtotal, and the grand total is what the
//! payment service is asked to charge.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::cart::CartItem;
use super::price::round_money;

/// Flat tax rate, in percent.
pub const TAX_RATE_PERCENT: Decimal = Decimal::from_parts(18, 0, 0, false, 0);

/// Grand total at which shipping becomes free.
pub const FREE_SHIPPING_THRESHOLD: Decimal = Decimal::from_parts(1000, 0, 0, false, 0);

/// Totals over a set of cart lines, rounded to two decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CartTotals {
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub discount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub tax: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub grand_total: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub free_shipping_remaining: Decimal,
    pub item_count: u32,
}

impl CartTotals {
    /// Compute totals over `items`.
    ///
    /// Intermediate sums keep full precision; only the reported figures are
    /// rounded.
    #[must_use]
    pub fn compute<'a, I>(items: I) -> Self
    where
        I: IntoIterator<Item = &'a CartItem>,
    {
        let mut total = Decimal::ZERO;
        let mut discount = Decimal::ZERO;
        let mut item_count = 0_u32;

        for item in items {
            let line = item.unit_price() * Decimal::from(item.quantity);
            total += line;
            discount += line * item.product.discount / Decimal::ONE_HUNDRED;
            item_count = item_count.saturating_add(item.quantity);
        }

        let subtotal = total - discount;
        let tax = subtotal * TAX_RATE_PERCENT / Decimal::ONE_HUNDRED;
        let grand_total = subtotal + tax;
        let free_shipping_remaining = (FREE_SHIPPING_THRESHOLD - grand_total).max(Decimal::ZERO);

        Self {
            total: round_money(total),
            discount: round_money(discount),
            subtotal: round_money(subtotal),
            tax: round_money(tax),
            grand_total: round_money(grand_total),
            free_shipping_remaining: round_money(free_shipping_remaining),
            item_count,
        }
    }
}

/// Line amount after the product's percentage discount.
#[must_use]
pub fn discounted_line_total(item: &CartItem) -> Decimal {
    round_money(
        item.unit_price()
            * Decimal::from(item.quantity)
            * (Decimal::ONE - item.product.discount / Decimal::ONE_HUNDRED),
    )
}

/// A cart line serialized together with its discounted amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PricedLine {
    #[serde(flatten)]
    pub item: CartItem,
    #[serde(with = "rust_decimal::serde::float")]
    pub line_total: Decimal,
}

impl From<CartItem> for PricedLine {
    fn from(item: CartItem) -> Self {
        Self {
            line_total: discounted_line_total(&item),
            item,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(price: &str, quantity: u32, discount: &str) -> CartItem {
        serde_json::from_value(serde_json::json!({
            "cart_id": 1,
            "product": {
                "id": 1,
                "name": "Thing",
                "price": price.parse::<f64>().unwrap(),
                "discount": discount.parse::<f64>().unwrap()
            },
            "quantity": quantity
        }))
        .unwrap()
    }

    #[test]
    fn test_totals_follow_the_documented_formula() {
        let items = [line("500", 2, "10"), line("100", 1, "0")];
        let totals = CartTotals::compute(&items);

        assert_eq!(totals.total, Decimal::new(1100, 0));
        assert_eq!(totals.discount, Decimal::new(100, 0));
        assert_eq!(totals.subtotal, Decimal::new(1000, 0));
        assert_eq!(totals.tax, Decimal::new(180, 0));
        assert_eq!(totals.grand_total, Decimal::new(1180, 0));
        assert!(totals.free_shipping_remaining.is_zero());
        assert_eq!(totals.item_count, 3);
    }

    #[test]
    fn test_free_shipping_remaining() {
        let totals = CartTotals::compute(&[line("250", 1, "0")]);
        // 250 + 45 tax
        assert_eq!(totals.grand_total, Decimal::new(295, 0));
        assert_eq!(totals.free_shipping_remaining, Decimal::new(705, 0));
    }

    #[test]
    fn test_rounds_to_two_places() {
        let totals = CartTotals::compute(&[line("33.33", 1, "15")]);
        // 33.33 * 0.15 = 4.9995
        assert_eq!(totals.discount, Decimal::new(500, 2));
        assert_eq!(totals.subtotal, Decimal::new(2833, 2));
        assert_eq!(
            discounted_line_total(&line("33.33", 1, "15")),
            Decimal::new(2833, 2)
        );
    }

    #[test]
    fn test_priced_line_carries_discounted_amount() {
        let priced = PricedLine::from(line("500", 2, "10"));
        assert_eq!(priced.line_total, Decimal::new(900, 0));

        let json = serde_json::to_value(&priced).unwrap();
        assert_eq!(json["cart_id"], 1);
        assert_eq!(json["quantity"], 2);
        assert_eq!(json["line_total"], 900.0);
    }

    #[test]
    fn test_empty_cart() {
        let totals = CartTotals::compute(&Vec::<CartItem>::new());
        assert_eq!(totals, CartTotals {
            free_shipping_remaining: Decimal::new(1000, 0),
            ..CartTotals::default()
        });
    }
}
