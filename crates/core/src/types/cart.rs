//! Cart lines and the visitor's line selection.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{CartLineId, ProductId};
use super::product::Product;

/// A cart line as returned by the cart service.
///
/// `checked` never travels to the cart service; it reflects the visitor's
/// selection and is filled in by [`CartSelection::apply`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub cart_id: CartLineId,
    pub product: Product,
    pub quantity: u32,
    /// Unit price recorded on the line, when the service sends one.
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub checked: bool,
}

impl CartItem {
    /// Unit price, preferring the price recorded on the line.
    #[must_use]
    pub fn unit_price(&self) -> Decimal {
        self.price.unwrap_or(self.product.price)
    }

    /// Product id of the line.
    #[must_use]
    pub const fn product_id(&self) -> ProductId {
        self.product.id
    }
}

/// Direction of a one-step quantity change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantityChange {
    /// Sent upstream as `add`.
    #[serde(alias = "add")]
    Increase,
    /// Sent upstream as `subtract`.
    #[serde(alias = "subtract")]
    Decrease,
}

impl QuantityChange {
    /// Method name used by the cart and stock endpoints.
    #[must_use]
    pub const fn method(self) -> &'static str {
        match self {
            Self::Increase => "add",
            Self::Decrease => "subtract",
        }
    }

    /// Quantity after applying the change, or `None` if it would drop below one.
    #[must_use]
    pub const fn apply(self, quantity: u32) -> Option<u32> {
        match self {
            Self::Increase => quantity.checked_add(1),
            Self::Decrease if quantity > 1 => Some(quantity - 1),
            Self::Decrease => None,
        }
    }
}

/// Cart lines the visitor ticked for checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSelection {
    selected: BTreeSet<CartLineId>,
}

impl CartSelection {
    /// Flip one line. Returns whether it is now selected.
    pub fn toggle(&mut self, id: CartLineId) -> bool {
        if self.selected.remove(&id) {
            false
        } else {
            self.selected.insert(id);
            true
        }
    }

    /// Set one line's selection explicitly.
    pub fn set(&mut self, id: CartLineId, checked: bool) {
        if checked {
            self.selected.insert(id);
        } else {
            self.selected.remove(&id);
        }
    }

    /// Select every line of `items`.
    pub fn select_all(&mut self, items: &[CartItem]) {
        self.selected = items.iter().map(|item| item.cart_id).collect();
    }

    /// Drop every selection.
    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Forget one line, e.g. after it was removed from the cart.
    pub fn forget(&mut self, id: CartLineId) {
        self.selected.remove(&id);
    }

    #[must_use]
    pub fn contains(&self, id: CartLineId) -> bool {
        self.selected.contains(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Drop ids that are no longer in the cart and mark `checked` on the rest.
    pub fn apply(&mut self, items: &mut [CartItem]) {
        self.selected
            .retain(|id| items.iter().any(|item| item.cart_id == *id));
        for item in items.iter_mut() {
            item.checked = self.selected.contains(&item.cart_id);
        }
    }
}

/// Selected lines of `items`, in cart order.
#[must_use]
pub fn selected_items(items: &[CartItem]) -> Vec<CartItem> {
    items.iter().filter(|item| item.checked).cloned().collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(id: i64, price: i64) -> CartItem {
        serde_json::from_value(serde_json::json!({
            "cart_id": id,
            "product": {"id": id * 10, "name": format!("Item {id}"), "price": price},
            "quantity": 1
        }))
        .unwrap()
    }

    #[test]
    fn test_unit_price_prefers_line_price() {
        let mut line = item(1, 100);
        assert_eq!(line.unit_price(), Decimal::new(100, 0));
        line.price = Some(Decimal::new(90, 0));
        assert_eq!(line.unit_price(), Decimal::new(90, 0));
    }

    #[test]
    fn test_quantity_never_drops_below_one() {
        assert_eq!(QuantityChange::Decrease.apply(2), Some(1));
        assert_eq!(QuantityChange::Decrease.apply(1), None);
        assert_eq!(QuantityChange::Increase.apply(1), Some(2));
    }

    #[test]
    fn test_quantity_change_accepts_method_names() {
        let change: QuantityChange = serde_json::from_str("\"add\"").unwrap();
        assert_eq!(change, QuantityChange::Increase);
        let change: QuantityChange = serde_json::from_str("\"decrease\"").unwrap();
        assert_eq!(change.method(), "subtract");
    }

    #[test]
    fn test_selection_prunes_removed_lines() {
        let mut selection = CartSelection::default();
        selection.set(CartLineId::new(1), true);
        selection.set(CartLineId::new(2), true);

        let mut items = vec![item(2, 50), item(3, 70)];
        selection.apply(&mut items);

        assert_eq!(selection.len(), 1);
        assert!(items[0].checked);
        assert!(!items[1].checked);
        assert_eq!(selected_items(&items).len(), 1);
    }

    #[test]
    fn test_toggle_and_select_all() {
        let items = vec![item(1, 10), item(2, 20)];
        let mut selection = CartSelection::default();
        assert!(selection.toggle(CartLineId::new(1)));
        assert!(!selection.toggle(CartLineId::new(1)));
        selection.select_all(&items);
        assert_eq!(selection.len(), 2);
        selection.clear();
        assert!(selection.is_empty());
    }
}
