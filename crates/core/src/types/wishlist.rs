//! Wishlist entries.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// A saved product.
///
/// The catalog service flattens the product into the entry, and older
/// payloads key it by `id` instead of `product_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistItem {
    #[serde(alias = "id")]
    pub product_id: ProductId,
    #[serde(default)]
    pub name: String,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub rating: Option<Decimal>,
    #[serde(default)]
    pub description: String,
}

/// Whether `product_id` is already on the wishlist.
#[must_use]
pub fn contains(items: &[WishlistItem], product_id: ProductId) -> bool {
    items.iter().any(|item| item.product_id == product_id)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_either_id_key() {
        let items: Vec<WishlistItem> = serde_json::from_str(
            r#"[{"product_id": 4, "name": "Lamp", "price": 799},
                {"id": 9, "name": "Rug", "image": null}]"#,
        )
        .unwrap();

        assert!(contains(&items, ProductId::new(4)));
        assert!(contains(&items, ProductId::new(9)));
        assert!(!contains(&items, ProductId::new(5)));
        assert_eq!(items[0].price, Some(Decimal::new(799, 0)));
        assert_eq!(items[1].price, None);
    }
}
