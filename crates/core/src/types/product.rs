//! Catalog products, the seller product form, and listing filters.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{CatalogEntityId, ImageId, ProductId, VariantId};
use super::status::{DiscountType, StockStatus};
use super::validation::{FieldErrors, SKU_PATTERN};

/// Product image reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProductImage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ImageId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub url: String,
    /// Inline (base64) image data uploaded by the seller form.
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub is_main: bool,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: String,
}

impl ProductImage {
    /// Whether the image carries any content.
    #[must_use]
    pub fn has_content(&self) -> bool {
        !self.url.is_empty() || !self.image.is_empty()
    }
}

/// Purchasable variant of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProductVariant {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<VariantId>,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub quantity: Option<i64>,
}

/// Free-form name/value attribute (material, fit, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProductAttribute {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: String,
}

/// Shipping dimensions. Lengths are in `dimension_unit`, weight in kg.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProductDimensions {
    #[serde(default)]
    pub dimension_unit: String,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub length: Decimal,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub width: Decimal,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub height: Decimal,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub weight: Decimal,
}

/// One entry of a seller-defined extra section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalField {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default)]
    pub field_type: String,
    #[serde(default)]
    pub placeholder: String,
}

/// Seller-defined extra section ("Meta Data", "Shape", ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalSection {
    #[serde(default)]
    pub main_title: String,
    #[serde(default)]
    pub fields: Vec<AdditionalField>,
}

/// A catalog product.
///
/// Cart lines embed a denormalized copy of this record, so everything except
/// the id, name and price is optional on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub short_desc: String,
    #[serde(default)]
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub compare_price: Decimal,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub cost_price: Decimal,
    /// Percentage off `price`.
    #[serde(default, with = "rust_decimal::serde::float")]
    pub discount: Decimal,
    #[serde(default)]
    pub discount_type: DiscountType,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub tax: Decimal,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub stock_status: StockStatus,
    #[serde(default = "default_true")]
    pub in_stock: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub rating: Decimal,
    #[serde(default)]
    pub brand_id: Option<CatalogEntityId>,
    #[serde(default)]
    pub category_id: Option<CatalogEntityId>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub images: Vec<ProductImage>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub variants: Vec<ProductVariant>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub attributes: Vec<ProductAttribute>,
    #[serde(flatten)]
    pub dimensions: ProductDimensions,
    #[serde(default)]
    pub meta_title: String,
    #[serde(default)]
    pub meta_description: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub additional: Vec<AdditionalSection>,
}

const fn default_true() -> bool {
    true
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Kind of catalog taxonomy entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogEntityType {
    Category,
    Brand,
    #[serde(other)]
    Other,
}

/// Category or brand, as listed by `/products/categories`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntity {
    pub entity_id: CatalogEntityId,
    pub entity_name: String,
    pub entity_type: CatalogEntityType,
}

/// Listing filter, sent as the query string of `/products/filter`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductFilter {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Vec<CatalogEntityId>,
    #[serde(default)]
    pub brand: Vec<CatalogEntityId>,
    #[serde(default)]
    pub min_price: Option<Decimal>,
    #[serde(default)]
    pub max_price: Option<Decimal>,
    #[serde(default)]
    pub min_rating: Option<Decimal>,
}

impl ProductFilter {
    /// Whether no criterion is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.query_pairs().is_empty()
    }

    /// Query parameters, skipping unset criteria. Multi-valued criteria are
    /// comma-joined.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        fn join(ids: &[CatalogEntityId]) -> String {
            ids.iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(",")
        }

        let mut pairs = Vec::new();
        if let Some(name) = self.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            pairs.push(("name", name.to_owned()));
        }
        if !self.category.is_empty() {
            pairs.push(("category", join(&self.category)));
        }
        if !self.brand.is_empty() {
            pairs.push(("brand", join(&self.brand)));
        }
        if let Some(min) = self.min_price {
            pairs.push(("min_price", min.to_string()));
        }
        if let Some(max) = self.max_price {
            pairs.push(("max_price", max.to_string()));
        }
        if let Some(rating) = self.min_rating {
            pairs.push(("min_rating", rating.to_string()));
        }
        pairs
    }
}

/// Seller product form for create and update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub short_desc: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub compare_price: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub cost_price: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub discount: Option<Decimal>,
    #[serde(default)]
    pub discount_type: DiscountType,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub tax: Option<Decimal>,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub stock_status: StockStatus,
    #[serde(default = "default_true")]
    pub in_stock: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub brand_id: Option<CatalogEntityId>,
    #[serde(default)]
    pub category_id: Option<CatalogEntityId>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(flatten)]
    pub dimensions: ProductDimensions,
    #[serde(default)]
    pub meta_title: String,
    #[serde(default)]
    pub meta_description: String,
    #[serde(default)]
    pub variants: Vec<ProductVariant>,
    #[serde(default)]
    pub attributes: Vec<ProductAttribute>,
    #[serde(default)]
    pub additional: Vec<AdditionalSection>,
    #[serde(default)]
    pub images: Vec<ProductImage>,
}

impl ProductDraft {
    /// Most images a product may carry.
    pub const MAX_IMAGES: usize = 5;

    /// Validate the seller form, variants included.
    ///
    /// # Errors
    ///
    /// Returns every failing field; variant fields are keyed `variants[i].field`.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();

        if !errors.require("name", &self.name, "Product name is required")
            && self.name.chars().count() < 3
        {
            errors.add("name", "Product name must be at least 3 characters");
        }

        if !errors.require("sku", &self.sku, "SKU is required") && !SKU_PATTERN.is_match(&self.sku)
        {
            errors.add(
                "sku",
                "SKU can only contain letters, numbers, hyphens, and underscores",
            );
        }

        if !errors.require("short_desc", &self.short_desc, "Short description is required")
            && self.short_desc.chars().count() < 10
        {
            errors.add(
                "short_desc",
                "Short description must be at least 10 characters",
            );
        }

        if !errors.require("description", &self.description, "Description is required")
            && self.description.chars().count() < 20
        {
            errors.add("description", "Description must be at least 20 characters");
        }

        match self.price {
            None => errors.add("price", "Price is required"),
            Some(price) if price <= Decimal::ZERO => {
                errors.add("price", "Price must be a positive number");
            }
            Some(_) => {}
        }

        match self.quantity {
            None => errors.add("quantity", "Quantity is required"),
            Some(qty) if qty < 0 => {
                errors.add("quantity", "Quantity must be a non-negative number");
            }
            Some(_) => {}
        }

        if self.images.len() > Self::MAX_IMAGES {
            errors.add(
                "images",
                format!("You can add up to {} images", Self::MAX_IMAGES),
            );
        }

        let mut used_skus = HashSet::new();
        for (i, variant) in self.variants.iter().enumerate() {
            let field = |name: &str| format!("variants[{i}].{name}");

            if variant.sku.trim().is_empty() {
                errors.add(field("sku"), "Variant SKU is required");
            } else if !SKU_PATTERN.is_match(&variant.sku) {
                errors.add(
                    field("sku"),
                    "Variant SKU can only contain letters, numbers, hyphens, and underscores",
                );
            } else if !used_skus.insert(variant.sku.as_str()) {
                errors.add(
                    field("sku"),
                    "Duplicate SKU found. Each variant must have a unique SKU",
                );
            }

            errors.require(&field("name"), &variant.name, "Variant name is required");

            match variant.price {
                None => errors.add(field("price"), "Variant price is required"),
                Some(price) if price <= Decimal::ZERO => {
                    errors.add(field("price"), "Variant price must be a positive number");
                }
                Some(_) => {}
            }

            match variant.quantity {
                None => errors.add(field("quantity"), "Variant quantity is required"),
                Some(qty) if qty < 0 => errors.add(
                    field("quantity"),
                    "Variant quantity must be a non-negative number",
                ),
                Some(_) => {}
            }
        }

        errors.into_result()
    }

    /// Fill the defaults the catalog expects before the draft is sent.
    ///
    /// Meta fields fall back to the name and short description, and images
    /// without a URL or inline data are dropped.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.sku = self.sku.trim().to_owned();
        if self.meta_title.trim().is_empty() {
            self.meta_title.clone_from(&self.name);
        }
        if self.meta_description.trim().is_empty() {
            self.meta_description.clone_from(&self.short_desc);
        }
        self.images.retain(ProductImage::has_content);
        self.tags.retain(|t| !t.trim().is_empty());
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn draft() -> ProductDraft {
        ProductDraft {
            name: "Linen Shirt".to_string(),
            sku: "LIN-SHIRT_01".to_string(),
            short_desc: "Breathable summer shirt".to_string(),
            description: "A relaxed fit linen shirt for hot afternoons.".to_string(),
            price: Some(Decimal::new(149_900, 2)),
            quantity: Some(25),
            ..ProductDraft::default()
        }
    }

    fn variant(sku: &str) -> ProductVariant {
        ProductVariant {
            id: None,
            sku: sku.to_string(),
            name: "Large".to_string(),
            price: Some(Decimal::new(1599, 0)),
            quantity: Some(3),
        }
    }

    #[test]
    fn test_product_tolerates_sparse_snapshot() {
        let product: Product = serde_json::from_str(
            r#"{"id": 3, "name": "Mug", "price": 249.5, "discount": 10, "images": null}"#,
        )
        .unwrap();
        assert!(product.in_stock);
        assert!(product.images.is_empty());
        assert_eq!(product.discount, Decimal::new(10, 0));
    }

    #[test]
    fn test_valid_draft() {
        assert!(draft().validate().is_ok());
    }

    #[test]
    fn test_draft_field_rules() {
        let bad = ProductDraft {
            name: "ab".to_string(),
            sku: "bad sku".to_string(),
            short_desc: "short".to_string(),
            description: "too short".to_string(),
            price: Some(Decimal::ZERO),
            quantity: Some(-1),
            ..draft()
        };
        let errors = bad.validate().unwrap_err();
        for field in ["name", "sku", "short_desc", "description", "price", "quantity"] {
            assert!(errors.get(field).is_some(), "{field}");
        }
    }

    #[test]
    fn test_zero_quantity_is_allowed() {
        let input = ProductDraft {
            quantity: Some(0),
            ..draft()
        };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_image_cap() {
        let image = ProductImage {
            url: "https://img/x.jpg".to_string(),
            ..ProductImage::default()
        };
        let at_cap = ProductDraft {
            images: vec![image.clone(); ProductDraft::MAX_IMAGES],
            ..draft()
        };
        assert!(at_cap.validate().is_ok());

        let over = ProductDraft {
            images: vec![image; ProductDraft::MAX_IMAGES + 1],
            ..draft()
        };
        assert_eq!(
            over.validate().unwrap_err().get("images"),
            Some("You can add up to 5 images")
        );
    }

    #[test]
    fn test_draft_keeps_shape_and_additional_sections() {
        let input: ProductDraft = serde_json::from_value(serde_json::json!({
            "name": "Linen Shirt",
            "cost_price": 700,
            "dimension_unit": "cm",
            "length": 30, "width": 20, "height": 2.5, "weight": 0.3,
            "additional": [{
                "mainTitle": "Shape",
                "fields": [{"title": "weight", "value": 0.3, "fieldType": "number"}]
            }]
        }))
        .unwrap();
        assert_eq!(input.cost_price, Some(Decimal::new(700, 0)));
        assert_eq!(input.dimensions.dimension_unit, "cm");
        assert_eq!(input.dimensions.height, Decimal::new(25, 1));
        assert_eq!(input.additional[0].fields[0].field_type, "number");

        let body = serde_json::to_value(&input).unwrap();
        assert_eq!(body["dimension_unit"], "cm");
        assert_eq!(body["weight"], 0.3);
        assert_eq!(body["additional"][0]["mainTitle"], "Shape");
        assert!(body.get("dimensions").is_none());
    }

    #[test]
    fn test_product_reads_cost_dimensions_and_meta() {
        let product: Product = serde_json::from_value(serde_json::json!({
            "id": 9, "name": "Desk", "price": 4999,
            "cost_price": 3200, "length": 120, "dimension_unit": "cm",
            "meta_title": "Oak desk", "additional": null
        }))
        .unwrap();
        assert_eq!(product.cost_price, Decimal::new(3200, 0));
        assert_eq!(product.dimensions.length, Decimal::new(120, 0));
        assert_eq!(product.meta_title, "Oak desk");
        assert!(product.additional.is_empty());
    }

    #[test]
    fn test_duplicate_variant_sku() {
        let input = ProductDraft {
            variants: vec![variant("LIN-L"), variant("LIN-L")],
            ..draft()
        };
        let errors = input.validate().unwrap_err();
        assert!(errors.get("variants[0].sku").is_none());
        assert_eq!(
            errors.get("variants[1].sku"),
            Some("Duplicate SKU found. Each variant must have a unique SKU")
        );
    }

    #[test]
    fn test_variant_missing_price() {
        let mut v = variant("LIN-M");
        v.price = None;
        let input = ProductDraft {
            variants: vec![v],
            ..draft()
        };
        assert_eq!(
            input.validate().unwrap_err().get("variants[0].price"),
            Some("Variant price is required")
        );
    }

    #[test]
    fn test_normalized_fills_meta_and_drops_empty_images() {
        let input = ProductDraft {
            images: vec![
                ProductImage::default(),
                ProductImage {
                    url: "https://img/x.jpg".to_string(),
                    ..ProductImage::default()
                },
            ],
            ..draft()
        }
        .normalized();
        assert_eq!(input.meta_title, "Linen Shirt");
        assert_eq!(input.meta_description, "Breathable summer shirt");
        assert_eq!(input.images.len(), 1);
    }

    #[test]
    fn test_filter_query_pairs() {
        let filter = ProductFilter {
            name: Some("  shirt ".to_string()),
            category: vec![CatalogEntityId::new(1), CatalogEntityId::new(4)],
            min_price: Some(Decimal::new(500, 0)),
            ..ProductFilter::default()
        };
        assert_eq!(
            filter.query_pairs(),
            vec![
                ("name", "shirt".to_string()),
                ("category", "1,4".to_string()),
                ("min_price", "500".to_string()),
            ]
        );
        assert!(ProductFilter::default().is_empty());
    }
}
