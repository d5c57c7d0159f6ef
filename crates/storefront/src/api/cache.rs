//! Cache types for catalog responses.

use bazaar_core::{CatalogEntity, Product, ProductFilter, ProductId};

/// Cache key for catalog reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(ProductId),
    Products,
    Filtered(ProductFilter),
    Categories,
    Deals,
    Offers,
    Featured,
}

impl CacheKey {
    /// Whether this entry is a listing that seller writes make stale.
    pub const fn is_listing(&self) -> bool {
        !matches!(self, Self::Product(_) | Self::Categories)
    }
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(Vec<Product>),
    Entities(Vec<CatalogEntity>),
}
