//! Catalog service client: products, seller listings, stock and wishlist.
//!
//! Public reads are cached via `moka`. Seller writes drop the cached
//! listings, and a stock adjustment drops that product's detail entry.

use std::time::Duration;

use bazaar_core::{
    CatalogEntity, Product, ProductDraft, ProductFilter, ProductId, QuantityChange, WishlistItem,
};
use moka::future::Cache;
use reqwest::Method;
use serde_json::json;
use tracing::{debug, instrument};

use super::cache::{CacheKey, CacheValue};
use super::{ApiError, CallContext, ServiceClient};

/// Maximum number of cached catalog entries.
const CACHE_CAPACITY: u64 = 1000;

/// Client for the catalog service.
#[derive(Clone)]
pub struct CatalogClient {
    http: ServiceClient,
    cache: Cache<CacheKey, CacheValue>,
}

impl std::fmt::Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("http", &self.http)
            .field("cached_entries", &self.cache.entry_count())
            .finish()
    }
}

impl CatalogClient {
    #[must_use]
    pub fn new(http: ServiceClient, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(ttl)
            .support_invalidation_closures()
            .build();
        Self { http, cache }
    }

    // =========================================================================
    // Public catalog
    // =========================================================================

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, ctx))]
    pub async fn products(&self, ctx: &CallContext) -> Result<Vec<Product>, ApiError> {
        self.cached_products(CacheKey::Products, ctx, "/products", &[])
            .await
    }

    /// Filtered listing. An empty filter is the plain listing.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, ctx))]
    pub async fn filter(
        &self,
        ctx: &CallContext,
        filter: &ProductFilter,
    ) -> Result<Vec<Product>, ApiError> {
        if filter.is_empty() {
            return self.products(ctx).await;
        }
        let query = filter.query_pairs();
        self.cached_products(
            CacheKey::Filtered(filter.clone()),
            ctx,
            "/products/filter",
            &query,
        )
        .await
    }

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, ctx))]
    pub async fn deals(&self, ctx: &CallContext) -> Result<Vec<Product>, ApiError> {
        self.cached_products(CacheKey::Deals, ctx, "/products/deals", &[])
            .await
    }

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, ctx))]
    pub async fn offers(&self, ctx: &CallContext) -> Result<Vec<Product>, ApiError> {
        self.cached_products(CacheKey::Offers, ctx, "/products/offers", &[])
            .await
    }

    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, ctx))]
    pub async fn featured(&self, ctx: &CallContext) -> Result<Vec<Product>, ApiError> {
        self.cached_products(CacheKey::Featured, ctx, "/products/featured", &[])
            .await
    }

    /// Categories and brands.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, ctx))]
    pub async fn categories(&self, ctx: &CallContext) -> Result<Vec<CatalogEntity>, ApiError> {
        if let Some(CacheValue::Entities(entities)) = self.cache.get(&CacheKey::Categories).await {
            debug!("Cache hit for categories");
            return Ok(entities);
        }

        let req = self.http.request(Method::GET, "/products/categories", ctx);
        let entities: Vec<CatalogEntity> = self.http.fetch_or_default(req).await?;

        self.cache
            .insert(CacheKey::Categories, CacheValue::Entities(entities.clone()))
            .await;
        Ok(entities)
    }

    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the API request fails.
    #[instrument(skip(self, ctx), fields(product_id = %id))]
    pub async fn product(&self, ctx: &CallContext, id: ProductId) -> Result<Product, ApiError> {
        let cache_key = CacheKey::Product(id);

        if let Some(CacheValue::Product(product)) = self.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let req = self.http.request(Method::GET, &format!("/product/{id}"), ctx);
        let product: Product = self
            .http
            .execute(req)
            .await?
            .data
            .ok_or_else(|| ApiError::NotFound(format!("Product not found: {id}")))?;

        self.cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;
        Ok(product)
    }

    async fn cached_products(
        &self,
        key: CacheKey,
        ctx: &CallContext,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<Product>, ApiError> {
        if let Some(CacheValue::Products(products)) = self.cache.get(&key).await {
            debug!(?key, "Cache hit for products");
            return Ok(products);
        }

        let req = self.http.request(Method::GET, path, ctx).query(query);
        let products: Vec<Product> = self.http.fetch_or_default(req).await?;

        self.cache
            .insert(key, CacheValue::Products(products.clone()))
            .await;
        Ok(products)
    }

    // =========================================================================
    // Seller
    // =========================================================================

    /// The seller's own products. Never cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is rejected or the call fails.
    #[instrument(skip(self, ctx))]
    pub async fn manage_products(&self, ctx: &CallContext) -> Result<Vec<Product>, ApiError> {
        let req = self.http.request(Method::GET, "/products/manage", ctx);
        self.http.fetch_or_default(req).await
    }

    /// # Errors
    ///
    /// Returns an error if the draft is refused.
    #[instrument(skip(self, ctx, draft), fields(sku = %draft.sku))]
    pub async fn add_product(
        &self,
        ctx: &CallContext,
        draft: &ProductDraft,
    ) -> Result<Option<String>, ApiError> {
        let req = self
            .http
            .request(Method::POST, "/product/add", ctx)
            .json(draft);
        let message = self.http.send(req).await?;
        self.invalidate_listings();
        Ok(message)
    }

    /// # Errors
    ///
    /// Returns an error if the update is refused.
    #[instrument(skip(self, ctx, draft), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        ctx: &CallContext,
        id: ProductId,
        draft: &ProductDraft,
    ) -> Result<Option<String>, ApiError> {
        let req = self
            .http
            .request(Method::PUT, &format!("/product/update/{id}"), ctx)
            .json(draft);
        let message = self.http.send(req).await?;
        self.invalidate_listings();
        self.cache.invalidate(&CacheKey::Product(id)).await;
        Ok(message)
    }

    // =========================================================================
    // Stock
    // =========================================================================

    /// Adjust a product's stock by `quantity`.
    ///
    /// # Errors
    ///
    /// Returns the service error unchanged so the caller can classify it.
    #[instrument(skip(self, ctx), fields(product_id = %id, method = change.method()))]
    pub async fn update_quantity(
        &self,
        ctx: &CallContext,
        id: ProductId,
        quantity: u32,
        change: QuantityChange,
    ) -> Result<(), ApiError> {
        let req = self
            .http
            .request(Method::POST, &format!("/product/{id}/update-quantity"), ctx)
            .json(&json!({ "quantity": quantity, "method": change.method() }));
        self.http.send(req).await?;
        self.cache.invalidate(&CacheKey::Product(id)).await;
        Ok(())
    }

    // =========================================================================
    // Wishlist
    // =========================================================================

    /// # Errors
    ///
    /// Returns an error if the call fails.
    #[instrument(skip(self, ctx))]
    pub async fn wishlist(&self, ctx: &CallContext) -> Result<Vec<WishlistItem>, ApiError> {
        let req = self.http.request(Method::GET, "/user/wishlist", ctx);
        self.http.fetch_or_default(req).await
    }

    /// # Errors
    ///
    /// Returns an error if the product can't be added.
    #[instrument(skip(self, ctx))]
    pub async fn add_to_wishlist(
        &self,
        ctx: &CallContext,
        product_id: ProductId,
    ) -> Result<Option<String>, ApiError> {
        let req = self
            .http
            .request(Method::POST, "/user/wishlist/add", ctx)
            .json(&json!({ "product_id": product_id }));
        self.http.send(req).await
    }

    /// # Errors
    ///
    /// Returns an error if the product can't be removed.
    #[instrument(skip(self, ctx))]
    pub async fn remove_from_wishlist(
        &self,
        ctx: &CallContext,
        product_id: ProductId,
    ) -> Result<Option<String>, ApiError> {
        let req = self.http.request(
            Method::DELETE,
            &format!("/user/wishlist/remove/{product_id}"),
            ctx,
        );
        self.http.send(req).await
    }

    fn invalidate_listings(&self) {
        if let Err(e) = self.cache.invalidate_entries_if(|key, _| key.is_listing()) {
            tracing::warn!(error = %e, "Failed to invalidate catalog listings");
        }
    }
}
