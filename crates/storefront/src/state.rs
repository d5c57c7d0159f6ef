//! Application state shared across handlers.

use std::sync::Arc;

use crate::api::{
    CartClient, CatalogClient, OrderClient, PaymentClient, ServiceClient, UserClient,
    build_http_client,
};
use crate::config::StorefrontConfig;
use crate::services::BusyTracker;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the service clients, the catalog cache and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    http: reqwest::Client,
    users: UserClient,
    catalog: CatalogClient,
    cart: CartClient,
    orders: OrderClient,
    payments: PaymentClient,
    busy: BusyTracker,
}

impl AppState {
    /// Create a new application state.
    ///
    /// All service clients share one connection pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, reqwest::Error> {
        let http = build_http_client(config.upstream_timeout)?;
        let services = &config.services;

        let users = UserClient::new(ServiceClient::new(http.clone(), &services.user, "user"));
        let catalog = CatalogClient::new(
            ServiceClient::new(http.clone(), &services.catalog, "catalog"),
            config.catalog_cache_ttl,
        );
        let cart = CartClient::new(ServiceClient::new(http.clone(), &services.cart, "cart"));
        let orders = OrderClient::new(ServiceClient::new(http.clone(), &services.order, "order"));
        let payments =
            PaymentClient::new(ServiceClient::new(http.clone(), &services.payment, "payment"));

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                http,
                users,
                catalog,
                cart,
                orders,
                payments,
                busy: BusyTracker::new(),
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn users(&self) -> &UserClient {
        &self.inner.users
    }

    /// Catalog client with its read cache.
    #[must_use]
    pub fn catalog(&self) -> &CatalogClient {
        &self.inner.catalog
    }

    #[must_use]
    pub fn cart(&self) -> &CartClient {
        &self.inner.cart
    }

    #[must_use]
    pub fn orders(&self) -> &OrderClient {
        &self.inner.orders
    }

    #[must_use]
    pub fn payments(&self) -> &PaymentClient {
        &self.inner.payments
    }

    /// Services that could not be reached at all.
    ///
    /// Any HTTP answer counts as reachable, error statuses included.
    pub async fn unreachable_services(&self) -> Vec<&'static str> {
        let mut down = Vec::new();
        for (name, url) in self.inner.config.services.named() {
            if let Err(e) = self.inner.http.head(url.as_str()).send().await {
                tracing::warn!(service = name, error = %e, "Service unreachable");
                down.push(name);
            }
        }
        down
    }

    /// In-flight cart mutations per user.
    #[must_use]
    pub fn busy(&self) -> &BusyTracker {
        &self.inner.busy
    }
}
