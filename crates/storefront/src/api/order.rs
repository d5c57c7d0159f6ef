//! Order service client (`/user/orders`).

use bazaar_core::{AddressId, CartItem, Order};
use reqwest::Method;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use tracing::instrument;

use super::{ApiError, CallContext, ServiceClient};

/// Order creation payload, wrapped as `dataToSend` on the wire.
#[derive(Debug, Clone, Serialize)]
pub struct NewOrder<'a> {
    pub cart_items: &'a [CartItem],
    pub address_id: AddressId,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

/// Client for the order service.
#[derive(Debug, Clone)]
pub struct OrderClient {
    http: ServiceClient,
}

impl OrderClient {
    #[must_use]
    pub const fn new(http: ServiceClient) -> Self {
        Self { http }
    }

    /// # Errors
    ///
    /// Returns an error if the call fails.
    #[instrument(skip(self, ctx))]
    pub async fn orders(&self, ctx: &CallContext) -> Result<Vec<Order>, ApiError> {
        let req = self.http.request(Method::GET, "/user/orders", ctx);
        self.http.fetch_or_default(req).await
    }

    /// # Errors
    ///
    /// Returns an error if the order is refused.
    #[instrument(
        skip(self, ctx, order),
        fields(amount = %order.amount, lines = order.cart_items.len())
    )]
    pub async fn create(
        &self,
        ctx: &CallContext,
        order: &NewOrder<'_>,
    ) -> Result<Option<String>, ApiError> {
        let req = self
            .http
            .request(Method::POST, "/user/orders/create", ctx)
            .json(&json!({ "dataToSend": order }));
        self.http.send(req).await
    }
}
