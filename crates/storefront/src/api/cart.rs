//! Cart service client (`/user/cart/...`).

use bazaar_core::{CartItem, CartLineId, ProductId, QuantityChange};
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use super::{ApiError, CallContext, ServiceClient};

#[derive(Debug, Default, Deserialize)]
struct CartData {
    #[serde(default)]
    items: Option<Vec<CartItem>>,
}

/// Result of a clear request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearOutcome {
    Cleared,
    /// The service kept some lines; `remaining` is how many are still active.
    Partial { remaining: u32 },
}

/// Client for the cart service.
#[derive(Debug, Clone)]
pub struct CartClient {
    http: ServiceClient,
}

impl CartClient {
    #[must_use]
    pub const fn new(http: ServiceClient) -> Self {
        Self { http }
    }

    /// Current cart lines. A null or missing item list is an empty cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    #[instrument(skip(self, ctx))]
    pub async fn items(&self, ctx: &CallContext) -> Result<Vec<CartItem>, ApiError> {
        let req = self.http.request(Method::GET, "/user/cart", ctx);
        let data: CartData = self.http.fetch_or_default(req).await?;
        Ok(data.items.unwrap_or_default())
    }

    /// # Errors
    ///
    /// Returns an error if the service refuses the line.
    #[instrument(skip(self, ctx))]
    pub async fn add(
        &self,
        ctx: &CallContext,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Option<String>, ApiError> {
        let req = self
            .http
            .request(Method::POST, "/user/cart/add", ctx)
            .json(&json!({
                "items": [{ "product_id": product_id, "quantity": quantity }]
            }));
        self.http.send(req).await
    }

    /// Move a line's quantity by one unit.
    ///
    /// # Errors
    ///
    /// Returns an error if the service refuses the change.
    #[instrument(skip(self, ctx))]
    pub async fn update_quantity(
        &self,
        ctx: &CallContext,
        cart_id: CartLineId,
        change: QuantityChange,
    ) -> Result<Option<String>, ApiError> {
        let req = self
            .http
            .request(Method::POST, &format!("/user/cart/{cart_id}/update/qty"), ctx)
            .json(&json!({ "method": change.method(), "quantity": 1 }));
        self.http.send(req).await
    }

    /// # Errors
    ///
    /// Returns an error if the line can't be removed.
    #[instrument(skip(self, ctx))]
    pub async fn remove(
        &self,
        ctx: &CallContext,
        cart_id: CartLineId,
    ) -> Result<Option<String>, ApiError> {
        let req = self
            .http
            .request(Method::DELETE, &format!("/user/cart/{cart_id}/delete"), ctx);
        self.http.send(req).await
    }

    /// Clear the cart.
    ///
    /// A refusal whose `extra` reports fewer active lines than total lines is
    /// a partial clear, not an error.
    ///
    /// # Errors
    ///
    /// Returns any other failure.
    #[instrument(skip(self, ctx))]
    pub async fn clear(&self, ctx: &CallContext) -> Result<ClearOutcome, ApiError> {
        let req = self.http.request(Method::DELETE, "/user/cart/clear", ctx);
        match self.http.send(req).await {
            Ok(_) => Ok(ClearOutcome::Cleared),
            Err(err) => partial_clear(&err).map_or(Err(err), Ok),
        }
    }
}

fn partial_clear(err: &ApiError) -> Option<ClearOutcome> {
    let extra = err.extra()?;
    let active = extra.get("active_cart_length")?.as_u64()?;
    let total = extra.get("total_cart_length")?.as_u64()?;
    (active != total).then(|| ClearOutcome::Partial {
        remaining: u32::try_from(active).unwrap_or(u32::MAX),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn service_error(extra: serde_json::Value) -> ApiError {
        ApiError::Service {
            service: "cart",
            status: reqwest::StatusCode::CONFLICT,
            message: "Some items could not be removed".to_string(),
            details: None,
            extra: Some(extra),
        }
    }

    #[test]
    fn test_partial_clear_detected() {
        let err = service_error(json!({"active_cart_length": 2, "total_cart_length": 5}));
        assert_eq!(
            partial_clear(&err),
            Some(ClearOutcome::Partial { remaining: 2 })
        );
    }

    #[test]
    fn test_equal_lengths_are_a_real_failure() {
        let err = service_error(json!({"active_cart_length": 3, "total_cart_length": 3}));
        assert_eq!(partial_clear(&err), None);
        assert_eq!(partial_clear(&ApiError::RateLimited(1)), None);
    }

    #[test]
    fn test_cart_data_null_items() {
        let data: CartData = serde_json::from_str(r#"{"items": null}"#).unwrap();
        assert!(data.items.is_none());
    }
}
