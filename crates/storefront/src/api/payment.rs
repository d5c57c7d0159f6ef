//! Payment service client.
//!
//! The payment service answers a checkout request with either a hosted
//! payment page (`redirect_url`) or a token for the embedded widget
//! (`checkout_token`). Its body is not wrapped in the usual envelope, though
//! some deployments nest the fields under `data`, so both places are read.

use bazaar_core::{CartItem, CurrencyCode};
use reqwest::Method;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{ApiError, CallContext, ServiceClient};

/// One line of the item summary sent with a checkout request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentLine {
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub quantity: u32,
}

impl From<&CartItem> for PaymentLine {
    fn from(item: &CartItem) -> Self {
        Self {
            name: item.product.name.clone(),
            amount: item.unit_price(),
            quantity: item.quantity,
        }
    }
}

/// Checkout request body.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentRequest {
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub currency: &'static str,
    pub items: Vec<PaymentLine>,
}

impl PaymentRequest {
    #[must_use]
    pub fn new(amount: Decimal, currency: CurrencyCode, items: &[CartItem]) -> Self {
        Self {
            amount,
            currency: currency.code(),
            items: items.iter().map(PaymentLine::from).collect(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SessionFields {
    #[serde(default)]
    redirect_url: Option<String>,
    #[serde(default)]
    checkout_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PaymentResponse {
    #[serde(flatten)]
    top: SessionFields,
    #[serde(default)]
    data: Option<SessionFields>,
}

/// How the visitor continues to pay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentHandoff {
    /// Send the browser to a hosted payment page.
    Redirect(String),
    /// Mount the payment widget with this checkout token.
    Widget(String),
}

impl PaymentResponse {
    fn handoff(self) -> Option<PaymentHandoff> {
        let nested = self.data.unwrap_or_default();
        let non_blank = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

        non_blank(self.top.redirect_url)
            .or_else(|| non_blank(nested.redirect_url))
            .map(PaymentHandoff::Redirect)
            .or_else(|| {
                non_blank(self.top.checkout_token)
                    .or_else(|| non_blank(nested.checkout_token))
                    .map(PaymentHandoff::Widget)
            })
    }
}

/// Client for the payment service.
#[derive(Debug, Clone)]
pub struct PaymentClient {
    http: ServiceClient,
}

impl PaymentClient {
    #[must_use]
    pub const fn new(http: ServiceClient) -> Self {
        Self { http }
    }

    /// Open a payment session.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or the response names neither a
    /// redirect URL nor a checkout token.
    #[instrument(
        skip(self, ctx, request),
        fields(amount = %request.amount, currency = request.currency)
    )]
    pub async fn checkout(
        &self,
        ctx: &CallContext,
        request: &PaymentRequest,
    ) -> Result<PaymentHandoff, ApiError> {
        let req = self
            .http
            .request(Method::POST, "/payment/checkout", ctx)
            .json(request);
        let response: PaymentResponse = self.http.execute_raw(req).await?;
        response
            .handoff()
            .ok_or(ApiError::MissingData(self.http.service()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Option<PaymentHandoff> {
        serde_json::from_str::<PaymentResponse>(body).unwrap().handoff()
    }

    #[test]
    fn test_redirect_wins_over_token() {
        assert_eq!(
            parse(r#"{"redirect_url": "https://pay.example/s/1", "checkout_token": "tok"}"#),
            Some(PaymentHandoff::Redirect("https://pay.example/s/1".to_string()))
        );
    }

    #[test]
    fn test_nested_token() {
        assert_eq!(
            parse(r#"{"message": "ok", "data": {"checkout_token": "tok_9"}}"#),
            Some(PaymentHandoff::Widget("tok_9".to_string()))
        );
    }

    #[test]
    fn test_blank_fields_are_no_handoff() {
        assert_eq!(parse(r#"{"redirect_url": "", "data": null}"#), None);
    }

    #[test]
    fn test_request_uses_unit_prices() {
        let item: CartItem = serde_json::from_value(serde_json::json!({
            "cart_id": 1,
            "product": {"id": 2, "name": "Kettle", "price": 1200},
            "quantity": 2,
            "price": 1100
        }))
        .unwrap();
        let request = PaymentRequest::new(Decimal::new(2596, 0), CurrencyCode::INR, &[item]);
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["currency"], "INR");
        assert_eq!(body["items"][0]["amount"], 1100.0);
        assert_eq!(body["items"][0]["quantity"], 2);
    }
}
