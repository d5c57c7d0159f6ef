//! Clients for the external REST services.
//!
//! # Architecture
//!
//! - One `reqwest::Client` is shared by every service client
//! - The services are the source of truth; nothing is persisted locally
//! - Catalog reads are cached in memory via `moka`
//! - Every call forwards the visitor's bearer token and the request id
//!
//! # Response envelope
//!
//! All services answer with the same JSON shape:
//!
//! ```text
//! { "message": "...", "data": ..., "error": "...", "errorDetails": ..., "extra": ... }
//! ```

mod cache;
pub mod cart;
pub mod catalog;
pub mod order;
pub mod payment;
pub mod user;

pub use cart::CartClient;
pub use catalog::CatalogClient;
pub use order::OrderClient;
pub use payment::{PaymentClient, PaymentHandoff};
pub use user::{AuthSession, UserClient};

use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use crate::middleware::request_id::REQUEST_ID_HEADER;

/// Errors that can occur when calling an external service.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("{service} service error ({status}): {message}")]
    Service {
        service: &'static str,
        status: StatusCode,
        message: String,
        details: Option<serde_json::Value>,
        extra: Option<serde_json::Value>,
    },

    /// The service rejected the bearer token.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the service.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A success response without the expected `data`.
    #[error("Missing data in {0} response")]
    MissingData(&'static str),
}

impl ApiError {
    /// The message the service gave, for classifying failures.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Service { message, .. }
            | Self::Unauthorized(message)
            | Self::NotFound(message) => message.clone(),
            other => other.to_string(),
        }
    }

    /// `errorDetails` of a service error, if any.
    #[must_use]
    pub const fn details(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Service { details, .. } => details.as_ref(),
            _ => None,
        }
    }

    /// `extra` of a service error, if any.
    #[must_use]
    pub const fn extra(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Service { extra, .. } => extra.as_ref(),
            _ => None,
        }
    }
}

/// The response envelope every service uses.
#[derive(Debug, Deserialize)]
#[serde(bound = "T: DeserializeOwned")]
pub struct Envelope<T> {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default, rename = "errorDetails")]
    pub error_details: Option<serde_json::Value>,
    #[serde(default)]
    pub extra: Option<serde_json::Value>,
}

impl<T> Envelope<T> {
    /// Take `data`, failing if the service left it out.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::MissingData` when `data` is absent or null.
    pub fn into_data(self, service: &'static str) -> Result<T, ApiError> {
        self.data.ok_or(ApiError::MissingData(service))
    }
}

/// Per-request call context: who is calling and which inbound request
/// triggered the call.
#[derive(Clone, Default)]
pub struct CallContext {
    token: Option<SecretString>,
    request_id: Option<String>,
}

impl CallContext {
    #[must_use]
    pub fn new(token: Option<&str>, request_id: Option<String>) -> Self {
        Self {
            token: token.map(|t| SecretString::from(t.to_owned())),
            request_id,
        }
    }

    /// Context with no visitor token.
    #[must_use]
    pub const fn anonymous(request_id: Option<String>) -> Self {
        Self {
            token: None,
            request_id,
        }
    }

    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    fn apply(&self, mut builder: RequestBuilder) -> RequestBuilder {
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token.expose_secret());
        }
        if let Some(request_id) = &self.request_id {
            builder = builder.header(REQUEST_ID_HEADER, request_id);
        }
        builder
    }
}

impl std::fmt::Debug for CallContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallContext")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("request_id", &self.request_id)
            .finish()
    }
}

/// Shared plumbing for one external service.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    client: reqwest::Client,
    base: String,
    service: &'static str,
}

impl ServiceClient {
    #[must_use]
    pub fn new(client: reqwest::Client, base: &Url, service: &'static str) -> Self {
        Self {
            client,
            base: base.as_str().trim_end_matches('/').to_string(),
            service,
        }
    }

    /// Name used in logs and errors.
    #[must_use]
    pub const fn service(&self) -> &'static str {
        self.service
    }

    /// Absolute URL for `path` under this service.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    /// Start a request with the caller's token and request id attached.
    pub fn request(&self, method: Method, path: &str, ctx: &CallContext) -> RequestBuilder {
        ctx.apply(self.client.request(method, self.url(path)))
    }

    /// Send a request and decode the envelope.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` for transport failures, non-success statuses and
    /// undecodable bodies.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<Envelope<T>, ApiError> {
        let response_text = self.read_body(builder).await?;

        if response_text.trim().is_empty() {
            return Ok(Envelope {
                message: None,
                data: None,
                error: None,
                error_details: None,
                extra: None,
            });
        }

        self.parse(&response_text)
    }

    /// Send a request whose body is not wrapped in the envelope.
    ///
    /// # Errors
    ///
    /// As [`Self::execute`].
    pub async fn execute_raw<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response_text = self.read_body(builder).await?;
        self.parse(&response_text)
    }

    async fn read_body(&self, builder: RequestBuilder) -> Result<String, ApiError> {
        let response = builder.send().await?;
        let status = response.status();

        // Check for rate limiting
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            return Err(self.status_error(status, &response_text));
        }
        Ok(response_text)
    }

    fn parse<T: DeserializeOwned>(&self, response_text: &str) -> Result<T, ApiError> {
        serde_json::from_str(response_text).map_err(|e| {
            tracing::error!(
                service = self.service,
                error = %e,
                body = %truncate(response_text, 500),
                "Failed to parse service response"
            );
            ApiError::Parse(e)
        })
    }

    /// Send a request whose `data` is required.
    ///
    /// # Errors
    ///
    /// As [`Self::execute`], plus `ApiError::MissingData` when `data` is null.
    pub async fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        self.execute(builder).await?.into_data(self.service)
    }

    /// Send a request whose `data` may be null; null becomes `T::default()`.
    ///
    /// # Errors
    ///
    /// As [`Self::execute`].
    pub async fn fetch_or_default<T: DeserializeOwned + Default>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, ApiError> {
        Ok(self.execute(builder).await?.data.unwrap_or_default())
    }

    /// Send a request and keep only the service's message.
    ///
    /// # Errors
    ///
    /// As [`Self::execute`].
    pub async fn send(&self, builder: RequestBuilder) -> Result<Option<String>, ApiError> {
        Ok(self
            .execute::<serde_json::Value>(builder)
            .await?
            .message)
    }

    fn status_error(&self, status: StatusCode, body: &str) -> ApiError {
        let envelope = serde_json::from_str::<Envelope<serde_json::Value>>(body).ok();
        let message = envelope
            .as_ref()
            .and_then(|e| e.error.clone().or_else(|| e.message.clone()))
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string()
            });

        match status {
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized(message),
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            _ => {
                if status.is_server_error() {
                    tracing::error!(
                        service = self.service,
                        status = %status,
                        body = %truncate(body, 500),
                        "Service returned non-success status"
                    );
                } else {
                    tracing::debug!(
                        service = self.service,
                        status = %status,
                        error = %message,
                        "Service rejected request"
                    );
                }
                let (details, extra) =
                    envelope.map_or((None, None), |e| (e.error_details, e.extra));
                ApiError::Service {
                    service: self.service,
                    status,
                    message,
                    details,
                    extra,
                }
            }
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Build the HTTP client shared by every service client.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialized.
pub fn build_http_client(timeout: std::time::Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("bazaar-storefront/", env!("CARGO_PKG_VERSION")))
        .build()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client() -> ServiceClient {
        ServiceClient::new(
            reqwest::Client::new(),
            &Url::parse("http://localhost:8082/").unwrap(),
            "cart",
        )
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        assert_eq!(
            client().url("/user/cart/add"),
            "http://localhost:8082/user/cart/add"
        );
    }

    #[test]
    fn test_status_error_reads_envelope() {
        let err = client().status_error(
            StatusCode::BAD_REQUEST,
            r#"{"error": "Product is out of stock", "extra": {"active_cart_length": 2}}"#,
        );
        assert_eq!(err.message(), "Product is out of stock");
        assert_eq!(err.extra().unwrap()["active_cart_length"], 2);
    }

    #[test]
    fn test_status_error_maps_auth_and_missing() {
        let err = client().status_error(
            StatusCode::UNAUTHORIZED,
            r#"{"error": "invalid or expired token"}"#,
        );
        assert!(matches!(err, ApiError::Unauthorized(ref m) if m == "invalid or expired token"));

        let err = client().status_error(StatusCode::NOT_FOUND, "not json");
        assert!(matches!(err, ApiError::NotFound(ref m) if m == "Not Found"));
    }

    #[test]
    fn test_envelope_null_data() {
        let envelope: Envelope<Vec<u32>> =
            serde_json::from_str(r#"{"message": "ok", "data": null}"#).unwrap();
        assert!(envelope.into_data("catalog").is_err());
    }

    #[test]
    fn test_call_context_debug_redacts_token() {
        let ctx = CallContext::new(Some("jwt-secret"), Some("req-1".to_string()));
        let debug = format!("{ctx:?}");
        assert!(debug.contains("req-1"));
        assert!(!debug.contains("jwt-secret"));
    }
}
