//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `USER_SERVICE_URL` - User/auth service (default: <http://localhost:8080>)
//! - `CATALOG_SERVICE_URL` - Catalog service (default: <http://localhost:8081>)
//! - `CART_SERVICE_URL` - Cart service (default: <http://localhost:8082>)
//! - `ORDER_SERVICE_URL` - Order service (default: <http://localhost:8083>)
//! - `PAYMENT_SERVICE_URL` - Payment service (default: <http://localhost:8084>)
//! - `PAYMENT_CURRENCY` - ISO currency sent to the payment service (default: INR)
//! - `PAYMENT_WIDGET_CONTAINER` - DOM id the payment widget mounts into (default: checkout-widget)
//! - `UPSTREAM_TIMEOUT_SECS` - Per-request timeout for service calls (default: 10)
//! - `CATALOG_CACHE_TTL_SECS` - Catalog read cache TTL (default: 300)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Trace sample rate (default: 0.1)

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use bazaar_core::CurrencyCode;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// External service endpoints
    pub services: ServiceUrls,
    /// Payment handoff settings
    pub payment: PaymentConfig,
    /// Timeout applied to every upstream request
    pub upstream_timeout: Duration,
    /// How long catalog reads stay cached
    pub catalog_cache_ttl: Duration,
    /// Sentry error tracking settings
    pub sentry: SentryConfig,
}

/// Base URLs of the external REST services.
#[derive(Debug, Clone)]
pub struct ServiceUrls {
    pub user: Url,
    pub catalog: Url,
    pub cart: Url,
    pub order: Url,
    pub payment: Url,
}

/// Payment handoff settings.
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    pub currency: CurrencyCode,
    pub widget_container: String,
}

/// Sentry settings.
///
/// Implements `Debug` manually to redact the DSN.
#[derive(Clone)]
pub struct SentryConfig {
    pub dsn: Option<SecretString>,
    pub environment: Option<String>,
    pub sample_rate: f32,
    pub traces_sample_rate: f32,
}

impl std::fmt::Debug for SentryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentryConfig")
            .field("dsn", &self.dsn.as_ref().map(|_| "[REDACTED]"))
            .field("environment", &self.environment)
            .field("sample_rate", &self.sample_rate)
            .field("traces_sample_rate", &self.traces_sample_rate)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env("STOREFRONT_PORT", "3000")?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?;

        let services = ServiceUrls::from_env()?;
        let payment = PaymentConfig {
            currency: parse_env("PAYMENT_CURRENCY", "INR")?,
            widget_container: get_env_or_default("PAYMENT_WIDGET_CONTAINER", "checkout-widget"),
        };
        let upstream_timeout = Duration::from_secs(parse_env("UPSTREAM_TIMEOUT_SECS", "10")?);
        let catalog_cache_ttl = Duration::from_secs(parse_env("CATALOG_CACHE_TTL_SECS", "300")?);

        let sentry = SentryConfig {
            dsn: get_optional_env("SENTRY_DSN").map(SecretString::from),
            environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sample_rate: parse_env("SENTRY_SAMPLE_RATE", "1.0")?,
            traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.1")?,
        };

        Ok(Self {
            host,
            port,
            base_url,
            services,
            payment,
            upstream_timeout,
            catalog_cache_ttl,
            sentry,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether session cookies should carry the `Secure` flag.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl ServiceUrls {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            user: get_url("USER_SERVICE_URL", "http://localhost:8080")?,
            catalog: get_url("CATALOG_SERVICE_URL", "http://localhost:8081")?,
            cart: get_url("CART_SERVICE_URL", "http://localhost:8082")?,
            order: get_url("ORDER_SERVICE_URL", "http://localhost:8083")?,
            payment: get_url("PAYMENT_SERVICE_URL", "http://localhost:8084")?,
        })
    }

    /// Point every service at the same base URL.
    #[must_use]
    pub fn all(base: &Url) -> Self {
        Self {
            user: base.clone(),
            catalog: base.clone(),
            cart: base.clone(),
            order: base.clone(),
            payment: base.clone(),
        }
    }

    /// Each service with its name, in a fixed order.
    #[must_use]
    pub fn named(&self) -> [(&'static str, &Url); 5] {
        [
            ("user", &self.user),
            ("catalog", &self.catalog),
            ("cart", &self.cart),
            ("order", &self.order),
            ("payment", &self.payment),
        ]
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    parse_value(key, &get_env_or_default(key, default))
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Get a service base URL. Only http(s) URLs are accepted.
fn get_url(key: &str, default: &str) -> Result<Url, ConfigError> {
    let url: Url = parse_env(key, default)?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    /// Configuration pointing every service at `base`.
    pub(crate) fn config_for(base: &str) -> StorefrontConfig {
        StorefrontConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            services: ServiceUrls::all(&Url::parse(base).unwrap()),
            payment: PaymentConfig {
                currency: CurrencyCode::INR,
                widget_container: "checkout-widget".to_string(),
            },
            upstream_timeout: Duration::from_secs(5),
            catalog_cache_ttl: Duration::from_secs(60),
            sentry: SentryConfig {
                dsn: None,
                environment: None,
                sample_rate: 1.0,
                traces_sample_rate: 0.0,
            },
        }
    }

    #[test]
    fn test_socket_addr() {
        let config = config_for("http://localhost:8080");
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
        assert!(!config.is_secure());
    }

    #[test]
    fn test_parse_value_reports_key() {
        let err = parse_value::<u16>("STOREFRONT_PORT", "eighty").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "STOREFRONT_PORT"));
        assert_eq!(parse_value::<u64>("UPSTREAM_TIMEOUT_SECS", " 15 ").unwrap(), 15);
    }

    #[test]
    fn test_currency_parses() {
        let currency: CurrencyCode = parse_value("PAYMENT_CURRENCY", "usd").unwrap();
        assert_eq!(currency, CurrencyCode::USD);
    }

    #[test]
    fn test_sentry_config_debug_redacts_dsn() {
        let config = SentryConfig {
            dsn: Some(SecretString::from("https://key@sentry.example/1")),
            environment: Some("staging".to_string()),
            sample_rate: 1.0,
            traces_sample_rate: 0.1,
        };

        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("staging"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("sentry.example"));
    }
}
