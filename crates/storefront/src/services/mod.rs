//! Business logic services for storefront.
//!
//! # Services
//!
//! - `busy` - Per-visitor cart loading state
//! - `cart` - Cart mutations kept loosely in step with catalog stock
//! - `checkout` - Checkout snapshot and wizard
//! - `notices` - Short-lived success and error messages
//! - `payment` - Payment handoff and order creation

pub mod busy;
pub mod cart;
pub mod checkout;
pub mod notices;
pub mod payment;

pub use busy::{BusyGuard, BusyTracker};
pub use cart::{AddOutcome, CartService, CartView};
pub use checkout::{CheckoutService, CheckoutView};
pub use payment::{OrderPlaced, PaymentService, PaymentView};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tower_sessions::Session;

/// Read a session value, falling back to its default when unset.
pub(crate) async fn load<T>(
    session: &Session,
    key: &str,
) -> Result<T, tower_sessions::session::Error>
where
    T: DeserializeOwned + Default,
{
    Ok(session.get::<T>(key).await?.unwrap_or_default())
}

/// Write a session value.
pub(crate) async fn store<T>(
    session: &Session,
    key: &str,
    value: &T,
) -> Result<(), tower_sessions::session::Error>
where
    T: Serialize + Send + Sync,
{
    session.insert(key, value).await
}
