//! Payment handoff and order creation.
//!
//! The snapshot is charged as captured: it is not revalidated against the
//! current cart or catalog before payment.

use bazaar_core::{Advance, CheckoutError};
use rust_decimal::Decimal;
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::api::order::NewOrder;
use crate::api::payment::PaymentRequest;
use crate::api::{CallContext, PaymentHandoff};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::{CurrentUser, session_keys};
use crate::state::AppState;

use super::checkout::CheckoutService;
use super::notices;

pub const PAYMENT_FAILED: &str = "Payment failed. Please try again.";
pub const CHECKOUT_FAILED: &str = "Checkout failed";

/// How the client should continue to pay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PaymentView {
    Redirect {
        url: String,
    },
    Widget {
        checkout_token: String,
        container_id: String,
    },
}

/// Result of a successful payment.
#[derive(Debug, Clone, Serialize)]
pub struct OrderPlaced {
    pub message: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

/// Payment operations for one logged-in visitor.
pub struct PaymentService<'a> {
    state: &'a AppState,
    session: &'a Session,
    user: &'a CurrentUser,
    ctx: &'a CallContext,
}

impl<'a> PaymentService<'a> {
    #[must_use]
    pub const fn new(
        state: &'a AppState,
        session: &'a Session,
        user: &'a CurrentUser,
        ctx: &'a CallContext,
    ) -> Self {
        Self {
            state,
            session,
            user,
            ctx,
        }
    }

    fn checkout(&self) -> CheckoutService<'a> {
        CheckoutService::new(self.state, self.session, self.user, self.ctx)
    }

    /// Open a payment session for the snapshot's grand total.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::NoSnapshot` or the payment service error. No
    /// retry is attempted.
    #[instrument(skip(self), fields(user_id = %self.user.id()))]
    pub async fn initiate(&self) -> Result<PaymentView> {
        let (snapshot, _) = self.checkout().load().await?;
        let totals = snapshot.totals();
        let config = &self.state.config().payment;

        let request =
            PaymentRequest::new(totals.grand_total, config.currency, &snapshot.cart_items);
        let handoff = match self.state.payments().checkout(self.ctx, &request).await {
            Ok(handoff) => handoff,
            Err(err) => {
                tracing::warn!(error = %err, "Payment session could not be opened");
                notices::error(self.session, "Could not start payment. Please try again.").await?;
                return Err(err.into());
            }
        };

        add_breadcrumb("checkout", "Payment session opened", None);
        Ok(match handoff {
            PaymentHandoff::Redirect(url) => PaymentView::Redirect { url },
            PaymentHandoff::Widget(checkout_token) => PaymentView::Widget {
                checkout_token,
                container_id: config.widget_container.clone(),
            },
        })
    }

    /// The widget reported success: create the order, then drop the snapshot
    /// and the cart selection.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::NoSnapshot`, `CheckoutError::AddressRequired`,
    /// or the order service error. The snapshot is kept on failure.
    #[instrument(skip(self), fields(user_id = %self.user.id()))]
    pub async fn succeeded(&self) -> Result<OrderPlaced> {
        let checkout = self.checkout();
        let (snapshot, wizard) = checkout.load().await?;
        let address_id = wizard.address_id.ok_or(CheckoutError::AddressRequired)?;
        let amount = snapshot.totals().grand_total;

        let order = NewOrder {
            cart_items: &snapshot.cart_items,
            address_id,
            amount,
        };
        if let Err(err) = self.state.orders().create(self.ctx, &order).await {
            tracing::error!(error = %err, "Payment succeeded but order creation failed");
            let err = AppError::from(err);
            // Refusals carry the order service's reason; outages stay generic
            let text = if err.status().is_client_error() {
                err.public_message()
            } else {
                CHECKOUT_FAILED.to_string()
            };
            notices::error(self.session, text).await?;
            return Err(err);
        }

        checkout.finish().await?;
        self.session.remove_value(session_keys::CART_SELECTION).await?;
        notices::success(self.session, Advance::COMPLETED_MESSAGE).await?;
        tracing::info!(%amount, "Order placed");

        Ok(OrderPlaced {
            message: Advance::COMPLETED_MESSAGE.to_string(),
            amount,
        })
    }

    /// The widget reported failure. The snapshot stays for a retry.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    #[instrument(skip(self), fields(user_id = %self.user.id()))]
    pub async fn failed(&self, reason: Option<&str>) -> Result<&'static str> {
        tracing::warn!(reason = reason.unwrap_or("unknown"), "Payment failed");
        notices::error(self.session, PAYMENT_FAILED).await?;
        Ok(PAYMENT_FAILED)
    }
}
