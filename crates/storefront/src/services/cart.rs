//! Cart mutations and the cart view.
//!
//! Adding to the cart is two independent upstream calls: the cart service
//! records the line, then the catalog service decrements stock. The second
//! call can fail after the first succeeded. The line is kept and the failure
//! is reported; nothing reconciles the two afterwards.

use bazaar_core::{
    CartItem, CartLineId, CartSelection, CartTotals, PricedLine, ProductId, QuantityChange,
};
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::api::cart::ClearOutcome;
use crate::api::{ApiError, CallContext};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::{CurrentUser, session_keys};
use crate::state::AppState;

use super::{load, notices, store};

pub const ADDED_TO_CART: &str = "Product added to cart successfully.";
pub const EMPTY_CART: &str = "Your cart is empty";

/// Why a stock decrement failed, as shown to the visitor.
#[must_use]
pub fn classify_stock_failure(message: &str) -> &'static str {
    if message.contains("out of stock") {
        "Product is out of stock"
    } else if message.contains("invalid or expired token") {
        "Please login to add product to cart"
    } else {
        "Failed to add item into cart"
    }
}

/// The cart as shown to the visitor.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<PricedLine>,
    /// Totals over the selected lines.
    pub totals: CartTotals,
    pub count: u32,
    pub selected: usize,
    pub busy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

/// Result of an add-to-cart request.
#[derive(Debug, Clone, Serialize)]
pub struct AddOutcome {
    /// The cart service recorded the line.
    pub added: bool,
    /// The catalog service decremented stock.
    pub stock_reserved: bool,
    pub message: String,
    pub cart_count: u32,
}

/// Result of a clear request.
#[derive(Debug, Clone, Serialize)]
pub struct ClearView {
    pub partial: bool,
    pub cart: CartView,
}

/// Cart operations for one logged-in visitor.
pub struct CartService<'a> {
    state: &'a AppState,
    session: &'a Session,
    user: &'a CurrentUser,
    ctx: &'a CallContext,
}

impl<'a> CartService<'a> {
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

    /// Fetch the cart, prune the selection and recompute totals.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart service or the session fails.
    #[instrument(skip(self), fields(user_id = %self.user.id()))]
    pub async fn view(&self) -> Result<CartView> {
        let mut items = self.state.cart().items(self.ctx).await?;

        let mut selection: CartSelection = load(self.session, session_keys::CART_SELECTION).await?;
        selection.apply(&mut items);
        store(self.session, session_keys::CART_SELECTION, &selection).await?;

        let count = u32::try_from(items.len()).unwrap_or(u32::MAX);
        store(self.session, session_keys::CART_COUNT, &count).await?;

        let totals = CartTotals::compute(items.iter().filter(|item| item.checked));
        Ok(CartView {
            message: items.is_empty().then_some(EMPTY_CART),
            selected: selection.len(),
            busy: self.state.busy().is_busy(self.user.id()),
            items: items.into_iter().map(PricedLine::from).collect(),
            totals,
            count,
        })
    }

    /// Lines currently in the cart, with the selection marked.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart service or the session fails.
    pub async fn items(&self) -> Result<Vec<CartItem>> {
        Ok(self.view().await?.items.into_iter().map(|line| line.item).collect())
    }

    /// Add a product, then decrement its stock.
    ///
    /// # Errors
    ///
    /// Returns an error only if the cart service refuses the line. A failed
    /// stock decrement is reported in the outcome instead.
    #[instrument(skip(self), fields(user_id = %self.user.id()))]
    pub async fn add(&self, product_id: ProductId, quantity: u32) -> Result<AddOutcome> {
        if quantity == 0 {
            return Err(AppError::BadRequest("Quantity must be at least 1".to_string()));
        }
        let _busy = self.state.busy().begin(self.user.id());

        let cart_message = self
            .report(self.state.cart().add(self.ctx, product_id, quantity).await)
            .await?;

        // Optimistic: one more line, before stock is confirmed
        let count: u32 = load(self.session, session_keys::CART_COUNT).await?;
        let cart_count = count.saturating_add(1);
        store(self.session, session_keys::CART_COUNT, &cart_count).await?;

        let stock = self
            .state
            .catalog()
            .update_quantity(self.ctx, product_id, quantity, QuantityChange::Decrease)
            .await;

        if let Err(err) = stock {
            let reason = classify_stock_failure(&err.message());
            tracing::warn!(
                product_id = %product_id,
                error = %err,
                "Cart line added but stock decrement failed"
            );
            let product = product_id.to_string();
            add_breadcrumb(
                "cart",
                "Stock decrement failed after add",
                Some(&[("product_id", product.as_str())]),
            );
            notices::error(self.session, reason).await?;
            return Ok(AddOutcome {
                added: true,
                stock_reserved: false,
                message: reason.to_string(),
                cart_count,
            });
        }

        let message = cart_message.unwrap_or_else(|| ADDED_TO_CART.to_string());
        notices::success(self.session, message.clone()).await?;
        Ok(AddOutcome {
            added: true,
            stock_reserved: true,
            message,
            cart_count,
        })
    }

    /// Move one line's quantity by one unit, then refetch.
    ///
    /// Stock is not adjusted here.
    ///
    /// # Errors
    ///
    /// Returns `BadRequest` for a decrement below one, `NotFound` for an
    /// unknown line, or the service error.
    #[instrument(skip(self), fields(user_id = %self.user.id()))]
    pub async fn change_quantity(
        &self,
        cart_id: CartLineId,
        change: QuantityChange,
    ) -> Result<CartView> {
        let busy = self.state.busy().begin(self.user.id());

        let items = self.report(self.state.cart().items(self.ctx).await).await?;
        let line = items
            .iter()
            .find(|item| item.cart_id == cart_id)
            .ok_or_else(|| AppError::NotFound(format!("Cart item not found: {cart_id}")))?;
        if change.apply(line.quantity).is_none() {
            return Err(AppError::BadRequest("Quantity cannot be less than 1".to_string()));
        }

        self.report(self.state.cart().update_quantity(self.ctx, cart_id, change).await).await?;
        notices::success(self.session, "Cart updated successfully").await?;

        drop(busy);
        self.view().await
    }

    /// Remove one line, then refetch.
    ///
    /// # Errors
    ///
    /// Returns the service error.
    #[instrument(skip(self), fields(user_id = %self.user.id()))]
    pub async fn remove(&self, cart_id: CartLineId) -> Result<CartView> {
        let busy = self.state.busy().begin(self.user.id());

        self.report(self.state.cart().remove(self.ctx, cart_id).await).await?;

        let mut selection: CartSelection = load(self.session, session_keys::CART_SELECTION).await?;
        selection.forget(cart_id);
        store(self.session, session_keys::CART_SELECTION, &selection).await?;
        notices::success(self.session, "Item removed from cart").await?;

        drop(busy);
        self.view().await
    }

    /// Clear the cart. A partial clear refetches what is left.
    ///
    /// # Errors
    ///
    /// Returns the service error for anything but a partial clear.
    #[instrument(skip(self), fields(user_id = %self.user.id()))]
    pub async fn clear(&self) -> Result<ClearView> {
        let busy = self.state.busy().begin(self.user.id());
        let outcome = self.report(self.state.cart().clear(self.ctx).await).await?;
        drop(busy);

        match outcome {
            ClearOutcome::Cleared => {
                self.session.remove_value(session_keys::CART_SELECTION).await?;
                store(self.session, session_keys::CART_COUNT, &0_u32).await?;
                notices::success(self.session, "Cart cleared successfully.").await?;
                Ok(ClearView {
                    partial: false,
                    cart: CartView {
                        items: Vec::new(),
                        totals: CartTotals::compute(&[] as &[CartItem]),
                        count: 0,
                        selected: 0,
                        busy: self.state.busy().is_busy(self.user.id()),
                        message: Some(EMPTY_CART),
                    },
                })
            }
            ClearOutcome::Partial { remaining } => {
                tracing::info!(remaining, "Cart partially cleared");
                store(self.session, session_keys::CART_COUNT, &remaining).await?;
                Ok(ClearView {
                    partial: true,
                    cart: self.view().await?,
                })
            }
        }
    }

    /// Tick or untick one line. `None` toggles.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart service or the session fails.
    pub async fn select(&self, cart_id: CartLineId, checked: Option<bool>) -> Result<CartView> {
        let mut selection: CartSelection = load(self.session, session_keys::CART_SELECTION).await?;
        match checked {
            Some(checked) => selection.set(cart_id, checked),
            None => {
                selection.toggle(cart_id);
            }
        }
        store(self.session, session_keys::CART_SELECTION, &selection).await?;
        self.view().await
    }

    /// Tick every line, or clear the selection.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart service or the session fails.
    pub async fn select_all(&self, checked: bool) -> Result<CartView> {
        let mut selection = CartSelection::default();
        if checked {
            let items = self.state.cart().items(self.ctx).await?;
            selection.select_all(&items);
        }
        store(self.session, session_keys::CART_SELECTION, &selection).await?;
        self.view().await
    }

    /// Post an error notice for a failed call and convert the error.
    async fn report<T>(&self, result: std::result::Result<T, ApiError>) -> Result<T> {
        match result {
            Ok(value) => Ok(value),
            Err(err) => {
                let app: AppError = err.into();
                notices::error(self.session, app.public_message()).await?;
                Err(app)
            }
        }
    }
}

/// Loading state and optimistic count, readable without a cart fetch.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CartStatus {
    pub busy: bool,
    pub in_flight: usize,
    pub count: u32,
}

/// # Errors
///
/// Returns an error if the session cannot be read.
pub async fn status(state: &AppState, session: &Session, user: &CurrentUser) -> Result<CartStatus> {
    Ok(CartStatus {
        busy: state.busy().is_busy(user.id()),
        in_flight: state.busy().in_flight(user.id()),
        count: load(session, session_keys::CART_COUNT).await?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_stock_failure() {
        assert_eq!(
            classify_stock_failure("Product 4 is out of stock"),
            "Product is out of stock"
        );
        assert_eq!(
            classify_stock_failure("invalid or expired token"),
            "Please login to add product to cart"
        );
        assert_eq!(
            classify_stock_failure("connection reset"),
            "Failed to add item into cart"
        );
    }
}
