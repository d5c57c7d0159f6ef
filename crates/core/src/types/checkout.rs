//! Checkout snapshot and the multi-step wizard.
//!
//! A snapshot is a point-in-time copy of the selected cart lines. Nothing
//! revalidates it against the cart or the catalog afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::cart::{CartItem, selected_items};
use super::id::AddressId;
use super::pricing::CartTotals;

/// Reasons checkout can't start or advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CheckoutError {
    #[error("Your cart is empty")]
    EmptyCart,
    #[error("Please select at least one item to checkout")]
    NothingSelected,
    #[error("Please select a shipping address")]
    AddressRequired,
    #[error("No checkout in progress")]
    NoSnapshot,
}

/// Selected cart lines captured when checkout began.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSnapshot {
    pub cart_items: Vec<CartItem>,
    pub captured_at: DateTime<Utc>,
}

impl CheckoutSnapshot {
    /// Capture the checked lines of `cart`.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::EmptyCart`] for an empty cart and
    /// [`CheckoutError::NothingSelected`] when no line is checked.
    pub fn capture(cart: &[CartItem], now: DateTime<Utc>) -> Result<Self, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let cart_items = selected_items(cart);
        if cart_items.is_empty() {
            return Err(CheckoutError::NothingSelected);
        }
        Ok(Self {
            cart_items,
            captured_at: now,
        })
    }

    #[must_use]
    pub fn totals(&self) -> CartTotals {
        CartTotals::compute(&self.cart_items)
    }
}

/// Wizard steps, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    #[default]
    ReviewCart,
    Payment,
    ConfirmOrder,
    OrderSummary,
}

impl CheckoutStep {
    pub const ALL: [Self; 4] = [
        Self::ReviewCart,
        Self::Payment,
        Self::ConfirmOrder,
        Self::OrderSummary,
    ];

    /// Zero-based position.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::ReviewCart => 0,
            Self::Payment => 1,
            Self::ConfirmOrder => 2,
            Self::OrderSummary => 3,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ReviewCart => "Review Cart",
            Self::Payment => "Payment",
            Self::ConfirmOrder => "Confirm Order",
            Self::OrderSummary => "Order Summary",
        }
    }

    const fn following(self) -> Option<Self> {
        match self {
            Self::ReviewCart => Some(Self::Payment),
            Self::Payment => Some(Self::ConfirmOrder),
            Self::ConfirmOrder => Some(Self::OrderSummary),
            Self::OrderSummary => None,
        }
    }

    const fn preceding(self) -> Option<Self> {
        match self {
            Self::ReviewCart => None,
            Self::Payment => Some(Self::ReviewCart),
            Self::ConfirmOrder => Some(Self::Payment),
            Self::OrderSummary => Some(Self::ConfirmOrder),
        }
    }
}

/// What a `next` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Moved(CheckoutStep),
    /// Already on the last step.
    Completed,
}

impl Advance {
    pub const COMPLETED_MESSAGE: &'static str = "Your order has been successfully placed!";
}

/// Wizard position plus the chosen shipping address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CheckoutWizard {
    pub step: CheckoutStep,
    pub address_id: Option<AddressId>,
}

impl CheckoutWizard {
    /// Move forward one step.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::AddressRequired`] when leaving the review
    /// step without a shipping address.
    pub fn next(&mut self) -> Result<Advance, CheckoutError> {
        if self.step == CheckoutStep::ReviewCart && self.address_id.is_none() {
            return Err(CheckoutError::AddressRequired);
        }
        Ok(match self.step.following() {
            Some(step) => {
                self.step = step;
                Advance::Moved(step)
            }
            None => Advance::Completed,
        })
    }

    /// Move back one step. A no-op on the first step.
    pub fn back(&mut self) -> CheckoutStep {
        if let Some(step) = self.step.preceding() {
            self.step = step;
        }
        self.step
    }

    pub const fn select_address(&mut self, address_id: AddressId) {
        self.address_id = Some(address_id);
    }
}
