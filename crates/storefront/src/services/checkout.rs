//! Checkout snapshot and wizard, persisted in the session.

use bazaar_core::{
    Address, AddressId, Advance, CartTotals, CheckoutError, CheckoutSnapshot, CheckoutStep,
    CheckoutWizard, PricedLine,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::api::CallContext;
use crate::error::{AppError, Result};
use crate::models::{CurrentUser, session_keys};
use crate::state::AppState;

use super::cart::CartService;
use super::{load, notices, store};

/// The checkout as shown to the visitor.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutView {
    /// Snapshot lines with their discounted amounts.
    pub items: Vec<PricedLine>,
    pub captured_at: DateTime<Utc>,
    pub step: CheckoutStep,
    pub step_index: usize,
    pub step_label: &'static str,
    /// Labels of every wizard step, in order.
    pub steps: [&'static str; 4],
    pub address_id: Option<AddressId>,
    pub totals: CartTotals,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

impl CheckoutView {
    fn new(snapshot: CheckoutSnapshot, wizard: CheckoutWizard) -> Self {
        Self {
            totals: snapshot.totals(),
            captured_at: snapshot.captured_at,
            items: snapshot.cart_items.into_iter().map(PricedLine::from).collect(),
            step: wizard.step,
            step_index: wizard.step.index(),
            step_label: wizard.step.label(),
            steps: CheckoutStep::ALL.map(CheckoutStep::label),
            address_id: wizard.address_id,
            message: None,
        }
    }
}

/// Checkout operations for one logged-in visitor.
pub struct CheckoutService<'a> {
    state: &'a AppState,
    session: &'a Session,
    user: &'a CurrentUser,
    ctx: &'a CallContext,
}

impl<'a> CheckoutService<'a> {
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

    /// Snapshot the selected cart lines and restart the wizard.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` or `CheckoutError::NothingSelected`,
    /// or the cart service error.
    #[instrument(skip(self), fields(user_id = %self.user.id()))]
    pub async fn begin(&self) -> Result<CheckoutView> {
        let items = CartService::new(self.state, self.session, self.user, self.ctx)
            .items()
            .await?;

        let snapshot = match CheckoutSnapshot::capture(&items, Utc::now()) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                notices::error(self.session, err.to_string()).await?;
                return Err(err.into());
            }
        };
        let wizard = CheckoutWizard::default();

        store(self.session, session_keys::CHECKOUT, &snapshot).await?;
        store(self.session, session_keys::CHECKOUT_WIZARD, &wizard).await?;
        tracing::info!(lines = snapshot.cart_items.len(), "Checkout started");

        Ok(CheckoutView::new(snapshot, wizard))
    }

    /// # Errors
    ///
    /// Returns `CheckoutError::NoSnapshot` when no checkout is in progress.
    pub async fn view(&self) -> Result<CheckoutView> {
        let (snapshot, wizard) = self.load().await?;
        Ok(CheckoutView::new(snapshot, wizard))
    }

    /// Choose the shipping address. It must be one of the visitor's own.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an address the visitor doesn't have.
    #[instrument(skip(self), fields(user_id = %self.user.id()))]
    pub async fn select_address(&self, address_id: AddressId) -> Result<CheckoutView> {
        let (snapshot, mut wizard) = self.load().await?;

        let addresses: Vec<Address> = self.state.users().addresses(self.ctx).await?;
        if !addresses.iter().any(|a| a.address_id == address_id) {
            return Err(AppError::NotFound(format!("Address not found: {address_id}")));
        }

        wizard.select_address(address_id);
        store(self.session, session_keys::CHECKOUT_WIZARD, &wizard).await?;
        Ok(CheckoutView::new(snapshot, wizard))
    }

    /// Advance one step.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::AddressRequired` when leaving the review step
    /// without an address.
    pub async fn next(&self) -> Result<CheckoutView> {
        let (snapshot, mut wizard) = self.load().await?;

        let advance = match wizard.next() {
            Ok(advance) => advance,
            Err(err) => {
                notices::error(self.session, err.to_string()).await?;
                return Err(err.into());
            }
        };
        store(self.session, session_keys::CHECKOUT_WIZARD, &wizard).await?;

        let mut view = CheckoutView::new(snapshot, wizard);
        if advance == Advance::Completed {
            notices::success(self.session, Advance::COMPLETED_MESSAGE).await?;
            view.message = Some(Advance::COMPLETED_MESSAGE);
        }
        Ok(view)
    }

    /// Go back one step. A no-op on the first step.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::NoSnapshot` when no checkout is in progress.
    pub async fn back(&self) -> Result<CheckoutView> {
        let (snapshot, mut wizard) = self.load().await?;
        wizard.back();
        store(self.session, session_keys::CHECKOUT_WIZARD, &wizard).await?;
        Ok(CheckoutView::new(snapshot, wizard))
    }

    /// Snapshot and wizard, or `NoSnapshot`.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::NoSnapshot` when no checkout is in progress.
    pub async fn load(&self) -> Result<(CheckoutSnapshot, CheckoutWizard)> {
        let snapshot = self
            .session
            .get::<CheckoutSnapshot>(session_keys::CHECKOUT)
            .await?
            .ok_or(CheckoutError::NoSnapshot)?;
        let wizard: CheckoutWizard = load(self.session, session_keys::CHECKOUT_WIZARD).await?;
        Ok((snapshot, wizard))
    }

    /// Forget the snapshot and wizard.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn finish(&self) -> Result<()> {
        self.session.remove_value(session_keys::CHECKOUT).await?;
        self.session
            .remove_value(session_keys::CHECKOUT_WIZARD)
            .await?;
        Ok(())
    }
}
