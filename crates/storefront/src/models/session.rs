//! Session-related types.
//!
//! The session plays the part browser local storage played for the
//! single-page app: it holds the bearer token, the visitor's cart selection,
//! the checkout snapshot and pending notices.

use serde::{Deserialize, Serialize};

use bazaar_core::{UserId, UserProfile};

use crate::api::CallContext;

/// Session-stored user identity.
#[derive(Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Profile as last returned by the user service.
    pub profile: UserProfile,
    /// Bearer token issued at login. Never refreshed.
    pub token: String,
}

impl CurrentUser {
    #[must_use]
    pub const fn id(&self) -> UserId {
        self.profile.id
    }

    #[must_use]
    pub fn is_seller(&self) -> bool {
        self.profile.is_seller()
    }

    /// Context for upstream calls made on this user's behalf.
    #[must_use]
    pub fn call_context(&self, request_id: Option<String>) -> CallContext {
        CallContext::new(Some(&self.token), request_id)
    }
}

impl std::fmt::Debug for CurrentUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurrentUser")
            .field("profile", &self.profile)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the set of cart lines ticked for checkout.
    pub const CART_SELECTION: &str = "cart_selection";

    /// Key for the optimistic cart line count.
    pub const CART_COUNT: &str = "cart_count";

    /// Key for the checkout snapshot.
    pub const CHECKOUT: &str = "checkout";

    /// Key for the checkout wizard position and chosen address.
    pub const CHECKOUT_WIZARD: &str = "checkout_wizard";

    /// Key for pending notices.
    pub const NOTICES: &str = "notices";
}
