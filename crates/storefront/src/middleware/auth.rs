//! Authentication extractors.
//!
//! The bearer token issued by the user service is kept in the session with
//! the profile. These extractors read it back and build the call context for
//! upstream requests.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::api::CallContext;
use crate::error::AppError;
use crate::models::{CurrentUser, session_keys};

use super::request_id::request_id_of;

/// Message shown when a logged-in visitor is required.
pub const LOGIN_REQUIRED: &str = "You are not logged in, please login first";

/// Extractor that requires a logged-in visitor.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth { user, ctx }: RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.profile.first_name)
/// }
/// ```
pub struct RequireAuth {
    pub user: CurrentUser,
    pub ctx: CallContext,
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = current_user(parts)
            .await?
            .ok_or_else(|| AppError::Unauthorized(LOGIN_REQUIRED.to_string()))?;
        let ctx = user.call_context(request_id_of(parts));
        Ok(Self { user, ctx })
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject the request if the visitor is
/// not logged in; the call context is then anonymous.
pub struct OptionalAuth {
    pub user: Option<CurrentUser>,
    pub ctx: CallContext,
}

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = current_user(parts).await?;
        let request_id = request_id_of(parts);
        let ctx = user.as_ref().map_or_else(
            || CallContext::anonymous(request_id.clone()),
            |u| u.call_context(request_id.clone()),
        );
        Ok(Self { user, ctx })
    }
}

/// Extractor that requires the seller role to be active.
pub struct RequireSeller {
    pub user: CurrentUser,
    pub ctx: CallContext,
}

impl<S> FromRequestParts<S> for RequireSeller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequireAuth { user, ctx } = RequireAuth::from_request_parts(parts, state).await?;
        if !user.is_seller() {
            return Err(AppError::Forbidden(
                "Switch to your seller account to manage products".to_string(),
            ));
        }
        Ok(Self { user, ctx })
    }
}

async fn current_user(parts: &Parts) -> Result<Option<CurrentUser>, AppError> {
    // Set by SessionManagerLayer
    let session = parts
        .extensions
        .get::<Session>()
        .ok_or_else(|| AppError::Internal("session layer missing".to_string()))?;

    Ok(session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await?)
}

/// Helper to set the current user in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Clear everything tied to the logged-in visitor (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_visitor_state(session: &Session) -> Result<(), tower_sessions::session::Error> {
    for key in [
        session_keys::CURRENT_USER,
        session_keys::CART_SELECTION,
        session_keys::CART_COUNT,
        session_keys::CHECKOUT,
        session_keys::CHECKOUT_WIZARD,
    ] {
        session.remove_value(key).await?;
    }
    Ok(())
}
