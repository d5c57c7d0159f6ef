//! Authentication route handlers.
//!
//! The user service issues a bearer token on login, signup and role switch.
//! The token and profile are kept in the session; nothing refreshes them.

use axum::{Json, extract::State};
use bazaar_core::{LoginInput, PasswordResetInput, SignupInput, UserProfile};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::api::{AuthSession, CallContext};
use crate::error::{AppError, Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequestId, RequireAuth, clear_visitor_state, set_current_user};
use crate::models::CurrentUser;
use crate::services::notices;
use crate::state::AppState;

use super::{Ack, ack};

/// Logged-in visitor as returned to the client. The token stays server-side.
#[derive(Debug, Serialize)]
pub struct LoggedIn {
    pub message: &'static str,
    pub user: UserProfile,
}

#[derive(Debug, Deserialize)]
pub struct SwitchRoleForm {
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetRequestForm {
    pub email: String,
}

/// Reset request result. The link is only present when the user service
/// echoes it back (no mail transport in development).
#[derive(Debug, Serialize)]
pub struct ResetRequested {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_password_link: Option<String>,
}

async fn start_session(session: &Session, auth: AuthSession) -> Result<UserProfile> {
    // New identity, new session id
    session.cycle_id().await?;
    let user = CurrentUser {
        profile: auth.user,
        token: auth.token,
    };
    set_current_user(session, &user).await?;
    set_sentry_user(&user.id(), Some(&user.profile.email));
    Ok(user.profile)
}

// =============================================================================
// Login / Signup
// =============================================================================

/// Log in with email or username.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    RequestId(request_id): RequestId,
    Json(form): Json<LoginInput>,
) -> Result<Json<LoggedIn>> {
    form.validate()?;
    let ctx = CallContext::anonymous(Some(request_id));

    let auth = state.users().login(&ctx, &form).await.inspect_err(|e| {
        tracing::warn!(error = %e, "Login failed");
    })?;
    let user = start_session(&session, auth).await?;
    notices::success(&session, "Login successful").await?;

    Ok(Json(LoggedIn {
        message: "Login successful",
        user,
    }))
}

/// Create an account and log straight in.
#[instrument(skip(state, session, form))]
pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    RequestId(request_id): RequestId,
    Json(form): Json<SignupInput>,
) -> Result<Json<LoggedIn>> {
    form.validate()?;
    let ctx = CallContext::anonymous(Some(request_id));

    let auth = state.users().signup(&ctx, &form).await?;
    let user = start_session(&session, auth).await?;
    add_breadcrumb("auth", "Account created", None);
    notices::success(&session, "Account created successfully").await?;

    Ok(Json(LoggedIn {
        message: "Account created successfully",
        user,
    }))
}

/// Re-login as another role account of the same person.
#[instrument(skip(state, session, user, ctx, form))]
pub async fn switch_role(
    State(state): State<AppState>,
    session: Session,
    RequireAuth { user, ctx }: RequireAuth,
    Json(form): Json<SwitchRoleForm>,
) -> Result<Json<LoggedIn>> {
    let allowed = user
        .profile
        .role
        .switchable()
        .any(|account| account.username == form.username);
    if !allowed {
        return Err(AppError::BadRequest(
            "You don't hold a role account with that username".to_string(),
        ));
    }

    let auth = state.users().switch_role(&ctx, &form.username).await?;
    tracing::info!(from = %user.id(), to = %auth.user.id, "Role switched");

    // The cart and checkout belong to the previous account
    clear_visitor_state(&session).await?;
    let profile = start_session(&session, auth).await?;

    Ok(Json(LoggedIn {
        message: "Role switched successfully",
        user: profile,
    }))
}

// =============================================================================
// Logout
// =============================================================================

/// Forget the token, the user and everything tied to them.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Json<Ack>> {
    clear_visitor_state(&session).await?;
    session.cycle_id().await?;
    clear_sentry_user();
    Ok(ack(None, "Logged out successfully"))
}

// =============================================================================
// Password Reset
// =============================================================================

#[instrument(skip(state, form))]
pub async fn request_password_reset(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    Json(form): Json<ResetRequestForm>,
) -> Result<Json<ResetRequested>> {
    if form.email.trim().is_empty() {
        let mut errors = bazaar_core::FieldErrors::new();
        errors.add("email", "Email is required");
        return Err(errors.into());
    }
    let ctx = CallContext::anonymous(Some(request_id));
    let (message, link) = state
        .users()
        .request_password_reset(&ctx, form.email.trim())
        .await?;

    Ok(Json(ResetRequested {
        message: message.unwrap_or_else(|| "Password reset link sent".to_string()),
        reset_password_link: link,
    }))
}

#[instrument(skip(state, session, form))]
pub async fn reset_password(
    State(state): State<AppState>,
    session: Session,
    RequestId(request_id): RequestId,
    Json(form): Json<PasswordResetInput>,
) -> Result<Json<Ack>> {
    form.validate()?;
    let ctx = CallContext::anonymous(Some(request_id));
    let message = state
        .users()
        .reset_password(&ctx, &form.token, &form.new_password)
        .await?;
    notices::success(&session, "Password reset successfully").await?;
    Ok(ack(message, "Password reset successfully"))
}
