//! Account route handlers: profile, email verification and addresses.

use axum::{
    Json,
    extract::{Path, State},
};
use bazaar_core::{Address, AddressId, AddressInput, ProfileUpdate, UserProfile};
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, clear_sentry_user};
use crate::middleware::{RequireAuth, clear_visitor_state, set_current_user};
use crate::services::notices;
use crate::state::AppState;

use super::{Ack, ack};

/// Addresses after a change.
#[derive(Debug, Serialize)]
pub struct AddressesView {
    pub message: String,
    pub addresses: Vec<Address>,
}

// =============================================================================
// Profile
// =============================================================================

/// Fresh profile from the user service.
#[instrument(skip(state, session, auth))]
pub async fn profile(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAuth,
) -> Result<Json<UserProfile>> {
    let profile = state.users().profile(&auth.ctx).await?;

    let mut user = auth.user;
    if user.profile != profile {
        user.profile = profile.clone();
        set_current_user(&session, &user).await?;
    }
    Ok(Json(profile))
}

/// Update the profile. An update identical to the current profile is refused.
#[instrument(skip(state, session, auth, form))]
pub async fn update_profile(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAuth,
    Json(form): Json<ProfileUpdate>,
) -> Result<Json<UserProfile>> {
    let current = state.users().profile(&auth.ctx).await?;
    form.validate(&current)?;

    let updated = state.users().update_profile(&auth.ctx, &form).await?;
    let mut user = auth.user;
    user.profile = updated.clone();
    set_current_user(&session, &user).await?;
    notices::success(&session, "Profile updated successfully").await?;

    Ok(Json(updated))
}

#[instrument(skip(state, auth))]
pub async fn send_verification(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<Json<Ack>> {
    let message = state
        .users()
        .send_verification(&auth.ctx, &auth.user.profile.email)
        .await?;
    Ok(ack(message, "Verification email sent"))
}

/// Deactivate the account and log out.
#[instrument(skip(state, session, auth), fields(user_id = %auth.user.id()))]
pub async fn deactivate(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAuth,
) -> Result<Json<Ack>> {
    let message = state.users().deactivate(&auth.ctx, auth.user.id()).await?;
    tracing::info!("Account deactivated");

    clear_visitor_state(&session).await?;
    session.cycle_id().await?;
    clear_sentry_user();
    Ok(ack(message, "Account deactivated"))
}

// =============================================================================
// Addresses
// =============================================================================

#[instrument(skip(state, auth))]
pub async fn addresses(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<Json<Vec<Address>>> {
    Ok(Json(state.users().addresses(&auth.ctx).await?))
}

async fn refreshed(
    state: &AppState,
    session: &Session,
    auth: &RequireAuth,
    message: Option<String>,
    fallback: &str,
) -> Result<Json<AddressesView>> {
    let message = message.unwrap_or_else(|| fallback.to_string());
    notices::success(session, message.clone()).await?;
    Ok(Json(AddressesView {
        message,
        addresses: state.users().addresses(&auth.ctx).await?,
    }))
}

#[instrument(skip(state, session, auth, form))]
pub async fn create_address(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAuth,
    Json(form): Json<AddressInput>,
) -> Result<Json<AddressesView>> {
    form.validate()?;
    let message = state.users().add_address(&auth.ctx, &form).await?;
    refreshed(&state, &session, &auth, message, "Address added successfully").await
}

#[instrument(skip(state, session, auth, form))]
pub async fn update_address(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAuth,
    Path(id): Path<AddressId>,
    Json(form): Json<AddressInput>,
) -> Result<Json<AddressesView>> {
    form.validate()?;
    let message = state.users().update_address(&auth.ctx, id, &form).await?;
    refreshed(&state, &session, &auth, message, "Address updated successfully").await
}

#[instrument(skip(state, session, auth))]
pub async fn delete_address(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAuth,
    Path(id): Path<AddressId>,
) -> Result<Json<AddressesView>> {
    let message = state.users().delete_address(&auth.ctx, id).await?;
    refreshed(&state, &session, &auth, message, "Address deleted successfully").await
}

#[instrument(skip(state, session, auth))]
pub async fn set_primary_address(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAuth,
    Path(id): Path<AddressId>,
) -> Result<Json<AddressesView>> {
    let message = state.users().set_primary_address(&auth.ctx, id).await?;
    refreshed(&state, &session, &auth, message, "Primary address updated").await
}
