//! Cart route handlers.
//!
//! Every cart route needs a logged-in visitor: the cart lives in the cart
//! service under the visitor's token. The selection used for totals and
//! checkout lives in the session.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
};
use bazaar_core::{CartLineId, ProductId, QuantityChange};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::services::cart::{self, CartStatus, ClearView};
use crate::services::{AddOutcome, CartService, CartView};
use crate::state::AppState;

const fn one() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct AddForm {
    pub product_id: ProductId,
    #[serde(default = "one")]
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct QuantityForm {
    #[serde(alias = "method")]
    pub change: QuantityChange,
}

/// Explicit state, or a toggle when absent.
#[derive(Debug, Default, Deserialize)]
pub struct SelectForm {
    #[serde(default)]
    pub checked: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct SelectAllForm {
    pub checked: bool,
}

/// Cart with selection-based totals.
#[instrument(skip(state, session, auth))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAuth,
) -> Result<Json<CartView>> {
    let service = CartService::new(&state, &session, &auth.user, &auth.ctx);
    Ok(Json(service.view().await?))
}

/// Add a product, then decrement its stock.
///
/// A stock failure after the line was recorded is still a 200: the outcome
/// says `stock_reserved: false` and an error notice is queued.
#[instrument(skip(state, session, auth))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAuth,
    Json(form): Json<AddForm>,
) -> Result<Json<AddOutcome>> {
    let service = CartService::new(&state, &session, &auth.user, &auth.ctx);
    Ok(Json(service.add(form.product_id, form.quantity).await?))
}

#[instrument(skip(state, session, auth))]
pub async fn update_quantity(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAuth,
    Path(cart_id): Path<CartLineId>,
    Json(form): Json<QuantityForm>,
) -> Result<Json<CartView>> {
    let service = CartService::new(&state, &session, &auth.user, &auth.ctx);
    Ok(Json(service.change_quantity(cart_id, form.change).await?))
}

#[instrument(skip(state, session, auth))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAuth,
    Path(cart_id): Path<CartLineId>,
) -> Result<Json<CartView>> {
    let service = CartService::new(&state, &session, &auth.user, &auth.ctx);
    Ok(Json(service.remove(cart_id).await?))
}

#[instrument(skip(state, session, auth))]
pub async fn clear(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAuth,
) -> Result<Json<ClearView>> {
    let service = CartService::new(&state, &session, &auth.user, &auth.ctx);
    Ok(Json(service.clear().await?))
}

#[instrument(skip(state, session, auth, body))]
pub async fn select(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAuth,
    Path(cart_id): Path<CartLineId>,
    body: Bytes,
) -> Result<Json<CartView>> {
    let form: SelectForm = if body.is_empty() {
        SelectForm::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::BadRequest(format!("Invalid selection: {e}")))?
    };
    let checked = form.checked;
    let service = CartService::new(&state, &session, &auth.user, &auth.ctx);
    Ok(Json(service.select(cart_id, checked).await?))
}

#[instrument(skip(state, session, auth))]
pub async fn select_all(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAuth,
    Json(form): Json<SelectAllForm>,
) -> Result<Json<CartView>> {
    let service = CartService::new(&state, &session, &auth.user, &auth.ctx);
    Ok(Json(service.select_all(form.checked).await?))
}

/// Loading state and line count without a cart fetch.
pub async fn status(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAuth,
) -> Result<Json<CartStatus>> {
    Ok(Json(cart::status(&state, &session, &auth.user).await?))
}
