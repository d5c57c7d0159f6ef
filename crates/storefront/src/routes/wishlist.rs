//! Wishlist route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use bazaar_core::{ProductId, WishlistItem};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::services::notices;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WishlistForm {
    pub product_id: ProductId,
}

/// Wishlist after a change.
#[derive(Debug, Serialize)]
pub struct WishlistView {
    pub message: String,
    pub items: Vec<WishlistItem>,
}

#[instrument(skip(state, auth))]
pub async fn show(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<Json<Vec<WishlistItem>>> {
    Ok(Json(state.catalog().wishlist(&auth.ctx).await?))
}

/// Add a product. Adding one that is already listed is a no-op.
#[instrument(skip(state, session, auth))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAuth,
    Json(form): Json<WishlistForm>,
) -> Result<Json<WishlistView>> {
    let catalog = state.catalog();
    let current = catalog.wishlist(&auth.ctx).await?;
    if bazaar_core::types::wishlist::contains(&current, form.product_id) {
        return Ok(Json(WishlistView {
            message: "Already in your wishlist".to_string(),
            items: current,
        }));
    }

    let message = catalog
        .add_to_wishlist(&auth.ctx, form.product_id)
        .await?
        .unwrap_or_else(|| "Added to wishlist".to_string());
    notices::success(&session, message.clone()).await?;

    Ok(Json(WishlistView {
        message,
        items: catalog.wishlist(&auth.ctx).await?,
    }))
}

#[instrument(skip(state, session, auth))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAuth,
    Path(product_id): Path<ProductId>,
) -> Result<Json<WishlistView>> {
    let catalog = state.catalog();
    let message = catalog
        .remove_from_wishlist(&auth.ctx, product_id)
        .await?
        .unwrap_or_else(|| "Removed from wishlist".to_string());
    notices::success(&session, message.clone()).await?;

    Ok(Json(WishlistView {
        message,
        items: catalog.wishlist(&auth.ctx).await?,
    }))
}
