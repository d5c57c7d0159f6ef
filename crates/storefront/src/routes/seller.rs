//! Seller product management. Needs the seller role to be active.

use axum::{
    Json,
    extract::{Path, State},
};
use bazaar_core::{Product, ProductDraft, ProductId};
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireSeller;
use crate::services::notices;
use crate::state::AppState;

/// Seller's products after a change.
#[derive(Debug, Serialize)]
pub struct ManagedProducts {
    pub message: String,
    pub products: Vec<Product>,
}

/// Products listed by the current seller.
#[instrument(skip(state, seller))]
pub async fn index(
    State(state): State<AppState>,
    seller: RequireSeller,
) -> Result<Json<Vec<Product>>> {
    Ok(Json(state.catalog().manage_products(&seller.ctx).await?))
}

#[instrument(skip(state, session, seller, draft), fields(sku = %draft.sku))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    seller: RequireSeller,
    Json(draft): Json<ProductDraft>,
) -> Result<Json<ManagedProducts>> {
    let draft = draft.normalized();
    draft.validate()?;

    let message = state
        .catalog()
        .add_product(&seller.ctx, &draft)
        .await?
        .unwrap_or_else(|| "Product added successfully".to_string());
    add_breadcrumb("seller", "Product added", Some(&[("sku", draft.sku.as_str())]));
    notices::success(&session, message.clone()).await?;

    Ok(Json(ManagedProducts {
        message,
        products: state.catalog().manage_products(&seller.ctx).await?,
    }))
}

#[instrument(skip(state, session, seller, draft))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    seller: RequireSeller,
    Path(id): Path<ProductId>,
    Json(draft): Json<ProductDraft>,
) -> Result<Json<ManagedProducts>> {
    let draft = draft.normalized();
    draft.validate()?;

    let message = state
        .catalog()
        .update_product(&seller.ctx, id, &draft)
        .await?
        .unwrap_or_else(|| "Product updated successfully".to_string());
    notices::success(&session, message.clone()).await?;

    Ok(Json(ManagedProducts {
        message,
        products: state.catalog().manage_products(&seller.ctx).await?,
    }))
}
