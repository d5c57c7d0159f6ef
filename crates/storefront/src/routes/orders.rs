//! Order history route handlers.

use axum::{
    Json,
    extract::{Query, State},
};
use bazaar_core::{Order, OrderFilter};
use serde::Serialize;
use tracing::instrument;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct OrdersView {
    /// Orders before filtering.
    pub total: usize,
    pub orders: Vec<Order>,
}

/// Order history, filtered locally by status, date and amount.
#[instrument(skip(state, auth))]
pub async fn index(
    State(state): State<AppState>,
    auth: RequireAuth,
    Query(filter): Query<OrderFilter>,
) -> Result<Json<OrdersView>> {
    let orders = state.orders().orders(&auth.ctx).await?;
    let total = orders.len();
    Ok(Json(OrdersView {
        total,
        orders: filter.apply(orders),
    }))
}
