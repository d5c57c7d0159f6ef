//! Checkout and payment route handlers.
//!
//! `POST /checkout` freezes the selected cart lines into a snapshot. The
//! wizard and the payment handoff work from that snapshot only.

use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, header},
    response::{IntoResponse, Redirect, Response},
};
use bazaar_core::AddressId;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::services::{CheckoutService, CheckoutView, OrderPlaced, PaymentService, PaymentView};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AddressForm {
    pub address_id: AddressId,
}

#[derive(Debug, Default, Deserialize)]
pub struct PaymentQuery {
    /// Answer a hosted-page handoff with a 303 instead of JSON.
    #[serde(default)]
    pub redirect: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct FailureForm {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PaymentFailed {
    pub message: &'static str,
    pub retry: bool,
}

/// Browsers navigating (not `fetch`) get redirected to the hosted page.
fn wants_redirect(query: &PaymentQuery, headers: &HeaderMap) -> bool {
    query.redirect
        || headers
            .get(header::ACCEPT)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|accept| accept.contains("text/html"))
}

#[instrument(skip(state, session, auth))]
pub async fn begin(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAuth,
) -> Result<Json<CheckoutView>> {
    let service = CheckoutService::new(&state, &session, &auth.user, &auth.ctx);
    Ok(Json(service.begin().await?))
}

pub async fn show(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAuth,
) -> Result<Json<CheckoutView>> {
    let service = CheckoutService::new(&state, &session, &auth.user, &auth.ctx);
    Ok(Json(service.view().await?))
}

#[instrument(skip(state, session, auth))]
pub async fn select_address(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAuth,
    Json(form): Json<AddressForm>,
) -> Result<Json<CheckoutView>> {
    let service = CheckoutService::new(&state, &session, &auth.user, &auth.ctx);
    Ok(Json(service.select_address(form.address_id).await?))
}

#[instrument(skip(state, session, auth))]
pub async fn next(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAuth,
) -> Result<Json<CheckoutView>> {
    let service = CheckoutService::new(&state, &session, &auth.user, &auth.ctx);
    Ok(Json(service.next().await?))
}

pub async fn back(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAuth,
) -> Result<Json<CheckoutView>> {
    let service = CheckoutService::new(&state, &session, &auth.user, &auth.ctx);
    Ok(Json(service.back().await?))
}

// =============================================================================
// Payment
// =============================================================================

/// Open a payment session for the snapshot.
#[instrument(skip(state, session, auth, headers))]
pub async fn payment(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAuth,
    Query(query): Query<PaymentQuery>,
    headers: HeaderMap,
) -> Result<Response> {
    let service = PaymentService::new(&state, &session, &auth.user, &auth.ctx);
    let view = service.initiate().await?;

    Ok(match view {
        PaymentView::Redirect { url } if wants_redirect(&query, &headers) => {
            Redirect::to(&url).into_response()
        }
        view => Json(view).into_response(),
    })
}

/// The payment widget reported success.
#[instrument(skip(state, session, auth))]
pub async fn payment_success(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAuth,
) -> Result<Json<OrderPlaced>> {
    let service = PaymentService::new(&state, &session, &auth.user, &auth.ctx);
    Ok(Json(service.succeeded().await?))
}

/// The payment widget reported failure. The snapshot is kept for a retry.
#[instrument(skip(state, session, auth))]
pub async fn payment_failure(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAuth,
    Query(form): Query<FailureForm>,
) -> Result<Json<PaymentFailed>> {
    let service = PaymentService::new(&state, &session, &auth.user, &auth.ctx);
    let message = service.failed(form.reason.as_deref()).await?;
    Ok(Json(PaymentFailed {
        message,
        retry: true,
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_wants_redirect() {
        let mut headers = HeaderMap::new();
        assert!(!wants_redirect(&PaymentQuery::default(), &headers));
        assert!(wants_redirect(&PaymentQuery { redirect: true }, &headers));

        headers.insert(
            header::ACCEPT,
            "text/html,application/xhtml+xml".parse().unwrap(),
        );
        assert!(wants_redirect(&PaymentQuery::default(), &headers));
    }
}
