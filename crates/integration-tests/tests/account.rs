//! Account routes that are decided before any upstream call.

#![allow(clippy::unwrap_used)]

use bazaar_integration_tests::{TestContext, json_body};
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_switch_role_only_to_held_accounts() {
    let ctx = TestContext::start().await;
    ctx.login().await;

    for username in ["someone-else", "asha"] {
        let response = ctx
            .post("/auth/switch-role", &json!({ "username": username }))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{username}");
        assert_eq!(
            json_body(response).await["error"],
            "You don't hold a role account with that username"
        );
    }

    // Still logged in as the buyer account
    let cart = ctx.get("/cart").await;
    assert_eq!(cart.status(), StatusCode::OK);
}
