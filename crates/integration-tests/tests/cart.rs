//! Cart behaviour against the fake cart and catalog services.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use bazaar_integration_tests::{Gate, SHIRT, TOTE, TestContext, json_body};
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_stock_failure_keeps_the_line() {
    let ctx = TestContext::start().await;
    ctx.login().await;
    ctx.backend().stock_error = Some("Product 1 is out of stock".to_string());

    let response = ctx
        .post("/cart/items", &json!({ "product_id": SHIRT, "quantity": 1 }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let outcome = json_body(response).await;
    assert_eq!(outcome["added"], true);
    assert_eq!(outcome["stock_reserved"], false);
    assert_eq!(outcome["message"], "Product is out of stock");

    // Not reconciled: the line stays in the cart
    let cart = json_body(ctx.get("/cart").await).await;
    assert_eq!(cart["items"].as_array().unwrap().len(), 1);
    assert_eq!(cart["count"], 1);

    let notices = json_body(ctx.get("/notices").await).await;
    let error = notices
        .as_array()
        .unwrap()
        .iter()
        .find(|n| n["level"] == "error")
        .unwrap();
    assert_eq!(error["text"], "Product is out of stock");
}

#[tokio::test]
async fn test_stock_decrement_is_sent() {
    let ctx = TestContext::start().await;
    ctx.login().await;

    ctx.post("/cart/items", &json!({ "product_id": SHIRT, "quantity": 3 }))
        .await;
    assert_eq!(ctx.backend().stock.get(&SHIRT), Some(&17));
}

#[tokio::test]
async fn test_cart_requires_login() {
    let ctx = TestContext::start().await;
    let response = ctx.get("/cart").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        json_body(response).await["error"],
        "You are not logged in, please login first"
    );
}

#[tokio::test]
async fn test_rejected_login_passes_upstream_message() {
    let ctx = TestContext::start().await;
    let response = ctx
        .post(
            "/auth/login",
            &json!({ "email": "asha@example.com", "password": "wrong" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"], "Invalid credentials");
}

#[tokio::test]
async fn test_decrement_below_one_is_refused() {
    let ctx = TestContext::start().await;
    ctx.login().await;
    ctx.post("/cart/items", &json!({ "product_id": TOTE })).await;

    let cart = json_body(ctx.get("/cart").await).await;
    let line = cart["items"][0]["cart_id"].as_i64().unwrap();

    let response = ctx
        .post(
            &format!("/cart/items/{line}/quantity"),
            &json!({ "change": "decrease" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let cart = json_body(
        ctx.post(
            &format!("/cart/items/{line}/quantity"),
            &json!({ "change": "increase" }),
        )
        .await,
    )
    .await;
    assert_eq!(cart["items"][0]["quantity"], 2);
}

#[tokio::test]
async fn test_remove_forgets_selection() {
    let ctx = TestContext::start().await;
    ctx.login().await;
    ctx.post("/cart/items", &json!({ "product_id": TOTE })).await;
    ctx.post("/cart/items", &json!({ "product_id": SHIRT })).await;

    let cart = json_body(ctx.post("/cart/select-all", &json!({ "checked": true })).await).await;
    assert_eq!(cart["selected"], 2);
    let line = cart["items"][0]["cart_id"].as_i64().unwrap();

    let cart = json_body(ctx.delete(&format!("/cart/items/{line}")).await).await;
    assert_eq!(cart["items"].as_array().unwrap().len(), 1);
    assert_eq!(cart["selected"], 1);
}

#[tokio::test]
async fn test_partial_clear_reports_remaining() {
    let ctx = TestContext::start().await;
    ctx.login().await;
    ctx.backend().partial_clear = true;
    for product_id in [SHIRT, TOTE, SHIRT] {
        ctx.post("/cart/items", &json!({ "product_id": product_id }))
            .await;
    }

    let response = ctx.delete("/cart").await;
    assert_eq!(response.status(), StatusCode::OK);
    let cleared = json_body(response).await;
    assert_eq!(cleared["partial"], true);
    assert_eq!(cleared["cart"]["count"], 1);
    assert_eq!(cleared["cart"]["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_full_clear_empties_the_cart() {
    let ctx = TestContext::start().await;
    ctx.login().await;
    ctx.post("/cart/items", &json!({ "product_id": SHIRT })).await;

    let cleared = json_body(ctx.delete("/cart").await).await;
    assert_eq!(cleared["partial"], false);
    assert_eq!(cleared["cart"]["message"], "Your cart is empty");

    let status = json_body(ctx.get("/cart/status").await).await;
    assert_eq!(status, json!({ "busy": false, "in_flight": 0, "count": 0 }));
}

#[tokio::test]
async fn test_product_detail_and_missing_product() {
    let ctx = TestContext::start().await;

    let product = json_body(ctx.get(&format!("/products/{SHIRT}")).await).await;
    assert_eq!(product["name"], "Linen Shirt");

    let response = ctx.get("/products/99").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

/// Start an add-to-cart whose stock call parks at a gate, check the loading
/// state while it waits, then let it finish.
async fn busy_during_add(ctx: &TestContext) -> serde_json::Value {
    let gate = Arc::new(Gate::default());
    ctx.backend().stock_gate = Some(Arc::clone(&gate));

    let client = ctx.client.clone();
    let url = ctx.url("/cart/items");
    let pending = tokio::spawn(async move {
        client
            .post(url)
            .json(&json!({ "product_id": SHIRT, "quantity": 1 }))
            .send()
            .await
            .unwrap()
    });

    gate.reached().await;
    let status = json_body(ctx.get("/cart/status").await).await;
    assert_eq!(status["busy"], true);
    assert_eq!(status["in_flight"], 1);

    gate.open();
    let response = pending.await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let status = json_body(ctx.get("/cart/status").await).await;
    assert_eq!(status["busy"], false);
    assert_eq!(status["in_flight"], 0);
    json_body(response).await
}

#[tokio::test]
async fn test_add_is_busy_until_stock_answers() {
    let ctx = TestContext::start().await;
    ctx.login().await;

    let outcome = busy_during_add(&ctx).await;
    assert_eq!(outcome["stock_reserved"], true);
}

#[tokio::test]
async fn test_add_clears_busy_after_stock_failure() {
    let ctx = TestContext::start().await;
    ctx.login().await;
    ctx.backend().stock_error = Some("Product 1 is out of stock".to_string());

    let outcome = busy_during_add(&ctx).await;
    assert_eq!(outcome["stock_reserved"], false);
    assert_eq!(outcome["message"], "Product is out of stock");
}

#[tokio::test]
async fn test_quantity_change_reports_unreachable_cart() {
    let ctx = TestContext::start().await;
    ctx.login().await;
    ctx.post("/cart/items", &json!({ "product_id": TOTE })).await;
    let cart = json_body(ctx.get("/cart").await).await;
    let line = cart["items"][0]["cart_id"].as_i64().unwrap();
    json_body(ctx.get("/notices").await).await;

    ctx.backend().cart_down = true;
    let response = ctx
        .post(
            &format!("/cart/items/{line}/quantity"),
            &json!({ "change": "increase" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let notices = json_body(ctx.get("/notices").await).await;
    assert_eq!(notices[0]["level"], "error");
    assert_eq!(notices[0]["text"], "External service error");
}
