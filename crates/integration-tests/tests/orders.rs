//! Order history filtering.

#![allow(clippy::unwrap_used)]

use bazaar_integration_tests::{TestContext, json_body};
use serde_json::json;

async fn with_orders() -> TestContext {
    let ctx = TestContext::start().await;
    ctx.backend().orders = vec![
        json!({"id": 1, "order_id": "ORD-1", "order_status": "pending",
               "total_amount": 499.5, "created_at": "2024-03-01T10:00:00Z"}),
        json!({"id": 2, "order_id": "ORD-2", "order_status": "delivered",
               "total_amount": 1500.0, "created_at": "2024-03-15 08:30:00"}),
        json!({"id": 3, "order_id": "ORD-3", "order_status": "shipped",
               "total_amount": 80.0, "created_at": "2024-04-02T12:00:00"}),
    ];
    ctx.login().await;
    ctx
}

fn ids(body: &serde_json::Value) -> Vec<i64> {
    body["orders"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_unfiltered_lists_everything() {
    let ctx = with_orders().await;
    let body = json_body(ctx.get("/orders").await).await;
    assert_eq!(body["total"], 3);
    assert_eq!(ids(&body), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_filters_combine() {
    let ctx = with_orders().await;

    let body = json_body(ctx.get("/orders?status=delivered").await).await;
    assert_eq!(ids(&body), vec![2]);

    let march = "/orders?from=2024-03-01&to=2024-03-31&min_amount=500";
    let body = json_body(ctx.get(march).await).await;
    assert_eq!(ids(&body), vec![2]);

    // Blank values and "all" are unset
    let body = json_body(ctx.get("/orders?status=all&from=&max_amount=499.5").await).await;
    assert_eq!(ids(&body), vec![1, 3]);
    assert_eq!(body["total"], 3);
}
