//! End-to-end test harness for the Bazaar storefront.
//!
//! [`TestContext::start`] binds two servers on ephemeral ports:
//!
//! - a fake upstream implementing the user, catalog, cart, order and
//!   payment endpoints the storefront calls, backed by [`Backend`]
//! - the real storefront router, configured to use that upstream
//!
//! Tests drive the storefront through a `reqwest` client with a cookie
//! store, so the session behaves as it does in a browser.
//!
//! ```bash
//! cargo test -p bazaar-integration-tests
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use bazaar_core::CurrencyCode;
use bazaar_storefront::config::{PaymentConfig, SentryConfig, ServiceUrls, StorefrontConfig};
use bazaar_storefront::state::AppState;
use serde_json::{Value, json};
use tokio::sync::Notify;
use url::Url;

/// Token the fake user service issues.
pub const TOKEN: &str = "test-token";
/// Id of the single saved address.
pub const ADDRESS_ID: i64 = 11;
/// Linen shirt: 500.00 with 10% off.
pub const SHIRT: i64 = 1;
/// Canvas tote: 200.00, no discount.
pub const TOTE: i64 = 2;

/// What the fake payment service answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaymentMode {
    #[default]
    Widget,
    Redirect,
    /// Neither a token nor a URL.
    Empty,
}

/// Holds a fake endpoint mid-request until the test lets it answer.
#[derive(Debug, Default)]
pub struct Gate {
    arrived: Notify,
    release: Notify,
}

impl Gate {
    /// Wait until a request is parked at the gate.
    pub async fn reached(&self) {
        self.arrived.notified().await;
    }

    /// Let the parked request answer.
    pub fn open(&self) {
        self.release.notify_one();
    }

    async fn pass(&self) {
        self.arrived.notify_one();
        self.release.notified().await;
    }
}

/// State of the fake upstream services.
#[derive(Debug, Default)]
pub struct Backend {
    pub cart: Vec<Value>,
    pub next_line: i64,
    pub stock: HashMap<i64, i64>,
    /// When set, stock updates fail with this message.
    pub stock_error: Option<String>,
    /// When set, stock updates wait at this gate before answering.
    pub stock_gate: Option<Arc<Gate>>,
    /// When set, `GET /user/cart` answers 503.
    pub cart_down: bool,
    /// When set, clearing the cart leaves the first line behind.
    pub partial_clear: bool,
    pub payment_mode: PaymentMode,
    /// Payment requests received.
    pub payments: Vec<Value>,
    /// Orders created (`dataToSend` bodies).
    pub created_orders: Vec<Value>,
    /// When set, order creation fails with this status and message.
    pub order_error: Option<(StatusCode, String)>,
    /// Orders listed by `GET /user/orders`.
    pub orders: Vec<Value>,
}

pub type Shared = Arc<Mutex<Backend>>;

fn lock(shared: &Shared) -> MutexGuard<'_, Backend> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Catalog record for one of the two fake products.
#[must_use]
pub fn product(id: i64) -> Value {
    match id {
        SHIRT => json!({
            "id": SHIRT, "name": "Linen Shirt", "sku": "LIN-01",
            "price": 500.0, "discount": 10.0, "quantity": 20
        }),
        _ => json!({
            "id": TOTE, "name": "Canvas Tote", "sku": "TOTE-01",
            "price": 200.0, "discount": 0.0, "quantity": 5
        }),
    }
}

fn address() -> Value {
    json!({
        "address_id": ADDRESS_ID,
        "full_name": "Asha Rao",
        "phone_number": "9876543210",
        "street": "12 MG Road",
        "area": "Indiranagar",
        "city": "Bengaluru",
        "state": "Karnataka",
        "postal_code": "560038",
        "country": "India",
        "address_type": "home",
        "is_primary": true
    })
}

fn user() -> Value {
    json!({
        "id": 7,
        "username": "asha",
        "first_name": "Asha",
        "last_name": "Rao",
        "email": "asha@example.com",
        "role": {
            "active_role": {"role": "buyer", "username": "asha"},
            "roles": [
                {"role": "buyer", "username": "asha"},
                {"role": "seller", "username": "asha-shop"}
            ]
        }
    })
}

fn reject(status: StatusCode, error: &str) -> Response {
    (status, Json(json!({ "error": error }))).into_response()
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {TOKEN}"))
}

macro_rules! require_token {
    ($headers:expr) => {
        if !authorized(&$headers) {
            return reject(StatusCode::UNAUTHORIZED, "invalid or expired token");
        }
    };
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["password"] == "wrong" {
        return reject(StatusCode::UNAUTHORIZED, "Invalid credentials");
    }
    Json(json!({
        "message": "Login successful",
        "data": { "token": TOKEN, "user": user() }
    }))
    .into_response()
}

async fn addresses(headers: HeaderMap) -> Response {
    require_token!(headers);
    Json(json!({ "data": [address()] })).into_response()
}

async fn cart(State(shared): State<Shared>, headers: HeaderMap) -> Response {
    require_token!(headers);
    let backend = lock(&shared);
    if backend.cart_down {
        return reject(StatusCode::SERVICE_UNAVAILABLE, "cart store unavailable");
    }
    let items = if backend.cart.is_empty() {
        Value::Null
    } else {
        Value::Array(backend.cart.clone())
    };
    Json(json!({ "data": { "items": items } })).into_response()
}

async fn cart_add(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    require_token!(headers);
    let mut backend = lock(&shared);
    for item in body["items"].as_array().cloned().unwrap_or_default() {
        let product_id = item["product_id"].as_i64().unwrap_or_default();
        backend.next_line += 1;
        let cart_id = 100 + backend.next_line;
        backend.cart.push(json!({
            "cart_id": cart_id,
            "product": product(product_id),
            "quantity": item["quantity"],
        }));
    }
    Json(json!({ "message": "Item added to cart" })).into_response()
}

async fn cart_quantity(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Path(cart_id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    require_token!(headers);
    let mut backend = lock(&shared);
    let Some(line) = backend.cart.iter_mut().find(|l| l["cart_id"] == cart_id) else {
        return reject(StatusCode::NOT_FOUND, "Cart item not found");
    };
    let quantity = line["quantity"].as_i64().unwrap_or_default();
    line["quantity"] = match body["method"].as_str() {
        Some("add") => json!(quantity + 1),
        _ => json!(quantity - 1),
    };
    Json(json!({ "message": "Quantity updated" })).into_response()
}

async fn cart_remove(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Path(cart_id): Path<i64>,
) -> Response {
    require_token!(headers);
    lock(&shared).cart.retain(|l| l["cart_id"] != cart_id);
    Json(json!({ "message": "Item removed" })).into_response()
}

async fn cart_clear(State(shared): State<Shared>, headers: HeaderMap) -> Response {
    require_token!(headers);
    let mut backend = lock(&shared);
    let total = backend.cart.len();
    if backend.partial_clear && total > 1 {
        backend.cart.truncate(1);
        return (
            StatusCode::CONFLICT,
            Json(json!({
                "error": "Some items could not be removed",
                "extra": { "active_cart_length": 1, "total_cart_length": total }
            })),
        )
            .into_response();
    }
    backend.cart.clear();
    Json(json!({ "message": "Cart cleared" })).into_response()
}

async fn stock(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    require_token!(headers);
    let gate = lock(&shared).stock_gate.clone();
    if let Some(gate) = gate {
        gate.pass().await;
    }

    let mut backend = lock(&shared);
    if let Some(error) = backend.stock_error.clone() {
        return reject(StatusCode::BAD_REQUEST, &error);
    }
    let quantity = body["quantity"].as_i64().unwrap_or_default();
    let delta = if body["method"] == "add" { quantity } else { -quantity };
    *backend.stock.entry(id).or_insert(20) += delta;
    Json(json!({ "message": "Stock updated" })).into_response()
}

async fn deals() -> Json<Value> {
    Json(json!({ "data": [product(SHIRT)] }))
}

async fn show_product(Path(id): Path<i64>) -> Response {
    if id == SHIRT || id == TOTE {
        Json(json!({ "data": product(id) })).into_response()
    } else {
        reject(StatusCode::NOT_FOUND, "Product not found")
    }
}

async fn payment(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    require_token!(headers);
    let mut backend = lock(&shared);
    backend.payments.push(body);
    let response = match backend.payment_mode {
        PaymentMode::Widget => json!({ "checkout_token": "tok_123" }),
        PaymentMode::Redirect => json!({ "redirect_url": "https://pay.example.com/session/1" }),
        PaymentMode::Empty => json!({}),
    };
    Json(response).into_response()
}

async fn orders(State(shared): State<Shared>, headers: HeaderMap) -> Response {
    require_token!(headers);
    Json(json!({ "data": lock(&shared).orders.clone() })).into_response()
}

async fn create_order(
    State(shared): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    require_token!(headers);
    let mut backend = lock(&shared);
    if let Some((status, error)) = backend.order_error.clone() {
        return reject(status, &error);
    }
    backend.created_orders.push(body["dataToSend"].clone());
    Json(json!({ "message": "Order created" })).into_response()
}

/// The fake upstream: every service on one router.
pub fn upstream(shared: Shared) -> Router {
    Router::new()
        .route("/user/login", post(login))
        .route("/user/address/all", get(addresses))
        .route("/user/cart", get(cart))
        .route("/user/cart/add", post(cart_add))
        .route("/user/cart/clear", delete(cart_clear))
        .route("/user/cart/{cart_id}/update/qty", post(cart_quantity))
        .route("/user/cart/{cart_id}/delete", delete(cart_remove))
        .route("/user/orders", get(orders))
        .route("/user/orders/create", post(create_order))
        .route("/products/deals", get(deals))
        .route("/product/{id}", get(show_product))
        .route("/product/{id}/update-quantity", post(stock))
        .route("/payment/checkout", post(payment))
        .with_state(shared)
}

async fn serve(router: Router) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap_or_else(|e| panic!("bind failed: {e}"));
    let addr = listener
        .local_addr()
        .unwrap_or_else(|e| panic!("no local addr: {e}"));
    tokio::spawn(async move { axum::serve(listener, router).await });
    Url::parse(&format!("http://{addr}")).unwrap_or_else(|e| panic!("bad url: {e}"))
}

/// Storefront configuration pointing every service at `upstream`.
#[must_use]
pub fn config_for(upstream: &Url) -> StorefrontConfig {
    StorefrontConfig {
        host: [127, 0, 0, 1].into(),
        port: 0,
        base_url: "http://localhost:3000".to_string(),
        services: ServiceUrls::all(upstream),
        payment: PaymentConfig {
            currency: CurrencyCode::INR,
            widget_container: "checkout-widget".to_string(),
        },
        upstream_timeout: Duration::from_secs(5),
        catalog_cache_ttl: Duration::from_secs(60),
        sentry: SentryConfig {
            dsn: None,
            environment: None,
            sample_rate: 1.0,
            traces_sample_rate: 0.0,
        },
    }
}

/// A running storefront in front of a fake upstream.
pub struct TestContext {
    pub backend: Shared,
    pub base: Url,
    /// Follows no redirects, so 303 handoffs can be inspected.
    pub client: reqwest::Client,
}

impl TestContext {
    /// Start both servers.
    ///
    /// # Panics
    ///
    /// Panics if a listener can't be bound or the client can't be built.
    pub async fn start() -> Self {
        let backend = Shared::default();
        let upstream_url = serve(upstream(backend.clone())).await;

        let state = AppState::new(config_for(&upstream_url))
            .unwrap_or_else(|e| panic!("state failed: {e}"));
        let base = serve(bazaar_storefront::app(state)).await;

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap_or_else(|e| panic!("client failed: {e}"));

        Self {
            backend,
            base,
            client,
        }
    }

    /// Lock the fake upstream state.
    pub fn backend(&self) -> MutexGuard<'_, Backend> {
        lock(&self.backend)
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base.as_str().trim_end_matches('/'), path)
    }

    /// POST a JSON body.
    ///
    /// # Panics
    ///
    /// Panics if the storefront can't be reached.
    pub async fn post(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .unwrap_or_else(|e| panic!("POST {path} failed: {e}"))
    }

    /// # Panics
    ///
    /// Panics if the storefront can't be reached.
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .unwrap_or_else(|e| panic!("GET {path} failed: {e}"))
    }

    /// # Panics
    ///
    /// Panics if the storefront can't be reached.
    pub async fn delete(&self, path: &str) -> reqwest::Response {
        self.client
            .delete(self.url(path))
            .send()
            .await
            .unwrap_or_else(|e| panic!("DELETE {path} failed: {e}"))
    }

    /// Log in as the fake buyer.
    ///
    /// # Panics
    ///
    /// Panics if the login is refused.
    pub async fn login(&self) {
        let response = self
            .post(
                "/auth/login",
                &json!({ "email": "asha@example.com", "password": "secret1" }),
            )
            .await;
        assert_eq!(response.status(), reqwest::StatusCode::OK, "login failed");
    }
}

/// Read a JSON body.
///
/// # Panics
///
/// Panics if the body isn't JSON.
pub async fn json_body(response: reqwest::Response) -> Value {
    response
        .json()
        .await
        .unwrap_or_else(|e| panic!("body is not JSON: {e}"))
}
