//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                       - Liveness check
//! GET  /health/ready                 - Readiness check
//! GET  /notices                      - Drain queued notices
//!
//! # Auth
//! POST /auth/login                   - Log in
//! POST /auth/signup                  - Create an account
//! POST /auth/logout                  - Log out
//! POST /auth/switch-role             - Re-login as another role account
//! POST /auth/password/reset-request  - Ask for a reset link
//! POST /auth/password/reset          - Set a new password with a reset token
//!
//! # Products
//! GET  /products                     - Listing (filters in query string)
//! GET  /products/categories          - Categories and brands
//! GET  /products/deals               - Deals
//! GET  /products/offers              - Offers
//! GET  /products/featured            - Featured products
//! GET  /products/{id}                - Product detail
//!
//! # Cart (requires auth)
//! GET    /cart                       - Cart with selection totals
//! DELETE /cart                       - Clear the cart
//! POST   /cart/items                 - Add a product (then decrement stock)
//! POST   /cart/items/{id}/quantity   - Increase or decrease by one
//! DELETE /cart/items/{id}            - Remove a line
//! POST   /cart/items/{id}/select     - Tick, untick or toggle a line
//! POST   /cart/select-all            - Tick or untick every line
//! GET    /cart/status                - Busy flag and line count
//!
//! # Wishlist (requires auth)
//! GET    /wishlist                   - Wishlist
//! POST   /wishlist                   - Add a product
//! DELETE /wishlist/{product_id}      - Remove a product
//!
//! # Checkout (requires auth)
//! POST /checkout                     - Snapshot selected lines
//! GET  /checkout                     - Current snapshot and step
//! POST /checkout/address             - Choose the shipping address
//! POST /checkout/next                - Next step
//! POST /checkout/back                - Previous step
//! POST /checkout/payment             - Open a payment session
//! POST /checkout/payment/success     - Widget success: create the order
//! POST /checkout/payment/failure     - Widget failure: keep the snapshot
//!
//! # Orders (requires auth)
//! GET  /orders                       - History (status/date/amount filters)
//!
//! # Account (requires auth)
//! GET  /account/profile              - Profile
//! PUT  /account/profile              - Update profile
//! POST /account/verify-email         - Send verification mail
//! POST /account/deactivate           - Deactivate and log out
//! GET  /account/addresses            - Addresses
//! POST /account/addresses            - Add an address
//! PUT  /account/addresses/{id}       - Update an address
//! DELETE /account/addresses/{id}     - Delete an address
//! POST /account/addresses/{id}/primary - Make an address primary
//!
//! # Seller (requires the seller role)
//! GET  /seller/products              - Own products
//! POST /seller/products              - Add a product
//! PUT  /seller/products/{id}         - Update a product
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod notices;
pub mod orders;
pub mod products;
pub mod seller;
pub mod wishlist;

use axum::{
    Json, Router,
    routing::{delete, get, post, put},
};
use serde::Serialize;

use crate::state::AppState;

/// Plain acknowledgement body.
#[derive(Debug, Serialize)]
pub struct Ack {
    pub message: String,
}

/// The service's message, or `fallback` when it sent none.
pub(crate) fn ack(message: Option<String>, fallback: &str) -> Json<Ack> {
    Json(Ack {
        message: message.unwrap_or_else(|| fallback.to_string()),
    })
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/signup", post(auth::signup))
        .route("/logout", post(auth::logout))
        .route("/switch-role", post(auth::switch_role))
        .route(
            "/password/reset-request",
            post(auth::request_password_reset),
        )
        .route("/password/reset", post(auth::reset_password))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/categories", get(products::categories))
        .route("/deals", get(products::deals))
        .route("/offers", get(products::offers))
        .route("/featured", get(products::featured))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add))
        .route("/items/{cart_id}", delete(cart::remove))
        .route("/items/{cart_id}/quantity", post(cart::update_quantity))
        .route("/items/{cart_id}/select", post(cart::select))
        .route("/select-all", post(cart::select_all))
        .route("/status", get(cart::status))
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::show).post(wishlist::add))
        .route("/{product_id}", delete(wishlist::remove))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show).post(checkout::begin))
        .route("/address", post(checkout::select_address))
        .route("/next", post(checkout::next))
        .route("/back", post(checkout::back))
        .route("/payment", post(checkout::payment))
        .route("/payment/success", post(checkout::payment_success))
        .route("/payment/failure", post(checkout::payment_failure))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/profile",
            get(account::profile).put(account::update_profile),
        )
        .route("/verify-email", post(account::send_verification))
        .route("/deactivate", post(account::deactivate))
        .route(
            "/addresses",
            get(account::addresses).post(account::create_address),
        )
        .route(
            "/addresses/{id}",
            put(account::update_address).delete(account::delete_address),
        )
        .route("/addresses/{id}/primary", post(account::set_primary_address))
}

/// Create the seller routes router.
pub fn seller_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(seller::index).post(seller::create))
        .route("/products/{id}", put(seller::update))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/notices", get(notices::index))
        .route("/orders", get(orders::index))
        .nest("/auth", auth_routes())
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/wishlist", wishlist_routes())
        .nest("/checkout", checkout_routes())
        .nest("/account", account_routes())
        .nest("/seller", seller_routes())
}
