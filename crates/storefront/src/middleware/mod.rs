//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. Request ID (add unique ID to each request, forwarded upstream)
//! 3. `TraceLayer` (request tracing)
//! 4. CORS
//! 5. Security headers
//! 6. Session layer (tower-sessions with in-memory store)

pub mod auth;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{
    LOGIN_REQUIRED, OptionalAuth, RequireAuth, RequireSeller, clear_visitor_state,
    set_current_user,
};
pub use request_id::{RequestId, request_id_middleware};
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
