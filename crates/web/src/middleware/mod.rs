//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span with status and latency)
//! 3. Request ID (record in span, echo in response)
//! 4. Security headers (CSP, frame, referrer, isolation)
//! 5. Session layer (tower-sessions with `PostgreSQL` store)
//! 6. Rate limiting on credential posts (governor)
//!
//! Authentication is enforced per handler with the extractors in [`auth`].

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{AdminRejection, OptionalAuth, RequireAdmin, RequireAuth};
pub use rate_limit::login_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
