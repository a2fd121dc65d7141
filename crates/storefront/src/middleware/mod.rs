//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (recorded on the span)
//! 4. Session layer (tower-sessions with `PostgreSQL` store)
//! 5. Rate limiting (governor), per route group

pub mod member;
pub mod rate_limit;
pub mod request_id;
pub mod session;

pub use member::{RequireMember, set_current_member};
pub use rate_limit::{RateLimiterLayer, api_rate_limiter, capture_rate_limiter};
pub use request_id::request_id_middleware;
pub use session::{create_session_layer, session_layer};
