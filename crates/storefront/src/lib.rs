//! SF Secret Menu storefront library.
//!
//! JSON API for the meal-subscription site: plan catalog and pricing,
//! delivery-zone checks, weekly menus, the session-held onboarding wizard,
//! Stripe checkout hand-off and the referral program. Exposed as a library so
//! the router can be driven in-process by tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::{Router, extract::Request, middleware::from_fn};
use tower_http::trace::TraceLayer;
use tower_sessions::{SessionManagerLayer, SessionStore};

pub use routes::RateLimiting;
pub use state::AppState;

/// Build the application router.
///
/// Sentry layers are left to the binary so tests run without a hub.
pub fn app<S>(
    state: AppState,
    session_layer: SessionManagerLayer<S>,
    rate_limiting: RateLimiting,
) -> Router
where
    S: SessionStore + Clone,
{
    routes::routes(rate_limiting)
        .layer(session_layer)
        .layer(from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
            )
        }))
        .with_state(state)
}
