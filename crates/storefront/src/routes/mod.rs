//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                         - Liveness
//! GET  /health/ready                   - Database readiness
//!
//! # Catalog
//! GET  /api/plans                      - Tier table
//! GET  /api/pricing                    - Price breakdown
//! POST /api/delivery-zone              - Zone classification
//!
//! # Menus
//! GET  /api/menus                      - All weeks
//! GET  /api/menus/current              - Week for today
//! GET  /api/menus/{id}                 - One week
//!
//! # Onboarding (session-held wizard)
//! POST /api/onboarding/capture         - Email, zip and invite code capture (strict limit)
//! GET  /api/onboarding                 - Current step, draft, summary
//! POST /api/onboarding/plan            - Select meal count
//! PUT  /api/onboarding/preferences     - Calorie/diets/allergies
//! PUT  /api/onboarding/delivery        - Delivery fields
//! POST /api/onboarding/next            - Forward transition
//! POST /api/onboarding/back            - Backward transition
//! POST /api/onboarding/checkout        - Start hosted checkout (strict limit)
//! GET  /api/subscription/success       - Verify checkout callback
//!
//! # Referrals
//! GET  /api/referrals                  - Stats (requires member)
//! GET  /api/referrals/share            - Share links (requires member)
//! GET  /api/referrals/validate/{code}  - Code check
//! POST /api/referrals/claim            - Claim a code (requires member)
//! ```

pub mod catalog;
pub mod health;
pub mod menus;
pub mod onboarding;
pub mod referrals;
pub mod subscription;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::middleware::{api_rate_limiter, capture_rate_limiter};
use crate::state::AppState;

/// Whether the per-IP rate limiters are installed.
///
/// The limiters key on proxy headers, so in-process tests run without them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimiting {
    Enabled,
    Disabled,
}

/// Endpoints that create leads or checkout sessions.
fn capture_routes() -> Router<AppState> {
    Router::new()
        .route("/api/onboarding/capture", post(onboarding::capture))
        .route("/api/onboarding/checkout", post(onboarding::checkout))
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/plans", get(catalog::plans))
        .route("/api/pricing", get(catalog::pricing))
        .route("/api/delivery-zone", post(catalog::delivery_zone))
        .route("/api/menus", get(menus::index))
        .route("/api/menus/current", get(menus::current))
        .route("/api/menus/{id}", get(menus::show))
        .route("/api/onboarding", get(onboarding::show))
        .route("/api/onboarding/plan", post(onboarding::select_plan))
        .route("/api/onboarding/preferences", put(onboarding::preferences))
        .route("/api/onboarding/delivery", put(onboarding::delivery))
        .route("/api/onboarding/next", post(onboarding::next))
        .route("/api/onboarding/back", post(onboarding::back))
        .route("/api/subscription/success", get(subscription::success))
        .route("/api/referrals", get(referrals::stats))
        .route("/api/referrals/share", get(referrals::share))
        .route("/api/referrals/validate/{code}", get(referrals::validate))
        .route("/api/referrals/claim", post(referrals::claim))
}

/// Create all routes for the storefront.
pub fn routes(rate_limiting: RateLimiting) -> Router<AppState> {
    let mut capture = capture_routes();
    let mut api = api_routes();

    if rate_limiting == RateLimiting::Enabled {
        capture = capture.layer(capture_rate_limiter());
        api = api.layer(api_rate_limiter());
    }

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .merge(capture)
        .merge(api)
}
