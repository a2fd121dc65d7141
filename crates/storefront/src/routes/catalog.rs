//! Plans, pricing and delivery-zone lookups.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use secret_menu_core::catalog::DEFAULT_MEAL_COUNT;
use secret_menu_core::{PlanId, PlanTier, PriceBreakdown, ZoneCheck, quote};

use crate::error::Result;
use crate::state::AppState;

/// The tier table.
#[derive(Debug, Serialize)]
pub struct PlansResponse {
    pub tiers: Vec<PlanTier>,
    pub default_meal_count: u32,
}

/// List selectable plan tiers.
#[instrument(skip(state))]
pub async fn plans(State(state): State<AppState>) -> Json<PlansResponse> {
    Json(PlansResponse {
        tiers: state.catalog().tiers().to_vec(),
        default_meal_count: state.catalog().default_tier().meal_count,
    })
}

/// Query for [`pricing`].
#[derive(Debug, Deserialize)]
pub struct PricingQuery {
    pub meal_count: Option<u32>,
    /// Defaults to the plan of the nearest tier.
    pub plan: Option<String>,
}

/// Price breakdown for a plan size.
///
/// Meal counts outside the tier table fall back to the nearest tier; an
/// unknown plan id is a configuration error.
#[instrument(skip(state))]
pub async fn pricing(
    State(state): State<AppState>,
    Query(query): Query<PricingQuery>,
) -> Result<Json<PriceBreakdown>> {
    let catalog = state.catalog();
    let meal_count = query.meal_count.unwrap_or(DEFAULT_MEAL_COUNT);
    let plan = match query.plan.as_deref() {
        Some(raw) => raw.parse::<PlanId>()?,
        None => catalog.nearest_tier(meal_count).plan,
    };

    Ok(Json(quote(catalog, meal_count, plan)))
}

/// Body for [`delivery_zone`].
#[derive(Debug, Deserialize)]
pub struct ZoneRequest {
    /// Free-text address or zip.
    pub address: String,
}

/// Classify an address against the delivery area. Never fails.
#[instrument(skip(state, body))]
pub async fn delivery_zone(
    State(state): State<AppState>,
    Json(body): Json<ZoneRequest>,
) -> Json<ZoneCheck> {
    let check = state.service_area().classify(&body.address);
    tracing::debug!(status = ?check.status, "Classified delivery address");
    Json(check)
}
