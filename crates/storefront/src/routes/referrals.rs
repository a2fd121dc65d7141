//! Referral program endpoints.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use secret_menu_core::referral::{
    CodeValidation, ReferralError, ReferralStats, ShareLinks, referral_link,
};

use crate::db::ProfileRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireMember;
use crate::services::referrals;
use crate::state::AppState;

/// Stats plus the member's shareable link.
#[derive(Debug, Serialize)]
pub struct ReferralStatsResponse {
    #[serde(flatten)]
    pub stats: ReferralStats,
    pub referral_link: String,
}

/// Referral stats for the signed-in member.
#[instrument(skip(state, member), fields(member = %member.id))]
pub async fn stats(
    State(state): State<AppState>,
    RequireMember(member): RequireMember,
) -> Result<Json<ReferralStatsResponse>> {
    let stats = referrals::stats(state.pool(), member.id).await?;
    let referral_link = referral_link(&state.config().base_url, &stats.referral_code);
    Ok(Json(ReferralStatsResponse {
        stats,
        referral_link,
    }))
}

/// Share links for the signed-in member's code.
#[instrument(skip(state, member), fields(member = %member.id))]
pub async fn share(
    State(state): State<AppState>,
    RequireMember(member): RequireMember,
) -> Result<Json<ShareLinks>> {
    let profile = ProfileRepository::new(state.pool())
        .get_by_id(member.id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to load profile");
            AppError::from(ReferralError::Unavailable)
        })?
        .ok_or(ReferralError::Unavailable)?;

    Ok(Json(ShareLinks::new(
        &state.config().base_url,
        &profile.referral_code,
    )))
}

/// Check a referral code. Unknown and malformed codes are `valid: false`.
#[instrument(skip(state))]
pub async fn validate(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<CodeValidation>> {
    Ok(Json(referrals::validate_code(state.pool(), &code).await?))
}

/// Body for [`claim`].
#[derive(Debug, Deserialize)]
pub struct ClaimRequest {
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct ClaimResponse {
    pub claimed: bool,
    pub code: String,
}

/// Attach a referral code to the signed-in member.
#[instrument(skip(state, member, body), fields(member = %member.id))]
pub async fn claim(
    State(state): State<AppState>,
    RequireMember(member): RequireMember,
    Json(body): Json<ClaimRequest>,
) -> Result<Json<ClaimResponse>> {
    referrals::claim(state.pool(), member.id, &body.code).await?;
    Ok(Json(ClaimResponse {
        claimed: true,
        code: body.code.trim().to_ascii_uppercase(),
    }))
}
