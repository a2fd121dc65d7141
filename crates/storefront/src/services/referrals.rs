//! Referral program.
//!
//! Wraps the profile and referral repositories with the program's rules:
//! stats are never zeroed on a failed lookup, codes are matched
//! case-insensitively, and a claim either fully succeeds or changes nothing.

use sqlx::PgPool;
use tracing::instrument;

use secret_menu_core::referral::{CodeValidation, ReferralCode, ReferralError, ReferralStats};
use secret_menu_core::{Email, ProfileId};

use crate::db::{
    CheckoutRepository, ClaimOutcome, ProfileRepository, ReferralRepository, RepositoryError,
};
use crate::error::AppError;
use crate::models::Profile;

/// Stats for `member`.
///
/// # Errors
///
/// Returns [`ReferralError::Unavailable`] when the profile or its referrals
/// cannot be loaded, so "no referrals yet" is never confused with a failed
/// lookup.
#[instrument(skip(pool), fields(member = %member))]
pub async fn stats(pool: &PgPool, member: ProfileId) -> Result<ReferralStats, ReferralError> {
    let profile = match ProfileRepository::new(pool).get_by_id(member).await {
        Ok(Some(profile)) => profile,
        Ok(None) => {
            tracing::warn!("Signed-in member has no profile");
            return Err(ReferralError::Unavailable);
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to load profile");
            return Err(ReferralError::Unavailable);
        }
    };

    let records = ReferralRepository::new(pool)
        .list_for_referrer(member)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to load referrals");
            ReferralError::Unavailable
        })?;

    Ok(ReferralStats::aggregate(&profile.referrer(), &records))
}

/// Check a code typed by a prospective member.
///
/// Malformed and unknown codes are both reported as invalid.
///
/// # Errors
///
/// Returns `RepositoryError` if the lookup fails.
#[instrument(skip(pool))]
pub async fn validate_code(pool: &PgPool, raw: &str) -> Result<CodeValidation, RepositoryError> {
    let Ok(code) = ReferralCode::parse(raw) else {
        return Ok(CodeValidation::invalid());
    };

    Ok(match ProfileRepository::new(pool).get_by_code(&code).await? {
        Some(referrer) => CodeValidation {
            valid: true,
            referrer_name: referrer.name,
            invites_available: referrer.invites_remaining > 0,
        },
        None => CodeValidation::invalid(),
    })
}

/// Attach `raw` as the referral code that brought `member` in.
///
/// # Errors
///
/// Returns a validation error for unknown codes, exhausted referrers and
/// self-referral, a conflict when the member was already referred, and a
/// database error otherwise.
#[instrument(skip(pool), fields(member = %member))]
pub async fn claim(pool: &PgPool, member: ProfileId, raw: &str) -> Result<(), AppError> {
    let code = ReferralCode::parse(raw)?;

    match ReferralRepository::new(pool)
        .process_referral(member, &code)
        .await?
    {
        ClaimOutcome::Claimed => {
            tracing::info!(code = %code, "Referral claimed");
            Ok(())
        }
        ClaimOutcome::UnknownCode => Err(ReferralError::InvalidCode.into()),
        ClaimOutcome::NoInvitesRemaining => Err(ReferralError::NoInvitesRemaining.into()),
        ClaimOutcome::SelfReferral => Err(ReferralError::SelfReferral.into()),
        ClaimOutcome::AlreadyReferred => Err(ReferralError::AlreadyReferred.into()),
    }
}

/// The visitor who finished a checkout, as their session knows them.
#[derive(Debug, Clone, Copy)]
pub struct CheckoutOwner<'a> {
    /// Stripe checkout session id from the success redirect.
    pub session_id: &'a str,
    /// Code captured with the lead, if any.
    pub referral: Option<&'a ReferralCode>,
}

/// What recording a first order produced.
#[derive(Debug)]
pub struct FirstOrder {
    pub profile: Profile,
    /// This visitor redeemed the checkout session and may be signed in.
    pub redeemed: bool,
}

/// Record a confirmed first subscription for `email`.
///
/// Creates the member's profile if needed. When `owner` redeems the checkout
/// session for the first time, the referral code they arrived with is
/// claimed. A `signed_up` referral for the member then moves to
/// `first_order`, so one checkout completes a referral. A code that cannot
/// be claimed is logged and skipped; the payment already went through.
///
/// # Errors
///
/// Returns `RepositoryError` if a write fails.
#[instrument(skip(pool, email, owner))]
pub async fn complete_first_order(
    pool: &PgPool,
    email: &Email,
    owner: Option<CheckoutOwner<'_>>,
) -> Result<FirstOrder, RepositoryError> {
    let profile = ProfileRepository::new(pool)
        .upsert_by_email(email, None)
        .await?;
    let referrals = ReferralRepository::new(pool);

    let mut redeemed = false;
    if let Some(owner) = owner {
        redeemed = CheckoutRepository::new(pool)
            .redeem(owner.session_id, profile.id)
            .await?;
        if let (true, Some(code)) = (redeemed, owner.referral) {
            match referrals.process_referral(profile.id, code).await? {
                ClaimOutcome::Claimed => {
                    tracing::info!(code = %code, member = %profile.id, "Referral claimed at checkout");
                }
                outcome => {
                    tracing::warn!(code = %code, ?outcome, "Referral code not applied at checkout");
                }
            }
        }
    }

    if referrals.mark_first_order(profile.id).await? {
        tracing::info!(member = %profile.id, "Referral reached first order");
    }

    Ok(FirstOrder { profile, redeemed })
}
