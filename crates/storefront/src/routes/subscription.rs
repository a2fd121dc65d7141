//! Stripe success redirect.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use secret_menu_core::PlanId;
use secret_menu_core::checkout::{
    CallbackParams, CheckoutCallback, CheckoutGateway, SubscriptionOutcome, resolve_verification,
};

use crate::error::{AppError, Result, add_breadcrumb, set_sentry_user};
use crate::middleware::set_current_member;
use crate::models::CurrentMember;
use crate::services::referrals::{CheckoutOwner, FirstOrder};
use crate::services::{funnel, referrals};
use crate::state::AppState;

/// What the success page shows.
#[derive(Debug, Serialize)]
pub struct SubscriptionResult {
    #[serde(flatten)]
    pub outcome: SubscriptionOutcome,
    pub plan: Option<PlanId>,
    pub from_onboarding: bool,
    /// Set when this visitor's confirmed checkout signed them in.
    pub member: Option<CurrentMember>,
}

/// Verify the checkout session named in the redirect.
///
/// A confirmed or assumed success from the wizard discards the draft. A
/// confirmed success with a customer email records the member's first order.
/// The member is signed in only when this session captured that same email
/// and the checkout session has not signed anyone in before; the referral
/// code captured with the lead is claimed at the same point. Failing to
/// record the member is logged but does not fail the page: the payment went
/// through.
#[instrument(skip(state, session, params))]
pub async fn success(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<CallbackParams>,
) -> Result<Json<SubscriptionResult>> {
    let callback =
        CheckoutCallback::parse(&params).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let verification = state.stripe().verify_session(&callback.session_id).await;
    if let Err(e) = &verification {
        tracing::warn!(error = %e, "Checkout verification failed; assuming success");
    }
    let outcome = resolve_verification(verification);

    if outcome.is_success() && callback.from_onboarding {
        funnel::discard_onboarding(&session).await?;
    }

    let mut member = None;
    if let SubscriptionOutcome::Confirmed { email: Some(email) } = &outcome {
        let lead = funnel::captured_lead(&session).await?;
        let owned = funnel::owns_checkout(lead.as_ref(), email);
        let referral = if owned {
            funnel::referral_code(&session).await?
        } else {
            tracing::warn!("Confirmed checkout does not match this visitor's lead");
            None
        };
        let owner = owned.then(|| CheckoutOwner {
            session_id: &callback.session_id,
            referral: referral.as_ref(),
        });

        match referrals::complete_first_order(state.pool(), email, owner).await {
            Ok(FirstOrder {
                profile,
                redeemed: true,
            }) => {
                funnel::clear_referral_code(&session).await?;
                let current = CurrentMember {
                    id: profile.id,
                    email: profile.email,
                };
                set_current_member(&session, &current).await?;
                set_sentry_user(&current.id, Some(current.email.as_str()));
                member = Some(current);
            }
            Ok(FirstOrder { profile, .. }) => {
                if owned {
                    tracing::warn!(member = %profile.id, "Checkout session already redeemed");
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to record member after checkout");
            }
        }
    }

    add_breadcrumb(
        "checkout",
        "Checkout returned",
        Some(&[("success", if outcome.is_success() { "true" } else { "false" })]),
    );

    Ok(Json(SubscriptionResult {
        outcome,
        plan: callback.plan,
        from_onboarding: callback.from_onboarding,
        member,
    }))
}
