//! Lead capture and the onboarding wizard.
//!
//! Every handler loads the wizard from the session, applies one change and
//! writes it back, so the session is the only owner of the draft.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use secret_menu_core::Catalog;
use secret_menu_core::capture::{CaptureOutcome, capture as validate_capture};
use secret_menu_core::checkout::CheckoutRedirect;
use secret_menu_core::onboarding::{
    DeliveryUpdate, OnboardingDraft, OnboardingSession, OnboardingStep, PreferencesUpdate,
};
use secret_menu_core::PriceBreakdown;
use secret_menu_core::referral::ReferralCode;

use crate::db::WaitlistRepository;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::services::funnel;
use crate::state::AppState;

/// Landing-page capture form.
#[derive(Debug, Deserialize)]
pub struct CaptureForm {
    pub email: String,
    pub zip: String,
    /// Code from a member's invite link; claimed at the first checkout.
    #[serde(default)]
    pub referral_code: Option<String>,
}

/// Where the visitor goes after capture.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct CaptureResponse {
    /// `onboard` or `waitlist`.
    pub outcome: &'static str,
    pub redirect: &'static str,
}

/// Validate email + zip and route the visitor.
///
/// Inside the service area the lead and its referral code are kept in the
/// session and the wizard starts; outside it the lead joins the waitlist.
#[instrument(skip(state, session, form))]
pub async fn capture(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<CaptureForm>,
) -> Result<Json<CaptureResponse>> {
    let outcome = validate_capture(&form.email, &form.zip)?;
    let referral = form
        .referral_code
        .as_deref()
        .filter(|raw| !raw.trim().is_empty())
        .map(ReferralCode::parse)
        .transpose()
        .map_err(|e| AppError::field("referral_code", e.to_string()))?;

    let response = match outcome {
        CaptureOutcome::Onboard(lead) => {
            funnel::store_lead(&session, &lead, referral.as_ref()).await?;
            add_breadcrumb("onboarding", "Lead captured", Some(&[("zip", lead.zip.as_str())]));
            CaptureResponse {
                outcome: "onboard",
                redirect: "/onboarding",
            }
        }
        CaptureOutcome::Waitlist(lead) => {
            let added = WaitlistRepository::new(state.pool()).add(&lead).await?;
            tracing::info!(zip = %lead.zip.as_str(), added, "Lead joined waitlist");
            CaptureResponse {
                outcome: "waitlist",
                redirect: "/waitlist",
            }
        }
    };

    Ok(Json(response))
}

/// The wizard as the client renders it.
#[derive(Debug, Serialize)]
pub struct OnboardingView {
    pub step: OnboardingStep,
    pub step_number: u8,
    pub step_title: &'static str,
    pub draft: OnboardingDraft,
    pub summary: PriceBreakdown,
    /// Message from the last failed checkout attempt.
    pub last_error: Option<String>,
}

impl OnboardingView {
    fn new(onboarding: &OnboardingSession, catalog: &Catalog) -> Self {
        let step = onboarding.step();
        Self {
            step,
            step_number: step.number(),
            step_title: step.title(),
            draft: onboarding.draft().clone(),
            summary: onboarding.summary(catalog),
            last_error: onboarding.last_error().map(str::to_owned),
        }
    }
}

/// Load, change, save, render.
async fn update<F>(state: &AppState, session: &Session, change: F) -> Result<Json<OnboardingView>>
where
    F: FnOnce(&mut OnboardingSession, &Catalog) -> Result<()>,
{
    let catalog = state.catalog();
    let mut onboarding = funnel::load_onboarding(session, catalog).await?;
    change(&mut onboarding, catalog)?;
    funnel::save_onboarding(session, &onboarding).await?;
    Ok(Json(OnboardingView::new(&onboarding, catalog)))
}

/// Current step, draft and price summary.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Json<OnboardingView>> {
    let onboarding = funnel::load_onboarding(&session, state.catalog()).await?;
    Ok(Json(OnboardingView::new(&onboarding, state.catalog())))
}

/// Body for [`select_plan`].
#[derive(Debug, Deserialize)]
pub struct PlanSelection {
    pub meal_count: u32,
}

/// Choose the plan size (plan selection step only).
#[instrument(skip(state, session), fields(meal_count = body.meal_count))]
pub async fn select_plan(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<PlanSelection>,
) -> Result<Json<OnboardingView>> {
    update(&state, &session, |onboarding, catalog| {
        onboarding.select_plan(catalog, body.meal_count)?;
        Ok(())
    })
    .await
}

/// Update dietary preferences (any step).
#[instrument(skip(state, session, body))]
pub async fn preferences(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<PreferencesUpdate>,
) -> Result<Json<OnboardingView>> {
    update(&state, &session, |onboarding, _| {
        onboarding.update_preferences(body);
        Ok(())
    })
    .await
}

/// Update delivery fields (delivery step only).
#[instrument(skip(state, session, body))]
pub async fn delivery(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<DeliveryUpdate>,
) -> Result<Json<OnboardingView>> {
    update(&state, &session, |onboarding, _| {
        onboarding.update_delivery(body)?;
        Ok(())
    })
    .await
}

/// Advance one step. Leaving delivery validates the required fields.
#[instrument(skip(state, session))]
pub async fn next(State(state): State<AppState>, session: Session) -> Result<Json<OnboardingView>> {
    update(&state, &session, |onboarding, _| {
        let step = onboarding.next()?;
        add_breadcrumb("onboarding", "Advanced step", Some(&[("step", step.title())]));
        Ok(())
    })
    .await
}

/// Go back one step.
#[instrument(skip(state, session))]
pub async fn back(State(state): State<AppState>, session: Session) -> Result<Json<OnboardingView>> {
    update(&state, &session, |onboarding, _| {
        let step = onboarding.back();
        add_breadcrumb("onboarding", "Went back", Some(&[("step", step.title())]));
        Ok(())
    })
    .await
}

/// Hand the draft to Stripe and return the hosted checkout URL.
///
/// A failure keeps the wizard at payment with the message recorded; the
/// visitor retries by submitting again.
#[instrument(skip(state, session))]
pub async fn checkout(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<CheckoutRedirect>> {
    let mut onboarding = funnel::load_onboarding(&session, state.catalog()).await?;
    let plan = onboarding.draft().plan;

    let result = onboarding
        .submit_payment(
            state.stripe(),
            &state.config().stripe.prices,
            state.checkout_urls(),
        )
        .await;

    // Recorded error and attempt count must survive a reload.
    funnel::save_onboarding(&session, &onboarding).await?;

    let redirect = result?;
    add_breadcrumb(
        "checkout",
        "Checkout session created",
        Some(&[("plan", plan.as_str()), ("session_id", redirect.session_id.as_str())]),
    );
    tracing::info!(plan = %plan, "Checkout session created");
    Ok(Json(redirect))
}
