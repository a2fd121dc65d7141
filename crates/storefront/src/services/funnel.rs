//! Session-held funnel state.
//!
//! The captured lead and the onboarding wizard live in the visitor's session
//! so a full reload (including the round trip through Stripe) resumes the
//! wizard where it was.

use tower_sessions::Session;

use secret_menu_core::capture::CapturedLead;
use secret_menu_core::onboarding::OnboardingSession;
use secret_menu_core::referral::ReferralCode;
use secret_menu_core::{Catalog, Email};

use crate::error::AppError;
use crate::models::session::keys;

type SessionResult<T> = Result<T, tower_sessions::session::Error>;

/// The lead captured on the landing page, if any.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn captured_lead(session: &Session) -> SessionResult<Option<CapturedLead>> {
    session.get(keys::CAPTURED_LEAD).await
}

/// Store a fresh capture with the referral code it came with. Any wizard in
/// progress is discarded so the new email and zip take effect, and a code
/// from an earlier capture is dropped.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn store_lead(
    session: &Session,
    lead: &CapturedLead,
    referral: Option<&ReferralCode>,
) -> SessionResult<()> {
    session.insert(keys::CAPTURED_LEAD, lead).await?;
    match referral {
        Some(code) => session.insert(keys::REFERRAL_CODE, code).await?,
        None => clear_referral_code(session).await?,
    }
    discard_onboarding(session).await
}

/// The referral code captured with the lead, if any.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn referral_code(session: &Session) -> SessionResult<Option<ReferralCode>> {
    session.get(keys::REFERRAL_CODE).await
}

/// Forget the captured referral code once it has been used.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn clear_referral_code(session: &Session) -> SessionResult<()> {
    session.remove::<ReferralCode>(keys::REFERRAL_CODE).await?;
    Ok(())
}

/// Whether the visitor holding `lead` is the customer `email` Stripe
/// confirmed. A session id alone proves nothing: it appears in the redirect
/// URL and can be replayed from any browser.
#[must_use]
pub fn owns_checkout(lead: Option<&CapturedLead>, email: &Email) -> bool {
    lead.is_some_and(|lead| lead.email == *email)
}

/// The wizard in progress, started from the captured lead on first use.
///
/// # Errors
///
/// Returns [`AppError::OnboardingNotStarted`] when nothing was captured.
pub async fn load_onboarding(
    session: &Session,
    catalog: &Catalog,
) -> Result<OnboardingSession, AppError> {
    if let Some(onboarding) = session.get::<OnboardingSession>(keys::ONBOARDING).await? {
        return Ok(onboarding);
    }

    let onboarding = OnboardingSession::start(captured_lead(session).await?, catalog)?;
    save_onboarding(session, &onboarding).await?;
    Ok(onboarding)
}

/// Persist the wizard after a change.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn save_onboarding(session: &Session, onboarding: &OnboardingSession) -> SessionResult<()> {
    session.insert(keys::ONBOARDING, onboarding).await
}

/// Drop the wizard (after a successful checkout or a new capture).
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn discard_onboarding(session: &Session) -> SessionResult<()> {
    session.remove::<OnboardingSession>(keys::ONBOARDING).await?;
    Ok(())
}
