//! Hosted-checkout hand-off.
//!
//! The payment processor is an opaque collaborator behind [`CheckoutGateway`]:
//! we hand it a [`CheckoutRequest`], it answers with a redirect, and later the
//! customer comes back through the success URL carrying a session id that we
//! verify with [`CheckoutGateway::verify_session`].

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::future::Future;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::catalog::PlanId;
use crate::types::Email;

/// Placeholder the processor substitutes with the real session id.
pub const SESSION_ID_PLACEHOLDER: &str = "{CHECKOUT_SESSION_ID}";

/// Plan → external price identifier.
///
/// A missing entry is only an error when someone tries to check out with
/// that plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriceMap(BTreeMap<PlanId, String>);

impl PriceMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the price id for `plan`. Blank ids are ignored.
    #[must_use]
    pub fn with(mut self, plan: PlanId, price_id: impl Into<String>) -> Self {
        let price_id = price_id.into();
        if !price_id.trim().is_empty() {
            self.0.insert(plan, price_id.trim().to_owned());
        }
        self
    }

    #[must_use]
    pub fn price_id(&self, plan: PlanId) -> Option<&str> {
        self.0.get(&plan).map(String::as_str)
    }

    /// Plans without a configured price.
    pub fn missing(&self) -> impl Iterator<Item = PlanId> + '_ {
        PlanId::ALL.into_iter().filter(|p| !self.0.contains_key(p))
    }
}

/// Where the processor sends the customer afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutUrls {
    base_url: String,
}

impl CheckoutUrls {
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    #[must_use]
    pub fn success_url(&self, plan: PlanId) -> String {
        format!(
            "{}/subscription/success?session_id={SESSION_ID_PLACEHOLDER}&plan={plan}&onboarding=true",
            self.base_url
        )
    }

    #[must_use]
    pub fn cancel_url(&self) -> String {
        format!("{}/onboarding", self.base_url)
    }
}

/// Everything the processor needs to open a subscription checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutRequest {
    pub plan: PlanId,
    pub price_id: String,
    pub customer_email: Email,
    pub quantity: u32,
    pub success_url: String,
    pub cancel_url: String,
    /// Same draft + attempt always produces the same key, so a double submit
    /// cannot open two subscriptions.
    pub idempotency_key: String,
}

/// Hex SHA-256 of `payload`.
#[must_use]
pub fn idempotency_key(payload: &[u8]) -> String {
    let digest = Sha256::digest(payload);
    digest.iter().fold(String::with_capacity(64), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

/// The processor accepted the request; send the customer here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRedirect {
    pub session_id: String,
    pub url: String,
}

/// Result of looking up a checkout session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionVerification {
    /// Processor status, e.g. `complete`, `open`, `expired`.
    pub status: String,
    /// Payment status, e.g. `paid`, `unpaid`.
    #[serde(default)]
    pub payment_status: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
}

impl SessionVerification {
    /// `complete` or `paid` on either status field.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        let done = |s: &str| s.eq_ignore_ascii_case("complete") || s.eq_ignore_ascii_case("paid");
        done(&self.status) || self.payment_status.as_deref().is_some_and(done)
    }
}

/// Failure talking to the processor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// The processor refused the request (card declined, invalid price...).
    #[error("{0}")]
    Rejected(String),
    /// The processor refused our credentials or request shape. The detail
    /// is for operators only.
    #[error("payment service misconfigured: {0}")]
    Misconfigured(String),
    /// Transport failure or unexpected response.
    #[error("payment service unavailable: {0}")]
    Unavailable(String),
}

impl GatewayError {
    /// Message safe to show the customer.
    #[must_use]
    pub fn user_message(&self) -> &str {
        match self {
            Self::Rejected(msg) => msg,
            Self::Misconfigured(_) => "configuration error",
            Self::Unavailable(_) => "We couldn't reach the payment service. Please try again.",
        }
    }
}

/// Opaque payment processor.
pub trait CheckoutGateway: Send + Sync {
    /// Open a hosted checkout session.
    fn create_checkout(
        &self,
        request: &CheckoutRequest,
    ) -> impl Future<Output = Result<CheckoutRedirect, GatewayError>> + Send;

    /// Look up a checkout session by id.
    fn verify_session(
        &self,
        session_id: &str,
    ) -> impl Future<Output = Result<SessionVerification, GatewayError>> + Send;
}

/// Query parameters on the success redirect.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub session_id: Option<String>,
    pub plan: Option<String>,
    pub onboarding: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationError {
    #[error("no session ID found")]
    MissingSessionId,
}

/// A parsed success redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutCallback {
    pub session_id: String,
    /// `None` when absent or not a known plan.
    pub plan: Option<PlanId>,
    /// Came from the onboarding wizard rather than a direct purchase.
    pub from_onboarding: bool,
}

impl CheckoutCallback {
    /// # Errors
    ///
    /// Returns [`VerificationError::MissingSessionId`] when `session_id` is
    /// absent or blank.
    pub fn parse(params: &CallbackParams) -> Result<Self, VerificationError> {
        let session_id = params
            .session_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(VerificationError::MissingSessionId)?;

        Ok(Self {
            session_id: session_id.to_owned(),
            plan: params.plan.as_deref().and_then(|p| p.parse().ok()),
            from_onboarding: params.onboarding.as_deref() == Some("true"),
        })
    }
}

/// What the success page should tell the customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubscriptionOutcome {
    /// Processor confirmed payment.
    Confirmed { email: Option<Email> },
    /// Processor answered with a status other than complete/paid.
    NotCompleted { status: String },
    /// Verification itself failed; the redirect is taken as evidence of
    /// success.
    AssumedSuccess,
}

impl SubscriptionOutcome {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        !matches!(self, Self::NotCompleted { .. })
    }
}

/// Apply the lenient verification policy to a lookup result.
#[must_use]
pub fn resolve_verification(
    result: Result<SessionVerification, GatewayError>,
) -> SubscriptionOutcome {
    match result {
        Ok(v) if v.is_complete() => SubscriptionOutcome::Confirmed {
            email: v.customer_email.as_deref().and_then(|e| Email::parse(e).ok()),
        },
        Ok(v) => SubscriptionOutcome::NotCompleted { status: v.status },
        Err(_) => SubscriptionOutcome::AssumedSuccess,
    }
}
