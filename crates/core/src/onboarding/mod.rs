//! Three-step onboarding wizard: plan → delivery → payment.
//!
//! [`OnboardingSession`] owns the draft for one customer. The caller keeps it
//! wherever it keeps per-visitor state and passes it back in on every request;
//! there is no process-wide draft.
//!
//! ```
//! use secret_menu_core::capture::capture;
//! use secret_menu_core::catalog::Catalog;
//! use secret_menu_core::onboarding::{DeliveryUpdate, OnboardingSession, OnboardingStep};
//!
//! let catalog = Catalog::standard();
//! let lead = capture("diner@example.com", "94110").unwrap().lead().clone();
//! let mut session = OnboardingSession::start(Some(lead), &catalog).unwrap();
//!
//! session.select_plan(&catalog, 10).unwrap();
//! session.next().unwrap();
//!
//! // Delivery fields are required before payment.
//! assert!(session.next().is_err());
//! assert_eq!(session.step(), OnboardingStep::DeliveryInfo);
//! ```

mod draft;

use serde::{Deserialize, Serialize};

use crate::capture::CapturedLead;
use crate::catalog::{Catalog, CatalogError, PlanId};
use crate::checkout::{
    CheckoutGateway, CheckoutRedirect, CheckoutRequest, CheckoutUrls, GatewayError, PriceMap,
    idempotency_key,
};
use crate::pricing::{PriceBreakdown, quote};

pub use draft::{
    CaloriePreference, DEFAULT_CITY, DEFAULT_STATE, DeliveryDetails, DeliveryUpdate,
    OnboardingDraft, PreferencesUpdate,
};

/// Wizard steps, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStep {
    PlanSelection,
    DeliveryInfo,
    Payment,
}

impl OnboardingStep {
    /// 1-based position, for "step 2 of 3" displays.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::PlanSelection => 1,
            Self::DeliveryInfo => 2,
            Self::Payment => 3,
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::PlanSelection => "Choose Your Plan",
            Self::DeliveryInfo => "Delivery Details",
            Self::Payment => "Payment",
        }
    }

    const fn next(self) -> Option<Self> {
        match self {
            Self::PlanSelection => Some(Self::DeliveryInfo),
            Self::DeliveryInfo => Some(Self::Payment),
            Self::Payment => None,
        }
    }

    const fn previous(self) -> Self {
        match self {
            Self::PlanSelection | Self::DeliveryInfo => Self::PlanSelection,
            Self::Payment => Self::DeliveryInfo,
        }
    }
}

/// Required delivery fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryField {
    FullName,
    StreetAddress,
    City,
    State,
    Phone,
}

impl DeliveryField {
    pub const REQUIRED: [Self; 5] = [
        Self::FullName,
        Self::StreetAddress,
        Self::City,
        Self::State,
        Self::Phone,
    ];

    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::FullName => "Name is required",
            Self::StreetAddress => "Address is required",
            Self::City => "City is required",
            Self::State => "State is required",
            Self::Phone => "Phone is required",
        }
    }

    fn value(self, details: &DeliveryDetails) -> &str {
        match self {
            Self::FullName => &details.full_name,
            Self::StreetAddress => &details.street_address,
            Self::City => &details.city,
            Self::State => &details.state,
            Self::Phone => &details.phone,
        }
    }
}

/// One inline validation message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: DeliveryField,
    pub message: String,
}

/// Every required delivery field that is blank, in form order.
#[must_use]
pub fn validate_delivery(details: &DeliveryDetails) -> Vec<FieldError> {
    DeliveryField::REQUIRED
        .into_iter()
        .filter(|f| f.value(details).trim().is_empty())
        .map(|field| FieldError {
            field,
            message: field.message().to_owned(),
        })
        .collect()
}

/// A step change or edit the wizard refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    /// No email + zip was captured; restart the funnel.
    #[error("onboarding has not been started")]
    NotStarted,
    #[error("delivery details are incomplete")]
    Validation(Vec<FieldError>),
    #[error("that change is not allowed during {actual:?}")]
    WrongStep {
        expected: OnboardingStep,
        actual: OnboardingStep,
    },
    /// `next()` from payment; the last step only completes through checkout.
    #[error("payment is completed through checkout")]
    CheckoutRequired,
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Checkout could not be started.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaymentError {
    #[error("checkout is only available at the payment step")]
    NotAtPayment(OnboardingStep),
    /// No external price is configured for the plan.
    #[error("Invalid plan configuration")]
    Configuration(PlanId),
    /// The draft could not be encoded for the idempotency key.
    #[error("could not encode checkout draft: {0}")]
    Encoding(String),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl PaymentError {
    /// Message kept on the session and shown next to the pay button.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Gateway(err) => err.user_message().to_owned(),
            Self::Encoding(_) => "Something went wrong. Please try again.".to_owned(),
            other => other.to_string(),
        }
    }
}

/// One customer's pass through the wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnboardingSession {
    step: OnboardingStep,
    draft: OnboardingDraft,
    /// Message from the last failed checkout attempt.
    last_error: Option<String>,
    /// Failed checkout attempts; part of the idempotency key so a manual
    /// retry reaches the processor instead of replaying the failure.
    checkout_attempts: u32,
}

impl OnboardingSession {
    /// Start at plan selection with a default draft.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::NotStarted`] when nothing was captured.
    pub fn start(
        capture: Option<CapturedLead>,
        catalog: &Catalog,
    ) -> Result<Self, TransitionError> {
        let lead = capture.ok_or(TransitionError::NotStarted)?;
        Ok(Self {
            step: OnboardingStep::PlanSelection,
            draft: OnboardingDraft::new(lead, catalog),
            last_error: None,
            checkout_attempts: 0,
        })
    }

    #[must_use]
    pub const fn step(&self) -> OnboardingStep {
        self.step
    }

    #[must_use]
    pub const fn draft(&self) -> &OnboardingDraft {
        &self.draft
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Current price breakdown for the draft.
    #[must_use]
    pub fn summary(&self, catalog: &Catalog) -> PriceBreakdown {
        quote(catalog, self.draft.meal_count, self.draft.plan)
    }

    fn require(&self, expected: OnboardingStep) -> Result<(), TransitionError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(TransitionError::WrongStep {
                expected,
                actual: self.step,
            })
        }
    }

    /// Choose the plan size; the plan follows the tier.
    ///
    /// # Errors
    ///
    /// Fails outside plan selection, or when no tier offers `meal_count`.
    pub fn select_plan(&mut self, catalog: &Catalog, meal_count: u32) -> Result<(), TransitionError> {
        self.require(OnboardingStep::PlanSelection)?;
        let tier = catalog.tier_for_meals(meal_count)?;
        self.draft.meal_count = tier.meal_count;
        self.draft.plan = tier.plan;
        Ok(())
    }

    /// Edit delivery fields. Nothing is validated until [`Self::next`].
    ///
    /// # Errors
    ///
    /// Fails outside the delivery step.
    pub fn update_delivery(&mut self, update: DeliveryUpdate) -> Result<(), TransitionError> {
        self.require(OnboardingStep::DeliveryInfo)?;
        self.draft.delivery.apply(update);
        Ok(())
    }

    /// Edit dietary preferences. Allowed at every step.
    pub fn update_preferences(&mut self, update: PreferencesUpdate) {
        self.draft.apply_preferences(update);
    }

    /// Advance one step.
    ///
    /// # Errors
    ///
    /// Leaving delivery with blank required fields returns one
    /// [`FieldError`] per field and keeps the session (and every entered
    /// value) where it was. From payment, returns
    /// [`TransitionError::CheckoutRequired`].
    pub fn next(&mut self) -> Result<OnboardingStep, TransitionError> {
        let target = self.step.next().ok_or(TransitionError::CheckoutRequired)?;

        if self.step == OnboardingStep::DeliveryInfo {
            let errors = validate_delivery(&self.draft.delivery);
            if !errors.is_empty() {
                return Err(TransitionError::Validation(errors));
            }
        }

        self.step = target;
        Ok(self.step)
    }

    /// Go back one step. A no-op on the first step.
    pub fn back(&mut self) -> OnboardingStep {
        self.step = self.step.previous();
        self.last_error = None;
        self.step
    }

    /// Build the processor request for the current draft.
    ///
    /// # Errors
    ///
    /// Fails outside payment, or when the plan has no configured price.
    pub fn checkout_request(
        &self,
        prices: &PriceMap,
        urls: &CheckoutUrls,
    ) -> Result<CheckoutRequest, PaymentError> {
        if self.step != OnboardingStep::Payment {
            return Err(PaymentError::NotAtPayment(self.step));
        }
        let plan = self.draft.plan;
        let price_id = prices
            .price_id(plan)
            .ok_or(PaymentError::Configuration(plan))?;

        let mut payload =
            serde_json::to_vec(&self.draft).map_err(|e| PaymentError::Encoding(e.to_string()))?;
        payload.extend_from_slice(&self.checkout_attempts.to_be_bytes());

        Ok(CheckoutRequest {
            plan,
            price_id: price_id.to_owned(),
            customer_email: self.draft.email.clone(),
            quantity: 1,
            success_url: urls.success_url(plan),
            cancel_url: urls.cancel_url(),
            idempotency_key: idempotency_key(&payload),
        })
    }

    /// Hand the draft to the processor.
    ///
    /// Success does not finish onboarding: the processor reports the result
    /// later through the success redirect. On failure the session stays at
    /// payment with the message recorded; nothing is retried automatically.
    ///
    /// # Errors
    ///
    /// See [`PaymentError`].
    pub async fn submit_payment<G: CheckoutGateway>(
        &mut self,
        gateway: &G,
        prices: &PriceMap,
        urls: &CheckoutUrls,
    ) -> Result<CheckoutRedirect, PaymentError> {
        let result = match self.checkout_request(prices, urls) {
            Ok(request) => gateway
                .create_checkout(&request)
                .await
                .map_err(PaymentError::from),
            Err(err) => Err(err),
        };

        match &result {
            Ok(_) => self.last_error = None,
            Err(PaymentError::NotAtPayment(_)) => {}
            Err(err) => {
                self.last_error = Some(err.user_message());
                self.checkout_attempts = self.checkout_attempts.saturating_add(1);
            }
        }
        result
    }
}
