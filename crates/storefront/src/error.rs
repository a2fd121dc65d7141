//! Unified error handling with Sentry integration.
//!
//! Every route handler returns `Result<T, AppError>`. Server-side failures are
//! captured to Sentry before responding; their details never reach the client.
//! Bodies are JSON: `{"error": "...", "fields": [...], "restart": "/"}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use secret_menu_core::capture::CaptureError;
use secret_menu_core::catalog::CatalogError;
use secret_menu_core::checkout::GatewayError;
use secret_menu_core::onboarding::{PaymentError, TransitionError};
use secret_menu_core::referral::ReferralError;

use crate::db::RepositoryError;

/// Generic message for configuration problems; details go to logs only.
const CONFIGURATION_ERROR: &str = "configuration error";

/// One invalid form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub field: String,
    pub message: String,
}

impl FieldIssue {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// One or more fields are missing or malformed.
    #[error("Validation failed")]
    Validation(Vec<FieldIssue>),

    /// Operator has to fix something (unknown plan, missing price mapping).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The processor declined or could not be reached; carries the message
    /// from [`GatewayError::user_message`](secret_menu_core::checkout::GatewayError::user_message).
    #[error("Payment error: {0}")]
    Payment(String),

    /// Referral stats could not be loaded.
    #[error("Referral stats unavailable")]
    ReferralUnavailable,

    /// No email + zip captured; the funnel must restart.
    #[error("Onboarding not started")]
    OnboardingNotStarted,

    /// The request does not fit the current state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller is not signed in.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<FieldIssue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    restart: Option<&'static str>,
}

impl AppError {
    /// Single-field validation error.
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldIssue::new(field, message)])
    }

    const fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Session(_) | Self::Internal(_) | Self::Configuration(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Payment(_) => StatusCode::BAD_GATEWAY,
            Self::ReferralUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::OnboardingNotStarted | Self::Conflict(_) => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Database(_) | Self::Session(_) | Self::Internal(_) | Self::Configuration(_)
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else if matches!(self, Self::Payment(_) | Self::ReferralUnavailable) {
            tracing::warn!(error = %self, "External call failed");
        }

        let status = self.status();

        // Don't expose internal error details to clients
        let (error, fields, restart) = match self {
            Self::Database(_) | Self::Session(_) | Self::Internal(_) => {
                ("Internal server error".to_string(), Vec::new(), None)
            }
            Self::Configuration(_) => (CONFIGURATION_ERROR.to_string(), Vec::new(), None),
            Self::Validation(fields) => ("Please fix the highlighted fields".to_string(), fields, None),
            Self::Payment(message) => (message, Vec::new(), None),
            Self::ReferralUnavailable => (
                "Referral stats are unavailable right now. Please try again.".to_string(),
                Vec::new(),
                None,
            ),
            Self::OnboardingNotStarted => (
                "Please enter your email and ZIP code to get started.".to_string(),
                Vec::new(),
                Some("/"),
            ),
            Self::Conflict(message)
            | Self::NotFound(message)
            | Self::Unauthorized(message)
            | Self::BadRequest(message) => (message, Vec::new(), None),
        };

        (
            status,
            Json(ErrorBody {
                error,
                fields,
                restart,
            }),
        )
            .into_response()
    }
}

impl From<CaptureError> for AppError {
    fn from(err: CaptureError) -> Self {
        Self::field(err.field(), err.to_string())
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::UnknownMealCount(_) => Self::field("meal_count", err.to_string()),
            CatalogError::UnknownPlan(_) | CatalogError::UnknownTier(_) => {
                Self::Configuration(err.to_string())
            }
        }
    }
}

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::NotStarted => Self::OnboardingNotStarted,
            TransitionError::Validation(errors) => Self::Validation(
                errors
                    .into_iter()
                    .map(|e| {
                        let field = serde_json::to_value(e.field)
                            .ok()
                            .and_then(|v| v.as_str().map(str::to_owned))
                            .unwrap_or_default();
                        FieldIssue::new(field, e.message)
                    })
                    .collect(),
            ),
            TransitionError::Catalog(err) => err.into(),
            TransitionError::WrongStep { .. } | TransitionError::CheckoutRequired => {
                Self::Conflict(err.to_string())
            }
        }
    }
}

impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::NotAtPayment(_) => Self::Conflict(err.to_string()),
            PaymentError::Configuration(plan) => {
                Self::Configuration(format!("no Stripe price configured for plan {plan}"))
            }
            PaymentError::Encoding(detail) => Self::Internal(detail),
            PaymentError::Gateway(GatewayError::Misconfigured(detail)) => {
                Self::Configuration(detail)
            }
            PaymentError::Gateway(_) => Self::Payment(err.user_message()),
        }
    }
}

impl From<ReferralError> for AppError {
    fn from(err: ReferralError) -> Self {
        match err {
            ReferralError::Unavailable => Self::ReferralUnavailable,
            ReferralError::InvalidCode
            | ReferralError::NoInvitesRemaining
            | ReferralError::SelfReferral => Self::field("code", err.to_string()),
            ReferralError::AlreadyReferred => Self::Conflict(err.to_string()),
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for a signed-in member.
pub fn set_sentry_user(member_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(member_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Add a breadcrumb for funnel actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("onboarding", "Advanced step", Some(&[("step", "payment")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
