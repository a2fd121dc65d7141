//! Stripe Checkout client.
//!
//! Implements [`CheckoutGateway`] against the Stripe REST API: hosted
//! subscription checkout sessions are created with a form-encoded POST and
//! verified with a GET. Completed verifications are cached for 10 minutes so
//! reloading the success page does not re-query Stripe.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};

use secret_menu_core::checkout::{
    CheckoutGateway, CheckoutRedirect, CheckoutRequest, GatewayError, SessionVerification,
};

use crate::config::StripeConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);
const VERIFICATION_TTL: Duration = Duration::from_secs(600);

/// Errors that can occur when talking to Stripe.
#[derive(Debug, Error)]
pub enum StripeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api {
        status: u16,
        /// Stripe's `error.type` (`card_error`, `invalid_request_error`...).
        kind: Option<String>,
        message: String,
    },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<StripeError> for GatewayError {
    fn from(err: StripeError) -> Self {
        match err {
            // Only card errors are written for the customer.
            StripeError::Api { status, kind, message }
                if status == 402 || kind.as_deref() == Some("card_error") =>
            {
                Self::Rejected(message)
            }
            busy @ StripeError::Api { status: 429, .. } => Self::Unavailable(busy.to_string()),
            // Bad key, missing permission, unknown price: ours to fix.
            api @ StripeError::Api { status, .. } if (400..500).contains(&status) => {
                Self::Misconfigured(api.to_string())
            }
            other => Self::Unavailable(other.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(rename = "type")]
    kind: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CustomerDetails {
    email: Option<String>,
}

/// The fields of a Checkout Session this client reads.
#[derive(Debug, Deserialize)]
struct CheckoutSession {
    id: String,
    url: Option<String>,
    status: Option<String>,
    payment_status: Option<String>,
    customer_email: Option<String>,
    customer_details: Option<CustomerDetails>,
}

impl CheckoutSession {
    fn into_verification(self) -> SessionVerification {
        let customer_email = self
            .customer_details
            .and_then(|d| d.email)
            .or(self.customer_email);
        SessionVerification {
            status: self.status.unwrap_or_default(),
            payment_status: self.payment_status,
            customer_email,
        }
    }
}

/// Client for Stripe Checkout.
#[derive(Clone)]
pub struct StripeClient {
    inner: Arc<StripeClientInner>,
}

struct StripeClientInner {
    client: reqwest::Client,
    api_base: String,
    secret_key: SecretString,
    verifications: Cache<String, SessionVerification>,
}

impl StripeClient {
    /// Create a new Stripe client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &StripeConfig) -> Result<Self, StripeError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let verifications = Cache::builder()
            .max_capacity(1000)
            .time_to_live(VERIFICATION_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(StripeClientInner {
                client,
                api_base: config.api_base.trim_end_matches('/').to_owned(),
                secret_key: config.secret_key.clone(),
                verifications,
            }),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.api_base)
    }

    /// Send a request and decode the JSON body, mapping Stripe error bodies.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, StripeError> {
        let response = request
            .bearer_auth(self.inner.secret_key.expose_secret())
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let (kind, message) = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(e) => (e.error.kind, e.error.message.unwrap_or(body)),
                Err(_) => (None, body),
            };
            return Err(StripeError::Api {
                status: status.as_u16(),
                kind,
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| StripeError::Parse(e.to_string()))
    }

    /// Create a hosted subscription checkout session.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails or the response has no URL.
    #[instrument(skip(self, request), fields(plan = %request.plan))]
    pub async fn create_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutRedirect, StripeError> {
        let form = [
            ("mode", "subscription".to_owned()),
            ("line_items[0][price]", request.price_id.clone()),
            ("line_items[0][quantity]", request.quantity.to_string()),
            ("customer_email", request.customer_email.as_str().to_owned()),
            ("success_url", request.success_url.clone()),
            ("cancel_url", request.cancel_url.clone()),
            ("metadata[plan]", request.plan.as_str().to_owned()),
        ];

        let session: CheckoutSession = self
            .send(
                self.inner
                    .client
                    .post(self.url("/v1/checkout/sessions"))
                    .header("Idempotency-Key", &request.idempotency_key)
                    .form(&form),
            )
            .await?;

        let url = session
            .url
            .ok_or_else(|| StripeError::Parse("checkout session has no url".to_owned()))?;

        debug!(session_id = %session.id, "Created checkout session");
        Ok(CheckoutRedirect {
            session_id: session.id,
            url,
        })
    }

    /// Look up a checkout session.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self), fields(session_id = %session_id))]
    pub async fn retrieve_session(
        &self,
        session_id: &str,
    ) -> Result<SessionVerification, StripeError> {
        if let Some(cached) = self.inner.verifications.get(session_id).await {
            debug!("Cache hit for checkout session");
            return Ok(cached);
        }

        let path = format!(
            "/v1/checkout/sessions/{}",
            urlencoding::encode(session_id)
        );
        let session: CheckoutSession = self.send(self.inner.client.get(self.url(&path))).await?;
        let verification = session.into_verification();

        // Open sessions can still complete; only settled answers are cached.
        if verification.is_complete() {
            self.inner
                .verifications
                .insert(session_id.to_owned(), verification.clone())
                .await;
        }

        Ok(verification)
    }
}

impl CheckoutGateway for StripeClient {
    async fn create_checkout(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutRedirect, GatewayError> {
        Ok(self.create_session(request).await?)
    }

    async fn verify_session(&self, session_id: &str) -> Result<SessionVerification, GatewayError> {
        Ok(self.retrieve_session(session_id).await?)
    }
}
