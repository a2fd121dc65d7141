//! Member extractors.
//!
//! A member is signed into the session after their first confirmed checkout.
//! The referral endpoints require one.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::CurrentMember;
use crate::models::session::keys;

/// Extractor that requires a signed-in member; rejects with 401 otherwise.
///
/// # Example
///
/// ```rust,ignore
/// async fn stats(RequireMember(member): RequireMember) -> impl IntoResponse {
///     format!("Hello, {}!", member.email)
/// }
/// ```
pub struct RequireMember(pub CurrentMember);

impl<S> FromRequestParts<S> for RequireMember
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by SessionManagerLayer
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or_else(|| AppError::Internal("session layer missing".to_owned()))?;

        let member: CurrentMember = session
            .get(keys::CURRENT_MEMBER)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Please sign in to continue.".to_owned()))?;

        Ok(Self(member))
    }
}

/// Sign `member` into the session.
///
/// The session ID is cycled first so a pre-checkout cookie cannot be reused
/// to act as the member.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_member(
    session: &Session,
    member: &CurrentMember,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(keys::CURRENT_MEMBER, member).await
}
