//! Member profile commands.
//!
//! Profiles are normally created when a checkout is confirmed. This lets an
//! operator create one ahead of time, e.g. to hand a referral code to a
//! launch partner.

use secret_menu_core::Email;
use secret_menu_storefront::db::{ProfileRepository, RepositoryError, create_pool};
use thiserror::Error;

/// Errors from the profile commands.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Missing environment variable: STOREFRONT_DATABASE_URL")]
    MissingDatabaseUrl,

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Database connection error: {0}")]
    Connection(#[from] sqlx::Error),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Create or update a profile and log its referral code.
///
/// Running it twice for the same email keeps the original referral code.
///
/// # Errors
///
/// Returns an error if the email is invalid, the database URL is missing, or
/// the write fails.
pub async fn create(email: &str, name: Option<&str>) -> Result<(), ProfileError> {
    let email = Email::parse(email).map_err(|e| ProfileError::InvalidEmail(e.to_string()))?;
    let name = name.map(str::trim).filter(|n| !n.is_empty());

    let url = super::database_url().ok_or(ProfileError::MissingDatabaseUrl)?;
    let pool = create_pool(&url).await?;

    let profile = ProfileRepository::new(&pool)
        .upsert_by_email(&email, name)
        .await?;

    tracing::info!(
        id = %profile.id,
        email = %email.masked(),
        code = %profile.referral_code,
        invites = profile.invites_remaining,
        "Profile ready"
    );
    Ok(())
}
