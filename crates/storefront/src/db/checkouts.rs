//! Checkout redemption repository.

use sqlx::PgPool;
use secret_menu_core::ProfileId;

use super::RepositoryError;

/// Repository for confirmed checkout sessions that signed a visitor in.
pub struct CheckoutRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CheckoutRepository<'a> {
    /// Create a new checkout repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Mark `session_id` as used by `profile`.
    ///
    /// Returns `false` when the session was redeemed before, by anyone.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn redeem(&self, session_id: &str, profile: ProfileId) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            INSERT INTO storefront.checkout_redemption (session_id, profile_id)
            VALUES ($1, $2)
            ON CONFLICT (session_id) DO NOTHING
            ",
        )
        .bind(session_id)
        .bind(profile.as_uuid())
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
