//! Waitlist repository.

use sqlx::PgPool;
use secret_menu_core::LeadId;
use secret_menu_core::capture::CapturedLead;

use super::RepositoryError;

/// Repository for leads outside the delivery area.
pub struct WaitlistRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WaitlistRepository<'a> {
    /// Create a new waitlist repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record a lead. Capturing the same email + zip twice is a no-op.
    ///
    /// Returns whether a new row was written.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn add(&self, lead: &CapturedLead) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            INSERT INTO storefront.waitlist_lead (id, email, zip)
            VALUES ($1, $2, $3)
            ON CONFLICT (email, zip) DO NOTHING
            ",
        )
        .bind(LeadId::generate().as_uuid())
        .bind(lead.email.as_str())
        .bind(lead.zip.as_str())
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
