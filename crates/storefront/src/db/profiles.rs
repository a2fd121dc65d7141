//! Profile repository.

use chrono::{DateTime, Utc};
use rand::seq::IndexedRandom;
use sqlx::PgPool;
use uuid::Uuid;

use secret_menu_core::referral::ReferralCode;
use secret_menu_core::{Email, ProfileId};

use super::RepositoryError;
use crate::models::Profile;

/// Unambiguous characters for generated codes (no 0/O, 1/I/L).
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";
const CODE_LENGTH: usize = 8;
/// Attempts before giving up on finding an unused code.
const CODE_ATTEMPTS: usize = 5;

const PROFILE_COLUMNS: &str = "id, email, name, referral_code, invites_remaining, created_at";

#[derive(sqlx::FromRow)]
struct ProfileRow {
    id: Uuid,
    email: String,
    name: Option<String>,
    referral_code: String,
    invites_remaining: i32,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = RepositoryError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let referral_code = ReferralCode::parse(&row.referral_code).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid referral code in database: {e}"))
        })?;
        let invites_remaining = u32::try_from(row.invites_remaining).map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "negative invites_remaining for profile {}",
                row.id
            ))
        })?;

        Ok(Self {
            id: ProfileId::new(row.id),
            email,
            name: row.name,
            referral_code,
            invites_remaining,
            created_at: row.created_at,
        })
    }
}

/// Random referral code drawn from [`CODE_ALPHABET`].
#[must_use]
pub fn generate_referral_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LENGTH)
        .filter_map(|_| CODE_ALPHABET.choose(&mut rng).map(|&b| char::from(b)))
        .collect()
}

/// Repository for member profiles.
pub struct ProfileRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProfileRepository<'a> {
    /// Create a new profile repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a profile by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProfileId) -> Result<Option<Profile>, RepositoryError> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM storefront.profile WHERE id = $1");
        sqlx::query_as::<_, ProfileRow>(&sql)
            .bind(id.as_uuid())
            .fetch_optional(self.pool)
            .await?
            .map(Profile::try_from)
            .transpose()
    }

    /// Get the profile that owns `code`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_code(&self, code: &ReferralCode) -> Result<Option<Profile>, RepositoryError> {
        let sql =
            format!("SELECT {PROFILE_COLUMNS} FROM storefront.profile WHERE referral_code = $1");
        sqlx::query_as::<_, ProfileRow>(&sql)
            .bind(code.as_str())
            .fetch_optional(self.pool)
            .await?
            .map(Profile::try_from)
            .transpose()
    }

    /// Return the profile for `email`, creating it with a fresh referral code
    /// and a full invite quota if it does not exist.
    ///
    /// An existing profile keeps its code and counter; a missing name is
    /// filled in from `name`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if no unused referral code was
    /// found, `RepositoryError::Database` for other failures.
    pub async fn upsert_by_email(
        &self,
        email: &Email,
        name: Option<&str>,
    ) -> Result<Profile, RepositoryError> {
        let sql = format!(
            "INSERT INTO storefront.profile (id, email, name, referral_code)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (email) DO UPDATE
                SET name = COALESCE(storefront.profile.name, EXCLUDED.name),
                    updated_at = now()
             RETURNING {PROFILE_COLUMNS}"
        );

        let mut last_err = RepositoryError::Conflict("referral code".to_owned());
        for _ in 0..CODE_ATTEMPTS {
            let code = generate_referral_code();
            let result = sqlx::query_as::<_, ProfileRow>(&sql)
                .bind(Uuid::new_v4())
                .bind(email.as_str())
                .bind(name)
                .bind(&code)
                .fetch_one(self.pool)
                .await;

            match result {
                Ok(row) => return Profile::try_from(row),
                Err(e) => match RepositoryError::from_insert(e, "referral code") {
                    conflict @ RepositoryError::Conflict(_) => {
                        tracing::debug!("Referral code collision, retrying");
                        last_err = conflict;
                    }
                    other => return Err(other),
                },
            }
        }
        Err(last_err)
    }
}
