//! Referral repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use secret_menu_core::referral::{ReferralCode, ReferralRecord, ReferralStatus};
use secret_menu_core::{Email, ProfileId, ReferralId};

use super::RepositoryError;

#[derive(sqlx::FromRow)]
struct ReferralRow {
    id: Uuid,
    status: ReferralStatus,
    created_at: DateTime<Utc>,
    signed_up_at: Option<DateTime<Utc>>,
    first_order_at: Option<DateTime<Utc>>,
    referred_name: Option<String>,
    referred_email: Option<String>,
}

impl TryFrom<ReferralRow> for ReferralRecord {
    type Error = RepositoryError;

    fn try_from(row: ReferralRow) -> Result<Self, Self::Error> {
        let referred_email = row
            .referred_email
            .as_deref()
            .map(Email::parse)
            .transpose()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
            })?;

        Ok(Self {
            id: ReferralId::new(row.id),
            referred_name: row.referred_name,
            referred_email,
            status: row.status,
            referred_at: row.created_at,
            signed_up_at: row.signed_up_at,
            first_order_at: row.first_order_at,
        })
    }
}

/// Result of trying to attach a referral code to a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// Referral recorded and the referrer's invites decremented.
    Claimed,
    /// No profile owns the code.
    UnknownCode,
    NoInvitesRemaining,
    SelfReferral,
    /// The member was already referred by someone.
    AlreadyReferred,
}

/// Repository for referrals.
pub struct ReferralRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReferralRepository<'a> {
    /// Create a new referral repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All referrals made by `referrer`, newest first, with the referred
    /// member's name and email when they have a profile.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_referrer(
        &self,
        referrer: ProfileId,
    ) -> Result<Vec<ReferralRecord>, RepositoryError> {
        let rows = sqlx::query_as::<_, ReferralRow>(
            r"
            SELECT r.id, r.status, r.created_at, r.signed_up_at, r.first_order_at,
                   p.name AS referred_name, p.email AS referred_email
            FROM storefront.referral r
            LEFT JOIN storefront.profile p ON p.id = r.referred_id
            WHERE r.referrer_id = $1
            ORDER BY r.created_at DESC
            ",
        )
        .bind(referrer.as_uuid())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(ReferralRecord::try_from).collect()
    }

    /// Record that `referred` signed up with `code`.
    ///
    /// Runs in one transaction: the referrer row is locked, checked, the
    /// `signed_up` referral inserted and the referrer's invites decremented.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails. Business rule
    /// failures are reported through [`ClaimOutcome`].
    pub async fn process_referral(
        &self,
        referred: ProfileId,
        code: &ReferralCode,
    ) -> Result<ClaimOutcome, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let referrer: Option<(Uuid, i32)> = sqlx::query_as(
            r"
            SELECT id, invites_remaining
            FROM storefront.profile
            WHERE referral_code = $1
            FOR UPDATE
            ",
        )
        .bind(code.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        let Some((referrer_id, invites_remaining)) = referrer else {
            return Ok(ClaimOutcome::UnknownCode);
        };
        if referrer_id == referred.as_uuid() {
            return Ok(ClaimOutcome::SelfReferral);
        }
        if invites_remaining <= 0 {
            return Ok(ClaimOutcome::NoInvitesRemaining);
        }

        let inserted = sqlx::query(
            r"
            INSERT INTO storefront.referral
                (id, referrer_id, referred_id, referral_code, status, signed_up_at)
            VALUES ($1, $2, $3, $4, $5, now())
            ",
        )
        .bind(Uuid::new_v4())
        .bind(referrer_id)
        .bind(referred.as_uuid())
        .bind(code.as_str())
        .bind(ReferralStatus::SignedUp)
        .execute(&mut *tx)
        .await;

        match inserted.map_err(|e| RepositoryError::from_insert(e, "referral")) {
            Ok(_) => {}
            Err(RepositoryError::Conflict(_)) => return Ok(ClaimOutcome::AlreadyReferred),
            Err(e) => return Err(e),
        }

        sqlx::query(
            r"
            UPDATE storefront.profile
            SET invites_remaining = invites_remaining - 1, updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(referrer_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(ClaimOutcome::Claimed)
    }

    /// Move `referred`'s referral from `signed_up` to `first_order`.
    ///
    /// Returns whether a referral was updated. Referrals in any other status
    /// are left alone.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn mark_first_order(&self, referred: ProfileId) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE storefront.referral
            SET status = $2, first_order_at = now()
            WHERE referred_id = $1 AND status = $3
            ",
        )
        .bind(referred.as_uuid())
        .bind(ReferralStatus::FirstOrder)
        .bind(ReferralStatus::SignedUp)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
