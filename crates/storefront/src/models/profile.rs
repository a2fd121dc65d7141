//! Member profile.

use chrono::{DateTime, Utc};
use serde::Serialize;

use secret_menu_core::referral::{ReferralCode, ReferrerProfile};
use secret_menu_core::{Email, ProfileId};

/// A member of the subscription, created after their first confirmed
/// checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub id: ProfileId,
    pub email: Email,
    pub name: Option<String>,
    pub referral_code: ReferralCode,
    /// Authoritative invite counter; decremented when a referral is claimed.
    pub invites_remaining: u32,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    /// The referrer's view used by stats aggregation.
    #[must_use]
    pub fn referrer(&self) -> ReferrerProfile {
        ReferrerProfile {
            referral_code: self.referral_code.clone(),
            invites_remaining: self.invites_remaining,
        }
    }
}
