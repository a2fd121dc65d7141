//! Session-related types.
//!
//! Everything the visitor's session carries between requests: the captured
//! lead and its referral code, the onboarding wizard, and the signed-in
//! member.

use serde::{Deserialize, Serialize};

use secret_menu_core::{Email, ProfileId};

/// Session-stored member identity.
///
/// Set after a confirmed checkout; read by the referral endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentMember {
    /// Profile ID.
    pub id: ProfileId,
    /// Member's email address.
    pub email: Email,
}

/// Session keys.
pub mod keys {
    /// Email + zip captured on the landing page.
    pub const CAPTURED_LEAD: &str = "captured_lead";

    /// Referral code the lead arrived with, claimed at their first checkout.
    pub const REFERRAL_CODE: &str = "referral_code";

    /// The onboarding wizard (step + draft).
    pub const ONBOARDING: &str = "onboarding";

    /// The signed-in member.
    pub const CURRENT_MEMBER: &str = "current_member";
}
