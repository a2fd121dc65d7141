//! Referral program: codes, statuses and the stats a member sees.
//!
//! Records and the `invites_remaining` counter live in the profile store;
//! this module only aggregates what the store returns.

use core::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Email, ReferralId};

/// Invites every member starts with.
pub const INVITE_QUOTA: u32 = 10;

/// Message prefilled into share links.
pub const SHARE_MESSAGE_PREFIX: &str =
    "Join SF Secret Menu and get exclusive chef-crafted meals delivered weekly!";

/// Errors from the referral program.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReferralError {
    /// The profile or referral lookup failed. Distinct from "no referrals".
    #[error("referral stats are unavailable right now")]
    Unavailable,
    #[error("invalid referral code")]
    InvalidCode,
    #[error("this referrer has no invites left")]
    NoInvitesRemaining,
    #[error("you can't use your own referral code")]
    SelfReferral,
    #[error("a referral code has already been applied")]
    AlreadyReferred,
}

/// A member's referral code: ASCII alphanumerics, stored uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReferralCode(String);

impl ReferralCode {
    pub const MIN_LENGTH: usize = 4;
    pub const MAX_LENGTH: usize = 16;

    /// Trim, uppercase and check the shape.
    ///
    /// # Errors
    ///
    /// Returns [`ReferralError::InvalidCode`] for blank, over-long or
    /// non-alphanumeric input.
    pub fn parse(s: &str) -> Result<Self, ReferralError> {
        let code = s.trim().to_ascii_uppercase();
        let len_ok = (Self::MIN_LENGTH..=Self::MAX_LENGTH).contains(&code.len());
        if len_ok && code.bytes().all(|b| b.is_ascii_alphanumeric()) {
            Ok(Self(code))
        } else {
            Err(ReferralError::InvalidCode)
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReferralCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ReferralCode {
    type Err = ReferralError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ReferralCode {
    type Error = ReferralError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ReferralCode> for String {
    fn from(code: ReferralCode) -> Self {
        code.0
    }
}

/// Lifecycle of a referral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "referral_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum ReferralStatus {
    /// Invited, not signed up yet.
    Pending,
    SignedUp,
    FirstOrder,
    Active,
}

impl ReferralStatus {
    /// Counted as pending in the stats.
    #[must_use]
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::Pending | Self::SignedUp)
    }

    /// Counted as completed; earns the referrer a reward.
    #[must_use]
    pub const fn is_completed(self) -> bool {
        matches!(self, Self::FirstOrder | Self::Active)
    }
}

/// A referral row as the store returns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferralRecord {
    pub id: ReferralId,
    pub referred_name: Option<String>,
    pub referred_email: Option<Email>,
    pub status: ReferralStatus,
    pub referred_at: DateTime<Utc>,
    pub signed_up_at: Option<DateTime<Utc>>,
    pub first_order_at: Option<DateTime<Utc>>,
}

/// The referrer's side of the store: code and the authoritative invite counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferrerProfile {
    pub referral_code: ReferralCode,
    pub invites_remaining: u32,
}

/// A referred friend, with the email masked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferredFriend {
    pub id: ReferralId,
    pub name: Option<String>,
    pub masked_email: Option<String>,
    pub status: ReferralStatus,
    pub referred_at: DateTime<Utc>,
    pub signed_up_at: Option<DateTime<Utc>>,
    pub first_order_at: Option<DateTime<Utc>>,
    pub reward_earned: bool,
}

impl From<&ReferralRecord> for ReferredFriend {
    fn from(record: &ReferralRecord) -> Self {
        Self {
            id: record.id,
            name: record.referred_name.clone(),
            masked_email: record.referred_email.as_ref().map(Email::masked),
            status: record.status,
            referred_at: record.referred_at,
            signed_up_at: record.signed_up_at,
            first_order_at: record.first_order_at,
            reward_earned: record.status.is_completed(),
        }
    }
}

/// Snapshot shown on the referrals page. Recomputed on every fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferralStats {
    pub referral_code: ReferralCode,
    pub total_referrals: usize,
    pub pending_referrals: usize,
    pub completed_referrals: usize,
    /// One free meal per completed referral.
    pub free_meals_earned: usize,
    pub invites_remaining: u32,
    pub invites_used: u32,
    pub can_invite: bool,
    /// Newest first.
    pub friends: Vec<ReferredFriend>,
}

impl ReferralStats {
    /// Aggregate `records` for `profile`.
    #[must_use]
    pub fn aggregate(profile: &ReferrerProfile, records: &[ReferralRecord]) -> Self {
        let pending = records.iter().filter(|r| r.status.is_pending()).count();
        let completed = records.iter().filter(|r| r.status.is_completed()).count();

        let mut friends: Vec<ReferredFriend> = records.iter().map(ReferredFriend::from).collect();
        friends.sort_by(|a, b| b.referred_at.cmp(&a.referred_at));

        Self {
            referral_code: profile.referral_code.clone(),
            total_referrals: records.len(),
            pending_referrals: pending,
            completed_referrals: completed,
            free_meals_earned: completed,
            invites_remaining: profile.invites_remaining,
            invites_used: INVITE_QUOTA.saturating_sub(profile.invites_remaining),
            can_invite: profile.invites_remaining > 0,
            friends,
        }
    }
}

/// What a prospective member sees after entering a code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeValidation {
    pub valid: bool,
    pub referrer_name: Option<String>,
    pub invites_available: bool,
}

impl CodeValidation {
    #[must_use]
    pub const fn invalid() -> Self {
        Self {
            valid: false,
            referrer_name: None,
            invites_available: false,
        }
    }
}

/// `{base}/signup?ref={code}`.
#[must_use]
pub fn referral_link(base_url: &str, code: &ReferralCode) -> String {
    format!("{}/signup?ref={code}", base_url.trim_end_matches('/'))
}

/// Prefilled share text for `code`.
#[must_use]
pub fn share_message(code: &ReferralCode) -> String {
    format!("{SHARE_MESSAGE_PREFIX} Use my code {code} for a special welcome.")
}

/// Places a referral link can be shared to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareChannel {
    WhatsApp,
    Twitter,
    Email,
    Sms,
}

impl ShareChannel {
    pub const ALL: [Self; 4] = [Self::WhatsApp, Self::Twitter, Self::Email, Self::Sms];

    /// Link that opens the channel with the message prefilled.
    #[must_use]
    pub fn link(self, message: &str, referral_link: &str) -> String {
        let msg = urlencoding::encode(message);
        let link = urlencoding::encode(referral_link);
        match self {
            Self::WhatsApp => format!("https://wa.me/?text={msg}%20{link}"),
            Self::Twitter => format!("https://twitter.com/intent/tweet?text={msg}&url={link}"),
            Self::Email => format!("mailto:?subject=Join%20SF%20Secret%20Menu!&body={msg}%0A%0A{link}"),
            // SMS apps do not decode the link; it is appended as is.
            Self::Sms => format!("sms:?body={msg}%20{referral_link}"),
        }
    }
}

/// Share links for every channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShareLinks {
    pub referral_link: String,
    pub message: String,
    pub whatsapp: String,
    pub twitter: String,
    pub email: String,
    pub sms: String,
}

impl ShareLinks {
    #[must_use]
    pub fn new(base_url: &str, code: &ReferralCode) -> Self {
        let referral_link = referral_link(base_url, code);
        let message = share_message(code);
        let link = |channel: ShareChannel| channel.link(&message, &referral_link);
        Self {
            whatsapp: link(ShareChannel::WhatsApp),
            twitter: link(ShareChannel::Twitter),
            email: link(ShareChannel::Email),
            sms: link(ShareChannel::Sms),
            referral_link,
            message,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn record(status: ReferralStatus, day: u32) -> ReferralRecord {
        ReferralRecord {
            id: ReferralId::generate(),
            referred_name: Some("Friend".to_owned()),
            referred_email: Some(Email::parse("friend@example.com").unwrap()),
            status,
            referred_at: Utc.with_ymd_and_hms(2026, 1, day, 12, 0, 0).unwrap(),
            signed_up_at: None,
            first_order_at: None,
        }
    }

    fn profile(invites_remaining: u32) -> ReferrerProfile {
        ReferrerProfile {
            referral_code: ReferralCode::parse("CHEF42").unwrap(),
            invites_remaining,
        }
    }

    #[test]
    fn test_aggregate_counts() {
        let records = [
            record(ReferralStatus::Active, 1),
            record(ReferralStatus::Pending, 2),
            record(ReferralStatus::FirstOrder, 3),
        ];
        let stats = ReferralStats::aggregate(&profile(7), &records);
        assert_eq!(stats.total_referrals, 3);
        assert_eq!(stats.pending_referrals, 1);
        assert_eq!(stats.completed_referrals, 2);
        assert_eq!(stats.free_meals_earned, 2);
        assert_eq!(stats.invites_used, 3);
        assert!(stats.can_invite);
    }

    #[test]
    fn test_signed_up_is_pending() {
        let stats = ReferralStats::aggregate(&profile(10), &[record(ReferralStatus::SignedUp, 1)]);
        assert_eq!(stats.pending_referrals, 1);
        assert_eq!(stats.completed_referrals, 0);
    }

    #[test]
    fn test_invites_come_from_profile_not_records() {
        let stats = ReferralStats::aggregate(&profile(0), &[]);
        assert_eq!(stats.total_referrals, 0);
        assert_eq!(stats.invites_used, 10);
        assert!(!stats.can_invite);
    }

    #[test]
    fn test_friends_newest_first_and_masked() {
        let records = [
            record(ReferralStatus::Pending, 1),
            record(ReferralStatus::Active, 9),
        ];
        let stats = ReferralStats::aggregate(&profile(8), &records);
        let first = stats.friends.first().unwrap();
        assert_eq!(first.status, ReferralStatus::Active);
        assert!(first.reward_earned);
        assert_eq!(first.masked_email.as_deref(), Some("f***@example.com"));
        assert!(!stats.friends.last().unwrap().reward_earned);
    }

    #[test]
    fn test_code_parse() {
        assert_eq!(ReferralCode::parse(" chef42 ").unwrap().as_str(), "CHEF42");
        assert_eq!(ReferralCode::parse("ab"), Err(ReferralError::InvalidCode));
        assert_eq!(ReferralCode::parse("CHEF-42"), Err(ReferralError::InvalidCode));
    }

    #[test]
    fn test_referral_link() {
        let code = ReferralCode::parse("CHEF42").unwrap();
        assert_eq!(
            referral_link("https://sfsecretmenu.com/", &code),
            "https://sfsecretmenu.com/signup?ref=CHEF42"
        );
    }

    #[test]
    fn test_share_links() {
        let code = ReferralCode::parse("CHEF42").unwrap();
        let links = ShareLinks::new("https://sfsecretmenu.com", &code);
        assert!(links.message.contains("Use my code CHEF42"));
        assert!(links.whatsapp.starts_with("https://wa.me/?text=Join%20SF%20Secret%20Menu"));
        assert!(links.twitter.ends_with("&url=https%3A%2F%2Fsfsecretmenu.com%2Fsignup%3Fref%3DCHEF42"));
        assert!(links.email.starts_with("mailto:?subject=Join%20SF%20Secret%20Menu!&body="));
        assert!(links.sms.ends_with("%20https://sfsecretmenu.com/signup?ref=CHEF42"));
    }

    #[test]
    fn test_status_serde() {
        assert_eq!(
            serde_json::to_string(&ReferralStatus::FirstOrder).unwrap(),
            "\"first_order\""
        );
    }
}
