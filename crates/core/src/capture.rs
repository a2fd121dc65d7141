//! Email + zip capture, the first step of the funnel.
//!
//! A capture inside the service area starts onboarding; anything else is kept
//! as a waitlist lead.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{Email, EmailError};

/// Bay Area zip codes accepted at capture time.
///
/// Wider than the delivery-zone keyword list: capture lets the whole Bay
/// Area into the funnel, the zone checker answers the narrower "same-day in
/// the city" question.
const SERVICE_AREA_ZIPS: &[&str] = &[
    // San Francisco
    "94102", "94103", "94104", "94105", "94107", "94108", "94109", "94110", "94111", "94112",
    "94114", "94115", "94116", "94117", "94118", "94121", "94122", "94123", "94124", "94127",
    "94129", "94130", "94131", "94132", "94133", "94134", "94158",
    // Peninsula
    "94010", "94014", "94015", "94044", "94066", "94080", "94401", "94402", "94403", "94404",
    // Palo Alto area
    "94025", "94027", "94028", "94061", "94062", "94063", "94301", "94303", "94304", "94305",
    "94306",
    // South Bay
    "94085", "94086", "94087", "94089", "95014", "95050", "95051", "95054",
    // East Bay
    "94501", "94502", "94536", "94538", "94539", "94555", "94560", "94566", "94568", "94577",
    "94578", "94579", "94580", "94586", "94587", "94588",
    // Oakland
    "94601", "94602", "94603", "94605", "94606", "94607", "94608", "94609", "94610", "94611",
    "94612", "94618", "94619",
    // Berkeley
    "94702", "94703", "94704", "94705", "94706", "94707", "94708", "94709", "94710", "94720",
];

/// Why a capture was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    #[error(transparent)]
    Email(#[from] EmailError),
    #[error("please enter a valid 5-digit ZIP code")]
    InvalidZip,
}

impl CaptureError {
    /// Form field the error belongs to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::Email(_) => "email",
            Self::InvalidZip => "zip",
        }
    }
}

/// A five-digit US zip code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ZipCode(String);

impl ZipCode {
    /// Parse a zip code: exactly five ASCII digits after trimming.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::InvalidZip`] for anything else.
    pub fn parse(s: &str) -> Result<Self, CaptureError> {
        let trimmed = s.trim();
        if trimmed.len() == 5 && trimmed.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(trimmed.to_owned()))
        } else {
            Err(CaptureError::InvalidZip)
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether we take orders for this zip.
    #[must_use]
    pub fn in_service_area(&self) -> bool {
        SERVICE_AREA_ZIPS.contains(&self.0.as_str())
    }
}

impl fmt::Display for ZipCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ZipCode {
    type Error = CaptureError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ZipCode> for String {
    fn from(zip: ZipCode) -> Self {
        zip.0
    }
}

/// Validated email + zip, as persisted between the capture step and onboarding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedLead {
    pub email: Email,
    pub zip: ZipCode,
}

/// Where the funnel goes after a capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// Inside the service area: start onboarding.
    Onboard(CapturedLead),
    /// Outside: keep the lead for the waitlist.
    Waitlist(CapturedLead),
}

impl CaptureOutcome {
    #[must_use]
    pub const fn lead(&self) -> &CapturedLead {
        match self {
            Self::Onboard(lead) | Self::Waitlist(lead) => lead,
        }
    }
}

/// Validate raw form input. Email is checked before zip.
///
/// # Errors
///
/// Returns the first field that fails validation.
pub fn capture(email: &str, zip: &str) -> Result<CaptureOutcome, CaptureError> {
    let email = Email::parse(email)?;
    let zip = ZipCode::parse(zip)?;
    let in_area = zip.in_service_area();
    let lead = CapturedLead { email, zip };

    Ok(if in_area {
        CaptureOutcome::Onboard(lead)
    } else {
        CaptureOutcome::Waitlist(lead)
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_in_area() {
        let outcome = capture("Diner@Example.com", "94110").unwrap();
        let CaptureOutcome::Onboard(lead) = outcome else {
            panic!("expected onboarding");
        };
        assert_eq!(lead.email.as_str(), "diner@example.com");
        assert_eq!(lead.zip.as_str(), "94110");
    }

    #[test]
    fn test_capture_east_bay_is_in_area() {
        assert!(matches!(
            capture("a@b.co", "94612").unwrap(),
            CaptureOutcome::Onboard(_)
        ));
    }

    #[test]
    fn test_capture_outside_area_goes_to_waitlist() {
        assert!(matches!(
            capture("a@b.co", "83702").unwrap(),
            CaptureOutcome::Waitlist(_)
        ));
    }

    #[test]
    fn test_email_checked_first() {
        let err = capture("nope", "12").unwrap_err();
        assert_eq!(err.field(), "email");
    }

    #[test]
    fn test_zip_must_be_five_digits() {
        for bad in ["9411", "941100", "9411a", "", "94 10"] {
            assert_eq!(ZipCode::parse(bad), Err(CaptureError::InvalidZip), "{bad}");
        }
        assert!(ZipCode::parse(" 94110 ").is_ok());
    }

    #[test]
    fn test_zip_deserialize_validates() {
        assert!(serde_json::from_str::<ZipCode>("\"abcde\"").is_err());
    }
}
