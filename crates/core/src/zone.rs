//! Delivery-zone classification for free-text addresses.
//!
//! This is keyword matching, not geocoding. Rules, first match wins:
//!
//! 1. a service zip code, a neighborhood name, or a city token appears → in zone
//! 2. an adjacent locality appears → waitlist
//! 3. otherwise → out of zone
//!
//! A street named after an in-zone neighborhood elsewhere will match, and an
//! unlisted zip inside the city will not. That imprecision is accepted.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Verdict for an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneStatus {
    InZone,
    Waitlist,
    OutOfZone,
}

impl ZoneStatus {
    /// Short badge text for the verdict.
    #[must_use]
    pub const fn headline(self) -> &'static str {
        match self {
            Self::InZone => "WE DELIVER TO YOU!",
            Self::Waitlist => "COMING SOON",
            Self::OutOfZone => "NOT YET AVAILABLE",
        }
    }

    /// Fixed customer-facing explanation.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::InZone => "Great news! We deliver to your area. Same-day delivery available.",
            Self::Waitlist => "We're expanding soon! Join the waitlist for East Bay & Peninsula.",
            Self::OutOfZone => "We currently deliver within San Francisco only. Check back soon!",
        }
    }
}

/// Classification result plus its message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZoneCheck {
    pub status: ZoneStatus,
    pub headline: &'static str,
    pub message: &'static str,
}

impl From<ZoneStatus> for ZoneCheck {
    fn from(status: ZoneStatus) -> Self {
        Self {
            status,
            headline: status.headline(),
            message: status.message(),
        }
    }
}

const SF_ZIP_CODES: &[&str] = &[
    "94102", "94103", "94104", "94105", "94107", "94108", "94109", "94110", "94111", "94112",
    "94114", "94115", "94116", "94117", "94118", "94119", "94120", "94121", "94122", "94123",
    "94124", "94125", "94126", "94127", "94128", "94129", "94130", "94131", "94132", "94133",
    "94134", "94158",
];

const SF_NEIGHBORHOODS: &[&str] = &[
    "Marina",
    "Pacific Heights",
    "Presidio Heights",
    "Russian Hill",
    "Nob Hill",
    "North Beach",
    "Telegraph Hill",
    "Financial District",
    "SOMA",
    "South Beach",
    "Mission Bay",
    "Potrero Hill",
    "Mission",
    "Castro",
    "Noe Valley",
    "Bernal Heights",
    "Glen Park",
    "Diamond Heights",
    "Twin Peaks",
    "Cole Valley",
    "Haight-Ashbury",
    "Lower Haight",
    "Hayes Valley",
    "Civic Center",
    "Tenderloin",
    "Inner Richmond",
    "Outer Richmond",
    "Inner Sunset",
    "Outer Sunset",
    "Parkside",
    "West Portal",
    "Forest Hill",
    "St. Francis Wood",
    "Ingleside",
    "Excelsior",
    "Crocker-Amazon",
    "Visitacion Valley",
    "Bayview",
    "Hunters Point",
    "Dogpatch",
    "Laurel Heights",
    "Anza Vista",
    "Western Addition",
    "Japantown",
    "Fillmore",
];

const SF_CITY_PHRASES: &[&str] = &["san francisco", "sf, ca", "sf ca"];

const ADJACENT_LOCALITIES: &[&str] = &["oakland", "berkeley", "daly city"];

static SF_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)] // literal pattern
    Regex::new(r"\bsf\b").unwrap()
});

/// Keyword sets describing where we deliver.
#[derive(Debug, Clone)]
pub struct ServiceArea {
    zip_codes: Vec<String>,
    neighborhoods: Vec<String>,
    city_phrases: Vec<String>,
    adjacent: Vec<String>,
}

impl Default for ServiceArea {
    fn default() -> Self {
        Self::san_francisco()
    }
}

impl ServiceArea {
    /// San Francisco proper, with the East Bay and Daly City on the waitlist.
    #[must_use]
    pub fn san_francisco() -> Self {
        let lower = |items: &[&str]| -> Vec<String> {
            items.iter().map(|s| s.to_lowercase()).collect()
        };
        Self {
            zip_codes: lower(SF_ZIP_CODES),
            neighborhoods: lower(SF_NEIGHBORHOODS),
            city_phrases: lower(SF_CITY_PHRASES),
            adjacent: lower(ADJACENT_LOCALITIES),
        }
    }

    /// Classify a raw address or zip. Never fails.
    #[must_use]
    pub fn classify(&self, input: &str) -> ZoneCheck {
        let text = input.trim().to_lowercase();
        if text.is_empty() {
            return ZoneStatus::OutOfZone.into();
        }

        let contains_any = |needles: &[String]| needles.iter().any(|n| text.contains(n.as_str()));

        let in_zone = contains_any(&self.zip_codes)
            || contains_any(&self.neighborhoods)
            || contains_any(&self.city_phrases)
            || SF_TOKEN.is_match(&text);

        let status = if in_zone {
            ZoneStatus::InZone
        } else if contains_any(&self.adjacent) {
            ZoneStatus::Waitlist
        } else {
            ZoneStatus::OutOfZone
        };

        status.into()
    }
}

/// Classify against the default San Francisco service area.
#[must_use]
pub fn classify(input: &str) -> ZoneCheck {
    static AREA: LazyLock<ServiceArea> = LazyLock::new(ServiceArea::san_francisco);
    AREA.classify(input)
}
