//! The in-progress order.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::capture::{CapturedLead, ZipCode};
use crate::catalog::{Catalog, PlanId};
use crate::types::Email;

pub const DEFAULT_CITY: &str = "San Francisco";
pub const DEFAULT_STATE: &str = "CA";

/// Daily calorie target the kitchen portions for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CaloriePreference {
    #[default]
    None,
    Low,
    Medium,
    High,
    VeryHigh,
}

/// Delivery fields collected in the second step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryDetails {
    pub full_name: String,
    pub street_address: String,
    pub apt_suite: String,
    pub city: String,
    pub state: String,
    pub phone: String,
    pub text_updates: bool,
}

impl Default for DeliveryDetails {
    fn default() -> Self {
        Self {
            full_name: String::new(),
            street_address: String::new(),
            apt_suite: String::new(),
            city: DEFAULT_CITY.to_owned(),
            state: DEFAULT_STATE.to_owned(),
            phone: String::new(),
            text_updates: true,
        }
    }
}

/// Partial update of [`DeliveryDetails`]; `None` leaves a field as is.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeliveryUpdate {
    pub full_name: Option<String>,
    pub street_address: Option<String>,
    pub apt_suite: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub phone: Option<String>,
    pub text_updates: Option<bool>,
}

impl DeliveryDetails {
    pub(crate) fn apply(&mut self, update: DeliveryUpdate) {
        let DeliveryUpdate {
            full_name,
            street_address,
            apt_suite,
            city,
            state,
            phone,
            text_updates,
        } = update;

        for (slot, value) in [
            (&mut self.full_name, full_name),
            (&mut self.street_address, street_address),
            (&mut self.apt_suite, apt_suite),
            (&mut self.city, city),
            (&mut self.state, state),
            (&mut self.phone, phone),
        ] {
            if let Some(value) = value {
                *slot = value;
            }
        }
        if let Some(text_updates) = text_updates {
            self.text_updates = text_updates;
        }
    }
}

/// Partial update of the dietary preferences.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreferencesUpdate {
    pub calorie_preference: Option<CaloriePreference>,
    pub diets: Option<BTreeSet<String>>,
    pub allergies: Option<BTreeSet<String>>,
    /// Flip one diet on or off, applied after `diets`.
    pub toggle_diet: Option<String>,
    pub toggle_allergy: Option<String>,
}

/// The order being assembled by the wizard.
///
/// `meal_count` always names a catalog tier and `plan` is that tier's plan;
/// only [`super::OnboardingSession::select_plan`] changes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnboardingDraft {
    pub email: Email,
    pub zip: ZipCode,
    pub meal_count: u32,
    pub plan: PlanId,
    pub calorie_preference: CaloriePreference,
    pub diets: BTreeSet<String>,
    pub allergies: BTreeSet<String>,
    #[serde(flatten)]
    pub delivery: DeliveryDetails,
}

impl OnboardingDraft {
    /// Fresh draft for a captured lead, pre-set to the catalog's default tier.
    #[must_use]
    pub fn new(lead: CapturedLead, catalog: &Catalog) -> Self {
        let tier = catalog.default_tier();
        Self {
            email: lead.email,
            zip: lead.zip,
            meal_count: tier.meal_count,
            plan: tier.plan,
            calorie_preference: CaloriePreference::None,
            diets: BTreeSet::new(),
            allergies: BTreeSet::new(),
            delivery: DeliveryDetails::default(),
        }
    }

    /// Add `diet` if absent, remove it if present.
    pub fn toggle_diet(&mut self, diet: &str) {
        toggle(&mut self.diets, diet);
    }

    /// Add `allergy` if absent, remove it if present.
    pub fn toggle_allergy(&mut self, allergy: &str) {
        toggle(&mut self.allergies, allergy);
    }

    pub(crate) fn apply_preferences(&mut self, update: PreferencesUpdate) {
        if let Some(calories) = update.calorie_preference {
            self.calorie_preference = calories;
        }
        if let Some(diets) = update.diets {
            self.diets = normalize(diets);
        }
        if let Some(allergies) = update.allergies {
            self.allergies = normalize(allergies);
        }
        if let Some(diet) = update.toggle_diet {
            self.toggle_diet(&diet);
        }
        if let Some(allergy) = update.toggle_allergy {
            self.toggle_allergy(&allergy);
        }
    }
}

fn toggle(set: &mut BTreeSet<String>, value: &str) {
    let value = value.trim().to_lowercase();
    if value.is_empty() {
        return;
    }
    if !set.remove(&value) {
        set.insert(value);
    }
}

fn normalize(set: BTreeSet<String>) -> BTreeSet<String> {
    set.into_iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::capture::capture;

    fn draft() -> OnboardingDraft {
        let lead = capture("diner@example.com", "94110").unwrap().lead().clone();
        OnboardingDraft::new(lead, &Catalog::standard())
    }

    #[test]
    fn test_new_draft_defaults() {
        let d = draft();
        assert_eq!((d.meal_count, d.plan), (8, PlanId::Plus));
        assert_eq!(d.delivery.city, "San Francisco");
        assert_eq!(d.delivery.state, "CA");
        assert!(d.delivery.text_updates);
        assert_eq!(d.calorie_preference, CaloriePreference::None);
    }

    #[test]
    fn test_toggle() {
        let mut d = draft();
        d.toggle_diet("Keto");
        assert!(d.diets.contains("keto"));
        d.toggle_diet("keto");
        assert!(d.diets.is_empty());
        d.toggle_allergy("  ");
        assert!(d.allergies.is_empty());
    }

    #[test]
    fn test_delivery_update_is_partial() {
        let mut details = DeliveryDetails::default();
        details.apply(DeliveryUpdate {
            full_name: Some("Ada".to_owned()),
            text_updates: Some(false),
            ..DeliveryUpdate::default()
        });
        assert_eq!(details.full_name, "Ada");
        assert_eq!(details.city, "San Francisco");
        assert!(!details.text_updates);
    }

    #[test]
    fn test_calorie_preference_serde() {
        let json = serde_json::to_string(&CaloriePreference::VeryHigh).unwrap();
        assert_eq!(json, "\"very-high\"");
    }

    #[test]
    fn test_draft_serde_roundtrip_keeps_sets() {
        let mut d = draft();
        d.toggle_allergy("peanuts");
        let back: OnboardingDraft = serde_json::from_str(&serde_json::to_string(&d).unwrap()).unwrap();
        assert_eq!(back, d);
    }
}
