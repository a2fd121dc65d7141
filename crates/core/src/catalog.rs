//! Static plan catalog.
//!
//! Plans are a closed set ([`PlanId`]); each plan owns one or more meal-count
//! tiers with their per-meal price. The catalog is immutable for the life of
//! the process.

use core::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Flat delivery fee used when a plan does not configure its own.
pub const DEFAULT_DELIVERY_FEE: Decimal = dec!(10);

/// Meal count pre-selected when a new draft is created.
pub const DEFAULT_MEAL_COUNT: u32 = 8;

/// Errors raised by catalog lookups.
///
/// An unknown identifier is a configuration problem: callers must surface it
/// and never substitute another plan.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("unknown plan: {0}")]
    UnknownPlan(String),
    #[error("unknown plan tier: {0}")]
    UnknownTier(String),
    #[error("no plan tier offers {0} meals")]
    UnknownMealCount(u32),
}

/// Subscription plan identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanId {
    Access,
    Plus,
    #[serde(rename = "solodev")]
    SoloDev,
    #[serde(rename = "hackerhouse")]
    HackerHouse,
}

impl PlanId {
    /// Every plan, in catalog order.
    pub const ALL: [Self; 4] = [Self::Access, Self::Plus, Self::SoloDev, Self::HackerHouse];

    /// Identifier used in URLs and configuration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Plus => "plus",
            Self::SoloDev => "solodev",
            Self::HackerHouse => "hackerhouse",
        }
    }

    /// Customer-facing plan name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Access => "Access",
            Self::Plus => "Plus",
            Self::SoloDev => "Solo Dev",
            Self::HackerHouse => "Hacker House",
        }
    }

    /// Delivery fee rule configured for the plan.
    #[must_use]
    pub const fn delivery_fee(self) -> DeliveryFee {
        match self {
            Self::Access => DeliveryFee::Default,
            Self::Plus => DeliveryFee::Cents(500),
            Self::SoloDev | Self::HackerHouse => DeliveryFee::Waived,
        }
    }
}

impl fmt::Display for PlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanId {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|plan| plan.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CatalogError::UnknownPlan(s.to_owned()))
    }
}

/// How a plan charges for delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "cents", rename_all = "snake_case")]
pub enum DeliveryFee {
    /// No fee configured; [`DEFAULT_DELIVERY_FEE`] applies.
    Default,
    /// A configured fee in cents.
    Cents(u32),
    /// Delivery is free.
    Waived,
}

impl DeliveryFee {
    /// Fee in currency units.
    #[must_use]
    pub fn amount(self) -> Decimal {
        match self {
            Self::Default => DEFAULT_DELIVERY_FEE,
            Self::Cents(cents) => Decimal::new(i64::from(cents), 2),
            Self::Waived => Decimal::ZERO,
        }
    }
}

/// One selectable plan size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanTier {
    pub id: &'static str,
    pub display_name: &'static str,
    pub meal_count: u32,
    pub plan: PlanId,
    pub price_per_meal: Decimal,
    pub delivery_fee: DeliveryFee,
    pub popular: bool,
}

const fn tier(
    id: &'static str,
    display_name: &'static str,
    meal_count: u32,
    plan: PlanId,
    price_per_meal: Decimal,
    popular: bool,
) -> PlanTier {
    PlanTier {
        id,
        display_name,
        meal_count,
        plan,
        price_per_meal,
        delivery_fee: plan.delivery_fee(),
        popular,
    }
}

static TIERS: [PlanTier; 6] = [
    tier("access-4", "4 meals", 4, PlanId::Access, dec!(25), false),
    tier("access-6", "6 meals", 6, PlanId::Access, dec!(22), false),
    tier("plus-8", "8 meals", 8, PlanId::Plus, dec!(19), true),
    tier("plus-10", "10 meals", 10, PlanId::Plus, dec!(18), false),
    tier("solodev-16", "16 meals", 16, PlanId::SoloDev, dec!(16), false),
    tier("hackerhouse-20", "20 meals", 20, PlanId::HackerHouse, dec!(15), false),
];

/// Read-only view over the tier table.
#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    tiers: &'static [PlanTier],
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl Catalog {
    /// The production tier table.
    #[must_use]
    pub const fn standard() -> Self {
        Self { tiers: &TIERS }
    }

    /// All tiers, ordered by meal count.
    #[must_use]
    pub const fn tiers(&self) -> &'static [PlanTier] {
        self.tiers
    }

    /// Look up a tier by its identifier (e.g. `plus-8`).
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownTier`] for identifiers not in the table.
    pub fn tier(&self, id: &str) -> Result<&'static PlanTier, CatalogError> {
        self.tiers
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| CatalogError::UnknownTier(id.to_owned()))
    }

    /// Look up the tier offering exactly `meal_count` meals.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownMealCount`] when no tier matches.
    pub fn tier_for_meals(&self, meal_count: u32) -> Result<&'static PlanTier, CatalogError> {
        self.tiers
            .iter()
            .find(|t| t.meal_count == meal_count)
            .ok_or(CatalogError::UnknownMealCount(meal_count))
    }

    /// The tier closest to `meal_count`; ties go to the smaller tier.
    ///
    /// Only used by display-side pricing, which must not fail on drift.
    #[must_use]
    #[allow(clippy::indexing_slicing)] // the static table is non-empty
    pub fn nearest_tier(&self, meal_count: u32) -> &'static PlanTier {
        self.tiers
            .iter()
            .min_by_key(|t| (t.meal_count.abs_diff(meal_count), t.meal_count))
            .unwrap_or(&TIERS[2])
    }

    /// The tier a new draft starts with.
    #[must_use]
    pub fn default_tier(&self) -> &'static PlanTier {
        self.nearest_tier(DEFAULT_MEAL_COUNT)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_tiers_sorted_by_meal_count() {
        let counts: Vec<u32> = Catalog::standard().tiers().iter().map(|t| t.meal_count).collect();
        assert_eq!(counts, vec![4, 6, 8, 10, 16, 20]);
    }

    #[test]
    fn test_tier_lookup() {
        let tier = Catalog::standard().tier("plus-8").unwrap();
        assert_eq!(tier.meal_count, 8);
        assert_eq!(tier.price_per_meal, dec!(19));
        assert!(tier.popular);
    }

    #[test]
    fn test_unknown_tier_is_an_error() {
        assert_eq!(
            Catalog::standard().tier("mega-99"),
            Err(CatalogError::UnknownTier("mega-99".to_owned()))
        );
    }

    #[test]
    fn test_tier_for_meals_exact() {
        let catalog = Catalog::standard();
        assert_eq!(catalog.tier_for_meals(16).unwrap().plan, PlanId::SoloDev);
        assert_eq!(
            catalog.tier_for_meals(7),
            Err(CatalogError::UnknownMealCount(7))
        );
    }

    #[test]
    fn test_nearest_tier() {
        let catalog = Catalog::standard();
        assert_eq!(catalog.nearest_tier(0).meal_count, 4);
        assert_eq!(catalog.nearest_tier(7).meal_count, 6); // tie 6/8 -> smaller
        assert_eq!(catalog.nearest_tier(13).meal_count, 10);
        assert_eq!(catalog.nearest_tier(100).meal_count, 20);
        assert_eq!(catalog.nearest_tier(10).meal_count, 10);
    }

    #[test]
    fn test_default_tier_is_plus_eight() {
        let tier = Catalog::standard().default_tier();
        assert_eq!((tier.meal_count, tier.plan), (8, PlanId::Plus));
    }

    #[test]
    fn test_plan_id_parse() {
        assert_eq!("plus".parse::<PlanId>().unwrap(), PlanId::Plus);
        assert_eq!("HackerHouse".parse::<PlanId>().unwrap(), PlanId::HackerHouse);
        assert!(matches!(
            "enterprise".parse::<PlanId>(),
            Err(CatalogError::UnknownPlan(_))
        ));
    }

    #[test]
    fn test_plan_id_serde_matches_as_str() {
        for plan in PlanId::ALL {
            let json = serde_json::to_string(&plan).unwrap();
            assert_eq!(json, format!("\"{}\"", plan.as_str()));
        }
    }

    #[test]
    fn test_delivery_fee_amounts() {
        assert_eq!(DeliveryFee::Default.amount(), dec!(10));
        assert_eq!(DeliveryFee::Cents(500).amount(), dec!(5.00));
        assert_eq!(DeliveryFee::Waived.amount(), Decimal::ZERO);
    }
}
