//! Weekly price breakdown for a plan selection.
//!
//! Pure and cheap: display code recomputes it on every selection change.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::catalog::{Catalog, PlanId};

/// First-order discount, in currency units.
pub const FIRST_ORDER_DISCOUNT: Decimal = dec!(15);

/// Smallest plan size that earns the first-order discount.
pub const DISCOUNT_MIN_MEALS: u32 = 8;

/// Price summary shown next to the onboarding wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceBreakdown {
    /// Meal count the prices were computed for (after tier fallback).
    pub meal_count: u32,
    pub plan: PlanId,
    pub price_per_meal: Decimal,
    pub meals_subtotal: Decimal,
    pub delivery_fee: Decimal,
    pub delivery_waived: bool,
    pub discount: Decimal,
    /// Subtotal plus delivery, before the discount.
    pub original_total: Decimal,
    pub total: Decimal,
}

/// Discount earned by a plan of `meal_count` meals.
#[must_use]
pub fn discount_for(meal_count: u32) -> Decimal {
    if meal_count >= DISCOUNT_MIN_MEALS {
        FIRST_ORDER_DISCOUNT
    } else {
        Decimal::ZERO
    }
}

/// Compute the weekly breakdown for `meal_count` meals on `plan`.
///
/// Meal counts outside the tier table fall back to the nearest tier instead
/// of failing. The delivery fee follows `plan`, the per-meal price follows
/// the tier.
#[must_use]
pub fn quote(catalog: &Catalog, meal_count: u32, plan: PlanId) -> PriceBreakdown {
    let tier = catalog.nearest_tier(meal_count);
    let fee = plan.delivery_fee();

    let meals_subtotal = Decimal::from(tier.meal_count) * tier.price_per_meal;
    let delivery_fee = fee.amount();
    let discount = discount_for(tier.meal_count);
    let original_total = meals_subtotal + delivery_fee;

    PriceBreakdown {
        meal_count: tier.meal_count,
        plan,
        price_per_meal: tier.price_per_meal,
        meals_subtotal,
        delivery_fee,
        delivery_waived: delivery_fee.is_zero(),
        discount,
        original_total,
        total: original_total - discount,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_identity_for_every_tier() {
        let catalog = Catalog::standard();
        for tier in catalog.tiers() {
            let q = quote(&catalog, tier.meal_count, tier.plan);
            assert_eq!(q.total, q.meals_subtotal + q.delivery_fee - q.discount);
            assert_eq!(q.discount == FIRST_ORDER_DISCOUNT, tier.meal_count >= 8);
            assert_eq!(q.discount.is_zero(), tier.meal_count < 8);
        }
    }

    #[test]
    fn test_plus_eight() {
        let q = quote(&Catalog::standard(), 8, PlanId::Plus);
        assert_eq!(q.meals_subtotal, dec!(152));
        assert_eq!(q.discount, dec!(15));
        assert_eq!(q.delivery_fee, dec!(5.00));
        assert_eq!(q.total, dec!(142));
        assert_eq!(q.original_total, dec!(157));
    }

    #[test]
    fn test_small_plan_has_no_discount_and_default_fee() {
        let q = quote(&Catalog::standard(), 4, PlanId::Access);
        assert_eq!(q.meals_subtotal, dec!(100));
        assert_eq!(q.delivery_fee, dec!(10));
        assert_eq!(q.discount, Decimal::ZERO);
        assert_eq!(q.total, dec!(110));
    }

    #[test]
    fn test_waived_delivery() {
        let q = quote(&Catalog::standard(), 20, PlanId::HackerHouse);
        assert!(q.delivery_waived);
        assert_eq!(q.total, dec!(285));
    }

    #[test]
    fn test_unknown_meal_count_uses_nearest_tier() {
        let q = quote(&Catalog::standard(), 9, PlanId::Plus);
        assert_eq!(q.meal_count, 8);
        assert_eq!(q.meals_subtotal, dec!(152));
    }

    #[test]
    fn test_discount_boundary() {
        assert_eq!(discount_for(7), Decimal::ZERO);
        assert_eq!(discount_for(8), dec!(15));
        assert_eq!(discount_for(20), dec!(15));
    }
}
