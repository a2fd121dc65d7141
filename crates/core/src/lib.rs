//! SF Secret Menu core - domain library.
//!
//! Shared by every SF Secret Menu component:
//! - `storefront` - JSON API behind the ordering site
//! - `cli` - migrations and operator tasks
//!
//! # Architecture
//!
//! Pure logic only: no I/O, no database access, no HTTP clients. The payment
//! processor is reached through the [`checkout::CheckoutGateway`] trait, which
//! the storefront implements.
//!
//! # Modules
//!
//! - [`catalog`] - Plans and meal-count tiers
//! - [`pricing`] - Weekly price breakdown
//! - [`zone`] - Delivery-zone classification of free-text addresses
//! - [`capture`] - Email + zip capture at the top of the funnel
//! - [`onboarding`] - Plan → delivery → payment wizard
//! - [`checkout`] - Hosted-checkout hand-off and success verification
//! - [`referral`] - Referral codes, share links and stats
//! - [`menu`] - Weekly rotating menus
//! - [`types`] - Newtype IDs and email

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod capture;
pub mod catalog;
pub mod checkout;
pub mod menu;
pub mod onboarding;
pub mod pricing;
pub mod referral;
pub mod types;
pub mod zone;

pub use catalog::{Catalog, CatalogError, PlanId, PlanTier};
pub use pricing::{PriceBreakdown, quote};
pub use types::*;
pub use zone::{ZoneCheck, ZoneStatus};
