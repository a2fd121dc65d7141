//! Business logic services for storefront.
//!
//! # Services
//!
//! - `funnel` - Session-held lead capture and onboarding wizard
//! - `referrals` - Referral stats, code validation and claims
//! - `stripe` - Stripe Checkout client (the payment gateway)

pub mod funnel;
pub mod referrals;
pub mod stripe;
