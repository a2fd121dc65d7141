//! Storefront models.
//!
//! Domain types live in `secret_menu_core`; this module holds what only the
//! storefront persists: member profiles and session-stored state.

pub mod profile;
pub mod session;

pub use profile::Profile;
pub use session::CurrentMember;
