//! Shared newtypes for SF Secret Menu.

pub mod email;
pub mod id;

pub use email::{Email, EmailError};
pub use id::*;
