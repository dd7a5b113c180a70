//! Domain types for MUNREG.
//!
//! - [`Registration`]: A delegate's conference application
//! - [`RegistrationPatch`]: Validated partial update applied by the store
//! - [`RegistrationFilter`]: Experience/committee filter for the admin dashboard
//! - [`RegistrationStats`]: Dashboard counters
//! - [`User`]: Identity placeholder (no authentication is built on it)

mod query;
mod registration;
mod user;

pub use query::*;
pub use registration::*;
pub use user::*;
