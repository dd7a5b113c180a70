//! # MUNREG Core
//!
//! Core types, validation, errors, and traits for the MUNREG conference
//! registration service.
//!
//! This crate provides the foundational building blocks used by all other MUNREG crates:
//!
//! - **Types**: Registrations, users, filters, and dashboard statistics
//! - **Validation**: The registration schema, reporting every field violation at once
//! - **Errors**: A single error enum with classification helpers
//! - **Constants**: Committee catalog and service defaults
//! - **Export**: CSV rendering for the organisers' spreadsheet
//! - **Traits**: Store interfaces implemented by the storage backends
//!
//! ## Example
//!
//! ```rust
//! use munreg_core::{RegistrationInput, ValidationPolicy};
//!
//! let input: RegistrationInput = serde_json::from_str(
//!     r#"{"firstName":"Ana","lastName":"Lee","grade":"11","position":"delegate","committees":["UNSC"]}"#,
//! ).unwrap();
//! let new = input.validate(&ValidationPolicy::lenient()).unwrap();
//! assert_eq!(new.committees, vec!["UNSC".to_string()]);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod error;
pub mod export;
pub mod traits;
pub mod types;
pub mod validation;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::{MunregError, Result};
pub use traits::*;
pub use types::*;
pub use validation::*;
