//! # MUNREG Storage
//!
//! Registration storage for the MUNREG service.
//!
//! This crate provides two backends behind the store traits of `munreg-core`:
//!
//! - **Memory**: Concurrent in-memory storage, lost when the process exits
//! - **File**: The memory store plus a JSON snapshot file for single-node deployments
//!
//! ## Example
//!
//! ```rust,ignore
//! use munreg_storage::{MemoryStore, RegistrationStore};
//!
//! let store = MemoryStore::new();
//!
//! // Store a validated registration
//! let created = store.create_registration(new_registration).await?;
//! assert_eq!(created.id, 1);
//!
//! // Admin dashboard queries
//! let matching = store.search_registrations("lee").await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod file;
mod memory;

pub use file::FileStore;
pub use memory::{MemoryStore, StoreSnapshot};

// Re-export the traits from core
pub use munreg_core::traits::{RegistrationStore, UserStore};
