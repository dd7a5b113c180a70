//! Error types for MUNREG.
//!
//! This module provides the error hierarchy shared by the store, the API,
//! and the CLI using `thiserror`.

use thiserror::Error;

use crate::validation::ValidationErrors;

/// Result type alias using `MunregError`.
pub type Result<T> = std::result::Result<T, MunregError>;

/// Main error type for all MUNREG operations.
#[derive(Debug, Error)]
pub enum MunregError {
    // ═══════════════════════════════════════════════════════════════════════════
    // CLIENT ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Registration input failed the schema.
    #[error("Invalid registration data: {0}")]
    Validation(#[from] ValidationErrors),

    /// No registration with this id.
    #[error("Registration not found: {0}")]
    RegistrationNotFound(u64),

    /// Path identifier is not an integer.
    #[error("Invalid registration ID: {0}")]
    InvalidId(String),

    /// Username already taken.
    #[error("Username already exists: {0}")]
    DuplicateUsername(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // STORAGE ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Backing store unavailable or corrupted.
    #[error("Store error: {0}")]
    Store(String),

    /// Snapshot file written by an incompatible version.
    #[error("Snapshot version mismatch: expected {expected}, got {actual}")]
    VersionMismatch {
        /// Version this build reads
        expected: u8,
        /// Version found in the file
        actual: u8,
    },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ═══════════════════════════════════════════════════════════════════════════
    // INTERNAL ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal invariant violation (should never happen).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MunregError {
    /// Returns true if the caller sent bad input.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            MunregError::Validation(_)
                | MunregError::InvalidId(_)
                | MunregError::DuplicateUsername(_)
        )
    }

    /// Returns true if the target record does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, MunregError::RegistrationNotFound(_))
    }

    /// Returns true for failures of the store or the process itself.
    pub fn is_infrastructure(&self) -> bool {
        !self.is_validation_error() && !self.is_not_found()
    }
}
