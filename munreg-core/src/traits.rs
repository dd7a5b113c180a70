//! Common traits for MUNREG.
//!
//! These traits define the store interface the API is written against, so the
//! in-memory and file-backed implementations (or a database one) are
//! interchangeable.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    NewRegistration, NewUser, Registration, RegistrationFilter, RegistrationPatch,
    RegistrationStats, User,
};

// ═══════════════════════════════════════════════════════════════════════════════
// REGISTRATION STORE
// ═══════════════════════════════════════════════════════════════════════════════

/// Sole authority over registration records.
///
/// Every listing operation returns an owned snapshot ordered newest first.
/// Errors from these methods are infrastructure failures; absence is reported
/// through `Option`/`bool`, never as an error.
#[async_trait]
pub trait RegistrationStore: Send + Sync {
    /// Stores a validated registration with the next id, `pending` status, and
    /// the current time.
    async fn create_registration(&self, registration: NewRegistration) -> Result<Registration>;

    /// Returns every registration, newest first.
    async fn get_registrations(&self) -> Result<Vec<Registration>>;

    /// Returns the registration with this id, if any.
    async fn get_registration(&self, id: u64) -> Result<Option<Registration>>;

    /// Overwrites the supplied fields. Returns `None` if the id is unknown.
    ///
    /// The patch is applied as given; validating it is the caller's job.
    async fn update_registration(
        &self,
        id: u64,
        patch: RegistrationPatch,
    ) -> Result<Option<Registration>>;

    /// Removes the registration. Returns whether anything was removed.
    async fn delete_registration(&self, id: u64) -> Result<bool>;

    /// Case-insensitive substring search over first name, last name, email,
    /// and school.
    async fn search_registrations(&self, query: &str) -> Result<Vec<Registration>>;

    /// Registrations satisfying every criterion of the filter.
    async fn filter_registrations(&self, filter: &RegistrationFilter) -> Result<Vec<Registration>>;

    /// Number of stored registrations.
    async fn count(&self) -> Result<u64>;

    /// Dashboard counters.
    async fn stats(&self) -> Result<RegistrationStats> {
        let registrations = self.get_registrations().await?;
        Ok(RegistrationStats::from_registrations(&registrations))
    }

    /// Persists pending writes. No-op for purely in-memory stores.
    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// USER STORE
// ═══════════════════════════════════════════════════════════════════════════════

/// Storage for user accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Returns the user with this id, if any.
    async fn get_user(&self, id: u64) -> Result<Option<User>>;

    /// Returns the user with this exact username, if any.
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Stores a user with the next id. Fails if the username is taken.
    async fn create_user(&self, user: NewUser) -> Result<User>;
}
