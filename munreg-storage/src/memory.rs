//! In-memory registration store.
//!
//! Fast, thread-safe storage suitable for development, testing,
//! and single-process deployments.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use munreg_core::constants::FIRST_ID;
use munreg_core::error::{MunregError, Result};
use munreg_core::traits::{RegistrationStore, UserStore};
use munreg_core::types::{
    sort_newest_first, NewRegistration, NewUser, Registration, RegistrationFilter,
    RegistrationPatch, User,
};

/// Full store contents, as persisted by [`crate::FileStore`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    /// Every registration (unordered)
    pub registrations: Vec<Registration>,
    /// Every user (unordered)
    pub users: Vec<User>,
    /// Next registration id to hand out
    pub next_registration_id: u64,
    /// Next user id to hand out
    pub next_user_id: u64,
}

/// In-memory registration store.
///
/// Uses concurrent data structures for thread-safe access without
/// requiring external synchronization.
///
/// # Identifiers
///
/// Ids come from an atomic counter starting at 1. Deleting a record never
/// rewinds the counter, so an id is not reused within the store's lifetime.
#[derive(Debug)]
pub struct MemoryStore {
    /// Primary storage: ID → Registration
    registrations: DashMap<u64, Registration>,
    /// Next registration ID
    next_registration_id: AtomicU64,
    /// Users: ID → User
    users: DashMap<u64, User>,
    /// Username index: username → user ID (also serializes user creation)
    usernames: RwLock<HashMap<String, u64>>,
    /// Next user ID
    next_user_id: AtomicU64,
}

impl MemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self {
            registrations: DashMap::new(),
            next_registration_id: AtomicU64::new(FIRST_ID),
            users: DashMap::new(),
            usernames: RwLock::new(HashMap::new()),
            next_user_id: AtomicU64::new(FIRST_ID),
        }
    }

    /// Creates a store with preallocated capacity.
    ///
    /// Use this when you know the expected number of registrations.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            registrations: DashMap::with_capacity(capacity),
            ..Self::new()
        }
    }

    /// Returns the number of registrations.
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// Returns true if no registration is stored.
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Removes every record and resets both id counters.
    pub fn clear(&self) {
        self.registrations.clear();
        self.users.clear();
        self.usernames.write().clear();
        self.next_registration_id.store(FIRST_ID, Ordering::SeqCst);
        self.next_user_id.store(FIRST_ID, Ordering::SeqCst);
    }

    /// Returns all registrations in no particular order (for export/backup).
    pub fn all_registrations(&self) -> Vec<Registration> {
        self.registrations
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Collects matching registrations, newest first.
    fn collect_sorted(&self, mut keep: impl FnMut(&Registration) -> bool) -> Vec<Registration> {
        let mut out: Vec<Registration> = self
            .registrations
            .iter()
            .filter(|entry| keep(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        sort_newest_first(&mut out);
        out
    }

    /// Imports registrations, keeping their ids.
    ///
    /// Records with id 0 get a fresh id. The counter is advanced past the
    /// highest imported id. Existing records with the same id are replaced.
    pub fn import(&self, registrations: Vec<Registration>) -> usize {
        let mut imported = 0;

        for mut reg in registrations {
            if reg.id == 0 {
                reg.id = self.next_registration_id.fetch_add(1, Ordering::SeqCst);
            } else {
                self.next_registration_id
                    .fetch_max(reg.id + 1, Ordering::SeqCst);
            }

            self.registrations.insert(reg.id, reg);
            imported += 1;
        }

        imported
    }

    /// Imports users, keeping their ids. Fails on duplicate usernames.
    pub fn import_users(&self, users: Vec<User>) -> Result<usize> {
        let mut usernames = self.usernames.write();
        let mut imported = 0;

        for user in users {
            if usernames.contains_key(&user.username) {
                return Err(MunregError::DuplicateUsername(user.username));
            }
            self.next_user_id.fetch_max(user.id + 1, Ordering::SeqCst);
            usernames.insert(user.username.clone(), user.id);
            self.users.insert(user.id, user);
            imported += 1;
        }

        Ok(imported)
    }

    /// Removes a registration outright, returning it.
    pub(crate) fn take_registration(&self, id: u64) -> Option<Registration> {
        self.registrations.remove(&id).map(|(_, reg)| reg)
    }

    /// Removes a user and its username entry.
    pub(crate) fn take_user(&self, id: u64) -> Option<User> {
        let mut usernames = self.usernames.write();
        let (_, user) = self.users.remove(&id)?;
        usernames.remove(&user.username);
        Some(user)
    }

    /// Copies the full store contents.
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            registrations: self.all_registrations(),
            users: self.users.iter().map(|e| e.value().clone()).collect(),
            next_registration_id: self.next_registration_id.load(Ordering::SeqCst),
            next_user_id: self.next_user_id.load(Ordering::SeqCst),
        }
    }

    /// Loads a snapshot into this store, including its id counters.
    pub fn restore(&self, snapshot: StoreSnapshot) -> Result<()> {
        self.import(snapshot.registrations);
        self.import_users(snapshot.users)?;
        self.next_registration_id
            .fetch_max(snapshot.next_registration_id, Ordering::SeqCst);
        self.next_user_id
            .fetch_max(snapshot.next_user_id, Ordering::SeqCst);
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RegistrationStore for MemoryStore {
    /// Assigns the next id, `pending` status and the current time, then stores.
    #[instrument(skip(self, registration), fields(committees = registration.committees.len()))]
    async fn create_registration(&self, registration: NewRegistration) -> Result<Registration> {
        let id = self.next_registration_id.fetch_add(1, Ordering::SeqCst);
        let stored = registration.into_registration(id, Utc::now());

        debug!(id, "Creating registration");

        self.registrations.insert(id, stored.clone());
        Ok(stored)
    }

    async fn get_registrations(&self) -> Result<Vec<Registration>> {
        Ok(self.collect_sorted(|_| true))
    }

    #[instrument(skip(self))]
    async fn get_registration(&self, id: u64) -> Result<Option<Registration>> {
        Ok(self.registrations.get(&id).map(|entry| entry.clone()))
    }

    /// Shallow overwrite under the entry lock, so concurrent updates to the
    /// same record never interleave.
    #[instrument(skip(self, patch))]
    async fn update_registration(
        &self,
        id: u64,
        patch: RegistrationPatch,
    ) -> Result<Option<Registration>> {
        let Some(mut entry) = self.registrations.get_mut(&id) else {
            debug!(id, "Update of unknown registration");
            return Ok(None);
        };

        entry.apply(patch);
        debug!(id, status = %entry.status, "Updated registration");
        Ok(Some(entry.clone()))
    }

    #[instrument(skip(self))]
    async fn delete_registration(&self, id: u64) -> Result<bool> {
        let removed = self.registrations.remove(&id).is_some();
        debug!(id, removed, "Delete registration");
        Ok(removed)
    }

    #[instrument(skip(self))]
    async fn search_registrations(&self, query: &str) -> Result<Vec<Registration>> {
        let needle = query.to_lowercase();
        let results = self.collect_sorted(|reg| reg.matches_search(&needle));

        debug!(count = results.len(), "Searched registrations");
        Ok(results)
    }

    #[instrument(skip(self))]
    async fn filter_registrations(&self, filter: &RegistrationFilter) -> Result<Vec<Registration>> {
        let results = self.collect_sorted(|reg| filter.matches(reg));

        debug!(count = results.len(), "Filtered registrations");
        Ok(results)
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.registrations.len() as u64)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get_user(&self, id: u64) -> Result<Option<User>> {
        Ok(self.users.get(&id).map(|entry| entry.clone()))
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let id = match self.usernames.read().get(username) {
            Some(id) => *id,
            None => return Ok(None),
        };
        Ok(self.users.get(&id).map(|entry| entry.clone()))
    }

    #[instrument(skip(self, user), fields(username = %user.username))]
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut usernames = self.usernames.write();
        if usernames.contains_key(&user.username) {
            return Err(MunregError::DuplicateUsername(user.username));
        }

        let id = self.next_user_id.fetch_add(1, Ordering::SeqCst);
        let user = user.into_user(id);
        usernames.insert(user.username.clone(), id);
        self.users.insert(id, user.clone());

        debug!(id, "Created user");
        Ok(user)
    }
}
