//! File-backed registration store.
//!
//! Keeps everything in a [`MemoryStore`] and writes a snapshot file after
//! writes. Suitable for single-node deployments that must survive restarts.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use munreg_core::error::{MunregError, Result};
use munreg_core::traits::{RegistrationStore, UserStore};
use munreg_core::types::{
    NewRegistration, NewUser, Registration, RegistrationFilter, RegistrationPatch, User,
};

use crate::memory::{MemoryStore, StoreSnapshot};

/// File format magic bytes
const MAGIC: &[u8; 4] = b"MUNR";
/// Current file format version
const VERSION: u8 = 1;
/// magic + version + registration count
const HEADER_LEN: usize = 4 + 1 + 8;

/// File-backed registration store.
///
/// # File Format
///
/// ```text
/// magic (4 bytes): "MUNR"
/// version (1 byte): 1
/// count (8 bytes, LE): number of registrations
/// body (variable): JSON-encoded StoreSnapshot
/// ```
pub struct FileStore {
    /// Path to the snapshot file
    path: PathBuf,
    /// In-memory storage
    memory: MemoryStore,
    /// Whether there are unsaved changes
    dirty: AtomicBool,
    /// Save once this many writes have accumulated (0 = after every write)
    auto_save_threshold: u64,
    /// Writes since last save
    writes_since_save: AtomicU64,
    /// Serializes writers of the snapshot file
    save_lock: Mutex<()>,
}

impl FileStore {
    /// Opens the store at the given path.
    ///
    /// If the file exists it is loaded; otherwise the store starts empty and
    /// the file is created on the first save.
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
            memory: MemoryStore::new(),
            dirty: AtomicBool::new(false),
            auto_save_threshold: 0,
            writes_since_save: AtomicU64::new(0),
            save_lock: Mutex::new(()),
        };

        if fs::try_exists(&store.path).await? {
            store.load().await?;
        }

        Ok(store)
    }

    /// Opens the store, saving only after `threshold` additional writes.
    pub async fn with_auto_save(path: impl AsRef<Path>, threshold: u64) -> Result<Self> {
        let mut store = Self::new(path).await?;
        store.auto_save_threshold = threshold;
        Ok(store)
    }

    /// Loads the snapshot file.
    #[instrument(skip(self))]
    async fn load(&self) -> Result<()> {
        let contents = fs::read(&self.path).await.map_err(|e| {
            MunregError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to open data file: {}", e),
            ))
        })?;

        let snapshot = decode(&contents)?;
        info!(
            count = snapshot.registrations.len(),
            path = ?self.path,
            "Loading registrations from file"
        );

        self.memory.restore(snapshot)?;
        self.dirty.store(false, Ordering::SeqCst);
        debug!("Store loaded successfully");

        Ok(())
    }

    /// Writes the snapshot file.
    #[instrument(skip(self))]
    pub async fn save(&self) -> Result<()> {
        let _guard = self.save_lock.lock().await;

        // Cleared before snapshotting so writes racing with this save stay dirty.
        self.dirty.store(false, Ordering::SeqCst);
        self.writes_since_save.store(0, Ordering::SeqCst);

        let snapshot = self.memory.snapshot();
        info!(count = snapshot.registrations.len(), path = ?self.path, "Saving store to file");
        let contents = encode(&snapshot)?;

        // Write atomically (write to temp, then rename)
        let temp_path = self.path.with_extension("tmp");
        let result = async {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(&contents).await?;
            file.sync_all().await?;
            fs::rename(&temp_path, &self.path).await
        }
        .await;

        if let Err(e) = result {
            self.dirty.store(true, Ordering::SeqCst);
            return Err(e.into());
        }

        debug!("Store saved successfully");
        Ok(())
    }

    /// Checks if there are unsaved changes.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    /// Returns the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the underlying memory store for direct access.
    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    /// Returns the number of registrations.
    pub fn len(&self) -> usize {
        self.memory.len()
    }

    /// Returns true if empty.
    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }

    /// Marks the store dirty and saves once the threshold is reached.
    ///
    /// If that save fails, `undo` reverts the in-memory write so a failed
    /// call leaves nothing behind for a later save to pick up.
    async fn record_write(&self, undo: impl FnOnce(&MemoryStore) + Send) -> Result<()> {
        self.dirty.store(true, Ordering::SeqCst);
        let writes = self.writes_since_save.fetch_add(1, Ordering::SeqCst);
        if writes >= self.auto_save_threshold {
            if let Err(e) = self.save().await {
                warn!(error = %e, path = ?self.path, "Save failed, reverting write");
                undo(&self.memory);
                return Err(e);
            }
        }
        Ok(())
    }
}

impl Drop for FileStore {
    fn drop(&mut self) {
        // Saving needs the runtime, so only report it here
        if self.is_dirty() {
            warn!(path = ?self.path, "FileStore dropped with unsaved changes");
        }
    }
}

fn encode(snapshot: &StoreSnapshot) -> Result<Vec<u8>> {
    let body = serde_json::to_vec(snapshot)?;
    let count = snapshot.registrations.len() as u64;

    let mut contents = Vec::with_capacity(HEADER_LEN + body.len());
    contents.extend_from_slice(MAGIC);
    contents.push(VERSION);
    contents.extend_from_slice(&count.to_le_bytes());
    contents.extend_from_slice(&body);
    Ok(contents)
}

fn decode(contents: &[u8]) -> Result<StoreSnapshot> {
    if contents.len() < HEADER_LEN {
        return Err(MunregError::Store("Data file too short".into()));
    }

    if &contents[0..4] != MAGIC {
        return Err(MunregError::Store("Invalid magic bytes".into()));
    }

    let version = contents[4];
    if version != VERSION {
        return Err(MunregError::VersionMismatch {
            expected: VERSION,
            actual: version,
        });
    }

    let mut count_bytes = [0u8; 8];
    count_bytes.copy_from_slice(&contents[5..HEADER_LEN]);
    let count = u64::from_le_bytes(count_bytes);

    let snapshot: StoreSnapshot = serde_json::from_slice(&contents[HEADER_LEN..])
        .map_err(|e| MunregError::Store(format!("Corrupt data file: {}", e)))?;

    if snapshot.registrations.len() as u64 != count {
        return Err(MunregError::Store(format!(
            "Header declares {} registrations, body holds {}",
            count,
            snapshot.registrations.len()
        )));
    }

    Ok(snapshot)
}

#[async_trait]
impl RegistrationStore for FileStore {
    async fn create_registration(&self, registration: NewRegistration) -> Result<Registration> {
        let created = self.memory.create_registration(registration).await?;
        let id = created.id;
        self.record_write(move |memory| {
            memory.take_registration(id);
        })
        .await?;
        Ok(created)
    }

    async fn get_registrations(&self) -> Result<Vec<Registration>> {
        self.memory.get_registrations().await
    }

    async fn get_registration(&self, id: u64) -> Result<Option<Registration>> {
        self.memory.get_registration(id).await
    }

    async fn update_registration(
        &self,
        id: u64,
        patch: RegistrationPatch,
    ) -> Result<Option<Registration>> {
        let Some(previous) = self.memory.get_registration(id).await? else {
            return Ok(None);
        };
        let updated = self.memory.update_registration(id, patch).await?;
        if updated.is_some() {
            self.record_write(move |memory| {
                memory.import(vec![previous]);
            })
            .await?;
        }
        Ok(updated)
    }

    async fn delete_registration(&self, id: u64) -> Result<bool> {
        let Some(removed) = self.memory.take_registration(id) else {
            return Ok(false);
        };
        self.record_write(move |memory| {
            memory.import(vec![removed]);
        })
        .await?;
        Ok(true)
    }

    async fn search_registrations(&self, query: &str) -> Result<Vec<Registration>> {
        self.memory.search_registrations(query).await
    }

    async fn filter_registrations(&self, filter: &RegistrationFilter) -> Result<Vec<Registration>> {
        self.memory.filter_registrations(filter).await
    }

    async fn count(&self) -> Result<u64> {
        self.memory.count().await
    }

    async fn flush(&self) -> Result<()> {
        if self.is_dirty() {
            self.save().await?;
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for FileStore {
    async fn get_user(&self, id: u64) -> Result<Option<User>> {
        self.memory.get_user(id).await
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.memory.get_user_by_username(username).await
    }

    async fn create_user(&self, user: NewUser) -> Result<User> {
        let created = self.memory.create_user(user).await?;
        let id = created.id;
        self.record_write(move |memory| {
            memory.take_user(id);
        })
        .await?;
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use munreg_core::types::{Experience, RegistrationStatus};
    use tempfile::tempdir;

    fn make_registration(committee: &str) -> NewRegistration {
        NewRegistration {
            first_name: "Ana".into(),
            last_name: "Lee".into(),
            email: String::new(),
            phone: None,
            school: "Springfield High".into(),
            grade: "11".into(),
            experience: Some(Experience::Intermediate),
            position: "delegate".into(),
            committees: vec![committee.into()],
            dietary: None,
            accommodation: None,
            suggestions: None,
            terms: false,
            newsletter: true,
        }
    }

    #[tokio::test]
    async fn test_new_empty_store() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("registrations.munr");

        let store = FileStore::new(&path).await.unwrap();
        assert!(store.is_empty());
        assert!(!path.exists()); // File not created until first write
    }

    #[tokio::test]
    async fn test_every_write_saved_by_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("registrations.munr");

        {
            let store = FileStore::new(&path).await.unwrap();
            store.create_registration(make_registration("UNSC")).await.unwrap();
            store.create_registration(make_registration("WHO")).await.unwrap();
            assert!(!store.is_dirty());
        }

        let store = FileStore::new(&path).await.unwrap();
        assert_eq!(store.len(), 2);
        let who = store
            .filter_registrations(&RegistrationFilter::committee("WHO"))
            .await
            .unwrap();
        assert_eq!(who.len(), 1);
        assert_eq!(who[0].id, 2);
    }

    #[tokio::test]
    async fn test_ids_survive_restart() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("registrations.munr");

        {
            let store = FileStore::new(&path).await.unwrap();
            store.create_registration(make_registration("UNSC")).await.unwrap();
            store.create_registration(make_registration("UNSC")).await.unwrap();
            assert!(store.delete_registration(2).await.unwrap());
        }

        let store = FileStore::new(&path).await.unwrap();
        let created = store.create_registration(make_registration("UNSC")).await.unwrap();
        assert_eq!(created.id, 3);
    }

    #[tokio::test]
    async fn test_update_persisted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("registrations.munr");

        {
            let store = FileStore::new(&path).await.unwrap();
            store.create_registration(make_registration("UNSC")).await.unwrap();
            store
                .update_registration(1, RegistrationPatch::status(RegistrationStatus::Confirmed))
                .await
                .unwrap();
        }

        let store = FileStore::new(&path).await.unwrap();
        let reg = store.get_registration(1).await.unwrap().unwrap();
        assert_eq!(reg.status, RegistrationStatus::Confirmed);
        assert!(reg.newsletter);
    }

    #[tokio::test]
    async fn test_misses_do_not_dirty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("registrations.munr");

        let store = FileStore::with_auto_save(&path, 10).await.unwrap();
        assert!(!store.delete_registration(1).await.unwrap());
        assert!(store
            .update_registration(1, RegistrationPatch::default())
            .await
            .unwrap()
            .is_none());
        assert!(!store.is_dirty());
    }

    #[tokio::test]
    async fn test_auto_save_threshold() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("registrations.munr");

        // Saves when writes_since_save reaches 2, i.e. on the 3rd write
        let store = FileStore::with_auto_save(&path, 2).await.unwrap();

        store.create_registration(make_registration("UNSC")).await.unwrap();
        store.create_registration(make_registration("UNSC")).await.unwrap();
        assert!(store.is_dirty());
        assert!(!path.exists());

        store.create_registration(make_registration("UNSC")).await.unwrap();
        assert!(!store.is_dirty());

        let reopened = FileStore::new(&path).await.unwrap();
        assert_eq!(reopened.len(), 3);
    }

    #[tokio::test]
    async fn test_flush() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("registrations.munr");

        let store = FileStore::with_auto_save(&path, 100).await.unwrap();
        store.create_registration(make_registration("UNSC")).await.unwrap();
        assert!(store.is_dirty());

        store.flush().await.unwrap();
        assert!(!store.is_dirty());
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_users_persisted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("registrations.munr");

        {
            let store = FileStore::new(&path).await.unwrap();
            store.create_user(NewUser::new("admin", "secret")).await.unwrap();
        }

        let store = FileStore::new(&path).await.unwrap();
        let user = store.get_user_by_username("admin").await.unwrap().unwrap();
        assert_eq!(user.id, 1);
        assert_eq!(store.get_user(1).await.unwrap().unwrap(), user);
    }

    #[tokio::test]
    async fn test_invalid_file_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("registrations.munr");

        fs::write(&path, b"invalid data").await.unwrap();

        let result = FileStore::new(&path).await;
        assert!(matches!(result, Err(MunregError::Store(_))));
    }

    #[tokio::test]
    async fn test_version_mismatch_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("registrations.munr");

        let mut contents = encode(&StoreSnapshot::default()).unwrap();
        contents[4] = VERSION + 1;
        fs::write(&path, contents).await.unwrap();

        let result = FileStore::new(&path).await;
        assert!(matches!(result, Err(MunregError::VersionMismatch { .. })));
    }

    #[tokio::test]
    async fn test_count_mismatch_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("registrations.munr");

        let mut contents = encode(&StoreSnapshot::default()).unwrap();
        contents[5] = 3;
        fs::write(&path, contents).await.unwrap();

        assert!(FileStore::new(&path).await.is_err());
    }

    #[tokio::test]
    async fn test_failed_create_is_reverted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("registrations.munr");

        let store = FileStore::new(&path).await.unwrap();
        assert!(store.create_registration(make_registration("UNSC")).await.is_err());
        assert_eq!(store.count().await.unwrap(), 0);
        assert!(store.get_registrations().await.unwrap().is_empty());

        assert!(store.create_user(NewUser::new("admin", "secret")).await.is_err());
        assert!(store.get_user_by_username("admin").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_update_restores_previous() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("registrations.munr");

        // First write stays in memory, the second one triggers a save
        let store = FileStore::with_auto_save(&path, 1).await.unwrap();
        store.create_registration(make_registration("UNSC")).await.unwrap();

        let result = store
            .update_registration(1, RegistrationPatch::status(RegistrationStatus::Confirmed))
            .await;
        assert!(result.is_err());

        let reg = store.get_registration(1).await.unwrap().unwrap();
        assert_eq!(reg.status, RegistrationStatus::Pending);
    }

    #[tokio::test]
    async fn test_failed_delete_restores_record() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("registrations.munr");

        let store = FileStore::with_auto_save(&path, 1).await.unwrap();
        let created = store.create_registration(make_registration("WHO")).await.unwrap();

        assert!(store.delete_registration(created.id).await.is_err());
        assert_eq!(store.get_registration(created.id).await.unwrap(), Some(created));
    }

    #[tokio::test]
    async fn test_atomic_save() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("registrations.munr");
        let temp_path = path.with_extension("tmp");

        let store = FileStore::new(&path).await.unwrap();
        store.create_registration(make_registration("UNSC")).await.unwrap();

        // Temp file should not exist after save
        assert!(!temp_path.exists());
        assert!(path.exists());
    }
}
