use std::path::PathBuf;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, error};

use crate::error::StoreError;
use crate::store::models::UserRecord;
use crate::Result;

/// Flat-file store holding the whole user collection as a JSON array.
///
/// Every read loads the file fresh; every mutation rewrites it wholesale.
/// Mutations go through [`FileStore::modify`], which holds the store's
/// write lock across the load-modify-save sequence so two in-process
/// writers cannot silently overwrite each other. The save itself writes
/// to a temporary file and renames it over the target, so a crash mid-save
/// leaves the previous contents intact.
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Load the full collection. A missing, unreadable, or malformed file
    /// is reported as [`StoreError::Unreadable`].
    pub async fn load_all(&self) -> Result<Vec<UserRecord>> {
        let bytes = fs::read(&self.path).await.map_err(|e| {
            error!("Failed to read user store {}: {}", self.path.display(), e);
            StoreError::Unreadable(e.to_string())
        })?;

        let records = serde_json::from_slice(&bytes).map_err(|e| {
            error!("User store {} is malformed: {}", self.path.display(), e);
            StoreError::Unreadable(e.to_string())
        })?;

        Ok(records)
    }

    /// Replace the persisted collection with `records`.
    ///
    /// The new contents are written next to the target and renamed over it,
    /// so readers never observe a partially written file.
    pub async fn save_all(&self, records: &[UserRecord]) -> Result<()> {
        let json = serde_json::to_vec_pretty(records)
            .map_err(|e| StoreError::Unwritable(e.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &json).await.map_err(|e| {
            error!("Failed to write user store {}: {}", tmp.display(), e);
            StoreError::Unwritable(e.to_string())
        })?;

        fs::rename(&tmp, &self.path).await.map_err(|e| {
            error!(
                "Failed to commit user store {}: {}",
                self.path.display(),
                e
            );
            StoreError::Unwritable(e.to_string())
        })?;

        debug!(
            "User store {} saved with {} records",
            self.path.display(),
            records.len()
        );
        Ok(())
    }

    /// Run a read-modify-write sequence under the store's write lock.
    ///
    /// The closure receives the freshly loaded collection; if it returns
    /// `Ok`, the modified collection is saved. If it returns `Err`, nothing
    /// is written and the file keeps its previous contents.
    pub async fn modify<T>(
        &self,
        f: impl FnOnce(&mut Vec<UserRecord>) -> Result<T>,
    ) -> Result<T> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load_all().await?;
        let outcome = f(&mut records)?;
        self.save_all(&records).await?;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use uuid::Uuid;

    fn temp_store() -> FileStore {
        let path = std::env::temp_dir().join(format!("userdir-store-{}.json", Uuid::new_v4()));
        FileStore::new(path)
    }

    fn sample_record(email: &str) -> UserRecord {
        UserRecord::new(
            "Test".to_string(),
            email.to_string(),
            "user".to_string(),
            "secret".to_string(),
        )
    }

    #[test_log::test(tokio::test)]
    async fn test_load_missing_file_is_unreadable() {
        let store = temp_store();
        let err = store.load_all().await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Store(StoreError::Unreadable(_))
        ));
    }

    #[test_log::test(tokio::test)]
    async fn test_load_malformed_file_is_unreadable() {
        let store = temp_store();
        std::fs::write(store.path(), b"not json at all").unwrap();

        let err = store.load_all().await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Store(StoreError::Unreadable(_))
        ));
    }

    #[test_log::test(tokio::test)]
    async fn test_save_then_load_returns_saved_records() {
        let store = temp_store();
        let records = vec![sample_record("a@x.com"), sample_record("b@x.com")];

        store.save_all(&records).await.unwrap();
        let loaded = store.load_all().await.unwrap();
        assert_eq!(loaded, records);
    }

    #[test_log::test(tokio::test)]
    async fn test_modify_applies_and_persists() {
        let store = temp_store();
        store.save_all(&[sample_record("a@x.com")]).await.unwrap();

        store
            .modify(|records| {
                records.push(sample_record("b@x.com"));
                Ok(())
            })
            .await
            .unwrap();

        let loaded = store.load_all().await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[1].email, "b@x.com");
    }

    #[test_log::test(tokio::test)]
    async fn test_failed_modify_leaves_file_untouched() {
        let store = temp_store();
        let original = vec![sample_record("a@x.com")];
        store.save_all(&original).await.unwrap();

        let err = store
            .modify(|records| -> Result<()> {
                records.clear();
                Err(AppError::EmailTaken)
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::EmailTaken));

        let loaded = store.load_all().await.unwrap();
        assert_eq!(loaded, original);
    }
}
