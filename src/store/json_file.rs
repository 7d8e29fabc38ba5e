use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use super::{Database, RecordStore, StorageError};

/// Stores the whole [`Database`] as one pretty-printed JSON file.
///
/// Saves go through a sibling temp file that is fsynced and renamed over the
/// target, so readers see either the old document or the new one.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "records.json".to_string());
        self.path
            .with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4().simple()))
    }

    async fn write_and_sync(&self, path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
        let mut file = tokio::fs::File::create(path)
            .await
            .map_err(|e| self.io_error(e))?;
        file.write_all(bytes).await.map_err(|e| self.io_error(e))?;
        file.sync_all().await.map_err(|e| self.io_error(e))?;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for JsonFileStore {
    async fn load(&self) -> Result<Database, StorageError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!("Data file {} not found, starting with an empty store", self.path.display());
                return Ok(Database::default());
            }
            Err(e) => return Err(self.io_error(e)),
        };

        if contents.trim().is_empty() {
            return Ok(Database::default());
        }

        serde_json::from_str(&contents).map_err(|source| StorageError::Malformed {
            path: self.path.clone(),
            source,
        })
    }

    async fn save(&self, database: &Database) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec_pretty(database)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        let temp = self.temp_path();
        if let Err(e) = self.write_and_sync(&temp, &bytes).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e);
        }

        if let Err(e) = tokio::fs::rename(&temp, &self.path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(self.io_error(e));
        }

        tracing::debug!(
            "Saved {} patients and {} deliveries to {}",
            database.patients.len(),
            database.deliveries.len(),
            self.path.display()
        );
        Ok(())
    }

    fn describe(&self) -> String {
        format!("json file {}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Patient;
    use crate::store::Collection;
    use chrono::Utc;

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("medicine-delivery-store-{}", Uuid::new_v4().simple()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn missing_file_loads_as_empty() {
        let dir = scratch_dir();
        let store = JsonFileStore::new(dir.join("absent.json"));

        let db = store.load().await.unwrap();
        assert_eq!(db, Database::default());
    }

    #[tokio::test]
    async fn save_then_load_returns_same_document() {
        let dir = scratch_dir();
        let store = JsonFileStore::new(dir.join("deliveries.json"));

        let mut db = Database::default();
        db.patients.push(Patient {
            id: 1,
            name: "Ana".to_string(),
            health_card_number: Some("HC-1".to_string()),
            address: None,
            created_at: Utc::now(),
        });
        db.claim_id(Collection::Patients, 1);

        store.save(&db).await.unwrap();
        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, db);
    }

    #[tokio::test]
    async fn save_leaves_no_temp_files_behind() {
        let dir = scratch_dir();
        let store = JsonFileStore::new(dir.join("deliveries.json"));

        store.save(&Database::default()).await.unwrap();
        store.save(&Database::default()).await.unwrap();

        let names: Vec<String> = std::fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["deliveries.json".to_string()]);
    }

    #[tokio::test]
    async fn malformed_file_is_a_storage_error() {
        let dir = scratch_dir();
        let path = dir.join("deliveries.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = JsonFileStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, StorageError::Malformed { .. }), "got {:?}", err);
    }

    #[tokio::test]
    async fn unwritable_target_is_a_storage_error() {
        let dir = scratch_dir();
        // The target path is an existing directory, so the rename must fail
        let target = dir.join("taken");
        std::fs::create_dir_all(target.join("child")).unwrap();

        let err = JsonFileStore::new(&target).save(&Database::default()).await.unwrap_err();
        assert!(matches!(err, StorageError::Io { .. }), "got {:?}", err);
    }
}
