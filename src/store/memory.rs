use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::{Database, RecordStore, StorageError};

/// In-process store for tests. Can be told to fail writes to exercise the
/// storage error path.
#[derive(Debug, Default)]
pub struct MemoryStore {
    document: Mutex<Database>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(database: Database) -> Self {
        Self {
            document: Mutex::new(database),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// What was last saved
    pub fn snapshot(&self) -> Database {
        self.document
            .lock()
            .map(|db| db.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn load(&self) -> Result<Database, StorageError> {
        self.document
            .lock()
            .map(|db| db.clone())
            .map_err(|_| StorageError::Unavailable("memory store lock poisoned".to_string()))
    }

    async fn save(&self, database: &Database) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("writes disabled".to_string()));
        }
        let mut document = self
            .document
            .lock()
            .map_err(|_| StorageError::Unavailable("memory store lock poisoned".to_string()))?;
        *document = database.clone();
        Ok(())
    }

    fn describe(&self) -> String {
        "in-memory store".to_string()
    }
}
