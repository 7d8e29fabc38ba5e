//! Record store: the persisted JSON document holding patients and deliveries.
//!
//! The service never touches the filesystem directly. It works against the
//! [`RecordStore`] trait, so the JSON file can be swapped for the in-memory
//! store in tests or for a real database later.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

use crate::models::{Delivery, DeliveryStatus, Patient};

pub mod json_file;
pub mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed data file {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize records: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Patients,
    Deliveries,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Patients => "patients",
            Collection::Deliveries => "deliveries",
        }
    }
}

/// Last ID handed out per collection. Persisted so IDs survive restarts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    #[serde(default)]
    pub patients: u64,
    #[serde(default)]
    pub deliveries: u64,
}

/// The whole on-disk document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Database {
    #[serde(default)]
    pub patients: Vec<Patient>,
    #[serde(default)]
    pub deliveries: Vec<Delivery>,
    #[serde(default)]
    pub counters: Counters,
}

impl Database {
    /// Current maximum ID in `collection` plus one.
    ///
    /// The persisted counter is folded in so an ID is never handed out twice,
    /// even if records were removed from the file by hand.
    pub fn next_id(&self, collection: Collection) -> u64 {
        let (counter, max_id) = match collection {
            Collection::Patients => (
                self.counters.patients,
                self.patients.iter().map(|p| p.id).max().unwrap_or(0),
            ),
            Collection::Deliveries => (
                self.counters.deliveries,
                self.deliveries.iter().map(|d| d.id).max().unwrap_or(0),
            ),
        };
        counter.max(max_id) + 1
    }

    /// Record `id` as handed out for `collection`
    pub fn claim_id(&mut self, collection: Collection, id: u64) {
        let counter = match collection {
            Collection::Patients => &mut self.counters.patients,
            Collection::Deliveries => &mut self.counters.deliveries,
        };
        *counter = (*counter).max(id);
    }

    pub fn patient(&self, id: u64) -> Option<&Patient> {
        self.patients.iter().find(|p| p.id == id)
    }

    pub fn delivery(&self, id: u64) -> Option<&Delivery> {
        self.deliveries.iter().find(|d| d.id == id)
    }

    pub fn delivery_mut(&mut self, id: u64) -> Option<&mut Delivery> {
        self.deliveries.iter_mut().find(|d| d.id == id)
    }

    pub fn summary(&self) -> RecordSummary {
        let mut deliveries_by_status: BTreeMap<String, usize> = DeliveryStatus::ALL
            .iter()
            .map(|s| (s.as_str().to_string(), 0))
            .collect();
        for delivery in &self.deliveries {
            *deliveries_by_status.entry(delivery.status.as_str().to_string()).or_default() += 1;
        }

        RecordSummary {
            patients: self.patients.len(),
            deliveries: self.deliveries.len(),
            deliveries_by_status,
            counters: self.counters,
        }
    }
}

/// Record counts, reported by `/health` and `medadmin inspect`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordSummary {
    pub patients: usize,
    pub deliveries: usize,
    pub deliveries_by_status: BTreeMap<String, usize>,
    pub counters: Counters,
}

/// Persistence backend for the [`Database`] document.
///
/// `load` is called once when the service starts; `save` after every
/// mutation and must replace the previous document atomically.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn load(&self) -> Result<Database, StorageError>;

    async fn save(&self, database: &Database) -> Result<(), StorageError>;

    /// Human-readable location, used in logs
    fn describe(&self) -> String;
}
