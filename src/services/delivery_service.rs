use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::models::patient::non_blank;
use crate::models::{Delivery, DeliveryStatus, DeliveryUpdate, NewDelivery, NewPatient, Patient};
use crate::store::{Collection, Database, RecordStore, RecordSummary, StorageError};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u64 },

    #[error("{message}")]
    Validation {
        message: String,
        field_errors: BTreeMap<String, String>,
    },

    #[error("{message}")]
    Conflict { field: String, message: String },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ServiceError {
    fn not_found(entity: &'static str, id: u64) -> Self {
        ServiceError::NotFound { entity, id }
    }

    /// Validation failure on a single field
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut field_errors = BTreeMap::new();
        field_errors.insert(field.to_string(), message.clone());
        ServiceError::Validation { message, field_errors }
    }
}

/// Optional filters for [`DeliveryService::list_deliveries`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryFilter {
    pub status: Option<DeliveryStatus>,
    pub patient_id: Option<u64>,
}

impl DeliveryFilter {
    fn matches(&self, delivery: &Delivery) -> bool {
        self.status.map_or(true, |s| delivery.status == s)
            && self.patient_id.map_or(true, |p| delivery.patient_id == p)
    }
}

/// Patient and delivery operations over a [`RecordStore`].
///
/// The document is kept in memory. Every mutation holds the write lock while
/// it edits a copy, persists the copy, and swaps it in; a failed save leaves
/// the in-memory view untouched.
pub struct DeliveryService {
    store: Arc<dyn RecordStore>,
    records: RwLock<Database>,
}

impl DeliveryService {
    /// Load the current document from `store`
    pub async fn open(store: Arc<dyn RecordStore>) -> Result<Self, StorageError> {
        let records = store.load().await?;
        tracing::info!(
            "Loaded {} patients and {} deliveries from {}",
            records.patients.len(),
            records.deliveries.len(),
            store.describe()
        );
        Ok(Self {
            store,
            records: RwLock::new(records),
        })
    }

    async fn mutate<T>(&self, apply: impl FnOnce(&mut Database) -> Result<T, ServiceError>) -> Result<T, ServiceError> {
        let mut current = self.records.write().await;
        let mut draft = current.clone();
        let out = apply(&mut draft)?;

        if let Err(e) = self.store.save(&draft).await {
            tracing::error!("Failed to persist records to {}: {}", self.store.describe(), e);
            return Err(e.into());
        }

        *current = draft;
        Ok(out)
    }

    pub async fn create_patient(&self, fields: NewPatient) -> Result<Patient, ServiceError> {
        let fields = fields.normalized();
        if fields.name.is_empty() {
            return Err(ServiceError::invalid("name", "name must not be empty"));
        }

        self.mutate(|db| {
            if let Some(card) = &fields.health_card_number {
                if db.patients.iter().any(|p| p.health_card_number.as_ref() == Some(card)) {
                    return Err(ServiceError::Conflict {
                        field: "health_card_number".to_string(),
                        message: format!("a patient with health card number '{}' already exists", card),
                    });
                }
            }

            let id = db.next_id(Collection::Patients);
            let patient = Patient {
                id,
                name: fields.name,
                health_card_number: fields.health_card_number,
                address: fields.address,
                created_at: Utc::now(),
            };
            db.patients.push(patient.clone());
            db.claim_id(Collection::Patients, id);
            tracing::debug!("Assigned {} id {}", Collection::Patients.as_str(), id);
            Ok(patient)
        })
        .await
    }

    pub async fn list_patients(&self) -> Vec<Patient> {
        self.records.read().await.patients.clone()
    }

    pub async fn get_patient(&self, id: u64) -> Result<Patient, ServiceError> {
        self.records
            .read()
            .await
            .patient(id)
            .cloned()
            .ok_or_else(|| ServiceError::not_found("patient", id))
    }

    pub async fn create_delivery(&self, fields: NewDelivery) -> Result<Delivery, ServiceError> {
        self.mutate(|db| {
            if db.patient(fields.patient_id).is_none() {
                return Err(ServiceError::not_found("patient", fields.patient_id));
            }

            let id = db.next_id(Collection::Deliveries);
            let now = Utc::now();
            let delivery = Delivery {
                id,
                patient_id: fields.patient_id,
                status: DeliveryStatus::Pending,
                invoice_number: None,
                emission_date: None,
                delivery_date: None,
                created_at: now,
                updated_at: now,
            };
            db.deliveries.push(delivery.clone());
            db.claim_id(Collection::Deliveries, id);
            tracing::debug!("Assigned {} id {}", Collection::Deliveries.as_str(), id);
            Ok(delivery)
        })
        .await
    }

    pub async fn get_delivery(&self, id: u64) -> Result<Delivery, ServiceError> {
        self.records
            .read()
            .await
            .delivery(id)
            .cloned()
            .ok_or_else(|| ServiceError::not_found("delivery", id))
    }

    /// Move a delivery forward in its lifecycle.
    ///
    /// Reaching `delivered` requires both invoice fields; supplying them for
    /// any other target status is rejected.
    pub async fn update_delivery(&self, id: u64, update: DeliveryUpdate) -> Result<Delivery, ServiceError> {
        let invoice_number = non_blank(update.invoice_number);
        let emission_date = update.emission_date;
        let next = update.status;

        self.mutate(|db| {
            let delivery = db
                .delivery_mut(id)
                .ok_or_else(|| ServiceError::not_found("delivery", id))?;

            let current = delivery.status;
            if current.is_terminal() {
                return Err(ServiceError::invalid(
                    "status",
                    format!("delivery {} is already {} and can no longer change", id, current),
                ));
            }
            if !current.can_transition_to(next) {
                return Err(ServiceError::invalid(
                    "status",
                    format!("cannot change status from {} to {}", current, next),
                ));
            }

            let now = Utc::now();
            if next == DeliveryStatus::Delivered {
                let mut field_errors = BTreeMap::new();
                if invoice_number.is_none() {
                    field_errors.insert("invoice_number".to_string(), "required when status is delivered".to_string());
                }
                if emission_date.is_none() {
                    field_errors.insert("emission_date".to_string(), "required when status is delivered".to_string());
                }
                if !field_errors.is_empty() {
                    return Err(ServiceError::Validation {
                        message: "invoice_number and emission_date are required to mark a delivery as delivered"
                            .to_string(),
                        field_errors,
                    });
                }

                delivery.invoice_number = invoice_number;
                delivery.emission_date = emission_date;
                delivery.delivery_date = Some(now);
            } else if invoice_number.is_some() || emission_date.is_some() {
                let field = if invoice_number.is_some() { "invoice_number" } else { "emission_date" };
                return Err(ServiceError::invalid(
                    field,
                    "invoice fields can only be set when status is delivered",
                ));
            }

            delivery.status = next;
            delivery.updated_at = now;
            Ok(delivery.clone())
        })
        .await
    }

    /// All deliveries in creation order, optionally filtered
    pub async fn list_deliveries(&self, filter: DeliveryFilter) -> Vec<Delivery> {
        self.records
            .read()
            .await
            .deliveries
            .iter()
            .filter(|d| filter.matches(d))
            .cloned()
            .collect()
    }

    pub async fn summary(&self) -> RecordSummary {
        self.records.read().await.summary()
    }
}
