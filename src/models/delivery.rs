use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Lifecycle of a delivery.
///
/// ```text
/// pending ──▶ in_transit ──▶ delivered
///    │             │
///    └──▶ cancelled ◀┘
/// ```
///
/// `delivered` and `cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    InTransit,
    Delivered,
    Cancelled,
}

impl DeliveryStatus {
    pub const ALL: [DeliveryStatus; 4] = [
        DeliveryStatus::Pending,
        DeliveryStatus::InTransit,
        DeliveryStatus::Delivered,
        DeliveryStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "pending",
            DeliveryStatus::InTransit => "in_transit",
            DeliveryStatus::Delivered => "delivered",
            DeliveryStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DeliveryStatus::Delivered | DeliveryStatus::Cancelled)
    }

    /// Whether moving from `self` to `next` is a forward transition
    pub fn can_transition_to(&self, next: DeliveryStatus) -> bool {
        use DeliveryStatus::*;
        matches!(
            (self, next),
            (Pending, InTransit) | (Pending, Cancelled) | (InTransit, Delivered) | (InTransit, Cancelled)
        )
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown status '{0}' (expected one of: pending, in_transit, delivered, cancelled)")]
pub struct UnknownStatus(pub String);

impl FromStr for DeliveryStatus {
    type Err = UnknownStatus;

    /// Accepts the canonical snake_case names plus the spellings the legacy
    /// clients sent ("Pending", "In Progress", ...)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match key.as_str() {
            "pending" => Ok(DeliveryStatus::Pending),
            "in_transit" | "in_progress" => Ok(DeliveryStatus::InTransit),
            "delivered" => Ok(DeliveryStatus::Delivered),
            "cancelled" | "canceled" => Ok(DeliveryStatus::Cancelled),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    pub id: u64,
    pub patient_id: u64,
    pub status: DeliveryStatus,
    #[serde(default)]
    pub invoice_number: Option<String>,
    #[serde(default)]
    pub emission_date: Option<NaiveDate>,
    /// Stamped when the delivery reaches `delivered`
    #[serde(default)]
    pub delivery_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct NewDelivery {
    pub patient_id: u64,
}

/// Status change requested for an existing delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryUpdate {
    pub status: DeliveryStatus,
    pub invoice_number: Option<String>,
    pub emission_date: Option<NaiveDate>,
}

impl DeliveryUpdate {
    pub fn status(status: DeliveryStatus) -> Self {
        Self {
            status,
            invoice_number: None,
            emission_date: None,
        }
    }

    pub fn delivered(invoice_number: impl Into<String>, emission_date: NaiveDate) -> Self {
        Self {
            status: DeliveryStatus::Delivered,
            invoice_number: Some(invoice_number.into()),
            emission_date: Some(emission_date),
        }
    }
}
