use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A patient receiving medicine deliveries. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub id: u64,
    pub name: String,
    /// Health card ("carteirinha") number, unique among patients when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_card_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Client-supplied fields for a new patient
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewPatient {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub health_card_number: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl NewPatient {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Trim every field and drop optional fields that end up empty
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            health_card_number: non_blank(self.health_card_number),
            address: non_blank(self.address),
        }
    }
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
