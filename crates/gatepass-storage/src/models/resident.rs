use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Estate resident.
///
/// Residents are read-only from the scanner's point of view; they appear in
/// scan results as the owner of a registered vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Resident {
    pub id: String,
    pub full_name: String,
    pub unit_number: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Resident {
    /// New resident with a generated id.
    pub fn new(full_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            full_name: full_name.into(),
            unit_number: None,
            phone: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_unit_number(mut self, unit_number: impl Into<String>) -> Self {
        self.unit_number = Some(unit_number.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }
}
