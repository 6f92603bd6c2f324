use chrono::{DateTime, NaiveDate, Utc};
use gatepass_core::{ScanDirection, VisitorStatus};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{StorageError, StorageResult};

/// Pre-registered visitor.
///
/// `id_number` and `access_code` are unique and matched case-insensitively.
/// Only the status and the check-in/out times change after registration.
///
/// # Examples
///
/// ```
/// use gatepass_core::VisitorStatus;
/// use gatepass_storage::models::Visitor;
///
/// let visitor = Visitor::new("Jane Doe")
///     .with_id_number("8001015009087")
///     .with_access_code("VIS-2041");
///
/// assert_eq!(visitor.visitor_status().unwrap(), VisitorStatus::Pending);
/// assert!(!visitor.is_on_site());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Visitor {
    pub id: String,
    pub full_name: String,
    pub id_number: Option<String>,
    pub access_code: Option<String>,
    pub host_resident_id: Option<String>,

    /// Stored as text; use [`Visitor::visitor_status`] for the typed value.
    pub status: String,

    pub visit_date: Option<NaiveDate>,
    pub check_in_time: Option<DateTime<Utc>>,
    pub check_out_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Visitor {
    pub fn new(full_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            full_name: full_name.into(),
            id_number: None,
            access_code: None,
            host_resident_id: None,
            status: VisitorStatus::Pending.as_str().to_string(),
            visit_date: None,
            check_in_time: None,
            check_out_time: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_id_number(mut self, id_number: impl Into<String>) -> Self {
        self.id_number = Some(id_number.into().trim().to_ascii_uppercase());
        self
    }

    pub fn with_access_code(mut self, access_code: impl Into<String>) -> Self {
        self.access_code = Some(access_code.into().trim().to_ascii_uppercase());
        self
    }

    pub fn with_host(mut self, resident_id: impl Into<String>) -> Self {
        self.host_resident_id = Some(resident_id.into());
        self
    }

    pub fn with_status(mut self, status: VisitorStatus) -> Self {
        self.status = status.as_str().to_string();
        self
    }

    pub fn with_visit_date(mut self, date: NaiveDate) -> Self {
        self.visit_date = Some(date);
        self
    }

    /// Typed status.
    ///
    /// # Errors
    ///
    /// `StorageError::Validation` if the stored text is not a known status.
    pub fn visitor_status(&self) -> StorageResult<VisitorStatus> {
        VisitorStatus::from_str(&self.status).map_err(StorageError::from)
    }

    /// Checked in and not yet checked out.
    pub fn is_on_site(&self) -> bool {
        self.check_in_time.is_some() && self.check_out_time.is_none()
    }
}

/// Status change written during check-in or check-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: VisitorStatus,
    pub check_in_time: Option<DateTime<Utc>>,
    pub check_out_time: Option<DateTime<Utc>>,
}

impl StatusUpdate {
    /// `Active` with `check_in_time` set.
    pub fn check_in(at: DateTime<Utc>) -> Self {
        Self {
            status: VisitorStatus::Active,
            check_in_time: Some(at),
            check_out_time: None,
        }
    }

    /// `Completed` with `check_out_time` set.
    pub fn check_out(at: DateTime<Utc>) -> Self {
        Self {
            status: VisitorStatus::Completed,
            check_in_time: None,
            check_out_time: Some(at),
        }
    }

    /// Check-in for ingress, check-out for egress.
    pub fn for_direction(direction: ScanDirection, at: DateTime<Utc>) -> Self {
        match direction {
            ScanDirection::Ingress => Self::check_in(at),
            ScanDirection::Egress => Self::check_out(at),
        }
    }
}
