use chrono::{DateTime, Utc};
use gatepass_core::VehicleRegistration;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Resident, Visitor};

/// Vehicle licence disk record, owned by a resident or a visitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct VehicleDisk {
    pub id: String,
    /// Normalised registration (see [`VehicleRegistration`]).
    pub registration: String,
    pub make: Option<String>,
    pub model: Option<String>,
    pub colour: Option<String>,
    pub resident_id: Option<String>,
    pub visitor_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl VehicleDisk {
    fn new(registration: &VehicleRegistration) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            registration: registration.as_str().to_string(),
            make: None,
            model: None,
            colour: None,
            resident_id: None,
            visitor_id: None,
            created_at: Utc::now(),
        }
    }

    /// Disk registered to a resident.
    pub fn for_resident(registration: &VehicleRegistration, resident_id: impl Into<String>) -> Self {
        Self {
            resident_id: Some(resident_id.into()),
            ..Self::new(registration)
        }
    }

    /// Disk registered to a visitor.
    pub fn for_visitor(registration: &VehicleRegistration, visitor_id: impl Into<String>) -> Self {
        Self {
            visitor_id: Some(visitor_id.into()),
            ..Self::new(registration)
        }
    }

    pub fn with_vehicle(
        mut self,
        make: Option<String>,
        model: Option<String>,
        colour: Option<String>,
    ) -> Self {
        self.make = make;
        self.model = model;
        self.colour = colour;
        self
    }

    /// "Make Model", skipping whichever is missing.
    pub fn vehicle_description(&self) -> Option<String> {
        let parts: Vec<&str> = [self.make.as_deref(), self.model.as_deref()]
            .into_iter()
            .flatten()
            .collect();
        (!parts.is_empty()).then(|| parts.join(" "))
    }
}

/// Registry owner of a vehicle registration.
#[derive(Debug, Clone, PartialEq)]
pub enum VehicleMatch {
    Resident { resident: Resident, disk: VehicleDisk },
    Visitor { visitor: Visitor, disk: VehicleDisk },
}

impl VehicleMatch {
    pub fn disk(&self) -> &VehicleDisk {
        match self {
            VehicleMatch::Resident { disk, .. } | VehicleMatch::Visitor { disk, .. } => disk,
        }
    }

    pub fn is_resident(&self) -> bool {
        matches!(self, VehicleMatch::Resident { .. })
    }
}
