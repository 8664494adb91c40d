use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tracker_core::{DomainError, Entity};

use crate::CustomerId;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleId(Uuid);

impl VehicleId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for VehicleId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for VehicleId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl core::str::FromStr for VehicleId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| DomainError::invalid_id(format!("VehicleId: {e}")))
    }
}

/// Registration plates are stored trimmed and upper-cased.
pub fn normalize_plate(raw: &str) -> String {
    raw.trim().to_uppercase()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    pub customer_id: CustomerId,
    pub plate_number: String,
    pub make: Option<String>,
    pub model: Option<String>,
    pub vehicle_type: Option<String>,
}

impl Vehicle {
    pub fn new(customer_id: CustomerId, plate: &str, make: Option<String>, model: Option<String>) -> Self {
        Self {
            id: VehicleId::new(),
            customer_id,
            plate_number: normalize_plate(plate),
            make,
            model,
            vehicle_type: None,
        }
    }

    pub fn has_plate(&self, plate: &str) -> bool {
        self.plate_number.eq_ignore_ascii_case(plate.trim())
    }
}

impl Entity for Vehicle {
    type Id = VehicleId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
