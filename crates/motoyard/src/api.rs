//! Request body of the remote motorcycles resource.
//!
//! The remote API takes `model` and `operationalStatus` as integer codes.
//! Only the payload is built here; sending it is up to the caller.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::record::VehicleRecord;

/// Motorcycle model codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelCode {
    /// Mottu Sport 110i.
    MottuSport = 0,
    /// Mottu-E (electric).
    MottuE = 1,
    /// Honda Pop 110i.
    HondaPop = 2,
}

/// Operational status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// Ready to be rented.
    Available = 0,
    /// Out with a rider.
    InUse = 1,
    /// In the workshop.
    Maintenance = 2,
    /// Blocked for any other reason.
    Unavailable = 3,
}

/// Lowercase, drop everything but letters and digits, fold Portuguese accents.
fn fold(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' => 'a',
            'é' | 'ê' => 'e',
            'í' => 'i',
            'ó' | 'ô' | 'õ' => 'o',
            'ú' => 'u',
            'ç' => 'c',
            other => other,
        })
        .filter(char::is_ascii_alphanumeric)
        .collect()
}

impl ModelCode {
    /// Map a free-form model name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let folded = fold(name);
        if folded.contains("sport") {
            Some(Self::MottuSport)
        } else if folded == "mottue" || folded.starts_with("mottue") || folded == "e" {
            Some(Self::MottuE)
        } else if folded.contains("pop") {
            Some(Self::HondaPop)
        } else {
            None
        }
    }
}

impl StatusCode {
    /// Map a free-form status.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let folded = fold(name);
        if folded.contains("manuten") || folded.contains("maintenance") {
            Some(Self::Maintenance)
        } else if folded.starts_with("indisponivel") || folded == "unavailable" {
            Some(Self::Unavailable)
        } else if folded.starts_with("disponivel") || folded == "available" {
            Some(Self::Available)
        } else if folded.contains("emuso") || folded.contains("alugad") || folded == "inuse" {
            Some(Self::InUse)
        } else {
            None
        }
    }
}

/// Body for `POST`/`PUT` on the motorcycles resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MotorcyclePayload {
    /// Normalized plate.
    pub license_plate: String,
    /// [`ModelCode`] as integer.
    pub model: i32,
    /// Chassis number.
    pub chassis_number: String,
    /// [`StatusCode`] as integer.
    pub operational_status: i32,
    /// Mechanical condition.
    pub mechanical_condition: String,
    /// Parking lot the vehicle belongs to.
    pub parking_id: i64,
}

impl MotorcyclePayload {
    /// Build the payload for a stored record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the record's model or status has no
    /// code.
    pub fn from_record(record: &VehicleRecord, parking_id: i64) -> Result<Self> {
        let model_name = record.model.as_deref().unwrap_or_default();
        let model = ModelCode::from_name(model_name)
            .ok_or_else(|| Error::validation(format!("unknown model: {model_name:?}")))?;

        let status_name = record.operational_status.as_deref().unwrap_or_default();
        let status = StatusCode::from_name(status_name)
            .ok_or_else(|| Error::validation(format!("unknown status: {status_name:?}")))?;

        Ok(Self {
            license_plate: record.normalized_plate(),
            model: model as i32,
            chassis_number: record.chassis_number.clone().unwrap_or_default(),
            operational_status: status as i32,
            mechanical_condition: record.mechanical_condition.clone().unwrap_or_default(),
            parking_id,
        })
    }
}
