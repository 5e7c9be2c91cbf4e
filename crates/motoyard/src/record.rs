//! Vehicle records and the containers they are persisted in.
//!
//! A storage key holds either one record object or an array of them. Both
//! are loaded into a [`Container`], an ordered sequence of raw JSON entries
//! that remembers its [`Shape`] so writes go back in the form they came.
//! Entries are decoded into [`VehicleRecord`] only when needed, which keeps
//! untouched entries exactly as they were stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Normalize a plate for comparison: strip all whitespace and uppercase.
#[must_use]
pub fn normalize_plate(plate: &str) -> String {
    plate
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// One motorcycle in the yard.
///
/// Field names on disk follow the historical layout. Unknown fields are kept
/// in `extra` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleRecord {
    /// License plate as entered.
    #[serde(rename = "placa", default, deserialize_with = "text")]
    pub plate: String,

    /// Model name.
    #[serde(
        rename = "modelo",
        default,
        deserialize_with = "optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub model: Option<String>,

    /// Chassis number.
    #[serde(
        rename = "chassi",
        default,
        deserialize_with = "optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub chassis_number: Option<String>,

    /// Manufacture year, free-form.
    #[serde(
        rename = "anoFabricacao",
        default,
        deserialize_with = "optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub manufacture_year: Option<String>,

    /// Mechanical condition description.
    #[serde(
        rename = "condicaoMecanica",
        default,
        deserialize_with = "optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub mechanical_condition: Option<String>,

    /// Operational status, free-form.
    #[serde(
        rename = "statusOperacional",
        default,
        deserialize_with = "optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub operational_status: Option<String>,

    /// Associated beacon code. Blank on disk loads as `None`; `None` is
    /// written as an empty string.
    #[serde(
        rename = "codigoBeacon",
        default,
        deserialize_with = "optional_text",
        serialize_with = "none_as_blank"
    )]
    pub beacon: Option<String>,

    /// Older beacon marker. Read on load, never written.
    #[serde(rename = "beaconId", default, skip_serializing)]
    pub legacy_beacon_id: Option<Value>,

    /// Diagnostic note attached to a maintenance status.
    #[serde(
        rename = "diagnostico",
        default,
        deserialize_with = "optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub diagnostic: Option<String>,

    /// When the status was last saved.
    #[serde(
        rename = "ultimaAtualizacao",
        default,
        deserialize_with = "optional_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,

    /// Fields this crate does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VehicleRecord {
    /// Create an empty record for the given plate, normalizing it.
    #[must_use]
    pub fn new(plate: &str) -> Self {
        Self {
            plate: normalize_plate(plate),
            model: None,
            chassis_number: None,
            manufacture_year: None,
            mechanical_condition: None,
            operational_status: None,
            beacon: None,
            legacy_beacon_id: None,
            diagnostic: None,
            updated_at: None,
            extra: Map::new(),
        }
    }

    /// Decode a stored JSON value.
    ///
    /// A string or numeric legacy beacon id is adopted as the canonical
    /// beacon code when the canonical field is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a JSON object.
    pub fn from_value(value: &Value) -> Result<Self> {
        let mut record: Self = Self::deserialize(value)?;
        if record.beacon.is_none() {
            record.beacon = record.legacy_beacon_id.as_ref().and_then(value_as_text);
        }
        Ok(record)
    }

    /// Encode for storage. The legacy beacon id is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// The record's plate, normalized.
    #[must_use]
    pub fn normalized_plate(&self) -> String {
        normalize_plate(&self.plate)
    }

    /// Check whether this record matches a plate, ignoring case and whitespace.
    #[must_use]
    pub fn matches_plate(&self, plate: &str) -> bool {
        self.normalized_plate() == normalize_plate(plate)
    }

    /// The beacon identifier, if any.
    #[must_use]
    pub fn beacon_code(&self) -> Option<&str> {
        self.beacon.as_deref()
    }

    /// A record has a beacon if its code is non-blank or the legacy id is truthy.
    #[must_use]
    pub fn has_beacon(&self) -> bool {
        self.beacon.as_deref().is_some_and(|c| !c.trim().is_empty())
            || self.legacy_beacon_id.as_ref().is_some_and(is_truthy)
    }

}

/// Stored name of the beacon code.
pub(crate) const BEACON_FIELD: &str = "codigoBeacon";
/// Stored name of the older beacon marker.
pub(crate) const LEGACY_BEACON_FIELD: &str = "beaconId";
/// Stored name of the operational status.
pub(crate) const STATUS_FIELD: &str = "statusOperacional";
/// Stored name of the diagnostic note.
pub(crate) const DIAGNOSTIC_FIELD: &str = "diagnostico";
/// Stored name of the last status save.
pub(crate) const UPDATED_AT_FIELD: &str = "ultimaAtualizacao";

/// Replace the beacon fields of a stored entry in place.
///
/// A blank or absent code is written as `""`. The legacy marker is dropped
/// either way; every other key keeps its stored value and position.
pub(crate) fn write_beacon(entry: &mut Map<String, Value>, code: Option<&str>) {
    let code = code.map(str::trim).unwrap_or_default();
    entry.insert(BEACON_FIELD.to_string(), Value::String(code.to_string()));
    entry.shift_remove(LEGACY_BEACON_FIELD);
}

/// How a key's value was laid out on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// A single record object.
    Object,
    /// An array of records.
    Array,
}

/// The records stored under one key, in stored order.
#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    /// Layout to restore on write.
    pub shape: Shape,
    /// Raw entries.
    pub entries: Vec<Value>,
}

impl Container {
    /// Parse the raw text stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedStorage`] if the text is not JSON, or is
    /// JSON but neither an object nor an array.
    pub fn parse(key: &str, raw: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(raw).map_err(|e| Error::malformed(key, e.to_string()))?;
        match value {
            Value::Object(_) => Ok(Self {
                shape: Shape::Object,
                entries: vec![value],
            }),
            Value::Array(entries) => Ok(Self {
                shape: Shape::Array,
                entries,
            }),
            other => Err(Error::malformed(
                key,
                format!("expected object or array, found {}", json_kind(&other)),
            )),
        }
    }

    /// Create an array-shaped container.
    #[must_use]
    pub fn array(entries: Vec<Value>) -> Self {
        Self {
            shape: Shape::Array,
            entries,
        }
    }

    /// Iterate over the entries that decode as records, with their index.
    pub fn records(&self) -> impl Iterator<Item = (usize, VehicleRecord)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, v)| VehicleRecord::from_value(v).ok().map(|r| (i, r)))
    }

    /// Index of the first entry matching the plate.
    #[must_use]
    pub fn position(&self, plate: &str) -> Option<usize> {
        let wanted = normalize_plate(plate);
        self.records()
            .find(|(_, r)| r.normalized_plate() == wanted)
            .map(|(i, _)| i)
    }

    /// Serialize back to text in the original shape.
    ///
    /// An object-shaped container that no longer holds exactly one entry is
    /// written as an array so nothing is lost.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        let text = match (self.shape, self.entries.as_slice()) {
            (Shape::Object, [single]) => serde_json::to_string(single)?,
            _ => serde_json::to_string(&self.entries)?,
        };
        Ok(text)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Loose truthiness used by the legacy beacon marker.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Strings and numbers as trimmed text; blanks and everything else as `None`.
fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(optional_text(deserializer)?.unwrap_or_default())
}

fn optional_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_as_text))
}

fn optional_timestamp<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer).unwrap_or(None);
    Ok(value
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc)))
}

fn none_as_blank<S>(value: &Option<String>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(value.as_deref().unwrap_or(""))
}
