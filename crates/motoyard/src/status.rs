//! Operational status transitions.
//!
//! Any status may follow any other. A status whose text contains one of the
//! configured maintenance keywords needs a diagnostic note; for every other
//! status the note is cleared. Validation happens before storage is touched.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use tracing::info;

use crate::beacon::{rewrite_matching, written_record};
use crate::error::{Error, Result};
use crate::record::{
    normalize_plate, VehicleRecord, DIAGNOSTIC_FIELD, STATUS_FIELD, UPDATED_AT_FIELD,
};
use crate::resolver::resolve_by_plate;
use crate::store::KeyValueStore;

/// A requested status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    /// Destination status.
    pub status: String,
    /// Diagnostic note, required for maintenance statuses.
    pub diagnostic: Option<String>,
}

impl StatusChange {
    /// Create a status change.
    #[must_use]
    pub fn new(status: impl Into<String>, diagnostic: Option<String>) -> Self {
        Self {
            status: status.into(),
            diagnostic,
        }
    }

    /// Whether the destination status names a maintenance condition.
    #[must_use]
    pub fn is_maintenance<K: AsRef<str>>(&self, keywords: &[K]) -> bool {
        is_maintenance_status(&self.status, keywords)
    }

    /// Check the change and return the diagnostic to store.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for a blank status, or for a maintenance
    /// status without a diagnostic.
    pub fn validate<K: AsRef<str>>(&self, keywords: &[K]) -> Result<Option<String>> {
        if self.status.trim().is_empty() {
            return Err(Error::validation("Select the new operational status."));
        }

        if !self.is_maintenance(keywords) {
            return Ok(None);
        }

        match self.diagnostic.as_deref().map(str::trim) {
            Some(note) if !note.is_empty() => Ok(Some(note.to_string())),
            _ => Err(Error::validation(
                "A diagnostic is required for maintenance statuses.",
            )),
        }
    }
}

/// Case-insensitive keyword match on the status text.
#[must_use]
pub fn is_maintenance_status<K: AsRef<str>>(status: &str, keywords: &[K]) -> bool {
    let status = status.to_lowercase();
    keywords
        .iter()
        .map(|k| k.as_ref().trim().to_lowercase())
        .any(|k| !k.is_empty() && status.contains(&k))
}

/// Change the operational status of the vehicle registered under `plate`.
///
/// Only the status, diagnostic and last-update keys of the stored entry are
/// written; beacon fields and everything else keep their stored values.
/// `now` is stamped as the record's last update.
///
/// # Errors
///
/// - [`Error::Validation`] from [`StatusChange::validate`], before any read.
/// - [`Error::NotFound`] if no candidate key holds the plate.
/// - Storage errors from the write.
pub async fn update_status<S, K>(
    store: &dyn KeyValueStore,
    candidate_keys: &[S],
    plate: &str,
    change: &StatusChange,
    keywords: &[K],
    now: DateTime<Utc>,
) -> Result<VehicleRecord>
where
    S: AsRef<str> + Sync,
    K: AsRef<str> + Sync,
{
    let diagnostic = change.validate(keywords)?;
    let status = change.status.trim().to_string();

    let resolved = resolve_by_plate(store, candidate_keys, plate)
        .await
        .ok_or_else(|| Error::not_found(normalize_plate(plate)))?;

    let stamp = now.to_rfc3339_opts(SecondsFormat::AutoSi, true);
    let normalized = resolved.record.normalized_plate();
    let container = rewrite_matching(&resolved.container, &normalized, |entry| {
        entry.insert(STATUS_FIELD.to_string(), Value::String(status.clone()));
        match &diagnostic {
            Some(note) => {
                entry.insert(DIAGNOSTIC_FIELD.to_string(), Value::String(note.clone()));
            }
            None => {
                entry.shift_remove(DIAGNOSTIC_FIELD);
            }
        }
        entry.insert(UPDATED_AT_FIELD.to_string(), Value::String(stamp.clone()));
    });
    store.set(&resolved.key, &container.to_json()?).await?;

    let written = written_record(&container, resolved.index)?;
    info!(
        key = %resolved.key,
        plate = %normalized,
        status = %status,
        "Status updated"
    );
    Ok(written)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::{json, Value};

    use super::*;
    use crate::store::MemoryStore;

    const KEYS: [&str; 2] = ["dadosMoto", "motos"];
    const KEYWORDS: [&str; 2] = ["manuten", "maintenance"];

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap()
    }

    #[test]
    fn test_is_maintenance_status() {
        assert!(is_maintenance_status("Em manutenção", &KEYWORDS));
        assert!(is_maintenance_status("MANUTENCAO", &KEYWORDS));
        assert!(is_maintenance_status("Under maintenance", &KEYWORDS));
        assert!(!is_maintenance_status("Disponível", &KEYWORDS));
        assert!(!is_maintenance_status("Em uso", &[""]));
    }

    #[test]
    fn test_validate_non_maintenance_clears_diagnostic() {
        let change = StatusChange::new("Disponível", Some("old note".to_string()));
        assert_eq!(change.validate(&KEYWORDS).unwrap(), None);
    }

    #[test]
    fn test_validate_maintenance_requires_diagnostic() {
        for diagnostic in [None, Some(String::new()), Some("   ".to_string())] {
            let change = StatusChange::new("Em manutenção", diagnostic);
            assert!(change.validate(&KEYWORDS).unwrap_err().is_validation());
        }
    }

    #[test]
    fn test_validate_maintenance_trims_diagnostic() {
        let change = StatusChange::new("Em manutenção", Some("  freio traseiro ".to_string()));
        assert_eq!(
            change.validate(&KEYWORDS).unwrap().as_deref(),
            Some("freio traseiro")
        );
    }

    #[test]
    fn test_validate_blank_status() {
        let change = StatusChange::new("  ", None);
        assert!(change.validate(&KEYWORDS).is_err());
    }

    #[tokio::test]
    async fn test_update_status_stamps_time() {
        let store = MemoryStore::with_entries([(
            "dadosMoto",
            r#"{"placa":"ABC1234","statusOperacional":"Disponível"}"#,
        )]);
        let change = StatusChange::new("Em manutenção", Some("pneu furado".to_string()));

        let written = update_status(&store, &KEYS, "abc1234", &change, &KEYWORDS, fixed_now())
            .await
            .unwrap();
        assert_eq!(written.operational_status.as_deref(), Some("Em manutenção"));
        assert_eq!(written.updated_at, Some(fixed_now()));

        let stored: Value =
            serde_json::from_str(&store.get("dadosMoto").await.unwrap().unwrap()).unwrap();
        assert_eq!(stored["statusOperacional"], "Em manutenção");
        assert_eq!(stored["diagnostico"], "pneu furado");
        assert_eq!(stored["ultimaAtualizacao"], "2024-05-01T12:30:00Z");
    }

    #[tokio::test]
    async fn test_update_status_clears_diagnostic() {
        let store = MemoryStore::with_entries([(
            "motos",
            r#"[{"placa":"ABC1234","statusOperacional":"Em manutenção","diagnostico":"freio"}]"#,
        )]);
        let change = StatusChange::new("Disponível", None);

        update_status(&store, &KEYS, "ABC1234", &change, &KEYWORDS, fixed_now())
            .await
            .unwrap();

        let stored: Value =
            serde_json::from_str(&store.get("motos").await.unwrap().unwrap()).unwrap();
        assert!(stored[0].get("diagnostico").is_none());
        assert_eq!(stored[0]["statusOperacional"], "Disponível");
    }

    #[tokio::test]
    async fn test_update_status_keeps_legacy_beacon() {
        let store = MemoryStore::with_entries([("dadosMoto", r#"{"placa":"ABC1234","beaconId":true}"#)]);
        let change = StatusChange::new("Disponível", None);

        let written = update_status(&store, &KEYS, "ABC1234", &change, &KEYWORDS, fixed_now())
            .await
            .unwrap();
        assert!(written.has_beacon());

        let again = resolve_by_plate(&store, &KEYS, "ABC1234").await.unwrap();
        assert!(again.record.has_beacon());

        let stored: Value =
            serde_json::from_str(&store.get("dadosMoto").await.unwrap().unwrap()).unwrap();
        assert_eq!(stored["beaconId"], true);
        assert!(stored.get("codigoBeacon").is_none());
    }

    #[tokio::test]
    async fn test_update_status_keeps_stored_field_values() {
        let store = MemoryStore::with_entries([(
            "motos",
            r#"[{"placa":"ABC1234","anoFabricacao":2022,"modelo":"","condicaoMecanica":null,"codigoBeacon":" B1 "}]"#,
        )]);
        let change = StatusChange::new("Em manutenção", Some("corrente".to_string()));

        update_status(&store, &KEYS, "ABC1234", &change, &KEYWORDS, fixed_now())
            .await
            .unwrap();

        let stored: Value =
            serde_json::from_str(&store.get("motos").await.unwrap().unwrap()).unwrap();
        assert_eq!(
            stored,
            json!([{
                "placa": "ABC1234",
                "anoFabricacao": 2022,
                "modelo": "",
                "condicaoMecanica": null,
                "codigoBeacon": " B1 ",
                "statusOperacional": "Em manutenção",
                "diagnostico": "corrente",
                "ultimaAtualizacao": "2024-05-01T12:30:00Z"
            }])
        );
    }

    #[tokio::test]
    async fn test_update_status_replaces_epoch_timestamp() {
        let store = MemoryStore::with_entries([(
            "dadosMoto",
            r#"{"placa":"ABC1234","ultimaAtualizacao":1715000000000}"#,
        )]);
        let change = StatusChange::new("Em uso", None);

        let written = update_status(&store, &KEYS, "ABC1234", &change, &KEYWORDS, fixed_now())
            .await
            .unwrap();
        assert_eq!(written.updated_at, Some(fixed_now()));
    }

    #[tokio::test]
    async fn test_update_status_rejected_before_write() {
        let raw = r#"{"placa":"ABC1234","statusOperacional":"Disponível"}"#;
        let store = MemoryStore::with_entries([("dadosMoto", raw)]);
        let change = StatusChange::new("Em manutenção", Some(String::new()));

        let err = update_status(&store, &KEYS, "ABC1234", &change, &KEYWORDS, fixed_now())
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(store.get("dadosMoto").await.unwrap().unwrap(), raw);
    }

    #[tokio::test]
    async fn test_update_status_not_found() {
        let store = MemoryStore::new();
        let change = StatusChange::new("Disponível", None);

        let err = update_status(&store, &KEYS, "ABC1234", &change, &KEYWORDS, fixed_now())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_update_status_leaves_other_entries() {
        let original = json!([
            {"placa": "AAA1111", "statusOperacional": "Em uso"},
            {"placa": "ABC1234", "statusOperacional": "Em uso"}
        ]);
        let store = MemoryStore::with_entries([("motos", original.to_string())]);
        let change = StatusChange::new("Disponível", None);

        update_status(&store, &KEYS, "ABC1234", &change, &KEYWORDS, fixed_now())
            .await
            .unwrap();

        let stored: Value =
            serde_json::from_str(&store.get("motos").await.unwrap().unwrap()).unwrap();
        assert_eq!(stored[0], original[0]);
        assert_eq!(stored[1]["statusOperacional"], "Disponível");
    }
}
