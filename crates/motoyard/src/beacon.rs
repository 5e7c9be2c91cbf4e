//! Beacon association and removal.
//!
//! [`set_beacon`] is the raw mutator: it rewrites the resolved record and
//! persists the whole container back under its original key and shape.
//! [`associate`] and [`disassociate`] are the operator actions built on top;
//! they apply the guards that must hold before any storage write.

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::record::{normalize_plate, write_beacon, Container, VehicleRecord};
use crate::resolver::{resolve_by_plate, Resolved};
use crate::store::KeyValueStore;

/// Set or clear the beacon of a resolved record and persist it.
///
/// Only the beacon keys of the matching entry change; its other keys keep
/// their stored values. In an array, every entry whose plate matches the
/// resolved plate is rewritten and all other entries are written back exactly
/// as loaded. A blank or absent `code` clears the beacon. Calling this twice
/// with the same code leaves the same stored state.
///
/// Returns the record as written.
///
/// # Errors
///
/// Returns an error if the write fails.
pub async fn set_beacon(
    store: &dyn KeyValueStore,
    resolved: &Resolved,
    code: Option<&str>,
) -> Result<VehicleRecord> {
    let plate = resolved.record.normalized_plate();
    let container = rewrite_matching(&resolved.container, &plate, |entry| {
        write_beacon(entry, code);
    });

    store.set(&resolved.key, &container.to_json()?).await?;

    let written = written_record(&container, resolved.index)?;
    info!(
        key = %resolved.key,
        plate = %plate,
        beacon = written.beacon_code().unwrap_or(""),
        "Beacon updated"
    );
    Ok(written)
}

/// Apply `update` to the stored object of every entry whose plate equals
/// `plate`.
///
/// Non-matching entries are cloned untouched.
pub(crate) fn rewrite_matching<F>(container: &Container, plate: &str, update: F) -> Container
where
    F: Fn(&mut Map<String, Value>),
{
    let entries = container
        .entries
        .iter()
        .map(|entry| {
            let matches =
                VehicleRecord::from_value(entry).is_ok_and(|r| r.normalized_plate() == plate);
            match entry {
                Value::Object(map) if matches => {
                    let mut map = map.clone();
                    update(&mut map);
                    Value::Object(map)
                }
                _ => entry.clone(),
            }
        })
        .collect();

    Container {
        shape: container.shape,
        entries,
    }
}

/// Decode the entry at `index` after a rewrite.
pub(crate) fn written_record(container: &Container, index: usize) -> Result<VehicleRecord> {
    let entry = container
        .entries
        .get(index)
        .ok_or_else(|| Error::internal(format!("rewritten entry {index} out of range")))?;
    VehicleRecord::from_value(entry)
}

/// Associate `code` with the vehicle registered under `plate`.
///
/// # Errors
///
/// - [`Error::Validation`] if `code` is blank (no storage access).
/// - [`Error::NotFound`] if no candidate key holds the plate.
/// - [`Error::BeaconAlreadyAssociated`] if a different beacon is stored.
/// - Storage errors from the write.
pub async fn associate<S>(
    store: &dyn KeyValueStore,
    candidate_keys: &[S],
    plate: &str,
    code: &str,
) -> Result<VehicleRecord>
where
    S: AsRef<str> + Sync,
{
    let code = code.trim();
    if code.is_empty() {
        return Err(Error::validation("Enter the beacon code to associate."));
    }

    let resolved = resolve_by_plate(store, candidate_keys, plate)
        .await
        .ok_or_else(|| Error::not_found(normalize_plate(plate)))?;

    match resolved.record.beacon_code() {
        Some(current) if current == code => {
            debug!(plate = %resolved.record.plate, "Beacon already associated, nothing to write");
            return Ok(resolved.record);
        }
        Some(current) => {
            return Err(Error::BeaconAlreadyAssociated {
                plate: resolved.record.normalized_plate(),
                current: current.to_string(),
            });
        }
        None if resolved.record.has_beacon() => {
            return Err(Error::BeaconAlreadyAssociated {
                plate: resolved.record.normalized_plate(),
                current: String::new(),
            });
        }
        None => {}
    }

    set_beacon(store, &resolved, Some(code)).await
}

/// Remove the beacon from the vehicle registered under `plate`.
///
/// # Errors
///
/// - [`Error::NotFound`] if no candidate key holds the plate.
/// - [`Error::NoBeaconAssociated`] if the record has neither a beacon code
///   nor a legacy id; nothing is written.
/// - Storage errors from the write.
pub async fn disassociate<S>(
    store: &dyn KeyValueStore,
    candidate_keys: &[S],
    plate: &str,
) -> Result<VehicleRecord>
where
    S: AsRef<str> + Sync,
{
    let resolved = resolve_by_plate(store, candidate_keys, plate)
        .await
        .ok_or_else(|| Error::not_found(normalize_plate(plate)))?;

    if !resolved.record.has_beacon() {
        return Err(Error::NoBeaconAssociated {
            plate: resolved.record.normalized_plate(),
        });
    }

    set_beacon(store, &resolved, None).await
}
