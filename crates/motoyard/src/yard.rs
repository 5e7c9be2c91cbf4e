//! Yard entry and removal.

use serde_json::Value;
use tracing::info;

use crate::config::KeyLayout;
use crate::error::{Error, Result};
use crate::record::{
    normalize_plate, write_beacon, Container, Shape, VehicleRecord, BEACON_FIELD,
};
use crate::resolver::{load_container, resolve_by_plate};
use crate::store::KeyValueStore;

/// Register a vehicle entering the yard.
///
/// The record is written as the current vehicle under `layout.single` and
/// upserted by plate into the list under `layout.list`. A list key holding a
/// single object is converted to an array on the way.
///
/// Re-registering a plate merges into the existing list entry: fields set on
/// `record` replace the stored ones, everything else is kept. The stored
/// beacon is only replaced when `record` carries one.
///
/// # Errors
///
/// - [`Error::Validation`] if the plate is blank.
/// - [`Error::MalformedStorage`] if the list key holds something that is not
///   a record or array; it is left untouched.
/// - Storage errors from the reads and writes.
pub async fn register(
    store: &dyn KeyValueStore,
    layout: &KeyLayout,
    mut record: VehicleRecord,
) -> Result<VehicleRecord> {
    record.plate = normalize_plate(&record.plate);
    if record.plate.is_empty() {
        return Err(Error::validation("Enter the plate of the motorcycle."));
    }

    let mut list = load_container(store, &layout.list)
        .await?
        .unwrap_or_else(|| Container::array(Vec::new()));
    list.shape = Shape::Array;

    let incoming = record.to_value()?;
    let entry = match list.position(&record.plate) {
        Some(index) => {
            let merged = merge_entry(&list.entries[index], incoming, record.beacon_code());
            list.entries[index] = merged.clone();
            merged
        }
        None => {
            list.entries.push(incoming.clone());
            incoming
        }
    };

    store.set(&layout.single, &serde_json::to_string(&entry)?).await?;
    store.set(&layout.list, &list.to_json()?).await?;

    let record = VehicleRecord::from_value(&entry)?;
    info!(plate = %record.plate, total = list.entries.len(), "Vehicle registered");
    Ok(record)
}

/// Overlay the keys of `incoming` on a stored entry.
fn merge_entry(existing: &Value, incoming: Value, beacon: Option<&str>) -> Value {
    let (Value::Object(existing), Value::Object(incoming)) = (existing, incoming) else {
        return existing.clone();
    };

    let mut merged = existing.clone();
    for (key, value) in incoming {
        if key != BEACON_FIELD {
            merged.insert(key, value);
        }
    }
    if beacon.is_some() {
        write_beacon(&mut merged, beacon);
    }
    Value::Object(merged)
}

/// Remove the vehicle registered under `plate`.
///
/// Only the first match is removed. An object-shaped key is deleted; an
/// array has the entry taken out and is written back.
///
/// # Errors
///
/// - [`Error::NotFound`] if no candidate key holds the plate.
/// - Storage errors from the write.
pub async fn remove<S>(
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

    match resolved.container.shape {
        Shape::Object => {
            store.remove(&resolved.key).await?;
        }
        Shape::Array => {
            let mut container = resolved.container;
            container.entries.remove(resolved.index);
            store.set(&resolved.key, &container.to_json()?).await?;
        }
    }

    info!(key = %resolved.key, plate = %resolved.record.plate, "Vehicle removed");
    Ok(resolved.record)
}
