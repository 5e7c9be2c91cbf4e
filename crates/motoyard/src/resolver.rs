//! Plate lookup across candidate storage keys.
//!
//! Keys are scanned in the order given; within an array, entries are scanned
//! in stored order. The first match wins. Absent keys, read failures and
//! malformed values are all treated as "not at this key" and the scan moves
//! on, so only exhausting every key yields `None`.

use tracing::{debug, warn};

use crate::error::Result;
use crate::record::{normalize_plate, Container, Shape, VehicleRecord};
use crate::store::KeyValueStore;

/// A record located in storage, with enough context to write it back.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    /// Key the record was found under.
    pub key: String,
    /// Position of the record in `container.entries`.
    pub index: usize,
    /// The decoded record.
    pub record: VehicleRecord,
    /// Everything stored under `key`, in its original shape.
    pub container: Container,
}

impl Resolved {
    /// Whether the record came from an array-shaped key.
    #[must_use]
    pub fn is_array(&self) -> bool {
        self.container.shape == Shape::Array
    }
}

/// A record seen while listing, tagged with its key.
#[derive(Debug, Clone, PartialEq)]
pub struct Located {
    /// Key the record was found under.
    pub key: String,
    /// Position within the key's container.
    pub index: usize,
    /// The decoded record.
    pub record: VehicleRecord,
}

/// Load and parse the container stored under `key`.
///
/// Returns `Ok(None)` for an absent key.
///
/// # Errors
///
/// Returns an error if the read fails or the value is malformed.
pub async fn load_container(store: &dyn KeyValueStore, key: &str) -> Result<Option<Container>> {
    match store.get(key).await? {
        Some(raw) => Container::parse(key, &raw).map(Some),
        None => Ok(None),
    }
}

/// Like [`load_container`], but logs and swallows failures.
async fn load_lenient(store: &dyn KeyValueStore, key: &str) -> Option<Container> {
    match load_container(store, key).await {
        Ok(Some(container)) => Some(container),
        Ok(None) => {
            debug!(key, "No value stored");
            None
        }
        Err(e) => {
            warn!(key, error = %e, "Skipping unreadable key");
            None
        }
    }
}

/// Find the first record whose plate matches `plate`.
///
/// `plate` is compared after stripping whitespace and uppercasing.
pub async fn resolve_by_plate<S>(
    store: &dyn KeyValueStore,
    candidate_keys: &[S],
    plate: &str,
) -> Option<Resolved>
where
    S: AsRef<str> + Sync,
{
    let wanted = normalize_plate(plate);
    if wanted.is_empty() {
        return None;
    }

    for key in candidate_keys {
        let key = key.as_ref();
        let Some(container) = load_lenient(store, key).await else {
            continue;
        };

        let hit = container
            .records()
            .find(|(_, record)| record.normalized_plate() == wanted);

        if let Some((index, record)) = hit {
            debug!(key, index, plate = %wanted, "Resolved vehicle");
            return Some(Resolved {
                key: key.to_string(),
                index,
                record,
                container,
            });
        }
        debug!(key, plate = %wanted, "Plate not under key");
    }

    None
}

/// Every decodable record under the candidate keys, in scan order.
///
/// Duplicates across keys are reported as found.
pub async fn list_all<S>(store: &dyn KeyValueStore, candidate_keys: &[S]) -> Vec<Located>
where
    S: AsRef<str> + Sync,
{
    let mut out = Vec::new();
    for key in candidate_keys {
        let key = key.as_ref();
        if let Some(container) = load_lenient(store, key).await {
            out.extend(container.records().map(|(index, record)| Located {
                key: key.to_string(),
                index,
                record,
            }));
        }
    }
    out
}
