//! `motoyard` - local record store for a motorcycle yard
//!
//! Vehicle records are kept as JSON text in a key-value store, under a set of
//! keys that grew over time and may hold one record or a list. This library
//! finds records by plate across that layout, associates and removes
//! tracking beacons, and changes operational status, always writing a record
//! back to the key and shape it was read from.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod api;
pub mod beacon;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod record;
pub mod resolver;
pub mod status;
pub mod store;
pub mod yard;

pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use record::{normalize_plate, VehicleRecord};
pub use resolver::{resolve_by_plate, Resolved};
pub use store::{KeyValueStore, MemoryStore, SqliteStore};
