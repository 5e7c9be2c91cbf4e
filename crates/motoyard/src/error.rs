//! Error types for motoyard.
//!
//! Every failure an operator or mechanic action can hit is one variant of
//! [`Error`]. The CLI never shows these directly; it maps them to a fixed
//! alert text through [`Error::user_message`].

use std::path::PathBuf;
use thiserror::Error;

/// Alert shown when no record matches the entered plate.
pub const MSG_NOT_FOUND: &str = "Access denied: no motorcycle registered with this plate.";

/// Alert shown when a disassociation is requested for a record without beacon.
pub const MSG_NO_BEACON: &str = "This motorcycle has no beacon associated.";

/// Alert shown when the record already carries a different beacon.
pub const MSG_BEACON_TAKEN: &str = "This motorcycle already has a beacon associated.";

/// Alert shown for any storage, parse or internal failure.
pub const MSG_STORAGE: &str = "Could not access local data. Please try again.";

/// The main error type for motoyard operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    /// The key-value store could not serve a request.
    #[error("storage error: {0}")]
    Storage(String),

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Record Errors ===
    /// No record matches the plate under any candidate key.
    #[error("no vehicle found for plate {plate}")]
    NotFound {
        /// Normalized plate that was searched.
        plate: String,
    },

    /// Input rejected before any storage access.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Disassociation requested for a record that has no beacon.
    #[error("vehicle {plate} has no beacon associated")]
    NoBeaconAssociated {
        /// Normalized plate of the record.
        plate: String,
    },

    /// Association requested for a record already carrying another beacon.
    #[error("vehicle {plate} already has beacon {current}")]
    BeaconAlreadyAssociated {
        /// Normalized plate of the record.
        plate: String,
        /// Beacon code currently stored.
        current: String,
    },

    /// A stored value is not a record or list of records.
    #[error("malformed value under key '{key}': {message}")]
    MalformedStorage {
        /// Storage key holding the value.
        key: String,
        /// What was wrong with it.
        message: String,
    },

    // === I/O Errors ===
    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for motoyard operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new storage error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Create a new validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a not-found error for the given plate.
    #[must_use]
    pub fn not_found(plate: impl Into<String>) -> Self {
        Self::NotFound {
            plate: plate.into(),
        }
    }

    /// Create a malformed storage error.
    #[must_use]
    pub fn malformed(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedStorage {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Check if this error means no record matched.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this error was raised before any storage access.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// The fixed alert text shown to the operator for this error.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound { .. } => MSG_NOT_FOUND.to_string(),
            Self::NoBeaconAssociated { .. } => MSG_NO_BEACON.to_string(),
            Self::BeaconAlreadyAssociated { .. } => MSG_BEACON_TAKEN.to_string(),
            Self::Validation(message) => message.clone(),
            Self::ConfigLoad(_) | Self::ConfigValidation { .. } => self.to_string(),
            _ => MSG_STORAGE.to_string(),
        }
    }
}
