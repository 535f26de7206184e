use std::path::PathBuf;

use thiserror::Error;

use crate::validators::ValidationError;

/// Stable machine-readable error codes recorded in structured logs
pub mod error_codes {
    // Sample decoding errors
    pub const DECODE_ERROR: &str = "DECODE_ERROR";

    // Link errors
    pub const DEVICE_NOT_FOUND: &str = "DEVICE_NOT_FOUND";
    pub const CONNECTION_ERROR: &str = "CONNECTION_ERROR";

    // Record store errors
    pub const PERSISTENCE_ERROR: &str = "PERSISTENCE_ERROR";
    pub const CONFIGURATION_ERROR: &str = "CONFIGURATION_ERROR";

    // Notification errors
    pub const DELIVERY_ERROR: &str = "DELIVERY_ERROR";
}

/// Errors decoding a sensor notification payload
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Payload has {actual} bytes, expected {expected}")]
    UnexpectedLength { expected: usize, actual: usize },

    #[error("Payload decodes to a non-finite value")]
    NonFinite,
}

/// Filesystem-level errors from the plant record store
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Failed to create data directory {}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read record for subject {subject_id}")]
    Read {
        subject_id: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write record for subject {subject_id}")]
    Write {
        subject_id: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize record for subject {subject_id}")]
    Serialize {
        subject_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to list records under {}", path.display())]
    List {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors in the content of a stored plant record
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Record for subject {subject_id} is not valid JSON")]
    Malformed {
        subject_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Record for subject {subject_id} failed validation")]
    Invalid {
        subject_id: String,
        #[source]
        source: ValidationError,
    },
}

/// Main error type for record store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

impl StoreError {
    /// Stable error code for structured logging
    pub fn error_code(&self) -> &'static str {
        match self {
            StoreError::Persistence(_) => error_codes::PERSISTENCE_ERROR,
            StoreError::Configuration(_) => error_codes::CONFIGURATION_ERROR,
        }
    }
}

/// Errors pushing a notification to a subject
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("Notification transport failed: {0}")]
    Transport(String),

    #[error("Notification rejected with status {status}")]
    Rejected { status: u16 },
}
