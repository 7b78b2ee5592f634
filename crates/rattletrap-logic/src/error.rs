//! Error types for the vehicle core.
//!
//! Only hard failures live here (bad data files, unknown ids in save
//! records). Mount/unmount refusals are ordinary outcomes and are modelled
//! in [`crate::mount`].

use std::fmt;

/// Result type for fallible vehicle-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading or restoring vehicle data.
#[derive(Debug)]
pub enum Error {
    /// A part type id is not present in the registry.
    UnknownPart {
        /// The id that failed to resolve.
        id: String,
    },
    /// A fuel id is not present in the fuel table.
    UnknownFuel {
        /// The id that failed to resolve.
        id: String,
    },
    /// JSON (de)serialization failed.
    Json(serde_json::Error),
    /// Structurally valid input that violates a data rule.
    InvalidData {
        /// Context for where the error occurred.
        context: &'static str,
        /// Description of what was invalid.
        detail: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnknownPart { id } => write!(f, "unknown vehicle part type '{id}'"),
            Error::UnknownFuel { id } => write!(f, "unknown fuel type '{id}'"),
            Error::Json(e) => write!(f, "json error: {e}"),
            Error::InvalidData { context, detail } => write!(f, "invalid {context}: {detail}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}
