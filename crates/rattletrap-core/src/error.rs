//! Errors raised by the runtime: bad data, unknown handles, save files.

use std::fmt;

/// Result type for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    /// Failure inside the vehicle core (unknown part, bad record).
    Logic(rattletrap_logic::Error),
    Io(std::io::Error),
    Bincode(Box<bincode::ErrorKind>),
    Json(serde_json::Error),
    VersionMismatch { expected: u32, found: u32 },
    /// No prototype with this id was loaded.
    UnknownPrototype { id: String },
    /// The handle does not name a live vehicle.
    NoSuchVehicle(hecs::Entity),
    /// A rack refused the vehicle.
    Rack(rattletrap_logic::rack::RackRefusal),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Logic(e) => write!(f, "{e}"),
            Error::Io(e) => write!(f, "IO error: {e}"),
            Error::Bincode(e) => write!(f, "Serialization error: {e}"),
            Error::Json(e) => write!(f, "JSON error: {e}"),
            Error::VersionMismatch { expected, found } => {
                write!(f, "Save version mismatch: expected {expected}, found {found}")
            }
            Error::UnknownPrototype { id } => write!(f, "unknown vehicle prototype '{id}'"),
            Error::NoSuchVehicle(e) => write!(f, "no vehicle with handle {e:?}"),
            Error::Rack(r) => write!(f, "{r}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Logic(e) => Some(e),
            Error::Io(e) => Some(e),
            Error::Bincode(e) => Some(e),
            Error::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<rattletrap_logic::Error> for Error {
    fn from(e: rattletrap_logic::Error) -> Self {
        Error::Logic(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<Box<bincode::ErrorKind>> for Error {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        Error::Bincode(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}

impl From<rattletrap_logic::rack::RackRefusal> for Error {
    fn from(r: rattletrap_logic::rack::RackRefusal) -> Self {
        Error::Rack(r)
    }
}
