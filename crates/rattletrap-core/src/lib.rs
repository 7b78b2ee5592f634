//! Rattletrap Core - vehicle runtime
//!
//! Owns what the pure vehicle logic leaves out: the collection of vehicles
//! on the map, the map itself, the turn loop and save files.
//!
//! # Architecture
//!
//! - **Registry**: every vehicle is a `hecs` entity holding one
//!   [`Vehicle`](rattletrap_logic::Vehicle) component. Entities are the
//!   stable handles used by cable traversal and by callers.
//! - **Grid**: a sparse tile map implementing the vehicle core's world
//!   traits.
//! - **Engine**: runs power, fuel, compaction and splitting each turn.
//!
//! # Example
//!
//! ```rust,no_run
//! use rattletrap_core::prelude::*;
//!
//! let parts = std::fs::read_to_string("data/vehicle_parts.json").unwrap();
//! let vehicles = std::fs::read_to_string("data/vehicles.json").unwrap();
//! let mut engine = SimulationEngine::from_data(&parts, &vehicles, EngineConfig::default()).unwrap();
//!
//! let car = engine.spawn_vehicle("car", Tripoint::new(0, 0, 0), 0).unwrap();
//! engine.start_engines(car).unwrap();
//! loop {
//!     engine.update();
//! }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod grid;
pub mod persistence;
pub mod registry;

#[cfg(test)]
mod test_support;

pub use error::{Error, Result};

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::config::EngineConfig;
    pub use crate::engine::{SimulationEngine, TurnReport};
    pub use crate::grid::TileGrid;
    pub use crate::registry::VehicleMap;
    pub use rattletrap_logic::{Point, Tripoint, Vehicle};
}
