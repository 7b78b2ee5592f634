//! Shared fixtures for unit tests.

use std::sync::{Arc, OnceLock};

use rand::rngs::StdRng;
use rand::SeedableRng;
use rattletrap_logic::prototype::{SpawnOptions, VehiclePrototype};
use rattletrap_logic::{PartRegistry, Vehicle};

use crate::config::EngineConfig;
use crate::engine::SimulationEngine;

pub(crate) const PARTS_JSON: &str = include_str!("../../../data/vehicle_parts.json");
pub(crate) const VEHICLES_JSON: &str = include_str!("../../../data/vehicles.json");

pub(crate) fn registry() -> Arc<PartRegistry> {
    static REGISTRY: OnceLock<Arc<PartRegistry>> = OnceLock::new();
    REGISTRY
        .get_or_init(|| Arc::new(PartRegistry::from_json(PARTS_JSON).expect("bundled parts parse")))
        .clone()
}

/// A mint vehicle from the bundled prototypes, at the origin facing east.
pub(crate) fn spawn_proto(id: &str) -> Vehicle {
    let proto = VehiclePrototype::list_from_json(VEHICLES_JSON)
        .expect("bundled prototypes parse")
        .into_iter()
        .find(|p| p.id == id)
        .expect("prototype exists");
    Vehicle::from_prototype(
        registry(),
        &proto,
        SpawnOptions::default(),
        &mut StdRng::seed_from_u64(1),
    )
    .expect("prototype spawns")
}

/// An engine with the bundled data and default config.
pub(crate) fn engine() -> SimulationEngine {
    let mut engine = SimulationEngine::new(registry(), EngineConfig::default());
    engine
        .load_prototypes(VEHICLES_JSON)
        .expect("bundled prototypes parse");
    engine
}
