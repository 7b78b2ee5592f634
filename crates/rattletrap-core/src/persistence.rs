//! Save/Load system for simulation state
//!
//! Uses bincode for fast binary serialization. Vehicles are stored as
//! [`VehicleRecord`]s and rebuilt against the running engine's part
//! registry on load, so derived indices and caches are never saved.

use std::io::{Read, Write};
use std::sync::Arc;

use rattletrap_logic::power::Ambient;
use rattletrap_logic::save::VehicleRecord;
use rattletrap_logic::world::Item;
use rattletrap_logic::{PartRegistry, Tripoint, Vehicle};
use serde::{Deserialize, Serialize};

use crate::engine::SimulationEngine;
use crate::error::{Error, Result};

/// Current save format version
pub const SAVE_VERSION: u32 = 2;

/// Complete save file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveData {
    pub version: u32,
    pub turn: u64,
    pub sunlight: f64,
    pub wind: f64,
    pub vehicles: Vec<VehicleRecord>,
    /// Ground items per tile
    pub items: Vec<(Tripoint, Vec<Item>)>,
}

impl SaveData {
    /// Snapshot an engine
    pub fn capture(engine: &SimulationEngine) -> Self {
        let mut vehicles = Vec::with_capacity(engine.vehicles.len());
        engine
            .vehicles
            .for_each(|_, v| vehicles.push(VehicleRecord::capture(v)));
        Self {
            version: SAVE_VERSION,
            turn: engine.turn,
            sunlight: engine.ambient.sunlight,
            wind: engine.ambient.wind,
            vehicles,
            items: engine.grid.item_piles(),
        }
    }
}

/// Result of loading a simulation
pub struct LoadedSimulation {
    pub turn: u64,
    pub ambient: Ambient,
    pub vehicles: Vec<Vehicle>,
    pub items: Vec<(Tripoint, Vec<Item>)>,
}

/// Save the complete simulation to a writer
pub fn save_to<W: Write>(writer: W, engine: &SimulationEngine) -> Result<()> {
    let data = SaveData::capture(engine);
    bincode::serialize_into(writer, &data)?;
    log::info!(
        "saved turn {} with {} vehicles",
        data.turn,
        data.vehicles.len()
    );
    Ok(())
}

/// Load a simulation from a reader, resolving parts against `registry`
pub fn load_from<R: Read>(reader: R, registry: &Arc<PartRegistry>) -> Result<LoadedSimulation> {
    let data: SaveData = bincode::deserialize_from(reader)?;

    if data.version != SAVE_VERSION {
        return Err(Error::VersionMismatch {
            expected: SAVE_VERSION,
            found: data.version,
        });
    }

    let vehicles = data
        .vehicles
        .iter()
        .map(|record| Vehicle::restore(registry.clone(), record))
        .collect::<rattletrap_logic::Result<Vec<_>>>()?;

    Ok(LoadedSimulation {
        turn: data.turn,
        ambient: Ambient {
            sunlight: data.sunlight,
            wind: data.wind,
        },
        vehicles,
        items: data.items,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::engine;
    use rattletrap_logic::world::Map;
    use rattletrap_logic::Point;

    #[test]
    fn test_save_load_roundtrip() {
        let mut engine = engine();
        let car = engine
            .spawn_vehicle("car", Tripoint::new(3, 3, 0), 0)
            .unwrap();
        engine
            .spawn_vehicle("bicycle", Tripoint::new(10, 3, 0), 180)
            .unwrap();
        engine.start_engines(car).unwrap();
        for _ in 0..5 {
            engine.update();
        }
        engine.grid.add_item(Tripoint::new(1, 1, 0), Item::new("wheel"));

        let fuel = engine.vehicles.get(car).unwrap().fuel_left("gasoline");

        let mut save_buffer = Vec::new();
        engine.save(&mut save_buffer).expect("Save failed");

        let mut loaded = crate::test_support::engine();
        loaded.load(&save_buffer[..]).expect("Load failed");

        assert_eq!(loaded.turn, 5);
        assert_eq!(loaded.vehicle_count(), 2);
        assert_eq!(loaded.grid.item_count(), 1);
        let h = loaded.vehicle_at(Tripoint::new(3, 3, 0)).unwrap();
        let v = loaded.vehicles.get(h).unwrap();
        assert_eq!(v.name, "car");
        assert!(v.engine_on);
        assert_eq!(v.fuel_left("gasoline"), fuel);
        let bike = loaded.vehicle_at(Tripoint::new(9, 3, 0)).unwrap();
        assert_eq!(loaded.vehicles.get(bike).unwrap().face, 180);
        assert!(loaded.vehicles.get(bike).unwrap().structural_part_at(Point::ZERO).is_some());
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let engine = engine();
        let mut data = SaveData::capture(&engine);
        data.version = SAVE_VERSION + 1;
        let bytes = bincode::serialize(&data).unwrap();
        let err = load_from(&bytes[..], engine.registry()).err().unwrap();
        assert!(matches!(
            err,
            Error::VersionMismatch { expected: SAVE_VERSION, found } if found == SAVE_VERSION + 1
        ));
    }

    #[test]
    fn test_truncated_save_is_an_error() {
        let mut engine = engine();
        engine.spawn_vehicle("car", Tripoint::default(), 0).unwrap();
        let mut buf = Vec::new();
        engine.save(&mut buf).unwrap();
        buf.truncate(buf.len() / 2);
        assert!(matches!(engine.load(&buf[..]), Err(Error::Bincode(_))));
        // A failed load leaves the running simulation alone.
        assert_eq!(engine.vehicle_count(), 1);
    }

    #[test]
    fn test_unknown_part_in_save() {
        let engine = engine();
        let mut data = SaveData::capture(&engine);
        let mut record = VehicleRecord::capture(&crate::test_support::spawn_proto("bicycle"));
        record.parts[0].id = "antigravity_plate".into();
        data.vehicles.push(record);
        let bytes = bincode::serialize(&data).unwrap();
        let err = load_from(&bytes[..], engine.registry()).err().unwrap();
        assert!(matches!(err, Error::Logic(_)));
    }
}
