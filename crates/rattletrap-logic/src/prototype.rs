//! Vehicle blueprints loaded from `data/vehicles.json`.
//!
//! A prototype lists parts in install order. Spawning installs them without
//! mount validation, fills fuel stores, and applies a starting condition.

use std::collections::HashSet;
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::fuels;
use crate::error::{Error, Result};
use crate::part_info::PartRegistry;
use crate::point::Point;
use crate::vehicle::Vehicle;

/// One part placement in a prototype.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrototypePart {
    pub x: i32,
    pub y: i32,
    pub part: String,
    /// Fuel loaded into a tank or reactor at spawn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuel: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehiclePrototype {
    pub id: String,
    pub name: String,
    pub parts: Vec<PrototypePart>,
}

#[derive(Deserialize)]
struct PrototypeFile {
    vehicles: Vec<VehiclePrototype>,
}

impl VehiclePrototype {
    /// Parse a `{ "vehicles": [...] }` document.
    pub fn list_from_json(json: &str) -> Result<Vec<VehiclePrototype>> {
        let file: PrototypeFile = serde_json::from_str(json)?;
        let mut seen = HashSet::new();
        for proto in &file.vehicles {
            if !seen.insert(proto.id.as_str()) {
                return Err(Error::InvalidData {
                    context: "vehicle prototype",
                    detail: format!("duplicate id '{}'", proto.id),
                });
            }
            if proto.parts.is_empty() {
                return Err(Error::InvalidData {
                    context: "vehicle prototype",
                    detail: format!("'{}' has no parts", proto.id),
                });
            }
        }
        Ok(file.vehicles)
    }
}

/// Starting condition of a spawned vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Condition {
    /// Every part at full health.
    Mint,
    /// Each part rolls 4d8 for wear; 8 or less breaks it.
    Worn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnOptions {
    /// Fill level of tanks, reactors and batteries, 0..=100.
    pub fuel_percent: i32,
    pub condition: Condition,
    pub reactors_on: bool,
}

impl Default for SpawnOptions {
    fn default() -> Self {
        Self {
            fuel_percent: 100,
            condition: Condition::Mint,
            reactors_on: true,
        }
    }
}

const WEAR_BROKEN: i32 = 8;
const WEAR_UNHURT: i32 = 20;

impl Vehicle {
    /// Build a vehicle from `proto`.
    ///
    /// Fails on unknown part or fuel ids, fuel assigned to a part that
    /// cannot hold it, or a mount without a frame.
    pub fn from_prototype(
        registry: Arc<PartRegistry>,
        proto: &VehiclePrototype,
        opts: SpawnOptions,
        rng: &mut impl Rng,
    ) -> Result<Vehicle> {
        let mut veh = Vehicle::new(registry, proto.name.clone());
        let pct = i64::from(opts.fuel_percent.clamp(0, 100));

        for entry in &proto.parts {
            let p = veh.install_part_forced(Point::new(entry.x, entry.y), &entry.part)?;
            let info = veh.part(p).info.clone();
            if let Some(fuel) = &entry.fuel {
                if veh.registry().fuel(fuel).is_none() {
                    return Err(Error::UnknownFuel { id: fuel.clone() });
                }
                if !info.is_fuel_store() || info.is_battery() {
                    return Err(Error::InvalidData {
                        context: "vehicle prototype",
                        detail: format!("{} in '{}' cannot hold {fuel}", info.id, proto.id),
                    });
                }
                let cap = info.capacity;
                veh.part_mut(p).ammo_set(fuel, cap * pct / 100);
            } else if info.is_battery() {
                veh.part_mut(p).ammo_set(fuels::BATTERY, info.capacity * pct / 100);
            }
            if info.is_reactor() {
                veh.part_mut(p).enabled = opts.reactors_on;
            }
        }

        if let Some(mount) = veh.mounts().find(|&m| !veh.has_structural_part(m)) {
            return Err(Error::InvalidData {
                context: "vehicle prototype",
                detail: format!("'{}' has no frame at {mount:?}", proto.id),
            });
        }

        if opts.condition == Condition::Worn {
            veh.apply_wear(rng);
        }
        veh.refresh();
        veh.invalidate();
        log::debug!("spawned {} ({} parts)", proto.id, veh.part_count());
        Ok(veh)
    }

    fn apply_wear(&mut self, rng: &mut impl Rng) {
        for p in 0..self.parts.len() {
            let roll: i32 = (0..4).map(|_| rng.gen_range(1..=8)).sum();
            if roll >= WEAR_UNHURT {
                continue;
            }
            let part = &mut self.parts[p];
            if roll <= WEAR_BROKEN {
                part.hp = 0;
                part.ammo_unset();
            } else {
                let share = f64::from(roll - WEAR_BROKEN) / f64::from(WEAR_UNHURT - WEAR_BROKEN);
                part.hp = (share * f64::from(part.info.durability)) as i32;
            }
        }
        self.refresh_insides();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{prototypes, registry};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn spawn(id: &str, opts: SpawnOptions) -> Vehicle {
        let proto = prototypes().into_iter().find(|p| p.id == id).unwrap();
        Vehicle::from_prototype(registry(), &proto, opts, &mut StdRng::seed_from_u64(3)).unwrap()
    }

    #[test]
    fn test_bundled_prototypes_all_spawn() {
        for proto in prototypes() {
            let v = Vehicle::from_prototype(
                registry(),
                &proto,
                SpawnOptions::default(),
                &mut StdRng::seed_from_u64(1),
            );
            let v = v.unwrap_or_else(|e| panic!("{}: {e}", proto.id));
            assert_eq!(v.part_count(), proto.parts.len());
            assert_eq!(v.structural_islands().len(), 1, "{} is in pieces", proto.id);
        }
    }

    #[test]
    fn test_tanks_and_batteries_fill_to_percent() {
        let v = spawn(
            "car",
            SpawnOptions {
                fuel_percent: 50,
                ..SpawnOptions::default()
            },
        );
        assert_eq!(v.fuel_left("gasoline"), 30_000);
        assert_eq!(v.battery_left(), 500);
        assert_eq!(v.name, "car");
    }

    #[test]
    fn test_reactor_switch_follows_options() {
        let on = spawn("reactor_van", SpawnOptions::default());
        let off = spawn(
            "reactor_van",
            SpawnOptions {
                reactors_on: false,
                ..SpawnOptions::default()
            },
        );
        let reactor = |v: &Vehicle| v.all_parts_with_feature("REACTOR", false)[0];
        assert!(on.part(reactor(&on)).enabled);
        assert!(!off.part(reactor(&off)).enabled);
        assert_eq!(on.part(reactor(&on)).ammo_remaining(), 100);
    }

    #[test]
    fn test_worn_condition_damages_some_parts() {
        let v = spawn(
            "car",
            SpawnOptions {
                condition: Condition::Worn,
                ..SpawnOptions::default()
            },
        );
        assert!(v.parts().iter().any(|p| p.hp < p.info.durability));
        assert!(v.parts().iter().all(|p| p.hp >= 0));
    }

    #[test]
    fn test_unknown_part_is_an_error() {
        let proto = VehiclePrototype {
            id: "bad".into(),
            name: "bad".into(),
            parts: vec![PrototypePart {
                x: 0,
                y: 0,
                part: "warp_core".into(),
                fuel: None,
            }],
        };
        let err = Vehicle::from_prototype(
            registry(),
            &proto,
            SpawnOptions::default(),
            &mut StdRng::seed_from_u64(0),
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnknownPart { ref id } if id == "warp_core"));
    }

    #[test]
    fn test_fuel_on_non_store_rejected() {
        let proto = VehiclePrototype {
            id: "leaky".into(),
            name: "leaky".into(),
            parts: vec![PrototypePart {
                x: 0,
                y: 0,
                part: "frame".into(),
                fuel: Some("gasoline".into()),
            }],
        };
        let err = Vehicle::from_prototype(
            registry(),
            &proto,
            SpawnOptions::default(),
            &mut StdRng::seed_from_u64(0),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidData { .. }));
    }

    #[test]
    fn test_missing_frame_rejected() {
        let proto = VehiclePrototype {
            id: "floating_seat".into(),
            name: "floating seat".into(),
            parts: vec![
                PrototypePart {
                    x: 0,
                    y: 0,
                    part: "frame".into(),
                    fuel: None,
                },
                PrototypePart {
                    x: 1,
                    y: 0,
                    part: "seat".into(),
                    fuel: None,
                },
            ],
        };
        let err = Vehicle::from_prototype(
            registry(),
            &proto,
            SpawnOptions::default(),
            &mut StdRng::seed_from_u64(0),
        )
        .unwrap_err();
        assert!(err.to_string().contains("no frame"));
    }

    #[test]
    fn test_duplicate_prototype_ids_rejected() {
        let json = r#"{ "vehicles": [
            { "id": "a", "name": "a", "parts": [ { "x": 0, "y": 0, "part": "frame" } ] },
            { "id": "a", "name": "b", "parts": [ { "x": 0, "y": 0, "part": "frame" } ] }
        ] }"#;
        assert!(VehiclePrototype::list_from_json(json).is_err());
    }
}
