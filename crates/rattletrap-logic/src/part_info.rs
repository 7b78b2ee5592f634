//! Part Info Registry: the static catalog of vehicle part types and fuels.
//!
//! Loaded once from `data/vehicle_parts.json` and shared read-only between
//! vehicles through an `Arc`. Lookups by id return `None` for unknown ids;
//! `require` turns that into [`Error::UnknownPart`] for restore paths.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::constants::{flags, locations};
use crate::error::{Error, Result};

/// Damage categories used by armor and the damage cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DamageType {
    Pure,
    Bash,
    Cut,
    Stab,
    Heat,
    Cold,
    Acid,
    Electric,
}

/// Static attributes of one part type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PartInfo {
    pub id: String,
    pub name: String,
    /// Item id produced when the part is uninstalled intact.
    pub item: String,
    /// Exclusive location slot ("structure", "under", ...). Empty = no slot.
    pub location: String,
    pub durability: i32,
    /// Propulsive power in watts. Alternators are negative (they load the engine).
    pub power: i32,
    /// Electrical power in watts. Negative for consumers.
    pub epower: i32,
    pub fuel_type: String,
    /// Dry weight in kg.
    pub weight: f64,
    pub list_order: i32,
    pub z_order: i32,
    /// Tank/battery/reactor capacity in fuel units.
    pub capacity: i64,
    /// Contact area in cm².
    pub wheel_area: i32,
    pub rolling_resistance: f64,
    /// Percent of full power usable at "safe" speed.
    pub engine_m2c: i32,
    pub damaged_power_factor: f64,
    pub muscle_power_factor: i32,
    pub engine_excludes: Vec<String>,
    /// Percent of power lost across a POWER_TRANSFER cable.
    pub transfer_loss: i32,
    pub damage_reduction: BTreeMap<DamageType, i32>,
    /// Item group spawned when the part is destroyed.
    pub breaks_into: String,
    pub flags: BTreeSet<String>,
}

impl Default for PartInfo {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            item: String::new(),
            location: String::new(),
            durability: 100,
            power: 0,
            epower: 0,
            fuel_type: String::new(),
            weight: 0.0,
            list_order: 0,
            z_order: 0,
            capacity: 0,
            wheel_area: 0,
            rolling_resistance: 0.0,
            engine_m2c: 100,
            damaged_power_factor: 0.0,
            muscle_power_factor: 0,
            engine_excludes: Vec::new(),
            transfer_loss: 0,
            damage_reduction: BTreeMap::new(),
            breaks_into: String::new(),
            flags: BTreeSet::new(),
        }
    }
}

impl PartInfo {
    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.contains(flag)
    }

    /// A frame: the part that must exist at every occupied mount.
    pub fn is_structural(&self) -> bool {
        self.location == locations::STRUCTURE
    }

    pub fn is_engine(&self) -> bool {
        self.has_flag(flags::ENGINE)
    }

    pub fn is_wheel(&self) -> bool {
        self.has_flag(flags::WHEEL)
    }

    pub fn is_battery(&self) -> bool {
        self.has_flag(flags::BATTERY)
    }

    pub fn is_tank(&self) -> bool {
        self.has_flag(flags::FUEL_TANK)
    }

    pub fn is_reactor(&self) -> bool {
        self.has_flag(flags::REACTOR)
    }

    /// Parts that hold fuel or charge.
    pub fn is_fuel_store(&self) -> bool {
        self.is_battery() || self.is_tank() || self.is_reactor()
    }

    pub fn damage_reduction(&self, kind: DamageType) -> i32 {
        self.damage_reduction.get(&kind).copied().unwrap_or(0)
    }
}

/// A fuel (or charge) kind that parts can hold or burn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuelInfo {
    pub id: String,
    pub name: String,
    /// kg per unit.
    #[serde(default)]
    pub weight_per_unit: f64,
    /// Joules released per unit burned.
    #[serde(default)]
    pub energy_per_unit: f64,
    /// Never runs out (muscle, plasma).
    #[serde(default)]
    pub perpetual: bool,
}

#[derive(Deserialize)]
struct RegistryFile {
    #[serde(default)]
    fuels: Vec<FuelInfo>,
    parts: Vec<PartInfo>,
}

/// Read-only catalog of part types and fuels.
#[derive(Debug, Default)]
pub struct PartRegistry {
    parts: HashMap<String, Arc<PartInfo>>,
    fuels: HashMap<String, FuelInfo>,
}

impl PartRegistry {
    /// Parse a registry from the JSON layout of `data/vehicle_parts.json`.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: RegistryFile = serde_json::from_str(json)?;
        let mut registry = PartRegistry::default();
        for fuel in file.fuels {
            registry.add_fuel(fuel)?;
        }
        for part in file.parts {
            registry.add_part(part)?;
        }
        log::debug!(
            "loaded {} part types, {} fuels",
            registry.parts.len(),
            registry.fuels.len()
        );
        Ok(registry)
    }

    pub fn add_fuel(&mut self, fuel: FuelInfo) -> Result<()> {
        if self.fuels.contains_key(&fuel.id) {
            return Err(Error::InvalidData {
                context: "fuel table",
                detail: format!("duplicate fuel id '{}'", fuel.id),
            });
        }
        self.fuels.insert(fuel.id.clone(), fuel);
        Ok(())
    }

    pub fn add_part(&mut self, part: PartInfo) -> Result<()> {
        if part.id.is_empty() {
            return Err(Error::InvalidData {
                context: "part registry",
                detail: format!("part '{}' has no id", part.name),
            });
        }
        if self.parts.contains_key(&part.id) {
            return Err(Error::InvalidData {
                context: "part registry",
                detail: format!("duplicate part id '{}'", part.id),
            });
        }
        if !part.fuel_type.is_empty() && !self.fuels.contains_key(&part.fuel_type) {
            return Err(Error::UnknownFuel {
                id: part.fuel_type.clone(),
            });
        }
        self.parts.insert(part.id.clone(), Arc::new(part));
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Arc<PartInfo>> {
        self.parts.get(id)
    }

    /// Like [`get`](Self::get), but an unknown id is an error.
    pub fn require(&self, id: &str) -> Result<Arc<PartInfo>> {
        self.parts
            .get(id)
            .cloned()
            .ok_or_else(|| Error::UnknownPart { id: id.to_string() })
    }

    pub fn fuel(&self, id: &str) -> Option<&FuelInfo> {
        self.fuels.get(id)
    }

    pub fn is_perpetual(&self, fuel: &str) -> bool {
        self.fuel(fuel).is_some_and(|f| f.perpetual)
    }

    pub fn part_ids(&self) -> impl Iterator<Item = &str> {
        self.parts.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}
