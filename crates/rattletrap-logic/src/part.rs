//! A single installed vehicle part and its mutable state.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::constants::flags;
use crate::occupants::Passenger;
use crate::part_info::PartInfo;
use crate::point::{Point, Tripoint};
use crate::world::Item;

/// Fuel or charge held by a tank, battery, or reactor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contents {
    pub fuel: String,
    pub quantity: i64,
}

/// Persistent faults that degrade a part without breaking it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Fault {
    /// Slipped alternator belt: alternators on this engine produce nothing.
    Belt,
    /// Clogged air filter: engine output halved.
    AirFilter,
    /// Clogged fuel filter: safe velocity reduced.
    FuelFilter,
}

/// Both ends of a POWER_TRANSFER cable, in absolute coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CableTarget {
    pub local: Tripoint,
    pub remote: Tripoint,
}

/// One installed part. Owned exclusively by its [`Vehicle`](crate::vehicle::Vehicle).
#[derive(Debug, Clone)]
pub struct VehiclePart {
    pub info: Arc<PartInfo>,
    /// Vehicle-local offset.
    pub mount: Point,
    /// Mount rotated by the vehicle's facing.
    pub precalc: Point,
    pub hp: i32,
    pub contents: Option<Contents>,
    /// Tombstone: logically gone, physically kept until compaction.
    pub removed: bool,
    pub enabled: bool,
    pub open: bool,
    /// Under a roof. Derived on refresh.
    pub inside: bool,
    pub faults: BTreeSet<Fault>,
    /// Cargo stored in this part.
    pub items: Vec<Item>,
    pub passenger: Option<Passenger>,
    /// Monster id of a harnessed or caged animal.
    pub animal: Option<String>,
    /// Part of a racked vehicle.
    pub carried: bool,
    /// Rack part currently holding a vehicle.
    pub carrying: bool,
    /// Labels describing how to rebuild racked vehicles; innermost last.
    pub carry_names: Vec<String>,
    pub target: Option<CableTarget>,
}

impl VehiclePart {
    pub fn new(info: Arc<PartInfo>, mount: Point) -> Self {
        Self {
            hp: info.durability,
            info,
            mount,
            precalc: mount,
            contents: None,
            removed: false,
            enabled: false,
            open: false,
            inside: false,
            faults: BTreeSet::new(),
            items: Vec::new(),
            passenger: None,
            animal: None,
            carried: false,
            carrying: false,
            carry_names: Vec::new(),
            target: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.info.id
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.info.has_flag(flag)
    }

    pub fn is_broken(&self) -> bool {
        self.hp <= 0
    }

    /// Present and working: not tombstoned and not broken.
    pub fn is_available(&self) -> bool {
        !self.removed && !self.is_broken()
    }

    pub fn health_percent(&self) -> f64 {
        if self.info.durability <= 0 {
            return 0.0;
        }
        (self.hp.max(0) as f64 / self.info.durability as f64).min(1.0)
    }

    pub fn is_light(&self) -> bool {
        flags::LIGHTS.iter().any(|f| self.has_flag(f))
    }

    pub fn has_fault(&self, fault: Fault) -> bool {
        self.faults.contains(&fault)
    }

    /// Fuel id currently held, or the part's declared fuel if empty.
    pub fn ammo_current(&self) -> &str {
        match &self.contents {
            Some(c) if c.quantity > 0 => &c.fuel,
            _ => &self.info.fuel_type,
        }
    }

    pub fn ammo_remaining(&self) -> i64 {
        self.contents.as_ref().map_or(0, |c| c.quantity)
    }

    pub fn ammo_capacity(&self) -> i64 {
        if self.info.is_fuel_store() {
            self.info.capacity
        } else {
            0
        }
    }

    /// Set contents, clamped to capacity. Returns the amount actually stored.
    pub fn ammo_set(&mut self, fuel: &str, quantity: i64) -> i64 {
        let qty = quantity.clamp(0, self.ammo_capacity());
        self.contents = Some(Contents {
            fuel: fuel.to_string(),
            quantity: qty,
        });
        qty
    }

    /// Remove up to `quantity` units. Returns the amount removed.
    pub fn ammo_consume(&mut self, quantity: i64) -> i64 {
        match &mut self.contents {
            Some(c) => {
                let used = quantity.clamp(0, c.quantity);
                c.quantity -= used;
                used
            }
            None => 0,
        }
    }

    pub fn ammo_unset(&mut self) {
        self.contents = None;
    }

    /// Charge level as a whole percent of capacity.
    pub fn charge_percent(&self) -> i64 {
        let cap = self.ammo_capacity();
        if cap <= 0 {
            return 0;
        }
        self.ammo_remaining() * 100 / cap
    }
}
