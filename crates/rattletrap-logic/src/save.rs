//! Plain save records for vehicles.
//!
//! Records hold everything needed to rebuild a vehicle except derived state
//! (indices, caches, precalc positions). Part types are stored by id and
//! resolved against a registry on restore.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::constants::flags;
use crate::error::{Error, Result};
use crate::occupants::Passenger;
use crate::part::{CableTarget, Contents, Fault, VehiclePart};
use crate::part_info::PartRegistry;
use crate::point::{Point, Tripoint};
use crate::vehicle::Vehicle;
use crate::world::Item;

/// Frame type installed under mounts that lost theirs in an old save.
const FALLBACK_FRAME: &str = "frame";
const STEERABLE_SUFFIX: &str = "_steerable";

/// Record format written by [`VehicleRecord::capture`].
pub const RECORD_VERSION: u32 = 12;
/// Records older than this may have mounts without a frame.
const FRAMES_REQUIRED_SINCE: u32 = 11;
/// Records older than this predate steerable wheels.
const STEERABLE_WHEELS_SINCE: u32 = 12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartRecord {
    pub id: String,
    pub mount: Point,
    pub hp: i32,
    #[serde(default)]
    pub contents: Option<Contents>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub open: bool,
    #[serde(default)]
    pub faults: BTreeSet<Fault>,
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub passenger: Option<Passenger>,
    #[serde(default)]
    pub animal: Option<String>,
    #[serde(default)]
    pub carried: bool,
    #[serde(default)]
    pub carrying: bool,
    #[serde(default)]
    pub carry_names: Vec<String>,
    #[serde(default)]
    pub target: Option<CableTarget>,
}

impl PartRecord {
    pub fn capture(part: &VehiclePart) -> Self {
        Self {
            id: part.id().to_string(),
            mount: part.mount,
            hp: part.hp,
            contents: part.contents.clone(),
            enabled: part.enabled,
            open: part.open,
            faults: part.faults.clone(),
            items: part.items.clone(),
            passenger: part.passenger.clone(),
            animal: part.animal.clone(),
            carried: part.carried,
            carrying: part.carrying,
            carry_names: part.carry_names.clone(),
            target: part.target,
        }
    }

    fn restore(&self, registry: &PartRegistry) -> Result<VehiclePart> {
        let info = registry.require(&self.id)?;
        let mut part = VehiclePart::new(info, self.mount);
        part.hp = self.hp.clamp(0, part.info.durability);
        part.contents = self.contents.clone();
        part.enabled = self.enabled;
        part.open = self.open;
        part.faults = self.faults.clone();
        part.items = self.items.clone();
        part.passenger = self.passenger.clone();
        part.animal = self.animal.clone();
        part.carried = self.carried;
        part.carrying = self.carrying;
        part.carry_names = self.carry_names.clone();
        part.target = self.target;
        Ok(part)
    }
}

/// A whole vehicle. Map-keyed metadata is stored as pairs so the record
/// stays valid JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleRecord {
    /// Format version; records without one are treated as the oldest.
    #[serde(default)]
    pub version: u32,
    pub name: String,
    pub pos: Tripoint,
    pub face: i32,
    #[serde(default)]
    pub turn_dir: i32,
    #[serde(default)]
    pub velocity: i32,
    #[serde(default)]
    pub cruise_velocity: i32,
    #[serde(default)]
    pub cruise_on: bool,
    #[serde(default)]
    pub engine_on: bool,
    #[serde(default)]
    pub is_alarm_on: bool,
    #[serde(default)]
    pub camera_on: bool,
    #[serde(default)]
    pub is_locked: bool,
    #[serde(default)]
    pub pivot_anchor: Point,
    #[serde(default)]
    pub labels: Vec<(Point, String)>,
    #[serde(default)]
    pub loot_zones: Vec<(Point, String)>,
    #[serde(default)]
    pub fuel_remainder: Vec<(String, f64)>,
    pub parts: Vec<PartRecord>,
}

impl VehicleRecord {
    /// Snapshot `veh`. Tombstoned parts are not saved.
    pub fn capture(veh: &Vehicle) -> Self {
        Self {
            version: RECORD_VERSION,
            name: veh.name.clone(),
            pos: veh.pos,
            face: veh.face,
            turn_dir: veh.turn_dir,
            velocity: veh.velocity,
            cruise_velocity: veh.cruise_velocity,
            cruise_on: veh.cruise_on,
            engine_on: veh.engine_on,
            is_alarm_on: veh.is_alarm_on,
            camera_on: veh.camera_on,
            is_locked: veh.is_locked,
            pivot_anchor: veh.pivot_anchor,
            labels: veh.labels.iter().map(|(m, s)| (*m, s.clone())).collect(),
            loot_zones: veh.loot_zones.iter().map(|(m, s)| (*m, s.clone())).collect(),
            fuel_remainder: veh
                .fuel_remainder
                .iter()
                .map(|(f, r)| (f.clone(), *r))
                .collect(),
            parts: veh
                .live_parts()
                .map(|p| PartRecord::capture(veh.part(p)))
                .collect(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Vehicle {
    /// Rebuild a vehicle from a record.
    ///
    /// Records from before [`RECORD_VERSION`] are upgraded on the way in:
    /// mounts without a frame get one, and a vehicle with no steerable
    /// wheels has its front axle converted where a steerable variant
    /// exists. Current records restore unchanged.
    pub fn restore(registry: Arc<PartRegistry>, record: &VehicleRecord) -> Result<Vehicle> {
        if record.parts.is_empty() {
            return Err(Error::InvalidData {
                context: "vehicle record",
                detail: format!("'{}' has no parts", record.name),
            });
        }
        let mut veh = Vehicle::new(registry, record.name.clone());
        for rec in &record.parts {
            let part = rec.restore(veh.registry())?;
            veh.parts.push(part);
        }
        veh.pos = record.pos;
        veh.turn_dir = record.turn_dir;
        veh.velocity = record.velocity;
        veh.cruise_velocity = record.cruise_velocity;
        veh.cruise_on = record.cruise_on;
        veh.engine_on = record.engine_on;
        veh.is_alarm_on = record.is_alarm_on;
        veh.camera_on = record.camera_on;
        veh.is_locked = record.is_locked;
        veh.pivot_anchor = record.pivot_anchor;
        veh.labels = record.labels.iter().cloned().collect();
        veh.loot_zones = record.loot_zones.iter().cloned().collect();
        veh.fuel_remainder = record.fuel_remainder.iter().cloned().collect();

        let frames = if record.version < FRAMES_REQUIRED_SINCE {
            veh.add_missing_frames()?
        } else {
            0
        };
        let wheels = if record.version < STEERABLE_WHEELS_SINCE {
            veh.add_steerable_wheels()
        } else {
            0
        };
        if frames + wheels > 0 {
            log::info!(
                "{}: upgraded old save ({frames} frames added, {wheels} wheels made steerable)",
                veh.name
            );
        }
        veh.set_facing(record.face);
        veh.refresh();
        Ok(veh)
    }

    /// Install a plain frame under every mount that has none. Returns the
    /// number of frames added.
    pub fn add_missing_frames(&mut self) -> Result<usize> {
        let mut bare: Vec<Point> = self
            .parts
            .iter()
            .filter(|p| !p.removed)
            .map(|p| p.mount)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .filter(|&m| {
                !self
                    .parts
                    .iter()
                    .any(|p| !p.removed && p.mount == m && p.info.is_structural())
            })
            .collect();
        if bare.is_empty() {
            return Ok(0);
        }
        let frame = self.registry().require(FALLBACK_FRAME)?;
        let added = bare.len();
        for mount in bare.drain(..) {
            self.parts.push(VehiclePart::new(frame.clone(), mount));
        }
        self.refresh();
        Ok(added)
    }

    /// Swap the wheels of the front-most axle for their steerable variants,
    /// unless the vehicle can already steer. Returns the number converted.
    pub fn add_steerable_wheels(&mut self) -> usize {
        let can_steer = self.parts.iter().any(|p| {
            !p.removed && (p.has_flag(flags::STEERABLE) || p.has_flag(flags::TRACKED))
        });
        if can_steer {
            return 0;
        }
        let mut axle = i32::MIN;
        let mut convert = Vec::new();
        for (i, part) in self.parts.iter().enumerate() {
            if part.removed || !part.info.is_wheel() || part.mount.x < axle {
                continue;
            }
            let steerable_id = format!("{}{STEERABLE_SUFFIX}", part.id());
            let Some(steerable) = self.registry().get(&steerable_id) else {
                continue;
            };
            if part.mount.x != axle {
                convert.clear();
                axle = part.mount.x;
            }
            convert.push((i, steerable.clone()));
        }
        let converted = convert.len();
        for (i, info) in convert {
            self.parts[i].info = info;
        }
        if converted > 0 {
            self.refresh();
        }
        converted
    }
}
