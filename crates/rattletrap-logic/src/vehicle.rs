//! The vehicle part graph: the ordered part list, mount-indexed lookup, and
//! the derived index lists rebuilt by [`Vehicle::refresh`].
//!
//! Part indices are positions in the part list. They stay valid until the
//! next compaction ([`Vehicle::part_removal_cleanup`]); code that must hold
//! on to a part across a mutation boundary keeps a [`PartRef`] instead and
//! re-resolves it.
//!
//! Physics aggregates (mass, pivot, drag) are memoized in a cache that every
//! mutation clears through [`Vehicle::invalidate`]; the accessors in
//! [`crate::physics`] recompute on demand.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::constants::{flags, locations};
use crate::part::VehiclePart;
use crate::part_info::PartRegistry;
use crate::physics::{MassSummary, WaterDrag};
use crate::point::{Point, Tripoint};

/// A part handle that survives mutations but not compaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PartRef {
    index: usize,
    generation: u32,
}

impl PartRef {
    pub fn index_hint(self) -> usize {
        self.index
    }
}

/// Derived lookup tables. Rebuilt from scratch by `refresh`; never contains
/// tombstoned parts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartIndex {
    /// Mount → part indices there, sorted by `list_order`.
    pub relative_parts: BTreeMap<Point, Vec<usize>>,
    pub engines: Vec<usize>,
    pub alternators: Vec<usize>,
    pub reactors: Vec<usize>,
    pub wheels: Vec<usize>,
    /// STEERABLE or TRACKED parts.
    pub steering: Vec<usize>,
    pub floating: Vec<usize>,
    /// UNMOUNT_ON_MOVE parts (cables, loose attachments).
    pub loose_parts: Vec<usize>,
    /// SECURITY parts.
    pub speciality: Vec<usize>,
    pub solar_panels: Vec<usize>,
    pub wind_turbines: Vec<usize>,
    pub batteries: Vec<usize>,
    pub fuel_tanks: Vec<usize>,
    pub camera_epower: i32,
    pub extra_drag: i32,
}

/// Memoized physics aggregates. `None` means dirty.
#[derive(Debug, Clone, Default)]
pub(crate) struct PhysicsCache {
    pub(crate) mass: Option<MassSummary>,
    pub(crate) pivot: Option<Point>,
    pub(crate) air_drag: Option<f64>,
    pub(crate) rolling_drag: Option<f64>,
    pub(crate) water: Option<WaterDrag>,
}

/// A multi-tile machine built from parts on a grid of mount points.
#[derive(Debug, Clone)]
pub struct Vehicle {
    pub name: String,
    registry: Arc<PartRegistry>,
    pub(crate) parts: Vec<VehiclePart>,
    /// World tile of mount (0,0).
    pub pos: Tripoint,
    /// Facing in degrees, clockwise from east.
    pub face: i32,
    pub turn_dir: i32,
    /// Current speed in 1/100 mph.
    pub velocity: i32,
    pub cruise_velocity: i32,
    pub cruise_on: bool,
    pub engine_on: bool,
    pub is_alarm_on: bool,
    pub camera_on: bool,
    pub is_locked: bool,
    /// Last terrain check found the hull in water.
    pub in_water: bool,
    pub pivot_anchor: Point,
    pub labels: BTreeMap<Point, String>,
    pub loot_zones: BTreeMap<Point, String>,
    /// Watts the alternators currently load the engines with.
    pub alternator_load: i32,
    /// Fractional fuel carried between turns, per fuel id.
    pub fuel_remainder: BTreeMap<String, f64>,
    pub(crate) index: PartIndex,
    generation: u32,
    pub(crate) cache: PhysicsCache,
}

impl Vehicle {
    pub fn new(registry: Arc<PartRegistry>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            registry,
            parts: Vec::new(),
            pos: Tripoint::default(),
            face: 0,
            turn_dir: 0,
            velocity: 0,
            cruise_velocity: 0,
            cruise_on: true,
            engine_on: false,
            is_alarm_on: false,
            camera_on: false,
            is_locked: false,
            in_water: false,
            pivot_anchor: Point::ZERO,
            labels: BTreeMap::new(),
            loot_zones: BTreeMap::new(),
            alternator_load: 0,
            fuel_remainder: BTreeMap::new(),
            index: PartIndex::default(),
            generation: 0,
            cache: PhysicsCache::default(),
        }
    }

    pub fn registry(&self) -> &Arc<PartRegistry> {
        &self.registry
    }

    // ── Part access ─────────────────────────────────────────────────────

    /// All parts, tombstones included.
    pub fn parts(&self) -> &[VehiclePart] {
        &self.parts
    }

    /// The part at `index`.
    ///
    /// Panics on an out-of-range index; a removed part is a debug assertion.
    /// Both indicate a stale index held across compaction.
    pub fn part(&self, index: usize) -> &VehiclePart {
        let part = &self.parts[index];
        debug_assert!(!part.removed, "invalid part {index}: already removed");
        part
    }

    /// Mutable access to a part. Callers changing contents or hit points
    /// must call [`invalidate_mass`](Self::invalidate_mass) afterwards.
    pub fn part_mut(&mut self, index: usize) -> &mut VehiclePart {
        let part = &mut self.parts[index];
        debug_assert!(!part.removed, "invalid part {index}: already removed");
        part
    }

    /// Non-panicking lookup: `None` for out-of-range or removed indices.
    pub fn get_part(&self, index: usize) -> Option<&VehiclePart> {
        self.parts.get(index).filter(|p| !p.removed)
    }

    /// Length of the part list, tombstones included.
    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    /// Indices of live (non-removed) parts.
    pub fn live_parts(&self) -> impl Iterator<Item = usize> + '_ {
        self.parts
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.removed)
            .map(|(i, _)| i)
    }

    /// True when no live part remains.
    pub fn is_empty(&self) -> bool {
        self.parts.iter().all(|p| p.removed)
    }

    pub fn index(&self) -> &PartIndex {
        &self.index
    }

    pub fn engines(&self) -> &[usize] {
        &self.index.engines
    }

    pub fn alternators(&self) -> &[usize] {
        &self.index.alternators
    }

    pub fn wheels(&self) -> &[usize] {
        &self.index.wheels
    }

    pub fn floating(&self) -> &[usize] {
        &self.index.floating
    }

    pub fn loose_parts(&self) -> &[usize] {
        &self.index.loose_parts
    }

    // ── Stable handles ──────────────────────────────────────────────────

    /// Compaction counter. Bumped whenever indices are reassigned.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn part_ref(&self, index: usize) -> PartRef {
        PartRef {
            index,
            generation: self.generation,
        }
    }

    /// Re-resolve a handle. `None` if the vehicle has been compacted since,
    /// or the part has been removed.
    pub fn resolve(&self, r: PartRef) -> Option<usize> {
        if r.generation != self.generation {
            return None;
        }
        self.get_part(r.index).map(|_| r.index)
    }

    /// Find the index of a part by identity.
    pub fn index_of_part(&self, part: &VehiclePart) -> Option<usize> {
        self.parts
            .iter()
            .position(|p| std::ptr::eq(p, part))
            .filter(|&i| !self.parts[i].removed)
    }

    pub(crate) fn bump_generation(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    // ── Mount queries ───────────────────────────────────────────────────

    /// Live parts at a mount, sorted by list order. Empty if none.
    pub fn parts_at_relative(&self, mount: Point) -> &[usize] {
        self.index
            .relative_parts
            .get(&mount)
            .map_or(&[], Vec::as_slice)
    }

    /// Occupied mounts in ascending order.
    pub fn mounts(&self) -> impl Iterator<Item = Point> + '_ {
        self.index.relative_parts.keys().copied()
    }

    /// A live structural part at `mount`, protrusions included.
    pub fn structural_part_at(&self, mount: Point) -> Option<usize> {
        self.parts_at_relative(mount)
            .iter()
            .copied()
            .find(|&i| self.parts[i].info.is_structural())
    }

    /// A load-bearing (non-protrusion) frame at `mount`.
    pub fn has_structural_part(&self, mount: Point) -> bool {
        self.parts_at_relative(mount).iter().any(|&i| {
            let info = &self.parts[i].info;
            info.is_structural() && !info.has_flag(flags::PROTRUSION)
        })
    }

    /// A structural part is tombstoned but not yet compacted away.
    pub fn is_structural_part_removed(&self) -> bool {
        self.parts
            .iter()
            .any(|p| p.removed && p.info.is_structural())
    }

    /// Flag test that is false for removed or out-of-range parts.
    pub fn part_flag(&self, index: usize, flag: &str) -> bool {
        self.get_part(index).is_some_and(|p| p.has_flag(flag))
    }

    /// The first part sharing `index`'s mount that has `flag`.
    pub fn part_with_feature(&self, index: usize, flag: &str, unbroken: bool) -> Option<usize> {
        self.part_with_feature_at_relative(self.parts[index].mount, flag, unbroken)
    }

    pub fn part_with_feature_at_relative(
        &self,
        mount: Point,
        flag: &str,
        unbroken: bool,
    ) -> Option<usize> {
        self.parts_at_relative(mount).iter().copied().find(|&i| {
            let p = &self.parts[i];
            p.has_flag(flag) && (!unbroken || !p.is_broken())
        })
    }

    pub fn all_parts_with_feature(&self, flag: &str, unbroken: bool) -> Vec<usize> {
        self.live_parts()
            .filter(|&i| {
                let p = &self.parts[i];
                p.has_flag(flag) && (!unbroken || !p.is_broken())
            })
            .collect()
    }

    /// Live parts in a location slot. `""` selects slotless parts.
    pub fn all_parts_at_location(&self, location: &str) -> Vec<usize> {
        self.live_parts()
            .filter(|&i| self.parts[i].info.location == location)
            .collect()
    }

    /// Live parts with `flag`; `enabled` restricts to switched-on parts.
    pub fn get_parts(&self, flag: &str, enabled: bool) -> Vec<usize> {
        self.live_parts()
            .filter(|&i| {
                let p = &self.parts[i];
                p.has_flag(flag) && (!enabled || p.enabled)
            })
            .collect()
    }

    pub fn has_part(&self, flag: &str, enabled: bool) -> bool {
        self.parts
            .iter()
            .any(|p| !p.removed && p.has_flag(flag) && (!enabled || p.enabled))
    }

    /// The part drawn at `mount`: highest z-order, first in list order on ties.
    pub fn part_displayed_at(&self, mount: Point) -> Option<usize> {
        let here = self.parts_at_relative(mount);
        let mut top = *here.first()?;
        for &i in &here[1..] {
            if self.parts[i].info.z_order > self.parts[top].info.z_order {
                top = i;
            }
        }
        Some(top)
    }

    pub fn roof_at_part(&self, index: usize) -> Option<usize> {
        self.parts_at_relative(self.parts[index].mount)
            .iter()
            .copied()
            .find(|&i| {
                let p = &self.parts[i];
                p.info.location == locations::ON_ROOF || p.has_flag(flags::ROOF)
            })
    }

    /// First live part whose rotated position is `offset` from the origin.
    pub fn part_at(&self, offset: Point) -> Option<usize> {
        self.live_parts().find(|&i| self.parts[i].precalc == offset)
    }

    pub fn global_part_pos(&self, index: usize) -> Tripoint {
        self.pos + self.parts[index].precalc
    }

    /// Live part at an absolute position.
    pub fn part_at_global(&self, pos: Tripoint) -> Option<usize> {
        if pos.z != self.pos.z {
            return None;
        }
        self.part_at(pos.xy() - self.pos.xy())
    }

    /// Inclusive bounding box of occupied mounts.
    pub fn mount_bounds(&self) -> Option<(Point, Point)> {
        let mut mounts = self.mounts();
        let first = mounts.next()?;
        Some(mounts.fold((first, first), |(lo, hi), m| {
            (
                Point::new(lo.x.min(m.x), lo.y.min(m.y)),
                Point::new(hi.x.max(m.x), hi.y.max(m.y)),
            )
        }))
    }

    pub fn lights(&self, active: bool) -> Vec<usize> {
        self.live_parts()
            .filter(|&i| {
                let p = &self.parts[i];
                (!active || p.enabled) && !p.is_broken() && p.is_light()
            })
            .collect()
    }

    pub fn is_inside(&self, index: usize) -> bool {
        self.parts[index].inside
    }

    // ── Toggles ─────────────────────────────────────────────────────────

    pub fn set_part_enabled(&mut self, index: usize, on: bool) {
        self.parts[index].enabled = on;
        if self.parts[index].has_flag(flags::EXTRA_DRAG) {
            self.refresh();
        }
    }

    /// Flip a part's enabled state and return the new state.
    pub fn toggle_part(&mut self, index: usize) -> bool {
        let on = !self.parts[index].enabled;
        self.set_part_enabled(index, on);
        on
    }

    /// Open the innermost closed openable part at `index`'s mount.
    pub fn open(&mut self, index: usize) -> Option<usize> {
        let target = self
            .parts_at_relative(self.parts[index].mount)
            .iter()
            .copied()
            .find(|&i| {
                let p = &self.parts[i];
                p.has_flag(flags::OPENABLE) && !p.is_broken() && !p.open
            })?;
        self.parts[target].open = true;
        self.refresh_insides();
        Some(target)
    }

    /// Close the outermost open part at `index`'s mount.
    pub fn close(&mut self, index: usize) -> Option<usize> {
        let target = self
            .parts_at_relative(self.parts[index].mount)
            .iter()
            .rev()
            .copied()
            .find(|&i| {
                let p = &self.parts[i];
                p.has_flag(flags::OPENABLE) && !p.is_broken() && p.open
            })?;
        self.parts[target].open = false;
        self.refresh_insides();
        Some(target)
    }

    /// Rotate the vehicle to `degrees` and recompute rotated positions.
    pub fn set_facing(&mut self, degrees: i32) {
        self.face = degrees.rem_euclid(360);
        self.precalc_mounts();
        self.invalidate_mass();
    }

    // ── Refresh & invalidation ──────────────────────────────────────────

    /// Rebuild every derived index from the part list and clear the physics
    /// cache. O(parts).
    pub fn refresh(&mut self) {
        let mut index = PartIndex::default();
        for (p, part) in self.parts.iter().enumerate() {
            if part.removed {
                continue;
            }
            let info = &part.info;
            let here = index.relative_parts.entry(part.mount).or_default();
            let order = info.list_order;
            let at = here.partition_point(|&q| self.parts[q].info.list_order <= order);
            here.insert(at, p);
            // Racked parts occupy their mount but take no part in running.
            if part.carried {
                continue;
            }
            if info.has_flag(flags::ALTERNATOR) {
                index.alternators.push(p);
            }
            if info.is_engine() {
                index.engines.push(p);
            }
            if info.is_reactor() {
                index.reactors.push(p);
            }
            if info.has_flag(flags::SOLAR_PANEL) {
                index.solar_panels.push(p);
            }
            if info.has_flag(flags::WIND_TURBINE) {
                index.wind_turbines.push(p);
            }
            if info.has_flag(flags::UNMOUNT_ON_MOVE) {
                index.loose_parts.push(p);
            }
            if info.is_wheel() {
                index.wheels.push(p);
            }
            if info.has_flag(flags::STEERABLE) || info.has_flag(flags::TRACKED) {
                index.steering.push(p);
            }
            if info.has_flag(flags::SECURITY) {
                index.speciality.push(p);
            }
            if info.has_flag(flags::CAMERA) {
                index.camera_epower += info.epower;
            }
            if info.has_flag(flags::FLOATS) {
                index.floating.push(p);
            }
            if info.is_battery() {
                index.batteries.push(p);
            }
            if info.is_tank() {
                index.fuel_tanks.push(p);
            }
            if part.enabled && info.has_flag(flags::EXTRA_DRAG) {
                index.extra_drag += info.power;
            }
        }
        self.index = index;
        self.precalc_mounts();
        self.refresh_insides();
        self.invalidate();
    }

    fn precalc_mounts(&mut self) {
        let face = self.face;
        for part in self.parts.iter_mut().filter(|p| !p.removed) {
            part.precalc = part.mount.rotated(face);
        }
    }

    /// A part is inside when it has an intact roof overhead and every
    /// neighbouring mount is covered by a roof or a closed obstacle.
    pub(crate) fn refresh_insides(&mut self) {
        let mut inside = vec![false; self.parts.len()];
        for (p, part) in self.parts.iter().enumerate() {
            if part.removed || part.is_broken() {
                continue;
            }
            if self.part_with_feature(p, flags::ROOF, true).is_none() {
                continue;
            }
            inside[p] = part.mount.four_adjacent().iter().all(|&n| {
                self.parts_at_relative(n).iter().any(|&j| {
                    let q = &self.parts[j];
                    if q.is_broken() {
                        return false;
                    }
                    if q.has_flag(flags::ROOF) {
                        return true;
                    }
                    q.has_flag(flags::OBSTACLE) && !(q.has_flag(flags::OPENABLE) && q.open)
                })
            });
        }
        for (part, flag) in self.parts.iter_mut().zip(inside) {
            part.inside = flag;
        }
    }

    /// Mark every cached physics aggregate dirty.
    pub fn invalidate(&mut self) {
        self.cache = PhysicsCache::default();
    }

    /// Mark mass-dependent aggregates dirty (cargo or fuel changed).
    /// Air drag depends on shape only and survives.
    pub fn invalidate_mass(&mut self) {
        self.cache.mass = None;
        self.cache.pivot = None;
        self.cache.rolling_drag = None;
        self.cache.water = None;
    }

    /// True if every physics aggregate is currently memoized.
    pub fn caches_clean(&self) -> bool {
        self.cache.mass.is_some()
            && self.cache.pivot.is_some()
            && self.cache.air_drag.is_some()
            && self.cache.rolling_drag.is_some()
            && self.cache.water.is_some()
    }
}
