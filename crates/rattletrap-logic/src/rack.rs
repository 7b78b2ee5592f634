//! Carrying one vehicle on another's bike racks.
//!
//! A racked vehicle has no existence of its own: its parts are re-mounted on
//! the host next to the rack parts, flagged `carried`, and switched off. Each
//! carried part gets a [`CarryLabel`] pushed on its `carry_names` stack with
//! enough information to rebuild the original vehicle when it is unloaded.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::fmt;
use std::str::FromStr;

use crate::constants::{flags, locations};
use crate::error::{Error, Result};
use crate::point::{Point, FOUR_ADJACENT};
use crate::vehicle::Vehicle;

/// Width of each numeric field in an encoded label.
const FIELD: usize = 4;
/// Where the vehicle name starts in an encoded label.
pub const NAME_OFFSET: usize = 1 + 3 * FIELD;

/// Which way the carried vehicle sits relative to its rack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
}

/// Per-part record of a racked vehicle.
///
/// Encoded as `"{axis}{x:4}{y:4}{rotation:4}{name}"`, e.g. `"Y   0   1   0bicycle"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarryLabel {
    pub axis: Axis,
    /// The part's mount on the carried vehicle.
    pub offset: Point,
    /// Carried facing minus host facing, in degrees.
    pub rotation: i32,
    pub name: String,
}

impl fmt::Display for CarryLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let axis = match self.axis {
            Axis::X => 'X',
            Axis::Y => 'Y',
        };
        write!(
            f,
            "{axis}{:>w$}{:>w$}{:>w$}{}",
            self.offset.x,
            self.offset.y,
            self.rotation,
            self.name,
            w = FIELD
        )
    }
}

impl FromStr for CarryLabel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |detail: String| Error::InvalidData {
            context: "carry label",
            detail,
        };
        if s.len() < NAME_OFFSET || !s.is_char_boundary(NAME_OFFSET) {
            return Err(invalid(format!("'{s}' is too short")));
        }
        let axis = match &s[..1] {
            "X" => Axis::X,
            "Y" => Axis::Y,
            other => return Err(invalid(format!("bad axis '{other}'"))),
        };
        let field = |i: usize| {
            let start = 1 + i * FIELD;
            s[start..start + FIELD]
                .trim()
                .parse::<i32>()
                .map_err(|e| invalid(format!("field {i} of '{s}': {e}")))
        };
        Ok(CarryLabel {
            axis,
            offset: Point::new(field(0)?, field(1)?),
            rotation: field(2)?,
            name: s[NAME_OFFSET..].to_string(),
        })
    }
}

/// Why a vehicle cannot go on the rack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RackRefusal {
    NoRack,
    /// Some frame of the carried vehicle is not beside a rack, or the
    /// frames sit on different sides.
    NotAligned,
    Occupied,
    /// The host already has structure where a carried frame would go.
    Blocked,
}

impl fmt::Display for RackRefusal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            RackRefusal::NoRack => "There is no free rack.",
            RackRefusal::NotAligned => "It does not line up with the rack.",
            RackRefusal::Occupied => "Someone is still on it.",
            RackRefusal::Blocked => "Something is in the way.",
        };
        f.write_str(text)
    }
}

impl Vehicle {
    /// Intact racks not already holding something.
    pub fn free_racks(&self) -> Vec<usize> {
        self.live_parts()
            .filter(|&p| {
                let part = &self.parts[p];
                part.has_flag(flags::BIKE_RACK_VEH) && !part.is_broken() && !part.carrying
            })
            .collect()
    }

    /// Mount every part of `carry` next to `rack_parts`.
    ///
    /// Each frame of `carry` must sit in a square 4-adjacent to one of the
    /// racks, all on the same axis. On success the caller destroys `carry`.
    pub fn merge_rackable_vehicle(
        &mut self,
        carry: &Vehicle,
        rack_parts: &[usize],
    ) -> std::result::Result<(), RackRefusal> {
        if rack_parts.is_empty() {
            return Err(RackRefusal::NoRack);
        }
        if !carry.boarded_parts().is_empty() {
            return Err(RackRefusal::Occupied);
        }

        let mut axis = None;
        // (mount on carry, mount on host, rack part)
        let mut mapping: Vec<(Point, Point, usize)> = Vec::new();
        for frame in carry.all_parts_at_location(locations::STRUCTURE) {
            let target = carry.global_part_pos(frame);
            let found = rack_parts.iter().find_map(|&r| {
                FOUR_ADJACENT.iter().find_map(|&d| {
                    let m = self.parts[r].mount + d;
                    (self.pos + m.rotated(self.face) == target).then_some((r, m, d))
                })
            });
            let Some((rack, host_mount, d)) = found else {
                return Err(RackRefusal::NotAligned);
            };
            let this_axis = if d.x != 0 { Axis::X } else { Axis::Y };
            if axis.is_some_and(|a| a != this_axis) {
                return Err(RackRefusal::NotAligned);
            }
            axis = Some(this_axis);
            if self.structural_part_at(host_mount).is_some() {
                return Err(RackRefusal::Blocked);
            }
            mapping.push((carry.parts[frame].mount, host_mount, rack));
        }
        let Some(axis) = axis else {
            return Err(RackRefusal::NotAligned);
        };

        let rotation = (carry.face - self.face).rem_euclid(360);
        for (old, host_mount, rack) in mapping {
            let label = CarryLabel {
                axis,
                offset: old,
                rotation,
                name: carry.name.clone(),
            }
            .to_string();
            for &cp in carry.parts_at_relative(old) {
                let mut part = carry.parts[cp].clone();
                part.mount = host_mount;
                part.carried = true;
                part.enabled = false;
                part.carry_names.push(label.clone());
                self.parts.push(part);
            }
            if let Some(zone) = carry.loot_zones.get(&old) {
                self.loot_zones.insert(host_mount, zone.clone());
            }
            self.parts[rack].carrying = true;
        }
        self.refresh();
        log::info!("{} racked onto {}", carry.name, self.name);
        Ok(())
    }

    /// Carried parts grouped per racked vehicle: connected mounts whose
    /// top labels share a name and rotation.
    pub fn carried_vehicles(&self) -> Vec<Vec<usize>> {
        let mut by_mount: BTreeMap<Point, (Option<(String, i32)>, Vec<usize>)> = BTreeMap::new();
        for p in self.live_parts().filter(|&p| self.parts[p].carried) {
            let part = &self.parts[p];
            let key = part
                .carry_names
                .last()
                .and_then(|l| l.parse::<CarryLabel>().ok())
                .map(|l| (l.name, l.rotation));
            let entry = by_mount.entry(part.mount).or_insert_with(|| (key, Vec::new()));
            entry.1.push(p);
        }

        let mut seen: HashSet<Point> = HashSet::new();
        let mut groups = Vec::new();
        for (&start, (key, _)) in &by_mount {
            if !seen.insert(start) {
                continue;
            }
            let mut group = Vec::new();
            let mut queue = VecDeque::from([start]);
            while let Some(m) = queue.pop_front() {
                group.extend(by_mount[&m].1.iter().copied());
                for n in m.four_adjacent() {
                    if by_mount.get(&n).is_some_and(|(k, _)| k == key) && seen.insert(n) {
                        queue.push_back(n);
                    }
                }
            }
            groups.push(group);
        }
        groups
    }

    /// Unload the racked vehicle made of `carried_parts` as a new vehicle,
    /// standing where its parts sat on the host.
    pub fn remove_carried_vehicle(&mut self, carried_parts: &[usize]) -> Result<Vehicle> {
        let mut labels = Vec::with_capacity(carried_parts.len());
        for &p in carried_parts {
            let part = self.get_part(p).filter(|part| part.carried).ok_or_else(|| {
                Error::InvalidData {
                    context: "carried vehicle",
                    detail: format!("part {p} is not racked"),
                }
            })?;
            let label = part.carry_names.last().ok_or_else(|| Error::InvalidData {
                context: "carried vehicle",
                detail: format!("part {p} has no carry label"),
            })?;
            labels.push(label.parse::<CarryLabel>()?);
        }
        let Some(first) = labels.first() else {
            return Err(Error::InvalidData {
                context: "carried vehicle",
                detail: "no parts given".into(),
            });
        };

        let face = (self.face + first.rotation).rem_euclid(360);
        let pos = self.global_part_pos(carried_parts[0]) - first.offset.rotated(face);
        let name = first.name.clone();
        let mounts: Vec<Point> = labels.iter().map(|l| l.offset).collect();

        for &p in carried_parts {
            let part = &mut self.parts[p];
            part.carry_names.pop();
            part.carried = !part.carry_names.is_empty();
            part.enabled = part.info.is_engine() && !part.carried;
        }
        let mut veh = self.detach_parts(carried_parts, &mounts, pos, face);
        veh.name = name;
        veh.velocity = 0;
        veh.cruise_velocity = 0;
        veh.turn_dir = 0;
        veh.engine_on = false;
        veh.camera_on = false;

        let racks: Vec<usize> = self
            .live_parts()
            .filter(|&p| self.parts[p].carrying)
            .collect();
        for r in racks {
            let still_loaded = self.parts[r].mount.four_adjacent().iter().any(|&n| {
                self.parts_at_relative(n)
                    .iter()
                    .any(|&q| self.parts[q].carried)
            });
            self.parts[r].carrying = still_loaded;
        }
        self.part_removal_cleanup();
        log::info!("{} unloaded from {}", veh.name, self.name);
        Ok(veh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::Tripoint;
    use crate::test_support::{registry, straight_line, Rider};

    // ── Helpers ─────────────────────────────────────────────────────────

    /// Two-frame host at the origin with a rack on each frame.
    fn host() -> Vehicle {
        let mut v = straight_line(2);
        v.name = "truck".into();
        v.install_part(Point::ZERO, "bike_rack").unwrap();
        v.install_part(Point::new(1, 0), "bike_rack").unwrap();
        v
    }

    /// Two-frame bicycle parked alongside the host's racks.
    fn bicycle() -> Vehicle {
        let mut v = Vehicle::new(registry(), "bicycle");
        for x in 0..2 {
            v.install_part(Point::new(x, 0), "frame_light").unwrap();
            v.install_part(Point::new(x, 0), "wheel_bicycle").unwrap();
        }
        v.pos = Tripoint::new(0, 1, 0);
        v
    }

    fn globals(v: &Vehicle, parts: impl Iterator<Item = usize>) -> Vec<Tripoint> {
        let mut out: Vec<Tripoint> = parts.map(|p| v.global_part_pos(p)).collect();
        out.sort();
        out
    }

    // ── Labels ──────────────────────────────────────────────────────────

    #[test]
    fn test_label_format() {
        let label = CarryLabel {
            axis: Axis::Y,
            offset: Point::new(-1, 2),
            rotation: 90,
            name: "red bike".into(),
        };
        let text = label.to_string();
        assert_eq!(text, "Y  -1   2  90red bike");
        assert_eq!(&text[NAME_OFFSET..], "red bike");
        assert_eq!(text.parse::<CarryLabel>().unwrap(), label);
    }

    #[test]
    fn test_malformed_labels_rejected() {
        assert!("Y  1".parse::<CarryLabel>().is_err());
        assert!("Z   0   0   0bike".parse::<CarryLabel>().is_err());
        assert!("X   a   0   0bike".parse::<CarryLabel>().is_err());
    }

    // ── Racking ─────────────────────────────────────────────────────────

    #[test]
    fn test_merge_and_unload_round_trip() {
        let mut truck = host();
        let bike = bicycle();
        let truck_parts = truck.part_count();
        let bike_globals = globals(&bike, bike.live_parts());
        let racks = truck.free_racks();

        truck.merge_rackable_vehicle(&bike, &racks).unwrap();
        assert_eq!(truck.part_count(), truck_parts + bike.part_count());
        assert!(truck.free_racks().is_empty());
        // Carried wheels do not count as the truck's wheels.
        assert!(truck.wheels().is_empty());
        let carried: Vec<usize> = truck.live_parts().filter(|&p| truck.part(p).carried).collect();
        assert!(carried.iter().all(|&p| !truck.part(p).enabled));
        assert_eq!(globals(&truck, carried.iter().copied()), bike_globals);

        let groups = truck.carried_vehicles();
        assert_eq!(groups.len(), 1);
        let unloaded = truck.remove_carried_vehicle(&groups[0]).unwrap();
        assert_eq!(unloaded.name, "bicycle");
        assert_eq!(unloaded.part_count(), bike.part_count());
        assert_eq!(globals(&unloaded, unloaded.live_parts()), bike_globals);
        assert!(unloaded.live_parts().all(|p| !unloaded.part(p).carried));
        assert_eq!(unloaded.wheels().len(), 2);

        assert_eq!(truck.part_count(), truck_parts);
        assert_eq!(truck.free_racks().len(), 2);
    }

    #[test]
    fn test_unload_after_host_turns() {
        let mut truck = host();
        let racks = truck.free_racks();
        truck.merge_rackable_vehicle(&bicycle(), &racks).unwrap();
        truck.set_facing(90);
        let carried: Vec<usize> = truck.live_parts().filter(|&p| truck.part(p).carried).collect();
        let on_rack = globals(&truck, carried.iter().copied());

        let bike = truck.remove_carried_vehicle(&carried).unwrap();
        assert_eq!(bike.face, 90);
        assert_eq!(globals(&bike, bike.live_parts()), on_rack);
    }

    #[test]
    fn test_merge_refusals() {
        let mut truck = host();
        let racks = truck.free_racks();
        assert_eq!(
            truck.merge_rackable_vehicle(&bicycle(), &[]),
            Err(RackRefusal::NoRack)
        );

        let mut far = bicycle();
        far.pos = Tripoint::new(0, 5, 0);
        assert_eq!(
            truck.merge_rackable_vehicle(&far, &racks),
            Err(RackRefusal::NotAligned)
        );

        let mut ridden = bicycle();
        ridden.install_part(Point::ZERO, "seat").unwrap();
        let seat = ridden.all_parts_with_feature(flags::BOARDABLE, true)[0];
        ridden.board(seat, &mut Rider::new(1, 60.0));
        assert_eq!(
            truck.merge_rackable_vehicle(&ridden, &racks),
            Err(RackRefusal::Occupied)
        );
        assert_eq!(truck.part_count(), 4);
    }

    #[test]
    fn test_unload_rejects_uncarried_parts() {
        let mut truck = host();
        assert!(truck.remove_carried_vehicle(&[0]).is_err());
        assert!(truck.remove_carried_vehicle(&[]).is_err());
    }
}
