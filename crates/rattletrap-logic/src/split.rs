//! Splitting a vehicle into its structural islands.
//!
//! After heavy damage the frames of one vehicle may no longer touch. Each
//! 4-connected group of structural mounts (with every part on those mounts)
//! is an island. The first island stays in `self`; the others are detached
//! into new vehicles that keep their parts' absolute positions. At most
//! [`MAX_SPLIT_ISLANDS`](crate::constants::physics::MAX_SPLIT_ISLANDS)
//! islands are found per call; anything past the cap stays attached.

use std::collections::{HashSet, VecDeque};

use crate::constants::physics::MAX_SPLIT_ISLANDS;
use crate::point::{Point, Tripoint};
use crate::vehicle::Vehicle;

impl Vehicle {
    /// Parts grouped by structural island, up to the island cap.
    ///
    /// Within an island the structural part of the first mount comes
    /// first, so it can serve as the island's new origin.
    pub fn structural_islands(&self) -> Vec<Vec<usize>> {
        let starts: Vec<Point> = self
            .live_parts()
            .filter(|&p| self.parts[p].info.is_structural())
            .map(|p| self.parts[p].mount)
            .collect();

        let mut checked: HashSet<Point> = HashSet::new();
        let mut islands = Vec::new();
        for start in starts {
            if islands.len() == MAX_SPLIT_ISLANDS {
                break;
            }
            if checked.contains(&start) {
                continue;
            }
            let mut island = Vec::new();
            let mut queue = VecDeque::from([start]);
            checked.insert(start);
            while let Some(mount) = queue.pop_front() {
                island.extend(self.parts_at_mount_structure_first(mount));
                for next in mount.four_adjacent() {
                    if self.structural_part_at(next).is_some() && checked.insert(next) {
                        queue.push_back(next);
                    }
                }
            }
            islands.push(island);
        }
        islands
    }

    fn parts_at_mount_structure_first(&self, mount: Point) -> Vec<usize> {
        let frame = self.structural_part_at(mount);
        frame
            .into_iter()
            .chain(
                self.parts_at_relative(mount)
                    .iter()
                    .copied()
                    .filter(|&p| Some(p) != frame),
            )
            .collect()
    }

    /// Detach every structural island but the first into its own vehicle.
    ///
    /// Returns the new vehicles; empty if the structure is still in one
    /// piece. `self` is compacted.
    pub fn find_and_split_vehicles(&mut self) -> Vec<Vehicle> {
        let islands = self.structural_islands();
        if islands.len() < 2 {
            return Vec::new();
        }
        let split = self.split_vehicles(&islands[1..]);
        log::info!("{} split into {} pieces", self.name, split.len() + 1);
        split
    }

    /// Move each group of parts into a new vehicle. The group's first part
    /// becomes the new origin. `self` is compacted afterwards.
    pub fn split_vehicles(&mut self, groups: &[Vec<usize>]) -> Vec<Vehicle> {
        let mut out = Vec::with_capacity(groups.len());
        for group in groups {
            let group: Vec<usize> = group
                .iter()
                .copied()
                .filter(|&p| self.get_part(p).is_some_and(|part| !part.removed))
                .collect();
            let Some(&first) = group.first() else {
                continue;
            };
            let offset = self.parts[first].mount;
            let pos = self.global_part_pos(first);
            let mounts: Vec<Point> = group.iter().map(|&p| self.parts[p].mount - offset).collect();
            out.push(self.detach_parts(&group, &mounts, pos, self.face));
        }
        self.part_removal_cleanup();
        out
    }

    /// Copy `group` into a fresh vehicle at `pos` facing `face`, placing
    /// part `group[i]` at `mounts[i]`, and tombstone the originals.
    /// Labels and loot zones follow their mounts; motion state is copied.
    pub(crate) fn detach_parts(
        &mut self,
        group: &[usize],
        mounts: &[Point],
        pos: Tripoint,
        face: i32,
    ) -> Vehicle {
        let mut veh = Vehicle::new(self.registry().clone(), self.name.clone());
        veh.pos = pos;
        veh.face = face;
        veh.turn_dir = self.turn_dir;
        veh.velocity = self.velocity;
        veh.cruise_velocity = self.cruise_velocity;
        veh.cruise_on = self.cruise_on;
        veh.engine_on = self.engine_on;
        veh.camera_on = self.camera_on;
        veh.in_water = self.in_water;

        let mut vacated = Vec::new();
        for (&p, &mount) in group.iter().zip(mounts) {
            let mut part = self.parts[p].clone();
            let old = part.mount;
            if let Some(label) = self.labels.get(&old) {
                veh.labels.insert(mount, label.clone());
            }
            if let Some(zone) = self.loot_zones.get(&old) {
                veh.loot_zones.insert(mount, zone.clone());
            }
            part.mount = mount;
            veh.parts.push(part);
            self.parts[p].removed = true;
            vacated.push(old);
        }
        self.refresh();
        for old in vacated {
            if self.parts_at_relative(old).is_empty() {
                self.labels.remove(&old);
                self.loot_zones.remove(&old);
            }
        }
        veh.refresh();
        veh
    }
}
