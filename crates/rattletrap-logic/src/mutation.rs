//! Install, remove, compaction, and origin shifting.
//!
//! Removal is two-phase: [`Vehicle::remove_part`] tombstones a part so
//! indices held by an in-flight operation stay valid, and
//! [`Vehicle::part_removal_cleanup`] erases tombstones and reassigns indices.

use crate::constants::flags;
use crate::error::Result;
use crate::mount::MountRefusal;
use crate::part::VehiclePart;
use crate::point::Point;
use crate::vehicle::Vehicle;
use crate::world::{Item, Map};

/// (parent flag, child flag): removing the parent removes the child too.
const DEPENDENT_PARTS: [(&str, &str); 3] = [
    (flags::WINDOW, flags::CURTAIN),
    (flags::SEAT, flags::SEATBELT),
    (flags::BATTERY_MOUNT, flags::NEEDS_BATTERY_MOUNT),
];

impl Vehicle {
    /// Validate and install a part of type `id` at `mount`.
    pub fn install_part(&mut self, mount: Point, id: &str) -> std::result::Result<usize, MountRefusal> {
        let info = self
            .registry()
            .get(id)
            .cloned()
            .ok_or_else(|| MountRefusal::UnknownPart(id.to_string()))?;
        self.can_mount(mount, &info)?;
        Ok(self.install(VehiclePart::new(info, mount)))
    }

    /// Install without mount validation (prototypes, save restore).
    pub fn install_part_forced(&mut self, mount: Point, id: &str) -> Result<usize> {
        let info = self.registry().require(id)?;
        Ok(self.install(VehiclePart::new(info, mount)))
    }

    /// Append a prepared part and refresh. Engines start enabled; toggle-group
    /// parts start enabled only if a sibling of the group already is.
    pub fn install(&mut self, mut part: VehiclePart) -> usize {
        part.enabled = if part.info.is_engine() {
            true
        } else {
            flags::TOGGLE_GROUPS
                .iter()
                .find(|f| part.has_flag(f))
                .is_some_and(|f| self.has_part(f, true))
        };
        self.parts.push(part);
        self.refresh();
        self.parts.len() - 1
    }

    /// Tombstone part `p`, releasing whatever depends on it.
    ///
    /// Dependent parts (curtains on a window, a seatbelt on a seat, a battery
    /// on its mount) are dropped as items and removed as well. Passengers are
    /// unboarded, animals released, and cargo dropped at the part's position.
    ///
    /// Returns true if mount (0,0) is now empty; the caller must then call
    /// [`shift_if_needed`](Self::shift_if_needed).
    pub fn remove_part(&mut self, p: usize, map: &mut dyn Map) -> bool {
        if p >= self.parts.len() {
            log::warn!(
                "tried to remove part {p} but {} has only {} parts",
                self.name,
                self.parts.len()
            );
            return false;
        }
        if self.parts[p].removed {
            return false;
        }
        let pos = self.global_part_pos(p);

        for (parent, child) in DEPENDENT_PARTS {
            if !self.parts[p].has_flag(parent) {
                continue;
            }
            if let Some(dep) = self.part_with_feature(p, child, false) {
                if dep != p {
                    map.add_item(pos, Item::new(self.parts[dep].info.item.clone()));
                    self.remove_part(dep, map);
                }
            }
        }

        if self.parts[p].has_flag(flags::BOARDABLE) {
            if let Some(passenger) = self.parts[p].passenger.take() {
                map.unboard(pos, passenger);
            }
        }
        if let Some(animal) = self.parts[p].animal.take() {
            map.release_animal(pos, &animal);
        }

        if self.parts[p].info.is_engine() && self.index.engines.len() > 1 {
            let any_other_on = self
                .index
                .engines
                .iter()
                .any(|&e| e != p && self.parts[e].enabled);
            if !any_other_on {
                self.engine_on = false;
                let engines = self.index.engines.clone();
                for e in engines {
                    self.parts[e].enabled = true;
                }
            }
        }

        self.parts[p].removed = true;

        let mount = self.parts[p].mount;
        let mount_empty = self
            .parts_at_relative(mount)
            .iter()
            .all(|&i| self.parts[i].removed);
        if mount_empty {
            self.labels.remove(&mount);
        }

        for item in std::mem::take(&mut self.parts[p].items) {
            map.add_item(pos, item);
        }

        self.refresh();
        self.parts_at_relative(Point::ZERO).is_empty()
    }

    /// Erase tombstones, reassign indices, and re-root the origin.
    ///
    /// Returns true if the vehicle has no parts left and should be destroyed.
    pub fn part_removal_cleanup(&mut self) -> bool {
        let before = self.parts.len();
        self.parts.retain(|p| !p.removed);
        if self.parts.len() != before {
            self.bump_generation();
            log::debug!(
                "{}: compacted {} removed parts",
                self.name,
                before - self.parts.len()
            );
        }
        self.refresh();
        if self.parts.is_empty() {
            return true;
        }
        self.shift_if_needed();
        false
    }

    /// Translate every mount by `-delta` and move the vehicle by `delta`,
    /// so nothing appears to move in the world.
    pub fn shift_parts(&mut self, delta: Point) {
        for part in &mut self.parts {
            part.mount -= delta;
        }
        self.labels = std::mem::take(&mut self.labels)
            .into_iter()
            .map(|(m, text)| (m - delta, text))
            .collect();
        self.loot_zones = std::mem::take(&mut self.loot_zones)
            .into_iter()
            .map(|(m, zone)| (m - delta, zone))
            .collect();
        self.pivot_anchor -= delta;
        self.pos = self.pos + delta.rotated(self.face);
        self.refresh();
    }

    /// Make sure mount (0,0) is occupied, preferring a load-bearing frame as
    /// the new origin. Returns true if a shift happened.
    pub fn shift_if_needed(&mut self) -> bool {
        if !self.parts_at_relative(Point::ZERO).is_empty() {
            return false;
        }
        let frame = self.live_parts().find(|&i| {
            let info = &self.parts[i].info;
            info.is_structural() && !info.has_flag(flags::PROTRUSION)
        });
        let Some(origin) = frame.or_else(|| self.live_parts().next()) else {
            return false;
        };
        let delta = self.parts[origin].mount;
        self.shift_parts(delta);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::Tripoint;
    use crate::test_support::{registry, two_by_one, TestWorld};

    #[test]
    fn test_install_returns_new_index() {
        let mut v = two_by_one();
        let n = v.part_count();
        let seat = v.install_part(Point::new(1, 0), "seat").unwrap();
        assert_eq!(seat, n);
        assert!(v.parts_at_relative(Point::new(1, 0)).contains(&seat));
    }

    #[test]
    fn test_install_unknown_id_refused() {
        let mut v = two_by_one();
        assert_eq!(
            v.install_part(Point::ZERO, "warp_core"),
            Err(MountRefusal::UnknownPart("warp_core".into()))
        );
        assert!(v.install_part_forced(Point::ZERO, "warp_core").is_err());
    }

    #[test]
    fn test_engines_start_enabled() {
        let v = two_by_one();
        assert!(v.part(v.engines()[0]).enabled);
    }

    #[test]
    fn test_toggle_group_follows_siblings() {
        let mut v = two_by_one();
        let first = v.install_part(Point::ZERO, "headlight").unwrap();
        assert!(!v.part(first).enabled);
        v.set_part_enabled(first, true);
        let second = v.install_part(Point::new(1, 0), "headlight").unwrap();
        assert!(v.part(second).enabled);
        // Dome lights are a different group.
        let dome = v.install_part(Point::new(1, 0), "dome_light").unwrap();
        assert!(!v.part(dome).enabled);
    }

    #[test]
    fn test_install_then_remove_restores_indices_and_mass() {
        let mut v = two_by_one();
        let mut world = TestWorld::default();
        let before_index = v.index().clone();
        let before_mass = v.total_mass();

        let tank = v.install_part(Point::new(1, 0), "tank").unwrap();
        assert!(v.total_mass() > before_mass);
        v.remove_part(tank, &mut world);

        assert_eq!(v.index(), &before_index);
        assert!((v.total_mass() - before_mass).abs() < 1e-9);
    }

    #[test]
    fn test_remove_seat_takes_seatbelt() {
        let mut v = two_by_one();
        let mut world = TestWorld::default();
        let seat = v.install_part(Point::new(1, 0), "seat").unwrap();
        let belt = v.install_part(Point::new(1, 0), "seatbelt").unwrap();
        v.remove_part(seat, &mut world);
        assert!(v.parts()[belt].removed);
        assert_eq!(world.items_at(v.global_part_pos(1)), vec!["rope_6".to_string()]);
    }

    #[test]
    fn test_remove_drops_cargo() {
        let mut v = two_by_one();
        let mut world = TestWorld::default();
        let trunk = v.install_part(Point::new(1, 0), "cargo_box").unwrap();
        v.part_mut(trunk).items.push(Item::new("rock"));
        let pos = v.global_part_pos(trunk);
        v.remove_part(trunk, &mut world);
        assert_eq!(world.items_at(pos), vec!["rock".to_string()]);
    }

    #[test]
    fn test_remove_last_other_engine_resets_engines() {
        let mut v = two_by_one();
        let mut world = TestWorld::default();
        let motor = v.install_part(Point::new(1, 0), "engine_electric").unwrap();
        let gas = v.engines()[0];
        v.engine_on = true;
        v.part_mut(gas).enabled = false;
        v.remove_part(motor, &mut world);
        assert!(!v.engine_on);
        assert!(v.part(gas).enabled);
    }

    #[test]
    fn test_remove_reports_origin_shift_needed() {
        let mut v = Vehicle::new(registry(), "pair");
        let mut world = TestWorld::default();
        let origin = v.install_part(Point::ZERO, "frame").unwrap();
        v.install_part(Point::new(1, 0), "frame").unwrap();
        v.pos = Tripoint::new(5, 5, 0);
        let keep_pos = v.global_part_pos(1);

        assert!(v.remove_part(origin, &mut world));
        assert!(v.shift_if_needed());
        assert_eq!(v.part(1).mount, Point::ZERO);
        assert_eq!(v.global_part_pos(1), keep_pos);
    }

    #[test]
    fn test_cleanup_compacts_and_bumps_generation() {
        let mut v = two_by_one();
        let mut world = TestWorld::default();
        let engine = v.engines()[0];
        let r = v.part_ref(v.part_count() - 1);
        let n = v.part_count();
        v.remove_part(engine, &mut world);
        assert_eq!(v.part_count(), n);
        assert!(!v.part_removal_cleanup());
        assert_eq!(v.part_count(), n - 1);
        assert!(v.resolve(r).is_none());
        assert!(v.engines().is_empty());
    }

    #[test]
    fn test_cleanup_of_empty_vehicle_reports_destroyed() {
        let mut v = Vehicle::new(registry(), "lonely");
        let mut world = TestWorld::default();
        let f = v.install_part(Point::ZERO, "frame").unwrap();
        v.remove_part(f, &mut world);
        assert!(v.part_removal_cleanup());
        assert!(v.is_empty());
    }

    #[test]
    fn test_shift_parts_moves_labels_and_position() {
        let mut v = two_by_one();
        v.labels.insert(Point::new(1, 0), "rear".into());
        v.pos = Tripoint::new(0, 0, 0);
        let before = v.global_part_pos(1);
        v.shift_parts(Point::new(1, 0));
        assert_eq!(v.labels.get(&Point::ZERO).map(String::as_str), Some("rear"));
        assert_eq!(v.pos, Tripoint::new(1, 0, 0));
        assert_eq!(v.global_part_pos(1), before);
    }

    #[test]
    fn test_shift_at_odd_facing_keeps_new_origin_in_place() {
        let mut v = crate::test_support::straight_line(4);
        v.set_facing(45);
        v.pos = Tripoint::new(20, 20, 0);
        let anchor = v.global_part_pos(2);
        v.shift_parts(Point::new(2, 0));
        assert_eq!(v.part(2).mount, Point::ZERO);
        assert_eq!(v.global_part_pos(2), anchor);
        v.shift_parts(Point::new(-2, 0));
        assert_eq!(v.pos, Tripoint::new(20, 20, 0));
    }

    #[test]
    fn test_shift_respects_facing() {
        let mut v = two_by_one();
        v.set_facing(180);
        v.pos = Tripoint::new(10, 10, 0);
        let before: Vec<Tripoint> = (0..v.part_count()).map(|i| v.global_part_pos(i)).collect();
        v.shift_parts(Point::new(1, 0));
        let after: Vec<Tripoint> = (0..v.part_count()).map(|i| v.global_part_pos(i)).collect();
        assert_eq!(before, after);
    }
}
