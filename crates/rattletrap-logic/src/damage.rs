//! Damage cascade: hits, armor, breaking, and tearing parts off.
//!
//! All removals here only tombstone parts. Callers run
//! [`part_removal_cleanup`](Vehicle::part_removal_cleanup) and then
//! [`find_and_split_vehicles`](Vehicle::find_and_split_vehicles) once the
//! hit has been resolved; pieces a destroyed frame leaves without a path to
//! the rest of the vehicle come off as vehicles of their own.

use rand::Rng;

use crate::constants::{flags, locations};
use crate::part_info::DamageType;
use crate::point::{Point, Tripoint};
use crate::vehicle::Vehicle;
use crate::world::{Item, Map, Messages, MsgKind};

/// Parameters of a wreck-style [`Vehicle::smash`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Smash {
    /// Fraction of durability lost, lower bound.
    pub hp_loss_min: f64,
    pub hp_loss_max: f64,
    /// Chance (0..=1) that any one part is hit.
    pub fraction: f64,
    /// Mount the crush is centred on.
    pub origin: Point,
    /// Falloff radius in tiles. 0 = uniform damage.
    pub radius: f64,
}

impl Default for Smash {
    fn default() -> Self {
        Self {
            hp_loss_min: 0.1,
            hp_loss_max: 1.2,
            fraction: 1.0,
            origin: Point::ZERO,
            radius: 0.0,
        }
    }
}

impl Vehicle {
    /// Hit the square of part `p`.
    ///
    /// Unaimed hits only land where a closed obstacle stands in the way. A
    /// random part on the square takes the blow; armor on the square soaks
    /// its reduction first unless the target sits overhead. Returns the
    /// damage left over after the hit.
    pub fn damage<W: Map + Messages>(
        &mut self,
        p: usize,
        dmg: i32,
        kind: DamageType,
        aimed: bool,
        rng: &mut impl Rng,
        world: &mut W,
    ) -> i32 {
        if dmg < 1 {
            return dmg;
        }
        let Some(mount) = self.get_part(p).map(|part| part.mount) else {
            return dmg;
        };
        let here = self.parts_at_relative(mount).to_vec();
        if here.is_empty() {
            return dmg;
        }
        if !aimed {
            let blocked = here.iter().any(|&i| {
                let part = &self.parts[i];
                part.has_flag(flags::OBSTACLE) && !(part.has_flag(flags::OPENABLE) && part.open)
            });
            if !blocked {
                return dmg;
            }
        }

        let mut target = here[rng.gen_range(0..here.len())];
        if self.parts[target].has_flag(flags::DOOR_MOTOR) {
            // The motor sits behind its door.
            let door = here
                .iter()
                .copied()
                .filter(|&i| {
                    let part = &self.parts[i];
                    part.has_flag(flags::OPENABLE) && !part.open && !part.is_broken()
                })
                .max_by_key(|&i| self.parts[i].hp);
            if let Some(door) = door {
                target = door;
            }
        }

        let Some(armor) = self.part_with_feature(target, flags::ARMOR, false) else {
            return self.damage_direct(target, dmg, kind, rng, world);
        };
        if armor == target {
            return self.damage_direct(armor, dmg, kind, rng, world);
        }
        let overhead = self.parts[target].has_flag(flags::ROOF)
            || self.parts[target].info.location == locations::ON_ROOF;
        let protection = self.parts[armor].info.damage_reduction(kind);
        let through = if overhead { dmg } else { dmg - protection };
        self.damage_direct(target, through, kind, rng, world);
        self.damage_direct(armor, dmg, kind, rng, world)
    }

    /// Apply `dmg` to part `p` alone. Hitting an already broken part may
    /// tear it off. Returns the damage that passed through the part.
    pub fn damage_direct<W: Map + Messages>(
        &mut self,
        p: usize,
        dmg: i32,
        kind: DamageType,
        rng: &mut impl Rng,
        world: &mut W,
    ) -> i32 {
        if self.get_part(p).is_none() {
            return dmg;
        }
        if self.parts[p].is_broken() {
            return self.break_off(p, dmg, rng, world);
        }

        let info = self.parts[p].info.clone();
        let threshold = (info.durability / 10).min(20);
        if dmg < threshold && kind != DamageType::Pure {
            return dmg;
        }
        let dmg = dmg - info.damage_reduction(kind).min(dmg);
        let dres = dmg - self.parts[p].hp;

        if self.wound(p, dmg) {
            let pos = self.global_part_pos(p);
            log::debug!("{}: {} broke at {:?}", self.name, info.name, pos);
            self.leak_fuel(p, rng, world);
            for item in std::mem::take(&mut self.parts[p].items) {
                world.add_item(pos, item);
            }
            self.invalidate_mass();
        }

        if self.parts[p].is_broken() && info.has_flag(flags::UNMOUNT_ON_DAMAGE) {
            let pos = self.global_part_pos(p);
            world.add_item(pos, Item::new(info.item.clone()));
            self.remove_part(p, world);
        }
        dres.max(0)
    }

    /// Try to tear broken part `p` off. Tough parts shrug off small hits.
    ///
    /// A destroyed frame takes everything on its mount with it: broken
    /// parts shatter into debris, intact ones drop as items.
    pub fn break_off<W: Map + Messages>(
        &mut self,
        p: usize,
        dmg: i32,
        rng: &mut impl Rng,
        world: &mut W,
    ) -> i32 {
        if self.get_part(p).is_none() {
            return dmg;
        }
        let info = self.parts[p].info.clone();
        if rng.gen_range(0..=(info.durability / 10).max(0)) >= dmg {
            return dmg;
        }
        let pos = self.global_part_pos(p);

        if info.is_structural() {
            let others: Vec<usize> = self
                .parts_at_relative(self.parts[p].mount)
                .iter()
                .rev()
                .copied()
                .filter(|&i| i != p)
                .collect();
            for i in others {
                // Dependents go with their parent.
                if self.parts[i].removed {
                    continue;
                }
                let name = self.parts[i].name().to_string();
                if self.parts[i].is_broken() {
                    world.add_msg(
                        MsgKind::Bad,
                        format!("The {}'s {} breaks into pieces!", self.name, name),
                    );
                    self.break_into_pieces(i, pos, world);
                } else {
                    world.add_msg(MsgKind::Bad, format!("The {}'s {} is torn off!", self.name, name));
                    world.add_item(pos, self.part_as_item(i));
                }
                self.remove_part(i, world);
            }
        }

        world.add_msg(
            MsgKind::Bad,
            format!("The {}'s {} is destroyed!", self.name, info.name),
        );
        self.break_into_pieces(p, pos, world);
        self.remove_part(p, world);
        dmg
    }

    /// Crash damage spread from `impact` over the load-bearing frame,
    /// falling off with the square of the distance. The impact mount itself
    /// is spared; the part that hit is damaged separately.
    pub fn damage_all<W: Map + Messages>(
        &mut self,
        dmg1: i32,
        dmg2: i32,
        kind: DamageType,
        impact: Point,
        rng: &mut impl Rng,
        world: &mut W,
    ) {
        let (lo, hi) = if dmg1 <= dmg2 { (dmg1, dmg2) } else { (dmg2, dmg1) };
        if hi < 1 {
            return;
        }
        let targets: Vec<usize> = self
            .live_parts()
            .filter(|&p| {
                let info = &self.parts[p].info;
                info.is_structural() && !info.has_flag(flags::PROTRUSION)
            })
            .collect();
        for p in targets {
            if self.parts[p].removed {
                continue;
            }
            let distance = 1 + self.parts[p].mount.square_dist(impact);
            if distance > 1 {
                let dmg = rng.gen_range(lo..=hi) / (distance * distance);
                self.damage_direct(p, dmg, kind, rng, world);
            }
        }
    }

    /// Spill a tank's contents onto passable tiles around it.
    pub fn leak_fuel(&mut self, p: usize, rng: &mut impl Rng, map: &mut dyn Map) {
        let part = &self.parts[p];
        if !part.info.is_tank() || part.ammo_remaining() <= 0 {
            return;
        }
        let fuel = part.ammo_current().to_string();
        let center = self.global_part_pos(p);
        let tiles: Vec<Tripoint> = (-1..=1)
            .flat_map(|dy| (-1..=1).map(move |dx| center + Point::new(dx, dy)))
            .filter(|&t| map.terrain(t).passable)
            .collect();

        if !tiles.is_empty() {
            while self.parts[p].ammo_remaining() > 0 {
                let left = self.parts[p].ammo_remaining();
                let want = rng.gen_range(0..=(left / 3).max(1));
                let spilled = self.parts[p].ammo_consume(want);
                if spilled > 0 {
                    let at = tiles[rng.gen_range(0..tiles.len())];
                    map.add_item(at, Item::with_charges(fuel.clone(), spilled));
                }
            }
        }
        self.parts[p].ammo_unset();
        self.invalidate_mass();
    }

    /// Wreck the vehicle: mounts holding more than one frame are crushed
    /// outright, other parts lose a random share of their durability.
    pub fn smash(&mut self, params: Smash, rng: &mut impl Rng) {
        for p in 0..self.parts.len() {
            let part = &self.parts[p];
            if part.removed || part.is_broken() {
                continue;
            }
            let here = self.parts_at_relative(part.mount).to_vec();
            let frames = here
                .iter()
                .filter(|&&i| self.parts[i].info.is_structural())
                .count();
            if frames > 1 {
                for i in here {
                    self.parts[i].hp = 0;
                    self.parts[i].ammo_unset();
                }
                continue;
            }

            let roll: i32 = rng.gen_range(1..=1000);
            if f64::from(roll) > params.fraction * 1000.0 {
                continue;
            }
            let falloff = if params.radius == 0.0 {
                1.0
            } else {
                let d = params.origin - self.parts[p].precalc;
                let dist = f64::from(d.x * d.x + d.y * d.y).sqrt();
                (1.0 - dist / params.radius).clamp(0.0, 1.0)
            };
            let lo = params.hp_loss_min * falloff;
            let hi = (params.hp_loss_max * falloff).max(lo);
            let loss = rng.gen_range(lo..=hi) * f64::from(self.parts[p].info.durability);
            if self.wound(p, loss as i32) {
                self.parts[p].ammo_unset();
            }
        }
        self.refresh_insides();
        self.invalidate();
    }

    /// Subtract `dmg` from part `p`. True if this blow broke it.
    fn wound(&mut self, p: usize, dmg: i32) -> bool {
        let part = &mut self.parts[p];
        let was_broken = part.is_broken();
        part.hp = (part.hp - dmg).clamp(0, part.info.durability);
        let broke = !was_broken && part.is_broken();
        if broke {
            self.refresh_insides();
        }
        self.invalidate();
        broke
    }

    fn break_into_pieces(&self, p: usize, pos: Tripoint, map: &mut dyn Map) {
        let group = &self.parts[p].info.breaks_into;
        if !group.is_empty() {
            map.spawn_item_group(pos, group);
        }
    }

    /// The item a part turns back into when it comes off intact.
    fn part_as_item(&self, p: usize) -> Item {
        let part = &self.parts[p];
        match &part.contents {
            Some(c) if part.info.is_fuel_store() && c.quantity > 0 => {
                Item::with_charges(part.info.item.clone(), c.quantity)
            }
            _ => Item::new(part.info.item.clone()),
        }
    }
}
