//! Physics derivation: mass and centre of mass, pivot, drag coefficients,
//! wheel configuration and traction.
//!
//! Each aggregate has a pure `compute_*` function over the part list and a
//! memoizing accessor on `&mut Vehicle` that fills [`PhysicsCache`] on first
//! use. Mutations clear the cache (see [`Vehicle::invalidate`]), so an
//! accessor never returns a value derived from a stale part list.
//!
//! [`PhysicsCache`]: crate::vehicle::Vehicle

use crate::constants::{flags, locations, physics};
use crate::point::Point;
use crate::vehicle::Vehicle;
use crate::world::Map;

/// Total mass and its centre, in mount and rotated coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MassSummary {
    pub total_kg: f64,
    pub center_mount: Point,
    pub center_precalc: Point,
}

/// Hull behaviour in water.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaterDrag {
    pub coefficient: f64,
    /// Depth the hull sinks to, metres.
    pub draft_m: f64,
    pub hull_height_m: f64,
    /// Has FLOATS parts at all.
    pub has_hull: bool,
}

impl WaterDrag {
    pub fn can_float(&self) -> bool {
        self.has_hull && self.draft_m < self.hull_height_m
    }
}

/// Frontmost (highest x) row of each feature in one drag column.
#[derive(Debug, Default)]
struct DragColumn {
    protrusion: Option<i32>,
    half_board: Option<i32>,
    shield: Option<i32>,
    seat: Option<i32>,
    /// Rearmost half board or tailgate.
    tail: Option<i32>,
    full_board: bool,
    aisle: bool,
    roof: bool,
    exposed: bool,
    turret: bool,
    panel: bool,
    windmill: bool,
}

fn front(slot: &mut Option<i32>, row: i32) {
    *slot = Some(slot.map_or(row, |r| r.max(row)));
}

impl Vehicle {
    // ── Mass ────────────────────────────────────────────────────────────

    /// Weight of one part with its fuel, cargo and rider.
    pub fn part_mass(&self, p: usize) -> f64 {
        let part = &self.parts[p];
        let fuel = part.contents.as_ref().map_or(0.0, |c| {
            self.registry()
                .fuel(&c.fuel)
                .map_or(0.0, |f| f.weight_per_unit * c.quantity as f64)
        });
        let cargo: f64 = part.items.iter().map(|i| i.weight_kg).sum();
        let rider = part.passenger.as_ref().map_or(0.0, |p| p.weight_kg);
        part.info.weight + fuel + cargo + rider
    }

    pub fn compute_mass(&self) -> MassSummary {
        let mut total = 0.0;
        let (mut mx, mut my, mut px, mut py) = (0.0, 0.0, 0.0, 0.0);
        for p in self.live_parts() {
            let m = self.part_mass(p);
            let part = &self.parts[p];
            total += m;
            mx += m * part.mount.x as f64;
            my += m * part.mount.y as f64;
            px += m * part.precalc.x as f64;
            py += m * part.precalc.y as f64;
        }
        if total <= 0.0 {
            return MassSummary {
                total_kg: 0.0,
                center_mount: Point::ZERO,
                center_precalc: Point::ZERO,
            };
        }
        MassSummary {
            total_kg: total,
            center_mount: Point::new((mx / total).round() as i32, (my / total).round() as i32),
            center_precalc: Point::new((px / total).round() as i32, (py / total).round() as i32),
        }
    }

    pub fn mass_summary(&mut self) -> MassSummary {
        if let Some(m) = self.cache.mass {
            return m;
        }
        let m = self.compute_mass();
        self.cache.mass = Some(m);
        m
    }

    /// Kilograms.
    pub fn total_mass(&mut self) -> f64 {
        self.mass_summary().total_kg
    }

    pub fn local_center_of_mass(&mut self) -> Point {
        self.mass_summary().center_mount
    }

    pub fn rotated_center_of_mass(&mut self) -> Point {
        self.mass_summary().center_precalc
    }

    // ── Pivot ───────────────────────────────────────────────────────────

    /// Rotation centre from a weighted average of wheel mounts.
    ///
    /// Fixed wheels resist sideways motion and pull the pivot towards them
    /// along x; steerable wheels barely do. Broken wheels drag hard both
    /// ways. Without a usable wheel layout the vehicle turns about `com`.
    pub fn compute_pivot(&self, com: Point) -> Point {
        if self.index.wheels.is_empty() || !self.wheel_config_ok(false, com) {
            return com;
        }
        let (mut x_num, mut x_den, mut y_num, mut y_den) = (0.0, 0.0, 0.0, 0.0);
        for &w in &self.index.wheels {
            let part = &self.parts[w];
            let area = part.info.wheel_area as f64;
            let (inline, perpendicular) = if part.is_broken() {
                (area * 2.0, area * 2.0)
            } else if part.has_flag(flags::STEERABLE) {
                (area * 0.1, area * 0.2)
            } else {
                (area * 0.1, area)
            };
            x_num += perpendicular * part.mount.x as f64;
            x_den += perpendicular;
            y_num += inline * part.mount.y as f64;
            y_den += inline;
        }
        if x_den < 0.1 || y_den < 0.1 {
            return com;
        }
        Point::new((x_num / x_den).round() as i32, (y_num / y_den).round() as i32)
    }

    /// Pivot in mount coordinates.
    pub fn pivot_point(&mut self) -> Point {
        if let Some(p) = self.cache.pivot {
            return p;
        }
        let com = self.local_center_of_mass();
        let pivot = self.compute_pivot(com);
        self.cache.pivot = Some(pivot);
        pivot
    }

    // ── Air drag ────────────────────────────────────────────────────────

    /// Aerodynamic coefficient from a column-by-column scan of the shape.
    ///
    /// Each column along the direction of travel is scored against a
    /// streamlined layout (half board, windshield, roofed seats) and the
    /// scores are averaged over the vehicle's width.
    pub fn compute_air_drag(&self) -> f64 {
        let Some((min, max)) = self.mount_bounds() else {
            return physics::AIR_MOD;
        };
        let width = (max.y - min.y + 1) as usize;
        let length = max.x - min.x + 1;
        let mut columns: Vec<DragColumn> = (0..width).map(|_| DragColumn::default()).collect();

        for (&mount, here) in &self.index.relative_parts {
            let Some(col) = columns.get_mut((mount.y - min.y) as usize) else {
                continue;
            };
            let row = mount.x - min.x;
            let protrusion_only = here.len() == 1 && self.parts[here[0]].has_flag(flags::PROTRUSION);
            if protrusion_only {
                front(&mut col.protrusion, row);
            }
            for &i in here {
                let p = &self.parts[i];
                if p.has_flag(flags::HALF_BOARD) {
                    front(&mut col.half_board, row);
                    col.tail = Some(col.tail.map_or(row, |t| t.min(row)));
                }
                if p.has_flag(flags::WINDSHIELD) && p.is_available() {
                    front(&mut col.shield, row);
                }
                if p.has_flag(flags::SEAT) {
                    front(&mut col.seat, row);
                }
                col.full_board |= p.has_flag(flags::FULL_BOARD);
                col.aisle |= p.has_flag(flags::AISLE);
                col.roof |= p.has_flag(flags::ROOF);
                col.panel |= p.has_flag(flags::SOLAR_PANEL);
                col.windmill |= p.has_flag(flags::WIND_TURBINE);
                col.turret |= p.info.location == locations::ON_ROOF
                    && !p.has_flag(flags::SOLAR_PANEL)
                    && !p.has_flag(flags::WIND_TURBINE);
                col.exposed |= p.info.location == locations::CENTER
                    && !p.inside
                    && !p.has_flag(flags::WINDSHIELD)
                    && !p.has_flag(flags::OPENABLE);
            }
        }

        let m = physics::AIR_MOD;
        let mut c_total = 0.0;
        let mut height_total = 0.0;
        for col in &columns {
            let mut c = physics::AIR_BASE;
            if col
                .protrusion
                .is_some_and(|p| col.half_board.map_or(true, |h| p > h))
            {
                c += m;
            }
            if col
                .shield
                .is_some_and(|s| col.half_board.map_or(true, |h| h < s))
            {
                c += 2.0 * m;
            }
            if col.seat.is_some_and(|s| col.shield.map_or(true, |w| w < s)) {
                c += 3.0 * m;
            }
            if col.exposed {
                c += 3.0 * m;
            }
            if 2 * length > width as i32 {
                c -= m;
            }
            if col.tail == Some(0) {
                c -= m;
            }
            if col.turret {
                c += 3.0 * m;
            }
            if col.windmill {
                c += 5.0 * m;
            }
            c_total += c;

            let mut h = physics::BASE_HEIGHT;
            if col.roof {
                h += physics::ROOF_HEIGHT;
            }
            if col.aisle {
                h += physics::AISLE_HEIGHT;
            }
            if col.full_board {
                h += physics::FULLBOARD_HEIGHT;
            }
            if col.panel {
                h += physics::ROOF_HEIGHT;
            }
            if col.windmill {
                h += physics::WINDMILL_HEIGHT;
            }
            height_total += h;
        }

        let w = width as f64;
        let cross_area = (height_total / w) * w * physics::TILE_SIZE_M;
        let coefficient = (c_total / w) * cross_area * 0.5 * physics::AIR_DENSITY;
        coefficient.max(physics::AIR_MOD)
    }

    pub fn coeff_air_drag(&mut self) -> f64 {
        if let Some(c) = self.cache.air_drag {
            return c;
        }
        let c = self.compute_air_drag();
        self.cache.air_drag = Some(c);
        c
    }

    // ── Rolling & water drag ────────────────────────────────────────────

    /// Rolling coefficient: mass times a per-wheel factor, normalized so
    /// four standard wheels score 1.0. Wheelless vehicles scrape along.
    pub fn compute_rolling_drag(&self, mass_kg: f64) -> f64 {
        let wheels = &self.index.wheels;
        let factor = if wheels.is_empty() {
            physics::NO_WHEEL_FACTOR
        } else {
            let sum: f64 = wheels
                .iter()
                .map(|&w| self.parts[w].info.rolling_resistance)
                .sum();
            let c = physics::STANDARD_WHEEL_C;
            sum * c / (4.0 * c - 4.0 + wheels.len() as f64)
        };
        physics::ROLLING_SCALE * factor * mass_kg
    }

    pub fn coeff_rolling_drag(&mut self) -> f64 {
        if let Some(c) = self.cache.rolling_drag {
            return c;
        }
        let mass = self.total_mass();
        let c = self.compute_rolling_drag(mass);
        self.cache.rolling_drag = Some(c);
        c
    }

    /// Water drag and draft. Displaced volume equals mass over water
    /// density; the hull is taken as a block with a tapered keel, so the
    /// submerged volume is two thirds of footprint times draft.
    pub fn compute_water_drag(&self, mass_kg: f64) -> WaterDrag {
        let structure = self.all_parts_at_location(locations::STRUCTURE).len();
        let has_hull = !self.index.floating.is_empty();
        let Some((min, max)) = self.mount_bounds().filter(|_| structure > 0) else {
            return WaterDrag {
                coefficient: physics::WATER_BASE,
                draft_m: 1.0,
                hull_height_m: physics::HULL_BASE_HEIGHT,
                has_hull,
            };
        };
        let coverage = (self.index.floating.len() as f64 / structure as f64).min(1.0);
        let width_m = (max.y - min.y + 1) as f64 * physics::TILE_SIZE_M;
        let footprint = structure as f64 * physics::TILE_SIZE_M * physics::TILE_SIZE_M;

        let draft_m = mass_kg / (physics::WATER_DENSITY * footprint * 2.0 / 3.0);
        let hull_height_m = physics::HULL_BASE_HEIGHT + physics::HULL_COVERAGE_HEIGHT * coverage;
        let c_water = physics::WATER_BASE - coverage;
        WaterDrag {
            coefficient: c_water * width_m * draft_m * 0.5 * physics::WATER_DENSITY,
            draft_m,
            hull_height_m,
            has_hull,
        }
    }

    pub fn water_drag(&mut self) -> WaterDrag {
        if let Some(w) = self.cache.water {
            return w;
        }
        let mass = self.total_mass();
        let w = self.compute_water_drag(mass);
        self.cache.water = Some(w);
        w
    }

    pub fn coeff_water_drag(&mut self) -> f64 {
        self.water_drag().coefficient
    }

    pub fn water_draft(&mut self) -> f64 {
        self.water_drag().draft_m
    }

    pub fn can_float(&mut self) -> bool {
        self.water_drag().can_float()
    }

    // ── Wheels ──────────────────────────────────────────────────────────

    /// Contact area of intact wheels.
    pub fn wheel_area(&self) -> i32 {
        self.index
            .wheels
            .iter()
            .filter(|&&w| !self.parts[w].is_broken())
            .map(|&w| self.parts[w].info.wheel_area)
            .sum()
    }

    /// Enough wheels (or floats, for a boat) to move at all.
    pub fn sufficient_wheel_config(&self, boat: bool) -> bool {
        let floats = self.index.floating.len();
        if floats > 0 {
            return boat && floats > 2;
        }
        match self.index.wheels.as_slice() {
            [] => false,
            [only] => {
                // A unicycle works for a bicycle-sized frame.
                let frames = self.all_parts_at_location(locations::STRUCTURE).len();
                self.parts[*only].has_flag(flags::STABLE) && frames <= 3
            }
            _ => true,
        }
    }

    /// The centre of mass sits inside the wheels' bounding box.
    pub fn balanced_wheel_config(&mut self) -> bool {
        let com = self.local_center_of_mass();
        self.wheels_surround(com)
    }

    pub fn valid_wheel_config(&mut self, boat: bool) -> bool {
        let com = self.local_center_of_mass();
        self.wheel_config_ok(boat, com)
    }

    fn wheel_config_ok(&self, boat: bool, com: Point) -> bool {
        self.sufficient_wheel_config(boat) && (boat || self.wheels_surround(com))
    }

    fn wheels_surround(&self, com: Point) -> bool {
        let mut mounts = self.index.wheels.iter().map(|&w| self.parts[w].mount);
        let Some(first) = mounts.next() else {
            return false;
        };
        let (lo, hi) = mounts.fold((first, first), |(lo, hi), m| {
            (
                Point::new(lo.x.min(m.x), lo.y.min(m.y)),
                Point::new(hi.x.max(m.x), hi.y.max(m.y)),
            )
        });
        (lo.x..=hi.x).contains(&com.x) && (lo.y..=hi.y).contains(&com.y)
    }

    /// 1.0 with working steering, 0.0 if every steering part is broken,
    /// -1.0 if there is none. Boats steer with the rudder of their hull.
    pub fn steering_effectiveness(&self) -> f64 {
        if !self.index.floating.is_empty() && self.in_water {
            return 1.0;
        }
        if self.index.steering.is_empty() {
            return -1.0;
        }
        if self
            .index
            .steering
            .iter()
            .any(|&s| !self.parts[s].is_broken())
        {
            1.0
        } else {
            0.0
        }
    }

    /// `50 / (50 + m)`, where m is mass per unit of effective wheel area.
    pub fn k_mass(&mut self) -> f64 {
        let wa = self.wheel_area() as f64;
        if wa <= 0.0 {
            return 0.0;
        }
        let m = self.total_mass() / (wa * 8.0 / 9.0);
        50.0 / (50.0 + m)
    }

    // ── Traction ────────────────────────────────────────────────────────

    /// Wheel area that grips the terrain it stands on.
    pub fn wheel_traction_area(&self, map: &dyn Map) -> f64 {
        self.index
            .wheels
            .iter()
            .filter(|&&w| !self.parts[w].is_broken())
            .map(|&w| {
                let terrain = map.terrain(self.global_part_pos(w));
                if terrain.deep_water {
                    0.0
                } else {
                    self.parts[w].info.wheel_area as f64 * terrain.traction
                }
            })
            .sum()
    }

    /// Traction factor for a contact area: `min(1, area / ((1 - coverage) * mass))`
    /// floored at 0.1. Zero if nothing touches the ground.
    pub fn k_traction(&mut self, area: f64) -> f64 {
        if area <= physics::MIN_TRACTION_AREA {
            return 0.0;
        }
        let full = self.wheel_area() as f64;
        if full <= 0.0 {
            return 0.0;
        }
        let penalty = (1.0 - area / full) * self.total_mass();
        (area / penalty).clamp(physics::MIN_TRACTION, 1.0)
    }

    /// Record whether the hull currently sits in water.
    pub fn update_water_state(&mut self, map: &dyn Map) {
        let frames = self.all_parts_at_location(locations::STRUCTURE);
        self.in_water = !frames.is_empty()
            && frames
                .iter()
                .all(|&f| map.terrain(self.global_part_pos(f)).water);
    }

    /// Traction for the current terrain. Afloat it is 1.0 if the hull
    /// floats and -1.0 (cannot move) if it sinks.
    pub fn traction(&mut self, map: &dyn Map) -> f64 {
        self.update_water_state(map);
        if self.in_water && !self.index.floating.is_empty() {
            return if self.can_float() { 1.0 } else { -1.0 };
        }
        let area = self.wheel_traction_area(map);
        self.k_traction(area)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::Tripoint;
    use crate::test_support::{registry, two_by_one, TestWorld};
    use crate::world::{Item, Terrain};

    fn car() -> Vehicle {
        // 3×2 frames, four wheels at the corners, an engine up front.
        let mut v = Vehicle::new(registry(), "car");
        for x in 0..3 {
            for y in 0..2 {
                v.install_part_forced(Point::new(x, y), "frame").unwrap();
            }
        }
        for (x, y) in [(0, 0), (0, 1), (2, 0), (2, 1)] {
            let id = if x == 2 { "wheel_steerable" } else { "wheel" };
            v.install_part_forced(Point::new(x, y), id).unwrap();
        }
        v.install_part_forced(Point::new(2, 0), "engine_v6").unwrap();
        v
    }

    #[test]
    fn test_mass_is_sum_of_parts() {
        let mut v = two_by_one();
        // Two frames, two wheels, one engine.
        assert!((v.total_mass() - (50.0 * 2.0 + 20.0 * 2.0 + 180.0)).abs() < 1e-9);
    }

    #[test]
    fn test_mass_counts_fuel_and_cargo() {
        let mut v = two_by_one();
        let base = v.total_mass();
        let tank = v.install_part(Point::new(1, 0), "tank").unwrap();
        v.part_mut(tank).ammo_set("gasoline", 40_000);
        v.invalidate_mass();
        assert!((v.total_mass() - base - 25.0 - 30.0).abs() < 1e-6);

        v.part_mut(tank).items.push(Item::new("anvil").with_weight(50.0));
        v.invalidate_mass();
        assert!((v.total_mass() - base - 105.0).abs() < 1e-6);
    }

    #[test]
    fn test_center_of_mass_leans_toward_engine() {
        let mut v = car();
        let com = v.local_center_of_mass();
        assert_eq!(com, Point::new(1, 0));
    }

    #[test]
    fn test_rotated_center_follows_facing() {
        let mut v = car();
        let local = v.local_center_of_mass();
        v.set_facing(90);
        assert_eq!(v.rotated_center_of_mass(), local.rotated(90));
    }

    #[test]
    fn test_cache_clears_on_refresh() {
        let mut v = two_by_one();
        let _ = v.total_mass();
        let _ = v.pivot_point();
        let _ = v.coeff_air_drag();
        let _ = v.coeff_rolling_drag();
        let _ = v.coeff_water_drag();
        assert!(v.caches_clean());
        v.install_part(Point::new(1, 0), "seat").unwrap();
        assert!(!v.caches_clean());
    }

    #[test]
    fn test_invalidate_mass_keeps_air_drag() {
        let mut v = two_by_one();
        let _ = v.coeff_air_drag();
        let _ = v.total_mass();
        v.invalidate_mass();
        assert!(v.cache.air_drag.is_some());
        assert!(v.cache.mass.is_none());
    }

    #[test]
    fn test_pivot_sits_on_fixed_axle() {
        let mut v = car();
        // Fixed wheels at x = 0 dominate the x average.
        let pivot = v.pivot_point();
        assert_eq!(pivot.x, 0);
    }

    #[test]
    fn test_pivot_falls_back_to_com_without_wheels() {
        let mut v = Vehicle::new(registry(), "sled");
        v.install_part_forced(Point::ZERO, "frame").unwrap();
        v.install_part_forced(Point::new(1, 0), "frame").unwrap();
        v.install_part_forced(Point::new(1, 0), "engine_v6").unwrap();
        let com = v.local_center_of_mass();
        assert_eq!(v.pivot_point(), com);
    }

    #[test]
    fn test_air_drag_floor_and_streamlining() {
        let mut bare = car();
        let plain = bare.coeff_air_drag();
        assert!(plain >= physics::AIR_MOD);

        let mut exposed = car();
        exposed.install_part_forced(Point::new(1, 0), "seat").unwrap();
        exposed.install_part_forced(Point::new(1, 1), "seat").unwrap();
        let open_seats = exposed.coeff_air_drag();
        assert!(open_seats > plain);

        let mut shielded = car();
        for y in 0..2 {
            shielded.install_part_forced(Point::new(1, y), "seat").unwrap();
            shielded.install_part_forced(Point::new(2, y), "windshield").unwrap();
        }
        assert!(shielded.coeff_air_drag() < open_seats);
    }

    #[test]
    fn test_turret_adds_drag() {
        let mut v = car();
        let before = v.coeff_air_drag();
        v.install_part_forced(Point::new(1, 0), "turret_mount").unwrap();
        assert!(v.coeff_air_drag() > before);
    }

    #[test]
    fn test_rolling_drag_normalized_for_four_wheels() {
        let mut v = car();
        let mass = v.total_mass();
        let expected = physics::ROLLING_SCALE * 1.0 * mass;
        assert!((v.coeff_rolling_drag() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_rolling_drag_without_wheels_is_heavy() {
        let mut v = Vehicle::new(registry(), "sled");
        v.install_part_forced(Point::ZERO, "frame").unwrap();
        let mass = v.total_mass();
        let expected = physics::ROLLING_SCALE * physics::NO_WHEEL_FACTOR * mass;
        assert!((v.coeff_rolling_drag() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_boat_floats_and_brick_sinks() {
        let mut boat = Vehicle::new(registry(), "raft");
        for x in 0..2 {
            for y in 0..2 {
                boat.install_part_forced(Point::new(x, y), "frame_light").unwrap();
                boat.install_part_forced(Point::new(x, y), "boat_board").unwrap();
            }
        }
        assert!(boat.can_float());
        assert!(boat.water_draft() < boat.water_drag().hull_height_m);

        let mut brick = two_by_one();
        assert!(!brick.can_float());
    }

    #[test]
    fn test_wheel_configs() {
        let mut v = car();
        assert!(v.sufficient_wheel_config(false));
        assert!(v.balanced_wheel_config());
        assert!(v.valid_wheel_config(false));

        let mut bike = Vehicle::new(registry(), "unicycle");
        bike.install_part_forced(Point::ZERO, "frame_light").unwrap();
        bike.install_part_forced(Point::ZERO, "wheel_bicycle").unwrap();
        assert!(bike.sufficient_wheel_config(false));

        let mut cart = Vehicle::new(registry(), "cart");
        cart.install_part_forced(Point::ZERO, "frame").unwrap();
        cart.install_part_forced(Point::ZERO, "wheel").unwrap();
        assert!(!cart.sufficient_wheel_config(false));
    }

    #[test]
    fn test_unbalanced_when_mass_outside_wheels() {
        let mut v = Vehicle::new(registry(), "wheelbarrow");
        for x in 0..3 {
            v.install_part_forced(Point::new(x, 0), "frame").unwrap();
        }
        v.install_part_forced(Point::ZERO, "wheel").unwrap();
        v.install_part_forced(Point::new(1, 0), "wheel").unwrap();
        v.install_part_forced(Point::new(2, 0), "engine_v8").unwrap();
        v.install_part_forced(Point::new(2, 0), "tank").unwrap();
        assert_eq!(v.local_center_of_mass().x, 2);
        assert!(!v.balanced_wheel_config());
    }

    #[test]
    fn test_steering_effectiveness() {
        let mut v = car();
        assert_eq!(v.steering_effectiveness(), 1.0);
        for s in v.index.steering.clone() {
            v.part_mut(s).hp = 0;
        }
        assert_eq!(v.steering_effectiveness(), 0.0);
        let plain = two_by_one();
        assert_eq!(plain.steering_effectiveness(), -1.0);
    }

    #[test]
    fn test_traction_on_ground_and_mud() {
        let mut v = car();
        let mut world = TestWorld::default();
        assert_eq!(v.traction(&world), 1.0);

        for x in 0..3 {
            for y in 0..2 {
                world.set_terrain(
                    Tripoint::new(x, y, 0),
                    Terrain {
                        traction: 0.01,
                        ..Terrain::default()
                    },
                );
            }
        }
        let t = v.traction(&world);
        assert!(t >= physics::MIN_TRACTION && t < 1.0);
    }

    #[test]
    fn test_traction_zero_without_contact() {
        let mut v = car();
        assert_eq!(v.k_traction(0.0), 0.0);
    }

    #[test]
    fn test_traction_sentinel_when_sinking() {
        let mut v = car();
        v.install_part_forced(Point::ZERO, "boat_board").unwrap();
        v.part_mut(0).items.push(Item::new("anvil").with_weight(2000.0));
        v.invalidate_mass();
        let mut world = TestWorld::default();
        for x in 0..3 {
            for y in 0..2 {
                world.set_terrain(Tripoint::new(x, y, 0), Terrain::deep_water());
            }
        }
        assert_eq!(v.traction(&world), -1.0);
        assert!(v.in_water);
    }

    #[test]
    fn test_k_mass_drops_with_load() {
        let mut v = car();
        let light = v.k_mass();
        let tank = v.install_part_forced(Point::new(1, 1), "tank").unwrap();
        v.part_mut(tank).ammo_set("gasoline", 60_000);
        v.invalidate_mass();
        assert!(v.k_mass() < light);
        assert!(light > 0.0 && light < 1.0);
    }
}
