//! Simulation engine - owns the vehicles and the map and advances turns

use std::collections::BTreeMap;
use std::sync::Arc;

use hecs::Entity;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rattletrap_logic::graph::{self, VehicleGraph};
use rattletrap_logic::power::Ambient;
use rattletrap_logic::prototype::{SpawnOptions, VehiclePrototype};
use rattletrap_logic::world::{Messages, MsgKind};
use rattletrap_logic::{DamageType, PartRegistry, Point, Tripoint, Vehicle};

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::grid::TileGrid;
use crate::registry::VehicleMap;

/// What happened to the vehicle population during one turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnReport {
    /// Vehicles created by structural splits.
    pub spawned: Vec<Entity>,
    /// Vehicles that ran out of parts and were removed.
    pub destroyed: Vec<Entity>,
    /// Vehicles whose engines died for lack of fuel.
    pub stalled: Vec<Entity>,
}

/// Main simulation engine
pub struct SimulationEngine {
    /// Every vehicle on the map
    pub vehicles: VehicleMap,
    /// Terrain, ground items and the message log
    pub grid: TileGrid,
    /// Sun and wind for solar panels and turbines
    pub ambient: Ambient,
    /// Turns elapsed since start
    pub turn: u64,

    config: EngineConfig,
    registry: Arc<PartRegistry>,
    prototypes: BTreeMap<String, VehiclePrototype>,
    rng: StdRng,
}

impl SimulationEngine {
    /// Create an empty simulation over a loaded part registry
    pub fn new(registry: Arc<PartRegistry>, config: EngineConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            vehicles: VehicleMap::new(),
            grid: TileGrid::new(),
            ambient: Ambient::default(),
            turn: 0,
            config,
            registry,
            prototypes: BTreeMap::new(),
            rng,
        }
    }

    /// Build an engine straight from the part and vehicle data files
    pub fn from_data(parts_json: &str, vehicles_json: &str, config: EngineConfig) -> Result<Self> {
        let registry = Arc::new(PartRegistry::from_json(parts_json)?);
        let mut engine = Self::new(registry, config);
        engine.load_prototypes(vehicles_json)?;
        Ok(engine)
    }

    /// Add prototypes from a `{ "vehicles": [...] }` document. Later ids
    /// replace earlier ones. Returns how many were read.
    pub fn load_prototypes(&mut self, json: &str) -> Result<usize> {
        let list = VehiclePrototype::list_from_json(json)?;
        let count = list.len();
        for proto in list {
            self.prototypes.insert(proto.id.clone(), proto);
        }
        log::info!("loaded {count} vehicle prototypes");
        Ok(count)
    }

    pub fn prototype_ids(&self) -> impl Iterator<Item = &str> {
        self.prototypes.keys().map(String::as_str)
    }

    pub fn registry(&self) -> &Arc<PartRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub(crate) fn reseed(&mut self, turn: u64) {
        self.rng = StdRng::seed_from_u64(self.config.seed ^ turn);
    }

    // ── Spawning ────────────────────────────────────────────────────────

    /// Spawn options for new vehicles: full tanks, mint condition, reactors
    /// as configured.
    pub fn spawn_options(&self) -> SpawnOptions {
        SpawnOptions {
            reactors_on: self.config.reactor_enabled,
            ..SpawnOptions::default()
        }
    }

    /// Spawn prototype `id` with its origin at `pos` facing `face` degrees
    pub fn spawn_vehicle(&mut self, id: &str, pos: Tripoint, face: i32) -> Result<Entity> {
        let opts = self.spawn_options();
        self.spawn_vehicle_with(id, pos, face, opts)
    }

    pub fn spawn_vehicle_with(
        &mut self,
        id: &str,
        pos: Tripoint,
        face: i32,
        opts: SpawnOptions,
    ) -> Result<Entity> {
        let proto = self
            .prototypes
            .get(id)
            .ok_or_else(|| Error::UnknownPrototype { id: id.to_string() })?;
        let mut veh = Vehicle::from_prototype(self.registry.clone(), proto, opts, &mut self.rng)?;
        veh.pos = pos;
        veh.set_facing(face);
        Ok(self.vehicles.spawn(veh))
    }

    /// Register an already built vehicle
    pub fn add_vehicle(&mut self, veh: Vehicle) -> Entity {
        self.vehicles.spawn(veh)
    }

    // ── Turn loop ───────────────────────────────────────────────────────

    /// Advance the simulation by one turn
    pub fn update(&mut self) -> TurnReport {
        self.turn += 1;
        let mut report = TurnReport::default();
        let handles = self.vehicles.handles();

        for &h in &handles {
            self.vehicles
                .with_vehicle(h, |v| v.update_water_state(&self.grid));
            graph::power_parts(
                &mut self.vehicles,
                h,
                self.ambient,
                &mut self.rng,
                &mut self.grid,
            );
            let stalled = self.run_engines(h);
            if stalled {
                report.stalled.push(h);
            }
        }

        let (spawned, destroyed) = self.settle(&handles);
        report.spawned = spawned;
        report.destroyed = destroyed;
        self.vehicles.reindex();
        report
    }

    /// Burn a turn's fuel for a running vehicle and stall it if every
    /// engine has run dry. Returns true on a stall.
    fn run_engines(&mut self, h: Entity) -> bool {
        let turn_seconds = self.config.turn_seconds;
        let idle = self.config.idle_load;
        let rng = &mut self.rng;
        let grid = &mut self.grid;
        self.vehicles
            .with_vehicle(h, |v| {
                if !v.engine_on {
                    return false;
                }
                let load = throttle(v, idle);
                v.consume_fuel(load, turn_seconds, rng);
                let running = v
                    .engines()
                    .iter()
                    .any(|&e| v.is_engine_on(e) && v.engine_has_fuel(e));
                if running {
                    return false;
                }
                v.engine_on = false;
                v.alternator_load = 0;
                grid.add_msg(MsgKind::Bad, format!("The {}'s engine dies!", v.name));
                log::info!("{} stalled", v.name);
                true
            })
            .unwrap_or(false)
    }

    /// Compact every vehicle touched this turn, destroy the empty ones and
    /// split the broken ones.
    fn settle(&mut self, handles: &[Entity]) -> (Vec<Entity>, Vec<Entity>) {
        let auto_split = self.config.auto_split;
        let mut spawned = Vec::new();
        let mut destroyed = Vec::new();
        for &h in handles {
            let outcome = self.vehicles.with_vehicle(h, |v| {
                if v.part_removal_cleanup() {
                    return None;
                }
                Some(if auto_split {
                    v.find_and_split_vehicles()
                } else {
                    Vec::new()
                })
            });
            match outcome {
                Some(Some(pieces)) => {
                    for piece in pieces {
                        spawned.push(self.vehicles.spawn(piece));
                    }
                }
                Some(None) => {
                    if let Some(v) = self.vehicles.despawn(h) {
                        log::info!("{} destroyed", v.name);
                    }
                    destroyed.push(h);
                }
                None => {}
            }
        }
        (spawned, destroyed)
    }

    // ── Damage ──────────────────────────────────────────────────────────

    /// Aimed hit on whatever sits at `mount`. Removals are settled by the
    /// next `update`. Returns the damage left over.
    pub fn damage_at(&mut self, h: Entity, mount: Point, dmg: i32, kind: DamageType) -> Result<i32> {
        let rng = &mut self.rng;
        let grid = &mut self.grid;
        self.vehicles
            .with_vehicle(h, |v| {
                let target = v.parts_at_relative(mount).first().copied();
                target.map_or(dmg, |p| v.damage(p, dmg, kind, true, rng, grid))
            })
            .ok_or(Error::NoSuchVehicle(h))
    }

    /// Damage part `p` directly, bypassing armor.
    pub fn damage_part(&mut self, h: Entity, p: usize, dmg: i32, kind: DamageType) -> Result<i32> {
        let rng = &mut self.rng;
        let grid = &mut self.grid;
        self.vehicles
            .with_vehicle(h, |v| v.damage_direct(p, dmg, kind, rng, grid))
            .ok_or(Error::NoSuchVehicle(h))
    }

    /// Collision damage spreading out from `impact`.
    pub fn collide(&mut self, h: Entity, impact: Point, dmg_lo: i32, dmg_hi: i32) -> Result<()> {
        let rng = &mut self.rng;
        let grid = &mut self.grid;
        self.vehicles
            .with_vehicle(h, |v| v.damage_all(dmg_lo, dmg_hi, DamageType::Bash, impact, rng, grid))
            .ok_or(Error::NoSuchVehicle(h))
    }

    // ── Racks ───────────────────────────────────────────────────────────

    /// Load `carry` onto the free racks of `host`. The carried vehicle's
    /// handle is dead afterwards.
    pub fn rack_vehicle(&mut self, host: Entity, carry: Entity) -> Result<()> {
        let carried = self
            .vehicles
            .get(carry)
            .map(|v| Vehicle::clone(&v))
            .ok_or(Error::NoSuchVehicle(carry))?;
        self.vehicles
            .with_vehicle(host, |h| {
                let racks = h.free_racks();
                h.merge_rackable_vehicle(&carried, &racks)
            })
            .ok_or(Error::NoSuchVehicle(host))??;
        self.vehicles.despawn(carry);
        self.vehicles.reindex();
        Ok(())
    }

    /// Unload every vehicle carried by `host`, returning their new handles.
    pub fn unrack_vehicle(&mut self, host: Entity) -> Result<Vec<Entity>> {
        let mut unloaded = Vec::new();
        loop {
            let next = self
                .vehicles
                .with_vehicle(host, |h| {
                    let groups = h.carried_vehicles();
                    groups.first().map(|g| h.remove_carried_vehicle(g))
                })
                .ok_or(Error::NoSuchVehicle(host))?;
            match next {
                Some(veh) => unloaded.push(self.vehicles.spawn(veh?)),
                None => break,
            }
        }
        self.vehicles.reindex();
        Ok(unloaded)
    }

    // ── Engines ─────────────────────────────────────────────────────────

    pub fn start_engines(&mut self, h: Entity) -> Result<bool> {
        let grid = &mut self.grid;
        self.vehicles
            .with_vehicle(h, |v| v.start_engines(grid))
            .ok_or(Error::NoSuchVehicle(h))
    }

    pub fn stop_engines(&mut self, h: Entity) -> Result<()> {
        let grid = &mut self.grid;
        self.vehicles
            .with_vehicle(h, |v| v.stop_engines(grid))
            .ok_or(Error::NoSuchVehicle(h))
    }

    /// Battery charge reachable from `h` over cables
    pub fn network_battery_left(&mut self, h: Entity) -> i64 {
        graph::network_battery_left(&mut self.vehicles, h)
    }

    /// Link two vehicles with a cable part
    pub fn connect_cable(
        &mut self,
        a: (Entity, Point),
        b: (Entity, Point),
        cable_id: &str,
    ) -> std::result::Result<(), rattletrap_logic::mount::MountRefusal> {
        graph::connect_cable(&mut self.vehicles, a, b, cable_id)
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub fn vehicle_count(&self) -> usize {
        self.vehicles.len()
    }

    /// The vehicle with a part on `pos`
    pub fn vehicle_at(&self, pos: Tripoint) -> Option<Entity> {
        self.vehicles.find_vehicle(pos)
    }

    /// Save simulation state to a writer
    pub fn save<W: std::io::Write>(&self, writer: W) -> Result<()> {
        crate::persistence::save_to(writer, self)
    }

    /// Replace vehicles and ground items with those read from `reader`
    pub fn load<R: std::io::Read>(&mut self, reader: R) -> Result<()> {
        let loaded = crate::persistence::load_from(reader, &self.registry)?;
        self.vehicles = VehicleMap::new();
        for veh in loaded.vehicles {
            self.vehicles.spawn(veh);
        }
        self.grid.set_items(loaded.items);
        self.ambient = loaded.ambient;
        self.turn = loaded.turn;
        self.reseed(loaded.turn);
        Ok(())
    }
}

/// Share of full throttle the engines run at. Idling still burns a little.
fn throttle(v: &mut Vehicle, idle: f64) -> f64 {
    let top = v.max_velocity(true);
    if top <= 0 {
        return idle;
    }
    (f64::from(v.velocity.abs()) / f64::from(top)).clamp(idle, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::engine;

    #[test]
    fn test_spawn_unknown_prototype() {
        let mut eng = engine();
        let err = eng.spawn_vehicle("hovercraft", Tripoint::default(), 0).unwrap_err();
        assert!(matches!(err, Error::UnknownPrototype { .. }));
    }

    #[test]
    fn test_spawn_places_and_turns() {
        let mut eng = engine();
        let h = eng.spawn_vehicle("bicycle", Tripoint::new(4, 4, 0), 90).unwrap();
        assert_eq!(eng.vehicle_at(Tripoint::new(4, 4, 0)), Some(h));
        // Facing south, the front wheel sits one tile down.
        assert_eq!(eng.vehicle_at(Tripoint::new(4, 5, 0)), Some(h));
        assert_eq!(eng.vehicle_at(Tripoint::new(5, 4, 0)), None);
    }

    #[test]
    fn test_reactor_config_reaches_spawn() {
        let mut eng = SimulationEngine::from_data(
            crate::test_support::PARTS_JSON,
            crate::test_support::VEHICLES_JSON,
            EngineConfig {
                reactor_enabled: false,
                ..EngineConfig::default()
            },
        )
        .unwrap();
        let h = eng.spawn_vehicle("reactor_van", Tripoint::default(), 0).unwrap();
        let v = eng.vehicles.get(h).unwrap();
        let reactor = v.all_parts_with_feature("REACTOR", false)[0];
        assert!(!v.part(reactor).enabled);
    }

    #[test]
    fn test_running_engine_burns_fuel() {
        let mut eng = engine();
        let h = eng.spawn_vehicle("car", Tripoint::default(), 0).unwrap();
        assert!(eng.start_engines(h).unwrap());
        let before = eng.vehicles.get(h).unwrap().fuel_left("gasoline");
        for _ in 0..10 {
            eng.update();
        }
        let after = eng.vehicles.get(h).unwrap().fuel_left("gasoline");
        assert!(after < before, "{after} !< {before}");
        assert_eq!(eng.turn, 10);
    }

    #[test]
    fn test_stopped_engine_burns_nothing() {
        let mut eng = engine();
        let h = eng.spawn_vehicle("car", Tripoint::default(), 0).unwrap();
        let before = eng.vehicles.get(h).unwrap().fuel_left("gasoline");
        eng.update();
        assert_eq!(eng.vehicles.get(h).unwrap().fuel_left("gasoline"), before);
    }

    #[test]
    fn test_dry_tank_stalls_engine() {
        let mut eng = engine();
        let h = eng.spawn_vehicle("car", Tripoint::default(), 0).unwrap();
        assert!(eng.start_engines(h).unwrap());
        eng.vehicles.with_vehicle(h, |v| {
            let fuel = v.fuel_left("gasoline");
            v.drain("gasoline", fuel);
        });
        let report = eng.update();
        assert_eq!(report.stalled, vec![h]);
        assert!(!eng.vehicles.get(h).unwrap().engine_on);
        assert!(eng.grid.has_message("engine dies"));
    }

    #[test]
    fn test_destroyed_frame_splits_on_update() {
        let mut eng = engine();
        let h = eng
            .spawn_vehicle("pickup_with_rack", Tripoint::new(30, 30, 0), 0)
            .unwrap();
        let frame = eng
            .vehicles
            .with_vehicle(h, |v| {
                let frame = v.structural_part_at(Point::new(-1, 0)).unwrap();
                v.part_mut(frame).hp = 0;
                frame
            })
            .unwrap();
        eng.damage_part(h, frame, 1_000_000, DamageType::Bash).unwrap();
        let report = eng.update();
        assert_eq!(report.spawned.len(), 1);
        assert!(report.destroyed.is_empty());
        assert_eq!(eng.vehicle_count(), 2);
        let rear = report.spawned[0];
        assert_eq!(eng.vehicle_at(Tripoint::new(28, 30, 0)), Some(rear));
        assert_eq!(eng.vehicle_at(Tripoint::new(30, 30, 0)), Some(h));
    }

    #[test]
    fn test_split_disabled_keeps_one_vehicle() {
        let mut eng = SimulationEngine::from_data(
            crate::test_support::PARTS_JSON,
            crate::test_support::VEHICLES_JSON,
            EngineConfig {
                auto_split: false,
                ..EngineConfig::default()
            },
        )
        .unwrap();
        let h = eng.spawn_vehicle("pickup_with_rack", Tripoint::default(), 0).unwrap();
        let frame = eng
            .vehicles
            .with_vehicle(h, |v| {
                let frame = v.structural_part_at(Point::new(-1, 0)).unwrap();
                v.part_mut(frame).hp = 0;
                frame
            })
            .unwrap();
        eng.damage_part(h, frame, 1_000_000, DamageType::Bash).unwrap();
        let report = eng.update();
        assert!(report.spawned.is_empty());
        assert_eq!(eng.vehicle_count(), 1);
    }

    #[test]
    fn test_rack_and_unrack() {
        let mut eng = engine();
        let truck = eng
            .spawn_vehicle("pickup_with_rack", Tripoint::new(10, 10, 0), 0)
            .unwrap();
        let bike = eng
            .spawn_vehicle("bicycle", Tripoint::new(7, 10, 0), 90)
            .unwrap();
        eng.rack_vehicle(truck, bike).unwrap();
        assert_eq!(eng.vehicle_count(), 1);
        assert!(!eng.vehicles.contains(bike));

        let unloaded = eng.unrack_vehicle(truck).unwrap();
        assert_eq!(unloaded.len(), 1);
        assert_eq!(eng.vehicle_count(), 2);
        assert_eq!(eng.vehicle_at(Tripoint::new(7, 10, 0)), Some(unloaded[0]));
        assert!(eng.unrack_vehicle(truck).unwrap().is_empty());
    }

    #[test]
    fn test_rack_refusal_keeps_both() {
        let mut eng = engine();
        let truck = eng
            .spawn_vehicle("pickup_with_rack", Tripoint::new(10, 10, 0), 0)
            .unwrap();
        let bike = eng
            .spawn_vehicle("bicycle", Tripoint::new(40, 40, 0), 0)
            .unwrap();
        let err = eng.rack_vehicle(truck, bike).unwrap_err();
        assert!(matches!(err, Error::Rack(_)));
        assert_eq!(eng.vehicle_count(), 2);
    }

    #[test]
    fn test_dead_handle_is_an_error() {
        let mut eng = engine();
        let h = eng.spawn_vehicle("bicycle", Tripoint::default(), 0).unwrap();
        eng.vehicles.despawn(h);
        assert!(matches!(eng.start_engines(h), Err(Error::NoSuchVehicle(_))));
    }
}
