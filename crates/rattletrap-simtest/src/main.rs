//! Rattletrap Headless Simulation Harness
//!
//! Validates the vehicle logic and the shipped data files in-process:
//! no map, no rendering, no player.
//!
//! Usage:
//!   cargo run -p rattletrap-simtest
//!   cargo run -p rattletrap-simtest -- --verbose

use std::sync::Arc;

use rand::SeedableRng;
use rattletrap_core::prelude::*;
use rattletrap_logic::constants::{flags, fuels, locations};
use rattletrap_logic::graph::VehicleGraph;
use rattletrap_logic::power::Ambient;
use rattletrap_logic::prototype::{Condition, SpawnOptions, VehiclePrototype};
use rattletrap_logic::save::VehicleRecord;
use rattletrap_logic::world::Map;
use rattletrap_logic::{DamageType, PartRegistry};
use serde::Deserialize;

// ── Data files (same JSON the runtime loads) ────────────────────────────
const PARTS_JSON: &str = include_str!("../../../data/vehicle_parts.json");
const VEHICLES_JSON: &str = include_str!("../../../data/vehicles.json");

// ── Logging ─────────────────────────────────────────────────────────────

struct StdoutLogger;

impl log::Log for StdoutLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::Level::Debug
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            println!("    [{}] {}: {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StdoutLogger = StdoutLogger;

// ── Raw data shapes ─────────────────────────────────────────────────────

#[derive(Deserialize)]
struct RawParts {
    parts: Vec<RawEntry>,
}

#[derive(Deserialize)]
struct RawVehicles {
    vehicles: Vec<RawEntry>,
}

#[derive(Deserialize)]
struct RawEntry {
    id: String,
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn check(name: &str, passed: bool, detail: impl Into<String>) -> TestResult {
    TestResult {
        name: name.into(),
        passed,
        detail: detail.into(),
    }
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    if verbose && log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(log::LevelFilter::Debug);
    }
    println!("=== Rattletrap Simulation Harness ===\n");

    let mut results = Vec::new();

    let registry = match PartRegistry::from_json(PARTS_JSON) {
        Ok(r) => Arc::new(r),
        Err(e) => {
            println!("  ✗ registry_parse: {e}");
            std::process::exit(1);
        }
    };
    let prototypes = match VehiclePrototype::list_from_json(VEHICLES_JSON) {
        Ok(p) => p,
        Err(e) => {
            println!("  ✗ prototypes_parse: {e}");
            std::process::exit(1);
        }
    };

    // 1. Part registry consistency
    results.extend(validate_registry(&registry, verbose));

    // 2. Every prototype spawns whole
    results.extend(validate_prototypes(&registry, &prototypes, verbose));

    // 3. Physics sweep across prototypes
    results.extend(validate_physics(&registry, &prototypes, verbose));

    // 4. Electrical balance
    results.extend(validate_power(verbose));

    // 5. Damage and splitting
    results.extend(validate_damage(verbose));

    // 6. Racks
    results.extend(validate_racks(verbose));

    // 7. Save files
    results.extend(validate_saves(&registry, &prototypes, verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

fn spawn(
    registry: &Arc<PartRegistry>,
    proto: &VehiclePrototype,
    opts: SpawnOptions,
) -> Result<Vehicle, String> {
    Vehicle::from_prototype(
        registry.clone(),
        proto,
        opts,
        &mut rand::rngs::StdRng::seed_from_u64(7),
    )
    .map_err(|e| format!("{}: {e}", proto.id))
}

fn engine() -> Result<SimulationEngine, String> {
    SimulationEngine::from_data(PARTS_JSON, VEHICLES_JSON, EngineConfig::default())
        .map_err(|e| e.to_string())
}

// ── 1. Part Registry ────────────────────────────────────────────────────

fn validate_registry(registry: &PartRegistry, verbose: bool) -> Vec<TestResult> {
    println!("--- Part Registry ---");
    let mut results = Vec::new();

    match serde_json::from_str::<RawParts>(PARTS_JSON) {
        Ok(raw) => results.push(check(
            "registry_all_entries_loaded",
            raw.parts.len() == registry.len(),
            format!("{} entries in file, {} registered", raw.parts.len(), registry.len()),
        )),
        Err(e) => results.push(check("registry_all_entries_loaded", false, e.to_string())),
    }

    results.push(check(
        "registry_not_empty",
        registry.len() > 20,
        format!("{} part types loaded", registry.len()),
    ));

    let parts: Vec<_> = registry.part_ids().filter_map(|id| registry.get(id)).collect();

    let bad_hp: Vec<&str> = parts
        .iter()
        .filter(|p| p.durability <= 0)
        .map(|p| p.id.as_str())
        .collect();
    results.push(check(
        "registry_positive_durability",
        bad_hp.is_empty(),
        if bad_hp.is_empty() {
            "all parts have positive durability".to_string()
        } else {
            format!("non-positive durability: {}", bad_hp.join(", "))
        },
    ));

    let bad_fuel: Vec<&str> = parts
        .iter()
        .filter(|p| !p.fuel_type.is_empty() && registry.fuel(&p.fuel_type).is_none())
        .map(|p| p.id.as_str())
        .collect();
    results.push(check(
        "registry_known_fuels",
        bad_fuel.is_empty(),
        if bad_fuel.is_empty() {
            "every fuel_type resolves".to_string()
        } else {
            format!("unknown fuel on: {}", bad_fuel.join(", "))
        },
    ));

    let bad_store: Vec<&str> = parts
        .iter()
        .filter(|p| p.is_fuel_store() && p.capacity <= 0)
        .map(|p| p.id.as_str())
        .collect();
    results.push(check(
        "registry_store_capacity",
        bad_store.is_empty(),
        format!("{} fuel stores without capacity", bad_store.len()),
    ));

    let frames = parts
        .iter()
        .filter(|p| p.location == locations::STRUCTURE)
        .count();
    results.push(check(
        "registry_has_frames",
        frames > 0 && registry.get("frame").is_some(),
        format!("{frames} structural part types"),
    ));

    for fuel in [fuels::GASOLINE, fuels::DIESEL, fuels::BATTERY] {
        results.push(check(
            &format!("registry_fuel_{fuel}"),
            registry.fuel(fuel).is_some(),
            format!("fuel '{fuel}' defined"),
        ));
    }

    if verbose {
        let engines = parts.iter().filter(|p| p.is_engine()).count();
        let wheels = parts.iter().filter(|p| p.is_wheel()).count();
        println!("  {engines} engine types, {wheels} wheel types");
    }
    results
}

// ── 2. Prototypes ───────────────────────────────────────────────────────

fn validate_prototypes(
    registry: &Arc<PartRegistry>,
    prototypes: &[VehiclePrototype],
    verbose: bool,
) -> Vec<TestResult> {
    println!("--- Vehicle Prototypes ---");
    let mut results = Vec::new();

    if let Ok(raw) = serde_json::from_str::<RawVehicles>(VEHICLES_JSON) {
        let mut ids: Vec<&str> = raw.vehicles.iter().map(|v| v.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        results.push(check(
            "prototypes_unique_ids",
            ids.len() == raw.vehicles.len(),
            format!("{} distinct ids", ids.len()),
        ));
    }

    results.push(check(
        "prototypes_not_empty",
        !prototypes.is_empty(),
        format!("{} prototypes loaded", prototypes.len()),
    ));

    for proto in prototypes {
        let name = format!("prototype_{}", proto.id);
        let veh = match spawn(registry, proto, SpawnOptions::default()) {
            Ok(v) => v,
            Err(e) => {
                results.push(check(&name, false, e));
                continue;
            }
        };
        let islands = veh.structural_islands().len();
        let origin = veh.has_structural_part(Point::ZERO);
        let complete = veh.part_count() == proto.parts.len();
        results.push(check(
            &name,
            islands == 1 && origin && complete,
            format!(
                "{} parts, {islands} island(s), frame at origin: {origin}",
                veh.part_count()
            ),
        ));
        if verbose {
            println!("  {}: {} mounts", proto.id, veh.mounts().count());
        }
    }

    let worn_ok = prototypes.iter().all(|proto| {
        let opts = SpawnOptions {
            condition: Condition::Worn,
            ..SpawnOptions::default()
        };
        spawn(registry, proto, opts)
            .map(|v| v.parts().iter().all(|p| p.hp >= 0 && p.hp <= p.info.durability))
            .unwrap_or(false)
    });
    results.push(check(
        "prototypes_worn_condition",
        worn_ok,
        "worn spawns keep hp within durability",
    ));
    results
}

// ── 3. Physics ──────────────────────────────────────────────────────────

fn validate_physics(
    registry: &Arc<PartRegistry>,
    prototypes: &[VehiclePrototype],
    verbose: bool,
) -> Vec<TestResult> {
    println!("--- Physics ---");
    let mut results = Vec::new();

    for proto in prototypes {
        let Ok(mut veh) = spawn(registry, proto, SpawnOptions::default()) else {
            continue;
        };
        let mass = veh.total_mass();
        let max = veh.max_velocity(false);
        let safe = veh.safe_velocity(false);
        let boat = !veh.all_parts_with_feature(flags::FLOATS, false).is_empty();
        let moves = if boat {
            veh.can_float()
        } else {
            veh.valid_wheel_config(false)
        };
        results.push(check(
            &format!("physics_{}", proto.id),
            mass > 0.0 && max >= safe && safe >= 0 && moves,
            format!("{mass:.0} kg, safe {safe}, max {max}, movable: {moves}"),
        ));
        if verbose {
            println!(
                "  {}: drag {:.3}, com {:?}",
                proto.id,
                veh.coeff_air_drag(),
                veh.local_center_of_mass()
            );
        }
    }

    if let Some(car) = prototypes.iter().find(|p| p.id == "car") {
        let dry = SpawnOptions {
            fuel_percent: 0,
            ..SpawnOptions::default()
        };
        if let Ok(mut veh) = spawn(registry, car, dry) {
            let fueled = veh.max_velocity(true);
            results.push(check(
                "physics_empty_tank_no_speed",
                fueled == 0,
                format!("fueled max velocity with dry tank: {fueled}"),
            ));
        }
    }
    results
}

// ── 4. Power ────────────────────────────────────────────────────────────

fn validate_power(_verbose: bool) -> Vec<TestResult> {
    println!("--- Power ---");
    let mut results = Vec::new();
    let mut engine = match engine() {
        Ok(e) => e,
        Err(e) => return vec![check("power_engine", false, e)],
    };
    let dry = SpawnOptions {
        fuel_percent: 0,
        ..SpawnOptions::default()
    };

    match engine.spawn_vehicle_with("solar_cart", Tripoint::new(0, 0, 0), 0, dry) {
        Ok(cart) => {
            engine.ambient = Ambient {
                sunlight: 1.0,
                wind: 0.0,
            };
            for _ in 0..10 {
                engine.update();
            }
            let charge = engine.vehicles.get(cart).map_or(0, |v| v.battery_left());
            results.push(check(
                "power_solar_charges",
                charge > 0,
                format!("{charge} units after 10 sunny turns"),
            ));
        }
        Err(e) => results.push(check("power_solar_charges", false, e.to_string())),
    }

    engine.ambient = Ambient::default();
    let car = engine.spawn_vehicle("car", Tripoint::new(0, 10, 0), 0);
    let van = engine.spawn_vehicle_with("reactor_van", Tripoint::new(0, 14, 0), 0, dry);
    match (car, van) {
        (Ok(car), Ok(van)) => {
            let linked = engine
                .connect_cable((car, Point::new(0, 1)), (van, Point::new(0, 0)), "jumper_cable")
                .is_ok();
            let shared = engine.network_battery_left(van);
            let own = engine.vehicles.get(car).map_or(0, |v| v.battery_left());
            results.push(check(
                "power_cable_network",
                linked && shared == own && own > 0,
                format!("van sees {shared} units through the cable"),
            ));
        }
        _ => results.push(check("power_cable_network", false, "spawn failed")),
    }

    match engine.spawn_vehicle("car", Tripoint::new(20, 0, 0), 0) {
        Ok(car) => {
            let started = engine.start_engines(car).unwrap_or(false);
            let before = engine.vehicles.get(car).map_or(0, |v| v.fuel_left(fuels::GASOLINE));
            for _ in 0..20 {
                engine.update();
            }
            let after = engine.vehicles.get(car).map_or(0, |v| v.fuel_left(fuels::GASOLINE));
            results.push(check(
                "power_idle_burns_fuel",
                started && after < before,
                format!("gasoline {before} -> {after} over 20 idle turns"),
            ));
        }
        Err(e) => results.push(check("power_idle_burns_fuel", false, e.to_string())),
    }
    results
}

// ── 5. Damage ───────────────────────────────────────────────────────────

fn validate_damage(verbose: bool) -> Vec<TestResult> {
    println!("--- Damage & Splitting ---");
    let mut results = Vec::new();
    let mut engine = match engine() {
        Ok(e) => e,
        Err(e) => return vec![check("damage_engine", false, e)],
    };

    let truck = match engine.spawn_vehicle("pickup_with_rack", Tripoint::new(30, 30, 0), 0) {
        Ok(t) => t,
        Err(e) => return vec![check("damage_split", false, e.to_string())],
    };
    let frame = engine.vehicles.with_vehicle(truck, |v| {
        let frame = v.structural_part_at(Point::new(-1, 0))?;
        v.part_mut(frame).hp = 0;
        Some(frame)
    });
    if let Some(Some(frame)) = frame {
        let _ = engine.damage_part(truck, frame, 1_000_000, DamageType::Bash);
    }
    let report = engine.update();
    let rear = report.spawned.first().copied();
    results.push(check(
        "damage_split",
        report.spawned.len() == 1 && engine.vehicle_count() == 2,
        format!("{} vehicle(s) after the middle frame broke", engine.vehicle_count()),
    ));
    results.push(check(
        "damage_split_indexed",
        rear.is_some() && engine.vehicle_at(Tripoint::new(28, 30, 0)) == rear,
        "rear half found at its tiles",
    ));

    let car = match engine.spawn_vehicle("car", Tripoint::new(0, 0, 0), 0) {
        Ok(c) => c,
        Err(e) => {
            results.push(check("damage_crash", false, e.to_string()));
            return results;
        }
    };
    let before = engine.grid.item_count();
    for _ in 0..20 {
        let _ = engine.collide(car, Point::new(1, 0), 400, 600);
    }
    engine.update();
    results.push(check(
        "damage_crash",
        engine.grid.has_message("destroyed") && engine.grid.item_count() > before,
        format!("{} items on the ground", engine.grid.item_count()),
    ));

    if verbose {
        for m in engine.grid.messages.iter().take(5) {
            println!("  msg: {}", m.text);
        }
    }
    results
}

// ── 6. Racks ────────────────────────────────────────────────────────────

fn validate_racks(_verbose: bool) -> Vec<TestResult> {
    println!("--- Racks ---");
    let mut engine = match engine() {
        Ok(e) => e,
        Err(e) => return vec![check("rack_engine", false, e)],
    };
    let truck = engine.spawn_vehicle("pickup_with_rack", Tripoint::new(10, 10, 0), 0);
    let bike = engine.spawn_vehicle("bicycle", Tripoint::new(7, 10, 0), 90);
    let (Ok(truck), Ok(bike)) = (truck, bike) else {
        return vec![check("rack_round_trip", false, "spawn failed")];
    };

    let racked = engine.rack_vehicle(truck, bike);
    let count_racked = engine.vehicle_count();
    let unloaded = engine.unrack_vehicle(truck).unwrap_or_default();
    let back_home = unloaded
        .first()
        .and_then(|&h| engine.vehicles.get(h).map(|v| v.pos))
        == Some(Tripoint::new(7, 10, 0));

    vec![
        check(
            "rack_merge",
            racked.is_ok() && count_racked == 1,
            match racked {
                Ok(()) => "bicycle racked".to_string(),
                Err(e) => e.to_string(),
            },
        ),
        check(
            "rack_unload_in_place",
            unloaded.len() == 1 && back_home,
            format!("{} vehicles unloaded", unloaded.len()),
        ),
    ]
}

// ── 7. Saves ────────────────────────────────────────────────────────────

fn validate_saves(
    registry: &Arc<PartRegistry>,
    prototypes: &[VehiclePrototype],
    _verbose: bool,
) -> Vec<TestResult> {
    println!("--- Save Files ---");
    let mut results = Vec::new();

    let json_ok = prototypes.iter().all(|proto| {
        let Ok(mut veh) = spawn(registry, proto, SpawnOptions::default()) else {
            return false;
        };
        let restored = VehicleRecord::capture(&veh)
            .to_json()
            .and_then(|json| VehicleRecord::from_json(&json))
            .and_then(|record| Vehicle::restore(registry.clone(), &record));
        match restored {
            Ok(mut back) => {
                back.part_count() == veh.part_count()
                    && (back.total_mass() - veh.total_mass()).abs() < 1e-6
            }
            Err(_) => false,
        }
    });
    results.push(check(
        "save_json_records",
        json_ok,
        "every prototype survives a JSON record round trip",
    ));

    let mut engine = match engine() {
        Ok(e) => e,
        Err(e) => {
            results.push(check("save_binary", false, e));
            return results;
        }
    };
    let spawned = prototypes
        .iter()
        .enumerate()
        .filter(|(i, p)| {
            engine
                .spawn_vehicle(&p.id, Tripoint::new(*i as i32 * 10, 0, 0), 0)
                .is_ok()
        })
        .count();
    engine
        .grid
        .add_item(Tripoint::new(-5, -5, 0), rattletrap_logic::world::Item::new("wheel"));
    for _ in 0..3 {
        engine.update();
    }
    let mut buf = Vec::new();
    let saved = engine.save(&mut buf);
    let mut loaded = match self::engine() {
        Ok(e) => e,
        Err(e) => {
            results.push(check("save_binary", false, e));
            return results;
        }
    };
    let restored = saved.and_then(|()| loaded.load(&buf[..]));
    results.push(check(
        "save_binary",
        restored.is_ok()
            && loaded.vehicle_count() == spawned
            && loaded.turn == engine.turn
            && loaded.grid.item_count() == engine.grid.item_count(),
        format!("{} bytes, {} vehicles", buf.len(), loaded.vehicle_count()),
    ));
    results
}
