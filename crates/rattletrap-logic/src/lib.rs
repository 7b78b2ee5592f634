//! Pure vehicle simulation logic for Rattletrap.
//!
//! This crate holds the vehicle core and nothing else: no map storage, no
//! rendering, no turn loop. A vehicle is an arena of parts on a grid of
//! mount points, with derived indices and memoized physics rebuilt on
//! demand. The world is reached only through the narrow traits in
//! [`world`]; other vehicles only through [`graph::VehicleGraph`].
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`constants`] | Part flags, location slots, fuel ids, physical tunables |
//! | [`damage`] | Armor, hit thresholds, breaking, tearing off, wreck smashing |
//! | [`error`] | Hard failures: unknown ids, bad JSON, malformed data |
//! | [`graph`] | Cable-linked vehicle networks: BFS power sharing, loose parts |
//! | [`mount`] | Install/uninstall rules and the structural cut-vertex check |
//! | [`mutation`] | Install, tombstone removal, compaction, origin shifting |
//! | [`occupants`] | Passengers on boardable parts |
//! | [`part`] | Installed part state: health, contents, faults, cargo |
//! | [`part_info`] | Static part and fuel catalog loaded from JSON |
//! | [`physics`] | Mass, centre of mass, pivot, drag, draft, traction |
//! | [`point`] | Mount offsets, world tiles, rotation |
//! | [`power`] | Engines, alternators, reactors, batteries, fuel burn |
//! | [`prototype`] | Vehicle blueprints and spawning |
//! | [`rack`] | Carrying whole vehicles on bike racks |
//! | [`save`] | Save records and old-save upgrades |
//! | [`split`] | Structural islands and splitting |
//! | [`vehicle`] | The vehicle, its part index, accessors, refresh |
//! | [`velocity`] | Cubic drag/power balance, top and safe speeds |
//! | [`world`] | Terrain, items and messages the core talks to |

pub mod constants;
pub mod damage;
pub mod error;
pub mod graph;
pub mod mount;
pub mod mutation;
pub mod occupants;
pub mod part;
pub mod part_info;
pub mod physics;
pub mod point;
pub mod power;
pub mod prototype;
pub mod rack;
pub mod save;
pub mod split;
pub mod vehicle;
pub mod velocity;
pub mod world;

#[cfg(test)]
mod test_support;

pub use error::{Error, Result};
pub use part::VehiclePart;
pub use part_info::{DamageType, PartInfo, PartRegistry};
pub use point::{Point, Tripoint};
pub use vehicle::Vehicle;
