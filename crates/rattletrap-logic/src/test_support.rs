//! Shared fixtures for unit tests.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use crate::occupants::{Occupant, Passenger};
use crate::part_info::PartRegistry;
use crate::point::{Point, Tripoint};
use crate::prototype::VehiclePrototype;
use crate::vehicle::Vehicle;
use crate::world::{Item, Map, Messages, MsgKind, Terrain};

const PARTS_JSON: &str = include_str!("../../../data/vehicle_parts.json");
const VEHICLES_JSON: &str = include_str!("../../../data/vehicles.json");

pub(crate) fn registry() -> Arc<PartRegistry> {
    static REGISTRY: OnceLock<Arc<PartRegistry>> = OnceLock::new();
    REGISTRY
        .get_or_init(|| Arc::new(PartRegistry::from_json(PARTS_JSON).expect("bundled parts parse")))
        .clone()
}

pub(crate) fn prototypes() -> Vec<VehiclePrototype> {
    VehiclePrototype::list_from_json(VEHICLES_JSON).expect("bundled prototypes parse")
}

/// Frames at (0,0) and (1,0), a wheel on each, a V6 at the origin.
pub(crate) fn two_by_one() -> Vehicle {
    let mut v = Vehicle::new(registry(), "test car");
    v.install_part(Point::new(0, 0), "frame").unwrap();
    v.install_part(Point::new(1, 0), "frame").unwrap();
    v.install_part(Point::new(0, 0), "wheel").unwrap();
    v.install_part(Point::new(1, 0), "wheel").unwrap();
    v.install_part(Point::new(0, 0), "engine_v6").unwrap();
    v
}

/// `n` frames along the x axis.
pub(crate) fn straight_line(n: i32) -> Vehicle {
    let mut v = Vehicle::new(registry(), "beam");
    for x in 0..n {
        v.install_part(Point::new(x, 0), "frame").unwrap();
    }
    v
}

/// In-memory world recording every side effect.
#[derive(Default)]
pub(crate) struct TestWorld {
    pub terrain: HashMap<Tripoint, Terrain>,
    pub items: Vec<(Tripoint, Item)>,
    pub groups: Vec<(Tripoint, String)>,
    pub animals: Vec<(Tripoint, String)>,
    pub unboarded: Vec<(Tripoint, Passenger)>,
    pub messages: Vec<(MsgKind, String)>,
    pub sounds: Vec<(Tripoint, i32, String)>,
}

impl TestWorld {
    pub fn set_terrain(&mut self, pos: Tripoint, terrain: Terrain) {
        self.terrain.insert(pos, terrain);
    }

    pub fn items_at(&self, pos: Tripoint) -> Vec<String> {
        self.items
            .iter()
            .filter(|(p, _)| *p == pos)
            .map(|(_, i)| i.id.clone())
            .collect()
    }

    pub fn saw_message(&self, fragment: &str) -> bool {
        self.messages.iter().any(|(_, m)| m.contains(fragment))
    }
}

impl Map for TestWorld {
    fn terrain(&self, pos: Tripoint) -> Terrain {
        self.terrain.get(&pos).copied().unwrap_or_default()
    }

    fn add_item(&mut self, pos: Tripoint, item: Item) {
        self.items.push((pos, item));
    }

    fn spawn_item_group(&mut self, pos: Tripoint, group: &str) {
        self.groups.push((pos, group.to_string()));
    }

    fn release_animal(&mut self, pos: Tripoint, monster: &str) {
        self.animals.push((pos, monster.to_string()));
    }

    fn unboard(&mut self, pos: Tripoint, passenger: Passenger) {
        self.unboarded.push((pos, passenger));
    }
}

impl Messages for TestWorld {
    fn add_msg(&mut self, kind: MsgKind, text: String) {
        self.messages.push((kind, text));
    }

    fn sound(&mut self, pos: Tripoint, volume: i32, description: &str) {
        self.sounds.push((pos, volume, description.to_string()));
    }
}

/// A minimal occupant.
pub(crate) struct Rider {
    pub id: u64,
    pub weight: f64,
    pub strength: i32,
    pub pos: Tripoint,
    pub messages: Vec<String>,
}

impl Rider {
    pub fn new(id: u64, weight: f64) -> Self {
        Self {
            id,
            weight,
            strength: 8,
            pos: Tripoint::default(),
            messages: Vec::new(),
        }
    }

    pub fn with_strength(mut self, strength: i32) -> Self {
        self.strength = strength;
        self
    }
}

impl Occupant for Rider {
    fn id(&self) -> u64 {
        self.id
    }

    fn name(&self) -> &str {
        "rider"
    }

    fn is_player(&self) -> bool {
        self.id == 0
    }

    fn weight(&self) -> f64 {
        self.weight
    }

    fn strength(&self) -> i32 {
        self.strength
    }

    fn position(&self) -> Tripoint {
        self.pos
    }

    fn set_position(&mut self, pos: Tripoint) {
        self.pos = pos;
    }

    fn notify(&mut self, text: &str) {
        self.messages.push(text.to_string());
    }
}
