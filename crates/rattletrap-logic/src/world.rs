//! The narrow world interface the vehicle core talks to.
//!
//! The core never owns terrain or rendering. It queries tiles through
//! [`Map`] and reports player-visible events through [`Messages`]. Callers
//! must not re-enter the vehicle being mutated from inside these callbacks.

use serde::{Deserialize, Serialize};

use crate::occupants::Passenger;
use crate::point::Tripoint;

/// Terrain facts the vehicle core cares about.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Terrain {
    pub passable: bool,
    /// Any water. Boats float here, wheels lose grip.
    pub water: bool,
    pub deep_water: bool,
    pub indoors: bool,
    /// Fraction (0..=1) of a wheel's contact area that finds grip.
    pub traction: f64,
}

impl Default for Terrain {
    fn default() -> Self {
        Self {
            passable: true,
            water: false,
            deep_water: false,
            indoors: false,
            traction: 1.0,
        }
    }
}

impl Terrain {
    pub fn deep_water() -> Self {
        Self {
            water: true,
            deep_water: true,
            traction: 0.0,
            ..Self::default()
        }
    }
}

/// A loose item lying on the ground or stored in cargo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    #[serde(default)]
    pub charges: i64,
    #[serde(default)]
    pub weight_kg: f64,
}

impl Item {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            charges: 0,
            weight_kg: 0.0,
        }
    }

    pub fn with_charges(id: impl Into<String>, charges: i64) -> Self {
        Self {
            id: id.into(),
            charges,
            weight_kg: 0.0,
        }
    }

    pub fn with_weight(mut self, kg: f64) -> Self {
        self.weight_kg = kg;
        self
    }
}

/// Message categories, mirroring the colour a UI would pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MsgKind {
    Info,
    Good,
    Bad,
    Warning,
    Debug,
}

/// Tile queries and item placement.
pub trait Map {
    fn terrain(&self, pos: Tripoint) -> Terrain;
    fn add_item(&mut self, pos: Tripoint, item: Item);
    /// Spawn the contents of an item group (debris from a broken part).
    fn spawn_item_group(&mut self, pos: Tripoint, group: &str);
    fn release_animal(&mut self, pos: Tripoint, monster: &str);
    /// A passenger leaves the vehicle at `pos` (their part was removed).
    fn unboard(&mut self, pos: Tripoint, passenger: Passenger);
}

/// Player-visible text and ambient sound.
pub trait Messages {
    fn add_msg(&mut self, kind: MsgKind, text: String);
    fn sound(&mut self, pos: Tripoint, volume: i32, description: &str);
}
