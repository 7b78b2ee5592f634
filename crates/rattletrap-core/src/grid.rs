//! An in-memory tile map that vehicles drive on and drop things onto.
//!
//! Terrain is stored sparsely over a default tile. Everything the vehicle
//! core reports back (items, debris, released animals, unboarded riders,
//! messages, sounds) is recorded so the caller can inspect or drain it.

use std::collections::{BTreeMap, HashMap};

use rattletrap_logic::occupants::Passenger;
use rattletrap_logic::world::{Item, Map, Messages, MsgKind, Terrain};
use rattletrap_logic::Tripoint;
use serde::{Deserialize, Serialize};

/// A line in the message log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub kind: MsgKind,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sound {
    pub pos: Tripoint,
    pub volume: i32,
    pub description: String,
}

#[derive(Debug, Clone, Default)]
pub struct TileGrid {
    default_terrain: Terrain,
    terrain: HashMap<Tripoint, Terrain>,
    items: BTreeMap<Tripoint, Vec<Item>>,
    /// Item group id → what spawns when a part breaks into it.
    item_groups: HashMap<String, Vec<Item>>,
    pub animals: Vec<(Tripoint, String)>,
    pub unboarded: Vec<(Tripoint, Passenger)>,
    pub messages: Vec<Message>,
    pub sounds: Vec<Sound>,
}

impl TileGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// A grid where every unset tile is `terrain`.
    pub fn filled(terrain: Terrain) -> Self {
        Self {
            default_terrain: terrain,
            ..Self::default()
        }
    }

    pub fn set_terrain(&mut self, pos: Tripoint, terrain: Terrain) {
        self.terrain.insert(pos, terrain);
    }

    /// Register the contents of an item group. Unregistered groups spawn a
    /// single item named after the group.
    pub fn define_item_group(&mut self, group: impl Into<String>, items: Vec<Item>) {
        self.item_groups.insert(group.into(), items);
    }

    pub fn items_at(&self, pos: Tripoint) -> &[Item] {
        self.items.get(&pos).map_or(&[], Vec::as_slice)
    }

    /// Every tile with items on it.
    pub fn all_items(&self) -> impl Iterator<Item = (Tripoint, &Item)> {
        self.items
            .iter()
            .flat_map(|(pos, items)| items.iter().map(move |i| (*pos, i)))
    }

    pub fn item_count(&self) -> usize {
        self.items.values().map(Vec::len).sum()
    }

    /// Pick up everything at `pos`.
    pub fn take_items(&mut self, pos: Tripoint) -> Vec<Item> {
        self.items.remove(&pos).unwrap_or_default()
    }

    /// Replace all ground items, e.g. after loading a save.
    pub fn set_items(&mut self, items: Vec<(Tripoint, Vec<Item>)>) {
        self.items = items.into_iter().filter(|(_, i)| !i.is_empty()).collect();
    }

    pub fn item_piles(&self) -> Vec<(Tripoint, Vec<Item>)> {
        self.items
            .iter()
            .map(|(pos, items)| (*pos, items.clone()))
            .collect()
    }

    /// Empty the message log, returning it.
    pub fn drain_messages(&mut self) -> Vec<Message> {
        std::mem::take(&mut self.messages)
    }

    pub fn has_message(&self, needle: &str) -> bool {
        self.messages.iter().any(|m| m.text.contains(needle))
    }
}

impl Map for TileGrid {
    fn terrain(&self, pos: Tripoint) -> Terrain {
        self.terrain.get(&pos).copied().unwrap_or(self.default_terrain)
    }

    fn add_item(&mut self, pos: Tripoint, item: Item) {
        self.items.entry(pos).or_default().push(item);
    }

    fn spawn_item_group(&mut self, pos: Tripoint, group: &str) {
        let spawned = self
            .item_groups
            .get(group)
            .cloned()
            .unwrap_or_else(|| vec![Item::new(group)]);
        self.items.entry(pos).or_default().extend(spawned);
    }

    fn release_animal(&mut self, pos: Tripoint, monster: &str) {
        self.animals.push((pos, monster.to_string()));
    }

    fn unboard(&mut self, pos: Tripoint, passenger: Passenger) {
        log::debug!("{} steps off at {pos:?}", passenger.name);
        self.unboarded.push((pos, passenger));
    }
}

impl Messages for TileGrid {
    fn add_msg(&mut self, kind: MsgKind, text: String) {
        log::trace!("[{kind:?}] {text}");
        self.messages.push(Message { kind, text });
    }

    fn sound(&mut self, pos: Tripoint, volume: i32, description: &str) {
        self.sounds.push(Sound {
            pos,
            volume,
            description: description.to_string(),
        });
    }
}
