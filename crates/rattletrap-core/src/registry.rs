//! The vehicle registry: every vehicle on the map as a `hecs` entity.
//!
//! `hecs::Entity` is the stable handle. It stays valid while the vehicle
//! lives and is never reused for a different vehicle with the same
//! generation. A position index maps world tiles to the vehicle occupying
//! them; it is rebuilt by [`VehicleMap::reindex`] after vehicles move or
//! lose parts, and lookups verify a hit before trusting it.

use std::collections::HashMap;

use hecs::{Entity, World};
use rattletrap_logic::graph::VehicleGraph;
use rattletrap_logic::{Tripoint, Vehicle};

#[derive(Default)]
pub struct VehicleMap {
    world: World,
    by_pos: HashMap<Tripoint, Entity>,
}

impl VehicleMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a vehicle and index its tiles.
    pub fn spawn(&mut self, veh: Vehicle) -> Entity {
        let tiles = occupied_tiles(&veh);
        let entity = self.world.spawn((veh,));
        for pos in tiles {
            self.by_pos.insert(pos, entity);
        }
        log::debug!("spawned vehicle {entity:?}");
        entity
    }

    /// Remove a vehicle, handing it back.
    pub fn despawn(&mut self, entity: Entity) -> Option<Vehicle> {
        let veh = self.world.remove_one::<Vehicle>(entity).ok()?;
        let _ = self.world.despawn(entity);
        self.by_pos.retain(|_, e| *e != entity);
        log::debug!("despawned vehicle {entity:?} ({})", veh.name);
        Some(veh)
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.world.get::<&Vehicle>(entity).is_ok()
    }

    pub fn len(&self) -> usize {
        self.world.query::<&Vehicle>().iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Handles of every vehicle, in storage order.
    pub fn handles(&self) -> Vec<Entity> {
        self.world
            .query::<&Vehicle>()
            .iter()
            .map(|(entity, _)| entity)
            .collect()
    }

    pub fn get(&self, entity: Entity) -> Option<hecs::Ref<'_, Vehicle>> {
        self.world.get::<&Vehicle>(entity).ok()
    }

    pub fn get_mut(&mut self, entity: Entity) -> Option<hecs::RefMut<'_, Vehicle>> {
        self.world.get::<&mut Vehicle>(entity).ok()
    }

    /// Visit every vehicle immutably.
    pub fn for_each(&self, mut f: impl FnMut(Entity, &Vehicle)) {
        for (entity, veh) in self.world.query::<&Vehicle>().iter() {
            f(entity, veh);
        }
    }

    /// Find a vehicle by name. First match in storage order.
    pub fn find_by_name(&self, name: &str) -> Option<Entity> {
        self.world
            .query::<&Vehicle>()
            .iter()
            .find(|(_, v)| v.name == name)
            .map(|(entity, _)| entity)
    }

    /// Rebuild the position index from scratch.
    pub fn reindex(&mut self) {
        self.by_pos.clear();
        for (entity, veh) in self.world.query::<&Vehicle>().iter() {
            for pos in occupied_tiles(veh) {
                self.by_pos.insert(pos, entity);
            }
        }
    }

    /// Number of indexed tiles.
    pub fn indexed_tiles(&self) -> usize {
        self.by_pos.len()
    }
}

fn occupied_tiles(veh: &Vehicle) -> Vec<Tripoint> {
    veh.mounts()
        .filter_map(|m| veh.parts_at_relative(m).first().copied())
        .map(|p| veh.global_part_pos(p))
        .collect()
}

impl VehicleGraph for VehicleMap {
    type Handle = Entity;

    fn find_vehicle(&self, pos: Tripoint) -> Option<Entity> {
        if let Some(&entity) = self.by_pos.get(&pos) {
            let hit = self
                .world
                .get::<&Vehicle>(entity)
                .is_ok_and(|v| v.part_at_global(pos).is_some());
            if hit {
                return Some(entity);
            }
        }
        // Stale index: fall back to a scan.
        self.world
            .query::<&Vehicle>()
            .iter()
            .find(|(_, v)| v.part_at_global(pos).is_some())
            .map(|(entity, _)| entity)
    }

    fn with_vehicle<R>(&mut self, entity: Entity, f: impl FnOnce(&mut Vehicle) -> R) -> Option<R> {
        let mut veh = self.world.get::<&mut Vehicle>(entity).ok()?;
        Some(f(&mut veh))
    }
}
