use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::*;

/// A collectible falling or resting in the world.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldItem {
    pub id: u32,
    /// Center of the item, in tile units.
    pub x: f32,
    pub y: f32,
    pub vy: f32,
    pub kind: Resource,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemPhysics {
    pub gravity: f32,
    pub max_fall_speed: f32,
    /// Upward speed an item is spawned with.
    pub spawn_hop: f32,
    /// Distance from an item's center to its resting edge.
    pub half_height: f32,
    /// Chebyshev distance from the player's center within which items are collected.
    pub pickup_radius: f32,
}

impl Default for ItemPhysics {
    fn default() -> Self {
        Self {
            gravity: 0.01,
            max_fall_speed: 0.3,
            spawn_hop: 0.08,
            half_height: 0.25,
            pickup_radius: 1.0,
        }
    }
}

/// The set of live world items.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldItems {
    items: Vec<WorldItem>,
    next_id: u32,
    #[serde(skip)]
    physics: ItemPhysics,
}

impl WorldItems {
    pub fn new(physics: ItemPhysics) -> Self {
        Self {
            items: Vec::new(),
            next_id: 0,
            physics,
        }
    }

    pub fn physics(&self) -> &ItemPhysics {
        &self.physics
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WorldItem> {
        self.items.iter()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn spawn(&mut self, kind: Resource, x: f32, y: f32) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        self.items.push(WorldItem {
            id,
            x,
            y,
            vy: -self.physics.spawn_hop,
            kind,
        });
        log::trace!("Spawned {:?} #{} at ({:.2}, {:.2})", kind, id, x, y);
        id
    }

    /// Lets every item fall one frame, resting it on the first solid point below.
    pub fn step<S: Solidity + ?Sized>(&mut self, solid: &S) {
        let physics = self.physics;
        for item in &mut self.items {
            let bottom = item.y + physics.half_height;
            if item.vy >= 0.0 && solid.is_solid(item.x, bottom) {
                // already resting
                item.vy = 0.0;
                continue;
            }
            item.vy = (item.vy + physics.gravity).min(physics.max_fall_speed);
            let next_y = item.y + item.vy;
            let next_bottom = next_y + physics.half_height;
            if item.vy >= 0.0 && solid.is_solid(item.x, next_bottom) {
                item.y = next_bottom.floor() - physics.half_height;
                item.vy = 0.0;
            } else {
                item.y = next_y;
            }
        }
    }

    /// Removes every item near the player's center and credits it, one `add` per resource kind.
    pub fn collect(&mut self, player: &Player, inventory: &mut Inventory) -> Vec<(Resource, u32)> {
        let (cx, cy) = (player.x + 0.5, player.y + 0.5);
        let radius = self.physics.pickup_radius;

        let mut picked: BTreeMap<Resource, u32> = BTreeMap::new();
        self.items.retain(|item| {
            let near = (item.x - cx).abs() <= radius && (item.y - cy).abs() <= radius;
            if near {
                *picked.entry(item.kind).or_default() += 1;
            }
            !near
        });

        for (&resource, &amount) in &picked {
            inventory.add(resource, amount);
        }
        if !picked.is_empty() {
            log::debug!("Picked up {:?}", picked);
        }
        picked.into_iter().collect()
    }
}
