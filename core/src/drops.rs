use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::*;

/// One slice of the drop roll.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DropBand {
    pub resource: Resource,
    pub base: f32,
    /// Added to `base` for every row below the surface.
    pub per_row: f32,
}

impl DropBand {
    pub const fn new(resource: Resource, base: f32, per_row: f32) -> Self {
        Self {
            resource,
            base,
            per_row,
        }
    }

    pub fn chance(&self, depth: Coord) -> f32 {
        (self.base + self.per_row * f32::from(depth)).max(0.0)
    }
}

/// What a freshly dug tile may spill out.
///
/// Bands are consecutive slices of `[0, 1)` in declaration order; a roll past the last slice drops
/// nothing. Slices are cut off at 1, so deep rows can crowd out the later bands but never overlap.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DropTable {
    pub bands: [DropBand; 5],
}

impl Default for DropTable {
    fn default() -> Self {
        Self {
            bands: [
                DropBand::new(Resource::Stone, 0.12, 0.0),
                DropBand::new(Resource::Silver, 0.04, 0.0006),
                DropBand::new(Resource::Gem, 0.01, 0.0003),
                DropBand::new(Resource::Coal, 0.05, 0.0002),
                DropBand::new(Resource::Coin, 0.03, 0.0002),
            ],
        }
    }
}

impl DropTable {
    pub fn pick(&self, roll: f32, depth: Coord) -> Option<Resource> {
        let mut upper = 0.0;
        for band in &self.bands {
            upper = (upper + band.chance(depth)).min(1.0);
            if roll < upper {
                return Some(band.resource);
            }
        }
        None
    }

    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R, depth: Coord) -> Option<Resource> {
        self.pick(rng.random(), depth)
    }
}

/// Odds of stumbling on a blueprint while digging; they grow with every mine disarmed.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlueprintOdds {
    pub base: f32,
    pub per_disarm: f32,
    pub max: f32,
}

impl Default for BlueprintOdds {
    fn default() -> Self {
        Self {
            base: 0.002,
            per_disarm: 0.001,
            max: 0.05,
        }
    }
}

impl BlueprintOdds {
    pub fn chance(&self, lifetime_disarms: u32) -> f32 {
        let cap = self.max.max(0.0).min(1.0);
        (self.base + self.per_disarm * lifetime_disarms as f32)
            .max(0.0)
            .min(cap)
    }

    /// Rolls once for every blueprint not yet found, returning the first hit.
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R, inventory: &Inventory) -> Option<Blueprint> {
        let chance = f64::from(self.chance(inventory.lifetime_disarms));
        Blueprint::ALL
            .into_iter()
            .filter(|&blueprint| !inventory.has_blueprint(blueprint))
            .find(|_| rng.random_bool(chance))
    }
}
