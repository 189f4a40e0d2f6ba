use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};

use crate::*;

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum EngineState {
    #[default]
    Active,
    /// The bottom row has been reached; digging may go on.
    Won,
}

/// Presentation hooks fired by a reveal.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    ScreenShake,
    HitFlash,
}

/// A collectible to be dropped into the world at `(x, y)`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ItemSpawn {
    pub kind: Resource,
    pub x: f32,
    pub y: f32,
}

/// Which branch a reveal took. Exactly one fires per call.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum TileOutcome {
    #[default]
    NoChange,
    /// A blocking overlay was dug out; the tile underneath is untouched.
    Blocked(Resource),
    DisarmedMine,
    DisarmedSafe,
    /// Flag present without a disarm; never produced by normal play.
    RejectedFlag,
    Explosion,
    Revealed,
}

impl TileOutcome {
    pub const fn has_update(self) -> bool {
        use TileOutcome::*;
        match self {
            NoChange => false,
            Blocked(_) => true,
            DisarmedMine => true,
            DisarmedSafe => true,
            RejectedFlag => false,
            Explosion => true,
            Revealed => true,
        }
    }
}

/// Everything a single reveal did.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RevealReport {
    pub outcome: TileOutcome,
    /// Tiles that went from hidden to revealed, flood fill included.
    pub revealed: CellCount,
    pub grants: Vec<(Resource, u32)>,
    pub spawns: Vec<ItemSpawn>,
    pub effects: Vec<Effect>,
    pub death: bool,
    pub armor_absorbed: bool,
    pub won: bool,
    pub blueprint: Option<Blueprint>,
}

impl RevealReport {
    fn grant(&mut self, inventory: &mut Inventory, resource: Resource) {
        inventory.add(resource, 1);
        self.grants.push((resource, 1));
    }
}

/// Owns the day's grid and applies dig and flag actions to it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MineEngine {
    grid: Grid,
    state: EngineState,
    max_depth: Coord,
    drops: DropTable,
    blueprint_odds: BlueprintOdds,
}

impl MineEngine {
    pub fn new(grid: Grid) -> Self {
        Self::restore(grid, 0)
    }

    /// Picks up a grid mid-day, e.g. from a save.
    pub fn restore(grid: Grid, max_depth: Coord) -> Self {
        let state = if max_depth >= grid.rows().saturating_sub(1) && grid.rows() > 0 {
            EngineState::Won
        } else {
            EngineState::Active
        };
        Self {
            grid,
            state,
            max_depth,
            drops: DropTable::default(),
            blueprint_odds: BlueprintOdds::default(),
        }
    }

    pub fn with_tables(self, drops: DropTable, blueprint_odds: BlueprintOdds) -> Self {
        Self {
            drops,
            blueprint_odds,
            ..self
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn into_grid(self) -> Grid {
        self.grid
    }

    pub(crate) fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn size(&self) -> Coord2 {
        self.grid.size()
    }

    pub fn max_depth(&self) -> Coord {
        self.max_depth
    }

    pub fn tile_at(&self, coords: Coord2) -> Option<&Tile> {
        self.grid.get(coords)
    }

    /// Decides which branch a reveal of `coords` takes without changing anything.
    pub fn classify(&self, coords: Coord2) -> TileOutcome {
        use TileOutcome::*;

        let tile = self.grid[coords];
        if let Some(item) = tile.item
            && item.is_blocking()
        {
            return Blocked(item.resource());
        }
        if tile.is_revealed {
            return NoChange;
        }
        match (tile.is_disarmed, tile.is_flagged(), tile.is_mine) {
            (true, _, true) => DisarmedMine,
            (true, _, false) => DisarmedSafe,
            (false, true, _) => RejectedFlag,
            (false, false, true) => Explosion,
            (false, false, false) => Revealed,
        }
    }

    /// Digs at `coords`.
    ///
    /// Only coordinates outside the grid are an error; every other situation is described by the
    /// returned report.
    pub fn reveal<R: Rng + ?Sized>(
        &mut self,
        coords: Coord2,
        inventory: &mut Inventory,
        rng: &mut R,
    ) -> Result<RevealReport> {
        use TileOutcome::*;

        let coords = self.grid.validate_coords(coords)?;
        let outcome = self.classify(coords);
        let mut report = RevealReport {
            outcome,
            ..Default::default()
        };
        log::debug!("Reveal at {:?}: {:?}", coords, outcome);

        match outcome {
            NoChange => return Ok(report),
            Blocked(resource) => {
                self.grid.tile_mut(coords).item = None;
                report.grant(inventory, resource);
                return Ok(report);
            }
            RejectedFlag => {
                log::error!(
                    "Tile at {:?} is flagged but not disarmed, refusing to reveal",
                    coords
                );
                return Ok(report);
            }
            Explosion => {
                self.explode(coords, inventory, &mut report);
                return Ok(report);
            }
            DisarmedMine => self.defuse(coords, inventory, &mut report),
            DisarmedSafe | Revealed => self.open(coords, rng, &mut report),
        }

        self.track_depth(coords.1, &mut report);

        if let Some(blueprint) = self.blueprint_odds.roll(rng, inventory) {
            inventory.unlock_blueprint(blueprint);
            log::debug!("Found blueprint {:?}", blueprint);
            report.blueprint = Some(blueprint);
        }

        Ok(report)
    }

    fn uncover(&mut self, coords: Coord2) {
        let tile = self.grid.tile_mut(coords);
        tile.is_revealed = true;
        tile.flag = Flag::None;
    }

    fn explode(&mut self, coords: Coord2, inventory: &mut Inventory, report: &mut RevealReport) {
        self.uncover(coords);
        self.grid.remove_mine(coords);
        report.revealed += 1;
        report.effects.extend([Effect::ScreenShake, Effect::HitFlash]);

        if inventory.consume_armor_charge() {
            log::debug!(
                "Armor absorbed blast at {:?}, {} charges left",
                coords,
                inventory.armor_charges
            );
            report.armor_absorbed = true;
        } else {
            log::debug!("Mine exploded at {:?}", coords);
            report.death = true;
        }
    }

    fn defuse(&mut self, coords: Coord2, inventory: &mut Inventory, report: &mut RevealReport) {
        self.uncover(coords);
        self.grid.remove_mine(coords);
        report.revealed += 1;
        report.grant(inventory, Resource::DefusedMine);
        inventory.record_disarm();

        // open neighbors may have just dropped to zero
        let mut seeds: Vec<Coord2> = self
            .grid
            .iter_neighbors(coords)
            .filter(|&pos| {
                let tile = self.grid[pos];
                tile.is_revealed && !tile.is_mine && tile.neighbor_mines == 0
            })
            .collect();
        if self.grid[coords].neighbor_mines == 0 {
            seeds.push(coords);
        }
        for seed in seeds {
            report.revealed += self.flood_fill(seed);
        }
    }

    fn open<R: Rng + ?Sized>(&mut self, coords: Coord2, rng: &mut R, report: &mut RevealReport) {
        self.uncover(coords);
        report.revealed += 1;

        if let Some(kind) = self.drops.roll(rng, coords.1) {
            // drops appear in the cell above and fall into the opened tile
            report.spawns.push(ItemSpawn {
                kind,
                x: f32::from(coords.0) + 0.5,
                y: f32::from(coords.1) - 0.5,
            });
        }

        if self.grid[coords].neighbor_mines == 0 {
            report.revealed += self.flood_fill(coords);
        }
    }

    fn can_flood(&self, coords: Coord2) -> bool {
        let tile = self.grid[coords];
        !tile.is_revealed && !tile.is_mine
    }

    /// Opens the zero region around the revealed tile `start` plus its numbered border.
    fn flood_fill(&mut self, start: Coord2) -> CellCount {
        let mut opened = 0;
        let mut visited = BTreeSet::from([start]);
        let mut to_visit: VecDeque<_> = self
            .grid
            .iter_neighbors(start)
            .filter(|&pos| self.can_flood(pos))
            .collect();
        log::trace!(
            "Starting flood-fill from {:?}, initial neighbors: {:?}",
            start,
            to_visit
        );

        while let Some(visit_coords) = to_visit.pop_front() {
            if !visited.insert(visit_coords) {
                continue;
            }

            if !self.can_flood(visit_coords) {
                continue;
            }

            self.uncover(visit_coords);
            opened += 1;
            let visit_count = self.grid[visit_coords].neighbor_mines;
            log::trace!(
                "Flood opened tile at {:?}, mine count: {}",
                visit_coords,
                visit_count
            );

            if visit_count == 0 {
                to_visit.extend(
                    self.grid
                        .iter_neighbors(visit_coords)
                        .filter(|&pos| self.can_flood(pos))
                        .filter(|pos| !visited.contains(pos)),
                );
            }
        }
        opened
    }

    fn track_depth(&mut self, row: Coord, report: &mut RevealReport) {
        self.max_depth = self.max_depth.max(row);
        let last_row = self.grid.rows().saturating_sub(1);
        if row == last_row && matches!(self.state, EngineState::Active) {
            log::debug!("Reached the bottom row");
            self.state = EngineState::Won;
            report.won = true;
        }
    }

    /// Drops an overlay onto a tile that has none, for collaborators such as recycling.
    pub fn place_item(&mut self, coords: Coord2, item: TileItem) -> Result<bool> {
        let coords = self.grid.validate_coords(coords)?;
        let tile = self.grid.tile_mut(coords);
        if tile.item.is_some() {
            return Ok(false);
        }
        tile.item = Some(item);
        Ok(true)
    }

    /// Removes a loose item lying on an open tile.
    pub fn take_loose_item(&mut self, coords: Coord2) -> Option<Resource> {
        let coords = self.grid.validate_coords(coords).ok()?;
        let tile = self.grid.tile_mut(coords);
        match tile.item {
            Some(TileItem::Loose(resource)) if tile.is_revealed => {
                tile.item = None;
                Some(resource)
            }
            _ => None,
        }
    }
}
