use core::ops::Index;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

/// The mine field: `columns × rows` tiles, row 0 directly under the overworld.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    tiles: Array2<Tile>,
}

impl Grid {
    pub(crate) fn from_tiles(tiles: Array2<Tile>) -> Self {
        Self { tiles }
    }

    /// Builds a grid with mines at `mine_coords`, the top `revealed_rows` rows opened.
    pub fn from_mine_coords(
        size: Coord2,
        mine_coords: &[Coord2],
        revealed_rows: Coord,
    ) -> Result<Self> {
        let mut tiles: Array2<Tile> = Array2::default(size.to_nd_index());

        for &coords in mine_coords {
            if coords.0 >= size.0 || coords.1 >= size.1 {
                return Err(GameError::InvalidCoords);
            }
            tiles[coords.to_nd_index()].is_mine = true;
        }

        for ((_, y), tile) in tiles.indexed_iter_mut() {
            if y < usize::from(revealed_rows) {
                tile.is_revealed = true;
            }
        }

        let mut grid = Self { tiles };
        grid.recompute_counts();
        Ok(grid)
    }

    pub fn size(&self) -> Coord2 {
        let dim = self.tiles.dim();
        (
            dim.0.try_into().unwrap_or(Coord::MAX),
            dim.1.try_into().unwrap_or(Coord::MAX),
        )
    }

    pub fn columns(&self) -> Coord {
        self.size().0
    }

    pub fn rows(&self) -> Coord {
        self.size().1
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        let size = self.size();
        if coords.0 < size.0 && coords.1 < size.1 {
            Ok(coords)
        } else {
            Err(GameError::InvalidCoords)
        }
    }

    pub fn get(&self, coords: Coord2) -> Option<&Tile> {
        self.validate_coords(coords).ok().map(|coords| &self[coords])
    }

    pub(crate) fn tile_mut(&mut self, coords: Coord2) -> &mut Tile {
        &mut self.tiles[coords.to_nd_index()]
    }

    pub fn iter_neighbors(&self, coords: Coord2) -> NeighborIter {
        self.tiles.iter_neighbors(coords)
    }

    /// Iterates every tile together with its coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (Coord2, &Tile)> {
        self.tiles
            .indexed_iter()
            .map(|((x, y), tile)| ((x as Coord, y as Coord), tile))
    }

    pub fn mine_count(&self) -> CellCount {
        self.tiles
            .iter()
            .filter(|tile| tile.is_mine)
            .count()
            .try_into()
            .unwrap_or(CellCount::MAX)
    }

    /// Mines currently present around `coords`, counted from scratch.
    pub fn live_neighbor_mines(&self, coords: Coord2) -> u8 {
        self.iter_neighbors(coords)
            .filter(|&pos| self[pos].is_mine)
            .count() as u8
    }

    pub(crate) fn recompute_counts(&mut self) {
        let (x_end, y_end) = self.size();
        for x in 0..x_end {
            for y in 0..y_end {
                let count = self.live_neighbor_mines((x, y));
                self.tile_mut((x, y)).neighbor_mines = count;
            }
        }
    }

    /// Clears the mine at `coords` and lowers the count of each neighbor by one.
    ///
    /// Returns false, touching nothing, when there is no mine there.
    pub(crate) fn remove_mine(&mut self, coords: Coord2) -> bool {
        if !self[coords].is_mine {
            return false;
        }
        self.tile_mut(coords).is_mine = false;
        for pos in self.iter_neighbors(coords) {
            let tile = self.tile_mut(pos);
            tile.neighbor_mines = tile.neighbor_mines.saturating_sub(1);
        }
        log::trace!("Removed mine at {:?}", coords);
        true
    }

    /// Revealed non-mine tiles whose stored count disagrees with the mines around them.
    pub fn count_violations(&self) -> Vec<Coord2> {
        self.iter()
            .filter(|(_, tile)| tile.is_revealed && !tile.is_mine)
            .filter(|&(coords, tile)| tile.neighbor_mines != self.live_neighbor_mines(coords))
            .map(|(coords, _)| coords)
            .collect()
    }

    /// Checks a grid coming from outside (e.g. a save file) for states play can never produce.
    pub fn validate(&self) -> Result<()> {
        let (columns, rows) = self.tiles.dim();
        if columns == 0 || rows == 0 || columns > Coord::MAX.into() || rows > Coord::MAX.into() {
            return Err(GameError::InvalidBoardShape);
        }
        if self
            .tiles
            .iter()
            .any(|tile| tile.is_flagged() && !tile.is_disarmed)
        {
            return Err(GameError::MalformedSave);
        }
        if !self.count_violations().is_empty() {
            return Err(GameError::MalformedSave);
        }
        Ok(())
    }

    /// Solidity of the world point `(world_x, world_y)` as seen from inside the mine.
    ///
    /// Anything outside the grid counts as rock: shaft walls left and right, bedrock below.
    pub fn is_solid_at(&self, world_x: f32, world_y: f32) -> bool {
        match world_to_tile(world_x, world_y, self.size()) {
            Some(coords) => self[coords].is_solid(),
            None => true,
        }
    }
}

impl Index<Coord2> for Grid {
    type Output = Tile;

    fn index(&self, (x, y): Coord2) -> &Self::Output {
        &self.tiles[(x as usize, y as usize)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_include_every_neighbor_mine() {
        let grid = Grid::from_mine_coords((3, 3), &[(0, 0), (2, 2), (1, 0)], 0).unwrap();

        assert_eq!(grid[(1, 1)].neighbor_mines(), 3);
        assert_eq!(grid[(0, 1)].neighbor_mines(), 2);
        assert_eq!(grid[(1, 0)].neighbor_mines(), 1);
        assert_eq!(grid.mine_count(), 3);
    }

    #[test]
    fn remove_mine_decrements_each_neighbor_once() {
        let mut grid = Grid::from_mine_coords((3, 3), &[(1, 1), (0, 0)], 3).unwrap();

        assert!(grid.remove_mine((1, 1)));
        assert!(!grid.remove_mine((1, 1)));

        assert_eq!(grid[(2, 2)].neighbor_mines(), 0);
        assert_eq!(grid[(1, 0)].neighbor_mines(), 1);
        assert_eq!(grid[(1, 1)].neighbor_mines(), 1);
        assert!(grid.count_violations().is_empty());
    }

    #[test]
    fn out_of_range_mine_is_rejected() {
        assert_eq!(
            Grid::from_mine_coords((2, 2), &[(2, 0)], 0),
            Err(GameError::InvalidCoords)
        );
    }

    #[test]
    fn hidden_tiles_and_outside_are_solid() {
        let grid = Grid::from_mine_coords((4, 4), &[], 2).unwrap();

        assert!(!grid.is_solid_at(1.5, 1.5));
        assert!(grid.is_solid_at(1.5, 2.5));
        assert!(grid.is_solid_at(-0.5, 1.0));
        assert!(grid.is_solid_at(4.0, 1.0));
        assert!(grid.is_solid_at(1.0, 4.0));
    }

    #[test]
    fn validate_rejects_flag_without_disarm() {
        let mut grid = Grid::from_mine_coords((2, 2), &[(0, 0)], 0).unwrap();
        assert_eq!(grid.validate(), Ok(()));

        grid.tile_mut((0, 0)).flag = Flag::Mine;

        assert_eq!(grid.validate(), Err(GameError::MalformedSave));
    }
}
