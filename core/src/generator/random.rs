use ndarray::Array2;

use super::*;

/// Generation strategy placing mines uniformly at random below the protected zone.
#[derive(Clone, Debug, PartialEq)]
pub struct RandomGridGenerator {
    seed: u64,
}

impl RandomGridGenerator {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// A generator with a fresh seed; every day's field is different.
    pub fn from_entropy() -> Self {
        let seed = rand::random();
        log::debug!("grid seed: {}", seed);
        Self::new(seed)
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl GridGenerator for RandomGridGenerator {
    fn generate(self, config: GridConfig) -> Grid {
        use rand::prelude::*;

        let (columns, rows) = config.size;
        let mut tiles: Array2<Tile> = Array2::default(config.size.to_nd_index());

        let eligible = config.eligible_cells();
        let mines = if config.mines > eligible {
            log::warn!(
                "Mine field cannot fit {} mines, only {} cells are eligible",
                config.mines,
                eligible
            );
            eligible
        } else {
            config.mines
        };

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut mines_placed = 0;
        while mines_placed < mines {
            let coords = (
                rng.random_range(0..columns),
                rng.random_range(config.safe_rows.min(rows)..rows),
            );
            if config.is_protected(coords) {
                continue;
            }
            let tile = &mut tiles[coords.to_nd_index()];
            if tile.is_mine {
                continue;
            }
            tile.is_mine = true;
            mines_placed += 1;
        }

        for ((x, y), tile) in tiles.indexed_iter_mut() {
            let coords = (x as Coord, y as Coord);
            if config.is_protected(coords) {
                tile.is_revealed = true;
                continue;
            }
            if tile.is_mine {
                continue;
            }
            let depth = f32::from(coords.1) / f32::from(rows);
            if rng.random_bool(config.deposit_odds(depth)) {
                tile.item = Some(TileItem::Deposit(deposit_resource(&mut rng, depth)));
            }
        }

        let mut grid = Grid::from_tiles(tiles);
        grid.recompute_counts();

        // double check mine count
        let count = grid.mine_count();
        if count != mines {
            log::warn!(
                "Generated mine field count mismatch, actual: {}, requested: {}",
                count,
                mines
            );
        }
        grid
    }
}

/// Ore found in a deposit; deeper deposits lean towards gems.
fn deposit_resource<R: rand::Rng + ?Sized>(rng: &mut R, depth: f32) -> Resource {
    let roll: f32 = rng.random();
    if roll < 0.1 + 0.3 * depth {
        Resource::Gem
    } else if roll < 0.5 + 0.2 * depth {
        Resource::Silver
    } else if roll < 0.8 {
        Resource::Coal
    } else {
        Resource::Stone
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn places_exact_count_outside_protected_zone() {
        let config = GridConfig::new((16, 100), 450, 4, 8, 5).unwrap();

        let grid = RandomGridGenerator::new(7).generate(config);

        assert_eq!(grid.size(), (16, 100));
        assert_eq!(grid.mine_count(), 450);
        for (coords, tile) in grid.iter() {
            if config.is_protected(coords) {
                assert!(!tile.is_mine(), "mine in protected zone at {:?}", coords);
                assert!(tile.is_revealed());
            } else {
                assert!(!tile.is_revealed());
            }
        }
        assert!((0..5).all(|y| !grid[(8, y)].is_mine()));
    }

    #[test]
    fn counts_match_live_neighbors() {
        let config = GridConfig::new((10, 20), 60, 2, 3, 4).unwrap();

        let grid = RandomGridGenerator::new(99).generate(config);

        for (coords, tile) in grid.iter() {
            assert_eq!(tile.neighbor_mines(), grid.live_neighbor_mines(coords));
        }
    }

    #[test]
    fn deposits_never_sit_on_mines_or_open_tiles() {
        let config = GridConfig::new((12, 40), 100, 3, 5, 6)
            .unwrap()
            .with_deposit_chance(0.5);

        let grid = RandomGridGenerator::new(3).generate(config);

        let mut deposits = 0;
        for (_, tile) in grid.iter() {
            if tile.has_blocking_item() {
                deposits += 1;
                assert!(!tile.is_mine());
                assert!(!tile.is_revealed());
            }
        }
        assert!(deposits > 0);
    }

    #[test]
    fn same_seed_gives_same_field() {
        let config = GridConfig::default();

        let a = RandomGridGenerator::new(11).generate(config);
        let b = RandomGridGenerator::new(11).generate(config);

        assert_eq!(a, b);
    }

    #[test]
    fn unusable_deposit_chance_places_no_deposits() {
        for chance in [f32::NAN, -0.5] {
            let config = GridConfig::new((8, 20), 30, 2, 3, 4)
                .unwrap()
                .with_deposit_chance(chance);

            let grid = RandomGridGenerator::new(3).generate(config);

            assert_eq!(grid.mine_count(), 30);
            assert!(grid.iter().all(|(_, tile)| tile.item().is_none()));
        }
    }

    #[test]
    fn overfull_request_fills_eligible_cells() {
        let config = GridConfig {
            size: (3, 3),
            mines: 20,
            safe_rows: 1,
            rope_column: 1,
            rope_length: 2,
            deposit_chance: 0.0,
        };

        let grid = RandomGridGenerator::new(0).generate(config);

        assert_eq!(grid.mine_count(), 5);
        assert!(!grid[(1, 1)].is_mine());
    }
}
