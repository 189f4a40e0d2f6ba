use serde::{Deserialize, Serialize};

use crate::*;
pub use random::*;

mod random;

pub trait GridGenerator {
    fn generate(self, config: GridConfig) -> Grid;
}

/// Shape of a day's mine field.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    pub size: Coord2,
    pub mines: CellCount,
    /// Rows at the top that never hold mines and start open.
    pub safe_rows: Coord,
    pub rope_column: Coord,
    /// The rope shaft keeps `rope_column` clear and open down to this row (exclusive).
    pub rope_length: Coord,
    /// Chance for a hidden safe tile to hold an ore deposit, doubled at the bottom row.
    pub deposit_chance: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            size: (16, 100),
            mines: 450,
            safe_rows: 4,
            rope_column: 8,
            rope_length: 5,
            deposit_chance: 0.03,
        }
    }
}

impl GridConfig {
    pub fn new(
        size: Coord2,
        mines: CellCount,
        safe_rows: Coord,
        rope_column: Coord,
        rope_length: Coord,
    ) -> Result<Self> {
        if size.0 == 0 || size.1 == 0 {
            return Err(GameError::InvalidBoardShape);
        }
        if rope_column >= size.0 {
            return Err(GameError::InvalidCoords);
        }
        let config = Self {
            size,
            mines,
            safe_rows,
            rope_column,
            rope_length,
            ..Default::default()
        };
        if mines > config.eligible_cells() {
            return Err(GameError::TooManyMines);
        }
        Ok(config)
    }

    pub const fn with_deposit_chance(self, deposit_chance: f32) -> Self {
        Self {
            deposit_chance,
            ..self
        }
    }

    /// Deposit probability at `depth` (0 at the top, 1 at the bottom); NaN or negative reads as 0.
    pub fn deposit_odds(&self, depth: f32) -> f64 {
        f64::from((self.deposit_chance * (1.0 + depth)).max(0.0).min(1.0))
    }

    pub const fn total_cells(&self) -> CellCount {
        mult(self.size.0, self.size.1)
    }

    /// Whether `coords` lies in the guaranteed mine-free zone.
    pub const fn is_protected(&self, (x, y): Coord2) -> bool {
        y < self.safe_rows || (x == self.rope_column && y < self.rope_length)
    }

    /// Cells a mine may be placed on.
    pub fn eligible_cells(&self) -> CellCount {
        let (columns, rows) = self.size;
        let open_rows = rows.saturating_sub(self.safe_rows);
        let shaft_below_safe_rows = if self.rope_column < columns {
            self.rope_length.min(rows).saturating_sub(self.safe_rows)
        } else {
            0
        };
        mult(columns, open_rows) - CellCount::from(shaft_below_safe_rows)
    }
}
