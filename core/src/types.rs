use ndarray::Array2;

/// One axis of a tile position; grids are at most `Coord::MAX` tiles on a side.
pub type Coord = u16;

/// Mine and tile totals.
pub type CellCount = u32;

/// Two-dimensional tile coordinates `(x, y)`, `y` growing downwards into the mine.
pub type Coord2 = (Coord, Coord);

pub trait ToNdIndex {
    type Output;
    fn to_nd_index(self) -> Self::Output;
}

impl ToNdIndex for Coord2 {
    type Output = [usize; 2];

    fn to_nd_index(self) -> Self::Output {
        [self.0.into(), self.1.into()]
    }
}

/// Tile count of a `a × b` area.
pub const fn mult(a: Coord, b: Coord) -> CellCount {
    (a as CellCount) * (b as CellCount)
}

/// Tile containing the world-space point `(world_x, world_y)`, if it lies inside a grid of `size`.
///
/// World units are tiles; the mine starts at `y = 0` and anything above it is overworld.
pub fn world_to_tile(world_x: f32, world_y: f32, size: Coord2) -> Option<Coord2> {
    let tx = world_x.floor();
    let ty = world_y.floor();
    if tx < 0.0 || ty < 0.0 || tx >= f32::from(size.0) || ty >= f32::from(size.1) {
        return None;
    }
    Some((tx as Coord, ty as Coord))
}

pub trait NeighborIterExt {
    fn iter_neighbors(&self, index: Coord2) -> NeighborIter;
}

impl<T> NeighborIterExt for Array2<T> {
    fn iter_neighbors(&self, index: Coord2) -> NeighborIter {
        let (columns, rows) = self.dim();
        let clip = |len: usize| Coord::try_from(len).unwrap_or(Coord::MAX);
        NeighborIter::new(index, (clip(columns), clip(rows)))
    }
}

/// Iterates the up to eight Chebyshev neighbors of a tile row by row, clipped at the grid bounds.
#[derive(Clone, Debug)]
pub struct NeighborIter {
    center: Coord2,
    /// Top-left and bottom-right corners of the clipped 3x3 window, inclusive.
    first: Coord2,
    last: Coord2,
    cursor: Option<Coord2>,
}

impl NeighborIter {
    pub fn new(center: Coord2, (columns, rows): Coord2) -> Self {
        let (x, y) = center;
        let first = (x.saturating_sub(1), y.saturating_sub(1));
        let last = (
            x.saturating_add(1).min(columns.saturating_sub(1)),
            y.saturating_add(1).min(rows.saturating_sub(1)),
        );
        let inside = x < columns && y < rows;
        Self {
            center,
            first,
            last,
            cursor: inside.then_some(first),
        }
    }
}

impl Iterator for NeighborIter {
    type Item = Coord2;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(pos @ (x, y)) = self.cursor {
            self.cursor = if x < self.last.0 {
                Some((x + 1, y))
            } else if y < self.last.1 {
                Some((self.first.0, y + 1))
            } else {
                None
            };
            if pos != self.center {
                return Some(pos);
            }
        }
        None
    }
}
