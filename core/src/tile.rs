use serde::{Deserialize, Serialize};

use crate::Resource;

/// Marker the player can put on a hidden tile.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Flag {
    #[default]
    None,
    Mine,
}

/// Overlay sitting on a tile, independent of its mine state.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileItem {
    /// Ore deposit; solid until dug out, yields one unit of its resource.
    Deposit(Resource),
    /// Something lying on an open tile, picked up by walking over it.
    Loose(Resource),
}

impl TileItem {
    pub const fn is_blocking(self) -> bool {
        matches!(self, Self::Deposit(_))
    }

    pub const fn resource(self) -> Resource {
        match self {
            Self::Deposit(resource) | Self::Loose(resource) => resource,
        }
    }
}

/// One cell of the mine grid.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub(crate) is_mine: bool,
    pub(crate) is_revealed: bool,
    pub(crate) is_disarmed: bool,
    pub(crate) flag: Flag,
    pub(crate) neighbor_mines: u8,
    pub(crate) item: Option<TileItem>,
}

impl Tile {
    pub const fn is_mine(&self) -> bool {
        self.is_mine
    }

    pub const fn is_revealed(&self) -> bool {
        self.is_revealed
    }

    pub const fn is_disarmed(&self) -> bool {
        self.is_disarmed
    }

    pub const fn flag(&self) -> Flag {
        self.flag
    }

    pub const fn is_flagged(&self) -> bool {
        matches!(self.flag, Flag::Mine)
    }

    pub const fn neighbor_mines(&self) -> u8 {
        self.neighbor_mines
    }

    pub const fn item(&self) -> Option<TileItem> {
        self.item
    }

    pub const fn has_blocking_item(&self) -> bool {
        matches!(self.item, Some(TileItem::Deposit(_)))
    }

    /// Whether the player and falling items collide with this tile.
    pub const fn is_solid(&self) -> bool {
        !self.is_revealed || self.has_blocking_item()
    }
}
