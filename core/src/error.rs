use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Coordinates are outside the grid")]
    InvalidCoords,
    #[error("More mines requested than tiles can hold them")]
    TooManyMines,
    #[error("Grid dimensions are empty or too large")]
    InvalidBoardShape,
    #[error("Save data is malformed")]
    MalformedSave,
}

pub type Result<T> = core::result::Result<T, GameError>;
