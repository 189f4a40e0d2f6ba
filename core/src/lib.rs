pub use camera::*;
pub use climb::*;
pub use clock::*;
pub use drops::*;
pub use engine::*;
pub use error::*;
pub use flagging::*;
pub use generator::*;
pub use grid::*;
pub use inventory::*;
pub use items::*;
pub use physics::*;
pub use save::*;
pub use session::*;
pub use tile::*;
pub use types::*;

mod camera;
mod climb;
mod clock;
mod drops;
mod engine;
mod error;
mod flagging;
mod generator;
mod grid;
mod inventory;
mod items;
mod physics;
mod save;
mod session;
mod tile;
mod types;
