use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::*;

bitflags! {
    /// Directional keys currently held, from whatever input device feeds the loop.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Keys: u8 {
        const UP    = 1;
        const DOWN  = 1 << 1;
        const LEFT  = 1 << 2;
        const RIGHT = 1 << 3;
    }
}

/// Collision query shared by the overworld and the mine.
pub trait Solidity {
    fn is_solid(&self, world_x: f32, world_y: f32) -> bool;
}

impl<F: Fn(f32, f32) -> bool> Solidity for F {
    fn is_solid(&self, world_x: f32, world_y: f32) -> bool {
        self(world_x, world_y)
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Facing {
    Up,
    Down,
    Left,
    #[default]
    Right,
}

impl Facing {
    /// Direction the held keys point at, down winning over up over left over right.
    pub fn from_keys(keys: Keys) -> Option<Self> {
        if keys.contains(Keys::DOWN) {
            Some(Self::Down)
        } else if keys.contains(Keys::UP) {
            Some(Self::Up)
        } else if keys.contains(Keys::LEFT) {
            Some(Self::Left)
        } else if keys.contains(Keys::RIGHT) {
            Some(Self::Right)
        } else {
            None
        }
    }

    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Zone {
    Overworld,
    Mine,
}

impl Zone {
    pub fn of(world_y: f32) -> Self {
        if world_y < 0.0 {
            Self::Overworld
        } else {
            Self::Mine
        }
    }
}

/// Player body: one tile square, `(x, y)` its top-left corner in tile units.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub facing: Facing,
    pub is_climbing: bool,
    pub grounded: bool,
    /// Cleared by a jump, set again once up is released.
    pub jump_armed: bool,
}

impl Player {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            facing: Facing::default(),
            is_climbing: false,
            grounded: false,
            jump_armed: true,
        }
    }

    pub fn zone(&self) -> Zone {
        Zone::of(self.y)
    }

    /// Tile holding the body's center, when inside the mine.
    pub fn tile(&self, size: Coord2) -> Option<Coord2> {
        world_to_tile(self.x + 0.5, self.y + 0.5, size)
    }

    /// Tile next to the body's center in the facing direction.
    pub fn facing_tile(&self, size: Coord2) -> Option<Coord2> {
        let (dx, dy) = self.facing.delta();
        world_to_tile(
            self.x + 0.5 + dx as f32,
            self.y + 0.5 + dy as f32,
            size,
        )
    }
}

/// Where the world ends, and what is solid outside the mine grid.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldLayout {
    /// Leftmost position of the player's left edge on the surface.
    pub overworld_min_x: f32,
    /// Rightmost position of the player's left edge on the surface.
    pub overworld_max_x: f32,
    /// Everything above this line is solid sky.
    pub overworld_ceiling: f32,
    /// Top of the solid ground band covering the mine, which spans up to `y = 0`.
    pub overworld_floor: f32,
    pub house: (f32, f32),
    pub rope_column: Coord,
}

impl Default for WorldLayout {
    fn default() -> Self {
        Self {
            overworld_min_x: -12.0,
            overworld_max_x: 27.0,
            overworld_ceiling: -12.0,
            overworld_floor: -1.0,
            house: (3.0, -2.0),
            rope_column: 8,
        }
    }
}

impl WorldLayout {
    /// Allowed range for the player's `x` in the zone containing `world_y`.
    pub fn horizontal_bounds(&self, world_y: f32, columns: Coord) -> (f32, f32) {
        match Zone::of(world_y) {
            Zone::Overworld => (self.overworld_min_x, self.overworld_max_x),
            Zone::Mine => (0.0, f32::from(columns.saturating_sub(1))),
        }
    }

    /// Standing height on the surface for a one-tile body.
    pub fn surface_y(&self) -> f32 {
        self.overworld_floor - 1.0
    }

    pub fn is_solid_above_ground(&self, world_y: f32) -> bool {
        world_y < self.overworld_ceiling || world_y >= self.overworld_floor
    }
}

/// The overworld strip stacked on top of the mine grid.
#[derive(Copy, Clone, Debug)]
pub struct World<'a> {
    pub grid: &'a Grid,
    pub layout: &'a WorldLayout,
}

impl<'a> World<'a> {
    pub fn new(grid: &'a Grid, layout: &'a WorldLayout) -> Self {
        Self { grid, layout }
    }
}

impl Solidity for World<'_> {
    fn is_solid(&self, world_x: f32, world_y: f32) -> bool {
        if world_y < 0.0 {
            self.layout.is_solid_above_ground(world_y)
        } else {
            self.grid.is_solid_at(world_x, world_y)
        }
    }
}

/// Per-frame tuning, in tiles and tiles per frame.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhysicsConfig {
    pub acceleration: f32,
    /// Multiplier applied to horizontal speed every frame.
    pub friction: f32,
    pub max_speed_x: f32,
    pub gravity: f32,
    /// Kept below half a tile so a landing always snaps to the row it hit.
    pub max_fall_speed: f32,
    pub jump_speed: f32,
    /// How far the collision probes sit inside the body's edges.
    pub probe_inset: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            acceleration: 0.03,
            friction: 0.8,
            max_speed_x: 0.12,
            gravity: 0.02,
            max_fall_speed: 0.45,
            jump_speed: 0.32,
            probe_inset: 0.1,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct PlayerPhysics {
    config: PhysicsConfig,
}

impl PlayerPhysics {
    pub fn new(config: PhysicsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    fn body_blocked<S: Solidity + ?Sized>(&self, solid: &S, x: f32, y: f32) -> bool {
        let inset = self.config.probe_inset;
        let (left, right) = (x + inset, x + 1.0 - inset);
        let (top, bottom) = (y + inset, y + 1.0 - inset);
        solid.is_solid(left, top)
            || solid.is_solid(right, top)
            || solid.is_solid(left, bottom)
            || solid.is_solid(right, bottom)
    }

    fn row_blocked<S: Solidity + ?Sized>(&self, solid: &S, x: f32, probe_y: f32) -> bool {
        let inset = self.config.probe_inset;
        solid.is_solid(x + inset, probe_y) || solid.is_solid(x + 1.0 - inset, probe_y)
    }

    /// Advances the player by one frame. Does nothing while climbing.
    pub fn step<S: Solidity + ?Sized>(
        &self,
        player: &mut Player,
        keys: Keys,
        solid: &S,
        (min_x, max_x): (f32, f32),
    ) {
        if player.is_climbing {
            return;
        }
        let config = &self.config;

        if let Some(facing) = Facing::from_keys(keys) {
            player.facing = facing;
        }
        if !keys.contains(Keys::UP) {
            player.jump_armed = true;
        }

        if keys.contains(Keys::LEFT) {
            player.vx -= config.acceleration;
        }
        if keys.contains(Keys::RIGHT) {
            player.vx += config.acceleration;
        }
        player.vx = (player.vx * config.friction).clamp(-config.max_speed_x, config.max_speed_x);

        let next_x = player.x + player.vx;
        if next_x < min_x || next_x > max_x || self.body_blocked(solid, next_x, player.y) {
            player.vx = 0.0;
        } else {
            player.x = next_x;
        }

        player.vy = (player.vy + config.gravity).min(config.max_fall_speed);
        let next_y = player.y + player.vy;

        if player.vy >= 0.0 && self.row_blocked(solid, player.x, next_y + 1.0) {
            // rest on top of the floor row
            player.y = (next_y + 1.0).floor() - 1.0;
            player.vy = 0.0;
            player.grounded = true;
            if keys.contains(Keys::UP) && player.jump_armed {
                log::trace!("jump from ({:.2}, {:.2})", player.x, player.y);
                player.vy = -config.jump_speed;
                player.jump_armed = false;
                player.grounded = false;
            }
        } else if player.vy < 0.0 && self.row_blocked(solid, player.x, next_y) {
            player.y = next_y.floor() + 1.0;
            player.vy = 0.0;
            player.grounded = false;
        } else {
            player.y = next_y;
            player.grounded = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_floor(world_x: f32, world_y: f32) -> bool {
        let _ = world_x;
        world_y >= 5.0
    }

    fn settle(physics: &PlayerPhysics, player: &mut Player, solid: &impl Solidity) {
        for _ in 0..200 {
            physics.step(player, Keys::empty(), solid, (-100.0, 100.0));
        }
    }

    #[test]
    fn falls_and_lands_on_integer_row() {
        let physics = PlayerPhysics::default();
        let mut player = Player::new(0.0, 0.3);

        settle(&physics, &mut player, &flat_floor);

        assert_eq!(player.y, 4.0);
        assert_eq!(player.vy, 0.0);
        assert!(player.grounded);
    }

    #[test]
    fn fall_speed_is_capped() {
        let physics = PlayerPhysics::default();
        let mut player = Player::new(0.0, 0.0);
        let open = |_: f32, _: f32| false;

        for _ in 0..500 {
            physics.step(&mut player, Keys::empty(), &open, (-1.0, 1.0));
            assert!(player.vy <= physics.config().max_fall_speed);
        }
    }

    #[test]
    fn horizontal_position_stays_in_bounds() {
        let physics = PlayerPhysics::default();
        let mut player = Player::new(0.0, 4.0);

        for _ in 0..2_000 {
            physics.step(&mut player, Keys::RIGHT, &flat_floor, (-3.0, 6.5));
            assert!(player.x <= 6.5);
        }
        for _ in 0..2_000 {
            physics.step(&mut player, Keys::LEFT, &flat_floor, (-3.0, 6.5));
            assert!(player.x >= -3.0);
        }
        assert!(player.x < -2.5);
    }

    #[test]
    fn walls_stop_horizontal_motion() {
        let physics = PlayerPhysics::default();
        let wall = |world_x: f32, world_y: f32| world_y >= 5.0 || world_x >= 3.0;
        let mut player = Player::new(0.0, 4.0);

        for _ in 0..300 {
            physics.step(&mut player, Keys::RIGHT, &wall, (-100.0, 100.0));
        }

        assert!(player.x + 1.0 - physics.config().probe_inset < 3.0);
        assert!(player.x > 1.5);
    }

    #[test]
    fn jump_needs_up_released_between_jumps() {
        let physics = PlayerPhysics::default();
        let mut player = Player::new(0.0, 4.0);

        physics.step(&mut player, Keys::UP, &flat_floor, (-100.0, 100.0));
        assert!(player.vy < 0.0);

        let mut jumps = 1;
        for _ in 0..200 {
            let was_grounded = player.grounded;
            physics.step(&mut player, Keys::UP, &flat_floor, (-100.0, 100.0));
            if was_grounded && player.vy < 0.0 {
                jumps += 1;
            }
        }
        assert_eq!(jumps, 1);
        assert!(player.grounded);

        physics.step(&mut player, Keys::empty(), &flat_floor, (-100.0, 100.0));
        physics.step(&mut player, Keys::UP, &flat_floor, (-100.0, 100.0));
        assert!(player.vy < 0.0);
    }

    #[test]
    fn ceiling_stops_rise() {
        let physics = PlayerPhysics::default();
        let room = |_: f32, world_y: f32| !(2.0..5.0).contains(&world_y);
        let mut player = Player::new(0.0, 4.0);

        physics.step(&mut player, Keys::UP, &room, (-100.0, 100.0));
        for _ in 0..30 {
            physics.step(&mut player, Keys::UP, &room, (-100.0, 100.0));
            assert!(player.y >= 2.0);
        }
    }

    #[test]
    fn facing_follows_priority() {
        assert_eq!(Facing::from_keys(Keys::LEFT | Keys::DOWN), Some(Facing::Down));
        assert_eq!(Facing::from_keys(Keys::UP | Keys::RIGHT), Some(Facing::Up));
        assert_eq!(Facing::from_keys(Keys::LEFT | Keys::RIGHT), Some(Facing::Left));
        assert_eq!(Facing::from_keys(Keys::empty()), None);
    }

    #[test]
    fn climbing_suspends_physics() {
        let physics = PlayerPhysics::default();
        let mut player = Player::new(8.0, -1.0);
        player.is_climbing = true;

        physics.step(&mut player, Keys::RIGHT, &flat_floor, (-100.0, 100.0));

        assert_eq!((player.x, player.y, player.vy), (8.0, -1.0, 0.0));
    }

    #[test]
    fn surface_holds_player_and_mine_top_is_a_ceiling() {
        let grid = Grid::from_mine_coords((16, 10), &[], 4).unwrap();
        let layout = WorldLayout::default();
        let world = World::new(&grid, &layout);
        let physics = PlayerPhysics::default();

        let mut walker = Player::new(3.0, -3.5);
        settle(&physics, &mut walker, &world);
        assert_eq!(walker.y, layout.surface_y());

        let mut miner = Player::new(5.0, 0.0);
        for _ in 0..100 {
            physics.step(&mut miner, Keys::UP, &world, (0.0, 15.0));
            assert!(miner.y >= 0.0);
        }
        settle(&physics, &mut miner, &world);
        assert_eq!(miner.y, 3.0);
    }

    #[test]
    fn zone_bounds_follow_depth() {
        let layout = WorldLayout::default();

        assert_eq!(layout.horizontal_bounds(-2.0, 16), (-12.0, 27.0));
        assert_eq!(layout.horizontal_bounds(3.0, 16), (0.0, 15.0));
    }
}
