use core::time::Duration;
use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClimbConfig {
    pub per_tile: Duration,
    pub minimum: Duration,
}

impl Default for ClimbConfig {
    fn default() -> Self {
        Self {
            per_tile: Duration::from_millis(200),
            minimum: Duration::from_millis(500),
        }
    }
}

impl ClimbConfig {
    pub fn duration_for(&self, distance: f32) -> Duration {
        self.per_tile.mul_f32(distance.abs()).max(self.minimum)
    }
}

fn ease_out_cubic(t: f32) -> f32 {
    let inv = 1.0 - t.clamp(0.0, 1.0);
    1.0 - inv * inv * inv
}

/// Rope ride from one height to another, driven by wall-clock time rather than physics.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RopeClimb {
    from_y: f32,
    to_y: f32,
    elapsed: Duration,
    duration: Duration,
}

impl RopeClimb {
    /// Puts the player on the rope and starts the ride to `to_y`.
    pub fn begin(player: &mut Player, rope_column: Coord, to_y: f32, config: &ClimbConfig) -> Self {
        player.is_climbing = true;
        player.vx = 0.0;
        player.vy = 0.0;
        player.grounded = false;
        player.x = f32::from(rope_column);

        let climb = Self {
            from_y: player.y,
            to_y,
            elapsed: Duration::ZERO,
            duration: config.duration_for(to_y - player.y),
        };
        log::debug!(
            "Climbing from {:.2} to {:.2} over {:?}",
            climb.from_y,
            climb.to_y,
            climb.duration
        );
        climb
    }

    pub fn target(&self) -> f32 {
        self.to_y
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn progress(&self) -> f32 {
        if self.duration.is_zero() {
            1.0
        } else {
            (self.elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
        }
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    /// Moves the ride forward by `dt`, writing `y`. Returns `true` once the player is released.
    pub fn advance(&mut self, player: &mut Player, dt: Duration) -> bool {
        self.elapsed = (self.elapsed + dt).min(self.duration);
        if self.is_finished() {
            player.y = self.to_y;
            player.vy = 0.0;
            player.is_climbing = false;
            // up is usually still held after climbing out
            player.jump_armed = false;
            log::debug!("Climb finished at {:.2}", player.y);
            return true;
        }
        player.y = self.from_y + (self.to_y - self.from_y) * ease_out_cubic(self.progress());
        false
    }
}
