use serde::{Deserialize, Serialize};

use crate::*;

/// The screen the world is drawn into.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width_px: f32,
    pub height_px: f32,
    /// HUD column on the right that covers part of the screen.
    pub sidebar_px: f32,
    pub tile_px: f32,
    /// Device pixel scale times any zoom in effect.
    pub scale: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width_px: 960.0,
            height_px: 640.0,
            sidebar_px: 220.0,
            tile_px: 32.0,
            scale: 1.0,
        }
    }
}

impl Viewport {
    fn tile_span(&self) -> f32 {
        (self.tile_px * self.scale).max(f32::EPSILON)
    }

    /// Visible world size in tiles, after the sidebar.
    pub fn visible_tiles(&self) -> (f32, f32) {
        let span = self.tile_span();
        (
            (self.width_px - self.sidebar_px).max(0.0) / span,
            self.height_px.max(0.0) / span,
        )
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    pub lerp_x: f32,
    pub lerp_y: f32,
    /// Player depth past which the view switches to the mine.
    pub mine_threshold: f32,
    /// Extra zoom multiplier applied while in the mine.
    pub mine_zoom: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            lerp_x: 0.1,
            lerp_y: 0.3,
            mine_threshold: 4.0,
            mine_zoom: 1.0,
        }
    }
}

/// What the camera may show outside of the grid.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CameraBounds {
    pub columns: Coord,
    pub rows: Coord,
    pub overworld_min_x: f32,
    pub overworld_max_x: f32,
    pub overworld_ceiling: f32,
}

impl CameraBounds {
    pub fn new(grid_size: Coord2, layout: &WorldLayout) -> Self {
        Self {
            columns: grid_size.0,
            rows: grid_size.1,
            overworld_min_x: layout.overworld_min_x,
            overworld_max_x: layout.overworld_max_x + 1.0,
            overworld_ceiling: layout.overworld_ceiling,
        }
    }
}

/// Clamps `value` so that `[value, value + span)` stays in `[lo, hi]`, centering when it cannot.
fn clamp_span(value: f32, span: f32, lo: f32, hi: f32) -> f32 {
    if hi - lo <= span {
        lo + (hi - lo - span) / 2.0
    } else {
        value.clamp(lo, hi - span)
    }
}

/// Top-left corner of the view in world tiles, smoothed towards the player.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub x: f32,
    pub y: f32,
    mine_mode: bool,
}

impl Camera {
    pub fn mine_mode(&self) -> bool {
        self.mine_mode
    }

    pub fn zoom(&self, config: &CameraConfig) -> f32 {
        if self.mine_mode {
            config.mine_zoom
        } else {
            1.0
        }
    }

    fn update_mode(&mut self, player: &Player, config: &CameraConfig) {
        if !self.mine_mode && player.y > config.mine_threshold {
            log::trace!("Camera entering mine mode");
            self.mine_mode = true;
        } else if self.mine_mode && player.y < 0.0 {
            log::trace!("Camera leaving mine mode");
            self.mine_mode = false;
        }
    }

    /// Where the camera wants to be for the current player position.
    pub fn target(
        &self,
        player: &Player,
        bounds: &CameraBounds,
        viewport: &Viewport,
        config: &CameraConfig,
    ) -> (f32, f32) {
        let viewport = Viewport {
            scale: viewport.scale * self.zoom(config),
            ..*viewport
        };
        let (visible_w, visible_h) = viewport.visible_tiles();

        let center_x = player.x + 0.5;
        // jumps on the surface should not move the view
        let tracked_y = player.y.max(0.0);
        let ideal_x = center_x - visible_w / 2.0;
        let ideal_y = tracked_y + 0.5 - visible_h / 2.0;

        if self.mine_mode {
            (
                clamp_span(ideal_x, visible_w, 0.0, f32::from(bounds.columns)),
                clamp_span(ideal_y, visible_h, 0.0, f32::from(bounds.rows)),
            )
        } else {
            (
                clamp_span(
                    ideal_x,
                    visible_w,
                    bounds.overworld_min_x,
                    bounds.overworld_max_x,
                ),
                ideal_y.max(bounds.overworld_ceiling),
            )
        }
    }

    /// One smoothing step. Runs every frame, whether or not the player moved.
    pub fn update(
        &mut self,
        player: &Player,
        bounds: &CameraBounds,
        viewport: &Viewport,
        config: &CameraConfig,
    ) {
        self.update_mode(player, config);
        let (target_x, target_y) = self.target(player, bounds, viewport, config);
        self.x += (target_x - self.x) * config.lerp_x;
        self.y += (target_y - self.y) * config.lerp_y;
    }

    /// Jumps straight to the target, e.g. after a day change.
    pub fn snap_to(
        &mut self,
        player: &Player,
        bounds: &CameraBounds,
        viewport: &Viewport,
        config: &CameraConfig,
    ) {
        self.mine_mode = player.y > config.mine_threshold;
        let (x, y) = self.target(player, bounds, viewport, config);
        self.x = x;
        self.y = y;
    }
}
