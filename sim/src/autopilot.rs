use mineshaft_core::*;

/// Frames spent walking sideways when digging down is not possible.
const SIDESTEP_FRAMES: u32 = 20;

#[derive(Clone, Debug, Default)]
pub struct DayStats {
    pub revealed: u32,
    pub disarmed: u32,
    pub blasts: u32,
    pub deepest: Coord,
}

impl DayStats {
    fn record(&mut self, (_, row): Coord2, report: &RevealReport) {
        self.revealed += report.revealed;
        match report.outcome {
            TileOutcome::DisarmedMine => self.disarmed += 1,
            TileOutcome::Explosion => self.blasts += 1,
            _ => {}
        }
        if !report.death {
            self.deepest = self.deepest.max(row);
        }
    }
}

/// Walks to the rope, climbs down, then digs straight down, flagging first while charges last.
#[derive(Clone, Debug, Default)]
pub struct Autopilot {
    sidestep: Option<(Keys, u32)>,
    go_left: bool,
}

impl Autopilot {
    fn start_sidestep(&mut self) -> Keys {
        self.go_left = !self.go_left;
        let keys = if self.go_left { Keys::LEFT } else { Keys::RIGHT };
        log::trace!("autopilot sidestepping {:?}", keys);
        self.sidestep = Some((keys, SIDESTEP_FRAMES));
        keys
    }

    /// Acts on the session for this frame and returns the keys to hold.
    pub fn drive(&mut self, session: &mut GameSession, stats: &mut DayStats) -> Keys {
        let player = *session.player();
        if player.is_climbing {
            return Keys::empty();
        }

        if let Some((keys, frames)) = &mut self.sidestep {
            if *frames > 0 {
                *frames -= 1;
                return *keys;
            }
            self.sidestep = None;
        }

        match player.zone() {
            Zone::Overworld => {
                let dx = f32::from(session.config().layout.rope_column) - player.x;
                if dx.abs() < 0.25 {
                    session.descend_rope();
                    Keys::empty()
                } else if dx > 0.0 {
                    Keys::RIGHT
                } else {
                    Keys::LEFT
                }
            }
            Zone::Mine => {
                if !player.grounded {
                    return Keys::empty();
                }
                let size = session.grid().size();
                let Some((x, y)) = player.tile(size) else {
                    return Keys::empty();
                };
                let below = (x, y + 1);
                if below.1 >= size.1 {
                    return self.start_sidestep();
                }

                let tile = session.grid()[below];
                let inventory = session.inventory();
                let can_disarm = inventory.disarm_charges > 0 || inventory.disarm_kits > 0;
                if !tile.is_revealed() && !tile.is_disarmed() && can_disarm {
                    session.toggle_flag_at(below);
                }

                match session.reveal_at(below) {
                    Some(report) if report.outcome.has_update() => {
                        stats.record(below, &report);
                        Keys::empty()
                    }
                    _ => self.start_sidestep(),
                }
            }
        }
    }
}
