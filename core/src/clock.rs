use core::time::Duration;
use web_time::Instant;

/// Nominal length of one simulation frame.
pub const FRAME: Duration = Duration::from_micros(16_666);

/// Turns wall-clock time into whole fixed frames.
#[derive(Clone, Debug)]
pub struct FrameClock {
    last: Option<Instant>,
    backlog: Duration,
    max_steps: u32,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(5)
    }
}

impl FrameClock {
    /// A clock that never asks for more than `max_steps` frames at once.
    pub fn new(max_steps: u32) -> Self {
        Self {
            last: None,
            backlog: Duration::ZERO,
            max_steps: max_steps.max(1),
        }
    }

    /// Number of frames to run for the time passed since the previous call.
    pub fn advance(&mut self, now: Instant) -> u32 {
        let elapsed = match self.last.replace(now) {
            Some(last) => now.saturating_duration_since(last),
            None => Duration::ZERO,
        };
        self.steps_for(elapsed)
    }

    pub fn tick(&mut self) -> u32 {
        self.advance(Instant::now())
    }

    /// Adds `elapsed` to the backlog and takes as many whole frames out of it as allowed.
    ///
    /// A backlog beyond the catch-up cap is dropped, so a stalled loop resumes instead of
    /// spiralling.
    pub fn steps_for(&mut self, elapsed: Duration) -> u32 {
        self.backlog += elapsed;
        let mut steps = 0;
        while self.backlog >= FRAME {
            if steps == self.max_steps {
                log::trace!("Dropping {:?} of frame backlog", self.backlog);
                self.backlog = Duration::ZERO;
                break;
            }
            self.backlog -= FRAME;
            steps += 1;
        }
        steps
    }
}
