use anyhow::Context;
use clap::Parser;
use mineshaft_core::*;
use std::path::PathBuf;

mod autopilot;

use autopilot::{Autopilot, DayStats};

#[derive(Parser, Debug)]
#[command(version, about = "Plays the mine headless with a simple autopilot", long_about = None)]
struct Args {
    /// What log level to use
    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,

    /// Force a seed instead of random
    #[arg(short, long)]
    seed: Option<u64>,

    /// Number of days to play
    #[arg(short, long, default_value_t = 3)]
    days: u32,

    /// Frames to run per day before going to sleep
    #[arg(short, long, default_value_t = 6_000)]
    frames: u32,

    /// Write the final game as a save file
    #[arg(long)]
    save: Option<PathBuf>,

    /// Pace frames by the wall clock instead of running flat out
    #[arg(long)]
    realtime: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.verbose.log_level_filter())
        .init();

    let seed = args.seed.unwrap_or_else(rand::random);
    log::info!("seed: {}", seed);

    let mut session =
        GameSession::new(SessionConfig::default(), seed).context("Could not start a session")?;
    let mut pilot = Autopilot::default();
    let mut clock = FrameClock::default();

    for _ in 0..args.days {
        let day = session.day();
        let mut stats = DayStats::default();
        let mut end = None;
        let mut frames = 0;

        while frames < args.frames && end.is_none() {
            let steps = if args.realtime {
                std::thread::sleep(FRAME);
                clock.tick()
            } else {
                1
            };
            for _ in 0..steps {
                let keys = pilot.drive(&mut session, &mut stats);
                if session.day() != day {
                    end = Some(DayEnd::Died);
                    break;
                }
                if let Some(day_end) = session.tick(FRAME, keys) {
                    end = Some(day_end);
                    break;
                }
                frames += 1;
            }
        }

        let depth = session.depth();
        let end = match end {
            Some(end) => end,
            None => {
                session.advance_day(DayEnd::Slept);
                DayEnd::Slept
            }
        };
        log::info!(
            "day {} ended ({:?}) after {} frames: deepest row {}, {} tiles opened, {} mines disarmed, {} blasts",
            day,
            end,
            frames,
            depth.max(stats.deepest),
            stats.revealed,
            stats.disarmed,
            stats.blasts,
        );
    }

    let inventory = session.inventory();
    log::info!(
        "carrying {} stone, {} silver, {} gems, {} coal, {} coins, {} defused mines",
        inventory.stone,
        inventory.silver,
        inventory.gems,
        inventory.coal,
        inventory.coins,
        inventory.defused_mines,
    );

    if let Some(path) = args.save {
        let json = session.to_save().to_json()?;
        std::fs::write(&path, json)
            .with_context(|| format!("Could not write save to {}", path.display()))?;
        log::info!("saved to {}", path.display());
    }

    Ok(())
}
