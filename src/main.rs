mod app;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use app::{App, AppOptions};
use pattern_automaton::config::DEFAULT_PATTERN_FILE;

/// Self-referential pattern automaton, headless
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Pattern file (JSON); defaults are used if it is missing or malformed
    #[arg(default_value = DEFAULT_PATTERN_FILE)]
    pattern: PathBuf,

    /// Stop after this many seconds
    #[arg(long)]
    seconds: Option<f64>,

    /// Write the last frame to this image file on exit
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Start with the simulation paused
    #[arg(long)]
    paused: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let options = AppOptions {
        pattern_path: args.pattern,
        run_for: args.seconds.and_then(run_limit),
        snapshot: args.snapshot,
        start_paused: args.paused,
    };

    if let Err(e) = run(&options) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

/// Time limit from `--seconds`; unusable values mean no limit.
fn run_limit(seconds: f64) -> Option<Duration> {
    match Duration::try_from_secs_f64(seconds) {
        Ok(limit) => Some(limit),
        Err(e) => {
            log::warn!("Ignoring --seconds {}: {}", seconds, e);
            None
        }
    }
}

fn run(options: &AppOptions) -> Result<(), app::AppError> {
    log::info!("Initializing pattern automaton...");
    let mut app = App::new(options)?;
    let last_frame = app.run(options.run_for)?;

    match (&options.snapshot, last_frame) {
        (Some(path), Some(frame)) => app::save_snapshot(frame, path)?,
        (Some(_), None) => log::warn!("No frame received, snapshot skipped"),
        (None, _) => {}
    }
    Ok(())
}
