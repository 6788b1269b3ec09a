use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, TryRecvError};
use thiserror::Error;

use pattern_automaton::config::REFRESH_INTERVAL_MS;
use pattern_automaton::pattern;
use pattern_automaton::simulation::{
    command_channel, frame_channel, CommandSender, Frame, FrameReceiver, Worker, WorkerHandle,
};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("cannot start simulation thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("simulation thread panicked")]
    WorkerPanicked,

    #[error("cannot write snapshot {path}: {source}")]
    Snapshot {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Startup options, filled from the command line
pub struct AppOptions {
    pub pattern_path: PathBuf,
    pub run_for: Option<Duration>,
    pub snapshot: Option<PathBuf>,
    pub start_paused: bool,
}

/// Control requests typed on stdin
#[derive(Debug, PartialEq)]
enum Control {
    Randomize,
    TogglePause,
    /// Load the given file, or reload the last one
    Load(Option<PathBuf>),
    Quit,
}

fn parse_control(line: &str) -> Option<Control> {
    // a lone space is the pause key
    if line == " " {
        return Some(Control::TogglePause);
    }

    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    match word {
        "r" | "randomize" => Some(Control::Randomize),
        "p" | "pause" => Some(Control::TogglePause),
        "l" | "load" if rest.is_empty() => Some(Control::Load(None)),
        "l" | "load" => Some(Control::Load(Some(PathBuf::from(rest)))),
        "q" | "quit" => Some(Control::Quit),
        _ => None,
    }
}

/// Presentation side: keeps the latest frame on a fixed refresh and turns
/// typed controls into simulation commands.
pub struct App {
    commands: CommandSender,
    frames: FrameReceiver,
    worker: Option<WorkerHandle>,
    input: Receiver<String>,
    latest: Option<Frame>,
    last_pattern: PathBuf,
    fps_counter: FpsCounter,
}

impl App {
    pub fn new(options: &AppOptions) -> Result<Self, AppError> {
        let pattern = pattern::load(&options.pattern_path);

        let (commands, command_rx) = command_channel();
        let (frame_tx, frames) = frame_channel();

        // queued before the thread exists, so it lands ahead of the first step
        if options.start_paused {
            commands.toggle_pause();
        }

        let worker = Worker::new(pattern, command_rx, frame_tx)
            .spawn()
            .map_err(AppError::Spawn)?;

        log::info!("Controls (type and press Enter):");
        log::info!("  r: Randomize");
        log::info!("  p or space: Toggle pause");
        log::info!("  l <file>: Load pattern file");
        log::info!("  l: Reload last pattern file");
        log::info!("  q: Quit");

        Ok(Self {
            commands,
            frames,
            worker: Some(worker),
            input: spawn_stdin_reader(),
            latest: None,
            last_pattern: options.pattern_path.clone(),
            fps_counter: FpsCounter::new(),
        })
    }

    /// Refresh until quit, the time limit, or the simulation ending on its own.
    pub fn run(&mut self, run_for: Option<Duration>) -> Result<Option<&Frame>, AppError> {
        let started = Instant::now();
        let refresh = Duration::from_millis(REFRESH_INTERVAL_MS);

        loop {
            if !self.poll_input() {
                log::info!("Quit requested, exiting...");
                break;
            }

            if run_for.is_some_and(|limit| started.elapsed() >= limit) {
                log::info!("Run time elapsed, exiting...");
                break;
            }

            if self.worker.as_ref().is_some_and(WorkerHandle::is_finished) {
                log::warn!("Simulation ended on its own");
                break;
            }

            self.refresh();
            thread::sleep(refresh);
        }

        self.shutdown()?;
        Ok(self.latest.as_ref())
    }

    /// Returns `false` once quit was requested.
    fn poll_input(&mut self) -> bool {
        loop {
            match self.input.try_recv() {
                Ok(line) => match parse_control(&line) {
                    Some(Control::Quit) => return false,
                    Some(control) => self.handle_control(control),
                    None if line.trim().is_empty() => {}
                    None => log::warn!("Unknown control {:?}", line.trim()),
                },
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return true,
            }
        }
    }

    fn handle_control(&mut self, control: Control) {
        match control {
            Control::Randomize => {
                self.commands.randomize();
            }
            Control::TogglePause => {
                self.commands.toggle_pause();
            }
            Control::Load(path) => {
                if let Some(path) = path {
                    self.last_pattern = path;
                }
                let next = pattern::load(&self.last_pattern);
                self.commands.reconfigure(next);
            }
            Control::Quit => {}
        }
    }

    /// Take the newest frame, if any arrived since the last refresh.
    fn refresh(&mut self) {
        if let Some(frame) = self.frames.latest() {
            self.latest = Some(frame);

            if let Some(fps) = self.fps_counter.tick() {
                if let Some(frame) = &self.latest {
                    log::info!(
                        "{:.0} frames/s - {}x{} - generation {}",
                        fps,
                        frame.width(),
                        frame.height(),
                        frame.generation()
                    );
                }
            }
        }
    }

    fn shutdown(&mut self) -> Result<(), AppError> {
        if let Some(worker) = self.worker.take() {
            self.commands.shutdown();
            worker.join().map_err(|_| AppError::WorkerPanicked)?;
        }
        // pick up whatever was rendered last
        self.refresh();
        Ok(())
    }
}

/// Write `frame` as an image; the format follows the file extension.
pub fn save_snapshot(frame: &Frame, path: &Path) -> Result<(), AppError> {
    image::save_buffer(
        path,
        frame.as_bytes(),
        frame.width(),
        frame.height(),
        image::ExtendedColorType::Rgba8,
    )
    .map_err(|source| AppError::Snapshot {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("Snapshot of generation {} written to {}", frame.generation(), path.display());
    Ok(())
}

/// Forward stdin lines; the channel disconnects at end of input.
fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = crossbeam_channel::bounded(16);
    let spawned = thread::Builder::new()
        .name("stdin".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        log::warn!("stdin: {}", e);
                        break;
                    }
                }
            }
        });
    if let Err(e) = spawned {
        log::warn!("No stdin controls: {}", e);
    }
    rx
}

/// Simple FPS counter
struct FpsCounter {
    last_update: Instant,
    frame_count: u32,
}

impl FpsCounter {
    fn new() -> Self {
        Self {
            last_update: Instant::now(),
            frame_count: 0,
        }
    }

    /// Tick the counter, returns Some(fps) every second
    fn tick(&mut self) -> Option<f64> {
        self.frame_count += 1;
        let elapsed = self.last_update.elapsed();

        if elapsed.as_secs_f64() >= 1.0 {
            let fps = self.frame_count as f64 / elapsed.as_secs_f64();
            self.frame_count = 0;
            self.last_update = Instant::now();
            Some(fps)
        } else {
            None
        }
    }
}
