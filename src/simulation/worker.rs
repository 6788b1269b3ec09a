use std::sync::Arc;
use std::thread::{self, JoinHandle};

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::pattern::Pattern;
use crate::simulation::channel::{Command, CommandReceiver, FrameSender};
use crate::simulation::{rasterize, step, GridBuffer};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleState {
    Idle,
    Running,
    Stopped,
}

/// Simulation state plus its end of both channels.
pub struct Worker {
    pattern: Arc<Pattern>,
    grid: GridBuffer,
    rng: StdRng,
    paused: bool,
    state: LifecycleState,
    commands: CommandReceiver,
    frames: FrameSender,
}

impl Worker {
    /// Create an idle worker with an entropy-seeded generator
    pub fn new(pattern: Pattern, commands: CommandReceiver, frames: FrameSender) -> Self {
        Self::with_rng(pattern, StdRng::from_entropy(), commands, frames)
    }

    /// Create an idle worker drawing from `rng`; the grid starts randomized.
    pub fn with_rng(
        pattern: Pattern,
        mut rng: StdRng,
        commands: CommandReceiver,
        frames: FrameSender,
    ) -> Self {
        let mut grid = GridBuffer::new(&pattern);
        grid.randomize(&mut rng, pattern.modulus());

        Self {
            pattern: Arc::new(pattern),
            grid,
            rng,
            paused: false,
            state: LifecycleState::Idle,
            commands,
            frames,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pattern(&self) -> &Arc<Pattern> {
        &self.pattern
    }

    pub fn grid(&self) -> &GridBuffer {
        &self.grid
    }

    /// Idle -> Running. No effect in any other state.
    pub fn start(&mut self) {
        if self.state == LifecycleState::Idle {
            log::info!(
                "Simulation starting: {}x{}, mod {}",
                self.grid.width(),
                self.grid.height(),
                self.pattern.modulus()
            );
            self.state = LifecycleState::Running;
        }
    }

    /// Start and loop on the current thread until shut down.
    pub fn run(&mut self) {
        self.start();
        while self.tick() {
            thread::sleep(self.pattern.frame_interval());
        }
    }

    /// Start and loop on a dedicated thread.
    ///
    /// The stopped worker is handed back by [`WorkerHandle::join`].
    pub fn spawn(mut self) -> std::io::Result<WorkerHandle> {
        let thread = thread::Builder::new()
            .name("simulation".into())
            .spawn(move || {
                self.run();
                self
            })?;
        Ok(WorkerHandle { thread })
    }

    /// One loop iteration without the trailing sleep.
    ///
    /// Does nothing until [`start`](Self::start); queued commands wait.
    /// Returns `false` once the worker has stopped.
    pub fn tick(&mut self) -> bool {
        match self.state {
            LifecycleState::Stopped => return false,
            LifecycleState::Idle => return true,
            LifecycleState::Running => {}
        }

        for command in self.commands.drain() {
            log::debug!("command: {:?}", command);
            match command {
                Command::Shutdown => {
                    log::info!("Simulation stopped at generation {}", self.grid.generation());
                    self.state = LifecycleState::Stopped;
                    return false;
                }
                Command::Randomize => self.randomize(),
                Command::TogglePause => {
                    self.paused = !self.paused;
                    log::info!("Simulation {}", if self.paused { "paused" } else { "resumed" });
                }
                Command::Reconfigure(pattern) => self.reconfigure(pattern),
            }
        }

        if !self.paused {
            step(&mut self.grid, &self.pattern, &mut self.rng);
            self.render();
        }

        true
    }

    /// Re-roll every cell. While paused the result is rendered right away,
    /// otherwise the next tick shows it.
    fn randomize(&mut self) {
        self.grid.randomize(&mut self.rng, self.pattern.modulus());
        if self.paused && self.state == LifecycleState::Running {
            self.render();
        }
    }

    /// Replace pattern and planes together, then randomize.
    fn reconfigure(&mut self, pattern: Arc<Pattern>) {
        log::info!(
            "Reconfiguring: {}x{}, mod {}, {:?}, {:?}, {} transform(s)",
            pattern.width(),
            pattern.height(),
            pattern.modulus(),
            pattern.operator(),
            pattern.boundary(),
            pattern.transforms().len()
        );
        let grid = GridBuffer::new(&pattern);
        self.pattern = pattern;
        self.grid = grid;
        self.randomize();
    }

    fn render(&self) {
        self.frames.publish(rasterize(&self.grid, self.pattern.modulus()));
    }
}

/// A worker running on its own thread.
pub struct WorkerHandle {
    thread: JoinHandle<Worker>,
}

impl WorkerHandle {
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Wait for the loop to exit and take the stopped worker back.
    pub fn join(self) -> thread::Result<Worker> {
        self.thread.join()
    }
}
