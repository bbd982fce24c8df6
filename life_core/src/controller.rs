// controller.rs - Start/Stop state machine driving the grid on a timed loop
//
// Idle -> Running on start (ignored while Running), Running -> Idle on stop.
// Each run owns a cancellation flag that the loop checks once per iteration;
// an in-flight step and its hand-off always complete.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, error, info};

use crate::config::{ConfigError, LifeConfig};
use crate::display::{DisplayError, DisplayHandle, Frame};
use crate::grid::{Grid, GridError};
use crate::patterns::Pattern;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("display hand-off failed: {0}")]
    Display(#[from] DisplayError),
    #[error("run task failed: {0}")]
    Task(#[from] JoinError),
}

/// Delays used by the run loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Pause between start and the first generation.
    pub warm_up: Duration,
    /// Pause after each displayed generation; `None` runs back to back.
    pub tick_interval: Option<Duration>,
    pub display_timeout: Duration,
}

impl From<&LifeConfig> for Timing {
    fn from(config: &LifeConfig) -> Self {
        Self {
            warm_up: config.warm_up(),
            tick_interval: config.tick_interval(),
            display_timeout: config.display_timeout(),
        }
    }
}

/// How a run ended when nothing went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub run: u64,
    pub generations: u64,
}

#[derive(Clone)]
struct RunToken(Arc<AtomicBool>);

impl RunToken {
    fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    fn is_active(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn cancel(&self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Default)]
struct RunState {
    current: Option<RunToken>,
    runs: u64,
}

impl RunState {
    fn active(&self) -> Option<&RunToken> {
        self.current.as_ref().filter(|token| token.is_active())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owns the grid and the run state machine.
pub struct Simulation {
    grid: Arc<Mutex<Grid>>,
    state: Mutex<RunState>,
    // Held by a run loop for its whole life so two loops never step at once.
    loop_lock: Arc<tokio::sync::Mutex<()>>,
    display: DisplayHandle,
    timing: Timing,
    runtime: Handle,
}

impl Simulation {
    /// Builds the grid from `config` and seeds its initial pattern.
    pub fn new(
        config: &LifeConfig,
        display: DisplayHandle,
        runtime: Handle,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut grid = Grid::new(config.size)?;
        let pattern = config.pattern()?;
        pattern.apply(&mut grid)?;
        info!(
            size = config.size,
            pattern = pattern.name,
            population = grid.population(),
            "grid seeded"
        );

        Ok(Self::with_grid(grid, Timing::from(config), display, runtime))
    }

    pub fn with_grid(grid: Grid, timing: Timing, display: DisplayHandle, runtime: Handle) -> Self {
        Self {
            grid: Arc::new(Mutex::new(grid)),
            state: Mutex::new(RunState::default()),
            loop_lock: Arc::new(tokio::sync::Mutex::new(())),
            display,
            timing,
            runtime,
        }
    }

    pub fn is_running(&self) -> bool {
        lock(&self.state).active().is_some()
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    /// Copy of the current generation.
    pub fn snapshot(&self) -> Grid {
        lock(&self.grid).clone()
    }

    /// Starts a run. Returns `None` without doing anything if one is already running.
    pub fn start(&self) -> Option<RunHandle> {
        let mut state = lock(&self.state);
        if state.active().is_some() {
            debug!("start ignored, simulation already running");
            return None;
        }

        let token = RunToken::new();
        state.current = Some(token.clone());
        state.runs += 1;
        let run = state.runs;
        info!(run, warm_up = ?self.timing.warm_up, "simulation started");

        let run_loop = RunLoop {
            run,
            token,
            grid: Arc::clone(&self.grid),
            display: self.display.clone(),
            timing: self.timing,
            loop_lock: Arc::clone(&self.loop_lock),
        };
        Some(RunHandle { run, task: self.runtime.spawn(run_loop.run()) })
    }

    /// Asks the running loop to finish after its current iteration. Idempotent.
    pub fn stop(&self) {
        let state = lock(&self.state);
        match state.active() {
            Some(token) => {
                token.cancel();
                info!(run = state.runs, "stop requested");
            }
            None => debug!("stop ignored, simulation idle"),
        }
    }

    /// Flips one cell. Only allowed while idle; returns `false` otherwise.
    pub fn toggle_cell(&self, row: usize, col: usize) -> bool {
        self.while_idle("toggle", |grid| grid.toggle(row, col)).is_some()
    }

    /// Replaces the board with `pattern`. `Ok(false)` while running.
    pub fn apply_pattern(&self, pattern: &Pattern) -> Result<bool, GridError> {
        self.while_idle("apply pattern", |grid| pattern.apply(grid))
            .transpose()
            .map(|applied| applied.is_some())
    }

    /// Kills every cell. `false` while running.
    pub fn clear(&self) -> bool {
        self.while_idle("clear", Grid::clear).is_some()
    }

    /// Advances one generation by hand while idle and returns it for display.
    pub fn step_once(&self) -> Option<Frame> {
        self.while_idle("step", |grid| {
            grid.step();
            Frame::of(grid)
        })
    }

    // The state lock is held across the edit so a concurrent start cannot slip in.
    fn while_idle<R>(&self, what: &str, edit: impl FnOnce(&mut Grid) -> R) -> Option<R> {
        let state = lock(&self.state);
        if state.active().is_some() {
            debug!(command = what, "ignored while running");
            return None;
        }
        let mut grid = lock(&self.grid);
        Some(edit(&mut *grid))
    }
}

impl Drop for Simulation {
    fn drop(&mut self) {
        if let Some(token) = lock(&self.state).active() {
            token.cancel();
        }
    }
}

/// Handle to one run, returned by [`Simulation::start`].
pub struct RunHandle {
    run: u64,
    task: JoinHandle<Result<RunReport, RunError>>,
}

impl RunHandle {
    pub fn run(&self) -> u64 {
        self.run
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the run to end and reports how it ended.
    pub async fn join(self) -> Result<RunReport, RunError> {
        self.task.await?
    }
}

struct RunLoop {
    run: u64,
    token: RunToken,
    grid: Arc<Mutex<Grid>>,
    display: DisplayHandle,
    timing: Timing,
    loop_lock: Arc<tokio::sync::Mutex<()>>,
}

impl RunLoop {
    async fn run(self) -> Result<RunReport, RunError> {
        let run = self.run;
        let _exclusive = Arc::clone(&self.loop_lock).lock_owned().await;
        tokio::time::sleep(self.timing.warm_up).await;

        let mut generations = 0;
        while self.token.is_active() {
            let frame = {
                let mut grid = lock(&self.grid);
                grid.step();
                Frame::of(&grid)
            };
            debug!(
                run,
                generation = frame.generation,
                population = frame.grid.population(),
                "generation computed"
            );

            if let Err(err) = self.display.present(frame, self.timing.display_timeout).await {
                self.token.cancel();
                error!(run, generations, error = %err, "display hand-off failed, run stopped");
                return Err(err.into());
            }
            generations += 1;

            if let Some(interval) = self.timing.tick_interval {
                tokio::time::sleep(interval).await;
            }
        }

        info!(run, generations, "simulation stopped");
        Ok(RunReport { run, generations })
    }
}
