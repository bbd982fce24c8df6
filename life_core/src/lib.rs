//! Conway's Game of Life on a bounded square board, plus a Start/Stop
//! controller that steps the board on a timer and hands each finished
//! generation to a display running on its own context.
//!
//! ```no_run
//! use life_core::{display, LifeConfig, Simulation};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let (handle, queue) = display::channel(1);
//! queue.spawn(|frame: &display::Frame| -> anyhow::Result<()> {
//!     println!("{}\n", frame.grid);
//!     Ok(())
//! });
//!
//! let runtime = tokio::runtime::Handle::current();
//! let simulation = Simulation::new(&LifeConfig::default(), handle, runtime)?;
//! if let Some(run) = simulation.start() {
//!     tokio::time::sleep(std::time::Duration::from_secs(3)).await;
//!     simulation.stop();
//!     run.join().await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod controller;
pub mod display;
pub mod grid;
pub mod patterns;

pub use config::{ConfigError, LifeConfig, MAX_SIZE};
pub use controller::{RunError, RunHandle, RunReport, Simulation, Timing};
pub use display::{DisplayError, DisplayHandle, DisplayQueue, Frame, FramePermit, FrameSink};
pub use grid::{CellState, Grid, GridError, DEFAULT_SIZE};
pub use patterns::{Pattern, INITIAL, PATTERNS};
