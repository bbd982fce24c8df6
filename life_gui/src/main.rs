// main.rs - Desktop display for the bounded Game of Life simulation
//
// Usage: life_gui [config.json]

use std::sync::{Arc, OnceLock};

use anyhow::Context as _;
use eframe::egui;
use egui::Color32;
use life_core::{display, DisplayQueue, Grid, LifeConfig, RunHandle, Simulation};
use tracing::info;

mod ui;

fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = match std::env::args_os().nth(1) {
        Some(path) => LifeConfig::from_path(&path)
            .with_context(|| format!("loading {}", path.to_string_lossy()))?,
        None => LifeConfig::default(),
    };
    let runtime = tokio::runtime::Runtime::new().context("starting tokio runtime")?;

    // The window's context only exists once eframe is running; frames queued
    // before that are picked up by the first repaint.
    let repaint: Arc<OnceLock<egui::Context>> = Arc::default();
    let waker = Arc::clone(&repaint);
    let (handle, queue) = display::channel(1);
    let handle = handle.with_waker(move || {
        if let Some(ctx) = waker.get() {
            ctx.request_repaint();
        }
    });

    let simulation = Simulation::new(&config, handle, runtime.handle().clone())?;
    let app = LifeApp::new(simulation, queue, runtime);
    info!(size = config.size, "opening window");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([460.0, 600.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Life Game",
        options,
        Box::new(move |cc| {
            let _ = repaint.set(cc.egui_ctx.clone());
            Box::new(app)
        }),
    )
    .map_err(|err| anyhow::anyhow!("window closed with error: {err}"))
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Window state. The simulation owns the real grid; `board` is the last
/// generation the display accepted.
pub struct LifeApp {
    simulation: Simulation,
    queue: DisplayQueue,
    board: Grid,
    run: Option<RunHandle>,
    last_error: Option<String>,

    pub live_color: Color32,
    pub dead_color: Color32,
    pub selected_pattern: usize,

    // Dropped last so the run loop can still be joined while the app tears down.
    runtime: tokio::runtime::Runtime,
}

impl LifeApp {
    fn new(simulation: Simulation, queue: DisplayQueue, runtime: tokio::runtime::Runtime) -> Self {
        let board = simulation.snapshot();
        Self {
            simulation,
            queue,
            board,
            run: None,
            last_error: None,
            live_color: Color32::BLACK,
            dead_color: Color32::WHITE,
            selected_pattern: 0,
            runtime,
        }
    }
}
