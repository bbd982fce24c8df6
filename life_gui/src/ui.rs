// ui.rs - Renders accepted generations and forwards clicks to the simulation

use eframe::egui;
use egui::{Color32, Rect, Stroke, Vec2};
use life_core::{Frame, PATTERNS};
use tracing::{error, info};

use crate::LifeApp;

const CELL_SIZE: f32 = 20.0;
const SPACING: f32 = 1.0;

/// Which controls accept input this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Controls {
    start: bool,
    stop: bool,
    edit: bool,
}

impl Controls {
    /// Start stays disabled until the previous run has been reaped, so its outcome is never lost.
    fn for_state(running: bool, run_pending: bool) -> Self {
        Self { start: !running && !run_pending, stop: running, edit: !running }
    }
}

impl LifeApp {
    /// Accepts every generation the run loop has queued.
    fn receive_frames(&mut self) {
        let board = &mut self.board;
        self.queue.drain(|frame: &Frame| -> anyhow::Result<()> {
            *board = frame.grid.clone();
            Ok(())
        });
    }

    /// Collects the outcome of a run once its loop has exited.
    fn reap_run(&mut self) {
        if !self.run.as_ref().is_some_and(|run| run.is_finished()) {
            return;
        }
        let Some(run) = self.run.take() else { return };
        match self.runtime.block_on(run.join()) {
            Ok(report) => info!(run = report.run, generations = report.generations, "run finished"),
            Err(err) => {
                error!(error = %err, "run failed");
                self.last_error = Some(err.to_string());
            }
        }
        self.board = self.simulation.snapshot();
    }

    fn refresh_board(&mut self, changed: bool) {
        if changed {
            self.board = self.simulation.snapshot();
        }
    }
}

impl eframe::App for LifeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.receive_frames();
        self.reap_run();
        let running = self.simulation.is_running();
        let controls = Controls::for_state(running, self.run.is_some());

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Life Game");

            // Controls
            ui.horizontal(|ui| {
                if ui.add_enabled(controls.start, egui::Button::new("▶ Start")).clicked() {
                    self.last_error = None;
                    self.run = self.simulation.start();
                }

                if ui.add_enabled(controls.stop, egui::Button::new("⏹ Stop")).clicked() {
                    self.simulation.stop();
                }

                if ui.add_enabled(controls.edit, egui::Button::new("⏭ Step")).clicked() {
                    if let Some(frame) = self.simulation.step_once() {
                        self.board = frame.grid;
                    }
                }

                if ui.add_enabled(controls.edit, egui::Button::new("Clear")).clicked() {
                    let cleared = self.simulation.clear();
                    self.refresh_board(cleared);
                }
            });

            ui.horizontal(|ui| {
                ui.label("Pattern:");
                egui::ComboBox::from_id_source("pattern_selector")
                    .selected_text(PATTERNS[self.selected_pattern].name)
                    .show_ui(ui, |ui| {
                        for (i, pattern) in PATTERNS.iter().enumerate() {
                            ui.selectable_value(&mut self.selected_pattern, i, pattern.name);
                        }
                    });

                if ui.add_enabled(controls.edit, egui::Button::new("Apply Pattern")).clicked() {
                    match self.simulation.apply_pattern(&PATTERNS[self.selected_pattern]) {
                        Ok(applied) => self.refresh_board(applied),
                        Err(err) => self.last_error = Some(err.to_string()),
                    }
                }

                ui.separator();
                ui.label("Live:");
                ui.color_edit_button_srgba(&mut self.live_color);
                ui.label("Dead:");
                ui.color_edit_button_srgba(&mut self.dead_color);
            });

            ui.separator();

            ui.label(if running {
                "Running. Stop to edit the board."
            } else {
                "Click cells to toggle them, then Start."
            });
            if let Some(err) = &self.last_error {
                ui.colored_label(Color32::RED, err.as_str());
            }

            ui.separator();

            let size = self.board.size();
            let start_pos = ui.cursor().min;
            let total_size = Vec2::splat((CELL_SIZE + SPACING) * size as f32 - SPACING);
            let (response, painter) = ui.allocate_painter(total_size, egui::Sense::click());

            painter.rect_filled(Rect::from_min_size(start_pos, total_size), 0.0, Color32::GRAY);

            for (row, cells) in self.board.rows().enumerate() {
                for (col, cell) in cells.iter().enumerate() {
                    let rect = Rect::from_min_size(
                        egui::pos2(
                            start_pos.x + col as f32 * (CELL_SIZE + SPACING),
                            start_pos.y + row as f32 * (CELL_SIZE + SPACING),
                        ),
                        Vec2::splat(CELL_SIZE),
                    );
                    let color = if cell.is_alive() { self.live_color } else { self.dead_color };
                    painter.rect_filled(rect, 1.0, color);
                    painter.rect_stroke(rect, 1.0, Stroke::new(0.2, Color32::from_gray(60)));
                }
            }

            // Clicks only reach the grid while idle
            if controls.edit && response.clicked() {
                if let Some(pos) = response.interact_pointer_pos() {
                    let offset = pos - start_pos;
                    let col = (offset.x / (CELL_SIZE + SPACING)) as usize;
                    let row = (offset.y / (CELL_SIZE + SPACING)) as usize;
                    if offset.x >= 0.0 && offset.y >= 0.0 && self.board.cell(row, col).is_some() {
                        let toggled = self.simulation.toggle_cell(row, col);
                        self.refresh_board(toggled);
                    }
                }
            }

            ui.separator();

            let live_cells = self.board.population();
            let total = size * size;
            let tick = match self.simulation.timing().tick_interval {
                Some(interval) => format!("Tick: {} ms", interval.as_millis()),
                None => "Tick: unpaced".to_owned(),
            };
            ui.horizontal(|ui| {
                ui.label(format!("Generation: {}", self.board.generation()));
                ui.label(format!("Live cells: {}", live_cells));
                ui.label(format!("Population: {:.1}%", (live_cells as f32 / total as f32) * 100.0));
                ui.label(tick);
            });
        });

        // Keep polling until the loop has been reaped
        if running || self.run.is_some() {
            ctx.request_repaint();
        }
    }
}
