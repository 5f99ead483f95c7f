//! Interactive surface. All user-facing state lives on this thread; the
//! batch worker reaches it only through the event channel drained in
//! `update`.

pub mod views;

use std::path::{Path, PathBuf};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::batch::{BatchEvent, BatchOrchestrator, BatchSummary};
use crate::color::ColorResult;
use crate::context::{lock_unpoisoned, AppContext};
use crate::error::AppError;
use crate::pipeline::types::{Classification, Record};
use crate::store::Stats;

use views::history_view::HistoryView;
use views::result_view::ResultView;
use views::stats_view::StatsView;
use views::View;

/// The most recent per-image result, kept for the result panel.
pub struct CurrentResult {
    pub path: PathBuf,
    pub record: Record,
    pub classification: Option<Classification>,
    pub color: ColorResult,
}

pub struct ChessApp {
    context: AppContext,
    orchestrator: BatchOrchestrator,
    event_rx: mpsc::Receiver<BatchEvent>,
    single_path: String,
    batch_dir: String,
    export_path: String,
    current: Option<CurrentResult>,
    /// Newest first, mirroring the result table of the original surface.
    history_rows: Vec<Record>,
    stats_cache: Stats,
    color_filter: String,
    class_filter: String,
    progress: Option<(usize, usize)>,
    running: Option<CancellationToken>,
    last_summary: Option<BatchSummary>,
    status: Option<String>,
    errors: Vec<String>,
}

impl ChessApp {
    pub fn new(context: AppContext) -> Self {
        let (event_tx, event_rx) = mpsc::channel(context.settings.event_buffer_size);
        let orchestrator = BatchOrchestrator::new(&context, event_tx);

        let mut errors = Vec::new();
        let mut history_rows = match lock_unpoisoned(&context.history).load() {
            Ok(rows) => rows,
            Err(e) => {
                errors.push(format!("History load failed: {e}"));
                Vec::new()
            }
        };
        history_rows.reverse();
        let stats_cache = lock_unpoisoned(&context.stats).stats().clone();
        let export_path = "predictions_export.json".to_string();

        Self {
            context,
            orchestrator,
            event_rx,
            single_path: String::new(),
            batch_dir: String::new(),
            export_path,
            current: None,
            history_rows,
            stats_cache,
            color_filter: String::new(),
            class_filter: String::new(),
            progress: None,
            running: None,
            last_summary: None,
            status: None,
            errors,
        }
    }

    pub fn start_gui(context: AppContext) -> Result<(), AppError> {
        let options = eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_inner_size(egui::vec2(1100.0, 780.0))
                .with_title("Chess Piece Classifier"),
            ..Default::default()
        };

        eframe::run_native(
            "Chess Piece Classifier",
            options,
            Box::new(move |cc| {
                egui_extras::install_image_loaders(&cc.egui_ctx);
                Ok(Box::new(ChessApp::new(context)))
            }),
        )
        .map_err(|e| AppError::Ui(e.to_string()))
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.event_rx.try_recv() {
            match event {
                BatchEvent::Progress { processed, total } => {
                    self.progress = Some((processed, total));
                }
                BatchEvent::ItemFinished {
                    path,
                    record,
                    classification,
                    color,
                    stats,
                } => {
                    self.history_rows.insert(0, record.clone());
                    self.stats_cache = stats;
                    self.current = Some(CurrentResult {
                        path,
                        record,
                        classification,
                        color,
                    });
                }
                BatchEvent::Completed(summary) => {
                    self.status = Some(format!(
                        "Batch finished: {}/{} processed, {} failure(s)",
                        summary.outcomes.len(),
                        summary.total,
                        summary.failures
                    ));
                    self.last_summary = Some(summary);
                    self.progress = None;
                    self.running = None;
                }
            }
        }
    }

    fn submit(&mut self, paths: Vec<PathBuf>) {
        if paths.is_empty() {
            self.errors.push("Nothing to classify".to_string());
            return;
        }
        let total = paths.len();
        let (_handle, token) = self.orchestrator.spawn(paths);
        self.running = Some(token);
        self.progress = Some((0, total));
        self.last_summary = None;
        self.status = None;
    }

    fn submit_single(&mut self) {
        let path = PathBuf::from(self.single_path.trim());
        if path.is_file() {
            self.submit(vec![path]);
        } else {
            self.errors
                .push(format!("Not a file: {}", path.display()));
        }
    }

    fn submit_folder(&mut self) {
        match collect_images(Path::new(self.batch_dir.trim())) {
            Ok(paths) => self.submit(paths),
            Err(e) => self.errors.push(format!("Folder scan failed: {e}")),
        }
    }

    fn reset_stats(&mut self) {
        let mut stats = lock_unpoisoned(&self.context.stats);
        if let Err(e) = stats.reset() {
            self.errors.push(format!("Stats reset failed: {e}"));
        }
        self.stats_cache = stats.stats().clone();
    }

    fn export_history(&mut self) {
        let target = PathBuf::from(self.export_path.trim());
        let result = lock_unpoisoned(&self.context.history).export_json(&target);
        match result {
            Ok(count) => {
                self.status = Some(format!(
                    "Exported {count} record(s) to {}",
                    target.display()
                ))
            }
            Err(e) => self.errors.push(format!("Export failed: {e}")),
        }
    }

    fn draw_controls(&mut self, ui: &mut egui::Ui) {
        if self.context.model_available() {
            ui.colored_label(egui::Color32::DARK_GREEN, "Model loaded");
        } else {
            ui.colored_label(
                egui::Color32::RED,
                "Model unavailable - classification disabled, color detection still runs",
            );
        }
        ui.separator();

        let idle = self.running.is_none();
        ui.horizontal(|ui| {
            ui.label("Image:");
            ui.add(egui::TextEdit::singleline(&mut self.single_path).desired_width(320.0));
            if ui
                .add_enabled(idle, egui::Button::new("Classify"))
                .clicked()
            {
                self.submit_single();
            }
        });
        ui.horizontal(|ui| {
            ui.label("Folder:");
            ui.add(egui::TextEdit::singleline(&mut self.batch_dir).desired_width(320.0));
            if ui
                .add_enabled(idle, egui::Button::new("Classify Folder"))
                .clicked()
            {
                self.submit_folder();
            }
            if let Some(token) = &self.running {
                if ui.button("Cancel").clicked() {
                    token.cancel();
                }
            }
        });

        if let Some((processed, total)) = self.progress {
            let fraction = if total == 0 {
                0.0
            } else {
                processed as f32 / total as f32
            };
            ui.add(
                egui::ProgressBar::new(fraction).text(format!("{processed}/{total}")),
            );
        }
        if let Some(status) = &self.status {
            ui.label(status.clone());
        }
    }

    fn draw_summary(&self, ui: &mut egui::Ui) {
        let Some(summary) = &self.last_summary else {
            return;
        };
        ui.separator();
        ui.heading(format!(
            "Batch summary ({} items, {} failures, {:.1}s)",
            summary.total,
            summary.failures,
            summary.elapsed.as_secs_f32()
        ));
        egui::ScrollArea::vertical()
            .id_salt("summary_scroll")
            .max_height(140.0)
            .show(ui, |ui| {
                for outcome in &summary.outcomes {
                    let line = match &outcome.error {
                        Some(error) => format!("{} - FAILED: {error}", outcome.file_name),
                        None => format!(
                            "{} - {} / {} ({})",
                            outcome.file_name,
                            outcome.class_label,
                            outcome.color_label,
                            outcome.confidence
                        ),
                    };
                    ui.label(line);
                }
            });
    }
}

impl eframe::App for ChessApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events();

        egui::TopBottomPanel::top("controls").show(ctx, |ui| {
            ui.heading("Chess Piece Classifier");
            self.draw_controls(ui);
        });

        egui::TopBottomPanel::bottom("error_panel")
            .resizable(true)
            .show(ctx, |ui| {
                ui.heading("Error Log");
                egui::ScrollArea::vertical().show(ui, |ui| {
                    for error in self.errors.iter().rev() {
                        ui.label(format!("[ERROR] {error}"));
                    }
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(current) = &self.current {
                ResultView::new(current, &self.context.labels, self.context.settings.top_k)
                    .draw(ui);
            } else {
                ui.label("No image classified yet");
            }

            self.draw_summary(ui);

            ui.separator();
            ui.heading("Statistics");
            ui.horizontal(|ui| {
                StatsView::new(&self.stats_cache).draw(ui);
                ui.vertical(|ui| {
                    if ui.button("Reset statistics").clicked() {
                        self.reset_stats();
                    }
                    ui.horizontal(|ui| {
                        ui.label("Export to:");
                        ui.add(
                            egui::TextEdit::singleline(&mut self.export_path)
                                .desired_width(220.0),
                        );
                        if ui.button("Export JSON").clicked() {
                            self.export_history();
                        }
                    });
                });
            });

            ui.separator();
            ui.heading("History");
            HistoryView::new(
                &self.history_rows,
                &mut self.color_filter,
                &mut self.class_filter,
            )
            .draw(ui);
        });

        ctx.request_repaint();
    }
}

/// Collects classifiable images (jpg, jpeg, png) from one folder in name
/// order. Non-image files are skipped, not errors.
pub fn collect_images(dir: &Path) -> Result<Vec<PathBuf>, std::io::Error> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| {
                    let ext = ext.to_ascii_lowercase();
                    matches!(ext.as_str(), "jpg" | "jpeg" | "png")
                })
                .unwrap_or(false)
        })
        .collect();
    paths.sort();
    Ok(paths)
}
