use crate::app::views::View;
use crate::app::CurrentResult;
use crate::labels::LabelSet;

/// Panel for the most recent classification: predicted class, figure
/// color, confidence, and the top-k distribution view.
pub struct ResultView<'a> {
    current: &'a CurrentResult,
    labels: &'a LabelSet,
    top_k: usize,
}

impl<'a> ResultView<'a> {
    pub fn new(current: &'a CurrentResult, labels: &'a LabelSet, top_k: usize) -> Self {
        Self {
            current,
            labels,
            top_k,
        }
    }
}

impl View for ResultView<'_> {
    fn draw(&mut self, ui: &mut egui::Ui) {
        ui.group(|ui| {
            ui.horizontal(|ui| {
                ui.add(
                    egui::Image::from_uri(format!(
                        "file://{}",
                        self.current.path.display()
                    ))
                    .max_height(200.0)
                    .max_width(200.0),
                );
                ui.vertical(|ui| {
                    let record = &self.current.record;
                    ui.heading(&record.file_name);
                    ui.label(format!("Class: {}", record.class_label));
                    ui.label(format!(
                        "Color: {} (brightness {:.2})",
                        record.color_label, self.current.color.metric
                    ));
                    ui.label(format!("Confidence: {}", record.confidence));
                });
            });

            if let Some(classification) = &self.current.classification {
                ui.separator();
                ui.label("Top classes:");
                for (idx, score) in classification.top_k(self.top_k) {
                    let name = self
                        .labels
                        .get(idx)
                        .map(|l| l.display.as_str())
                        .unwrap_or("?");
                    ui.add(
                        egui::ProgressBar::new(score)
                            .text(format!("{name}: {:.2}%", score * 100.0)),
                    );
                }
            }
        });
    }
}
