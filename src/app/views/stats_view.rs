use crate::app::views::View;
use crate::store::Stats;

pub struct StatsView<'a> {
    stats: &'a Stats,
}

impl<'a> StatsView<'a> {
    pub fn new(stats: &'a Stats) -> Self {
        Self { stats }
    }
}

impl View for StatsView<'_> {
    fn draw(&mut self, ui: &mut egui::Ui) {
        ui.group(|ui| {
            ui.label(format!(
                "Total classifications: {}",
                self.stats.total_classifications
            ));
            ui.horizontal(|ui| {
                for (color, count) in &self.stats.by_color {
                    ui.label(format!("{color}: {count}"));
                }
            });
            if !self.stats.by_class.is_empty() {
                ui.separator();
                for (class, count) in &self.stats.by_class {
                    ui.label(format!("{class}: {count}"));
                }
            }
        });
    }
}
