use crate::app::views::View;
use crate::pipeline::types::Record;
use crate::store::HistoryStore;

/// Filterable table over the loaded history, newest row first. The color
/// filter is a contains-match, the class filter exact, mirroring the
/// store's own query semantics.
pub struct HistoryView<'a> {
    rows: &'a [Record],
    color_filter: &'a mut String,
    class_filter: &'a mut String,
}

impl<'a> HistoryView<'a> {
    pub fn new(
        rows: &'a [Record],
        color_filter: &'a mut String,
        class_filter: &'a mut String,
    ) -> Self {
        Self {
            rows,
            color_filter,
            class_filter,
        }
    }

    fn filtered(&self) -> Vec<Record> {
        let color = Some(self.color_filter.trim()).filter(|s| !s.is_empty());
        let class = Some(self.class_filter.trim()).filter(|s| !s.is_empty());
        HistoryStore::filter_records(self.rows, color, class)
    }
}

impl View for HistoryView<'_> {
    fn draw(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("Color contains:");
            ui.add(egui::TextEdit::singleline(&mut *self.color_filter).desired_width(100.0));
            ui.label("Class is:");
            ui.add(egui::TextEdit::singleline(&mut *self.class_filter).desired_width(100.0));
        });

        let filtered = self.filtered();
        ui.label(format!("{} of {} entries", filtered.len(), self.rows.len()));

        egui::ScrollArea::vertical().max_height(260.0).show(ui, |ui| {
            egui::Grid::new("history_grid")
                .striped(true)
                .num_columns(4)
                .show(ui, |ui| {
                    ui.strong("File");
                    ui.strong("Class");
                    ui.strong("Color");
                    ui.strong("Confidence");
                    ui.end_row();
                    for record in &filtered {
                        ui.label(&record.file_name);
                        ui.label(&record.class_label);
                        ui.label(&record.color_label);
                        ui.label(&record.confidence);
                        ui.end_row();
                    }
                });
        });
    }
}
