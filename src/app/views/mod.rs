pub mod history_view;
pub mod result_view;
pub mod stats_view;

pub trait View {
    fn draw(&mut self, ui: &mut egui::Ui);
}
