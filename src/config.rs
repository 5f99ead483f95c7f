use serde::Deserialize;

use crate::error::AppError;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Path to the ONNX export of the classifier.
    pub model_path: String,
    /// CSV history log, created on first append.
    pub history_path: String,
    /// JSON file with running counts.
    pub stats_path: String,
    /// How many top classes the result panel shows.
    pub top_k: usize,
    /// Capacity of the worker -> UI event channel.
    pub event_buffer_size: usize,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model_path: "chess_model.onnx".to_string(),
            history_path: "predictions_log.csv".to_string(),
            stats_path: "classification_stats.json".to_string(),
            top_k: 3,
            event_buffer_size: 100,
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Layered load: optional `chessvision.toml` next to the binary, then
    /// `CHESSVISION_*` environment overrides on top of the defaults.
    pub fn load() -> Result<Self, AppError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("chessvision").required(false))
            .add_source(config::Environment::with_prefix("CHESSVISION"))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}
