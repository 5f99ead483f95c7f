use thiserror::Error;

// Main application error type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Pipeline Error: {0}")]
    Pipeline(#[from] PipelineError),
    #[error("History Store Error: {0}")]
    Store(#[from] StoreError),
    #[error("Stats Error: {0}")]
    Stats(#[from] StatsError),
    #[error("Configuration Error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("UI Error: {0}")]
    Ui(String),
}

/// Per-image failures. Callers catch these at the item level and turn them
/// into placeholder records, they never abort a batch.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to decode image {path}: {source}")]
    ImageDecode {
        path: String,
        source: image::ImageError,
    },
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),
    #[error("Inference failed: {0}")]
    Inference(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Log header does not match the canonical schema: found {found:?}")]
    SchemaMismatch { found: Vec<String> },
    #[error("No configured encoding could decode the log file")]
    Decode,
    #[error("Log I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Export failed: {0}")]
    Export(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum StatsError {
    #[error("Stats file unreadable or invalid: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("Stats I/O failed: {0}")]
    Io(#[from] std::io::Error),
}
