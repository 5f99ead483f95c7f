pub mod app;
pub mod batch;
pub mod classifier;
pub mod color;
pub mod config;
pub mod context;
pub mod error;
pub mod labels;
pub mod pipeline;
pub mod store;

pub use crate::config::Settings;
pub use crate::context::AppContext;
pub use crate::error::{AppError, PipelineError, StatsError, StoreError};
