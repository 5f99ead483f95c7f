pub mod assembler;
pub mod context;
#[allow(clippy::module_inception)]
pub mod pipeline;
pub mod steps;
pub mod types;

pub use context::ImageContext;
pub use pipeline::ProcessingPipeline;
pub use types::{Classification, Record};
