use std::path::PathBuf;

use image::DynamicImage;

use crate::color::ColorResult;
use crate::error::PipelineError;
use crate::pipeline::types::Classification;

/// Per-image state threaded through the processing steps. Steps fill in
/// what they can; the first failure is captured here instead of aborting,
/// so assembly always has something to work with.
pub struct ImageContext {
    pub path: PathBuf,
    pub file_name: String,
    pub image: Option<DynamicImage>,
    pub classification: Option<Classification>,
    pub color: ColorResult,
    pub failure: Option<PipelineError>,
}

impl ImageContext {
    pub fn new(path: PathBuf) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            path,
            file_name,
            image: None,
            classification: None,
            color: ColorResult::undetermined(),
            failure: None,
        }
    }

    /// Records the first failure only; later steps may still fail for
    /// follow-on reasons that would bury the root cause.
    pub fn record_failure(&mut self, error: PipelineError) {
        tracing::error!("{}: {error}", self.file_name);
        if self.failure.is_none() {
            self.failure = Some(error);
        }
    }
}
