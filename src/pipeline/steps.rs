//! Processing steps for one image.
//!
//! Steps never fail the pipeline for item-level problems: decode and
//! inference errors are captured on the context and turn into placeholder
//! records downstream.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::classifier::{preprocess, PieceClassifier};
use crate::color;
use crate::error::{AppError, PipelineError};
use crate::pipeline::context::ImageContext;

#[async_trait]
pub trait ProcessingStep: Send {
    fn name(&self) -> &'static str;
    async fn process(&mut self, context: &mut ImageContext) -> Result<(), AppError>;
}

/// Decodes the image from disk once; classification and color detection
/// both read the same immutable decode.
pub struct LoadStep;

#[async_trait]
impl ProcessingStep for LoadStep {
    fn name(&self) -> &'static str {
        "load"
    }

    async fn process(&mut self, context: &mut ImageContext) -> Result<(), AppError> {
        match preprocess::load_image(&context.path) {
            Ok(image) => context.image = Some(image),
            Err(e) => context.record_failure(e),
        }
        Ok(())
    }
}

/// Runs inference through the shared classifier. The model handle is shared
/// process-wide but driven by a single worker at a time; the mutex enforces
/// that no two inference calls overlap.
pub struct ClassifyStep {
    classifier: Arc<Mutex<Option<PieceClassifier>>>,
}

impl ClassifyStep {
    pub fn new(classifier: Arc<Mutex<Option<PieceClassifier>>>) -> Self {
        Self { classifier }
    }
}

#[async_trait]
impl ProcessingStep for ClassifyStep {
    fn name(&self) -> &'static str {
        "classify"
    }

    async fn process(&mut self, context: &mut ImageContext) -> Result<(), AppError> {
        let Some(image) = context.image.as_ref() else {
            return Ok(());
        };
        let mut guard = crate::context::lock_unpoisoned(&self.classifier);
        match guard.as_mut() {
            Some(classifier) => match classifier.classify(image) {
                Ok(classification) => context.classification = Some(classification),
                Err(e) => context.record_failure(e),
            },
            None => context.record_failure(PipelineError::ModelUnavailable(
                "classifier did not load at startup".to_string(),
            )),
        }
        Ok(())
    }
}

/// Heuristic color detection. Independent of the classifier and still runs
/// when the model is unavailable.
pub struct ColorStep;

#[async_trait]
impl ProcessingStep for ColorStep {
    fn name(&self) -> &'static str {
        "color"
    }

    async fn process(&mut self, context: &mut ImageContext) -> Result<(), AppError> {
        if let Some(image) = context.image.as_ref() {
            context.color = color::detect_color(image);
        }
        Ok(())
    }
}
