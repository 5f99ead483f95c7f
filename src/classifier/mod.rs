//! Multi-class piece classification over a frozen, pretrained model.

pub mod model;
pub mod preprocess;

use std::path::Path;

use image::DynamicImage;

use crate::error::PipelineError;
use crate::labels::LabelSet;
use crate::pipeline::types::Classification;

/// Seam between the classifier and the inference backend. Production uses
/// the ONNX plan; tests substitute a stub. `&mut self` encodes that the
/// backend is not reentrant.
pub trait Model: Send {
    fn predict(&mut self, input: &[f32]) -> Result<Vec<f32>, PipelineError>;
}

pub struct PieceClassifier {
    model: Box<dyn Model>,
    labels: LabelSet,
}

impl PieceClassifier {
    pub fn load(path: &Path, labels: LabelSet) -> Result<Self, PipelineError> {
        let model = model::OnnxModel::load(path)?;
        Ok(Self::with_model(Box::new(model), labels))
    }

    pub fn with_model(model: Box<dyn Model>, labels: LabelSet) -> Self {
        Self { model, labels }
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    /// Runs one inference and decodes the distribution against the label
    /// set. The distribution length must equal the label count; anything
    /// else is an inference failure, reported per image and never retried.
    pub fn classify(&mut self, image: &DynamicImage) -> Result<Classification, PipelineError> {
        let input = preprocess::to_input_buffer(image);
        let distribution = self.model.predict(&input)?;
        if distribution.len() != self.labels.len() {
            return Err(PipelineError::Inference(format!(
                "model returned {} scores for {} labels",
                distribution.len(),
                self.labels.len()
            )));
        }
        let predicted = LabelSet::argmax(&distribution)
            .ok_or_else(|| PipelineError::Inference("empty distribution".to_string()))?;
        let confidence = distribution[predicted];
        Ok(Classification {
            predicted,
            confidence,
            distribution,
        })
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;

    /// Fixed-output backend for tests.
    pub struct StubModel {
        pub distribution: Vec<f32>,
    }

    impl Model for StubModel {
        fn predict(&mut self, _input: &[f32]) -> Result<Vec<f32>, PipelineError> {
            Ok(self.distribution.clone())
        }
    }

    /// Backend that always fails, for inference-error paths.
    pub struct FailingModel;

    impl Model for FailingModel {
        fn predict(&mut self, _input: &[f32]) -> Result<Vec<f32>, PipelineError> {
            Err(PipelineError::Inference("backend exploded".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{FailingModel, StubModel};
    use super::*;
    use image::Rgb;

    fn test_image() -> DynamicImage {
        DynamicImage::ImageRgb8(image::ImageBuffer::from_pixel(32, 32, Rgb([120u8, 120, 120])))
    }

    #[test]
    fn classify_decodes_argmax_and_confidence() {
        let stub = StubModel {
            distribution: vec![0.05, 0.1, 0.05, 0.7, 0.1],
        };
        let mut classifier =
            PieceClassifier::with_model(Box::new(stub), LabelSet::chess_pieces());
        let result = classifier.classify(&test_image()).unwrap();
        assert_eq!(result.predicted, 3);
        assert!((result.confidence - 0.7).abs() < 1e-6);
        assert_eq!(result.distribution.len(), classifier.labels().len());
        let sum: f32 = result.distribution.iter().sum();
        assert!((sum - 1.0).abs() < 1e-3);
    }

    #[test]
    fn distribution_length_mismatch_is_an_inference_error() {
        let stub = StubModel {
            distribution: vec![0.5, 0.5],
        };
        let mut classifier =
            PieceClassifier::with_model(Box::new(stub), LabelSet::chess_pieces());
        let err = classifier.classify(&test_image()).unwrap_err();
        assert!(matches!(err, PipelineError::Inference(_)));
    }

    #[test]
    fn backend_failure_propagates_as_inference_error() {
        let mut classifier =
            PieceClassifier::with_model(Box::new(FailingModel), LabelSet::chess_pieces());
        let err = classifier.classify(&test_image()).unwrap_err();
        assert!(matches!(err, PipelineError::Inference(_)));
    }
}
