//! ONNX-backed model, loaded once at process start.

use std::path::Path;

use tract_onnx::prelude::*;

use crate::classifier::preprocess::{CHANNELS, INPUT_SIZE};
use crate::classifier::Model;
use crate::error::PipelineError;

/// Wraps an optimized tract plan. The plan is read-only after load and is
/// driven through `&mut` so no two inference calls can overlap.
pub struct OnnxModel {
    plan: TypedSimplePlan<TypedModel>,
}

impl OnnxModel {
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let plan = Self::build_plan(path)
            .map_err(|e| PipelineError::ModelUnavailable(format!("{}: {e}", path.display())))?;
        tracing::info!("Loaded classifier model from {}", path.display());
        Ok(Self { plan })
    }

    fn build_plan(path: &Path) -> TractResult<TypedSimplePlan<TypedModel>> {
        tract_onnx::onnx()
            .model_for_path(path)?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(
                    f32::datum_type(),
                    tvec!(1, INPUT_SIZE as usize, INPUT_SIZE as usize, CHANNELS),
                ),
            )?
            .into_optimized()?
            .into_runnable()
    }
}

impl Model for OnnxModel {
    fn predict(&mut self, input: &[f32]) -> Result<Vec<f32>, PipelineError> {
        let tensor = Tensor::from_shape(
            &[1, INPUT_SIZE as usize, INPUT_SIZE as usize, CHANNELS],
            input,
        )
        .map_err(|e| PipelineError::Inference(e.to_string()))?;
        let outputs = self
            .plan
            .run(tvec!(tensor.into()))
            .map_err(|e| PipelineError::Inference(e.to_string()))?;
        let view = outputs[0]
            .to_array_view::<f32>()
            .map_err(|e| PipelineError::Inference(e.to_string()))?;
        Ok(view.iter().copied().collect())
    }
}
