use crate::{
    classification::Prediction,
    model_service::{ModelError, ModelService},
    preprocessing::{image_to_tensor, PreprocessError},
};
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;

#[derive(Error, Debug)]
pub enum PredictionError {
    #[error(transparent)]
    Preprocess(#[from] PreprocessError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("preprocessing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Image bytes in, label and raw confidence out.
pub struct InferenceService<M: ModelService> {
    model_service: Arc<M>,
    threshold: f32,
}

impl<M: ModelService> Clone for InferenceService<M> {
    fn clone(&self) -> Self {
        Self {
            model_service: self.model_service.clone(),
            threshold: self.threshold,
        }
    }
}

impl<M: ModelService> InferenceService<M> {
    pub fn new(model_service: M, threshold: f32) -> Self {
        Self {
            model_service: Arc::new(model_service),
            threshold,
        }
    }

    #[instrument(skip(self, image_data), fields(bytes = image_data.len()))]
    pub async fn predict(&self, image_data: Vec<u8>) -> Result<Prediction, PredictionError> {
        let input = tokio::task::spawn_blocking(move || image_to_tensor(&image_data)).await??;

        let score = self.model_service.infer(input).await?;
        if !score.is_finite() {
            return Err(ModelError::NonFiniteScore(score).into());
        }
        let prediction = Prediction::from_score(score, self.threshold);

        tracing::debug!(
            "Prediction {} with confidence {:.4}",
            prediction.prediction.as_str(),
            prediction.confidence
        );

        Ok(prediction)
    }
}
