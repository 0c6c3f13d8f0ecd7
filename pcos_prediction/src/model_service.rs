use async_trait::async_trait;
use ndarray::{Array, Ix4};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("session mutex poisoned: {0}")]
    SessionPoisoned(String),
    #[error("failed to build tensor: {0}")]
    Tensor(String),
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("failed to extract tensor: {0}")]
    Extract(String),
    #[error("model returned an empty output")]
    EmptyOutput,
    #[error("model returned a non-finite score: {0}")]
    NonFiniteScore(f32),
}

/// Forward pass of the binary classifier.
///
/// Implementations take a `(1, 224, 224, 3)` batch and return the first
/// scalar of the first output for the single batch element.
#[async_trait]
pub trait ModelService: Send + Sync + 'static {
    async fn infer(&self, input: Array<f32, Ix4>) -> Result<f32, ModelError>;
}
