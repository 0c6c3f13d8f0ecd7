use crate::{
    config::{ModelConfig, Validatable},
    model_service::{ModelError, ModelService},
};
use async_trait::async_trait;
use ndarray::{Array, Ix4};
use ort::{
    session::{builder::GraphOptimizationLevel, Session},
    value::TensorRef,
};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

/// ONNX Runtime backed classifier.
///
/// Running a session needs exclusive access, so the service keeps a small
/// pool of sessions over the same model file and hands them out round-robin.
#[derive(Clone)]
pub struct OrtModelService {
    sessions: Arc<Vec<Arc<Mutex<Session>>>>,
    counter: Arc<AtomicUsize>,
}

impl OrtModelService {
    pub fn new(model_config: &ModelConfig) -> Result<Self, ort::Error> {
        let num_instances = model_config.num_instances.max(1);
        let sessions = (0..num_instances)
            .map(|_| {
                let mut builder = Session::builder()?
                    .with_optimization_level(GraphOptimizationLevel::Level3)?;
                if let Some(threads) = model_config.intra_threads {
                    builder = builder.with_intra_threads(threads)?;
                }
                let session = builder.commit_from_file(model_config.get_path())?;
                Ok(Arc::new(Mutex::new(session)))
            })
            .collect::<Result<Vec<_>, ort::Error>>()?;

        tracing::info!(
            "Created {} ONNX sessions from {:?}",
            num_instances,
            model_config.get_path()
        );

        Ok(Self {
            counter: Arc::new(AtomicUsize::new(0)),
            sessions: Arc::new(sessions),
        })
    }

    pub fn run_inference(&self, input: &Array<f32, Ix4>) -> Result<f32, ModelError> {
        let index = next_index(&self.counter, self.sessions.len());
        let mut session = self.sessions[index]
            .lock()
            .map_err(|e| ModelError::SessionPoisoned(e.to_string()))?;

        tracing::debug!("Handling request with session {}", index);
        let input_view = input.as_standard_layout();
        let tensor_ref = TensorRef::from_array_view(input_view.view())
            .map_err(|e| ModelError::Tensor(e.to_string()))?;

        let outputs = session
            .run(ort::inputs![tensor_ref])
            .map_err(|e| ModelError::Inference(e.to_string()))?;

        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| ModelError::Extract(e.to_string()))?;

        tracing::debug!("Model output shape {:?}", shape);
        first_score(data)
    }
}

fn next_index(counter: &AtomicUsize, len: usize) -> usize {
    counter.fetch_add(1, Ordering::SeqCst) % len
}

/// The output is `(1, 1)` for the single sigmoid unit; only element zero counts.
fn first_score(data: &[f32]) -> Result<f32, ModelError> {
    data.first().copied().ok_or(ModelError::EmptyOutput)
}

#[async_trait]
impl ModelService for OrtModelService {
    async fn infer(&self, input: Array<f32, Ix4>) -> Result<f32, ModelError> {
        let service = self.clone();
        tokio::task::spawn_blocking(move || service.run_inference(&input))
            .await
            .map_err(|e| ModelError::Inference(format!("inference task failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_sessions_are_used_round_robin() {
        let counter = AtomicUsize::new(0);

        let picked: Vec<usize> = (0..7).map(|_| next_index(&counter, 3)).collect();

        assert_eq!(picked, vec![0, 1, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn test_first_score_takes_element_zero() {
        assert_eq!(first_score(&[0.42, 0.9, 0.1]).unwrap(), 0.42);
        assert!(matches!(first_score(&[]), Err(ModelError::EmptyOutput)));
    }

    #[test]
    fn test_new_rejects_file_that_is_not_onnx() {
        let model_config = ModelConfig {
            onnx_file: "Cargo.toml".to_string(),
            model_dir: PathBuf::from(env!("CARGO_MANIFEST_DIR")),
            num_instances: 1,
            threshold: 0.5,
            intra_threads: Some(1),
        };

        assert!(OrtModelService::new(&model_config).is_err());
    }
}
