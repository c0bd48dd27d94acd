use crate::{
    error::PredictError,
    model_service::{InferenceModel, ModelService, PredictRequest},
    prediction::{rank, Prediction},
    preprocess::image_to_tensor,
    registry::{ModelLoader, ModelRegistry},
};
use async_trait::async_trait;
use std::{path::PathBuf, sync::Arc, time::Duration};
use tokio::time::timeout;

/// The full prediction pipeline: registry lookup (load-if-absent), image
/// preprocessing, forward pass, and ranking. Generic over the loader so tests
/// can run the identical orchestration against synthetic models.
pub struct ClassifierService<L: ModelLoader> {
    registry: Arc<ModelRegistry<L>>,
    inference_timeout: Duration,
}

impl<L> ClassifierService<L>
where
    L: ModelLoader,
    L::Model: InferenceModel,
{
    pub fn new(
        loader: L,
        model_dir: PathBuf,
        load_timeout: Duration,
        inference_timeout: Duration,
    ) -> Self {
        Self {
            registry: Arc::new(ModelRegistry::new(loader, model_dir, load_timeout)),
            inference_timeout,
        }
    }
}

#[async_trait]
impl<L> ModelService for ClassifierService<L>
where
    L: ModelLoader,
    L::Model: InferenceModel,
{
    #[tracing::instrument(skip(self, request), fields(plant = %request.plant))]
    async fn predict(&self, request: PredictRequest) -> Result<Prediction, PredictError> {
        let model = self.registry.ensure_loaded(&request.model_location).await?;
        let input = image_to_tensor(&request.image_data)?;

        // The forward pass is blocking; run it off the async workers so the
        // timeout can actually fire. All tensor buffers are owned by the
        // closure and dropped on every exit path.
        let inference = tokio::task::spawn_blocking(move || model.infer(&input));
        let scores = match timeout(self.inference_timeout, inference).await {
            Err(_) => return Err(PredictError::Timeout("inference")),
            Ok(Err(join_error)) => {
                return Err(PredictError::Internal(format!(
                    "inference task failed: {join_error}"
                )))
            }
            Ok(Ok(result)) => result?,
        };

        tracing::debug!(scores = scores.len(), "inference complete");
        rank(&request.plant, &request.labels, &scores)
    }
}
