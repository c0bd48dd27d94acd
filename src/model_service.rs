use crate::{error::PredictError, prediction::Prediction};
use async_trait::async_trait;
use ndarray::{Array, Ix4};

/// Everything the core needs for one prediction: the raw upload plus the
/// catalog entry fields the handler already looked up.
#[derive(Debug, Clone)]
pub struct PredictRequest {
    pub image_data: Vec<u8>,
    pub plant: String,
    pub model_location: String,
    pub labels: Vec<String>,
}

#[async_trait]
pub trait ModelService: Send + Sync + 'static {
    async fn predict(&self, request: PredictRequest) -> Result<Prediction, PredictError>;
}

/// A loaded model's forward pass: preprocessed batch tensor in, flattened
/// score vector out. Implemented by the ort session wrapper and by synthetic
/// models in tests.
pub trait InferenceModel: Send + Sync + 'static {
    fn infer(&self, input: &Array<f32, Ix4>) -> Result<Vec<f32>, PredictError>;
}
