use crate::{
    classifier::ClassifierService,
    config::ModelConfig,
    error::PredictError,
    model_service::InferenceModel,
    registry::{ModelLoader, ResolvedLocation},
};
use ndarray::{Array, Ix4};
use ort::{
    execution_providers::CPUExecutionProvider,
    session::{builder::GraphOptimizationLevel, Session},
    value::TensorRef,
};
use std::{sync::Mutex, time::Duration};

/// Production model loader over ONNX Runtime. Constructing it commits the ort
/// environment once, before any load call. Execution providers or custom
/// operators the serialized models need get registered here.
pub struct OrtModelLoader;

impl OrtModelLoader {
    pub fn new() -> Result<Self, PredictError> {
        ort::init()
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .commit()
            .map_err(|e| PredictError::ModelLoad(format!("ort init failed: {e}")))?;
        Ok(Self)
    }
}

impl ModelLoader for OrtModelLoader {
    type Model = Mutex<Session>;

    fn load(&self, location: &ResolvedLocation) -> Result<Self::Model, PredictError> {
        let builder = Session::builder()
            .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level3))
            .map_err(|e| PredictError::ModelLoad(format!("session builder failed: {e}")))?;

        let session = match location {
            ResolvedLocation::Local(path) => builder.commit_from_file(path),
            ResolvedLocation::Remote(url) => builder.commit_from_url(url),
        }
        .map_err(|e| PredictError::ModelLoad(e.to_string()))?;

        Ok(Mutex::new(session))
    }
}

impl InferenceModel for Mutex<Session> {
    fn infer(&self, input: &Array<f32, Ix4>) -> Result<Vec<f32>, PredictError> {
        let mut session = self
            .lock()
            .map_err(|e| PredictError::Internal(format!("session mutex poisoned: {e}")))?;

        let output_name = session
            .outputs
            .first()
            .map(|output| output.name.clone())
            .ok_or_else(|| PredictError::Internal("model has no outputs".to_string()))?;

        let tensor_ref = TensorRef::from_array_view(input.view())
            .map_err(|e| PredictError::Internal(format!("failed to build tensor: {e}")))?;

        let outputs = session
            .run(ort::inputs![tensor_ref])
            .map_err(|e| PredictError::Internal(format!("inference failed: {e}")))?;

        let (_shape, data) = outputs[output_name.as_str()]
            .try_extract_tensor::<f32>()
            .map_err(|e| PredictError::Internal(format!("failed to extract tensor: {e}")))?;

        // Flatten the batch wrapper; batch size is always 1 here.
        Ok(data.to_vec())
    }
}

/// The service the app runs: the generic pipeline specialized to ONNX models.
pub type OrtModelService = ClassifierService<OrtModelLoader>;

impl OrtModelService {
    pub fn from_config(config: &ModelConfig) -> Result<Self, PredictError> {
        let loader = OrtModelLoader::new()?;
        Ok(Self::new(
            loader,
            config.model_dir.clone(),
            Duration::from_secs(config.load_timeout_secs),
            Duration::from_secs(config.inference_timeout_secs),
        ))
    }
}
