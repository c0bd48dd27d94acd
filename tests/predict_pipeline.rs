use image::{ImageBuffer, Rgb};
use ndarray::{Array, Ix4};
use plant_prediction::{
    classifier::ClassifierService,
    error::PredictError,
    model_service::{InferenceModel, ModelService, PredictRequest},
    registry::{ModelLoader, ResolvedLocation},
};
use std::{
    io::Cursor,
    path::PathBuf,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

/// A synthetic classifier that ignores its input and always emits the same
/// score vector, standing in for a real ONNX session.
struct FixedModel {
    scores: Vec<f32>,
}

impl InferenceModel for FixedModel {
    fn infer(&self, input: &Array<f32, Ix4>) -> Result<Vec<f32>, PredictError> {
        assert_eq!(&input.shape()[..3], &[1, 150, 150]);
        Ok(self.scores.clone())
    }
}

#[derive(Clone)]
struct FixedLoader {
    scores: Vec<f32>,
    loads: Arc<AtomicUsize>,
}

impl ModelLoader for FixedLoader {
    type Model = FixedModel;

    fn load(&self, _location: &ResolvedLocation) -> Result<FixedModel, PredictError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(FixedModel {
            scores: self.scores.clone(),
        })
    }
}

fn service_with(scores: Vec<f32>) -> (ClassifierService<FixedLoader>, Arc<AtomicUsize>) {
    let loads = Arc::new(AtomicUsize::new(0));
    let loader = FixedLoader {
        scores,
        loads: loads.clone(),
    };
    let service = ClassifierService::new(
        loader,
        PathBuf::from("models"),
        Duration::from_secs(5),
        Duration::from_secs(5),
    );
    (service, loads)
}

fn leaf_png() -> Vec<u8> {
    let img = ImageBuffer::<Rgb<u8>, Vec<u8>>::from_pixel(64, 64, Rgb([30, 160, 40]));
    let mut image_data: Vec<u8> = Vec::new();
    img.write_to(&mut Cursor::new(&mut image_data), image::ImageFormat::Png)
        .unwrap();
    image_data
}

fn tomato_request(image_data: Vec<u8>) -> PredictRequest {
    PredictRequest {
        image_data,
        plant: "Tomato".to_string(),
        model_location: "models/tomato.bin".to_string(),
        labels: vec![
            "Healthy".to_string(),
            "Blight".to_string(),
            "Rust".to_string(),
        ],
    }
}

#[tokio::test]
async fn fixed_model_yields_top_label() {
    let (service, _) = service_with(vec![0.1, 0.7, 0.2]);

    let prediction = service.predict(tomato_request(leaf_png())).await.unwrap();

    assert_eq!(prediction.plant, "Tomato");
    assert_eq!(prediction.label, "Blight");
    assert!((prediction.confidence - 0.7).abs() < 1e-9);
    assert!((0.0..=1.0).contains(&prediction.confidence));
}

#[tokio::test]
async fn model_is_loaded_once_across_requests() {
    let (service, loads) = service_with(vec![0.2, 0.5, 0.3]);

    service.predict(tomato_request(leaf_png())).await.unwrap();
    service.predict(tomato_request(leaf_png())).await.unwrap();

    assert_eq!(loads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn identical_inputs_give_identical_predictions() {
    let (service, _) = service_with(vec![0.05, 0.05, 0.9]);

    let first = service.predict(tomato_request(leaf_png())).await.unwrap();
    let second = service.predict(tomato_request(leaf_png())).await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn score_count_must_match_label_count() {
    let (service, _) = service_with(vec![0.1, 0.2, 0.3, 0.4]);

    let result = service.predict(tomato_request(leaf_png())).await;

    assert!(matches!(
        result,
        Err(PredictError::LabelMismatch {
            outputs: 4,
            labels: 3
        })
    ));
}

#[tokio::test]
async fn undecodable_image_fails_with_decode_error() {
    let (service, _) = service_with(vec![0.1, 0.7, 0.2]);

    let result = service.predict(tomato_request(b"not an image".to_vec())).await;

    assert!(matches!(result, Err(PredictError::Decode(_))));
}

#[tokio::test]
async fn slow_forward_pass_times_out() {
    struct StallingModel {
        delay: Duration,
    }

    impl InferenceModel for StallingModel {
        fn infer(&self, _input: &Array<f32, Ix4>) -> Result<Vec<f32>, PredictError> {
            std::thread::sleep(self.delay);
            Ok(vec![0.1, 0.7, 0.2])
        }
    }

    struct StallingLoader;

    impl ModelLoader for StallingLoader {
        type Model = StallingModel;

        fn load(&self, _location: &ResolvedLocation) -> Result<StallingModel, PredictError> {
            Ok(StallingModel {
                delay: Duration::from_millis(200),
            })
        }
    }

    let service = ClassifierService::new(
        StallingLoader,
        PathBuf::from("models"),
        Duration::from_secs(5),
        Duration::from_millis(10),
    );

    let result = service.predict(tomato_request(leaf_png())).await;

    assert!(matches!(result, Err(PredictError::Timeout("inference"))));
}

#[tokio::test]
async fn load_failure_surfaces_and_does_not_poison_the_cache() {
    struct FlakyLoader {
        loads: Arc<AtomicUsize>,
    }

    impl ModelLoader for FlakyLoader {
        type Model = FixedModel;

        fn load(&self, _location: &ResolvedLocation) -> Result<FixedModel, PredictError> {
            if self.loads.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(PredictError::ModelLoad("unreachable artifact".to_string()));
            }
            Ok(FixedModel {
                scores: vec![0.1, 0.7, 0.2],
            })
        }
    }

    let loads = Arc::new(AtomicUsize::new(0));
    let service = ClassifierService::new(
        FlakyLoader {
            loads: loads.clone(),
        },
        PathBuf::from("models"),
        Duration::from_secs(5),
        Duration::from_secs(5),
    );

    let first = service.predict(tomato_request(leaf_png())).await;
    assert!(matches!(first, Err(PredictError::ModelLoad(_))));

    let second = service.predict(tomato_request(leaf_png())).await.unwrap();
    assert_eq!(second.label, "Blight");
    assert_eq!(loads.load(Ordering::SeqCst), 2);
}
