//! End-to-end wiring test for the gateway binary: builds a real router over
//! a temporary seed root with test-double engine/classifier backends and
//! drives it through `tower::ServiceExt::oneshot`.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::Path;
use std::sync::Arc;
use tower::ServiceExt;
use wg_config::{SeedListPolicy, SeedPaths};
use wg_core::ClassScores;
use wg_engine::{ConstructOverrides, Ctrl, DType, Device as EngineDevice, EngineError, EngineFactory, EngineHandle, EngineOrchestrator, FrameTensor};
use wg_persistence::SeedCache;
use wg_safety::{ClassifierBackend, DecodedImage, Device as SafetyDevice, LoadedClassifier, SafetyClassifier, SafetyError};
use wg_transport::AppState;

struct AlwaysSafeBackend;

#[async_trait]
impl ClassifierBackend for AlwaysSafeBackend {
    fn device(&self) -> SafetyDevice {
        SafetyDevice::Cpu
    }

    async fn load(&self) -> Result<Box<dyn LoadedClassifier>, SafetyError> {
        struct Safe;
        impl LoadedClassifier for Safe {
            fn infer(&self, _image: &DecodedImage) -> ClassScores {
                ClassScores { neutral: 1.0, low: 0.0, medium: 0.0, high: 0.0 }
            }
        }
        Ok(Box::new(Safe))
    }

    async fn decode(&self, path: &Path) -> Result<DecodedImage, SafetyError> {
        let img = image::open(path).map_err(|err| SafetyError::Decode { path: path.display().to_string(), message: err.to_string() })?;
        let rgb = img.to_rgb8();
        Ok(DecodedImage { width: rgb.width(), height: rgb.height(), rgb8: rgb.into_raw() })
    }
}

struct NoopEngineFactory;

impl EngineFactory for NoopEngineFactory {
    fn construct(&self, _model_uri: &str, _device: EngineDevice, _overrides: &ConstructOverrides, _quant: Option<&str>, _dtype: DType) -> Result<Box<dyn EngineHandle>, EngineError> {
        Ok(Box::new(NoopHandle))
    }
}

struct NoopHandle;

impl EngineHandle for NoopHandle {
    fn reset(&mut self) -> Result<(), EngineError> {
        Ok(())
    }
    fn append_frame(&mut self, _frame: &FrameTensor) -> Result<(), EngineError> {
        Ok(())
    }
    fn set_prompt(&mut self, _text: &str) -> Result<(), EngineError> {
        Ok(())
    }
    fn gen_frame(&mut self, _ctrl: Ctrl<'_>) -> Result<FrameTensor, EngineError> {
        Ok(FrameTensor { width: 2, height: 2, rgb8: vec![0; 12] })
    }
}

fn build_state() -> (AppState, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let paths = SeedPaths::new(dir.path());
    std::fs::create_dir_all(paths.default_dir()).unwrap();
    std::fs::create_dir_all(paths.uploads_dir()).unwrap();

    let safety = Arc::new(SafetyClassifier::new(Arc::new(AlwaysSafeBackend)));
    let seed_cache = Arc::new(SeedCache::load(paths, safety.clone()));
    let orchestrator = Arc::new(EngineOrchestrator::new(Arc::new(NoopEngineFactory)));

    (AppState { orchestrator, seed_cache, safety, default_seed_list_policy: SeedListPolicy::SafeOnly }, dir)
}

#[tokio::test]
async fn health_reports_ok_with_no_model_loaded() {
    let (state, _dir) = build_state();
    let router = wg_transport::router(state);

    let response = router
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["world_engine"]["loaded"], serde_json::Value::Null);
    assert_eq!(body["world_engine"]["has_seed"], false);
}

#[tokio::test]
async fn uploaded_seed_appears_in_the_safe_listing() {
    let (state, _dir) = build_state();
    let router = wg_transport::router(state);

    let mut rgb = image::RgbImage::new(4, 4);
    for pixel in rgb.pixels_mut() {
        *pixel = image::Rgb([10, 10, 10]);
    }
    let mut png = Vec::new();
    image::DynamicImage::ImageRgb8(rgb).write_to(&mut std::io::Cursor::new(&mut png), image::ImageOutputFormat::Png).unwrap();

    let upload_body = serde_json::json!({ "filename": "test-seed.png", "data": STANDARD.encode(&png) });
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/seeds/upload")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&upload_body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .oneshot(Request::builder().uri("/seeds/list").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    let listed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    let filenames: Vec<&str> = listed.as_array().unwrap().iter().map(|entry| entry["filename"].as_str().unwrap()).collect();
    assert!(filenames.contains(&"test-seed.png"));
}

