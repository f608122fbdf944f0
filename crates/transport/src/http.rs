//! The small HTTP API for out-of-band seed management and health (§6).

use crate::state::AppState;
use crate::thumbnail::make_thumbnail;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::path::Path as FsPath;
use wg_config::SeedListPolicy;
use wg_core::ClassScores;
use wg_persistence::CacheError;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub world_engine: WorldEngineHealth,
    pub safety: SafetyHealth,
}

#[derive(Serialize)]
pub struct WorldEngineHealth {
    pub loaded: Option<String>,
    pub warmed_up: bool,
    pub has_seed: bool,
}

#[derive(Serialize)]
pub struct SafetyHealth {
    pub loaded: bool,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let runtime = state.orchestrator.runtime_state();
    Json(HealthResponse {
        status: "ok",
        world_engine: WorldEngineHealth { loaded: runtime.loaded_model, warmed_up: runtime.warmed_up, has_seed: runtime.has_seed },
        // The classifier is loaded on demand and unloaded after every request
        // (§4.3); there is no persistent "model loaded" state to report.
        safety: SafetyHealth { loaded: true },
    })
}

#[derive(Deserialize)]
pub struct CheckImageRequest {
    pub path: String,
}

#[derive(Serialize)]
pub struct CheckImageResponse {
    pub is_safe: bool,
    pub scores: ClassScores,
}

pub async fn check_image(State(state): State<AppState>, Json(req): Json<CheckImageRequest>) -> impl IntoResponse {
    match state.safety.check_one(FsPath::new(&req.path)).await {
        Ok(verdict) => (StatusCode::OK, Json(CheckImageResponse { is_safe: verdict.is_safe, scores: verdict.scores })).into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({ "error": err.to_string() }))).into_response(),
    }
}

#[derive(Deserialize)]
pub struct CheckBatchRequest {
    pub paths: Vec<String>,
}

#[derive(Serialize)]
pub struct CheckBatchResponse {
    pub results: Vec<CheckImageResponse>,
}

pub async fn check_batch(State(state): State<AppState>, Json(req): Json<CheckBatchRequest>) -> impl IntoResponse {
    let paths: Vec<std::path::PathBuf> = req.paths.into_iter().map(std::path::PathBuf::from).collect();
    match state.safety.check_batch(&paths, 16).await {
        Ok(verdicts) => {
            let results = verdicts.into_iter().map(|v| CheckImageResponse { is_safe: v.is_safe, scores: v.scores }).collect();
            (StatusCode::OK, Json(CheckBatchResponse { results })).into_response()
        }
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({ "error": err.to_string() }))).into_response(),
    }
}

#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub include_unsafe: Option<bool>,
}

#[derive(Serialize)]
pub struct SeedListEntry {
    pub filename: String,
    pub hash: String,
    pub is_safe: bool,
    pub is_default: bool,
    pub checked_at: chrono::DateTime<chrono::Utc>,
}

pub async fn list_seeds(State(state): State<AppState>, Query(query): Query<ListQuery>) -> Json<Vec<SeedListEntry>> {
    let include_unsafe = query.include_unsafe.unwrap_or(state.default_seed_list_policy == SeedListPolicy::IncludeUnsafe);
    let default_dir = state.seed_cache.default_dir();
    let records = state.seed_cache.list(include_unsafe).await;
    Json(
        records
            .into_iter()
            .map(|record| SeedListEntry {
                is_default: record.is_default(&default_dir),
                filename: record.filename,
                hash: record.hash,
                is_safe: record.is_safe,
                checked_at: record.checked_at,
            })
            .collect(),
    )
}

pub async fn get_seed_image(State(state): State<AppState>, Path(filename): Path<String>) -> Response {
    let Some(record) = state.seed_cache.get(&filename).await else {
        return (StatusCode::NOT_FOUND, "seed not found").into_response();
    };
    if !record.is_safe {
        return (StatusCode::FORBIDDEN, "seed is marked unsafe").into_response();
    }
    match tokio::fs::read(&record.path).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, mime_for(&record.path))], bytes).into_response(),
        Err(_) => (StatusCode::NOT_FOUND, "seed file missing from disk").into_response(),
    }
}

pub async fn get_seed_thumbnail(State(state): State<AppState>, Path(filename): Path<String>) -> Response {
    let Some(record) = state.seed_cache.get(&filename).await else {
        return (StatusCode::NOT_FOUND, "seed not found").into_response();
    };
    if !record.is_safe {
        return (StatusCode::FORBIDDEN, "seed is marked unsafe").into_response();
    }
    let path = record.path.clone();
    match tokio::task::spawn_blocking(move || make_thumbnail(&path)).await {
        Ok(Ok(jpeg)) => ([(header::CONTENT_TYPE, "image/jpeg")], jpeg).into_response(),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "failed to render thumbnail").into_response(),
    }
}

#[derive(Deserialize)]
pub struct UploadRequest {
    pub filename: String,
    pub data: String,
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub filename: String,
    pub hash: String,
    pub is_safe: bool,
    pub scores: ClassScores,
}

pub async fn upload_seed(State(state): State<AppState>, Json(req): Json<UploadRequest>) -> Response {
    let bytes = match STANDARD.decode(req.data) {
        Ok(bytes) => bytes,
        Err(_) => return (StatusCode::BAD_REQUEST, "data must be valid base64").into_response(),
    };
    match state.seed_cache.upload(&req.filename, &bytes).await {
        Ok(record) => {
            (StatusCode::OK, Json(UploadResponse { filename: record.filename, hash: record.hash, is_safe: record.is_safe, scores: record.scores })).into_response()
        }
        Err(err) => cache_error_response(err),
    }
}

#[derive(Deserialize, Default)]
pub struct RescanRequest {
    #[serde(default)]
    pub force_full_rescan: bool,
}

#[derive(Serialize)]
pub struct RescanResponse {
    pub total: usize,
    pub safe: usize,
    pub unsafe_count: usize,
}

pub async fn rescan_seeds(State(state): State<AppState>, body: Option<Json<RescanRequest>>) -> Response {
    let force_full_rescan = body.map(|Json(req)| req.force_full_rescan).unwrap_or(false);
    let result = if force_full_rescan { state.seed_cache.rescan().await } else { state.seed_cache.validate_and_update().await };
    match result {
        Ok(totals) => (StatusCode::OK, Json(RescanResponse { total: totals.total, safe: totals.safe, unsafe_count: totals.unsafe_count })).into_response(),
        Err(err) => cache_error_response(err),
    }
}

pub async fn delete_seed(State(state): State<AppState>, Path(filename): Path<String>) -> Response {
    match state.seed_cache.delete(&filename).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => cache_error_response(err),
    }
}

fn mime_for(path: &std::path::Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()).map(|ext| ext.to_ascii_lowercase()).as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

fn cache_error_response(err: CacheError) -> Response {
    let status = match &err {
        CacheError::NotFound(_) => StatusCode::NOT_FOUND,
        CacheError::Unsafe(_) | CacheError::IntegrityMismatch | CacheError::DefaultSeedImmutable(_) => StatusCode::FORBIDDEN,
        CacheError::UnsupportedExtension(_) => StatusCode::BAD_REQUEST,
        CacheError::Io(_) | CacheError::Classifier(_) | CacheError::Corrupt(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(serde_json::json!({ "error": err.to_string() }))).into_response()
}
