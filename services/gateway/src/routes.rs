use std::time::Instant;

use axum::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, FromRequest, Request, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::{engine::general_purpose, Engine as _};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tracing::{error, info};
use uuid::Uuid;

use crate::state::SharedState;

pub type ApiError = (StatusCode, Json<Value>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(json!({"error": message.into()})))
}

/// `Json` extractor whose rejections use the `{"error": ...}` body.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => {
                let status = if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                    StatusCode::PAYLOAD_TOO_LARGE
                } else {
                    StatusCode::BAD_REQUEST
                };
                Err(api_error(status, rejection.body_text()))
            }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UploadRequest {
    #[serde(rename = "imageBase64", default)]
    pub image_base64: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(rename = "imageId")]
    pub image_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateBatchRequest {
    #[serde(rename = "imageId", default)]
    pub image_id: Option<String>,
    #[serde(rename = "numCandidates", default)]
    pub num_candidates: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateRequest {
    #[serde(rename = "imageId", default)]
    pub image_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateBatchResponse {
    pub candidates: Vec<String>,
    pub count: usize,
    pub inference_time_seconds: f64,
    pub model: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub roast: String,
    pub inference_time_seconds: f64,
    pub model: String,
}

pub fn router(state: SharedState) -> Router {
    let body_limit = state.max_upload_bytes;
    Router::new()
        .route("/health", get(health))
        .route("/upload", post(upload))
        .route("/generate-batch", post(generate_batch))
        .route("/generate", post(generate))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn health(State(state): State<SharedState>) -> Json<Value> {
    let cached = state.images.len().await;
    Json(json!({
        "status": "ok",
        "model": state.backend.model(),
        "cached_images": cached,
    }))
}

fn decode_image(encoded: &str) -> Result<Bytes, ApiError> {
    // tolerate data URLs as well as bare base64
    let payload = match encoded.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => encoded,
    };
    let bytes = general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, format!("Invalid imageBase64: {e}")))?;
    if bytes.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Empty image"));
    }
    Ok(Bytes::from(bytes))
}

pub async fn upload(
    State(state): State<SharedState>,
    ApiJson(req): ApiJson<UploadRequest>,
) -> Result<Json<UploadResponse>, ApiError> {
    let encoded = req
        .image_base64
        .filter(|s| !s.is_empty())
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "Missing imageBase64"))?;
    let image = decode_image(&encoded)?;

    let image_id = Uuid::new_v4().to_string();
    let size = image.len();
    state.images.insert(image_id.clone(), image).await;
    let cached = state.images.len().await;
    info!(image_id = %image_id, bytes = size, cached, "image uploaded");

    Ok(Json(UploadResponse { image_id }))
}

/// Run the backend `n` times against a cached image.
async fn run_generation(state: &SharedState, image_id: Option<String>, n: usize) -> Result<(Vec<String>, f64), ApiError> {
    let image_id = image_id
        .filter(|s| !s.is_empty())
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "Missing imageId"))?;
    if n == 0 || n > state.max_candidates {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            format!("numCandidates must be between 1 and {}", state.max_candidates),
        ));
    }

    let image = state
        .images
        .get(&image_id)
        .await
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("Image ID {image_id} not found in cache")))?;

    let started = Instant::now();
    let mut candidates = Vec::with_capacity(n);
    for i in 0..n {
        let roast = state.backend.roast(&image, &state.params).await.map_err(|e| {
            error!(image_id = %image_id, candidate = i + 1, error = %e, "generation failed");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, format!("Generation failed: {e}"))
        })?;
        candidates.push(roast);
    }
    let secs = (started.elapsed().as_secs_f64() * 100.0).round() / 100.0;
    info!(image_id = %image_id, count = candidates.len(), secs, "generated");
    Ok((candidates, secs))
}

pub async fn generate_batch(
    State(state): State<SharedState>,
    ApiJson(req): ApiJson<GenerateBatchRequest>,
) -> Result<Json<GenerateBatchResponse>, ApiError> {
    let n = req.num_candidates.unwrap_or(3);
    let (candidates, secs) = run_generation(&state, req.image_id, n).await?;
    Ok(Json(GenerateBatchResponse {
        count: candidates.len(),
        candidates,
        inference_time_seconds: secs,
        model: state.backend.model().to_string(),
    }))
}

/// Single-roast form of `/generate-batch`.
pub async fn generate(
    State(state): State<SharedState>,
    ApiJson(req): ApiJson<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let (mut candidates, secs) = run_generation(&state, req.image_id, 1).await?;
    let roast = candidates
        .pop()
        .ok_or_else(|| api_error(StatusCode::INTERNAL_SERVER_ERROR, "Generation failed: no output"))?;
    Ok(Json(GenerateResponse {
        roast,
        inference_time_seconds: secs,
        model: state.backend.model().to_string(),
    }))
}
