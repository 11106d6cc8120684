//! HTTP surface: classification, mock container lookup and the static frontend.

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::services::{ServeDir, ServeFile};

use crate::config::ServerConfig;
use crate::service::{
    ClassificationResult, ClassificationService, ContainerLocator, GeoPoint, MockContainer,
    ServiceError,
};

/// Name of the multipart field carrying the photo
pub const UPLOAD_FIELD: &str = "file";

pub struct AppState {
    pub classifier: ClassificationService,
    pub locator: ContainerLocator,
    pub static_dir: PathBuf,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct NearbyQuery {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct NearbyResponse {
    pub containers: Vec<MockContainer>,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        log::error!("Request failed: {}", self);
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub fn build_router(state: AppState) -> Router {
    let index = ServeFile::new(state.static_dir.join("index.html"));
    let assets = ServeDir::new(&state.static_dir);
    let body_limit = state.max_upload_bytes;

    Router::new()
        .route("/classify", post(classify).layer(DefaultBodyLimit::max(body_limit)))
        .route("/api/nearby-containers", get(nearby_containers))
        .route("/health", get(|| async { Json(json!({ "status": "ok" })) }))
        .route_service("/", index)
        .nest_service("/static", assets)
        .with_state(Arc::new(state))
}

async fn classify(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ClassificationResult>, ServiceError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(upload_error)?
    {
        if field.name() == Some(UPLOAD_FIELD) {
            let bytes = field
                .bytes()
                .await
                .map_err(upload_error)?;
            upload = Some(bytes);
            break;
        }
    }
    let bytes = upload.ok_or_else(|| {
        ServiceError::MissingUpload(format!("multipart field '{}' is required", UPLOAD_FIELD))
    })?;

    // Inference is CPU-bound; keep it off the async workers.
    let service = state.classifier.clone();
    let result = tokio::task::spawn_blocking(move || service.classify(&bytes))
        .await
        .map_err(|e| ServiceError::Internal(e.to_string()))??;

    Ok(Json(result))
}

fn upload_error(err: MultipartError) -> ServiceError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ServiceError::PayloadTooLarge(err.body_text())
    } else {
        ServiceError::MissingUpload(err.body_text())
    }
}

async fn nearby_containers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NearbyQuery>,
) -> Json<NearbyResponse> {
    let center = state.locator.center;
    let origin = GeoPoint::new(query.lat.unwrap_or(center.lat), query.lon.unwrap_or(center.lon));
    let containers = state.locator.nearby(origin, &mut rand::thread_rng());
    Json(NearbyResponse { containers })
}

/// Binds the listener and serves until Ctrl-C.
pub async fn serve(config: &ServerConfig, state: AppState) -> std::io::Result<()> {
    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("Listening on http://{}", addr);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown signal received, stopping server");
}
