//! Web server module for the waves service.
//!
//! Provides the JSON API over the wave service plus liveness/readiness probes.

use axum::{
    Json, Router,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};
use uuid::Uuid;

use crate::service::{ServiceError, WaveService};
use crate::storage::{SqlitePool, StorageHandles, Wave, WaveStore};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub wave_service: WaveService<WaveStore>,
    pub pool: SqlitePool,
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    db: Option<String>,
}

/// Body of `GET /api/wave`.
#[derive(Debug, Serialize)]
pub struct WaveList {
    pub items: Vec<Wave>,
}

/// Error body returned for every failed request.
#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
}

/// HTTP-facing error, mapped onto status codes.
#[derive(Debug)]
pub struct ApiError(ServiceError);

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(ServiceError::InvalidArgument(rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self(ServiceError::InvalidArgument(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ServiceError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = match &self.0 {
            ServiceError::Storage(err) => {
                tracing::error!(error = %err, "Storage failure");
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ErrorBody { message })).into_response()
    }
}

/// Create the Axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    let app_state = Arc::new(state);

    Router::new()
        .route("/healthz", get(healthz_handler))
        .route("/readyz", get(readyz_handler))
        .route("/api/wave", get(list_waves_handler).post(create_wave_handler))
        .route(
            "/api/wave/{id}",
            get(get_wave_handler).put(update_wave_handler),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

/// Serve the API on `listener` until `shutdown` resolves.
///
/// In-flight requests are drained before the storage pool is closed, so
/// `shutdown` must only wait for the stop signal.
pub async fn serve<F>(
    listener: TcpListener,
    handles: StorageHandles,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(AppState {
        wave_service: WaveService::new(handles.wave_store.clone()),
        pool: handles.pool.clone(),
    });

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await;

    tracing::info!("Shutting down storage...");
    if let Err(e) = handles.shutdown().await {
        tracing::error!("Failed to shutdown storage: {}", e);
    }

    result
}

/// Liveness probe.
async fn healthz_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        db: None,
    })
}

/// Readiness probe that checks SQLite availability.
async fn readyz_handler(State(state): State<Arc<AppState>>) -> Response {
    if state.pool.is_closed() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "not_ready".to_string(),
                db: Some("closed".to_string()),
            }),
        )
            .into_response();
    }

    match state.pool.ping().await {
        Ok(()) => Json(HealthResponse {
            status: "ok".to_string(),
            db: Some("ready".to_string()),
        })
        .into_response(),
        Err(err) => {
            tracing::error!(error = %err, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "not_ready".to_string(),
                    db: Some(err.to_string()),
                }),
            )
                .into_response()
        }
    }
}

/// `GET /api/wave`
async fn list_waves_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<WaveList>, ApiError> {
    let items = state.wave_service.list_all().await?;
    Ok(Json(WaveList { items }))
}

/// `GET /api/wave/{id}`
async fn get_wave_handler(
    State(state): State<Arc<AppState>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Wave>, ApiError> {
    let Path(id) = id?;
    state
        .wave_service
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or(ApiError(ServiceError::NotFound(id)))
}

/// `POST /api/wave`
async fn create_wave_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Wave>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(wave) = payload?;
    let created = state.wave_service.create(wave).await?;
    let location = format!("/api/wave/{}", created.id);

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(created),
    )
        .into_response())
}

/// `PUT /api/wave/{id}`
async fn update_wave_handler(
    State(state): State<Arc<AppState>>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<Wave>, JsonRejection>,
) -> Result<Json<Wave>, ApiError> {
    let Path(id) = id?;
    let Json(wave) = payload?;
    let updated = state.wave_service.update(id, wave).await?;
    Ok(Json(updated))
}
