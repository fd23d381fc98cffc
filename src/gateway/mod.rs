//! HTTP gateway (Axum): `POST /search`, `GET /healthz`, `GET /ready`.

pub mod error;
pub mod handler;
pub mod payload;
pub mod state;
pub mod status;

#[cfg(test)]
mod handler_tests;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tracing::warn;

pub use error::GatewayError;
pub use handler::search_handler;
pub use payload::{SearchRequest, SearchResponse};
pub use state::AppState;
pub use status::{
    ETALON_STATUS_ERROR, ETALON_STATUS_HEADER, ETALON_STATUS_HEALTHY, ETALON_STATUS_NOT_READY,
    ETALON_STATUS_READY, SearchStatus,
};

use crate::retrieval::RetrievalBackend;

pub fn create_router_with_state<B>(state: AppState<B>) -> Router
where
    B: RetrievalBackend + Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/healthz", get(health_handler))
        .route("/ready", get(ready_handler))
        .route("/search", post(search_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(serde::Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(serde::Serialize)]
pub struct ReadyResponse {
    pub status: &'static str,
    pub components: ComponentStatus,
}

#[derive(serde::Serialize)]
pub struct ComponentStatus {
    pub http: &'static str,
    pub retrieval: &'static str,
    pub classifiers: usize,
}

#[tracing::instrument]
pub async fn health_handler() -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(
        ETALON_STATUS_HEADER,
        HeaderValue::from_static(ETALON_STATUS_HEALTHY),
    );

    (
        StatusCode::OK,
        headers,
        Json(HealthResponse { status: "ok" }),
    )
        .into_response()
}

#[tracing::instrument(skip(state))]
pub async fn ready_handler<B>(State(state): State<AppState<B>>) -> Response
where
    B: RetrievalBackend + Clone + Send + Sync + 'static,
{
    let retrieval = match state.backend.health_check().await {
        Ok(()) => ETALON_STATUS_READY,
        Err(e) => {
            warn!(error = %e, "Retrieval backend is not reachable");
            ETALON_STATUS_ERROR
        }
    };

    let components = ComponentStatus {
        http: ETALON_STATUS_READY,
        retrieval,
        classifiers: state.orchestrator.classifier_names().count(),
    };

    let is_ready = components.retrieval == ETALON_STATUS_READY;
    let (status_code, status_msg) = if is_ready {
        (StatusCode::OK, ETALON_STATUS_READY)
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, ETALON_STATUS_NOT_READY)
    };

    let mut headers = HeaderMap::new();
    headers.insert(ETALON_STATUS_HEADER, HeaderValue::from_static(status_msg));

    (
        status_code,
        headers,
        Json(ReadyResponse {
            status: status_msg,
            components,
        }),
    )
        .into_response()
}
