//! HTTP gateway (Axum) exposing the scorer as a prediction endpoint.
//!
//! Used by the `m3score` server binary.

pub mod error;
pub mod handler;
pub mod payload;
pub mod state;


use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

pub use error::GatewayError;
pub use handler::predict_handler;
pub use state::HandlerState;

use crate::constants::{M3SCORE_STATUS_HEADER, M3SCORE_STATUS_HEALTHY, M3SCORE_STATUS_READY};
use crate::embedding::M3Encoder;

pub fn create_router_with_state<E>(state: HandlerState<E>) -> Router
where
    E: M3Encoder + ?Sized + 'static,
{
    Router::new()
        .route("/healthz", get(health_handler))
        .route("/ready", get(ready_handler::<E>))
        .route("/predictions", post(predict_handler::<E>))
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
    pub embedding: &'static str,
    pub embedder_mode: &'static str,
    pub model: String,
}

#[tracing::instrument]
pub async fn health_handler() -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(
        M3SCORE_STATUS_HEADER,
        HeaderValue::from_static(M3SCORE_STATUS_HEALTHY),
    );

    (
        StatusCode::OK,
        headers,
        Json(HealthResponse { status: "ok" }),
    )
        .into_response()
}

/// The encoder is loaded before the router is built, so a served request is
/// always ready; the payload reports which backend answers.
#[tracing::instrument(skip(state))]
pub async fn ready_handler<E>(State(state): State<HandlerState<E>>) -> Response
where
    E: M3Encoder + ?Sized + 'static,
{
    let encoder = state.encoder();
    let embedder_mode = if encoder.is_stub() { "stub" } else { "real" };

    let components = ComponentStatus {
        http: M3SCORE_STATUS_READY,
        embedding: M3SCORE_STATUS_READY,
        embedder_mode,
        model: encoder.model_id().to_string(),
    };

    let mut headers = HeaderMap::new();
    headers.insert(
        M3SCORE_STATUS_HEADER,
        HeaderValue::from_static(M3SCORE_STATUS_READY),
    );

    (
        StatusCode::OK,
        headers,
        Json(ReadyResponse {
            status: "ok",
            components,
        }),
    )
        .into_response()
}
