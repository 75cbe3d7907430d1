use std::time::Instant;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::constants::{M3SCORE_STATUS_HEADER, M3SCORE_STATUS_SUCCEEDED};
use crate::embedding::M3Encoder;
use crate::gateway::error::GatewayError;
use crate::gateway::payload::{PredictionMetrics, PredictionRequest, PredictionResponse};
use crate::gateway::state::HandlerState;
use crate::scoring::ScoreRequest;

#[instrument(
    skip(state, payload),
    fields(prediction_id = tracing::field::Empty, embedding_type = tracing::field::Empty)
)]
pub async fn predict_handler<E>(
    State(state): State<HandlerState<E>>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Response, GatewayError>
where
    E: M3Encoder + ?Sized + 'static,
{
    let Json(body) = payload.map_err(|e| GatewayError::InvalidRequest(e.body_text()))?;
    let request: PredictionRequest = serde_json::from_value(body)
        .map_err(|e| GatewayError::InvalidRequest(format!("Invalid request schema: {}", e)))?;

    let created_at = Utc::now();
    let id = request
        .id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().simple().to_string());

    let span = tracing::Span::current();
    span.record("prediction_id", tracing::field::display(&id));

    let input = request.input;
    let score_request = ScoreRequest::new(
        input.sentences_1.as_deref(),
        input.sentences_2.as_deref(),
        input.embedding_type.as_deref(),
        input.max_length,
    )?;
    span.record(
        "embedding_type",
        tracing::field::display(score_request.mode.embedding_type()),
    );

    debug!(
        sentences_1 = score_request.sentences_1.len(),
        sentences_2 = score_request.sentences_2.len(),
        "Scoring request accepted"
    );

    let scorer = state.scorer.clone();
    let started = Instant::now();
    let report = tokio::task::spawn_blocking(move || scorer.score(&score_request))
        .await
        .map_err(|e| GatewayError::InternalError(format!("Prediction task failed: {}", e)))??;
    let predict_time = started.elapsed().as_secs_f64();

    info!(predict_time, "Prediction succeeded");

    let response = PredictionResponse {
        id,
        status: M3SCORE_STATUS_SUCCEEDED.to_string(),
        output: report.to_string(),
        created_at,
        completed_at: Utc::now(),
        metrics: PredictionMetrics { predict_time },
    };

    let mut headers = HeaderMap::new();
    headers.insert(
        M3SCORE_STATUS_HEADER,
        HeaderValue::from_static(M3SCORE_STATUS_SUCCEEDED),
    );

    Ok((StatusCode::OK, headers, Json(response)).into_response())
}
