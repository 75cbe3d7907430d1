use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::constants::M3SCORE_STATUS_HEADER;
use crate::scoring::ScoringError;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Scoring(#[from] ScoringError),

    #[error("internal error: {0}")]
    InternalError(String),
}

#[derive(serde::Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl GatewayError {
    /// HTTP status and the short code carried in the status header.
    pub fn status(&self) -> (StatusCode, &'static str) {
        match self {
            GatewayError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            GatewayError::Scoring(ScoringError::Validation { .. }) => {
                (StatusCode::BAD_REQUEST, "invalid_request")
            }
            GatewayError::Scoring(ScoringError::InsufficientInput { .. }) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "insufficient_input")
            }
            GatewayError::Scoring(ScoringError::Embedding(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "embedding_error")
            }
            GatewayError::InternalError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, m3score_status) = self.status();

        if status.is_server_error() {
            tracing::error!(error = %self, "prediction failed");
        } else {
            tracing::debug!(error = %self, "prediction rejected");
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            M3SCORE_STATUS_HEADER,
            HeaderValue::from_static(m3score_status),
        );

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: status.as_u16(),
        });

        (status, headers, body).into_response()
    }
}
