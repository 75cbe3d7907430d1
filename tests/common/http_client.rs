//! HTTP client helpers for tests.

use std::time::Duration;

use m3score::gateway::payload::{PredictionInput, PredictionRequest, PredictionResponse};
use serde::{Deserialize, Serialize};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct TestClient {
    client: reqwest::Client,
    base_url: String,
}

impl TestClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Posts a prediction and returns the body plus the status header.
    pub async fn predict(
        &self,
        input: PredictionInput,
    ) -> Result<(PredictionResponse, String), TestClientError> {
        let request = PredictionRequest { id: None, input };
        let resp = self
            .client
            .post(self.url("/predictions"))
            .json(&request)
            .send()
            .await?;

        let status_header = resp
            .headers()
            .get("x-m3score-status")
            .and_then(|h| h.to_str().ok())
            .unwrap_or("unknown")
            .to_string();

        match resp.status().as_u16() {
            200 => Ok((resp.json().await?, status_header)),
            status @ (400 | 422) => Err(TestClientError::Rejected(status, resp.json().await?)),
            status => {
                let body = resp.text().await.unwrap_or_default();
                Err(TestClientError::UnexpectedStatus(status, body))
            }
        }
    }

    pub async fn health(&self) -> Result<HealthResponse, TestClientError> {
        let resp = self.client.get(self.url("/healthz")).send().await?;
        if resp.status().is_success() {
            Ok(resp.json().await?)
        } else {
            let status = resp.status().as_u16();
            Err(TestClientError::UnexpectedStatus(
                status,
                resp.text().await.unwrap_or_default(),
            ))
        }
    }

    pub async fn ready(&self) -> Result<ReadyResponse, TestClientError> {
        let resp = self.client.get(self.url("/ready")).send().await?;
        if resp.status().is_success() {
            Ok(resp.json().await?)
        } else {
            let status = resp.status().as_u16();
            Err(TestClientError::UnexpectedStatus(
                status,
                resp.text().await.unwrap_or_default(),
            ))
        }
    }
}

pub fn input(sentences_1: &str, sentences_2: &str, embedding_type: Option<&str>) -> PredictionInput {
    PredictionInput {
        sentences_1: Some(sentences_1.to_string()),
        sentences_2: Some(sentences_2.to_string()),
        embedding_type: embedding_type.map(str::to_string),
        max_length: None,
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ComponentStatus {
    pub http: String,
    pub embedding: String,
    pub embedder_mode: String,
    pub model: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReadyResponse {
    pub status: String,
    pub components: ComponentStatus,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: u16,
}

#[derive(Debug, thiserror::Error)]
pub enum TestClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Rejected with {0}: {1:?}")]
    Rejected(u16, ErrorBody),
    #[error("Unexpected status {0}: {1}")]
    UnexpectedStatus(u16, String),
}
