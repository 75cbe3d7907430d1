use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `POST /predictions`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PredictionRequest {
    /// Caller-chosen id; generated when absent.
    #[serde(default)]
    pub id: Option<String>,
    pub input: PredictionInput,
}

/// Raw scoring inputs. Presence and value checks happen in
/// [`ScoreRequest::new`](crate::scoring::ScoreRequest::new).
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct PredictionInput {
    #[serde(default)]
    pub sentences_1: Option<String>,
    #[serde(default)]
    pub sentences_2: Option<String>,
    #[serde(default)]
    pub embedding_type: Option<String>,
    #[serde(default)]
    pub max_length: Option<i64>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PredictionResponse {
    pub id: String,
    pub status: String,
    pub output: String,
    pub created_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub metrics: PredictionMetrics,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct PredictionMetrics {
    /// Seconds spent scoring.
    pub predict_time: f64,
}
