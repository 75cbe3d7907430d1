use thiserror::Error;

use super::types::EmbeddingType;
use crate::embedding::EmbeddingError;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("invalid input: {reason}")]
    Validation { reason: String },

    #[error(
        "{mode} scoring compares the first two sentences of sentences_1; need at least {required}, got {actual}"
    )]
    InsufficientInput {
        mode: EmbeddingType,
        required: usize,
        actual: usize,
    },

    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),
}

impl ScoringError {
    pub(crate) fn validation(reason: impl Into<String>) -> Self {
        ScoringError::Validation {
            reason: reason.into(),
        }
    }
}
