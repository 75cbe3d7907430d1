use std::sync::Arc;

use tracing::{debug, info};

use crate::constants::DENSE_BATCH_SIZE;
use crate::embedding::similarity::dot_matrix;
use crate::embedding::{EmbeddingError, EncodeRequest, M3Encoder};

use super::error::ScoringError;
use super::types::{ScoreMatrix, ScoreMode, ScoreReport, ScoreRequest, SentenceBlock};

/// Scores two sentence blocks against each other with a shared encoder.
pub struct Scorer<E: ?Sized> {
    encoder: Arc<E>,
}

impl<E: ?Sized> Clone for Scorer<E> {
    fn clone(&self) -> Self {
        Self {
            encoder: Arc::clone(&self.encoder),
        }
    }
}

impl<E: M3Encoder + ?Sized> std::fmt::Debug for Scorer<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scorer")
            .field("model_id", &self.encoder.model_id())
            .field("is_stub", &self.encoder.is_stub())
            .finish()
    }
}

impl<E: M3Encoder + ?Sized> Scorer<E> {
    pub fn new(encoder: Arc<E>) -> Self {
        Self { encoder }
    }

    pub fn encoder(&self) -> &Arc<E> {
        &self.encoder
    }

    /// Validates raw inputs, scores them, and renders the report.
    pub fn predict(
        &self,
        sentences_1: &str,
        sentences_2: &str,
        embedding_type: Option<&str>,
        max_length: Option<i64>,
    ) -> Result<String, ScoringError> {
        let request = ScoreRequest::new(
            Some(sentences_1),
            Some(sentences_2),
            embedding_type,
            max_length,
        )?;
        Ok(self.score(&request)?.to_string())
    }

    pub fn score(&self, request: &ScoreRequest) -> Result<ScoreReport, ScoringError> {
        let required = request.mode.min_first_block_len();
        if request.sentences_1.len() < required {
            return Err(ScoringError::InsufficientInput {
                mode: request.mode.embedding_type(),
                required,
                actual: request.sentences_1.len(),
            });
        }

        info!(sentences = ?request.sentences_1.as_slice(), "sentences_1");
        info!(sentences = ?request.sentences_2.as_slice(), "sentences_2");

        match request.mode {
            ScoreMode::Dense { max_length } => {
                self.score_dense(&request.sentences_1, &request.sentences_2, max_length)
            }
            ScoreMode::Sparse => self.score_sparse(&request.sentences_1, &request.sentences_2),
            ScoreMode::Colbert => self.score_colbert(&request.sentences_1, &request.sentences_2),
        }
    }

    fn score_dense(
        &self,
        first: &SentenceBlock,
        second: &SentenceBlock,
        max_length: usize,
    ) -> Result<ScoreReport, ScoringError> {
        // Only the first block receives the caller's max_length.
        let left = self
            .encoder
            .encode(first.as_slice(), &EncodeRequest::dense(DENSE_BATCH_SIZE, max_length))?;
        let right = self
            .encoder
            .encode(second.as_slice(), &EncodeRequest::default())?;

        let left = rows("dense_vecs", left.dense_vecs, first.len())?;
        let right = rows("dense_vecs", right.dense_vecs, second.len())?;

        debug!(rows = left.len(), cols = right.len(), "dense similarity");
        let values = dot_matrix(&left, &right);
        let matrix = ScoreMatrix::new(left.len(), right.len(), values).ok_or(
            EmbeddingError::InferenceFailed {
                reason: "dense similarity shape mismatch".to_string(),
            },
        )?;
        Ok(ScoreReport::Matrix(matrix))
    }

    fn score_sparse(
        &self,
        first: &SentenceBlock,
        second: &SentenceBlock,
    ) -> Result<ScoreReport, ScoringError> {
        let request = EncodeRequest::sparse();
        let left = self.encoder.encode(first.as_slice(), &request)?;
        let right = self.encoder.encode(second.as_slice(), &request)?;

        let left = rows("lexical_weights", left.lexical_weights, first.len())?;
        let right = rows("lexical_weights", right.lexical_weights, second.len())?;

        let tokens = self.encoder.convert_id_to_token(&left)?;
        info!(tokens = ?tokens, "sentences_1 lexical tokens");

        Ok(ScoreReport::Pair {
            cross: self
                .encoder
                .compute_lexical_matching_score(&left[0], &right[0]),
            within: self
                .encoder
                .compute_lexical_matching_score(&left[0], &left[1]),
        })
    }

    fn score_colbert(
        &self,
        first: &SentenceBlock,
        second: &SentenceBlock,
    ) -> Result<ScoreReport, ScoringError> {
        let request = EncodeRequest::colbert();
        let left = self.encoder.encode(first.as_slice(), &request)?;
        let right = self.encoder.encode(second.as_slice(), &request)?;

        let left = rows("colbert_vecs", left.colbert_vecs, first.len())?;
        let right = rows("colbert_vecs", right.colbert_vecs, second.len())?;

        Ok(ScoreReport::Pair {
            cross: self.encoder.colbert_score(&left[0], &right[0]),
            within: self.encoder.colbert_score(&left[0], &left[1]),
        })
    }
}

/// Unwraps a requested output field and checks it has one row per sentence.
fn rows<T>(field: &'static str, output: Option<Vec<T>>, expected: usize) -> Result<Vec<T>, EmbeddingError> {
    let rows = output.ok_or(EmbeddingError::MissingOutput { field })?;
    if rows.len() != expected {
        return Err(EmbeddingError::OutputCountMismatch {
            field,
            expected,
            actual: rows.len(),
        });
    }
    Ok(rows)
}
