use std::collections::BTreeMap;

use crate::constants::{DEFAULT_BATCH_SIZE, DEFAULT_MAX_LENGTH};

/// Token id -> weight for one sentence (ordered by token id).
pub type LexicalWeights = BTreeMap<u32, f32>;

/// One vector per token for one sentence.
pub type TokenVectors = Vec<Vec<f32>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Which outputs to compute, and how to batch and truncate.
pub struct EncodeRequest {
    /// Sentences per forward pass.
    pub batch_size: usize,
    /// Per-sentence token cap.
    pub max_length: usize,
    pub return_dense: bool,
    pub return_sparse: bool,
    pub return_colbert_vecs: bool,
}

impl Default for EncodeRequest {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_length: DEFAULT_MAX_LENGTH,
            return_dense: true,
            return_sparse: false,
            return_colbert_vecs: false,
        }
    }
}

impl EncodeRequest {
    /// Dense only, with explicit batching and truncation.
    pub fn dense(batch_size: usize, max_length: usize) -> Self {
        Self {
            batch_size,
            max_length,
            ..Default::default()
        }
    }

    /// Dense + lexical weights.
    pub fn sparse() -> Self {
        Self {
            return_sparse: true,
            ..Default::default()
        }
    }

    /// Dense + lexical weights + token vectors.
    pub fn colbert() -> Self {
        Self {
            return_sparse: true,
            return_colbert_vecs: true,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
/// Encoder output for one block; only requested fields are populated.
pub struct M3Output {
    pub dense_vecs: Option<Vec<Vec<f32>>>,
    pub lexical_weights: Option<Vec<LexicalWeights>>,
    pub colbert_vecs: Option<Vec<TokenVectors>>,
}
