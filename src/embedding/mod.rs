//! Embedding + model utilities.
//!
//! - [`M3Encoder`] is the capability the scorer depends on.
//! - [`m3`] provides the candle BGE-M3 encoder (and its deterministic stub mode).
//! - [`similarity`] holds the vector arithmetic every backend shares.

/// Device and precision selection (CPU / Metal / CUDA).
pub mod device;
mod error;
/// BGE-M3 encoder.
pub mod m3;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod similarity;
pub mod types;
/// Tokenizer helpers.
pub mod utils;

use std::sync::Arc;

pub use error::EmbeddingError;
pub use m3::{BgeM3Embedder, M3Config};
#[cfg(any(test, feature = "mock"))]
pub use mock::{EncodeCall, MockEmbedding, MockEncoder};
pub use types::{EncodeRequest, LexicalWeights, M3Output, TokenVectors};

/// A loaded multi-representation embedding model.
///
/// Implementations must be safe to share across request threads; backends that
/// are not safe for concurrent inference serialise internally.
pub trait M3Encoder: Send + Sync {
    /// Encodes `sentences`, populating only the outputs `request` asks for.
    fn encode(
        &self,
        sentences: &[String],
        request: &EncodeRequest,
    ) -> Result<M3Output, EmbeddingError>;

    /// Resolves lexical-weight token ids to display strings (map order preserved).
    fn convert_id_to_token(
        &self,
        weights: &[LexicalWeights],
    ) -> Result<Vec<Vec<(String, f32)>>, EmbeddingError>;

    /// Weighted overlap of two lexical-weight maps.
    fn compute_lexical_matching_score(&self, a: &LexicalWeights, b: &LexicalWeights) -> f32 {
        similarity::lexical_matching_score(a, b)
    }

    /// Late-interaction similarity of two token-vector sequences.
    fn colbert_score(&self, query: &TokenVectors, passage: &TokenVectors) -> f32 {
        similarity::colbert_score(query, passage)
    }

    /// Model identifier, for logs and readiness reporting.
    fn model_id(&self) -> &str;

    /// `true` when no real model weights back this encoder.
    fn is_stub(&self) -> bool {
        false
    }
}

impl<T: M3Encoder + ?Sized> M3Encoder for Arc<T> {
    fn encode(
        &self,
        sentences: &[String],
        request: &EncodeRequest,
    ) -> Result<M3Output, EmbeddingError> {
        (**self).encode(sentences, request)
    }

    fn convert_id_to_token(
        &self,
        weights: &[LexicalWeights],
    ) -> Result<Vec<Vec<(String, f32)>>, EmbeddingError> {
        (**self).convert_id_to_token(weights)
    }

    fn compute_lexical_matching_score(&self, a: &LexicalWeights, b: &LexicalWeights) -> f32 {
        (**self).compute_lexical_matching_score(a, b)
    }

    fn colbert_score(&self, query: &TokenVectors, passage: &TokenVectors) -> f32 {
        (**self).colbert_score(query, passage)
    }

    fn model_id(&self) -> &str {
        (**self).model_id()
    }

    fn is_stub(&self) -> bool {
        (**self).is_stub()
    }
}
