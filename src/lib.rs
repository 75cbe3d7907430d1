//! m3score library crate (used by the server binary and integration tests).
//!
//! Scores two newline-delimited sentence blocks against each other with
//! BGE-M3's dense, lexical (sparse) or multi-vector (ColBERT) representations.
//!
//! ## Core Types
//! - [`Config`], [`ConfigError`] - Server configuration
//! - [`Scorer`], [`ScoreRequest`], [`ScoreReport`] - Block scoring
//!
//! ## Embedding
//! - [`M3Encoder`] - Encoder capability the scorer depends on
//! - [`BgeM3Embedder`], [`M3Config`] - candle BGE-M3 backend (and its stub mode)
//!
//! ## Test/Mock Support
//! [`MockEncoder`] is available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod config;
pub mod constants;
pub mod embedding;
pub mod gateway;
pub mod scoring;

pub use config::{Config, ConfigError};
pub use embedding::{
    BgeM3Embedder, EmbeddingError, EncodeRequest, LexicalWeights, M3Config, M3Encoder, M3Output,
    TokenVectors,
};
#[cfg(any(test, feature = "mock"))]
pub use embedding::{EncodeCall, MockEmbedding, MockEncoder};
pub use gateway::{GatewayError, HandlerState, create_router_with_state};
pub use scoring::{
    EmbeddingType, ScoreMatrix, ScoreMode, ScoreReport, ScoreRequest, Scorer, ScoringError,
    SentenceBlock,
};
