//! Cross-cutting, shared constants.
//!
//! The encode defaults mirror the reference BGE-M3 encoder: a block encoded
//! without explicit overrides uses [`DEFAULT_BATCH_SIZE`] and [`DEFAULT_MAX_LENGTH`].

/// Hub repository id of the pretrained model.
pub const DEFAULT_MODEL_ID: &str = "BAAI/bge-m3";

/// Hidden size of BGE-M3 (dense and ColBERT vector width).
pub const BGE_M3_HIDDEN_SIZE: usize = 1024;

/// Default per-sentence token cap.
pub const DEFAULT_MAX_LENGTH: usize = 8192;

/// Default encode batch size.
pub const DEFAULT_BATCH_SIZE: usize = 12;

/// Batch size used for the first block in dense mode.
pub const DENSE_BATCH_SIZE: usize = 12;

/// Number of block-1 sentences needed by the sparse and ColBERT comparisons.
pub const WITHIN_BLOCK_MIN_SENTENCES: usize = 2;

/// Response header carrying a short machine-readable status.
pub const M3SCORE_STATUS_HEADER: &str = "x-m3score-status";
pub const M3SCORE_STATUS_HEALTHY: &str = "healthy";
pub const M3SCORE_STATUS_READY: &str = "ready";
pub const M3SCORE_STATUS_SUCCEEDED: &str = "succeeded";

/// Default HTTP port (the conventional prediction-server port).
pub const DEFAULT_PORT: u16 = 5000;
