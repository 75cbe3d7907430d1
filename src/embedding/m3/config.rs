use std::path::PathBuf;

use crate::constants::DEFAULT_MODEL_ID;
use crate::embedding::error::EmbeddingError;

#[derive(Debug, Clone)]
/// Configuration for [`BgeM3Embedder`](super::BgeM3Embedder).
pub struct M3Config {
    /// Hub repository id, used when `model_dir` is unset.
    pub model_id: String,
    /// Local directory holding the model files (skips the hub).
    pub model_dir: Option<PathBuf>,
    /// Hub cache directory (hub default when unset).
    pub cache_dir: Option<PathBuf>,
    /// Half-precision inference hint.
    pub use_fp16: bool,
    /// Show download progress bars.
    pub download_progress: bool,
    /// If true, run in deterministic stub mode (no model files required).
    pub testing_stub: bool,
}

impl Default for M3Config {
    fn default() -> Self {
        Self {
            model_id: DEFAULT_MODEL_ID.to_string(),
            model_dir: None,
            cache_dir: None,
            use_fp16: true,
            download_progress: false,
            testing_stub: false,
        }
    }
}

impl M3Config {
    /// Config for a hub model id.
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            ..Default::default()
        }
    }

    /// Config for a local model directory.
    pub fn from_dir<P: Into<PathBuf>>(model_dir: P) -> Self {
        Self {
            model_dir: Some(model_dir.into()),
            ..Default::default()
        }
    }

    /// Creates a stub config (no model files; produces deterministic embeddings).
    pub fn stub() -> Self {
        Self {
            testing_stub: true,
            ..Default::default()
        }
    }

    pub fn with_fp16(mut self, use_fp16: bool) -> Self {
        self.use_fp16 = use_fp16;
        self
    }

    pub fn with_cache_dir<P: Into<PathBuf>>(mut self, cache_dir: P) -> Self {
        self.cache_dir = Some(cache_dir.into());
        self
    }

    /// Validates required fields for non-stub mode.
    pub fn validate(&self) -> Result<(), EmbeddingError> {
        if self.testing_stub {
            return Ok(());
        }

        match &self.model_dir {
            Some(dir) if !dir.is_dir() => Err(EmbeddingError::ModelNotFound { path: dir.clone() }),
            Some(_) => Ok(()),
            None if self.model_id.trim().is_empty() => Err(EmbeddingError::InvalidConfig {
                reason: "model_id is required when no model directory is set".to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Name used in logs and readiness output.
    pub fn display_name(&self) -> String {
        match &self.model_dir {
            Some(dir) => dir.display().to_string(),
            None => self.model_id.clone(),
        }
    }
}
