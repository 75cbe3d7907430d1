use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("model directory not found: {path}")]
    ModelNotFound { path: PathBuf },

    #[error("model directory {dir} is missing {file}")]
    MissingModelFile { dir: PathBuf, file: &'static str },

    #[error("failed to load BGE-M3 model: {reason}")]
    ModelLoadFailed { reason: String },

    #[error("failed to download {file} from {repo}: {reason}")]
    DownloadFailed {
        repo: String,
        file: String,
        reason: String,
    },

    #[error("embedding inference failed: {reason}")]
    InferenceFailed { reason: String },

    #[error("tokenization failed: {reason}")]
    TokenizationFailed { reason: String },

    #[error("invalid model configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("encoder output is missing {field}")]
    MissingOutput { field: &'static str },

    #[error("encoder returned {actual} {field} rows for {expected} sentences")]
    OutputCountMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
}

impl From<candle_core::Error> for EmbeddingError {
    fn from(err: candle_core::Error) -> Self {
        EmbeddingError::InferenceFailed {
            reason: err.to_string(),
        }
    }
}

impl From<std::io::Error> for EmbeddingError {
    fn from(err: std::io::Error) -> Self {
        EmbeddingError::ModelLoadFailed {
            reason: err.to_string(),
        }
    }
}
