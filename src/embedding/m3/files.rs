//! Locating BGE-M3 model files, locally or through the Hugging Face hub.

use std::path::{Path, PathBuf};

use hf_hub::api::sync::{ApiBuilder, ApiRepo};
use hf_hub::{Repo, RepoType};
use tracing::{debug, info};

use super::config::M3Config;
use crate::embedding::error::EmbeddingError;

const CONFIG_FILE: &str = "config.json";
const TOKENIZER_FILE: &str = "tokenizer.json";
const SAFETENSORS_FILE: &str = "model.safetensors";
const PTH_FILE: &str = "pytorch_model.bin";
const COLBERT_HEAD_FILE: &str = "colbert_linear.pt";
const SPARSE_HEAD_FILE: &str = "sparse_linear.pt";

/// Paths of every file the encoder needs.
#[derive(Debug, Clone)]
pub struct ModelFiles {
    pub dir: PathBuf,
    pub config: PathBuf,
    pub tokenizer: PathBuf,
    /// `model.safetensors` when present, otherwise `pytorch_model.bin`.
    pub weights: PathBuf,
    pub colbert_head: PathBuf,
    pub sparse_head: PathBuf,
}

impl ModelFiles {
    /// Resolves files from the configured directory, or downloads them.
    pub fn resolve(config: &M3Config) -> Result<Self, EmbeddingError> {
        match &config.model_dir {
            Some(dir) => Self::from_dir(dir),
            None => Self::download(config),
        }
    }

    /// Resolves files inside a local model directory.
    pub fn from_dir(dir: &Path) -> Result<Self, EmbeddingError> {
        if !dir.is_dir() {
            return Err(EmbeddingError::ModelNotFound {
                path: dir.to_path_buf(),
            });
        }

        let require = |file: &'static str| {
            let path = dir.join(file);
            if path.is_file() {
                Ok(path)
            } else {
                Err(EmbeddingError::MissingModelFile {
                    dir: dir.to_path_buf(),
                    file,
                })
            }
        };

        let weights = require(SAFETENSORS_FILE).or_else(|_| require(PTH_FILE))?;

        Ok(Self {
            dir: dir.to_path_buf(),
            config: require(CONFIG_FILE)?,
            tokenizer: require(TOKENIZER_FILE)?,
            weights,
            colbert_head: require(COLBERT_HEAD_FILE)?,
            sparse_head: require(SPARSE_HEAD_FILE)?,
        })
    }

    fn download(config: &M3Config) -> Result<Self, EmbeddingError> {
        let mut builder = ApiBuilder::new().with_progress(config.download_progress);
        if let Some(cache_dir) = &config.cache_dir {
            std::fs::create_dir_all(cache_dir)?;
            builder = builder.with_cache_dir(cache_dir.clone());
        }

        let api = builder.build().map_err(|e| EmbeddingError::ModelLoadFailed {
            reason: format!("failed to initialize hf_hub API: {}", e),
        })?;
        let repo = api.repo(Repo::new(config.model_id.clone(), RepoType::Model));

        info!(model_id = %config.model_id, "Fetching model files from the hub");

        let fetch = |file: &str| {
            let path = repo
                .get(file)
                .map_err(|e| EmbeddingError::DownloadFailed {
                    repo: config.model_id.clone(),
                    file: file.to_string(),
                    reason: e.to_string(),
                })?;
            debug!(file, path = %path.display(), "Model file ready");
            Ok::<_, EmbeddingError>(path)
        };

        let config_path = fetch(CONFIG_FILE)?;
        let weights = Self::fetch_weights(&repo, &fetch)?;

        let dir = config_path
            .parent()
            .ok_or_else(|| EmbeddingError::ModelLoadFailed {
                reason: "hub returned a path without a parent directory".to_string(),
            })?
            .to_path_buf();

        Ok(Self {
            dir,
            config: config_path,
            tokenizer: fetch(TOKENIZER_FILE)?,
            weights,
            colbert_head: fetch(COLBERT_HEAD_FILE)?,
            sparse_head: fetch(SPARSE_HEAD_FILE)?,
        })
    }

    fn fetch_weights(
        repo: &ApiRepo,
        fetch: &impl Fn(&str) -> Result<PathBuf, EmbeddingError>,
    ) -> Result<PathBuf, EmbeddingError> {
        match repo.get(SAFETENSORS_FILE) {
            Ok(path) => Ok(path),
            Err(e) => {
                debug!(error = %e, "No safetensors weights, falling back to {}", PTH_FILE);
                fetch(PTH_FILE)
            }
        }
    }

    /// `true` when the encoder weights are in safetensors format.
    pub fn weights_are_safetensors(&self) -> bool {
        self.weights
            .extension()
            .is_some_and(|ext| ext == "safetensors")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, file: &str) {
        std::fs::write(dir.join(file), b"{}").expect("write fixture file");
    }

    fn full_dir(weights: &str) -> TempDir {
        let dir = TempDir::new().expect("temp dir");
        for file in [
            CONFIG_FILE,
            TOKENIZER_FILE,
            weights,
            COLBERT_HEAD_FILE,
            SPARSE_HEAD_FILE,
        ] {
            touch(dir.path(), file);
        }
        dir
    }

    #[test]
    fn test_from_dir_prefers_safetensors() {
        let dir = full_dir(SAFETENSORS_FILE);
        touch(dir.path(), PTH_FILE);
        let files = ModelFiles::from_dir(dir.path()).expect("resolves");
        assert!(files.weights_are_safetensors());
        assert_eq!(files.tokenizer, dir.path().join(TOKENIZER_FILE));
    }

    #[test]
    fn test_from_dir_falls_back_to_pth() {
        let dir = full_dir(PTH_FILE);
        let files = ModelFiles::from_dir(dir.path()).expect("resolves");
        assert!(!files.weights_are_safetensors());
        assert_eq!(files.weights, dir.path().join(PTH_FILE));
    }

    #[test]
    fn test_from_dir_reports_missing_head() {
        let dir = TempDir::new().expect("temp dir");
        for file in [CONFIG_FILE, TOKENIZER_FILE, PTH_FILE, COLBERT_HEAD_FILE] {
            touch(dir.path(), file);
        }
        let err = ModelFiles::from_dir(dir.path()).unwrap_err();
        assert!(matches!(
            err,
            EmbeddingError::MissingModelFile {
                file: SPARSE_HEAD_FILE,
                ..
            }
        ));
    }

    #[test]
    fn test_from_dir_missing_directory() {
        let err = ModelFiles::from_dir(Path::new("/nonexistent/bge-m3")).unwrap_err();
        assert!(matches!(err, EmbeddingError::ModelNotFound { .. }));
    }
}
