//! BGE-M3 encoder (candle XLM-RoBERTa + ColBERT/sparse heads).
//!
//! Use [`M3Config::stub`] for tests/examples without model files.

/// Encoder configuration.
pub mod config;
/// Model file resolution (local directory or hub download).
pub mod files;
pub(crate) mod model;


pub use config::M3Config;

use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};

use candle_core::{Device, Tensor};
use half::f16;
use parking_lot::{Mutex, RwLock};
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

use crate::constants::BGE_M3_HIDDEN_SIZE;
use crate::embedding::M3Encoder;
use crate::embedding::device::{ComputeTarget, select_device};
use crate::embedding::error::EmbeddingError;
use crate::embedding::similarity::normalize_l2;
use crate::embedding::types::{EncodeRequest, LexicalWeights, M3Output, TokenVectors};
use crate::embedding::utils::{SpecialTokens, load_tokenizer, truncate_ids};

use files::ModelFiles;
use model::BgeM3Model;

/// Vocabulary size used to fold stub token hashes into ids.
const STUB_VOCAB_SIZE: u64 = 250_002;

/// Positional limit applied by the stub (mirrors the real model).
const STUB_MAX_POSITIONS: usize = 8192;

enum EncoderBackend {
    Model {
        model: Mutex<BgeM3Model>,
        tokenizer: Tokenizer,
        specials: SpecialTokens,
        target: ComputeTarget,
    },
    Stub {
        vocab: RwLock<HashMap<u32, String>>,
    },
}

/// Requested heads for one forward chunk, indexed by position in the chunk.
#[derive(Default)]
struct ChunkOutput {
    dense: Vec<Vec<f32>>,
    sparse: Vec<LexicalWeights>,
    colbert: Vec<TokenVectors>,
}

/// BGE-M3 encoder producing dense, lexical and token-level representations.
pub struct BgeM3Embedder {
    backend: EncoderBackend,
    config: M3Config,
    label: String,
}

impl std::fmt::Debug for BgeM3Embedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BgeM3Embedder")
            .field(
                "backend",
                &match &self.backend {
                    EncoderBackend::Model { target, .. } => {
                        format!("Model({:?}, {:?})", target.device, target.dtype)
                    }
                    EncoderBackend::Stub { .. } => "Stub".to_string(),
                },
            )
            .field("model", &self.label)
            .field("use_fp16", &self.config.use_fp16)
            .finish()
    }
}

impl BgeM3Embedder {
    /// Loads the encoder from a config (stub mode is supported).
    ///
    /// This may download several gigabytes on first use.
    pub fn load(config: M3Config) -> Result<Self, EmbeddingError> {
        config.validate()?;

        if config.testing_stub {
            warn!("BGE-M3 encoder running in STUB mode (testing only)");
            return Ok(Self::stub_with(config));
        }

        let target = ComputeTarget::for_device(select_device(), config.use_fp16);
        debug!(device = ?target.device, dtype = ?target.dtype, "Selected compute target");

        let files = ModelFiles::resolve(&config)?;
        let tokenizer = load_tokenizer(&files.dir)?;
        let specials = SpecialTokens::from_tokenizer(&tokenizer);

        let model = BgeM3Model::load(&files, target.dtype, &target.device).map_err(|e| {
            EmbeddingError::ModelLoadFailed {
                reason: format!("Failed to load BGE-M3 weights: {}", e),
            }
        })?;

        info!(
            model = %config.display_name(),
            hidden_size = model.config().hidden_size,
            num_layers = model.config().num_hidden_layers,
            max_positions = model.max_positions(),
            dtype = ?target.dtype,
            "BGE-M3 model loaded"
        );

        Ok(Self {
            backend: EncoderBackend::Model {
                model: Mutex::new(model),
                tokenizer,
                specials,
                target,
            },
            label: config.display_name(),
            config,
        })
    }

    /// Deterministic encoder with no model files.
    pub fn stub() -> Self {
        Self::stub_with(M3Config::stub())
    }

    fn stub_with(config: M3Config) -> Self {
        Self {
            backend: EncoderBackend::Stub {
                vocab: RwLock::new(HashMap::new()),
            },
            label: format!("{} (stub)", config.model_id),
            config,
        }
    }

    #[cfg(test)]
    fn from_model(model: BgeM3Model, tokenizer: Tokenizer, target: ComputeTarget) -> Self {
        let config = M3Config::default();
        Self {
            backend: EncoderBackend::Model {
                model: Mutex::new(model),
                specials: SpecialTokens::from_tokenizer(&tokenizer),
                tokenizer,
                target,
            },
            label: config.display_name(),
            config,
        }
    }

    /// Returns the encoder configuration.
    pub fn config(&self) -> &M3Config {
        &self.config
    }

    /// Returns `true` if a model is loaded.
    pub fn has_model(&self) -> bool {
        matches!(self.backend, EncoderBackend::Model { .. })
    }

    fn encode_with_model(
        &self,
        sentences: &[String],
        request: &EncodeRequest,
        model: &Mutex<BgeM3Model>,
        tokenizer: &Tokenizer,
        specials: &SpecialTokens,
        target: &ComputeTarget,
    ) -> Result<M3Output, EmbeddingError> {
        let model = model.lock();
        let cap = request.max_length.min(model.max_positions());

        let encodings = tokenizer
            .encode_batch(sentences.iter().map(String::as_str).collect::<Vec<_>>(), true)
            .map_err(|e| EmbeddingError::TokenizationFailed {
                reason: e.to_string(),
            })?;

        let tokenized: Vec<Vec<u32>> = encodings
            .iter()
            .map(|encoding| {
                let mut ids = encoding.get_ids().to_vec();
                truncate_ids(&mut ids, cap, specials.eos);
                ids
            })
            .collect();

        // Longest first so each chunk pads as little as possible.
        let mut order: Vec<usize> = (0..tokenized.len()).collect();
        order.sort_by(|&a, &b| tokenized[b].len().cmp(&tokenized[a].len()));

        let mut dense = vec![Vec::new(); sentences.len()];
        let mut sparse = vec![LexicalWeights::new(); sentences.len()];
        let mut colbert = vec![TokenVectors::new(); sentences.len()];

        for chunk in order.chunks(request.batch_size.max(1)) {
            let batch: Vec<&[u32]> = chunk.iter().map(|&i| tokenized[i].as_slice()).collect();
            let mut out = Self::forward_chunk(&model, &batch, request, specials, &target.device)?;

            for (pos, &index) in chunk.iter().enumerate() {
                if request.return_dense {
                    dense[index] = std::mem::take(&mut out.dense[pos]);
                }
                if request.return_sparse {
                    sparse[index] = std::mem::take(&mut out.sparse[pos]);
                }
                if request.return_colbert_vecs {
                    colbert[index] = std::mem::take(&mut out.colbert[pos]);
                }
            }
        }

        if target.round_outputs_to_f16 {
            round_through_f16(&mut dense, &mut sparse, &mut colbert);
        }

        Ok(M3Output {
            dense_vecs: request.return_dense.then_some(dense),
            lexical_weights: request.return_sparse.then_some(sparse),
            colbert_vecs: request.return_colbert_vecs.then_some(colbert),
        })
    }

    fn forward_chunk(
        model: &BgeM3Model,
        batch: &[&[u32]],
        request: &EncodeRequest,
        specials: &SpecialTokens,
        device: &Device,
    ) -> Result<ChunkOutput, EmbeddingError> {
        let batch_size = batch.len();
        let max_len = batch.iter().map(|ids| ids.len()).max().unwrap_or(0);

        let mut all_ids = Vec::with_capacity(batch_size * max_len);
        let mut all_mask = Vec::with_capacity(batch_size * max_len);
        for ids in batch {
            all_ids.extend_from_slice(ids);
            all_ids.extend(std::iter::repeat_n(specials.pad, max_len - ids.len()));
            all_mask.extend(std::iter::repeat_n(1u32, ids.len()));
            all_mask.extend(std::iter::repeat_n(0u32, max_len - ids.len()));
        }

        let input_ids = Tensor::from_vec(all_ids, (batch_size, max_len), device)?;
        let attention_mask = Tensor::from_vec(all_mask, (batch_size, max_len), device)?;

        debug!(batch_size, max_len, "BGE-M3 forward pass");

        let hidden = model.last_hidden_state(&input_ids, &attention_mask)?;
        let mut out = ChunkOutput::default();

        if request.return_dense {
            out.dense = model.dense(&hidden)?.to_vec2::<f32>()?;
            for v in &mut out.dense {
                normalize_l2(v);
            }
        }

        if request.return_sparse {
            let weights = model.sparse(&hidden)?.to_vec2::<f32>()?;
            out.sparse = batch
                .iter()
                .zip(weights.iter())
                .map(|(ids, w)| lexical_weights(ids, w, specials))
                .collect();
        }

        if request.return_colbert_vecs {
            let vecs = model.colbert(&hidden)?.to_vec3::<f32>()?;
            out.colbert = batch
                .iter()
                .zip(vecs)
                .map(|(ids, mut rows)| {
                    // CLS was dropped by the head; keep the remaining real tokens.
                    rows.truncate(ids.len().saturating_sub(1));
                    for row in &mut rows {
                        normalize_l2(row);
                    }
                    rows
                })
                .collect();
        }

        Ok(out)
    }

    fn encode_stub(
        &self,
        sentences: &[String],
        request: &EncodeRequest,
        vocab: &RwLock<HashMap<u32, String>>,
    ) -> M3Output {
        debug!(count = sentences.len(), "Generating stub encodings");

        let token_cap = request.max_length.min(STUB_MAX_POSITIONS).saturating_sub(2);
        let tokenized: Vec<Vec<(u32, String)>> = sentences
            .iter()
            .map(|s| {
                let mut tokens = stub_tokens(s);
                tokens.truncate(token_cap);
                tokens
            })
            .collect();

        {
            let mut vocab = vocab.write();
            for (id, token) in tokenized.iter().flatten() {
                vocab.entry(*id).or_insert_with(|| token.clone());
            }
        }

        let dense = request.return_dense.then(|| {
            sentences
                .iter()
                .map(|s| stub_vector(hash_str(s), BGE_M3_HIDDEN_SIZE))
                .collect()
        });

        let lexical = request.return_sparse.then(|| {
            tokenized
                .iter()
                .map(|tokens| {
                    let mut weights = LexicalWeights::new();
                    for (id, token) in tokens {
                        let w = stub_weight(hash_str(token));
                        let entry = weights.entry(*id).or_insert(w);
                        *entry = entry.max(w);
                    }
                    weights
                })
                .collect()
        });

        let colbert = request.return_colbert_vecs.then(|| {
            tokenized
                .iter()
                .map(|tokens| {
                    tokens
                        .iter()
                        .map(|(_, token)| stub_vector(hash_str(token), BGE_M3_HIDDEN_SIZE))
                        .collect()
                })
                .collect()
        });

        M3Output {
            dense_vecs: dense,
            lexical_weights: lexical,
            colbert_vecs: colbert,
        }
    }
}

impl M3Encoder for BgeM3Embedder {
    fn encode(
        &self,
        sentences: &[String],
        request: &EncodeRequest,
    ) -> Result<M3Output, EmbeddingError> {
        if sentences.is_empty() {
            return Ok(M3Output {
                dense_vecs: request.return_dense.then(Vec::new),
                lexical_weights: request.return_sparse.then(Vec::new),
                colbert_vecs: request.return_colbert_vecs.then(Vec::new),
            });
        }

        match &self.backend {
            EncoderBackend::Model {
                model,
                tokenizer,
                specials,
                target,
            } => self.encode_with_model(sentences, request, model, tokenizer, specials, target),
            EncoderBackend::Stub { vocab } => Ok(self.encode_stub(sentences, request, vocab)),
        }
    }

    fn convert_id_to_token(
        &self,
        weights: &[LexicalWeights],
    ) -> Result<Vec<Vec<(String, f32)>>, EmbeddingError> {
        match &self.backend {
            EncoderBackend::Model { tokenizer, .. } => weights
                .iter()
                .map(|sentence| {
                    sentence
                        .iter()
                        .map(|(&id, &w)| {
                            let token = tokenizer.decode(&[id], false).map_err(|e| {
                                EmbeddingError::TokenizationFailed {
                                    reason: format!("failed to decode token {}: {}", id, e),
                                }
                            })?;
                            Ok((token, w))
                        })
                        .collect()
                })
                .collect(),
            EncoderBackend::Stub { vocab } => {
                let vocab = vocab.read();
                Ok(weights
                    .iter()
                    .map(|sentence| {
                        sentence
                            .iter()
                            .map(|(id, &w)| {
                                let token = vocab
                                    .get(id)
                                    .cloned()
                                    .unwrap_or_else(|| format!("<{}>", id));
                                (token, w)
                            })
                            .collect()
                    })
                    .collect())
            }
        }
    }

    fn model_id(&self) -> &str {
        &self.label
    }

    fn is_stub(&self) -> bool {
        matches!(self.backend, EncoderBackend::Stub { .. })
    }
}

/// Reduces per-token weights to one weight per token id (max over repeats).
///
/// Special tokens and non-positive weights never contribute.
pub(crate) fn lexical_weights(ids: &[u32], weights: &[f32], specials: &SpecialTokens) -> LexicalWeights {
    let mut out = LexicalWeights::new();
    for (&id, &w) in ids.iter().zip(weights) {
        if specials.is_special(id) || w <= 0.0 {
            continue;
        }
        let entry = out.entry(id).or_insert(w);
        if w > *entry {
            *entry = w;
        }
    }
    out
}

fn round_through_f16(
    dense: &mut [Vec<f32>],
    sparse: &mut [LexicalWeights],
    colbert: &mut [TokenVectors],
) {
    let round = |x: &mut f32| *x = f16::from_f32(*x).to_f32();
    dense.iter_mut().flatten().for_each(round);
    sparse
        .iter_mut()
        .flat_map(|w| w.values_mut())
        .for_each(round);
    colbert.iter_mut().flatten().flatten().for_each(round);
}

fn hash_str(text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}

/// Lower-cased whitespace tokens with surrounding ASCII punctuation removed.
fn stub_tokens(sentence: &str) -> Vec<(u32, String)> {
    sentence
        .split_whitespace()
        .map(|raw| raw.trim_matches(|c: char| c.is_ascii_punctuation()).to_lowercase())
        .filter(|token| !token.is_empty())
        .map(|token| {
            // Ids 0..=3 are reserved for special tokens.
            let id = 4 + (hash_str(&token) % (STUB_VOCAB_SIZE - 4)) as u32;
            (id, token)
        })
        .collect()
}

fn stub_weight(seed: u64) -> f32 {
    0.05 + ((seed >> 16) % 1000) as f32 / 1000.0 * 0.3
}

fn stub_vector(seed: u64, dim: usize) -> Vec<f32> {
    let mut embedding = Vec::with_capacity(dim);
    let mut state = seed;

    for _ in 0..dim {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
        let value = ((state >> 32) as f32 / u32::MAX as f32) * 2.0 - 1.0;
        embedding.push(value);
    }

    normalize_l2(&mut embedding);
    embedding
}
