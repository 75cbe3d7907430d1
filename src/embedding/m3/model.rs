use candle_core::{DType, Device, IndexOp, Result, Tensor};
use candle_nn::{Linear, Module, VarBuilder};
use candle_transformers::models::xlm_roberta::{Config, XLMRobertaModel};

use super::files::ModelFiles;

/// XLM-RoBERTa encoder plus the BGE-M3 ColBERT and sparse projection heads.
pub(crate) struct BgeM3Model {
    encoder: XLMRobertaModel,
    colbert_linear: Linear,
    sparse_linear: Linear,
    config: Config,
}

impl BgeM3Model {
    pub fn load(files: &ModelFiles, dtype: DType, device: &Device) -> Result<Self> {
        let config_content = std::fs::read_to_string(&files.config)?;
        let config: Config = serde_json::from_str(&config_content)
            .map_err(|e| candle_core::Error::Msg(format!("Failed to parse config: {}", e)))?;

        let vb = if files.weights_are_safetensors() {
            unsafe { VarBuilder::from_mmaped_safetensors(&[&files.weights], dtype, device)? }
        } else {
            VarBuilder::from_pth(&files.weights, dtype, device)?
        };

        // Exported checkpoints name the encoder either bare or under `roberta.`.
        let encoder = if vb.contains_tensor("roberta.embeddings.word_embeddings.weight") {
            XLMRobertaModel::new(&config, vb.pp("roberta"))?
        } else {
            XLMRobertaModel::new(&config, vb)?
        };

        let hidden = config.hidden_size;
        let colbert_vb = VarBuilder::from_pth(&files.colbert_head, dtype, device)?;
        let colbert_linear = candle_nn::linear(hidden, hidden, colbert_vb)?;
        let sparse_vb = VarBuilder::from_pth(&files.sparse_head, dtype, device)?;
        let sparse_linear = candle_nn::linear(hidden, 1, sparse_vb)?;

        Ok(Self {
            encoder,
            colbert_linear,
            sparse_linear,
            config,
        })
    }

    /// Builds the encoder and both heads from a single var builder.
    #[cfg(test)]
    pub fn from_var_builder(config: Config, vb: VarBuilder) -> Result<Self> {
        let hidden = config.hidden_size;
        Ok(Self {
            encoder: XLMRobertaModel::new(&config, vb.pp("roberta"))?,
            colbert_linear: candle_nn::linear(hidden, hidden, vb.pp("colbert_linear"))?,
            sparse_linear: candle_nn::linear(hidden, 1, vb.pp("sparse_linear"))?,
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Longest input the positional table supports (positions start after the pad index).
    pub fn max_positions(&self) -> usize {
        self.config
            .max_position_embeddings
            .saturating_sub(self.config.pad_token_id as usize + 1)
    }

    /// `[batch, seq, hidden]` hidden states for right-padded `input_ids`.
    pub fn last_hidden_state(&self, input_ids: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let token_type_ids = input_ids.zeros_like()?;
        self.encoder
            .forward(input_ids, attention_mask, &token_type_ids, None, None, None)
    }

    /// `[batch, hidden]` CLS states, F32, not normalised.
    pub fn dense(&self, hidden: &Tensor) -> Result<Tensor> {
        hidden.i((.., 0, ..))?.to_dtype(DType::F32)
    }

    /// `[batch, seq]` per-token lexical weights (`relu(sparse_linear(h))`), F32.
    pub fn sparse(&self, hidden: &Tensor) -> Result<Tensor> {
        self.sparse_linear
            .forward(hidden)?
            .relu()?
            .squeeze(2)?
            .to_dtype(DType::F32)
    }

    /// `[batch, seq - 1, hidden]` projected token states with CLS dropped, F32, not normalised.
    pub fn colbert(&self, hidden: &Tensor) -> Result<Tensor> {
        let seq_len = hidden.dim(1)?;
        let tokens = hidden.narrow(1, 1, seq_len.saturating_sub(1))?;
        self.colbert_linear.forward(&tokens)?.to_dtype(DType::F32)
    }
}
