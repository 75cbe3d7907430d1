use std::path::Path;

use tokenizers::Tokenizer;

use super::error::EmbeddingError;

/// Ids of the XLM-RoBERTa special tokens, resolved from the tokenizer vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialTokens {
    pub cls: u32,
    pub pad: u32,
    pub eos: u32,
    pub unk: u32,
}

impl Default for SpecialTokens {
    fn default() -> Self {
        Self {
            cls: 0,
            pad: 1,
            eos: 2,
            unk: 3,
        }
    }
}

impl SpecialTokens {
    pub fn from_tokenizer(tokenizer: &Tokenizer) -> Self {
        let defaults = Self::default();
        Self {
            cls: tokenizer.token_to_id("<s>").unwrap_or(defaults.cls),
            pad: tokenizer.token_to_id("<pad>").unwrap_or(defaults.pad),
            eos: tokenizer.token_to_id("</s>").unwrap_or(defaults.eos),
            unk: tokenizer.token_to_id("<unk>").unwrap_or(defaults.unk),
        }
    }

    /// Tokens that never carry lexical weight.
    pub fn is_special(&self, id: u32) -> bool {
        id == self.cls || id == self.pad || id == self.eos || id == self.unk
    }
}

/// Loads `tokenizer.json` from a model directory with padding and truncation disabled.
///
/// Batching pads and truncates by hand, since the cap changes per request.
pub fn load_tokenizer(model_dir: &Path) -> Result<Tokenizer, EmbeddingError> {
    let tokenizer_path = model_dir.join("tokenizer.json");
    let mut tokenizer =
        Tokenizer::from_file(&tokenizer_path).map_err(|e| EmbeddingError::TokenizationFailed {
            reason: format!("failed to load {}: {}", tokenizer_path.display(), e),
        })?;

    tokenizer.with_padding(None);
    tokenizer
        .with_truncation(None)
        .map_err(|e| EmbeddingError::TokenizationFailed {
            reason: format!("failed to reset truncation: {}", e),
        })?;

    Ok(tokenizer)
}

/// Cuts `ids` to `max_len` tokens, keeping the trailing `</s>`.
pub fn truncate_ids(ids: &mut Vec<u32>, max_len: usize, eos: u32) {
    if ids.len() <= max_len {
        return;
    }
    let keep = max_len.max(2);
    ids.truncate(keep - 1);
    ids.push(eos);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_keeps_eos() {
        let mut ids = vec![0, 10, 11, 12, 13, 2];
        truncate_ids(&mut ids, 4, 2);
        assert_eq!(ids, vec![0, 10, 11, 2]);
    }

    #[test]
    fn test_truncate_noop_when_short() {
        let mut ids = vec![0, 10, 2];
        truncate_ids(&mut ids, 8, 2);
        assert_eq!(ids, vec![0, 10, 2]);
    }

    #[test]
    fn test_truncate_never_below_cls_eos() {
        let mut ids = vec![0, 10, 11, 2];
        truncate_ids(&mut ids, 1, 2);
        assert_eq!(ids, vec![0, 2]);
    }

    #[test]
    fn test_special_tokens_default() {
        let specials = SpecialTokens::default();
        assert!(specials.is_special(0));
        assert!(specials.is_special(3));
        assert!(!specials.is_special(4));
    }
}
