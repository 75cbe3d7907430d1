use std::collections::HashMap;

use parking_lot::Mutex;

use crate::embedding::error::EmbeddingError;
use crate::embedding::types::{EncodeRequest, LexicalWeights, M3Output, TokenVectors};
use crate::embedding::M3Encoder;

/// Fixed representations returned for one sentence.
#[derive(Debug, Clone, Default)]
pub struct MockEmbedding {
    pub dense: Vec<f32>,
    pub lexical: LexicalWeights,
    pub colbert: TokenVectors,
}

impl MockEmbedding {
    pub fn dense(dense: Vec<f32>) -> Self {
        Self {
            dense,
            ..Default::default()
        }
    }

    pub fn with_lexical(mut self, pairs: &[(u32, f32)]) -> Self {
        self.lexical = pairs.iter().copied().collect();
        self
    }

    pub fn with_colbert(mut self, colbert: TokenVectors) -> Self {
        self.colbert = colbert;
        self
    }
}

/// One recorded `encode` call.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeCall {
    pub sentences: Vec<String>,
    pub request: EncodeRequest,
}

/// Fixture-driven encoder that records every call.
#[derive(Default)]
pub struct MockEncoder {
    fixtures: HashMap<String, MockEmbedding>,
    tokens: HashMap<u32, String>,
    failure: Option<String>,
    omitted: Option<&'static str>,
    short_rows: usize,
    calls: Mutex<Vec<EncodeCall>>,
}

impl MockEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the representations returned for `sentence`.
    pub fn with_sentence(mut self, sentence: &str, embedding: MockEmbedding) -> Self {
        self.fixtures.insert(sentence.to_string(), embedding);
        self
    }

    /// Registers a display string for a token id.
    pub fn with_token(mut self, id: u32, token: &str) -> Self {
        self.tokens.insert(id, token.to_string());
        self
    }

    /// Makes every `encode` call fail with `reason`.
    pub fn failing(mut self, reason: &str) -> Self {
        self.failure = Some(reason.to_string());
        self
    }

    /// Leaves `field` (`dense_vecs`, `lexical_weights` or `colbert_vecs`) unset
    /// even when requested.
    pub fn without_output(mut self, field: &'static str) -> Self {
        self.omitted = Some(field);
        self
    }

    /// Drops the last `count` rows from every populated field.
    pub fn dropping_rows(mut self, count: usize) -> Self {
        self.short_rows = count;
        self
    }

    pub fn calls(&self) -> Vec<EncodeCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    fn fixture(&self, sentence: &str) -> Result<&MockEmbedding, EmbeddingError> {
        self.fixtures
            .get(sentence)
            .ok_or_else(|| EmbeddingError::InferenceFailed {
                reason: format!("no mock fixture for {:?}", sentence),
            })
    }
}

impl M3Encoder for MockEncoder {
    fn encode(
        &self,
        sentences: &[String],
        request: &EncodeRequest,
    ) -> Result<M3Output, EmbeddingError> {
        self.calls.lock().push(EncodeCall {
            sentences: sentences.to_vec(),
            request: *request,
        });

        if let Some(reason) = &self.failure {
            return Err(EmbeddingError::InferenceFailed {
                reason: reason.clone(),
            });
        }

        let fixtures = sentences
            .iter()
            .map(|s| self.fixture(s))
            .collect::<Result<Vec<_>, _>>()?;

        let kept = &fixtures[..fixtures.len().saturating_sub(self.short_rows)];
        let wants = |field: &str, requested: bool| requested && self.omitted != Some(field);

        Ok(M3Output {
            dense_vecs: wants("dense_vecs", request.return_dense)
                .then(|| kept.iter().map(|f| f.dense.clone()).collect()),
            lexical_weights: wants("lexical_weights", request.return_sparse)
                .then(|| kept.iter().map(|f| f.lexical.clone()).collect()),
            colbert_vecs: wants("colbert_vecs", request.return_colbert_vecs)
                .then(|| kept.iter().map(|f| f.colbert.clone()).collect()),
        })
    }

    fn convert_id_to_token(
        &self,
        weights: &[LexicalWeights],
    ) -> Result<Vec<Vec<(String, f32)>>, EmbeddingError> {
        Ok(weights
            .iter()
            .map(|sentence| {
                sentence
                    .iter()
                    .map(|(id, &w)| {
                        let token = self.tokens.get(id).cloned().unwrap_or_else(|| id.to_string());
                        (token, w)
                    })
                    .collect()
            })
            .collect())
    }

    fn model_id(&self) -> &str {
        "mock"
    }

    fn is_stub(&self) -> bool {
        true
    }
}
