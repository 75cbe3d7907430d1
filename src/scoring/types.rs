use std::fmt;
use std::str::FromStr;

use super::error::ScoringError;
use crate::constants::{DEFAULT_MAX_LENGTH, WITHIN_BLOCK_MIN_SENTENCES};

/// Wire-level scoring selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmbeddingType {
    #[default]
    Dense,
    Sparse,
    Colbert,
}

impl EmbeddingType {
    pub const ALL: [EmbeddingType; 3] = [
        EmbeddingType::Dense,
        EmbeddingType::Sparse,
        EmbeddingType::Colbert,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmbeddingType::Dense => "dense",
            EmbeddingType::Sparse => "sparse",
            EmbeddingType::Colbert => "colbert",
        }
    }
}

impl fmt::Display for EmbeddingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmbeddingType {
    type Err = ScoringError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        EmbeddingType::ALL
            .into_iter()
            .find(|t| t.as_str() == value)
            .ok_or_else(|| {
                ScoringError::validation(format!(
                    "embedding_type must be one of dense, sparse, colbert; got {:?}",
                    value
                ))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Validated scoring mode; only dense scoring takes a token cap.
pub enum ScoreMode {
    Dense { max_length: usize },
    Sparse,
    Colbert,
}

impl Default for ScoreMode {
    fn default() -> Self {
        ScoreMode::Dense {
            max_length: DEFAULT_MAX_LENGTH,
        }
    }
}

impl ScoreMode {
    /// Builds a mode from the wire selector and optional `max_length`.
    ///
    /// `max_length` is validated for every mode but only kept for dense.
    pub fn new(embedding_type: EmbeddingType, max_length: Option<i64>) -> Result<Self, ScoringError> {
        let max_length = match max_length {
            None => DEFAULT_MAX_LENGTH,
            Some(value) if value <= 0 => {
                return Err(ScoringError::validation(format!(
                    "max_length must be a positive integer, got {}",
                    value
                )));
            }
            Some(value) => usize::try_from(value).map_err(|_| {
                ScoringError::validation(format!("max_length {} is out of range", value))
            })?,
        };

        Ok(match embedding_type {
            EmbeddingType::Dense => ScoreMode::Dense { max_length },
            EmbeddingType::Sparse => ScoreMode::Sparse,
            EmbeddingType::Colbert => ScoreMode::Colbert,
        })
    }

    pub fn embedding_type(&self) -> EmbeddingType {
        match self {
            ScoreMode::Dense { .. } => EmbeddingType::Dense,
            ScoreMode::Sparse => EmbeddingType::Sparse,
            ScoreMode::Colbert => EmbeddingType::Colbert,
        }
    }

    /// Minimum number of sentences the mode needs in the first block.
    pub fn min_first_block_len(&self) -> usize {
        match self {
            ScoreMode::Dense { .. } => 1,
            ScoreMode::Sparse | ScoreMode::Colbert => WITHIN_BLOCK_MIN_SENTENCES,
        }
    }
}

fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\u{0b}' | '\u{0c}' | '\u{1c}' | '\u{1d}' | '\u{1e}' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
/// Ordered, non-empty sentences split out of one raw input block.
pub struct SentenceBlock(Vec<String>);

impl SentenceBlock {
    /// Trims the whole block once, then splits on line boundaries.
    ///
    /// Lines keep their own leading/trailing whitespace; zero-length lines are dropped.
    pub fn parse(raw: &str) -> Self {
        let sentences = raw
            .trim()
            .split(is_line_break)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Self(sentences)
    }

    /// Parses a required field, rejecting missing or blank input.
    pub fn parse_required(field: &str, raw: Option<&str>) -> Result<Self, ScoringError> {
        let raw = raw.ok_or_else(|| ScoringError::validation(format!("{} is required", field)))?;
        let block = Self::parse(raw);
        if block.is_empty() {
            return Err(ScoringError::validation(format!(
                "{} must contain at least one sentence",
                field
            )));
        }
        Ok(block)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }
}

impl From<Vec<String>> for SentenceBlock {
    fn from(sentences: Vec<String>) -> Self {
        Self(sentences)
    }
}

#[derive(Debug, Clone, PartialEq)]
/// A validated scoring request.
pub struct ScoreRequest {
    pub sentences_1: SentenceBlock,
    pub sentences_2: SentenceBlock,
    pub mode: ScoreMode,
}

impl ScoreRequest {
    /// Validates raw inputs. Missing `embedding_type` means dense.
    pub fn new(
        sentences_1: Option<&str>,
        sentences_2: Option<&str>,
        embedding_type: Option<&str>,
        max_length: Option<i64>,
    ) -> Result<Self, ScoringError> {
        let embedding_type = embedding_type
            .map(EmbeddingType::from_str)
            .transpose()?
            .unwrap_or_default();
        let mode = ScoreMode::new(embedding_type, max_length)?;

        Ok(Self {
            sentences_1: SentenceBlock::parse_required("sentences_1", sentences_1)?,
            sentences_2: SentenceBlock::parse_required("sentences_2", sentences_2)?,
            mode,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
/// Row-major `rows x cols` similarity matrix.
pub struct ScoreMatrix {
    rows: usize,
    cols: usize,
    values: Vec<f32>,
}

impl ScoreMatrix {
    /// Returns `None` if `values.len() != rows * cols`.
    pub fn new(rows: usize, cols: usize, values: Vec<f32>) -> Option<Self> {
        (values.len() == rows * cols).then_some(Self { rows, cols, values })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        (row < self.rows && col < self.cols).then(|| self.values[row * self.cols + col])
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn transpose(&self) -> Self {
        let mut values = Vec::with_capacity(self.values.len());
        for c in 0..self.cols {
            for r in 0..self.rows {
                values.push(self.values[r * self.cols + c]);
            }
        }
        Self {
            rows: self.cols,
            cols: self.rows,
            values,
        }
    }
}

impl fmt::Display for ScoreMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for r in 0..self.rows {
            if r > 0 {
                f.write_str("\n ")?;
            }
            f.write_str("[")?;
            for c in 0..self.cols {
                if c > 0 {
                    f.write_str(" ")?;
                }
                write!(f, "{:.4}", self.values[r * self.cols + c])?;
            }
            f.write_str("]")?;
        }
        f.write_str("]")
    }
}

#[derive(Debug, Clone, PartialEq)]
/// Result of one scoring call.
pub enum ScoreReport {
    /// Dense mode: `sentences_1 x sentences_2` dot products.
    Matrix(ScoreMatrix),
    /// Sparse/ColBERT mode.
    Pair {
        /// First sentence of block 1 vs first sentence of block 2.
        cross: f32,
        /// First vs second sentence of block 1.
        within: f32,
    },
}

impl fmt::Display for ScoreReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreReport::Matrix(matrix) => write!(f, "{}", matrix),
            ScoreReport::Pair { cross, within } => write!(f, "{}\n{}", cross, within),
        }
    }
}
