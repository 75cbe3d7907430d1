//! Sentence-block scoring on top of an [`M3Encoder`](crate::embedding::M3Encoder).
//!
//! A request carries two newline-delimited blocks and a mode:
//!
//! - `dense`: full `sentences_1 x sentences_2` matrix of dense dot products.
//! - `sparse`: lexical-weight overlap of the first sentence of block 1 against
//!   the first sentence of block 2, and against the second sentence of block 1.
//! - `colbert`: the same two pairs, scored by late interaction.
//!
//! Pair modes compare fixed positions, so they need at least two sentences in
//! block 1.

pub mod error;
pub mod scorer;
pub mod types;


pub use error::ScoringError;
pub use scorer::Scorer;
pub use types::{EmbeddingType, ScoreMatrix, ScoreMode, ScoreReport, ScoreRequest, SentenceBlock};
