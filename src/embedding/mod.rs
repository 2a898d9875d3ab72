//! Model capabilities: sentence embeddings and entailment scoring.
//!
//! - [`encoder`] turns a claim into a vector for retrieval.
//! - [`nli`] scores (evidence, claim) pairs.
//!
//! Both run on candle and fall back to deterministic stubs when no model
//! directory is configured.

/// BERT trunk + classification heads shared by the encoder and NLI scorer.
pub mod bert;
/// Device selection (CPU / Metal / CUDA).
pub mod device;
/// Sentence encoder.
pub mod encoder;
mod error;
/// Entailment scorer.
pub mod nli;
/// Tokenizer loading and word helpers.
pub mod utils;

pub use encoder::{EncoderConfig, SentenceEmbedder, TextEncoder};
pub use error::EmbeddingError;
pub use nli::{EntailmentModel, LabelScore, NliClassifier, NliConfig, NliModelError};

#[cfg(any(test, feature = "mock"))]
pub use encoder::ScriptedEncoder;
#[cfg(any(test, feature = "mock"))]
pub use nli::{ScriptedEntailment, distribution};
