use std::path::PathBuf;

use crate::constants::{DEFAULT_EMBED_MAX_SEQ_LEN, DEFAULT_EMBEDDING_DIM};
use crate::embedding::error::EmbeddingError;

#[derive(Debug, Clone)]
/// Configuration for [`SentenceEmbedder`](super::SentenceEmbedder).
pub struct EncoderConfig {
    /// Model directory holding `config.json`, `model.safetensors` and `tokenizer.json`.
    pub model_dir: PathBuf,
    /// Max tokens to consider.
    pub max_seq_len: usize,
    /// Output embedding dimension (stub mode only; a real model reports its own).
    pub embedding_dim: usize,
    /// If true, run in deterministic stub mode (no model files required).
    pub testing_stub: bool,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::new(),
            max_seq_len: DEFAULT_EMBED_MAX_SEQ_LEN,
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            testing_stub: false,
        }
    }
}

impl EncoderConfig {
    /// Creates a config for a model directory.
    pub fn new<P: Into<PathBuf>>(model_dir: P) -> Self {
        Self {
            model_dir: model_dir.into(),
            ..Default::default()
        }
    }

    /// Creates a stub config (no model files; hashed bag-of-words embeddings).
    pub fn stub() -> Self {
        Self {
            testing_stub: true,
            ..Default::default()
        }
    }

    /// Stub config with a custom dimension.
    pub fn stub_with_dim(embedding_dim: usize) -> Self {
        Self {
            embedding_dim,
            ..Self::stub()
        }
    }

    /// Validates required fields for the selected mode.
    pub fn validate(&self) -> Result<(), EmbeddingError> {
        if self.embedding_dim == 0 {
            return Err(EmbeddingError::InvalidConfig {
                reason: "embedding_dim must be non-zero".to_string(),
            });
        }

        if self.testing_stub {
            return Ok(());
        }

        if self.model_dir.as_os_str().is_empty() {
            return Err(EmbeddingError::InvalidConfig {
                reason: "model_dir is required outside stub mode".to_string(),
            });
        }

        if !self.model_dir.is_dir() {
            return Err(EmbeddingError::ModelNotFound {
                path: self.model_dir.clone(),
            });
        }

        for file in ["config.json", "model.safetensors", "tokenizer.json"] {
            let path = self.model_dir.join(file);
            if !path.exists() {
                return Err(EmbeddingError::ModelNotFound { path });
            }
        }

        Ok(())
    }
}
