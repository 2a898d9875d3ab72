use std::path::PathBuf;
use thiserror::Error;

use crate::embedding::error::EmbeddingError;

#[derive(Debug, Error)]
pub enum NliModelError {
    #[error("entailment model not found at path: {path}")]
    ModelNotFound { path: PathBuf },

    #[error("failed to load entailment model: {reason}")]
    ModelLoadFailed { reason: String },

    #[error("entailment inference failed: {reason}")]
    InferenceFailed { reason: String },

    #[error("tokenization failed: {reason}")]
    TokenizationFailed { reason: String },

    #[error("invalid entailment model configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl From<candle_core::Error> for NliModelError {
    fn from(err: candle_core::Error) -> Self {
        NliModelError::InferenceFailed {
            reason: err.to_string(),
        }
    }
}

impl From<std::io::Error> for NliModelError {
    fn from(err: std::io::Error) -> Self {
        NliModelError::ModelLoadFailed {
            reason: err.to_string(),
        }
    }
}

impl From<EmbeddingError> for NliModelError {
    fn from(err: EmbeddingError) -> Self {
        match err {
            EmbeddingError::ModelNotFound { path } => NliModelError::ModelNotFound { path },
            EmbeddingError::ModelLoadFailed { reason } => NliModelError::ModelLoadFailed { reason },
            EmbeddingError::TokenizationFailed { reason } => {
                NliModelError::TokenizationFailed { reason }
            }
            EmbeddingError::InvalidConfig { reason } => NliModelError::InvalidConfig { reason },
            EmbeddingError::InferenceFailed { reason } => NliModelError::InferenceFailed { reason },
        }
    }
}
