use thiserror::Error;

use crate::models::ModelError;

/// Step of retrieval that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalStage {
    Encode,
    Normalize,
    Search,
}

impl RetrievalStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetrievalStage::Encode => "encode",
            RetrievalStage::Normalize => "normalize",
            RetrievalStage::Search => "search",
        }
    }
}

impl std::fmt::Display for RetrievalStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("evidence retrieval failed at {stage} for claim '{claim_preview}': {reason}")]
    Failed {
        stage: RetrievalStage,
        claim_preview: String,
        reason: String,
    },

    #[error(transparent)]
    Models(#[from] ModelError),
}

impl RetrievalError {
    pub fn stage(&self) -> Option<RetrievalStage> {
        match self {
            RetrievalError::Failed { stage, .. } => Some(*stage),
            RetrievalError::Models(_) => None,
        }
    }
}
