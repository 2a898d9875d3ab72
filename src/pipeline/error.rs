use thiserror::Error;

use super::PipelineStage;
use crate::models::ModelError;
use crate::retrieval::RetrievalError;
use crate::verification::VerificationError;

/// Why a single claim could not be checked.
#[derive(Debug, Error)]
pub enum ClaimError {
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    #[error(transparent)]
    Verification(#[from] VerificationError),
}

impl ClaimError {
    pub fn stage(&self) -> PipelineStage {
        match self {
            ClaimError::Retrieval(_) => PipelineStage::EvidenceGathered,
            ClaimError::Verification(_) => PipelineStage::Scored,
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no claims could be extracted from '{text_preview}'")]
    NoClaims { text_preview: String },

    #[error("all {claims} claims failed; first failure at {stage}: {source}")]
    AllClaimsFailed {
        claims: usize,
        stage: PipelineStage,
        #[source]
        source: ClaimError,
    },

    #[error("claim {index} failed at {stage}: {source}")]
    ClaimFailed {
        index: usize,
        stage: PipelineStage,
        #[source]
        source: ClaimError,
    },

    #[error("classification cancelled during {stage}")]
    Cancelled { stage: PipelineStage },

    #[error(transparent)]
    Models(#[from] ModelError),
}

impl PipelineError {
    pub fn stage(&self) -> PipelineStage {
        match self {
            PipelineError::NoClaims { .. } => PipelineStage::Received,
            PipelineError::AllClaimsFailed { stage, .. }
            | PipelineError::ClaimFailed { stage, .. }
            | PipelineError::Cancelled { stage } => *stage,
            PipelineError::Models(_) => PipelineStage::Received,
        }
    }
}
