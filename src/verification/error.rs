use thiserror::Error;

use crate::models::ModelError;

#[derive(Debug, Error)]
pub enum VerificationError {
    #[error(
        "entailment scoring failed for claim '{claim_preview}' against evidence '{evidence_preview}': {reason}"
    )]
    Failed {
        claim_preview: String,
        evidence_preview: String,
        reason: String,
    },

    #[error(transparent)]
    Models(#[from] ModelError),
}
