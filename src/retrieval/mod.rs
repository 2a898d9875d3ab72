//! Evidence retrieval: nearest knowledge-base snippets for a claim.

pub mod error;


pub use error::{RetrievalError, RetrievalStage};

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::hashing::preview;
use crate::models::ModelManager;

/// A knowledge-base snippet retrieved for a claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceMatch {
    pub snippet: String,
    pub source: String,
    /// Cosine similarity between claim and snippet embeddings.
    pub retrieval_score: f32,
}

/// Scales `v` to unit length in place.
pub fn l2_normalize(v: &mut [f32]) -> Result<(), String> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if !norm.is_finite() || norm == 0.0 {
        return Err(format!("cannot normalize vector with norm {}", norm));
    }
    for x in v.iter_mut() {
        *x /= norm;
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct EvidenceRetriever {
    models: Arc<ModelManager>,
    default_top_k: usize,
}

impl EvidenceRetriever {
    pub fn new(models: Arc<ModelManager>, default_top_k: usize) -> Self {
        Self {
            models,
            default_top_k,
        }
    }

    /// Top-k snippets for `claim`, best first. Ids the index returns that have
    /// no snippet (padding sentinels, stale ids) are skipped.
    #[instrument(skip(self, claim), fields(claim = %preview(claim)))]
    pub fn retrieve_proofs(
        &self,
        claim: &str,
        top_k: Option<usize>,
    ) -> Result<Vec<EvidenceMatch>, RetrievalError> {
        let models = self.models.models()?;
        let k = top_k.unwrap_or(self.default_top_k);

        let fail = |stage: RetrievalStage, reason: String| {
            warn!(stage = stage.as_str(), %reason, "Evidence retrieval failed");
            RetrievalError::Failed {
                stage,
                claim_preview: preview(claim),
                reason,
            }
        };

        let mut query = models
            .encoder
            .encode(claim)
            .map_err(|e| fail(RetrievalStage::Encode, e.to_string()))?;

        l2_normalize(&mut query).map_err(|reason| fail(RetrievalStage::Normalize, reason))?;

        let neighbors = models
            .index
            .search(&query, k)
            .map_err(|e| fail(RetrievalStage::Search, e.to_string()))?;

        let mut evidence = Vec::with_capacity(neighbors.len());
        for neighbor in neighbors {
            match models.kb.get(neighbor.id) {
                Some(entry) => evidence.push(EvidenceMatch {
                    snippet: entry.snippet.clone(),
                    source: entry.source.clone(),
                    retrieval_score: neighbor.score,
                }),
                None if neighbor.is_sentinel() => {
                    debug!("Index returned fewer than k candidates");
                }
                None => {
                    warn!(
                        id = neighbor.id,
                        snippets = models.kb.len(),
                        "Index id out of snippet range; skipping"
                    );
                }
            }
        }

        debug!(requested = k, found = evidence.len(), "Evidence retrieved");
        Ok(evidence)
    }
}
