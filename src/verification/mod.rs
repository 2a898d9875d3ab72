//! Entailment scoring of (claim, evidence) pairs.
//!
//! The evidence is the premise and the claim is the hypothesis. Label names
//! vary between checkpoints, so each class takes the score of exactly one
//! label: an exact case-insensitive match (`ENTAILMENT`, `CONTRADICTION`,
//! `NEUTRAL`) wins, otherwise the first label containing the stem (`ENTAIL`,
//! `CONTRADICT`, `NEUTRAL`). Negated names such as `not_entailment` never
//! match. A missing label scores 0.0.

pub mod error;


pub use error::VerificationError;

use std::sync::Arc;

use serde::Serialize;
use tracing::{instrument, warn};

use crate::constants::CONTEXT_FRAMING_PREFIX;
use crate::embedding::LabelScore;
use crate::hashing::preview;
use crate::models::ModelManager;

/// Entailment, contradiction, and neutral mass for one pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Judgement {
    pub entailment: f32,
    pub contradiction: f32,
    pub neutral: f32,
}

impl Judgement {
    pub fn from_labels(scores: &[LabelScore]) -> Self {
        Self {
            entailment: label_score(scores, "ENTAIL", "ENTAILMENT"),
            contradiction: label_score(scores, "CONTRADICT", "CONTRADICTION"),
            neutral: label_score(scores, "NEUTRAL", "NEUTRAL"),
        }
    }
}

/// Score of the single label naming a class.
///
/// `exact` is preferred; otherwise the first label containing `stem` is used.
/// Labels with `NOT` or `NON` ahead of the stem are skipped.
pub fn label_score(scores: &[LabelScore], stem: &str, exact: &str) -> f32 {
    let candidates: Vec<(String, f32)> = scores
        .iter()
        .map(|s| (s.label.to_ascii_uppercase(), s.score))
        .filter(|(label, _)| match label.find(stem) {
            Some(at) => !is_negated(&label[..at]),
            None => false,
        })
        .collect();

    candidates
        .iter()
        .find(|(label, _)| label == exact)
        .or_else(|| candidates.first())
        .map(|(_, score)| score.clamp(0.0, 1.0))
        .unwrap_or(0.0)
}

fn is_negated(prefix: &str) -> bool {
    prefix.contains("NOT") || prefix.contains("NON")
}

/// Builds the hypothesis text, optionally with the framing prefix.
pub fn frame_hypothesis(claim: &str, use_context: bool) -> String {
    if use_context {
        format!("{}{}", CONTEXT_FRAMING_PREFIX, claim)
    } else {
        claim.to_string()
    }
}

#[derive(Debug, Clone)]
pub struct NliVerifier {
    models: Arc<ModelManager>,
    default_use_context: bool,
}

impl NliVerifier {
    pub fn new(models: Arc<ModelManager>, default_use_context: bool) -> Self {
        Self {
            models,
            default_use_context,
        }
    }

    /// Probability that `evidence` entails `claim`, in `[0, 1]`.
    pub fn nli_score(
        &self,
        claim: &str,
        evidence: &str,
        use_context: Option<bool>,
    ) -> Result<f32, VerificationError> {
        Ok(self.judge(claim, evidence, use_context)?.entailment)
    }

    /// Full label breakdown for `(evidence, claim)`.
    #[instrument(skip_all, fields(claim = %preview(claim)))]
    pub fn judge(
        &self,
        claim: &str,
        evidence: &str,
        use_context: Option<bool>,
    ) -> Result<Judgement, VerificationError> {
        let nli = self.models.get_nli()?;
        let hypothesis = frame_hypothesis(claim, use_context.unwrap_or(self.default_use_context));

        let scores = nli.classify(evidence, &hypothesis).map_err(|e| {
            warn!(error = %e, evidence = %preview(evidence), "Entailment scoring failed");
            VerificationError::Failed {
                claim_preview: preview(claim),
                evidence_preview: preview(evidence),
                reason: e.to_string(),
            }
        })?;

        Ok(Judgement::from_labels(&scores))
    }
}
