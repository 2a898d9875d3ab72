use serde::{Deserialize, Serialize};

use crate::retrieval::EvidenceMatch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Truth,
    Falsehood,
    Neutral,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Truth => "truth",
            Verdict::Falsehood => "falsehood",
            Verdict::Neutral => "neutral",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The evidence with the highest entailment score for a claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestEvidence {
    #[serde(flatten)]
    pub evidence: EvidenceMatch,
    pub nli_score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimVerdict {
    pub claim: String,
    pub classification: Verdict,
    pub confidence: f32,
    pub best_evidence: Option<BestEvidence>,
}

impl ClaimVerdict {
    /// Neutral verdict with no evidence, used when a claim could not be checked.
    pub fn degraded(claim: impl Into<String>) -> Self {
        Self {
            claim: claim.into(),
            classification: Verdict::Neutral,
            confidence: 0.0,
            best_evidence: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub overall_classification: Verdict,
    pub confidence: f32,
    pub claims: Vec<ClaimVerdict>,
}
