//! Per-claim decision rules and the overall aggregation.

use serde::{Deserialize, Serialize};

use super::types::{ClaimVerdict, Verdict};
use crate::constants::{
    DEFAULT_CONTRADICTION_THRESHOLD, DEFAULT_REFUTATION_FLOOR, DEFAULT_REFUTATION_MIN_RELEVANCE,
    DEFAULT_TRUTH_THRESHOLD,
};
use crate::retrieval::EvidenceMatch;
use crate::verification::Judgement;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecisionThresholds {
    /// Minimum entailment for `truth`.
    pub truth: f32,
    /// Minimum contradiction for `falsehood`.
    pub contradiction: f32,
    /// Entailment at or below this, on relevant evidence, is a refutation.
    pub refutation_floor: f32,
    /// Retrieval score the top evidence needs for the refutation rule to apply.
    pub refutation_min_relevance: f32,
}

impl Default for DecisionThresholds {
    fn default() -> Self {
        Self {
            truth: DEFAULT_TRUTH_THRESHOLD,
            contradiction: DEFAULT_CONTRADICTION_THRESHOLD,
            refutation_floor: DEFAULT_REFUTATION_FLOOR,
            refutation_min_relevance: DEFAULT_REFUTATION_MIN_RELEVANCE,
        }
    }
}

/// Outcome for one claim before it is shaped into a [`ClaimVerdict`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClaimDecision {
    pub verdict: Verdict,
    pub confidence: f32,
    /// Position of the best-entailed evidence, `None` when there was none.
    pub best: Option<usize>,
}

/// Decides one claim from its scored evidence. First matching rule wins:
///
/// 1. best entailment ≥ `truth` → truth (confidence = entailment)
/// 2. max contradiction ≥ `contradiction` → falsehood (confidence = contradiction)
/// 3. best entailment ≤ `refutation_floor` and top retrieval ≥
///    `refutation_min_relevance` → falsehood (confidence = 1 − entailment)
/// 4. neutral (confidence = neutral mass of the best evidence)
pub fn decide(scored: &[(EvidenceMatch, Judgement)], thresholds: &DecisionThresholds) -> ClaimDecision {
    let mut best: Option<usize> = None;
    for (i, (_, judgement)) in scored.iter().enumerate() {
        match best {
            Some(b) if scored[b].1.entailment >= judgement.entailment => {}
            _ => best = Some(i),
        }
    }

    let Some(best_idx) = best else {
        return ClaimDecision {
            verdict: Verdict::Neutral,
            confidence: 0.0,
            best: None,
        };
    };

    let best_judgement = scored[best_idx].1;
    let max_contradiction = scored
        .iter()
        .map(|(_, j)| j.contradiction)
        .fold(0.0f32, f32::max);
    let top_relevance = scored
        .iter()
        .map(|(e, _)| e.retrieval_score)
        .fold(f32::MIN, f32::max);

    let (verdict, confidence) = if best_judgement.entailment >= thresholds.truth {
        (Verdict::Truth, best_judgement.entailment)
    } else if max_contradiction >= thresholds.contradiction {
        (Verdict::Falsehood, max_contradiction)
    } else if best_judgement.entailment <= thresholds.refutation_floor
        && top_relevance >= thresholds.refutation_min_relevance
    {
        (Verdict::Falsehood, 1.0 - best_judgement.entailment)
    } else {
        (Verdict::Neutral, best_judgement.neutral)
    };

    ClaimDecision {
        verdict,
        confidence: confidence.clamp(0.0, 1.0),
        best: Some(best_idx),
    }
}

/// Overall verdict under pessimistic precedence: any falsehood wins, then any
/// truth, else neutral.
///
/// Confidence is the minimum over the falsehood claims, else the minimum over
/// the truth claims, else the mean over all claims. Each is non-decreasing in
/// every contributing claim's confidence. Claim order does not matter.
pub fn aggregate(claims: &[ClaimVerdict]) -> (Verdict, f32) {
    let min_of = |verdict: Verdict| {
        claims
            .iter()
            .filter(|c| c.classification == verdict)
            .map(|c| c.confidence)
            .reduce(f32::min)
    };

    if let Some(confidence) = min_of(Verdict::Falsehood) {
        return (Verdict::Falsehood, confidence.clamp(0.0, 1.0));
    }
    if let Some(confidence) = min_of(Verdict::Truth) {
        return (Verdict::Truth, confidence.clamp(0.0, 1.0));
    }
    if claims.is_empty() {
        return (Verdict::Neutral, 0.0);
    }

    let mean = claims.iter().map(|c| c.confidence).sum::<f32>() / claims.len() as f32;
    (Verdict::Neutral, mean.clamp(0.0, 1.0))
}
