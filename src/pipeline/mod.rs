//! The claim-verification pipeline.
//!
//! A request moves through [`PipelineStage`]s in order:
//! claims are extracted, each claim gathers evidence and scores it, the
//! per-claim verdicts are aggregated, and the result is shaped. Claims run
//! sequentially so output order is claim order.
//!
//! A claim whose retrieval or scoring fails is degraded to a neutral verdict
//! without evidence, as long as another claim succeeded. If every claim fails
//! the request fails. A missing model is never degraded.

mod claims;
mod decision;
pub mod error;
mod types;


pub use claims::{ClaimExtractor, SentenceClaimExtractor};
pub use decision::{ClaimDecision, DecisionThresholds, aggregate, decide};
pub use error::{ClaimError, PipelineError};
pub use types::{BestEvidence, ClaimVerdict, ClassificationResult, Verdict};

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::constants::{DEFAULT_MAX_CLAIMS, DEFAULT_TOP_K};
use crate::hashing::preview;
use crate::models::ModelManager;
use crate::retrieval::{EvidenceRetriever, RetrievalError};
use crate::verification::{NliVerifier, VerificationError};

/// Request lifecycle. `Done` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Received,
    ClaimsExtracted,
    EvidenceGathered,
    Scored,
    Aggregated,
    Done,
    Failed,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Received => "received",
            PipelineStage::ClaimsExtracted => "claims_extracted",
            PipelineStage::EvidenceGathered => "evidence_gathered",
            PipelineStage::Scored => "scored",
            PipelineStage::Aggregated => "aggregated",
            PipelineStage::Done => "done",
            PipelineStage::Failed => "failed",
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineOptions {
    pub top_k: usize,
    pub use_nli_context: bool,
    /// Degrade a failed claim to neutral instead of failing the request.
    pub degrade_failed_claims: bool,
    pub max_claims: usize,
    pub thresholds: DecisionThresholds,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            use_nli_context: true,
            degrade_failed_claims: true,
            max_claims: DEFAULT_MAX_CLAIMS,
            thresholds: DecisionThresholds::default(),
        }
    }
}

pub struct ClaimClassifier {
    models: Arc<ModelManager>,
    retriever: EvidenceRetriever,
    verifier: NliVerifier,
    extractor: Arc<dyn ClaimExtractor>,
    options: PipelineOptions,
}

impl std::fmt::Debug for ClaimClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaimClassifier")
            .field("options", &self.options)
            .finish()
    }
}

impl ClaimClassifier {
    pub fn new(models: Arc<ModelManager>, options: PipelineOptions) -> Self {
        let extractor = Arc::new(SentenceClaimExtractor::new(options.max_claims));
        Self::with_extractor(models, options, extractor)
    }

    pub fn with_extractor(
        models: Arc<ModelManager>,
        options: PipelineOptions,
        extractor: Arc<dyn ClaimExtractor>,
    ) -> Self {
        Self {
            retriever: EvidenceRetriever::new(Arc::clone(&models), options.top_k),
            verifier: NliVerifier::new(Arc::clone(&models), options.use_nli_context),
            models,
            extractor,
            options,
        }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Runs the full pipeline. Blocking; `cancel` is checked between claims.
    #[instrument(skip_all, fields(text_len = text.len()))]
    pub fn classify(
        &self,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<ClassificationResult, PipelineError> {
        self.models.models()?;
        debug!(stage = %PipelineStage::Received, "Text received");

        let claims = self.extractor.extract(text);
        if claims.is_empty() {
            warn!(
                stage = %PipelineStage::Failed,
                failed_at = %PipelineStage::Received,
                text = %preview(text),
                "No claims extracted"
            );
            return Err(PipelineError::NoClaims {
                text_preview: preview(text),
            });
        }
        debug!(
            stage = %PipelineStage::ClaimsExtracted,
            claims = claims.len(),
            "Claims extracted"
        );

        let mut outcomes = Vec::with_capacity(claims.len());
        for (index, claim) in claims.iter().enumerate() {
            if cancel.is_cancelled() {
                warn!(
                    stage = %PipelineStage::Failed,
                    failed_at = %PipelineStage::EvidenceGathered,
                    claim_index = index,
                    "Classification cancelled"
                );
                return Err(PipelineError::Cancelled {
                    stage: PipelineStage::EvidenceGathered,
                });
            }
            outcomes.push(self.verify_claim(claim)?);
        }

        let total = claims.len();
        let failures = outcomes.iter().filter(|o| o.is_err()).count();
        let mut verdicts = Vec::with_capacity(total);
        for (index, (claim, outcome)) in claims.into_iter().zip(outcomes).enumerate() {
            match outcome {
                Ok(verdict) => verdicts.push(verdict),
                Err(source) if failures == total => {
                    warn!(
                        stage = %PipelineStage::Failed,
                        failed_at = %source.stage(),
                        claims = failures,
                        error = %source,
                        "Every claim failed"
                    );
                    return Err(PipelineError::AllClaimsFailed {
                        claims: failures,
                        stage: source.stage(),
                        source,
                    });
                }
                Err(source) if !self.options.degrade_failed_claims => {
                    warn!(
                        stage = %PipelineStage::Failed,
                        failed_at = %source.stage(),
                        claim_index = index,
                        error = %source,
                        "Claim failed"
                    );
                    return Err(PipelineError::ClaimFailed {
                        index,
                        stage: source.stage(),
                        source,
                    });
                }
                Err(source) => {
                    warn!(
                        claim_index = index,
                        stage = %source.stage(),
                        error = %source,
                        "Claim degraded to neutral"
                    );
                    verdicts.push(ClaimVerdict::degraded(claim));
                }
            }
        }

        let (overall_classification, confidence) = aggregate(&verdicts);
        debug!(stage = %PipelineStage::Aggregated, "Verdicts aggregated");

        info!(
            stage = %PipelineStage::Done,
            overall = %overall_classification,
            confidence,
            claims = verdicts.len(),
            degraded = failures,
            "Classification complete"
        );

        Ok(ClassificationResult {
            overall_classification,
            confidence,
            claims: verdicts,
        })
    }

    /// Retrieves and scores evidence for one claim.
    ///
    /// The outer error is request-fatal (models missing); the inner one is a
    /// per-claim failure the caller may degrade.
    fn verify_claim(
        &self,
        claim: &str,
    ) -> Result<Result<ClaimVerdict, ClaimError>, PipelineError> {
        let evidence = match self.retriever.retrieve_proofs(claim, None) {
            Ok(evidence) => evidence,
            Err(RetrievalError::Models(e)) => return Err(e.into()),
            Err(e) => return Ok(Err(e.into())),
        };

        let mut scored = Vec::with_capacity(evidence.len());
        for item in evidence {
            match self.verifier.judge(claim, &item.snippet, None) {
                Ok(judgement) => scored.push((item, judgement)),
                Err(VerificationError::Models(e)) => return Err(e.into()),
                Err(e) => return Ok(Err(e.into())),
            }
        }

        let decision = decide(&scored, &self.options.thresholds);
        let best_evidence = decision.best.map(|i| {
            let (evidence, judgement) = scored.swap_remove(i);
            BestEvidence {
                evidence,
                nli_score: judgement.entailment,
            }
        });

        debug!(
            stage = %PipelineStage::Scored,
            claim = %preview(claim),
            verdict = %decision.verdict,
            confidence = decision.confidence,
            "Claim decided"
        );

        Ok(Ok(ClaimVerdict {
            claim: claim.to_string(),
            classification: decision.verdict,
            confidence: decision.confidence,
            best_evidence,
        }))
    }
}
