//! Verity library crate (used by the server and integration tests).
//!
//! Verity classifies free text as truth, falsehood, or neutral. Text is split
//! into claims; each claim retrieves evidence from a knowledge base by vector
//! similarity, every (evidence, claim) pair is scored by an entailment model,
//! and the per-claim verdicts are folded pessimistically into one result.
//!
//! # Public API Surface
//!
//! ## Request path
//! - [`Dispatcher`] - input validation, [`ResultCache`], bounded [`InferencePool`]
//! - [`ClaimClassifier`] - per-request pipeline (extract, retrieve, verify, aggregate)
//! - [`EvidenceRetriever`], [`NliVerifier`] - the two per-claim stages
//!
//! ## Models
//! - [`ModelManager`] - loads the encoder, entailment model, index, and
//!   knowledge base once and hands out shared read-only handles
//! - [`TextEncoder`], [`EntailmentModel`], [`VectorIndex`] - capability seams
//! - [`SentenceEmbedder`], [`NliClassifier`], [`FlatIpIndex`] - candle and
//!   memory-mapped implementations (each with a deterministic stub mode)
//!
//! ## HTTP
//! - [`gateway::create_router`] - axum router for the `verity` binary
//!
//! ## Test/Mock Support
//! Scripted implementations are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod cache;
pub mod config;
pub mod constants;
pub mod dispatch;
pub mod embedding;
pub mod gateway;
pub mod hashing;
pub mod index;
pub mod models;
pub mod pipeline;
pub mod retrieval;
pub mod verification;

pub use cache::{
    CacheInfo, CacheStatus, ResultCache, VERITY_STATUS_HEADER, VERITY_STATUS_HEALTHY,
    VERITY_STATUS_NOT_READY,
};
pub use config::{Config, ConfigError};
pub use constants::{DimValidationError, validate_embedding_dim};
pub use dispatch::{Classified, DispatchError, Dispatcher, InferencePool};
pub use embedding::{
    EmbeddingError, EncoderConfig, EntailmentModel, LabelScore, NliClassifier, NliConfig,
    NliModelError, SentenceEmbedder, TextEncoder,
};
pub use gateway::{AppState, GatewayError};
pub use hashing::{NormalizationPolicy, fingerprint, normalize_text, preview};
pub use index::{
    FlatIpIndex, IndexError, KnowledgeBase, KnowledgeBaseEntry, Neighbor, TopicCount, VectorIndex,
};
pub use models::{LoadedModels, ModelError, ModelManager, ModelProvider};
pub use pipeline::{
    ClaimClassifier, ClaimVerdict, ClassificationResult, DecisionThresholds, PipelineError,
    PipelineOptions, PipelineStage, Verdict,
};
pub use retrieval::{EvidenceMatch, EvidenceRetriever, RetrievalError};
pub use verification::{Judgement, NliVerifier, VerificationError};

#[cfg(any(test, feature = "mock"))]
pub use embedding::{ScriptedEncoder, ScriptedEntailment};
#[cfg(any(test, feature = "mock"))]
pub use index::ScriptedIndex;
