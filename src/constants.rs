//! Cross-cutting, shared constants.
//!
//! Decision thresholds here are calibration defaults, not protocol: every one of
//! them is overridable through [`crate::config::Config`].
//!
//! # Dimension Invariants
//!
//! The encoder output dimension and the persisted index dimension must agree. The
//! index is built offline, so the check happens once at load time via
//! [`validate_embedding_dim`] rather than on every query.

/// Output dimension of the default sentence encoder (MiniLM-L6).
pub const DEFAULT_EMBEDDING_DIM: usize = 384;

/// Max tokens fed to the sentence encoder.
pub const DEFAULT_EMBED_MAX_SEQ_LEN: usize = 256;

/// Max tokens fed to the entailment model (premise + hypothesis).
pub const DEFAULT_NLI_MAX_SEQ_LEN: usize = 512;

pub const DEFAULT_TOP_K: usize = 5;

pub const DEFAULT_TRUTH_THRESHOLD: f32 = 0.75;
pub const DEFAULT_CONTRADICTION_THRESHOLD: f32 = 0.60;
pub const DEFAULT_REFUTATION_FLOOR: f32 = 0.05;
pub const DEFAULT_REFUTATION_MIN_RELEVANCE: f32 = 0.80;

/// Phrase prepended to the hypothesis when contextual framing is enabled.
pub const CONTEXT_FRAMING_PREFIX: &str = "Established fact: ";

pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;
pub const DEFAULT_CACHE_CAPACITY: u64 = 1_000;

pub const DEFAULT_INFERENCE_TIMEOUT_SECS: u64 = 45;
pub const DEFAULT_WORKER_POOL_SIZE: usize = 1;
pub const DEFAULT_RATE_LIMIT_PER_MINUTE: u32 = 10;

pub const DEFAULT_MAX_INPUT_CHARS: usize = 5_000;
pub const DEFAULT_MAX_CLAIMS: usize = 20;

/// Number of characters of user text allowed into logs and error details.
pub const PREVIEW_CHARS: usize = 50;

/// Error returned when the encoder and the index disagree on vector size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DimValidationError {
    /// Embedding dimension cannot be zero.
    ZeroDimension,
    /// Runtime dimension does not match expected dimension.
    DimensionMismatch { expected: usize, actual: usize },
}

impl std::fmt::Display for DimValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroDimension => write!(f, "embedding dimension cannot be zero"),
            Self::DimensionMismatch { expected, actual } => {
                write!(
                    f,
                    "dimension mismatch: expected {}, got {}",
                    expected, actual
                )
            }
        }
    }
}

impl std::error::Error for DimValidationError {}

/// Validates that a runtime embedding dimension matches the expected dimension.
///
/// # Example
///
/// ```
/// use verity::constants::{validate_embedding_dim, DEFAULT_EMBEDDING_DIM};
///
/// validate_embedding_dim(384, DEFAULT_EMBEDDING_DIM).unwrap();
/// assert!(validate_embedding_dim(768, DEFAULT_EMBEDDING_DIM).is_err());
/// ```
pub fn validate_embedding_dim(actual: usize, expected: usize) -> Result<(), DimValidationError> {
    if expected == 0 || actual == 0 {
        return Err(DimValidationError::ZeroDimension);
    }
    if actual != expected {
        return Err(DimValidationError::DimensionMismatch { expected, actual });
    }
    Ok(())
}
