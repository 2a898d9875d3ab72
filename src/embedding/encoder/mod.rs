//! Sentence encoder (BERT family, mean pooling).
//!
//! Use [`EncoderConfig::stub`] for tests/examples without model files. The stub
//! hashes content words into buckets, so texts sharing vocabulary land close
//! together and retrieval over a stub index still ranks sensibly.

/// Encoder configuration.
pub mod config;

#[cfg(any(test, feature = "mock"))]
pub mod mock;


pub use config::EncoderConfig;
#[cfg(any(test, feature = "mock"))]
pub use mock::ScriptedEncoder;

use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

use crate::embedding::bert::BertEncoder;
use crate::embedding::device::{device_label, select_device};
use crate::embedding::error::EmbeddingError;
use crate::embedding::utils::{content_words, load_tokenizer_with_truncation, words};

/// Turns text into a single dense vector.
///
/// Output is *not* normalized; callers that need cosine similarity normalize.
pub trait TextEncoder: Send + Sync {
    fn encode(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Length of every vector returned by [`encode`](Self::encode).
    fn dim(&self) -> usize;

    fn is_stub(&self) -> bool {
        false
    }
}

enum EncoderBackend {
    Model {
        model: BertEncoder,
        tokenizer: Tokenizer,
        device: Device,
    },
    Stub,
}

/// Sentence embedder (supports stub mode).
pub struct SentenceEmbedder {
    backend: EncoderBackend,
    config: EncoderConfig,
    dim: usize,
}

impl std::fmt::Debug for SentenceEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentenceEmbedder")
            .field(
                "backend",
                &match &self.backend {
                    EncoderBackend::Model { device, .. } => {
                        format!("Model({})", device_label(device))
                    }
                    EncoderBackend::Stub => "Stub".to_string(),
                },
            )
            .field("dim", &self.dim)
            .field("max_seq_len", &self.config.max_seq_len)
            .finish()
    }
}

impl SentenceEmbedder {
    /// Loads the encoder from a config (stub mode is supported).
    pub fn load(config: EncoderConfig) -> Result<Self, EmbeddingError> {
        config.validate()?;

        if config.testing_stub {
            warn!(dim = config.embedding_dim, "Sentence encoder running in STUB mode");
            return Ok(Self {
                backend: EncoderBackend::Stub,
                dim: config.embedding_dim,
                config,
            });
        }

        let device = select_device()?;

        let model = BertEncoder::load(&config.model_dir, &device).map_err(|e| {
            EmbeddingError::ModelLoadFailed {
                reason: format!("Failed to load BERT encoder: {}", e),
            }
        })?;

        let tokenizer = load_tokenizer_with_truncation(&config.model_dir, config.max_seq_len)
            .map_err(|e| EmbeddingError::TokenizationFailed {
                reason: format!("Failed to load tokenizer: {}", e),
            })?;

        let dim = model.hidden_size();
        info!(
            model_dir = %config.model_dir.display(),
            dim,
            max_seq_len = config.max_seq_len,
            device = device_label(&device),
            "Sentence encoder loaded"
        );

        Ok(Self {
            backend: EncoderBackend::Model {
                model,
                tokenizer,
                device,
            },
            config,
            dim,
        })
    }

    /// Shorthand for `load(EncoderConfig::stub())`.
    pub fn stub() -> Result<Self, EmbeddingError> {
        Self::load(EncoderConfig::stub())
    }

    fn encode_with_model(
        &self,
        text: &str,
        model: &BertEncoder,
        tokenizer: &Tokenizer,
        device: &Device,
    ) -> Result<Vec<f32>, EmbeddingError> {
        let encoding =
            tokenizer
                .encode(text, true)
                .map_err(|e| EmbeddingError::TokenizationFailed {
                    reason: e.to_string(),
                })?;

        if encoding.get_ids().is_empty() {
            return Err(EmbeddingError::TokenizationFailed {
                reason: "text produced no tokens".to_string(),
            });
        }

        debug!(
            text_len = text.len(),
            token_count = encoding.get_ids().len(),
            "Encoding text (transformer forward pass)"
        );

        let input_ids = Tensor::new(encoding.get_ids(), device)?.unsqueeze(0)?;
        let type_ids = Tensor::new(encoding.get_type_ids(), device)?.unsqueeze(0)?;
        let attention_mask = Tensor::new(encoding.get_attention_mask(), device)?.unsqueeze(0)?;

        let pooled = model
            .mean_pooled(&input_ids, &type_ids, &attention_mask)
            .map_err(|e| EmbeddingError::InferenceFailed {
                reason: format!("Encoder forward pass failed: {}", e),
            })?;

        Ok(pooled.squeeze(0)?.to_vec1::<f32>()?)
    }

    /// Feature-hashed bag of words; falls back to all words when a text is only
    /// stop words, so no non-empty text maps to the zero vector.
    fn encode_stub(&self, text: &str) -> Vec<f32> {
        let mut tokens = content_words(text);
        if tokens.is_empty() {
            tokens = words(text);
        }

        let mut embedding = vec![0.0f32; self.dim];
        for token in &tokens {
            let hash = blake3::hash(token.as_bytes());
            let bytes = hash.as_bytes();
            let bucket = u64::from_le_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
            ]) as usize
                % self.dim;
            let sign = if bytes[8] & 1 == 0 { 1.0 } else { -1.0 };
            embedding[bucket] += sign;
        }

        embedding
    }

    /// Returns the encoder configuration.
    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }
}

impl TextEncoder for SentenceEmbedder {
    fn encode(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        match &self.backend {
            EncoderBackend::Model {
                model,
                tokenizer,
                device,
            } => self.encode_with_model(text, model, tokenizer, device),
            EncoderBackend::Stub => Ok(self.encode_stub(text)),
        }
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn is_stub(&self) -> bool {
        matches!(self.backend, EncoderBackend::Stub)
    }
}
