//! Scripted encoder for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::TextEncoder;
use crate::embedding::error::EmbeddingError;

/// Returns a fixed vector per text, a default vector otherwise.
#[derive(Debug)]
pub struct ScriptedEncoder {
    dim: usize,
    vectors: HashMap<String, Vec<f32>>,
    default: Vec<f32>,
    fail_on: Option<String>,
    calls: AtomicUsize,
}

impl ScriptedEncoder {
    /// Every text encodes to `[1, 0, 0, ...]`.
    pub fn new(dim: usize) -> Self {
        let mut default = vec![0.0; dim];
        if let Some(first) = default.first_mut() {
            *first = 1.0;
        }

        Self {
            dim,
            vectors: HashMap::new(),
            default,
            fail_on: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_vector(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.into(), vector);
        self
    }

    pub fn with_default(mut self, vector: Vec<f32>) -> Self {
        self.default = vector;
        self
    }

    /// Texts containing `marker` fail with [`EmbeddingError::InferenceFailed`].
    pub fn failing_on(mut self, marker: impl Into<String>) -> Self {
        self.fail_on = Some(marker.into());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TextEncoder for ScriptedEncoder {
    fn encode(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(marker) = &self.fail_on
            && text.contains(marker.as_str())
        {
            return Err(EmbeddingError::InferenceFailed {
                reason: "scripted encoder failure".to_string(),
            });
        }

        Ok(self
            .vectors
            .get(text)
            .cloned()
            .unwrap_or_else(|| self.default.clone()))
    }

    fn dim(&self) -> usize {
        self.dim
    }
}
