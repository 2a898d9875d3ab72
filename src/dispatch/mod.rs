//! Request dispatch: validation, the result cache, and the inference pool.
//!
//! [`Dispatcher::classify`] never blocks the async runtime. The pipeline runs
//! on a blocking worker; the caller only awaits it under the configured
//! timeout. A result is cached only when the pipeline finished in time.

pub mod error;
mod pool;

#[cfg(test)]
mod tests;

pub use error::DispatchError;
pub use pool::InferencePool;

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::cache::{CacheStatus, ResultCache};
use crate::config::Config;
use crate::hashing::preview;
use crate::pipeline::{ClaimClassifier, ClassificationResult};

/// A result plus whether it came from the cache.
#[derive(Debug, Clone)]
pub struct Classified {
    pub result: Arc<ClassificationResult>,
    pub cache: CacheStatus,
}

#[derive(Debug, Clone)]
pub struct Dispatcher {
    classifier: Arc<ClaimClassifier>,
    cache: Arc<ResultCache>,
    pool: InferencePool,
    max_input_chars: usize,
}

impl Dispatcher {
    pub fn new(
        classifier: Arc<ClaimClassifier>,
        cache: Arc<ResultCache>,
        pool: InferencePool,
        max_input_chars: usize,
    ) -> Self {
        Self {
            classifier,
            cache,
            pool,
            max_input_chars,
        }
    }

    pub fn from_config(
        config: &Config,
        classifier: Arc<ClaimClassifier>,
        cache: Arc<ResultCache>,
    ) -> Self {
        Self::new(
            classifier,
            cache,
            InferencePool::new(config.worker_pool_size, config.inference_timeout()),
            config.max_input_chars,
        )
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    pub fn pool(&self) -> &InferencePool {
        &self.pool
    }

    /// Rejects empty and oversized input.
    pub fn validate_input(&self, text: &str) -> Result<(), DispatchError> {
        if text.trim().is_empty() {
            return Err(DispatchError::InvalidInput {
                reason: "text must not be empty".to_string(),
            });
        }

        let chars = text.chars().count();
        if chars > self.max_input_chars {
            return Err(DispatchError::InvalidInput {
                reason: format!(
                    "text is {} characters; the limit is {}",
                    chars, self.max_input_chars
                ),
            });
        }

        Ok(())
    }

    #[instrument(skip_all, fields(text = %preview(text)))]
    pub async fn classify(&self, text: &str) -> Result<Classified, DispatchError> {
        self.validate_input(text)?;

        if let Some(result) = self.cache.get(text) {
            debug!("Serving cached classification");
            return Ok(Classified {
                result,
                cache: CacheStatus::Hit,
            });
        }

        let classifier = Arc::clone(&self.classifier);
        let owned = text.to_string();
        let result = self
            .pool
            .run(move |cancel| classifier.classify(&owned, cancel))
            .await??;

        let result = Arc::new(result);
        self.cache.put(text, Arc::clone(&result));

        Ok(Classified {
            result,
            cache: CacheStatus::Miss,
        })
    }
}
