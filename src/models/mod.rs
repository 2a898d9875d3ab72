//! Process-wide holder of the encoder, the entailment scorer, and the knowledge base.
//!
//! [`ModelManager`] loads everything once through a [`ModelProvider`] and then
//! hands out shared read-only handles. Concurrent first callers of
//! [`ModelManager::load_models`] block on the same initialization, so the
//! provider runs at most once per successful load.

pub mod error;


pub use error::ModelError;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::{info, warn};

use crate::config::Config;
use crate::constants::validate_embedding_dim;
use crate::embedding::{
    EncoderConfig, EntailmentModel, NliClassifier, NliConfig, SentenceEmbedder, TextEncoder,
};
use crate::index::{FlatIpIndex, KnowledgeBase, VectorIndex};

/// Everything the pipeline reads during inference.
#[derive(Clone)]
pub struct LoadedModels {
    pub encoder: Arc<dyn TextEncoder>,
    pub nli: Arc<dyn EntailmentModel>,
    pub index: Arc<dyn VectorIndex>,
    pub kb: Arc<KnowledgeBase>,
}

impl LoadedModels {
    /// Checks that the encoder and the index agree on vector size.
    fn validate(&self) -> Result<(), ModelError> {
        validate_embedding_dim(self.encoder.dim(), self.index.dim())
            .map_err(|e| ModelError::load_failed("vector index", e))?;

        if self.index.len() != self.kb.len() {
            warn!(
                vectors = self.index.len(),
                snippets = self.kb.len(),
                "Index and snippet metadata differ in length; unmatched ids will be skipped"
            );
        }

        Ok(())
    }
}

impl fmt::Debug for LoadedModels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedModels")
            .field("dim", &self.index.dim())
            .field("vectors", &self.index.len())
            .field("snippets", &self.kb.len())
            .field("encoder_stub", &self.encoder.is_stub())
            .field("nli_stub", &self.nli.is_stub())
            .finish()
    }
}

/// Source of the loaded capabilities.
pub trait ModelProvider: Send + Sync {
    fn load(&self) -> Result<LoadedModels, ModelError>;
}

/// Loads the persisted index, the snippet JSON, and the candle models.
#[derive(Debug, Clone)]
pub struct ArtifactProvider {
    pub index_path: PathBuf,
    pub snippets_path: PathBuf,
    pub encoder: EncoderConfig,
    pub nli: NliConfig,
}

impl ArtifactProvider {
    pub fn from_config(config: &Config) -> Self {
        let encoder = match &config.embed_model_path {
            Some(dir) => EncoderConfig::new(dir),
            None => EncoderConfig::stub(),
        };
        let nli = match &config.nli_model_path {
            Some(dir) => NliConfig::new(dir),
            None => NliConfig::stub(),
        };

        Self {
            index_path: config.index_path.clone(),
            snippets_path: config.snippets_path.clone(),
            encoder,
            nli,
        }
    }
}

impl ModelProvider for ArtifactProvider {
    fn load(&self) -> Result<LoadedModels, ModelError> {
        let index = FlatIpIndex::open(&self.index_path)
            .map_err(|e| ModelError::load_failed("vector index", e))?;
        let kb = KnowledgeBase::load(&self.snippets_path)
            .map_err(|e| ModelError::load_failed("snippet metadata", e))?;
        let encoder = SentenceEmbedder::load(self.encoder.clone())
            .map_err(|e| ModelError::load_failed("embedding model", e))?;
        let nli = NliClassifier::load(self.nli.clone())
            .map_err(|e| ModelError::load_failed("entailment model", e))?;

        Ok(LoadedModels {
            encoder: Arc::new(encoder),
            nli: Arc::new(nli),
            index: Arc::new(index),
            kb: Arc::new(kb),
        })
    }
}

pub struct ModelManager {
    provider: Option<Box<dyn ModelProvider>>,
    models: OnceCell<LoadedModels>,
}

impl fmt::Debug for ModelManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelManager")
            .field("models", &self.models.get())
            .finish()
    }
}

impl ModelManager {
    /// Unloaded manager; call [`load_models`](Self::load_models) before serving.
    pub fn new(provider: impl ModelProvider + 'static) -> Self {
        Self {
            provider: Some(Box::new(provider)),
            models: OnceCell::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(ArtifactProvider::from_config(config))
    }

    /// Already-loaded manager over the given capabilities.
    pub fn from_parts(
        encoder: Arc<dyn TextEncoder>,
        nli: Arc<dyn EntailmentModel>,
        index: Arc<dyn VectorIndex>,
        kb: Arc<KnowledgeBase>,
    ) -> Result<Self, ModelError> {
        let models = LoadedModels {
            encoder,
            nli,
            index,
            kb,
        };
        models.validate()?;

        Ok(Self {
            provider: None,
            models: OnceCell::with_value(models),
        })
    }

    /// Loads every capability; a no-op once loaded. Blocking.
    pub fn load_models(&self) -> Result<(), ModelError> {
        self.models.get_or_try_init(|| {
            let provider = self.provider.as_ref().ok_or_else(|| ModelError::LoadFailed {
                component: "models",
                reason: "no provider configured".to_string(),
            })?;

            let models = provider.load()?;
            models.validate()?;

            info!(
                dim = models.index.dim(),
                vectors = models.index.len(),
                snippets = models.kb.len(),
                encoder_stub = models.encoder.is_stub(),
                nli_stub = models.nli.is_stub(),
                "Models loaded"
            );
            Ok::<_, ModelError>(models)
        })?;

        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.models.get().is_some()
    }

    /// All capabilities at once.
    pub fn models(&self) -> Result<&LoadedModels, ModelError> {
        self.models.get().ok_or(ModelError::NotLoaded {
            component: "models",
        })
    }

    pub fn get_embed_model(&self) -> Result<Arc<dyn TextEncoder>, ModelError> {
        self.models
            .get()
            .map(|m| Arc::clone(&m.encoder))
            .ok_or(ModelError::NotLoaded {
                component: "embedding model",
            })
    }

    pub fn get_nli(&self) -> Result<Arc<dyn EntailmentModel>, ModelError> {
        self.models
            .get()
            .map(|m| Arc::clone(&m.nli))
            .ok_or(ModelError::NotLoaded {
                component: "entailment model",
            })
    }

    pub fn get_index(&self) -> Result<Arc<dyn VectorIndex>, ModelError> {
        self.models
            .get()
            .map(|m| Arc::clone(&m.index))
            .ok_or(ModelError::NotLoaded {
                component: "vector index",
            })
    }

    pub fn get_snippets(&self) -> Result<Arc<KnowledgeBase>, ModelError> {
        self.models
            .get()
            .map(|m| Arc::clone(&m.kb))
            .ok_or(ModelError::NotLoaded {
                component: "snippet metadata",
            })
    }
}
