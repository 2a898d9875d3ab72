use std::sync::Arc;

use crate::cache::ResultCache;
use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::gateway::rate_limit::ClientRateLimiter;
use crate::models::ModelManager;
use crate::pipeline::ClaimClassifier;

#[derive(Clone, Debug)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,

    pub models: Arc<ModelManager>,

    pub limiter: ClientRateLimiter,
}

impl AppState {
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        models: Arc<ModelManager>,
        limiter: ClientRateLimiter,
    ) -> Self {
        Self {
            dispatcher,
            models,
            limiter,
        }
    }

    /// Wires the classifier, result cache, and dispatcher around `models`.
    pub fn from_config(config: &Config, models: Arc<ModelManager>) -> Self {
        let classifier = Arc::new(ClaimClassifier::new(
            Arc::clone(&models),
            config.pipeline_options(),
        ));
        let cache = Arc::new(ResultCache::from_config(config));
        let dispatcher = Arc::new(Dispatcher::from_config(config, classifier, cache));

        Self::new(
            dispatcher,
            models,
            ClientRateLimiter::per_minute(config.rate_limit_per_minute),
        )
    }
}
