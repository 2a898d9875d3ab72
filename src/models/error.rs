use thiserror::Error;

/// Errors from the shared model holder.
#[derive(Debug, Error)]
pub enum ModelError {
    /// An accessor ran before [`load_models`](super::ModelManager::load_models) completed.
    #[error("{component} not loaded")]
    NotLoaded { component: &'static str },

    /// Loading an artifact or model failed. Fatal at startup.
    #[error("failed to load {component}: {reason}")]
    LoadFailed {
        component: &'static str,
        reason: String,
    },
}

impl ModelError {
    pub fn load_failed(component: &'static str, err: impl std::fmt::Display) -> Self {
        ModelError::LoadFailed {
            component,
            reason: err.to_string(),
        }
    }
}
