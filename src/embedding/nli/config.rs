use std::path::PathBuf;

use crate::constants::DEFAULT_NLI_MAX_SEQ_LEN;

/// Label order used when a checkpoint ships no `id2label` (MNLI convention).
pub const DEFAULT_LABELS: [&str; 3] = ["CONTRADICTION", "NEUTRAL", "ENTAILMENT"];

#[derive(Debug, Clone)]
pub struct NliConfig {
    /// Model directory; `None` selects the lexical stub.
    pub model_path: Option<PathBuf>,

    /// Token budget for the (premise, hypothesis) pair.
    pub max_seq_len: usize,
}

impl Default for NliConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            max_seq_len: DEFAULT_NLI_MAX_SEQ_LEN,
        }
    }
}

impl NliConfig {
    pub fn new<P: Into<PathBuf>>(model_path: P) -> Self {
        Self {
            model_path: Some(model_path.into()),
            ..Default::default()
        }
    }

    pub fn stub() -> Self {
        Self::default()
    }

    pub fn with_max_seq_len(mut self, max_seq_len: usize) -> Self {
        self.max_seq_len = max_seq_len;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_seq_len < 8 {
            return Err(format!(
                "max_seq_len must be at least 8, got {}",
                self.max_seq_len
            ));
        }

        if let Some(ref path) = self.model_path
            && path.as_os_str().is_empty()
        {
            return Err("model_path cannot be empty when provided".to_string());
        }

        Ok(())
    }
}
