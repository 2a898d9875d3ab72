//! Scripted entailment model for tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::{EntailmentModel, LabelScore, NliModelError};

/// Answers by the first rule whose needle occurs in `premise`, else a default.
#[derive(Debug)]
pub struct ScriptedEntailment {
    rules: Vec<(String, Vec<LabelScore>)>,
    default: Vec<LabelScore>,
    fail_on: Option<String>,
    delay: Duration,
    calls: AtomicUsize,
}

/// `[entailment, contradiction, neutral]` in the lowercase naming some checkpoints use.
pub fn distribution(entailment: f32, contradiction: f32, neutral: f32) -> Vec<LabelScore> {
    vec![
        LabelScore::new("entailment", entailment),
        LabelScore::new("contradiction", contradiction),
        LabelScore::new("neutral", neutral),
    ]
}

impl Default for ScriptedEntailment {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            default: distribution(0.1, 0.1, 0.8),
            fail_on: None,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }
}

impl ScriptedEntailment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn when_premise(mut self, needle: impl Into<String>, scores: Vec<LabelScore>) -> Self {
        self.rules.push((needle.into(), scores));
        self
    }

    pub fn with_default(mut self, scores: Vec<LabelScore>) -> Self {
        self.default = scores;
        self
    }

    /// Hypotheses containing `marker` fail with [`NliModelError::InferenceFailed`].
    pub fn failing_on(mut self, marker: impl Into<String>) -> Self {
        self.fail_on = Some(marker.into());
        self
    }

    /// Blocks the calling thread for `delay` on every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl EntailmentModel for ScriptedEntailment {
    fn classify(&self, premise: &str, hypothesis: &str) -> Result<Vec<LabelScore>, NliModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }

        if let Some(marker) = &self.fail_on
            && hypothesis.contains(marker.as_str())
        {
            return Err(NliModelError::InferenceFailed {
                reason: "scripted scorer failure".to_string(),
            });
        }

        Ok(self
            .rules
            .iter()
            .find(|(needle, _)| premise.contains(needle.as_str()))
            .map(|(_, scores)| scores.clone())
            .unwrap_or_else(|| self.default.clone()))
    }
}
