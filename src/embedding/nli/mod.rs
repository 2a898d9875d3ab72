//! Natural-language-inference scorer.
//!
//! [`NliClassifier`] runs a BERT/RoBERTa MNLI checkpoint over a
//! `(premise, hypothesis)` pair and returns the full label distribution.
//! Without a model path it runs a lexical stub that agrees with the real
//! model on the easy cases (paraphrase, wrong number, flipped negation).

pub mod config;
pub mod error;

#[cfg(any(test, feature = "mock"))]
pub mod mock;


pub use config::{DEFAULT_LABELS, NliConfig};
pub use error::NliModelError;
#[cfg(any(test, feature = "mock"))]
pub use mock::{ScriptedEntailment, distribution};

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use candle_core::{D, Tensor};
use serde::{Deserialize, Serialize};
use tokenizers::Tokenizer;
use tracing::{debug, info};

use crate::constants::CONTEXT_FRAMING_PREFIX;
use crate::embedding::bert::BertSequenceClassifier;
use crate::embedding::device::{device_label, select_device};
use crate::embedding::utils::{NEGATIONS, content_words, load_tokenizer_with_truncation, words};

/// Probability mass the scorer assigned to one label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f32,
}

impl LabelScore {
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// Scores how strongly a premise supports a hypothesis.
pub trait EntailmentModel: Send + Sync {
    /// Label distribution for `(premise, hypothesis)`. Label names are model-defined.
    fn classify(&self, premise: &str, hypothesis: &str) -> Result<Vec<LabelScore>, NliModelError>;

    fn is_stub(&self) -> bool {
        false
    }
}

#[derive(Deserialize)]
struct LabelMap {
    #[serde(default)]
    id2label: BTreeMap<String, String>,
}

/// Reads `id2label` from `config.json`, ordered by label id.
fn read_labels(model_path: &Path) -> Result<Vec<String>, NliModelError> {
    let raw = std::fs::read_to_string(model_path.join("config.json"))?;
    let map: LabelMap =
        serde_json::from_str(&raw).map_err(|e| NliModelError::ModelLoadFailed {
            reason: format!("Failed to parse config.json: {}", e),
        })?;

    if map.id2label.is_empty() {
        return Ok(DEFAULT_LABELS.iter().map(|l| l.to_string()).collect());
    }

    let mut indexed = Vec::with_capacity(map.id2label.len());
    for (id, label) in map.id2label {
        let id: usize = id.parse().map_err(|_| NliModelError::ModelLoadFailed {
            reason: format!("id2label key '{}' is not an integer", id),
        })?;
        indexed.push((id, label));
    }
    indexed.sort_by_key(|(id, _)| *id);

    if indexed.iter().enumerate().any(|(pos, (id, _))| pos != *id) {
        return Err(NliModelError::ModelLoadFailed {
            reason: "id2label ids must be contiguous from 0".to_string(),
        });
    }

    Ok(indexed.into_iter().map(|(_, label)| label).collect())
}

pub struct NliClassifier {
    device: candle_core::Device,
    config: NliConfig,
    labels: Vec<String>,
    model: Option<BertSequenceClassifier>,
    tokenizer: Option<Tokenizer>,
}

impl std::fmt::Debug for NliClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NliClassifier")
            .field("device", &device_label(&self.device))
            .field("config", &self.config)
            .field("labels", &self.labels)
            .field("model_loaded", &self.model.is_some())
            .finish()
    }
}

impl NliClassifier {
    pub fn load(config: NliConfig) -> Result<Self, NliModelError> {
        if let Err(msg) = config.validate() {
            return Err(NliModelError::InvalidConfig { reason: msg });
        }

        let Some(model_path) = config.model_path.clone() else {
            info!("No entailment model path configured, operating in stub mode");
            return Ok(Self::create_stub(config));
        };

        if !model_path.exists() {
            return Err(NliModelError::ModelNotFound { path: model_path });
        }

        for file in ["config.json", "model.safetensors"] {
            if !model_path.join(file).exists() {
                return Err(NliModelError::ModelLoadFailed {
                    reason: format!("Missing {} in {}", file, model_path.display()),
                });
            }
        }

        let device = select_device()?;
        debug!(device = device_label(&device), "Selected compute device for NLI");

        let labels = read_labels(&model_path)?;

        info!(
            model_path = %model_path.display(),
            labels = ?labels,
            "Loading entailment model"
        );

        let model = BertSequenceClassifier::load(&model_path, labels.len(), &device).map_err(
            |e| NliModelError::ModelLoadFailed {
                reason: format!("Failed to load sequence classifier: {}", e),
            },
        )?;

        let tokenizer = load_tokenizer_with_truncation(&model_path, config.max_seq_len)
            .map_err(|e| NliModelError::ModelLoadFailed {
                reason: format!("Failed to load tokenizer: {}", e),
            })?;

        info!(num_labels = labels.len(), "Entailment model loaded successfully");

        Ok(Self {
            device,
            config,
            labels,
            model: Some(model),
            tokenizer: Some(tokenizer),
        })
    }

    pub fn stub() -> Result<Self, NliModelError> {
        Self::load(NliConfig::stub())
    }

    fn create_stub(config: NliConfig) -> Self {
        Self {
            device: candle_core::Device::Cpu,
            config,
            labels: DEFAULT_LABELS.iter().map(|l| l.to_string()).collect(),
            model: None,
            tokenizer: None,
        }
    }

    pub fn is_model_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    fn classify_with_model(
        &self,
        model: &BertSequenceClassifier,
        tokenizer: &Tokenizer,
        premise: &str,
        hypothesis: &str,
    ) -> Result<Vec<LabelScore>, NliModelError> {
        let tokens = tokenizer.encode((premise, hypothesis), true).map_err(|e| {
            NliModelError::TokenizationFailed {
                reason: e.to_string(),
            }
        })?;

        let token_ids = Tensor::new(tokens.get_ids(), &self.device)?.unsqueeze(0)?;
        let type_ids = Tensor::new(tokens.get_type_ids(), &self.device)?.unsqueeze(0)?;
        let attention_mask =
            Tensor::new(tokens.get_attention_mask(), &self.device)?.unsqueeze(0)?;

        let logits = model.forward(&token_ids, &type_ids, Some(&attention_mask))?;
        let probs = candle_nn::ops::softmax(&logits, D::Minus1)?
            .squeeze(0)?
            .to_vec1::<f32>()?;

        Ok(self
            .labels
            .iter()
            .zip(probs)
            .map(|(label, score)| LabelScore::new(label.clone(), score))
            .collect())
    }

    /// Lexical stand-in for an MNLI model.
    ///
    /// Recall of the hypothesis' content words in the premise drives entailment.
    /// A number in the hypothesis that the premise does not contain, or a negation
    /// present on only one side, turns a well-covered pair into a contradiction.
    fn classify_stub(&self, premise: &str, hypothesis: &str) -> Vec<LabelScore> {
        let hypothesis = hypothesis
            .strip_prefix(CONTEXT_FRAMING_PREFIX)
            .unwrap_or(hypothesis);

        let hyp_words: HashSet<String> = content_words(hypothesis).into_iter().collect();
        let prem_words: HashSet<String> = content_words(premise).into_iter().collect();

        let is_number = |w: &String| w.chars().all(|c| c.is_ascii_digit());
        let hyp_numbers: HashSet<&String> = hyp_words.iter().filter(|w| is_number(w)).collect();
        let prem_numbers: HashSet<&String> = prem_words.iter().filter(|w| is_number(w)).collect();

        let terms: Vec<&String> = hyp_words.iter().filter(|w| !is_number(w)).collect();
        let recall = if terms.is_empty() {
            0.0
        } else {
            terms.iter().filter(|w| prem_words.contains(**w)).count() as f32 / terms.len() as f32
        };

        let number_conflict = !prem_numbers.is_empty()
            && hyp_numbers.iter().any(|n| !prem_numbers.contains(n));
        let negated = |text: &str| words(text).iter().any(|w| NEGATIONS.contains(&w.as_str()));
        let negation_conflict = negated(hypothesis) != negated(premise);

        let (entailment, contradiction) =
            if (number_conflict || negation_conflict) && recall >= 0.5 {
                (0.02, 0.6 + 0.35 * recall)
            } else {
                let e = 1.0 / (1.0 + (-8.0 * (recall - 0.5)).exp());
                (e.min(0.97), 0.01)
            };
        let neutral = (1.0 - entailment - contradiction).max(0.0);

        vec![
            LabelScore::new(DEFAULT_LABELS[0], contradiction),
            LabelScore::new(DEFAULT_LABELS[1], neutral),
            LabelScore::new(DEFAULT_LABELS[2], entailment),
        ]
    }
}

impl EntailmentModel for NliClassifier {
    fn classify(&self, premise: &str, hypothesis: &str) -> Result<Vec<LabelScore>, NliModelError> {
        debug!(
            premise_len = premise.len(),
            hypothesis_len = hypothesis.len(),
            model_loaded = self.model.is_some(),
            "Scoring premise-hypothesis pair"
        );

        match (&self.model, &self.tokenizer) {
            (Some(model), Some(tokenizer)) => {
                self.classify_with_model(model, tokenizer, premise, hypothesis)
            }
            _ => Ok(self.classify_stub(premise, hypothesis)),
        }
    }

    fn is_stub(&self) -> bool {
        self.model.is_none()
    }
}
