use candle::{DType, Device, Module, Result, Tensor};
use candle_core as candle;
use candle_core::IndexOp;
use candle_nn::{Linear, VarBuilder};
use candle_transformers::models::bert::{BertModel, Config};
use std::path::Path;
use std::sync::Arc;

/// Reads `config.json` and memory-maps `model.safetensors` from `model_dir`.
fn open_model_dir<'a>(model_dir: &Path, device: &Device) -> Result<(Config, VarBuilder<'a>)> {
    let config_content = std::fs::read_to_string(model_dir.join("config.json"))?;
    let config: Config = serde_json::from_str(&config_content)
        .map_err(|e| candle::Error::Msg(format!("Failed to parse config: {}", e)))?;

    let weights_path = model_dir.join("model.safetensors");
    let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, device)? };

    Ok((config, vb))
}

/// Loads the transformer trunk, whichever prefix the checkpoint uses.
fn load_trunk(vb: &VarBuilder, config: &Config) -> Result<BertModel> {
    if vb.contains_tensor("bert.embeddings.word_embeddings.weight") {
        BertModel::load(vb.pp("bert"), config)
    } else if vb.contains_tensor("roberta.embeddings.word_embeddings.weight") {
        BertModel::load(vb.pp("roberta"), config)
    } else {
        BertModel::load(vb.clone(), config)
    }
}

/// Bare BERT trunk used for sentence embeddings.
#[derive(Clone)]
pub struct BertEncoder {
    model: Arc<BertModel>,
    hidden_size: usize,
}

impl BertEncoder {
    pub fn load<P: AsRef<Path>>(model_dir: P, device: &Device) -> Result<Self> {
        let (config, vb) = open_model_dir(model_dir.as_ref(), device)?;
        let model = load_trunk(&vb, &config)?;

        Ok(Self {
            model: Arc::new(model),
            hidden_size: config.hidden_size,
        })
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    /// Mean of the token states under `attention_mask`, shape `[batch, hidden]`.
    pub fn mean_pooled(
        &self,
        input_ids: &Tensor,
        token_type_ids: &Tensor,
        attention_mask: &Tensor,
    ) -> Result<Tensor> {
        let hidden = self
            .model
            .forward(input_ids, token_type_ids, Some(attention_mask))?;

        let mask = attention_mask.to_dtype(DType::F32)?.unsqueeze(2)?;
        let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
        let counts = mask.sum(1)?.clamp(1e-9f64, 1e9f64)?;
        summed.broadcast_div(&counts)
    }
}

enum ClassificationHead {
    /// BERT style: one linear layer on the `[CLS]` state.
    Linear(Linear),
    /// RoBERTa style: dense + tanh + projection on the `<s>` state.
    DenseProjection { dense: Linear, out_proj: Linear },
}

impl ClassificationHead {
    fn load(vb: &VarBuilder, hidden_size: usize, num_labels: usize) -> Result<Self> {
        if vb.contains_tensor("classifier.out_proj.weight") {
            let dense = candle_nn::linear(hidden_size, hidden_size, vb.pp("classifier.dense"))?;
            let out_proj =
                candle_nn::linear(hidden_size, num_labels, vb.pp("classifier.out_proj"))?;
            Ok(Self::DenseProjection { dense, out_proj })
        } else {
            let linear = candle_nn::linear(hidden_size, num_labels, vb.pp("classifier"))?;
            Ok(Self::Linear(linear))
        }
    }

    fn forward(&self, cls: &Tensor) -> Result<Tensor> {
        match self {
            Self::Linear(linear) => linear.forward(cls),
            Self::DenseProjection { dense, out_proj } => {
                let hidden = dense.forward(cls)?.tanh()?;
                out_proj.forward(&hidden)
            }
        }
    }
}

struct SequenceClassifierImpl {
    bert: BertModel,
    head: ClassificationHead,
}

/// BERT/RoBERTa sequence classifier producing one logit per label.
#[derive(Clone)]
pub struct BertSequenceClassifier {
    inner: Arc<SequenceClassifierImpl>,
    num_labels: usize,
}

impl BertSequenceClassifier {
    pub fn load<P: AsRef<Path>>(model_dir: P, num_labels: usize, device: &Device) -> Result<Self> {
        let (config, vb) = open_model_dir(model_dir.as_ref(), device)?;
        let bert = load_trunk(&vb, &config)?;
        let head = ClassificationHead::load(&vb, config.hidden_size, num_labels)?;

        Ok(Self {
            inner: Arc::new(SequenceClassifierImpl { bert, head }),
            num_labels,
        })
    }

    pub fn num_labels(&self) -> usize {
        self.num_labels
    }

    /// Logits of shape `[batch, num_labels]`.
    pub fn forward(
        &self,
        input_ids: &Tensor,
        token_type_ids: &Tensor,
        attention_mask: Option<&Tensor>,
    ) -> Result<Tensor> {
        let output = self
            .inner
            .bert
            .forward(input_ids, token_type_ids, attention_mask)?;
        let cls_token = output.i((.., 0, ..))?;
        self.inner.head.forward(&cls_token)
    }
}
