//! Transformer scientific NER extractor (§4.4): a BERT-family token
//! classification model run locally through Candle, no Python/Docker
//! dependency. Produces GENE, PROTEIN, DISEASE, and CHEMICAL spans with
//! per-span probability.

use std::collections::HashMap;

use candle_core::{DType, Device, Module, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert;
use hf_hub::api::tokio::Api;
use sbkg_common::EntityType;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use crate::extractor::{CandidateSpan, Extractor};

const EXTRACTOR_TAG: &str = "transformer_scientific";

/// Default scientific NER model: disease/chemical/gene detection fine-tune
/// shared across the OpenMed BERT family.
pub const DEFAULT_MODEL_ID: &str = "OpenMed/OpenMed-NER-PharmaDetect-SuperClinical-434M";

pub struct TransformerExtractor {
    model: bert::BertModel,
    classifier: candle_nn::Linear,
    tokenizer: Tokenizer,
    id2label: HashMap<u32, String>,
    device: Device,
    max_length: usize,
}

impl TransformerExtractor {
    /// Downloads tokenizer/config/weights from the Hugging Face Hub (cached
    /// locally by `hf-hub` after the first run) and builds the model on CPU.
    pub async fn load(model_id: &str) -> anyhow::Result<Self> {
        let start = std::time::Instant::now();
        info!(model_id, "loading transformer NER model");

        let api = Api::new()?;
        let repo = api.model(model_id.to_string());

        let config_path = repo.get("config.json").await?;
        let config_json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(config_path)?)?;

        let id2label: HashMap<u32, String> = config_json["id2label"]
            .as_object()
            .map(|obj| {
                obj.iter()
                    .filter_map(|(k, v)| Some((k.parse().ok()?, v.as_str()?.to_string())))
                    .collect()
            })
            .ok_or_else(|| anyhow::anyhow!("model config has no id2label"))?;
        let num_labels = id2label.len();
        let hidden_size = config_json["hidden_size"].as_u64().unwrap_or(768) as usize;
        let num_hidden_layers = config_json["num_hidden_layers"].as_u64().unwrap_or(12) as usize;
        let num_attention_heads = config_json["num_attention_heads"].as_u64().unwrap_or(12) as usize;
        let intermediate_size = config_json["intermediate_size"].as_u64().unwrap_or(3072) as usize;
        let vocab_size = config_json["vocab_size"].as_u64().unwrap_or(30522) as usize;
        let max_position_embeddings = config_json["max_position_embeddings"].as_u64().unwrap_or(512) as usize;

        let tokenizer_path = repo.get("tokenizer.json").await?;
        let tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| anyhow::anyhow!("{e}"))?;

        let weights_path = repo.get("model.safetensors").await?;
        let device = Device::Cpu;
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device)? };

        let bert_config = bert::Config {
            vocab_size,
            hidden_size,
            num_hidden_layers,
            num_attention_heads,
            intermediate_size,
            hidden_act: bert::HiddenAct::Gelu,
            hidden_dropout_prob: 0.1,
            max_position_embeddings,
            type_vocab_size: 2,
            initializer_range: 0.02,
            layer_norm_eps: 1e-12,
            pad_token_id: 0,
            position_embedding_type: bert::PositionEmbeddingType::Absolute,
            use_cache: false,
            classifier_dropout: None,
            model_type: Some("bert".to_string()),
        };
        let model = bert::BertModel::load(vb.pp("bert"), &bert_config)?;
        let classifier = candle_nn::linear(hidden_size, num_labels, vb.pp("classifier"))?;

        info!(elapsed = ?start.elapsed(), "transformer NER model loaded");
        Ok(Self { model, classifier, tokenizer, id2label, device, max_length: 512 })
    }

    fn map_label(label: &str) -> Option<EntityType> {
        let clean = label.trim_start_matches("B-").trim_start_matches("I-");
        match clean.to_uppercase().as_str() {
            "GENE" | "GGP" | "GENE_OR_GENE_PRODUCT" | "DNA" | "RNA" => Some(EntityType::Gene),
            "PROTEIN" => Some(EntityType::Protein),
            "DISEASE" | "SPECIFICDISEASE" | "DISEASECLASS" => Some(EntityType::Disease),
            "CHEMICAL" | "SIMPLE_CHEMICAL" | "DRUG" => Some(EntityType::Chemical),
            _ => None,
        }
    }
}

impl Extractor for TransformerExtractor {
    fn tag(&self) -> &'static str {
        EXTRACTOR_TAG
    }

    fn extract(&self, text: &str) -> anyhow::Result<Vec<CandidateSpan>> {
        let encoding = self.tokenizer.encode(text, false).map_err(|e| anyhow::anyhow!("{e}"))?;
        let mut input_ids: Vec<u32> = encoding.get_ids().to_vec();
        input_ids.truncate(self.max_length);
        if input_ids.is_empty() {
            return Ok(Vec::new());
        }
        let seq_len = input_ids.len();

        let input_ids_tensor = Tensor::new(&input_ids[..], &self.device)?.unsqueeze(0)?;
        let attention_mask = Tensor::ones((1, seq_len), DType::F32, &self.device)?;
        let token_type_ids = Tensor::zeros((1, seq_len), DType::U32, &self.device)?;

        let hidden_states = self.model.forward(&input_ids_tensor, &token_type_ids, Some(&attention_mask))?;
        let logits = self.classifier.forward(&hidden_states)?;
        let probs = candle_nn::ops::softmax(&logits, 2)?;
        let max_scores = probs.max(2)?.to_vec2::<f32>()?;
        let max_indices = logits.argmax(2)?.to_vec2::<u32>()?;

        debug!(seq_len, "transformer NER forward pass done");
        Ok(self.decode_bio(&max_scores[0], &max_indices[0], &encoding, text))
    }
}

impl TransformerExtractor {
    fn decode_bio(
        &self,
        scores: &[f32],
        label_indices: &[u32],
        encoding: &tokenizers::Encoding,
        text: &str,
    ) -> Vec<CandidateSpan> {
        let offsets = encoding.get_offsets();
        let special = encoding.get_special_tokens_mask();
        let word_ids = encoding.get_word_ids();

        let mut spans = Vec::new();
        let mut current: Option<(EntityType, usize, usize, f32)> = None;
        let mut last_word_id: Option<u32> = None;

        let flush = |current: &mut Option<(EntityType, usize, usize, f32)>, spans: &mut Vec<CandidateSpan>| {
            if let Some((entity_type, start, end, score)) = current.take() {
                if start < text.len() && end <= text.len() && start < end {
                    spans.push(CandidateSpan {
                        start,
                        end,
                        surface: text[start..end].to_string(),
                        entity_type,
                        confidence: score as f64,
                        extractor_tag: EXTRACTOR_TAG,
                    });
                }
            }
        };

        for (i, &label_idx) in label_indices.iter().enumerate() {
            if i < special.len() && special[i] == 1 {
                continue;
            }
            if i >= scores.len() || i >= offsets.len() {
                continue;
            }
            let word_id = word_ids.get(i).copied().flatten();
            if let Some(wid) = word_id {
                if Some(wid) == last_word_id {
                    if let Some((_, _, ref mut end, _)) = current {
                        *end = offsets[i].1;
                    }
                    continue;
                }
                last_word_id = Some(wid);
            }

            let label = self.id2label.get(&label_idx).map(String::as_str).unwrap_or("O");
            let (start, end) = offsets[i];
            let entity_type = Self::map_label(label);
            let is_begin = label.starts_with("B-") || (!label.starts_with("I-") && entity_type.is_some());

            match entity_type {
                Some(et) if is_begin => {
                    flush(&mut current, &mut spans);
                    current = Some((et, start, end, scores[i]));
                }
                Some(et) => {
                    if let Some((cur_type, _, ref mut cur_end, ref mut cur_score)) = current {
                        if cur_type == et {
                            *cur_end = end;
                            *cur_score = cur_score.min(scores[i]);
                        } else {
                            flush(&mut current, &mut spans);
                            current = Some((et, start, end, scores[i]));
                        }
                    } else {
                        current = Some((et, start, end, scores[i]));
                    }
                }
                None => flush(&mut current, &mut spans),
            }
        }
        flush(&mut current, &mut spans);
        spans
    }
}
