//! Generative relevance validator (T5).
//!
//! Given a query and a candidate answer the model generates a short verdict; an answer is
//! relevant when the verdict equals [`AFFIRMATIVE_ANSWER`] and the first-step confidence
//! reaches the configured threshold.

pub mod config;
pub mod error;

#[cfg(test)]
mod tests;

pub use config::{DEFAULT_THRESHOLD, ValidatorConfig};
pub use error::ValidatorError;

use std::collections::HashSet;

use candle_core::{D, DType, Device, IndexOp, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::t5;
use parking_lot::Mutex;
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

use crate::constants::{AFFIRMATIVE_ANSWER, AFFIRMATIVE_LOGIT_INDEX, NEGATIVE_ANSWER};
use crate::embedding::device::select_device;
use crate::embedding::utils::load_tokenizer_with_truncation;

/// Prompt fed to the validator.
pub fn relevance_prompt(query: &str, answer: &str) -> String {
    format!("{query} Document: {answer} Relevant: ")
}

/// Output of one validation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Judgement {
    /// Decoded verdict text.
    pub answer: String,
    /// Sigmoid of the first-step logit at [`AFFIRMATIVE_LOGIT_INDEX`].
    pub confidence: f32,
}

impl Judgement {
    pub fn is_affirmative(&self) -> bool {
        self.answer == AFFIRMATIVE_ANSWER
    }
}

struct LoadedModel {
    // Decoding mutates the key/value cache, so passes are serialized.
    model: Mutex<t5::T5ForConditionalGeneration>,
    tokenizer: Tokenizer,
    t5_config: t5::Config,
}

pub struct RelevanceValidator {
    device: Device,
    config: ValidatorConfig,
    model: Option<LoadedModel>,
}

impl std::fmt::Debug for RelevanceValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelevanceValidator")
            .field("device", &format!("{:?}", self.device))
            .field("config", &self.config)
            .field("model_loaded", &self.model.is_some())
            .finish()
    }
}

impl RelevanceValidator {
    pub fn load(config: ValidatorConfig) -> Result<Self, ValidatorError> {
        if let Err(msg) = config.validate() {
            return Err(ValidatorError::InvalidConfig { reason: msg });
        }

        let device = select_device();
        debug!(?device, "Selected compute device for validator");

        let Some(model_dir) = config.model_dir.clone() else {
            warn!("No validator model configured, operating in stub mode");
            return Ok(Self {
                device,
                config,
                model: None,
            });
        };

        for file in ["config.json", "model.safetensors"] {
            if !model_dir.join(file).is_file() {
                return Err(ValidatorError::ModelLoadFailed {
                    reason: format!("Missing {file} in {}", model_dir.display()),
                });
            }
        }

        let config_content = std::fs::read_to_string(model_dir.join("config.json")).map_err(
            |e| ValidatorError::ModelLoadFailed {
                reason: format!("Failed to read config: {e}"),
            },
        )?;
        let t5_config: t5::Config =
            serde_json::from_str(&config_content).map_err(|e| ValidatorError::ModelLoadFailed {
                reason: format!("Failed to parse config: {e}"),
            })?;

        let weights = model_dir.join("model.safetensors");
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[weights], DType::F32, &device)? };
        let model = t5::T5ForConditionalGeneration::load(vb, &t5_config).map_err(|e| {
            ValidatorError::ModelLoadFailed {
                reason: format!("Failed to load T5 model: {e}"),
            }
        })?;

        let tokenizer_path = config.tokenizer_location().unwrap_or(&model_dir);
        let tokenizer = load_tokenizer_with_truncation(tokenizer_path, config.max_seq_len)
            .map_err(|e| ValidatorError::TokenizationFailed {
                reason: format!("Failed to load tokenizer: {e}"),
            })?;

        info!(
            model_dir = %model_dir.display(),
            threshold = config.threshold,
            max_length = config.max_length,
            "Relevance validator loaded"
        );

        Ok(Self {
            device,
            config,
            model: Some(LoadedModel {
                model: Mutex::new(model),
                tokenizer,
                t5_config,
            }),
        })
    }

    pub fn stub() -> Result<Self, ValidatorError> {
        Self::load(ValidatorConfig::stub())
    }

    /// Runs one validation pass for (`query`, `answer`).
    pub fn judge(&self, query: &str, answer: &str) -> Result<Judgement, ValidatorError> {
        let judgement = match &self.model {
            Some(loaded) => self.judge_with_model(loaded, &relevance_prompt(query, answer))?,
            None => Self::judge_stub(query, answer),
        };

        debug!(
            answer = %judgement.answer,
            confidence = judgement.confidence,
            "Validator verdict"
        );

        Ok(judgement)
    }

    /// Affirmative verdict with confidence at or above the threshold.
    pub fn accepts(&self, judgement: &Judgement) -> bool {
        judgement.is_affirmative() && judgement.confidence >= self.config.threshold
    }

    fn judge_with_model(
        &self,
        loaded: &LoadedModel,
        prompt: &str,
    ) -> Result<Judgement, ValidatorError> {
        let encoding =
            loaded
                .tokenizer
                .encode(prompt, true)
                .map_err(|e| ValidatorError::TokenizationFailed {
                    reason: e.to_string(),
                })?;

        let input_ids = Tensor::new(encoding.get_ids(), &self.device)?.unsqueeze(0)?;
        let cfg = &loaded.t5_config;
        let start_token = cfg.decoder_start_token_id.unwrap_or(cfg.pad_token_id) as u32;

        let mut model = loaded.model.lock();
        model.clear_kv_cache();
        let encoder_output = model.encode(&input_ids)?;

        let mut output_ids = vec![start_token];
        let mut confidence = None;

        while output_ids.len() < self.config.max_length {
            let decoder_input = match output_ids.last() {
                Some(last) if cfg.use_cache && output_ids.len() > 1 => {
                    Tensor::new(&[*last], &self.device)?.unsqueeze(0)?
                }
                _ => Tensor::new(output_ids.as_slice(), &self.device)?.unsqueeze(0)?,
            };

            let logits = model
                .decode(&decoder_input, &encoder_output)?
                .squeeze(0)?
                .to_dtype(DType::F32)?;

            if confidence.is_none() {
                let logit = logits.i(AFFIRMATIVE_LOGIT_INDEX)?.to_scalar::<f32>()?;
                confidence = Some(sigmoid(logit));
            }

            let next = logits.argmax(D::Minus1)?.to_scalar::<u32>()?;
            if next as usize == cfg.eos_token_id {
                break;
            }
            output_ids.push(next);
        }
        drop(model);

        let answer = loaded
            .tokenizer
            .decode(&output_ids[1..], true)
            .map_err(|e| ValidatorError::TokenizationFailed {
                reason: e.to_string(),
            })?
            .replace("</s>", "")
            .trim()
            .to_string();

        Ok(Judgement {
            answer,
            confidence: confidence.unwrap_or(0.0),
        })
    }

    /// Lexical stand-in: token Jaccard between query and answer as confidence.
    fn judge_stub(query: &str, answer: &str) -> Judgement {
        let query_tokens: HashSet<String> =
            query.split_whitespace().map(str::to_lowercase).collect();
        let answer_tokens: HashSet<String> =
            answer.split_whitespace().map(str::to_lowercase).collect();

        let union = query_tokens.union(&answer_tokens).count();
        let confidence = if union == 0 {
            0.0
        } else {
            query_tokens.intersection(&answer_tokens).count() as f32 / union as f32
        };

        let answer = if confidence > 0.0 {
            AFFIRMATIVE_ANSWER
        } else {
            NEGATIVE_ANSWER
        };

        Judgement {
            answer: answer.to_string(),
            confidence,
        }
    }

    pub fn is_model_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub fn threshold(&self) -> f32 {
        self.config.threshold
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    pub fn device(&self) -> &Device {
        &self.device
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
