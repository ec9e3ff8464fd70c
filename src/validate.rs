//! The top-level validation entry point.
//!
//! A [`Validator`] owns its collaborators (the vision model and the optional
//! OCR engine) and the configuration. It holds no mutable state and is shared
//! across requests behind an `Arc`.
//!
//! ## Request Flow
//!
//! ```text
//! bytes ─▶ prepare_upload ─▶ [ocr] ─▶ call_model ─▶ reconcile ─▶ ValidationResult
//!              │                          │
//!              └──── error ───────────────┴──▶ degraded result
//! ```
//!
//! [`Validator::validate`] never fails: every upstream failure becomes a
//! non-compliant result whose `metadata.error` says what went wrong.

use crate::config::ValidatorConfig;
use crate::error::{ModelCallError, PosterCheckError};
use crate::pipeline::encode::prepare_upload;
use crate::pipeline::llm::{call_model, LlmVisionModel, ModelRequest, VisionModel};
use crate::pipeline::ocr::{OcrEngine, TesseractOcr};
use crate::pipeline::reconcile::{reconcile, ReconcileContext, Reconciled};
use crate::prompts::DEFAULT_SYSTEM_PROMPT;
use crate::result::{AnalysisTrace, Metadata, SchemaValidation, ValidationResult};
use chrono::Utc;
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// `validationConfidence` reported when the model gave no usable answer.
const DEGRADED_CONFIDENCE: u32 = 50;

/// Validates poster images.
#[derive(Clone)]
pub struct Validator {
    model: Arc<dyn VisionModel>,
    ocr: Option<Arc<dyn OcrEngine>>,
    config: ValidatorConfig,
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("model", &self.config.model_id())
            .field("ocr", &self.ocr.is_some())
            .finish()
    }
}

impl Validator {
    /// Build a validator around an explicit model; OCR is off until
    /// [`Validator::with_ocr`] is called.
    pub fn new(model: Arc<dyn VisionModel>, config: ValidatorConfig) -> Self {
        Self {
            model,
            ocr: None,
            config,
        }
    }

    pub fn with_ocr(mut self, ocr: Arc<dyn OcrEngine>) -> Self {
        self.ocr = Some(ocr);
        self
    }

    /// Build a production validator: resolve the LLM provider and, when
    /// `enable_ocr` is set, attach the tesseract engine.
    pub async fn from_config(config: ValidatorConfig) -> Result<Self, PosterCheckError> {
        let provider = resolve_provider(&config).await?;
        info!(
            "Validator ready: model={}, ocr={}",
            config.model_id(),
            config.enable_ocr
        );

        let mut validator = Self::new(Arc::new(LlmVisionModel::new(provider)), config);
        if validator.config.enable_ocr {
            let ocr = TesseractOcr::new(
                validator.config.tesseract_binary.clone(),
                validator.config.ocr_languages.clone(),
            );
            validator = validator.with_ocr(Arc::new(ocr));
        }
        Ok(validator)
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Validate one uploaded image.
    pub async fn validate(&self, bytes: &[u8]) -> ValidationResult {
        self.validate_detailed(bytes).await.result
    }

    /// Like [`Validator::validate`], also returning the corrections the
    /// reconciler applied.
    pub async fn validate_detailed(&self, bytes: &[u8]) -> Reconciled {
        let start = Instant::now();
        info!("Validating upload of {} bytes", bytes.len());

        let (raw, ocr_used) = match self.ask_model(bytes).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!("Validation degraded: {}", e);
                return Reconciled {
                    result: degraded_result(&e, self.config.model_id()),
                    corrections: Vec::new(),
                };
            }
        };

        let ctx = ReconcileContext::new(self.config.model_id()).with_ocr(ocr_used);
        let reconciled = reconcile(raw, &ctx);

        if let Some(schema) = reconciled.result.schema_validation.as_ref() {
            for error in &schema.errors {
                warn!("Schema: {}", error);
            }
        }
        for correction in &reconciled.corrections {
            warn!("Correction applied: {}", correction);
        }
        info!(
            "Verdict: compliant={}, score={:?}, confidence={:?} in {:?}",
            reconciled.result.compliant(),
            reconciled.result.overall_score,
            reconciled.result.validation_confidence,
            start.elapsed()
        );

        reconciled
    }

    /// Encode, optionally OCR, and call the model. Returns the decoded reply
    /// and whether OCR text was sent along.
    async fn ask_model(&self, bytes: &[u8]) -> Result<(ValidationResult, bool), ModelCallError> {
        let prepared = prepare_upload(bytes, self.config.max_image_dimension)?;
        debug!(
            "Encoded upload: {} ({} base64 chars)",
            prepared.encoded.mime_type,
            prepared.encoded.data.len()
        );

        let ocr_text = match self.ocr.as_ref() {
            Some(engine) => match engine.recognize(&prepared.image).await {
                Ok(text) if !text.trim().is_empty() => Some(text),
                Ok(_) => None,
                Err(e) => {
                    warn!("OCR failed, continuing without OCR context: {}", e);
                    None
                }
            },
            None => None,
        };
        let ocr_used = ocr_text.is_some();

        let request = ModelRequest {
            system_prompt: self
                .config
                .system_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            ocr_text,
            image: prepared.encoded,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let raw = call_model(self.model.as_ref(), &request, self.config.api_timeout_secs).await?;
        Ok((raw, ocr_used))
    }
}

/// The result returned when no usable model answer exists.
pub fn degraded_result(error: &ModelCallError, model: &str) -> ValidationResult {
    ValidationResult {
        is_compliant: Some(false),
        overall_score: Some(0),
        rejection_reason: Some(format!("Validation failed: {error}")),
        analysis_trace: Some(AnalysisTrace::placeholder()),
        validation_confidence: Some(DEGRADED_CONFIDENCE),
        schema_validation: Some(SchemaValidation {
            valid: false,
            errors: vec!["No model result to validate".to_string()],
        }),
        metadata: Some(Metadata {
            timestamp: Utc::now(),
            model: model.to_string(),
            error: Some(error.to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

// ── Provider resolution ──────────────────────────────────────────────────

fn create_vision_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, PosterCheckError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        PosterCheckError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific:
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider** (`config.provider_name`) with the configured model.
/// 3. **`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`** when both are set.
/// 4. **`OPENAI_API_KEY`** present: OpenAI with the configured model.
/// 5. **[`ProviderFactory::from_env`]** auto-detection.
async fn resolve_provider(config: &ValidatorConfig) -> Result<Arc<dyn LLMProvider>, PosterCheckError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        return create_vision_provider(name, config.model_id());
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_vision_provider(&prov, &model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            return create_vision_provider("openai", config.model_id());
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| PosterCheckError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}
