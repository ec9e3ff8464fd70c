//! VLM interaction: build the vision request, call the model, decode the reply.
//!
//! The model sits behind the [`VisionModel`] trait so the validator receives
//! it as an explicit dependency; production code wraps an
//! `edgequake_llm::LLMProvider` in [`LlmVisionModel`], tests substitute a stub.
//!
//! No retries: a failed call becomes a degraded result and the caller may
//! resubmit the poster.

use crate::error::ModelCallError;
use crate::pipeline::encode::EncodedImage;
use crate::prompts::{ocr_context, USER_INSTRUCTION};
use crate::result::ValidationResult;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

/// Everything one model call needs.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub system_prompt: String,
    pub ocr_text: Option<String>,
    pub image: EncodedImage,
    pub temperature: f32,
    pub max_tokens: usize,
}

/// The model's raw answer.
#[derive(Debug, Clone, Default)]
pub struct ModelReply {
    pub content: String,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

/// A multimodal model that answers one image + instruction with text.
#[async_trait]
pub trait VisionModel: Send + Sync {
    async fn complete(&self, request: &ModelRequest) -> Result<ModelReply, ModelCallError>;
}

/// [`VisionModel`] backed by an edgequake-llm provider.
pub struct LlmVisionModel {
    provider: Arc<dyn LLMProvider>,
}

impl LlmVisionModel {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl VisionModel for LlmVisionModel {
    /// ## Message Layout
    ///
    /// 1. **System message**: the validation prompt (or configured override)
    /// 2. **OCR context message** *(OCR enabled only)*: locally recognised text
    /// 3. **User message**: a one-line instruction plus the poster image
    async fn complete(&self, request: &ModelRequest) -> Result<ModelReply, ModelCallError> {
        let mut messages = vec![ChatMessage::system(request.system_prompt.as_str())];

        if let Some(text) = request.ocr_text.as_deref() {
            if !text.trim().is_empty() {
                messages.push(ChatMessage::system(ocr_context(text)));
            }
        }

        let image = ImageData::new(request.image.data.clone(), request.image.mime_type)
            .with_detail("high");
        messages.push(ChatMessage::user_with_images(USER_INSTRUCTION, vec![image]));

        let options = CompletionOptions {
            temperature: Some(request.temperature),
            max_tokens: Some(request.max_tokens),
            ..Default::default()
        };

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| ModelCallError::ApiError {
                message: e.to_string(),
            })?;

        Ok(ModelReply {
            content: response.content,
            prompt_tokens: response.prompt_tokens as u64,
            completion_tokens: response.completion_tokens as u64,
        })
    }
}

/// Call the model once, bounded by `timeout_secs`, and decode its reply.
pub async fn call_model(
    model: &dyn VisionModel,
    request: &ModelRequest,
    timeout_secs: u64,
) -> Result<ValidationResult, ModelCallError> {
    let start = Instant::now();

    let reply = match timeout(Duration::from_secs(timeout_secs), model.complete(request)).await {
        Ok(reply) => reply?,
        Err(_) => {
            warn!("Model call timed out after {}s", timeout_secs);
            return Err(ModelCallError::Timeout { secs: timeout_secs });
        }
    };

    debug!(
        "Model reply: {} input tokens, {} output tokens, {:?}",
        reply.prompt_tokens,
        reply.completion_tokens,
        start.elapsed()
    );

    parse_reply(&reply.content)
}

static RE_JSON_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:json|JSON)?\s*\n(.*?)\n?```\s*$").unwrap());

/// Decode the model's textual reply into a [`ValidationResult`].
///
/// Tolerates an outer ```` ```json ```` fence and prose before or after the
/// object (models sometimes disobey "JSON only"); anything else that fails
/// to decode is a [`ModelCallError::MalformedJson`].
pub fn parse_reply(content: &str) -> Result<ValidationResult, ModelCallError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(ModelCallError::EmptyReply);
    }

    let unfenced = match RE_JSON_FENCE.captures(trimmed) {
        Some(caps) => caps.get(1).map_or("", |m| m.as_str()),
        None => trimmed,
    };

    let body = match (unfenced.find('{'), unfenced.rfind('}')) {
        (Some(start), Some(end)) if end > start => &unfenced[start..=end],
        _ => unfenced,
    };

    serde_json::from_str(body).map_err(|e| ModelCallError::MalformedJson {
        detail: e.to_string(),
        excerpt: trimmed.chars().take(120).collect(),
    })
}
