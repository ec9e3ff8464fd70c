//! Configuration for the poster validator.
//!
//! All validation behaviour is controlled through [`ValidatorConfig`], built
//! via its [`ValidatorConfigBuilder`]. The HTTP binary maps its flags and
//! environment variables onto this struct; library users and tests set only
//! what they need and rely on the defaults for the rest.

use crate::error::PosterCheckError;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Model used when neither the config nor the environment names one.
pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";

/// Configuration for poster validation.
///
/// # Example
/// ```rust
/// use poster_check::ValidatorConfig;
///
/// let config = ValidatorConfig::builder()
///     .model("gpt-4.1")
///     .api_timeout_secs(90)
///     .enable_ocr(true)
///     .build()
///     .unwrap();
/// assert!(config.enable_ocr);
/// ```
#[derive(Clone)]
pub struct ValidatorConfig {
    /// LLM model identifier, e.g. "gpt-4.1-mini". If None, uses [`DEFAULT_MODEL`].
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "gemini").
    /// If None along with `provider`, the provider is detected from the environment.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. Default: 0.1.
    ///
    /// The verdict must be reproducible for the same poster, so sampling is
    /// kept close to greedy.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 4096.
    ///
    /// The result JSON with all four categories and the analysis trace is
    /// typically 1 500–2 500 tokens; truncation yields malformed JSON and a
    /// degraded result.
    pub max_tokens: usize,

    /// Per-request model call timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Custom system prompt. If None, uses [`crate::prompts::DEFAULT_SYSTEM_PROMPT`].
    pub system_prompt: Option<String>,

    /// Run local OCR and pass its text to the model as context. Default: false.
    pub enable_ocr: bool,

    /// Path or name of the tesseract executable. Default: "tesseract".
    pub tesseract_binary: PathBuf,

    /// Tesseract language list. Default: "ara+eng".
    pub ocr_languages: String,

    /// Largest accepted upload in bytes. Default: 10 MiB.
    pub max_upload_bytes: usize,

    /// Longest image side sent to the model, in pixels. Default: 2048.
    ///
    /// Larger uploads are downscaled and re-encoded as PNG; phone photos of
    /// posters are routinely 4000+ px and would waste tokens.
    pub max_image_dimension: u32,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.1,
            max_tokens: 4096,
            api_timeout_secs: 60,
            system_prompt: None,
            enable_ocr: false,
            tesseract_binary: PathBuf::from("tesseract"),
            ocr_languages: "ara+eng".to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
            max_image_dimension: 2048,
        }
    }
}

impl fmt::Debug for ValidatorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("system_prompt", &self.system_prompt.as_ref().map(|p| p.len()))
            .field("enable_ocr", &self.enable_ocr)
            .field("ocr_languages", &self.ocr_languages)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("max_image_dimension", &self.max_image_dimension)
            .finish()
    }
}

impl ValidatorConfig {
    /// Create a new builder for `ValidatorConfig`.
    pub fn builder() -> ValidatorConfigBuilder {
        ValidatorConfigBuilder {
            config: Self::default(),
        }
    }

    /// The model identifier recorded in result metadata.
    pub fn model_id(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }
}

/// Builder for [`ValidatorConfig`].
#[derive(Debug)]
pub struct ValidatorConfigBuilder {
    config: ValidatorConfig,
}

impl ValidatorConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn enable_ocr(mut self, v: bool) -> Self {
        self.config.enable_ocr = v;
        self
    }

    pub fn tesseract_binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.tesseract_binary = path.into();
        self
    }

    pub fn ocr_languages(mut self, langs: impl Into<String>) -> Self {
        self.config.ocr_languages = langs.into();
        self
    }

    pub fn max_upload_bytes(mut self, n: usize) -> Self {
        self.config.max_upload_bytes = n;
        self
    }

    pub fn max_image_dimension(mut self, px: u32) -> Self {
        self.config.max_image_dimension = px.max(256);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ValidatorConfig, PosterCheckError> {
        let c = &self.config;
        if c.max_tokens < 512 {
            return Err(PosterCheckError::InvalidConfig(format!(
                "max_tokens must be ≥ 512 to fit the result JSON, got {}",
                c.max_tokens
            )));
        }
        if c.api_timeout_secs == 0 {
            return Err(PosterCheckError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        if c.max_upload_bytes == 0 {
            return Err(PosterCheckError::InvalidConfig(
                "max_upload_bytes must be > 0".into(),
            ));
        }
        if c.enable_ocr && c.ocr_languages.trim().is_empty() {
            return Err(PosterCheckError::InvalidConfig(
                "OCR is enabled but no OCR language was given".into(),
            ));
        }
        Ok(self.config)
    }
}
