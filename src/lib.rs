//! # poster-check
//!
//! Validate election campaign posters against campaign advertising rules
//! using a Vision Language Model (VLM) plus deterministic reconciliation.
//!
//! ## Why this crate?
//!
//! A VLM reads Arabic poster text, recognises emblems, flags and landmarks,
//! and judges whether campaign objectives fall within a Shura Council
//! member's powers far better than hand-written image heuristics. It is
//! also inconsistent: it marks greeting cards compliant, misses phrases
//! regulators reject every time, and calls phone numbers "candidate
//! numbers". This crate asks the model for a structured verdict and then
//! runs a deterministic reconciler over it, so the rules that must always
//! hold do hold.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload (PNG/JPEG/WebP)
//!  │
//!  ├─ 1. Encode     decode, downscale, base64
//!  ├─ 2. OCR        optional tesseract text as extra model context
//!  ├─ 3. VLM        one call, bounded by a timeout, JSON verdict
//!  ├─ 4. Schema     completeness check (advisory)
//!  ├─ 5. Reconcile  consistency fixes, warnings, phrase rules, confidence
//!  └─ 6. Output     ValidationResult JSON
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use poster_check::{Validator, ValidatorConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY
//!     let validator = Validator::from_config(ValidatorConfig::default()).await?;
//!     let bytes = std::fs::read("poster.jpg")?;
//!     let result = validator.validate(&bytes).await;
//!     println!("{}", serde_json::to_string_pretty(&result)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `server` | on      | HTTP API and the `poster-check` binary (axum + clap + anyhow + tracing-subscriber) |
//!
//! Disable `server` when embedding only the validator:
//! ```toml
//! poster-check = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod pipeline;
pub mod prompts;
pub mod result;
#[cfg(feature = "server")]
pub mod server;
pub mod validate;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ValidatorConfig, ValidatorConfigBuilder, DEFAULT_MODEL};
pub use error::{ModelCallError, OcrError, PosterCheckError};
pub use pipeline::llm::{LlmVisionModel, ModelReply, ModelRequest, VisionModel};
pub use pipeline::ocr::{OcrEngine, TesseractOcr};
pub use pipeline::reconcile::{reconcile, Correction, ReconcileContext, Reconciled};
pub use result::ValidationResult;
#[cfg(feature = "server")]
pub use server::{router, serve, serve_listener};
pub use validate::{degraded_result, Validator};
