//! Error types for the poster-check library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`PosterCheckError`]: **Fatal**: the service cannot start or cannot be
//!   constructed (provider not configured, bad configuration, port in use).
//!
//! * [`ModelCallError`]: **Recoverable**: a single validation request could
//!   not get a usable answer from the model (timeout, API error, malformed
//!   JSON, unreadable upload). Never reaches the HTTP caller as an error;
//!   [`crate::validate::Validator`] turns it into a degraded
//!   [`crate::result::ValidationResult`] instead.
//!
//! OCR problems have their own [`OcrError`]; they only cost the request its
//! OCR context and are logged, not surfaced.

use std::net::SocketAddr;
use thiserror::Error;

/// Fatal errors returned while building or starting the validator.
#[derive(Debug, Error)]
pub enum PosterCheckError {
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The HTTP listener could not be bound.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A per-request failure talking to the model or preparing its input.
#[derive(Debug, Clone, Error)]
pub enum ModelCallError {
    /// The provider returned an error (network, auth, rate limit, 5xx).
    #[error("LLM API error: {message}")]
    ApiError { message: String },

    /// The call did not finish within the configured timeout.
    #[error("LLM call timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The model answered with nothing.
    #[error("LLM returned an empty reply")]
    EmptyReply,

    /// The reply could not be decoded into a validation result.
    #[error("LLM reply is not valid result JSON: {detail} (reply starts with {excerpt:?})")]
    MalformedJson { detail: String, excerpt: String },

    /// The uploaded bytes are not a decodable image.
    #[error("Uploaded file is not a supported image: {detail}")]
    InvalidImage { detail: String },
}

/// Local OCR failed; the request continues without OCR context.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR pre-processing failed: {0}")]
    Preprocess(#[from] image::ImageError),

    #[error("Failed to launch OCR engine '{binary}': {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("OCR engine exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("OCR I/O error: {0}")]
    Io(#[from] std::io::Error),
}
