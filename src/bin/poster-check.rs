//! HTTP server binary for poster-check.
//!
//! A thin shim over the library crate that maps CLI flags and environment
//! variables to `ValidatorConfig` and serves the validation API.

use anyhow::{Context, Result};
use clap::Parser;
use poster_check::{serve, Validator, ValidatorConfig};
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = "\
ENDPOINTS:
  POST /api/validate   multipart upload, field 'poster' (PNG, JPEG or WebP)
  GET  /api/health     liveness + configured model

EXAMPLES:
  poster-check
  poster-check --port 8080 --model gpt-4.1
  poster-check --ocr --ocr-languages ara+eng
  curl -F poster=@poster.jpg http://localhost:3000/api/validate

PROVIDER DETECTION:
  --provider / EDGEQUAKE_PROVIDER takes precedence. Otherwise
  EDGEQUAKE_LLM_PROVIDER + EDGEQUAKE_MODEL, then OPENAI_API_KEY, then any
  provider key found in the environment.";

#[derive(Parser, Debug)]
#[command(
    name = "poster-check",
    version,
    about = "Validate election campaign posters with a Vision LLM",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Address to bind.
    #[arg(long, env = "POSTER_CHECK_HOST", default_value = "0.0.0.0")]
    host: IpAddr,

    /// Port to listen on.
    #[arg(short, long, env = "POSTER_CHECK_PORT", default_value_t = 3000)]
    port: u16,

    /// LLM model ID (e.g. gpt-4.1-mini, gpt-4.1, claude-sonnet-4-20250514).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Sampling temperature (0.0–2.0).
    #[arg(long, env = "POSTER_CHECK_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// Maximum tokens the model may generate per poster.
    #[arg(long, env = "POSTER_CHECK_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// Model call timeout in seconds.
    #[arg(long, env = "POSTER_CHECK_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Read the system prompt from this file instead of the built-in one.
    #[arg(long, env = "POSTER_CHECK_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Run local OCR (tesseract) and pass the text to the model.
    #[arg(long = "ocr", env = "POSTER_CHECK_OCR")]
    ocr: bool,

    /// Path or name of the tesseract executable.
    #[arg(long, env = "POSTER_CHECK_TESSERACT", default_value = "tesseract")]
    tesseract: PathBuf,

    /// Tesseract language codes.
    #[arg(long, env = "POSTER_CHECK_OCR_LANGUAGES", default_value = "ara+eng")]
    ocr_languages: String,

    /// Largest accepted upload, in bytes.
    #[arg(long, env = "POSTER_CHECK_MAX_UPLOAD", default_value_t = 10 * 1024 * 1024)]
    max_upload_bytes: usize,

    /// Debug logging.
    #[arg(short, long)]
    verbose: bool,

    /// Errors only.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info,tower_http=debug"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli).await?;
    let validator = Validator::from_config(config)
        .await
        .context("Failed to initialise the vision model")?;

    let addr = SocketAddr::new(cli.host, cli.port);
    info!("Starting poster-check on {}", addr);
    serve(addr, Arc::new(validator))
        .await
        .with_context(|| format!("Server on {addr} stopped with an error"))?;

    Ok(())
}

async fn build_config(cli: &Cli) -> Result<ValidatorConfig> {
    let mut builder = ValidatorConfig::builder()
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .api_timeout_secs(cli.api_timeout)
        .enable_ocr(cli.ocr)
        .tesseract_binary(cli.tesseract.clone())
        .ocr_languages(cli.ocr_languages.clone())
        .max_upload_bytes(cli.max_upload_bytes);

    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(ref path) = cli.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }

    builder.build().context("Invalid configuration")
}
