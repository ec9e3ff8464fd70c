//! HTTP front end: a thin axum shim over [`Validator`].
//!
//! | Route | Method | Body | Reply |
//! |-------|--------|------|-------|
//! | `/api/validate` | POST | multipart, one image file | `ValidationResult` JSON |
//! | `/api/health`   | GET  | none | `{"status":"ok","model":...}` |
//!
//! Validation itself never fails, so `/api/validate` answers 200 for every
//! upload it can read; only a malformed request (no file part, unreadable
//! multipart, body over the size limit) gets a 4xx with `{"error": ...}`.

use crate::error::PosterCheckError;
use crate::validate::Validator;
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

/// Multipart field names taken as the poster without further checks.
const PREFERRED_FIELDS: &[&str] = &["poster", "image", "file"];

/// A request the handler refused to validate.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<axum::extract::multipart::MultipartError> for ApiError {
    fn from(e: axum::extract::multipart::MultipartError) -> Self {
        Self {
            status: e.status(),
            message: e.body_text(),
        }
    }
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    model: String,
}

/// Build the application router around a shared validator.
pub fn router(validator: Arc<Validator>) -> Router {
    let limit = validator.config().max_upload_bytes;
    Router::new()
        .route("/api/validate", post(validate_poster))
        .route("/api/health", get(health))
        .layer(DefaultBodyLimit::max(limit))
        .layer(TraceLayer::new_for_http())
        .with_state(validator)
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(addr: SocketAddr, validator: Arc<Validator>) -> Result<(), PosterCheckError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| PosterCheckError::Bind { addr, source })?;
    info!("poster-check listening on http://{}", addr);

    axum::serve(listener, router(validator))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown requested");
        })
        .await
        .map_err(|e| PosterCheckError::Internal(format!("server error: {e}")))
}

/// Serve on an already bound listener until the task is dropped.
pub async fn serve_listener(listener: TcpListener, validator: Arc<Validator>) -> Result<(), PosterCheckError> {
    axum::serve(listener, router(validator))
        .await
        .map_err(|e| PosterCheckError::Internal(format!("server error: {e}")))
}

async fn health(State(validator): State<Arc<Validator>>) -> Json<Health> {
    Json(Health {
        status: "ok",
        model: validator.config().model_id().to_string(),
    })
}

async fn validate_poster(
    State(validator): State<Arc<Validator>>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let mut fallback = None;
    let mut chosen = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or("").to_string();
        let is_file = field.file_name().is_some();
        if PREFERRED_FIELDS.contains(&name.as_str()) {
            chosen = Some(field.bytes().await?);
            break;
        }
        if is_file && fallback.is_none() {
            fallback = Some(field.bytes().await?);
        }
    }

    let Some(bytes) = chosen.or(fallback) else {
        return Err(ApiError::bad_request(
            "No image file in request; send it as a multipart field named 'poster'",
        ));
    };
    debug!("Received poster upload: {} bytes", bytes.len());

    let result = validator.validate(&bytes).await;
    Ok(Json(result).into_response())
}
