//! Pipeline stages for poster validation.
//!
//! Each submodule implements exactly one step; [`crate::validate::Validator`]
//! drives them in order.
//!
//! ## Data Flow
//!
//! ```text
//! encode ──▶ ocr ──▶ llm ──▶ schema ──▶ reconcile
//! (bytes)  (optional) (VLM)  (check)    (rules)
//! ```
//!
//! 1. [`encode`]: decode the upload, downscale if needed, base64-wrap it
//! 2. [`ocr`]: optional local text recognition handed to the model as
//!    extra context
//! 3. [`llm`]: the model call and reply decoding; the only stage with
//!    network I/O
//! 4. [`schema`]: completeness check of the decoded reply
//! 5. [`reconcile`]: deterministic corrections over the model's verdict

pub mod encode;
pub mod llm;
pub mod ocr;
pub mod reconcile;
pub mod schema;
