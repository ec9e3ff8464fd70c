//! Result reconciliation: deterministic corrections layered under the model.
//!
//! The model is a probabilistic classifier; this stage is the safety net. It
//! is a pure function of its input: [`reconcile`] takes the decoded reply by
//! value and returns the corrected result together with every
//! [`Correction`] it applied, so callers can log or audit what changed.
//!
//! ## Pass Order
//!
//! ```text
//! 1. schema      completeness check (first run only), drop unknown rule ids
//! 2. consistency non-election ⇒ non-compliant, score 0
//! 3. trace       synthesise a placeholder _analysis_trace
//! 4. heuristics  CANDIDATE_NUMBER false-positive warnings
//! 5. rules       fixed-phrase violations injected into contentScope
//! 6. confidence  validationConfidence in [50, 100]
//! 7. rejection   synthesise rejectionReason if still missing
//! 8. metadata    timestamp, model, trace/schema flags
//! ```
//!
//! Passes must run in this order: the confidence score depends on the
//! verdict after injection, and the rejection reason must see injected
//! violations before falling back to a generic message.
//!
//! Every pass converges: reconciling an already reconciled result with the
//! same context changes nothing and reports no corrections. An existing
//! `schemaValidation` is kept as-is, so the verdict on the model's original
//! reply survives later runs.

pub mod confidence;
pub mod heuristics;
pub mod rejection;
pub mod rules;

use crate::pipeline::schema;
use crate::result::{AnalysisTrace, Metadata, SchemaValidation, ScopeRule, ValidationResult, WarningKind};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

const NON_ELECTION_NOTE: &str =
    "Correction: the document is not election propaganda, so it cannot be compliant; verdict forced to non-compliant with score 0";

/// Per-request inputs that are not part of the model's reply.
#[derive(Debug, Clone)]
pub struct ReconcileContext {
    pub model: String,
    pub timestamp: DateTime<Utc>,
    pub ocr_used: bool,
}

impl ReconcileContext {
    /// Context stamped with the current time.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            timestamp: Utc::now(),
            ocr_used: false,
        }
    }

    pub fn with_ocr(mut self, used: bool) -> Self {
        self.ocr_used = used;
        self
    }
}

/// One change the reconciler made to the model's answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Correction {
    UnknownRulesDropped { count: usize },
    NonElectionForcedNonCompliant,
    NonElectionScoreZeroed,
    TraceSynthesized,
    WarningAdded { warning: WarningKind },
    ViolationInjected { rule: ScopeRule, text: String },
    MissingVerdictDefaulted,
    RejectionReasonSynthesized,
}

impl fmt::Display for Correction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Correction::UnknownRulesDropped { count } => {
                write!(f, "dropped {count} check(s) with unrecognized rule ids")
            }
            Correction::NonElectionForcedNonCompliant => {
                write!(f, "non-election document forced to non-compliant")
            }
            Correction::NonElectionScoreZeroed => write!(f, "non-election document score set to 0"),
            Correction::TraceSynthesized => write!(f, "missing analysis trace synthesised"),
            Correction::WarningAdded { warning } => write!(f, "warning added: {warning:?}"),
            Correction::ViolationInjected { rule, text } => {
                write!(f, "{} injected for {:?}", rule.as_str(), text)
            }
            Correction::MissingVerdictDefaulted => write!(f, "missing isCompliant defaulted to false"),
            Correction::RejectionReasonSynthesized => write!(f, "rejection reason synthesised"),
        }
    }
}

/// The reconciled result and what was changed to get there.
#[derive(Debug, Clone)]
pub struct Reconciled {
    pub result: ValidationResult,
    pub corrections: Vec<Correction>,
}

/// Apply every reconciliation pass to a decoded model reply.
pub fn reconcile(raw: ValidationResult, ctx: &ReconcileContext) -> Reconciled {
    let mut result = raw;
    let mut corrections = Vec::new();
    let had_trace = result.analysis_trace.is_some();

    // ── Pass 1: Schema completeness ──────────────────────────────────────
    // Judged once, on the model's reply; later passes fill in fields the
    // check would otherwise stop reporting.
    let schema_valid = match result.schema_validation.as_ref() {
        Some(previous) => previous.valid,
        None => {
            let errors = schema::check_schema(&result);
            let valid = errors.is_empty();
            result.schema_validation = Some(SchemaValidation { valid, errors });
            valid
        }
    };
    let dropped = schema::drop_unknown_rules(&mut result);
    if dropped > 0 {
        corrections.push(Correction::UnknownRulesDropped { count: dropped });
    }

    // ── Pass 2: Non-election consistency ─────────────────────────────────
    let mut logic_corrected = false;
    if result.is_election_propaganda() == Some(false) {
        if result.is_compliant != Some(false) {
            result.is_compliant = Some(false);
            result.overall_score = Some(0);
            result.trace_mut().note_decision(NON_ELECTION_NOTE);
            if result
                .rejection_reason
                .as_deref()
                .is_none_or(|r| r.trim().is_empty())
            {
                let kind = result.document_type.as_ref().and_then(|d| d.actual_type);
                result.rejection_reason = Some(rejection::document_type_reason(kind).to_string());
            }
            logic_corrected = true;
            corrections.push(Correction::NonElectionForcedNonCompliant);
        } else if result.overall_score != Some(0) {
            result.overall_score = Some(0);
            logic_corrected = true;
            corrections.push(Correction::NonElectionScoreZeroed);
        }
    }

    // ── Pass 3: Trace completeness ───────────────────────────────────────
    if result.analysis_trace.is_none() {
        result.analysis_trace = Some(AnalysisTrace::placeholder());
    }
    if !had_trace {
        corrections.push(Correction::TraceSynthesized);
    }

    // ── Pass 4: Candidate-number false positives ─────────────────────────
    for warning in heuristics::candidate_number_warnings(&result) {
        if !result.warnings.iter().any(|w| w.kind == warning.kind) {
            corrections.push(Correction::WarningAdded { warning: warning.kind });
            result.warnings.push(warning);
        }
    }

    // ── Pass 5: Deterministic phrase violations ──────────────────────────
    let matches = rules::scan(result.raw_text());
    for m in &matches {
        if rules::flag_violation(&mut result, m.rule.rule, &m.text, m.rule.explanation) {
            corrections.push(Correction::ViolationInjected {
                rule: m.rule.rule,
                text: m.text.clone(),
            });
        }
    }

    // ── Pass 6: Confidence ───────────────────────────────────────────────
    result.validation_confidence = Some(confidence::validation_confidence(&result));

    // ── Pass 7: Rejection reason ─────────────────────────────────────────
    if result.is_compliant.is_none() {
        result.is_compliant = Some(false);
        corrections.push(Correction::MissingVerdictDefaulted);
    }
    if !result.compliant()
        && result
            .rejection_reason
            .as_deref()
            .is_none_or(|r| r.trim().is_empty())
    {
        result.rejection_reason = Some(rejection::synthesize(&result));
        corrections.push(Correction::RejectionReasonSynthesized);
    }

    // ── Pass 8: Metadata ─────────────────────────────────────────────────
    let previously_corrected = result
        .metadata
        .as_ref()
        .is_some_and(|m| m.logic_correction_applied);
    result.metadata = Some(Metadata {
        timestamp: ctx.timestamp,
        model: ctx.model.clone(),
        has_reasoning_trace: result
            .analysis_trace
            .as_ref()
            .is_some_and(AnalysisTrace::has_extraction),
        schema_valid,
        logic_correction_applied: logic_corrected || previously_corrected,
        deterministic_matches: matches.len(),
        ocr_used: ctx.ocr_used,
        error: None,
    });

    Reconciled {
        result,
        corrections,
    }
}
