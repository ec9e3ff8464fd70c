//! Derived `validationConfidence`: how far the verdict can be trusted.

use crate::result::{RuleCheck, ValidationResult};

const BASE: i32 = 90;
const MIN: i32 = 50;
const MAX: i32 = 100;

/// Score the result in [50, 100].
///
/// | Condition | Adjustment |
/// |-----------|------------|
/// | no real step-1 extraction in the trace | −20 |
/// | non-compliant but `violations_found` empty | −10 |
/// | `documentType.reasoning` longer than 20 chars | +5 |
/// | mean prohibited/scope check confidence below 70 | −10 |
pub fn validation_confidence(result: &ValidationResult) -> u32 {
    let mut score = BASE;

    let trace = result.analysis_trace.as_ref();
    if !trace.is_some_and(|t| t.has_extraction()) {
        score -= 20;
    }

    if !result.compliant() && trace.is_none_or(|t| t.violations_found.is_empty()) {
        score -= 10;
    }

    let reasoning_len = result
        .document_type
        .as_ref()
        .and_then(|d| d.reasoning.as_deref())
        .map_or(0, |r| r.chars().count());
    if reasoning_len > 20 {
        score += 5;
    }

    if mean_check_confidence(result).is_some_and(|m| m < 70.0) {
        score -= 10;
    }

    score.clamp(MIN, MAX) as u32
}

/// Mean confidence over prohibited-content and content-scope checks that
/// report one; `None` when there are none.
fn mean_check_confidence(result: &ValidationResult) -> Option<f64> {
    let values: Vec<u32> = result
        .prohibited_checks()
        .iter()
        .filter_map(RuleCheck::confidence)
        .chain(result.scope_checks().iter().filter_map(RuleCheck::confidence))
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64)
    }
}
