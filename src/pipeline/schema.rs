//! Schema completeness check for a decoded model reply.
//!
//! Decoding never fails on a missing field (see [`crate::result`]); this pass
//! lists what is missing so the result can carry `schemaValidation` and the
//! logs show which parts of the reply were not trustworthy. It also strips
//! rule checks whose identifier is outside the category's fixed set.

use crate::result::{Category, RuleCheck, ValidationResult};

/// Every mandatory field that is absent, in schema order.
///
/// `candidateName`, `candidateNumber`, `phoneNumber` and `rejectionReason`
/// are nullable and never reported.
pub fn check_schema(result: &ValidationResult) -> Vec<String> {
    let mut errors = Vec::new();

    missing(&mut errors, "isCompliant", result.is_compliant.is_none());
    missing(&mut errors, "overallScore", result.overall_score.is_none());
    missing(&mut errors, "summary", result.summary.is_none());

    match &result.document_type {
        None => missing(&mut errors, "documentType", true),
        Some(d) => {
            missing(&mut errors, "documentType.isElectionPropaganda", d.is_election_propaganda.is_none());
            missing(&mut errors, "documentType.actualType", d.actual_type.is_none());
            missing(&mut errors, "documentType.confidence", d.confidence.is_none());
            missing(&mut errors, "documentType.reasoning", d.reasoning.is_none());
        }
    }

    match &result.image_quality {
        None => missing(&mut errors, "imageQuality", true),
        Some(q) => {
            missing(&mut errors, "imageQuality.isAcceptable", q.is_acceptable.is_none());
            missing(&mut errors, "imageQuality.issues", q.issues.is_none());
        }
    }

    match &result.categories {
        None => missing(&mut errors, "categories", true),
        Some(c) => {
            check_category(&mut errors, "prohibitedContent", c.prohibited_content.as_ref());
            check_category(&mut errors, "requiredContent", c.required_content.as_ref());
            check_category(&mut errors, "contentScope", c.content_scope.as_ref());
            check_category(&mut errors, "languageEthics", c.language_ethics.as_ref());
        }
    }

    match &result.extracted_text {
        None => missing(&mut errors, "extractedText", true),
        Some(t) => {
            missing(&mut errors, "extractedText.rawText", t.raw_text.is_none());
            missing(&mut errors, "extractedText.objectives", t.objectives.is_none());
            missing(&mut errors, "extractedText.containsNonArabic", t.contains_non_arabic.is_none());
        }
    }

    match &result.analysis_trace {
        None => missing(&mut errors, "_analysis_trace", true),
        Some(t) => {
            missing(&mut errors, "_analysis_trace.step1_content_extraction", t.step1_content_extraction.is_none());
            missing(&mut errors, "_analysis_trace.step2_document_classification", t.step2_document_classification.is_none());
            missing(&mut errors, "_analysis_trace.step3_rule_evaluation", t.step3_rule_evaluation.is_none());
            missing(&mut errors, "_analysis_trace.step4_decision_logic", t.step4_decision_logic.is_none());
        }
    }

    errors
}

fn missing(errors: &mut Vec<String>, path: &str, is_missing: bool) {
    if is_missing {
        errors.push(format!("Missing field: {path}"));
    }
}

fn check_category<T: RuleCheck>(errors: &mut Vec<String>, name: &str, category: Option<&Category<T>>) {
    let Some(category) = category else {
        missing(errors, &format!("categories.{name}"), true);
        return;
    };
    missing(errors, &format!("categories.{name}.status"), category.status.is_none());

    let Some(checks) = category.checks.as_ref() else {
        missing(errors, &format!("categories.{name}.checks"), true);
        return;
    };
    for (i, check) in checks.iter().enumerate() {
        if !check.rule_known() {
            errors.push(format!(
                "Unrecognized rule in categories.{name}.checks[{i}]"
            ));
        }
        if check.finding().is_none() {
            missing(
                errors,
                &format!("categories.{name}.checks[{i}].{}", check.finding_field()),
                true,
            );
        }
    }
}

/// Remove rule checks with unrecognised identifiers; returns how many went.
pub fn drop_unknown_rules(result: &mut ValidationResult) -> usize {
    let Some(c) = result.categories.as_mut() else {
        return 0;
    };
    retain_known(c.prohibited_content.as_mut())
        + retain_known(c.required_content.as_mut())
        + retain_known(c.content_scope.as_mut())
        + retain_known(c.language_ethics.as_mut())
}

fn retain_known<T: RuleCheck>(category: Option<&mut Category<T>>) -> usize {
    match category.and_then(|c| c.checks.as_mut()) {
        Some(checks) => {
            let before = checks.len();
            checks.retain(|c| c.rule_known());
            before - checks.len()
        }
        None => 0,
    }
}
