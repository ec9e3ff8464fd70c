//! Fixed phrases that are content-scope violations no matter what the model
//! concluded.
//!
//! The table is data: adding a rule means adding a [`TextRule`] entry, not a
//! branch. Patterns run against `extractedText.rawText`.
//!
//! A phrase must start a word, but Arabic attaches conjunctions (و, ف) and
//! prepositions (ل, ب) to the following word, so "وحل" and "لنضمن" still
//! count as starting the phrase. The reported text excludes the clitic.

use super::rejection::scope_reason;
use crate::result::{Category, CategoryStatus, ScopeCheck, ScopeRule, ValidationResult};
use once_cell::sync::Lazy;
use regex::Regex;

/// One deterministic phrase rule.
#[derive(Debug)]
pub struct TextRule {
    /// Short identifier used in logs.
    pub name: &'static str,
    /// Matched at a word start, after an optional clitic prefix.
    pub pattern: &'static str,
    pub rule: ScopeRule,
    /// Written into the injected check's `explanation`.
    pub explanation: &'static str,
}

pub static TEXT_RULES: &[TextRule] = &[
    TextRule {
        name: "job_seekers_file",
        pattern: r"(?:حل|إنهاء|انهاء|معالجة|إغلاق|اغلاق)\s+ملف\s+(?:ال)?باحثين\s+عن\s+(?:ال)?عمل",
        rule: ScopeRule::ObjectivesOutsidePowers,
        explanation: "Resolving the job seekers file is an executive responsibility of the government, not a legislative or oversight power of a Shura Council member",
    },
    TextRule {
        name: "guaranteed_services",
        pattern: r"(?:نضمن|أضمن|اضمن|سنضمن)\s+(?:لكم\s+)?(?:إنجاز|انجاز|تنفيذ|تقديم)\s+(?:جميع\s+|كافة\s+)?(?:ال)?خدمات|(?:ال)?خدمات\s+(?:ال)?(?:منجزة|مضمونة)",
        rule: ScopeRule::ElectionPromises,
        explanation: "Guaranteeing completed services is a personal election promise that a Shura Council member cannot make",
    },
    TextRule {
        name: "seeking_to_obtain_benefits",
        pattern: r"(?:السعي|أسعى|اسعى|نسعى|سأسعى|سنسعى)\s+(?:(?:إلى|الى)\s+(?:ال)?حصول|للحصول)\s+على\s+(?:\S+\s+){0,2}?(?:أراض|اراض|أرض|ارض|منح|وظائف|مساكن|قروض|تعويضات)\S*",
        rule: ScopeRule::ElectionPromises,
        explanation: "Promising to obtain benefits for voters frames an executive decision as a personal campaign promise",
    },
];

static COMPILED: Lazy<Vec<(&'static TextRule, Regex)>> = Lazy::new(|| {
    TEXT_RULES
        .iter()
        .map(|r| {
            let anchored = format!(
                r"(?:^|[\s\p{{P}}])(?:و|ف)?(?:ل|ب)?(?P<phrase>(?:{}))",
                r.pattern
            );
            (r, Regex::new(&anchored).unwrap())
        })
        .collect()
});

/// A phrase rule that fired, with the exact text it matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    pub rule: &'static TextRule,
    pub text: String,
}

impl PartialEq for TextRule {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for TextRule {}

/// Every match of every rule in `raw_text`, in table order, deduplicated.
pub fn scan(raw_text: &str) -> Vec<RuleMatch> {
    let mut matches: Vec<RuleMatch> = Vec::new();
    for (rule, re) in COMPILED.iter() {
        for m in re.captures_iter(raw_text).filter_map(|c| c.name("phrase")) {
            let text = m.as_str().trim().to_string();
            if !matches.iter().any(|x| x.rule.name == rule.name && x.text == text) {
                matches.push(RuleMatch { rule, text });
            }
        }
    }
    matches
}

/// Record a content-scope violation found outside the model's judgment.
///
/// Forces the verdict to non-compliant with score 0, merges the rejection
/// message into `rejectionReason`, and appends a check for `rule` unless one
/// with the same rule and same first violating text already exists.
/// Returns `true` when a check was inserted.
pub fn flag_violation(
    result: &mut ValidationResult,
    rule: ScopeRule,
    text: &str,
    explanation: &str,
) -> bool {
    result.is_compliant = Some(false);
    result.overall_score = Some(0);

    let message = scope_reason(rule);
    let reason = match result.rejection_reason.take() {
        Some(existing) if existing.contains(message) => existing,
        Some(existing) if !existing.trim().is_empty() => format!("{existing} | {message}"),
        _ => message.to_string(),
    };
    result.rejection_reason = Some(reason);

    let scope = result
        .categories
        .get_or_insert_with(Default::default)
        .content_scope
        .get_or_insert_with(|| Category::with_status(CategoryStatus::Fail));
    scope.status = Some(CategoryStatus::Fail);
    let checks = scope.checks.get_or_insert_with(Vec::new);

    let duplicate = checks.iter().any(|c| {
        c.rule == rule && c.violating_objectives.first().map(String::as_str) == Some(text)
    });
    if !duplicate {
        checks.push(ScopeCheck {
            rule,
            violated: Some(true),
            confidence: Some(100),
            violating_objectives: vec![text.to_string()],
            explanation: Some(explanation.to_string()),
        });
    }

    result.trace_mut().note_decision(&format!(
        "Deterministic rule enforced: {} for \"{}\"",
        rule.as_str(),
        text
    ));

    !duplicate
}
