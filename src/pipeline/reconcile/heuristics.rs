//! False-positive heuristics for the `CANDIDATE_NUMBER` finding.
//!
//! Models readily report any standalone number on a poster as a ranking
//! number. These checks never remove the finding; they only attach advisory
//! [`Warning`]s so a reviewer can overrule the model.

use crate::result::{ProhibitedRule, ValidationResult, Warning, WarningKind};
use once_cell::sync::Lazy;
use regex::Regex;

static RE_PHONE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{8,}").unwrap());

static RE_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{1,2}[/\-.]\d{1,2}[/\-.]\d{2,4}\b").unwrap());

static RE_AGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+\s*(?:سنة|سنوات|عاماً|عاما|عام)\b").unwrap());

static RE_CONTACT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:اتصل|للاتصال|للتواصل|تواصل|هاتف|واتساب)\s*[:\-]?\s*\+?\d").unwrap()
});

static RE_VISION_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"رؤية\s*(?:عمان\s*)?\d{4}").unwrap());

static RE_CANDIDATE_PHRASE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"رقم\s*المرشح|المرشح\s*رقم").unwrap());

/// A number shape that is commonly mistaken for a candidate number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberSignal {
    PhoneNumber,
    Date,
    Age,
    ContactRequest,
    VisionYear,
}

impl NumberSignal {
    pub fn describe(&self) -> &'static str {
        match self {
            NumberSignal::PhoneNumber => "a phone number (8+ digits)",
            NumberSignal::Date => "a date",
            NumberSignal::Age => "an age or number of years",
            NumberSignal::ContactRequest => "a contact request",
            NumberSignal::VisionYear => "a vision statement year",
        }
    }
}

/// Which false-positive shapes appear in `text`, in a fixed order.
pub fn number_signals(text: &str) -> Vec<NumberSignal> {
    [
        (NumberSignal::PhoneNumber, &*RE_PHONE),
        (NumberSignal::Date, &*RE_DATE),
        (NumberSignal::Age, &*RE_AGE),
        (NumberSignal::ContactRequest, &*RE_CONTACT),
        (NumberSignal::VisionYear, &*RE_VISION_YEAR),
    ]
    .into_iter()
    .filter(|(_, re)| re.is_match(text))
    .map(|(signal, _)| signal)
    .collect()
}

/// True when `text` says "candidate number" in either word order.
pub fn has_candidate_number_phrase(text: &str) -> bool {
    RE_CANDIDATE_PHRASE.is_match(text)
}

/// Advisory warnings for a reported candidate number.
///
/// Empty unless the `CANDIDATE_NUMBER` check has `found == true`. This
/// includes `MISSING_CONTEXT`: a poster that never says "candidate number"
/// and shows no number has nothing to warn about.
pub fn candidate_number_warnings(result: &ValidationResult) -> Vec<Warning> {
    let Some(check) = result
        .prohibited(ProhibitedRule::CandidateNumber)
        .filter(|c| c.found == Some(true))
    else {
        return Vec::new();
    };

    let raw = result.raw_text();
    let mut signals = number_signals(check.details.as_deref().unwrap_or(""));
    for s in number_signals(raw) {
        if !signals.contains(&s) {
            signals.push(s);
        }
    }

    let mut warnings = Vec::new();
    if !signals.is_empty() {
        let shapes: Vec<&str> = signals.iter().map(NumberSignal::describe).collect();
        warnings.push(Warning {
            kind: WarningKind::PossibleFalsePositive,
            message: format!(
                "The reported candidate number may be a false positive: the text contains {}",
                shapes.join(", ")
            ),
            confidence: 60,
        });
    }
    if !has_candidate_number_phrase(raw) {
        warnings.push(Warning {
            kind: WarningKind::MissingContext,
            message: "A candidate number was reported but the text never says \"candidate number\" (رقم المرشح)".to_string(),
            confidence: 70,
        });
    }
    warnings
}
