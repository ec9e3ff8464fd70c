//! The structured verdict returned for every poster.
//!
//! [`ValidationResult`] is decoded straight from the model's JSON reply, so
//! every field the model is *asked* to produce is an `Option`: a missing field
//! must not abort decoding, it is reported by [`crate::pipeline::schema`] and
//! reconciliation continues with what is present. Fields the reconciler
//! derives (`warnings`, `validationConfidence`, `metadata`,
//! `schemaValidation`) are always filled before the result leaves the crate.
//!
//! Wire names follow the prompt's schema (camelCase, plus the snake_case
//! `_analysis_trace` block).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder written into a synthesised analysis trace.
pub const TRACE_PLACEHOLDER: &str = "Not provided";

/// The complete validation verdict for one poster.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    #[serde(default)]
    pub is_compliant: Option<bool>,

    #[serde(default, deserialize_with = "lenient::int")]
    pub overall_score: Option<u32>,

    #[serde(default)]
    pub summary: Option<String>,

    #[serde(default)]
    pub rejection_reason: Option<String>,

    #[serde(default)]
    pub document_type: Option<DocumentType>,

    #[serde(default)]
    pub image_quality: Option<ImageQuality>,

    #[serde(default)]
    pub categories: Option<Categories>,

    #[serde(default)]
    pub extracted_text: Option<ExtractedText>,

    #[serde(rename = "_analysis_trace", default)]
    pub analysis_trace: Option<AnalysisTrace>,

    // ── Derived by the reconciler ────────────────────────────────────────
    #[serde(default)]
    pub warnings: Vec<Warning>,

    #[serde(default, deserialize_with = "lenient::int")]
    pub validation_confidence: Option<u32>,

    #[serde(default)]
    pub metadata: Option<Metadata>,

    #[serde(default)]
    pub schema_validation: Option<SchemaValidation>,
}

impl ValidationResult {
    /// `isCompliant`, treating a missing flag as non-compliant.
    pub fn compliant(&self) -> bool {
        self.is_compliant.unwrap_or(false)
    }

    /// `documentType.isElectionPropaganda`; `None` when the model did not say.
    pub fn is_election_propaganda(&self) -> Option<bool> {
        self.document_type
            .as_ref()
            .and_then(|d| d.is_election_propaganda)
    }

    /// The OCR-style transcription the model produced, or `""`.
    pub fn raw_text(&self) -> &str {
        self.extracted_text
            .as_ref()
            .and_then(|t| t.raw_text.as_deref())
            .unwrap_or("")
    }

    /// Prohibited-content checks, empty when the category is absent.
    pub fn prohibited_checks(&self) -> &[ProhibitedCheck] {
        self.categories
            .as_ref()
            .and_then(|c| c.prohibited_content.as_ref())
            .and_then(|c| c.checks.as_deref())
            .unwrap_or(&[])
    }

    /// Required-content checks, empty when the category is absent.
    pub fn required_checks(&self) -> &[RequiredCheck] {
        self.categories
            .as_ref()
            .and_then(|c| c.required_content.as_ref())
            .and_then(|c| c.checks.as_deref())
            .unwrap_or(&[])
    }

    /// Content-scope checks, empty when the category is absent.
    pub fn scope_checks(&self) -> &[ScopeCheck] {
        self.categories
            .as_ref()
            .and_then(|c| c.content_scope.as_ref())
            .and_then(|c| c.checks.as_deref())
            .unwrap_or(&[])
    }

    /// Language-and-ethics checks, empty when the category is absent.
    pub fn ethics_checks(&self) -> &[EthicsCheck] {
        self.categories
            .as_ref()
            .and_then(|c| c.language_ethics.as_ref())
            .and_then(|c| c.checks.as_deref())
            .unwrap_or(&[])
    }

    /// The prohibited-content check for `rule`, if the model reported one.
    pub fn prohibited(&self, rule: ProhibitedRule) -> Option<&ProhibitedCheck> {
        self.prohibited_checks().iter().find(|c| c.rule == rule)
    }

    /// True when the model reported `rule` as found.
    pub fn prohibited_found(&self, rule: ProhibitedRule) -> bool {
        self.prohibited(rule)
            .is_some_and(|c| c.found.unwrap_or(false))
    }

    /// Mutable access to the analysis trace, creating a placeholder one if needed.
    pub fn trace_mut(&mut self) -> &mut AnalysisTrace {
        self.analysis_trace
            .get_or_insert_with(AnalysisTrace::placeholder)
    }
}

// ── Document type ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentType {
    #[serde(default)]
    pub is_election_propaganda: Option<bool>,
    #[serde(default)]
    pub actual_type: Option<DocumentKind>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub confidence: Option<u32>,
    #[serde(default)]
    pub reasoning: Option<String>,
}

/// What the submitted image actually is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    ElectionPropaganda,
    TrainingAd,
    CommercialAd,
    EventAnnouncement,
    GreetingCard,
    GovernmentNotice,
    PersonalPhoto,
    #[serde(other)]
    Other,
}

// ── Image quality ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageQuality {
    #[serde(default)]
    pub is_acceptable: Option<bool>,
    #[serde(default)]
    pub issues: Option<Vec<String>>,
}

// ── Rule categories ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Categories {
    #[serde(default)]
    pub prohibited_content: Option<Category<ProhibitedCheck>>,
    #[serde(default)]
    pub required_content: Option<Category<RequiredCheck>>,
    #[serde(default)]
    pub content_scope: Option<Category<ScopeCheck>>,
    #[serde(default)]
    pub language_ethics: Option<Category<EthicsCheck>>,
}

/// One rule category: an overall status plus its ordered rule checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category<T> {
    #[serde(default)]
    pub status: Option<CategoryStatus>,
    #[serde(default)]
    pub checks: Option<Vec<T>>,
}

impl<T> Category<T> {
    /// An empty category with the given status.
    pub fn with_status(status: CategoryStatus) -> Self {
        Self {
            status: Some(status),
            checks: Some(Vec::new()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryStatus {
    Pass,
    Fail,
}

/// Implemented by every rule-check item so category-generic passes can
/// inspect them.
pub trait RuleCheck {
    /// False when the model emitted a rule identifier outside the category's set.
    fn rule_known(&self) -> bool;
    /// Name of the boolean finding field (`found`, `present`, `violated`).
    fn finding_field(&self) -> &'static str;
    /// The boolean finding, if present.
    fn finding(&self) -> Option<bool>;
    fn confidence(&self) -> Option<u32>;
}

macro_rules! rule_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident = $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $wire)] $variant,)+
            /// Any identifier outside the fixed set; dropped by reconciliation.
            #[default]
            #[serde(other, rename = "UNKNOWN")]
            Unknown,
        }

        impl $name {
            /// Every recognised rule, in prompt order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The identifier used on the wire.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                    $name::Unknown => "UNKNOWN",
                }
            }
        }
    };
}

rule_enum!(
    /// Imagery and symbols that fail a poster outright.
    ProhibitedRule {
        CandidateNumber = "CANDIDATE_NUMBER",
        ElectionLogo = "ELECTION_LOGO",
        HistoricalSymbols = "HISTORICAL_SYMBOLS",
        PublicFigures = "PUBLIC_FIGURES",
        StateEmblem = "STATE_EMBLEM",
        NationalFlag = "NATIONAL_FLAG",
        ReligiousSymbols = "RELIGIOUS_SYMBOLS",
    }
);

rule_enum!(
    /// Elements every poster must carry.
    RequiredRule {
        CandidatePhoto = "CANDIDATE_PHOTO",
        CandidateName = "CANDIDATE_NAME",
    }
);

rule_enum!(
    /// Limits on what a Shura Council candidate may promise.
    ScopeRule {
        ObjectivesOutsidePowers = "OBJECTIVES_OUTSIDE_POWERS",
        ElectionPromises = "ELECTION_PROMISES",
        DeviationFromScope = "DEVIATION_FROM_SCOPE",
        PreviousTermExploitation = "PREVIOUS_TERM_EXPLOITATION",
    }
);

rule_enum!(
    /// Language and campaign ethics.
    EthicsRule {
        ForeignLanguage = "FOREIGN_LANGUAGE",
        OffensiveLanguage = "OFFENSIVE_LANGUAGE",
        TribalSectarianAppeal = "TRIBAL_SECTARIAN_APPEAL",
    }
);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProhibitedCheck {
    #[serde(default)]
    pub rule: ProhibitedRule,
    #[serde(default)]
    pub found: Option<bool>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub confidence: Option<u32>,
    #[serde(default)]
    pub details: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequiredCheck {
    #[serde(default)]
    pub rule: RequiredRule,
    #[serde(default)]
    pub present: Option<bool>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub confidence: Option<u32>,
    #[serde(default)]
    pub details: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeCheck {
    #[serde(default)]
    pub rule: ScopeRule,
    #[serde(default)]
    pub violated: Option<bool>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub confidence: Option<u32>,
    #[serde(default)]
    pub violating_objectives: Vec<String>,
    #[serde(default)]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EthicsCheck {
    #[serde(default)]
    pub rule: EthicsRule,
    #[serde(default)]
    pub violated: Option<bool>,
    #[serde(default, deserialize_with = "lenient::int")]
    pub confidence: Option<u32>,
    #[serde(default)]
    pub details: Option<String>,
}

impl RuleCheck for ProhibitedCheck {
    fn rule_known(&self) -> bool {
        self.rule != ProhibitedRule::Unknown
    }
    fn finding_field(&self) -> &'static str {
        "found"
    }
    fn finding(&self) -> Option<bool> {
        self.found
    }
    fn confidence(&self) -> Option<u32> {
        self.confidence
    }
}

impl RuleCheck for RequiredCheck {
    fn rule_known(&self) -> bool {
        self.rule != RequiredRule::Unknown
    }
    fn finding_field(&self) -> &'static str {
        "present"
    }
    fn finding(&self) -> Option<bool> {
        self.present
    }
    fn confidence(&self) -> Option<u32> {
        self.confidence
    }
}

impl RuleCheck for ScopeCheck {
    fn rule_known(&self) -> bool {
        self.rule != ScopeRule::Unknown
    }
    fn finding_field(&self) -> &'static str {
        "violated"
    }
    fn finding(&self) -> Option<bool> {
        self.violated
    }
    fn confidence(&self) -> Option<u32> {
        self.confidence
    }
}

impl RuleCheck for EthicsCheck {
    fn rule_known(&self) -> bool {
        self.rule != EthicsRule::Unknown
    }
    fn finding_field(&self) -> &'static str {
        "violated"
    }
    fn finding(&self) -> Option<bool> {
        self.violated
    }
    fn confidence(&self) -> Option<u32> {
        self.confidence
    }
}

// ── Extracted text ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedText {
    #[serde(default)]
    pub raw_text: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub candidate_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub candidate_number: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub objectives: Option<Vec<String>>,
    #[serde(default)]
    pub contains_non_arabic: Option<bool>,
}

// ── Analysis trace ───────────────────────────────────────────────────────

/// The model's step-by-step reasoning, kept for human review.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisTrace {
    #[serde(default)]
    pub step1_content_extraction: Option<String>,
    #[serde(default)]
    pub step2_document_classification: Option<String>,
    #[serde(default)]
    pub step3_rule_evaluation: Option<String>,
    #[serde(default)]
    pub step4_decision_logic: Option<String>,
    #[serde(default)]
    pub violations_found: Vec<String>,
}

impl AnalysisTrace {
    /// A trace with [`TRACE_PLACEHOLDER`] for every step.
    pub fn placeholder() -> Self {
        Self {
            step1_content_extraction: Some(TRACE_PLACEHOLDER.to_string()),
            step2_document_classification: Some(TRACE_PLACEHOLDER.to_string()),
            step3_rule_evaluation: Some(TRACE_PLACEHOLDER.to_string()),
            step4_decision_logic: Some(TRACE_PLACEHOLDER.to_string()),
            violations_found: Vec::new(),
        }
    }

    /// True when step 1 carries real content rather than a placeholder.
    pub fn has_extraction(&self) -> bool {
        self.step1_content_extraction
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty() && s != TRACE_PLACEHOLDER)
    }

    /// Append `note` to step 4 unless it is already there.
    ///
    /// Returns `true` when the trace changed.
    pub fn note_decision(&mut self, note: &str) -> bool {
        match self.step4_decision_logic.as_mut() {
            Some(existing) if existing.contains(note) => false,
            Some(existing) if existing.trim().is_empty() || existing == TRACE_PLACEHOLDER => {
                *existing = note.to_string();
                true
            }
            Some(existing) => {
                existing.push_str(" | ");
                existing.push_str(note);
                true
            }
            None => {
                self.step4_decision_logic = Some(note.to_string());
                true
            }
        }
    }
}

// ── Derived fields ───────────────────────────────────────────────────────

/// Advisory finding for human or UI review. Never changes the verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warning {
    #[serde(rename = "type")]
    pub kind: WarningKind,
    pub message: String,
    pub confidence: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningKind {
    /// The candidate-number finding matches a known false-positive shape.
    PossibleFalsePositive,
    /// A candidate number was reported but the text never says "candidate number".
    MissingContext,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub timestamp: DateTime<Utc>,
    pub model: String,
    pub has_reasoning_trace: bool,
    pub schema_valid: bool,
    #[serde(default)]
    pub logic_correction_applied: bool,
    /// Number of fixed-phrase rules that matched the extracted text.
    #[serde(default)]
    pub deterministic_matches: usize,
    #[serde(default)]
    pub ocr_used: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaValidation {
    pub valid: bool,
    #[serde(default)]
    pub errors: Vec<String>,
}

// ── Lenient scalar decoding ──────────────────────────────────────────────

/// Models are inconsistent about scalar types (`85`, `85.0`, `"85"`).
/// These helpers accept any of them instead of failing the whole reply.
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn int<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::Number(n)) => n
                .as_u64()
                .map(|v| v.min(u32::MAX as u64) as u32)
                .or_else(|| n.as_f64().map(|f| f.round().max(0.0) as u32)),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok().map(|f| f.round().max(0.0) as u32),
            _ => None,
        })
    }

    pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::String(s)) => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_partial_reply() {
        let r: ValidationResult = serde_json::from_value(json!({
            "isCompliant": true,
            "overallScore": 87.6,
            "documentType": { "isElectionPropaganda": true, "actualType": "something_new" }
        }))
        .unwrap();
        assert_eq!(r.overall_score, Some(88));
        assert_eq!(
            r.document_type.unwrap().actual_type,
            Some(DocumentKind::Other)
        );
        assert!(r.analysis_trace.is_none());
    }

    #[test]
    fn unknown_rule_decodes_to_marker() {
        let c: ProhibitedCheck =
            serde_json::from_value(json!({ "rule": "ALIEN_SYMBOL", "found": true })).unwrap();
        assert_eq!(c.rule, ProhibitedRule::Unknown);
        assert!(!c.rule_known());
    }

    #[test]
    fn candidate_number_may_be_numeric() {
        let t: ExtractedText =
            serde_json::from_value(json!({ "candidateNumber": 18, "phoneNumber": null })).unwrap();
        assert_eq!(t.candidate_number.as_deref(), Some("18"));
        assert_eq!(t.phone_number, None);
    }

    #[test]
    fn trace_serialises_under_underscore_key() {
        let r = ValidationResult {
            analysis_trace: Some(AnalysisTrace::placeholder()),
            ..Default::default()
        };
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(
            v["_analysis_trace"]["step1_content_extraction"],
            TRACE_PLACEHOLDER
        );
    }

    #[test]
    fn note_decision_replaces_placeholder_and_dedups() {
        let mut t = AnalysisTrace::placeholder();
        assert!(t.note_decision("forced"));
        assert_eq!(t.step4_decision_logic.as_deref(), Some("forced"));
        assert!(!t.note_decision("forced"));
        assert!(t.note_decision("second"));
        assert_eq!(t.step4_decision_logic.as_deref(), Some("forced | second"));
    }
}
