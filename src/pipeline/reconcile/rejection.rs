//! Human-readable rejection reasons.
//!
//! When the model marks a poster non-compliant without saying why, the
//! reason is synthesised from the findings in a fixed priority order; the
//! first matching branch wins.

use crate::result::{
    DocumentKind, EthicsRule, ProhibitedRule, RequiredRule, ScopeRule, ValidationResult,
};

/// Fallback when no finding explains the rejection.
pub const GENERIC_REASON: &str = "The poster does not meet the election advertising requirements";

/// Reason for a document that is not election propaganda at all.
pub fn document_type_reason(kind: Option<DocumentKind>) -> &'static str {
    match kind {
        Some(DocumentKind::TrainingAd) => {
            "The request is an advertisement for a training course and not an election advertisement for the candidate"
        }
        Some(DocumentKind::CommercialAd) => {
            "The request is a commercial advertisement and not an election advertisement for the candidate"
        }
        Some(DocumentKind::EventAnnouncement) => {
            "The request is an event announcement and not an election advertisement for the candidate"
        }
        Some(DocumentKind::GreetingCard) => {
            "The request is a greeting card and not an election advertisement for the candidate"
        }
        Some(DocumentKind::GovernmentNotice) => {
            "The request is an official notice and not an election advertisement for the candidate"
        }
        Some(DocumentKind::PersonalPhoto) => {
            "The request is a personal photo and not an election advertisement for the candidate"
        }
        Some(DocumentKind::ElectionPropaganda) | Some(DocumentKind::Other) | None => {
            "The submitted document is not an election advertisement for the candidate"
        }
    }
}

/// Reason for a content-scope violation.
pub fn scope_reason(rule: ScopeRule) -> &'static str {
    match rule {
        ScopeRule::ObjectivesOutsidePowers => {
            "The poster includes objectives outside the legislative and oversight powers of a Shura Council member"
        }
        ScopeRule::ElectionPromises => {
            "The poster includes personal election promises or guarantees of services"
        }
        ScopeRule::DeviationFromScope => {
            "The poster content deviates from the role of the Shura Council"
        }
        ScopeRule::PreviousTermExploitation => {
            "The poster exploits achievements of a previous term as campaign material"
        }
        ScopeRule::Unknown => GENERIC_REASON,
    }
}

fn prohibited_reason(rule: ProhibitedRule, details: &str) -> &'static str {
    match rule {
        ProhibitedRule::CandidateNumber => {
            "The poster contains a candidate number, which is not allowed on campaign posters"
        }
        ProhibitedRule::ElectionLogo => "The poster contains the official election logo, which is not allowed",
        ProhibitedRule::HistoricalSymbols => {
            let d = details.to_lowercase();
            if ["fort", "castle", "قلعة", "حصن"].iter().any(|k| d.contains(k)) {
                "The poster contains an image of a fort or castle; historical landmarks are not allowed"
            } else if ["gate", "بوابة", "باب"].iter().any(|k| d.contains(k)) {
                "The poster contains an image of a historic gate; historical landmarks are not allowed"
            } else {
                "The poster contains historical symbols or landmarks, which are not allowed"
            }
        }
        ProhibitedRule::PublicFigures => "The poster contains images of public figures, which is not allowed",
        ProhibitedRule::StateEmblem => "The poster contains the state emblem, which is not allowed",
        ProhibitedRule::NationalFlag => "The poster contains the national flag, which is not allowed",
        ProhibitedRule::ReligiousSymbols => {
            "The poster uses religious symbols for campaigning, which is not allowed"
        }
        ProhibitedRule::Unknown => GENERIC_REASON,
    }
}

fn required_reason(rule: RequiredRule) -> &'static str {
    match rule {
        RequiredRule::CandidatePhoto => "The poster does not include a clear personal photo of the candidate",
        RequiredRule::CandidateName => "The poster does not include the candidate's name",
        RequiredRule::Unknown => GENERIC_REASON,
    }
}

fn ethics_reason(rule: EthicsRule) -> &'static str {
    match rule {
        EthicsRule::ForeignLanguage => "The poster contains campaign text in a language other than Arabic",
        EthicsRule::OffensiveLanguage => "The poster contains offensive or defamatory language",
        EthicsRule::TribalSectarianAppeal => "The poster contains tribal, sectarian or regional appeals",
        EthicsRule::Unknown => GENERIC_REASON,
    }
}

const COMBINED_NUMBER_AND_LOGO: &str =
    "The poster contains the candidate's number and the official election logo, neither of which is allowed";

const PROHIBITED_PRIORITY: &[ProhibitedRule] = &[
    ProhibitedRule::CandidateNumber,
    ProhibitedRule::ElectionLogo,
    ProhibitedRule::HistoricalSymbols,
    ProhibitedRule::PublicFigures,
    ProhibitedRule::StateEmblem,
    ProhibitedRule::NationalFlag,
    ProhibitedRule::ReligiousSymbols,
];

const SCOPE_PRIORITY: &[ScopeRule] = &[
    ScopeRule::ObjectivesOutsidePowers,
    ScopeRule::ElectionPromises,
    ScopeRule::DeviationFromScope,
    ScopeRule::PreviousTermExploitation,
];

const BLUR_KEYWORDS: &[&str] = &["blur", "unclear", "out of focus", "ضباب", "غير واضح", "مشوش"];

/// Pick the highest-priority explanation for a non-compliant result.
pub fn synthesize(result: &ValidationResult) -> String {
    // 1. Not election material at all
    if result.is_election_propaganda() == Some(false) {
        let kind = result.document_type.as_ref().and_then(|d| d.actual_type);
        return document_type_reason(kind).to_string();
    }

    // 2. Image quality
    if let Some(q) = result.image_quality.as_ref() {
        if q.is_acceptable == Some(false) {
            let issues = q.issues.as_deref().unwrap_or(&[]);
            let blurry = issues.iter().any(|i| {
                let i = i.to_lowercase();
                BLUR_KEYWORDS.iter().any(|k| i.contains(k))
            });
            return if blurry {
                "The image is blurry or unclear; please upload a clearer photo of the poster".to_string()
            } else {
                "The image quality is not acceptable for review".to_string()
            };
        }
    }

    // 3. Prohibited content
    if result.prohibited_found(ProhibitedRule::CandidateNumber)
        && result.prohibited_found(ProhibitedRule::ElectionLogo)
    {
        return COMBINED_NUMBER_AND_LOGO.to_string();
    }
    for &rule in PROHIBITED_PRIORITY {
        if result.prohibited_found(rule) {
            let details = result
                .prohibited(rule)
                .and_then(|c| c.details.as_deref())
                .unwrap_or("");
            return prohibited_reason(rule, details).to_string();
        }
    }

    // 4. Content scope
    for &rule in SCOPE_PRIORITY {
        if result
            .scope_checks()
            .iter()
            .any(|c| c.rule == rule && c.violated == Some(true))
        {
            return scope_reason(rule).to_string();
        }
    }

    // 5. Missing required content
    for &rule in RequiredRule::ALL {
        if result
            .required_checks()
            .iter()
            .any(|c| c.rule == rule && c.present == Some(false))
        {
            return required_reason(rule).to_string();
        }
    }

    // 6. Language and ethics
    for &rule in EthicsRule::ALL {
        if result
            .ethics_checks()
            .iter()
            .any(|c| c.rule == rule && c.violated == Some(true))
        {
            return ethics_reason(rule).to_string();
        }
    }

    GENERIC_REASON.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result(value: serde_json::Value) -> ValidationResult {
        serde_json::from_value(value).unwrap()
    }

    fn prohibited(checks: serde_json::Value) -> ValidationResult {
        result(json!({
            "isCompliant": false,
            "documentType": { "isElectionPropaganda": true },
            "categories": { "prohibitedContent": { "status": "fail", "checks": checks } }
        }))
    }

    #[test]
    fn document_type_wins_over_everything() {
        let r = result(json!({
            "documentType": { "isElectionPropaganda": false, "actualType": "commercial_ad" },
            "imageQuality": { "isAcceptable": false, "issues": ["blurry"] }
        }));
        assert!(synthesize(&r).contains("commercial advertisement"));
    }

    #[test]
    fn blurry_image_message() {
        let r = result(json!({ "imageQuality": { "isAcceptable": false, "issues": ["Image is Blurry"] } }));
        assert!(synthesize(&r).starts_with("The image is blurry"));
    }

    #[test]
    fn number_and_logo_combined() {
        let r = prohibited(json!([
            { "rule": "ELECTION_LOGO", "found": true },
            { "rule": "CANDIDATE_NUMBER", "found": true }
        ]));
        assert_eq!(synthesize(&r), COMBINED_NUMBER_AND_LOGO);
    }

    #[test]
    fn logo_alone() {
        let r = prohibited(json!([
            { "rule": "CANDIDATE_NUMBER", "found": false },
            { "rule": "ELECTION_LOGO", "found": true }
        ]));
        assert!(synthesize(&r).contains("election logo"));
    }

    #[test]
    fn historical_symbols_sub_branches() {
        let fort = prohibited(json!([{ "rule": "HISTORICAL_SYMBOLS", "found": true, "details": "صورة قلعة نزوى" }]));
        assert!(synthesize(&fort).contains("fort or castle"));

        let gate = prohibited(json!([{ "rule": "HISTORICAL_SYMBOLS", "found": true, "details": "Muscat Gate in background" }]));
        assert!(synthesize(&gate).contains("historic gate"));

        let other = prohibited(json!([{ "rule": "HISTORICAL_SYMBOLS", "found": true, "details": "old dhow" }]));
        assert!(synthesize(&other).contains("historical symbols"));
    }

    #[test]
    fn prohibited_beats_scope() {
        let r = result(json!({
            "categories": {
                "prohibitedContent": { "status": "fail", "checks": [{ "rule": "NATIONAL_FLAG", "found": true }] },
                "contentScope": { "status": "fail", "checks": [{ "rule": "ELECTION_PROMISES", "violated": true }] }
            }
        }));
        assert!(synthesize(&r).contains("national flag"));
    }

    #[test]
    fn scope_order_is_respected() {
        let r = result(json!({
            "categories": {
                "contentScope": { "status": "fail", "checks": [
                    { "rule": "PREVIOUS_TERM_EXPLOITATION", "violated": true },
                    { "rule": "ELECTION_PROMISES", "violated": true }
                ] }
            }
        }));
        assert_eq!(synthesize(&r), scope_reason(ScopeRule::ElectionPromises));
    }

    #[test]
    fn missing_photo_then_name() {
        let r = result(json!({
            "categories": {
                "requiredContent": { "status": "fail", "checks": [
                    { "rule": "CANDIDATE_NAME", "present": false },
                    { "rule": "CANDIDATE_PHOTO", "present": false }
                ] }
            }
        }));
        assert!(synthesize(&r).contains("photo"));
    }

    #[test]
    fn generic_fallback() {
        assert_eq!(synthesize(&ValidationResult::default()), GENERIC_REASON);
    }
}
