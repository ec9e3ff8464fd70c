//! Behavioural tests for the reconciler.
//!
//! Every test starts from a model reply as JSON, the way it arrives from the
//! VLM, and checks the reconciled [`ValidationResult`].

use chrono::{TimeZone, Utc};
use poster_check::result::{ProhibitedRule, ScopeRule, WarningKind};
use poster_check::{reconcile, Correction, ReconcileContext, ValidationResult};
use serde_json::{json, Value};

const TRAINING_AD_REASON: &str =
    "The request is an advertisement for a training course and not an election advertisement for the candidate";

const CANDIDATE_NUMBER_REASON: &str =
    "The poster contains a candidate number, which is not allowed on campaign posters";

// ── Fixtures ─────────────────────────────────────────────────────────────────

fn ctx() -> ReconcileContext {
    ReconcileContext {
        model: "gpt-4.1-mini".to_string(),
        timestamp: Utc.with_ymd_and_hms(2025, 9, 1, 8, 0, 0).unwrap(),
        ocr_used: false,
    }
}

/// A schema-complete, compliant election poster reply.
fn compliant_reply(raw_text: &str) -> Value {
    json!({
        "isCompliant": true,
        "overallScore": 92,
        "summary": "Compliant campaign poster",
        "rejectionReason": null,
        "documentType": {
            "isElectionPropaganda": true,
            "actualType": "election_propaganda",
            "confidence": 95,
            "reasoning": "Candidate photo, name and Shura Council objectives"
        },
        "imageQuality": { "isAcceptable": true, "issues": [] },
        "categories": {
            "prohibitedContent": { "status": "pass", "checks": [
                { "rule": "CANDIDATE_NUMBER", "found": false, "confidence": 90, "details": "" },
                { "rule": "ELECTION_LOGO", "found": false, "confidence": 95, "details": "" },
                { "rule": "NATIONAL_FLAG", "found": false, "confidence": 95, "details": "" }
            ] },
            "requiredContent": { "status": "pass", "checks": [
                { "rule": "CANDIDATE_PHOTO", "present": true, "confidence": 98, "details": "" },
                { "rule": "CANDIDATE_NAME", "present": true, "confidence": 97, "details": "" }
            ] },
            "contentScope": { "status": "pass", "checks": [
                { "rule": "OBJECTIVES_OUTSIDE_POWERS", "violated": false, "confidence": 85,
                  "violatingObjectives": [], "explanation": "" }
            ] },
            "languageEthics": { "status": "pass", "checks": [
                { "rule": "FOREIGN_LANGUAGE", "violated": false, "confidence": 90, "details": "" }
            ] }
        },
        "extractedText": {
            "rawText": raw_text,
            "candidateName": "أحمد بن سالم",
            "candidateNumber": null,
            "phoneNumber": null,
            "objectives": [],
            "containsNonArabic": false
        },
        "_analysis_trace": {
            "step1_content_extraction": format!("Text read: {raw_text}"),
            "step2_document_classification": "Election poster",
            "step3_rule_evaluation": "No prohibited content",
            "step4_decision_logic": "All rules pass",
            "violations_found": []
        }
    })
}

fn decode(value: Value) -> ValidationResult {
    serde_json::from_value(value).expect("fixture must decode")
}

fn set(value: &mut Value, pointer: &str, new: Value) {
    *value.pointer_mut(pointer).expect("pointer must exist") = new;
}

/// Reply with CANDIDATE_NUMBER reported as found and the verdict flipped.
fn candidate_number_reply(raw_text: &str, details: &str) -> Value {
    let mut v = compliant_reply(raw_text);
    set(&mut v, "/isCompliant", json!(false));
    set(&mut v, "/overallScore", json!(20));
    set(&mut v, "/categories/prohibitedContent/status", json!("fail"));
    set(
        &mut v,
        "/categories/prohibitedContent/checks/0",
        json!({ "rule": "CANDIDATE_NUMBER", "found": true, "confidence": 88, "details": details }),
    );
    set(&mut v, "/_analysis_trace/violations_found", json!(["CANDIDATE_NUMBER"]));
    v
}

// ── Non-election documents ───────────────────────────────────────────────────

#[test]
fn training_ad_marked_compliant_is_corrected() {
    let mut v = compliant_reply("دورة تدريبية في إدارة المشاريع");
    set(&mut v, "/documentType/isElectionPropaganda", json!(false));
    set(&mut v, "/documentType/actualType", json!("training_ad"));

    let out = reconcile(decode(v), &ctx());
    let r = &out.result;

    assert_eq!(r.is_compliant, Some(false));
    assert_eq!(r.overall_score, Some(0));
    assert_eq!(r.rejection_reason.as_deref(), Some(TRAINING_AD_REASON));
    assert!(r.metadata.as_ref().unwrap().logic_correction_applied);
    assert!(out
        .corrections
        .contains(&Correction::NonElectionForcedNonCompliant));
    assert!(r
        .analysis_trace
        .as_ref()
        .unwrap()
        .step4_decision_logic
        .as_deref()
        .unwrap()
        .contains("not election propaganda"));
}

#[test]
fn non_election_is_never_compliant() {
    for kind in ["commercial_ad", "greeting_card", "event_announcement", "personal_photo", "something_new"] {
        for verdict in [json!(true), json!(false), Value::Null] {
            let mut v = compliant_reply("عرض خاص");
            set(&mut v, "/documentType/isElectionPropaganda", json!(false));
            set(&mut v, "/documentType/actualType", json!(kind));
            set(&mut v, "/isCompliant", verdict.clone());
            set(&mut v, "/overallScore", json!(70));

            let r = reconcile(decode(v), &ctx()).result;
            assert_eq!(r.is_compliant, Some(false), "{kind} / {verdict}");
            assert_eq!(r.overall_score, Some(0), "{kind} / {verdict}");
            assert!(!r.rejection_reason.unwrap().is_empty());
        }
    }
}

// ── Rejection reasons ────────────────────────────────────────────────────────

#[test]
fn non_compliant_always_gets_a_reason() {
    let replies = [
        json!({}),
        json!({ "isCompliant": false, "rejectionReason": "" }),
        json!({ "isCompliant": false, "rejectionReason": "   " }),
        json!({ "isCompliant": false, "rejectionReason": null }),
        candidate_number_reply("رقم المرشح 5", ""),
    ];
    for reply in replies {
        let r = reconcile(decode(reply), &ctx()).result;
        assert_eq!(r.is_compliant, Some(false));
        let reason = r.rejection_reason.unwrap_or_default();
        assert!(!reason.trim().is_empty());
    }
}

#[test]
fn model_reason_is_kept() {
    let mut v = candidate_number_reply("رقم المرشح 5", "");
    set(&mut v, "/rejectionReason", json!("Ballot number printed in the corner"));
    let r = reconcile(decode(v), &ctx()).result;
    assert_eq!(
        r.rejection_reason.as_deref(),
        Some("Ballot number printed in the corner")
    );
}

// ── Candidate number heuristics ──────────────────────────────────────────────

#[test]
fn explicit_candidate_number_phrase_keeps_violation() {
    let raw = "مرشحكم لعضوية مجلس الشورى رقم المرشح 18";
    let out = reconcile(decode(candidate_number_reply(raw, "18")), &ctx());
    let r = &out.result;

    assert!(r.warnings.iter().all(|w| w.kind != WarningKind::MissingContext));
    assert!(r.warnings.is_empty());
    assert!(r.prohibited_found(ProhibitedRule::CandidateNumber));
    assert_eq!(r.is_compliant, Some(false));
    assert_eq!(r.rejection_reason.as_deref(), Some(CANDIDATE_NUMBER_REASON));
}

#[test]
fn contact_number_triggers_both_warnings() {
    let raw = "أحمد بن سالم مرشحكم لمجلس الشورى للتواصل 99123456";
    let out = reconcile(decode(candidate_number_reply(raw, "99123456")), &ctx());
    let kinds: Vec<WarningKind> = out.result.warnings.iter().map(|w| w.kind).collect();

    assert!(kinds.contains(&WarningKind::PossibleFalsePositive));
    assert!(kinds.contains(&WarningKind::MissingContext));
    assert_eq!(kinds.len(), 2);

    let fp = out
        .result
        .warnings
        .iter()
        .find(|w| w.kind == WarningKind::PossibleFalsePositive)
        .unwrap();
    assert_eq!(fp.confidence, 60);
    assert!(fp.message.contains("phone number"));
    // Warnings are advisory; the finding stays.
    assert!(out.result.prohibited_found(ProhibitedRule::CandidateNumber));
}

#[test]
fn no_warnings_when_candidate_number_not_found() {
    let raw = "للتواصل 99123456";
    let r = reconcile(decode(compliant_reply(raw)), &ctx()).result;
    assert!(r.warnings.is_empty());
}

// ── Deterministic phrase rules ───────────────────────────────────────────────

#[test]
fn job_seekers_phrase_injects_one_violation() {
    let raw = "أهدافي: حل ملف الباحثين عن عمل ودعم التعليم";
    let out = reconcile(decode(compliant_reply(raw)), &ctx());
    let r = &out.result;

    assert_eq!(r.is_compliant, Some(false));
    assert_eq!(r.overall_score, Some(0));

    let injected: Vec<_> = r
        .scope_checks()
        .iter()
        .filter(|c| c.rule == ScopeRule::ObjectivesOutsidePowers && c.violated == Some(true))
        .collect();
    assert_eq!(injected.len(), 1);
    assert_eq!(injected[0].confidence, Some(100));
    assert_eq!(injected[0].violating_objectives, vec!["حل ملف الباحثين عن عمل".to_string()]);

    assert!(r
        .rejection_reason
        .as_deref()
        .unwrap()
        .contains("outside the legislative and oversight powers"));
    assert_eq!(r.metadata.as_ref().unwrap().deterministic_matches, 1);
    assert!(out.corrections.iter().any(|c| matches!(
        c,
        Correction::ViolationInjected { rule: ScopeRule::ObjectivesOutsidePowers, .. }
    )));

    let rerun = reconcile(r.clone(), &ctx());
    let again: Vec<_> = rerun
        .result
        .scope_checks()
        .iter()
        .filter(|c| c.rule == ScopeRule::ObjectivesOutsidePowers && c.violated == Some(true))
        .collect();
    assert_eq!(again.len(), 1);
}

#[test]
fn phrases_joined_by_conjunction_both_fire() {
    let raw = "حل ملف الباحثين عن عمل ونضمن لكم إنجاز جميع الخدمات";
    let r = reconcile(decode(compliant_reply(raw)), &ctx()).result;

    assert_eq!(r.metadata.as_ref().unwrap().deterministic_matches, 2);
    let promise = r
        .scope_checks()
        .iter()
        .find(|c| c.rule == ScopeRule::ElectionPromises)
        .unwrap();
    assert_eq!(promise.violating_objectives, vec!["نضمن لكم إنجاز جميع الخدمات".to_string()]);
}

#[test]
fn model_reported_violation_is_not_duplicated() {
    let raw = "نضمن لكم إنجاز جميع الخدمات";
    let mut v = compliant_reply(raw);
    set(&mut v, "/isCompliant", json!(false));
    set(&mut v, "/overallScore", json!(0));
    set(
        &mut v,
        "/categories/contentScope/checks/0",
        json!({
            "rule": "ELECTION_PROMISES", "violated": true, "confidence": 90,
            "violatingObjectives": [raw], "explanation": "Guarantee of services"
        }),
    );

    let out = reconcile(decode(v), &ctx());
    assert_eq!(out.result.scope_checks().len(), 1);
    assert!(!out
        .corrections
        .iter()
        .any(|c| matches!(c, Correction::ViolationInjected { .. })));
}

#[test]
fn phrase_rule_appends_to_model_reason() {
    let raw = "سأسعى للحصول على منح أراضي سكنية للشباب";
    let mut v = candidate_number_reply(raw, "");
    set(&mut v, "/rejectionReason", json!("Candidate number shown"));

    let r = reconcile(decode(v), &ctx()).result;
    let reason = r.rejection_reason.unwrap();
    assert!(reason.starts_with("Candidate number shown | "));
    assert!(reason.contains("election promises"));
}

// ── Derived fields ───────────────────────────────────────────────────────────

#[test]
fn confidence_always_in_range() {
    let mut replies = vec![
        json!({}),
        compliant_reply("أحمد بن سالم"),
        candidate_number_reply("للتواصل 99123456", "99123456"),
        compliant_reply("حل ملف الباحثين عن عمل"),
    ];
    let mut low = compliant_reply("x");
    set(&mut low, "/categories/prohibitedContent/checks/0/confidence", json!(5));
    set(&mut low, "/categories/prohibitedContent/checks/1/confidence", json!(5));
    set(&mut low, "/categories/prohibitedContent/checks/2/confidence", json!(5));
    set(&mut low, "/categories/contentScope/checks/0/confidence", json!(5));
    replies.push(low);

    for reply in replies {
        let c = reconcile(decode(reply), &ctx()).result.validation_confidence.unwrap();
        assert!((50..=100).contains(&c), "confidence {c} out of range");
    }
}

#[test]
fn metadata_is_stamped_from_context() {
    let r = reconcile(decode(compliant_reply("أحمد")), &ctx().with_ocr(true)).result;
    let meta = r.metadata.unwrap();
    assert_eq!(meta.model, "gpt-4.1-mini");
    assert_eq!(meta.timestamp, ctx().timestamp);
    assert!(meta.ocr_used);
    assert!(meta.schema_valid);
    assert!(meta.has_reasoning_trace);
    assert!(!meta.logic_correction_applied);
    assert!(meta.error.is_none());
    assert!(r.schema_validation.unwrap().valid);
}

#[test]
fn missing_trace_is_synthesised() {
    let mut v = compliant_reply("أحمد");
    v.as_object_mut().unwrap().remove("_analysis_trace");

    let out = reconcile(decode(v), &ctx());
    let trace = out.result.analysis_trace.as_ref().unwrap();
    assert!(!trace.has_extraction());
    assert!(out.corrections.contains(&Correction::TraceSynthesized));
    assert!(!out.result.metadata.as_ref().unwrap().has_reasoning_trace);
    assert!(!out.result.metadata.as_ref().unwrap().schema_valid);
}

#[test]
fn compliant_poster_passes_untouched() {
    let input = decode(compliant_reply("أحمد بن سالم مرشحكم لمجلس الشورى"));
    let out = reconcile(input.clone(), &ctx());
    assert!(out.corrections.is_empty());
    assert_eq!(out.result.is_compliant, Some(true));
    assert_eq!(out.result.overall_score, Some(92));
    assert_eq!(out.result.categories, input.categories);
    assert_eq!(out.result.validation_confidence, Some(95));
}

// ── Idempotence ──────────────────────────────────────────────────────────────

#[test]
fn reconcile_is_idempotent() {
    let mut training = compliant_reply("دورة تدريبية");
    set(&mut training, "/documentType/isElectionPropaganda", json!(false));
    set(&mut training, "/documentType/actualType", json!("training_ad"));

    let fixtures = [
        compliant_reply("أحمد بن سالم"),
        compliant_reply("حل ملف الباحثين عن عمل ونضمن لكم إنجاز جميع الخدمات"),
        candidate_number_reply("للتواصل 99123456", "99123456"),
        candidate_number_reply("مرشحكم لعضوية مجلس الشورى رقم المرشح 18", "18"),
        training,
    ];

    for fixture in fixtures {
        let once = reconcile(decode(fixture), &ctx());
        let twice = reconcile(once.result.clone(), &ctx());
        assert_eq!(twice.result, once.result);
        assert!(twice.corrections.is_empty(), "{:?}", twice.corrections);
    }
}

#[test]
fn incomplete_reply_reconciles_idempotently() {
    let raw = json!({
        "isCompliant": true,
        "documentType": { "isElectionPropaganda": false, "actualType": "training_ad" },
        "categories": { "languageEthics": { "checks": [{ "rule": "EMOJI" }] } }
    });
    let once = reconcile(decode(raw), &ctx());
    assert!(!once.corrections.is_empty());

    let twice = reconcile(once.result.clone(), &ctx());
    assert_eq!(twice.result, once.result);
    assert!(twice.corrections.is_empty(), "{:?}", twice.corrections);

    let schema = twice.result.schema_validation.as_ref().unwrap();
    assert!(!schema.valid);
    assert!(schema.errors.iter().any(|e| e.starts_with("Unrecognized rule")));
    assert!(!twice.result.metadata.as_ref().unwrap().schema_valid);
}

#[test]
fn reconciled_result_survives_json_round_trip() {
    let once = reconcile(
        decode(candidate_number_reply("للتواصل 99123456", "99123456")),
        &ctx(),
    )
    .result;
    let wire = serde_json::to_value(&once).unwrap();
    assert_eq!(wire["warnings"][0]["type"], "POSSIBLE_FALSE_POSITIVE");
    assert!(wire.get("_analysis_trace").is_some());

    let twice = reconcile(decode(wire), &ctx());
    assert_eq!(twice.result, once);
}
