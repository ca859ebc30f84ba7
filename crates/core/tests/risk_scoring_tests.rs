//! Risk scoring: fixed fast path, bounds and the documented worked example.

use dossier_core::{
    assess, assess_raw, synthesize, CanonicalModel, PageRef, RawFacts, RiskLevel, MAX_SCORE,
    NO_COVERAGE_SCORE,
};
use proptest::prelude::*;
use serde_json::json;

#[test]
fn test_worked_example_clamps_to_twelve() {
    let mut model = CanonicalModel::default();
    model
        .coverage
        .checked_pages
        .push(PageRef::new("https://example.com/", 200));
    model.meta.https = false;
    model.signals.tracking_scripts = vec!["GA4".to_string()];
    model.signals.consent.banner_detected = false;
    model.signals.forms.detected = 2;
    model.signals.forms.personal_data_signals = 1;
    model.signals.accessibility.images.total = 10;
    model.signals.accessibility.images.missing_alt = 4;
    model.signals.contact.detected = false;

    // 3 + 2 + 1 + 1 + 3 + 2 + 2 + 1 = 15, clamped
    let assessment = assess(&model);
    assert_eq!(assessment.score, 12);
    assert_eq!(assessment.level, RiskLevel::High);
    assert_eq!(assessment.reasons.len(), 8);
}

#[test]
fn test_raw_legacy_input_without_pages_is_worst_case() {
    let raw = RawFacts::from(json!({
        "url": "https://unreachable.test",
        "https": true,
        "privacyPolicy": true,
        "failedPages": [{"url": "https://unreachable.test/", "status": 0}]
    }));
    let assessment = assess_raw(&raw);
    assert_eq!(assessment.level, RiskLevel::High);
    assert_eq!(assessment.score, NO_COVERAGE_SCORE);
    assert!(!assessment.reasons.is_empty());
}

#[test]
fn test_assessment_serializes_level_names() {
    let assessment = assess(&CanonicalModel::default());
    let value = serde_json::to_value(&assessment).unwrap();
    assert_eq!(value["level"], json!("High"));
    assert_eq!(value["score"], json!(9));
}

fn model_strategy() -> impl Strategy<Value = CanonicalModel> {
    (
        any::<bool>(),
        any::<[bool; 3]>(),
        any::<bool>(),
        prop::collection::vec("[A-Za-z]{1,8}", 0..4),
        prop::collection::vec("[A-Za-z]{1,8}", 0..3),
        (0u32..6, 0u32..4),
        (0u32..50, 0u32..60),
        any::<bool>(),
        0usize..3,
    )
        .prop_map(
            |(https, policies, banner, tracking, vendors, forms, images, contact, pages)| {
                let mut model = CanonicalModel::default();
                model.meta.https = https;
                model.signals.policies.privacy = policies[0];
                model.signals.policies.terms = policies[1];
                model.signals.policies.cookies = policies[2];
                model.signals.consent.banner_detected = banner;
                model.signals.tracking_scripts = tracking;
                model.signals.consent.vendors = vendors;
                model.signals.forms.detected = forms.0;
                model.signals.forms.personal_data_signals = forms.1;
                model.signals.accessibility.images.total = images.0;
                model.signals.accessibility.images.missing_alt = images.1;
                model.signals.contact.detected = contact;
                for i in 0..pages {
                    model
                        .coverage
                        .checked_pages
                        .push(PageRef::new(format!("https://a.test/{}", i), 200));
                }
                model
            },
        )
}

proptest! {
    /// Property: the score is bounded and the level agrees with it.
    #[test]
    fn prop_score_bounded_and_level_consistent(model in model_strategy()) {
        let assessment = assess(&model);
        prop_assert!(assessment.score <= MAX_SCORE);
        prop_assert!(!assessment.reasons.is_empty());
        prop_assert_eq!(assessment.level, RiskLevel::from_score(assessment.score));
        if model.coverage.checked_pages.is_empty() {
            prop_assert_eq!(assessment.score, NO_COVERAGE_SCORE);
            prop_assert_eq!(assessment.level, RiskLevel::High);
        }
    }

    /// Property: findings always open with Coverage and close with Trust.
    #[test]
    fn prop_findings_bracketed(model in model_strategy()) {
        let findings = synthesize(&model);
        prop_assert!(findings.len() >= 2);
        prop_assert_eq!(findings[0].category.as_str(), "Coverage");
        prop_assert_eq!(findings[findings.len() - 1].category.as_str(), "Trust");
        for pair in findings.windows(2) {
            prop_assert!(pair[0].category < pair[1].category);
        }
    }
}
