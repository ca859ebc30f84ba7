//! Fingerprint determinism: same facts, any shape, one digest.
//!
//! Covers:
//! - Legacy and structured records describing the same scan
//! - Order independence of string sets after normalization
//! - Sensitivity to every objective field flip
//! - Idempotence and standalone verification

use dossier_core::{
    fingerprint, normalize, normalize_value, verify_stored, CanonicalModel, RawFacts,
};
use serde_json::{json, Value};

fn legacy_fixture() -> Value {
    json!({
        "url": "https://shop.example.com/",
        "scan_id": "scan-42",
        "scannedAt": 1705312800000i64,
        "https": true,
        "privacyPolicy": true,
        "termsOfService": true,
        "cookiePolicy": false,
        "cookieBanner": false,
        "consentVendors": ["OneTrust", "Cookiebot"],
        "trackingScripts": ["GA4", "Meta Pixel"],
        "formsDetected": 2,
        "personalDataSignals": 1,
        "accessibilityNotes": ["Low contrast footer links"],
        "imagesTotal": 12,
        "imagesMissingAlt": 3,
        "contactDetected": true,
        "coverageNotes": ["robots.txt disallows /checkout"],
        "checkedPages": [
            {"url": "https://shop.example.com/about", "status": 200},
            {"url": "https://shop.example.com/", "status": 200}
        ],
        "failedPages": [{"url": "https://shop.example.com/blog", "status": 503}]
    })
}

fn structured_fixture() -> Value {
    json!({
        "signals": {
            "contact": {"detected": true},
            "accessibility": {
                "images": {"missingAlt": 3, "total": 12},
                "notes": ["Low contrast footer links  "]
            },
            "forms": {"personalDataSignals": 1, "detected": 2},
            "trackingScripts": ["Meta Pixel", "GA4", "GA4"],
            "consent": {"vendors": ["Cookiebot", "OneTrust"], "bannerDetected": false},
            "policies": {"cookies": false, "terms": true, "privacy": true}
        },
        "coverage": {
            "failedPages": [{"status": 503, "url": "https://shop.example.com/blog"}],
            "checkedPages": [
                {"url": "https://shop.example.com/", "status": 200},
                {"url": "https://shop.example.com/about", "status": 200}
            ],
            "notes": ["robots.txt disallows /checkout"]
        },
        "meta": {
            "https": true,
            "scannedAt": "2024-01-15T10:00:00.000Z",
            "scanId": "scan-42",
            "hostname": "shop.example.com",
            "url": "https://shop.example.com/"
        }
    })
}

#[test]
fn test_legacy_and_structured_fingerprints_match() {
    let legacy = normalize_value(&legacy_fixture());
    let structured = normalize_value(&structured_fixture());

    assert_eq!(legacy, structured, "canonical models must be field-for-field equal");
    assert_eq!(
        fingerprint(&legacy).unwrap(),
        fingerprint(&structured).unwrap()
    );
}

#[test]
fn test_vendor_order_does_not_matter() {
    let mut a = structured_fixture();
    a["signals"]["consent"]["vendors"] = json!(["OneTrust", "Cookiebot"]);
    let mut b = structured_fixture();
    b["signals"]["consent"]["vendors"] = json!(["Cookiebot", "OneTrust"]);

    assert_eq!(
        fingerprint(&normalize_value(&a)).unwrap(),
        fingerprint(&normalize_value(&b)).unwrap()
    );
}

fn assert_flip_changes(base: &CanonicalModel, name: &str, mutate: impl Fn(&mut CanonicalModel)) {
    let mut changed = base.clone();
    mutate(&mut changed);
    assert_ne!(
        fingerprint(&changed).unwrap(),
        fingerprint(base).unwrap(),
        "changing {} must change the fingerprint",
        name
    );
}

#[test]
fn test_every_objective_flip_changes_fingerprint() {
    let base = normalize_value(&structured_fixture());

    assert_flip_changes(&base, "https", |m| m.meta.https = !m.meta.https);
    assert_flip_changes(&base, "privacy", |m| {
        m.signals.policies.privacy = !m.signals.policies.privacy
    });
    assert_flip_changes(&base, "terms", |m| {
        m.signals.policies.terms = !m.signals.policies.terms
    });
    assert_flip_changes(&base, "cookies", |m| {
        m.signals.policies.cookies = !m.signals.policies.cookies
    });
    assert_flip_changes(&base, "banner", |m| {
        m.signals.consent.banner_detected = !m.signals.consent.banner_detected
    });
    assert_flip_changes(&base, "contact", |m| {
        m.signals.contact.detected = !m.signals.contact.detected
    });
    assert_flip_changes(&base, "forms", |m| m.signals.forms.detected += 1);
    assert_flip_changes(&base, "missingAlt", |m| {
        m.signals.accessibility.images.missing_alt += 1
    });
    assert_flip_changes(&base, "scannedAt", |m| {
        m.meta.scanned_at = "2024-01-16T10:00:00.000Z".to_string()
    });
    assert_flip_changes(&base, "trackingScripts", |m| {
        m.signals.tracking_scripts.pop();
    });
    assert_flip_changes(&base, "failedPages", |m| m.coverage.failed_pages.clear());
}

#[test]
fn test_fingerprint_is_idempotent() {
    let model = normalize(&RawFacts::from(legacy_fixture()));
    let first = fingerprint(&model).unwrap();
    let second = fingerprint(&model).unwrap();
    assert_eq!(first, second);

    // Re-normalizing the serialized canonical model changes nothing
    let stored = serde_json::to_value(&model).unwrap();
    assert_eq!(normalize_value(&stored), model);
}

#[test]
fn test_verification_from_stored_facts() {
    let model = normalize_value(&legacy_fixture());
    let fp = fingerprint(&model).unwrap();

    // Stored as canonical JSON, with storage metadata attached by the persistence layer
    let mut stored = serde_json::to_value(&model).unwrap();
    stored["storagePath"] = json!("s3://bucket/reports/scan-42.pdf");
    stored["shareToken"] = json!("tok_abc");

    let outcome = verify_stored(&stored, fp.as_str()).unwrap();
    assert!(outcome.matches, "stored facts must verify: {:?}", outcome);

    // Stored in the original legacy shape also verifies
    let outcome = verify_stored(&legacy_fixture(), fp.as_str()).unwrap();
    assert!(outcome.matches);
}
