//! Signal Normalizer: maps either raw shape onto one [`CanonicalModel`].
//!
//! This is the only place where "same facts, different shape" is resolved.
//! It never fails: absent or malformed fields degrade to zero values (empty
//! string, empty list, `false`, `0`). Degradations can be collected with
//! [`normalize_with_report`] and are always logged at debug level.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::error::{Degradation, DegradationCode};
use crate::model::{
    Accessibility, CanonicalModel, Consent, Contact, Coverage, Forms, Images, Meta, PageRef,
    Policies, Signals,
};
use crate::raw::{Fields, RawFacts};

// ============================================================================
// Field aliases
// ============================================================================

const URL: &[&str] = &["url", "targetUrl", "target_url"];
const HOSTNAME: &[&str] = &["hostname", "host"];
const SCAN_ID: &[&str] = &["scanId", "scan_id"];
const SCANNED_AT: &[&str] = &["scannedAt", "scanned_at", "timestamp", "scanTime", "scan_time"];
const HTTPS: &[&str] = &["https", "isHttps", "is_https"];

const NOTES: &[&str] = &["notes"];
const CHECKED_PAGES: &[&str] = &["checkedPages", "checked_pages", "pagesChecked"];
const FAILED_PAGES: &[&str] = &["failedPages", "failed_pages", "pagesFailed"];

const POLICIES: &[&str] = &["policies"];
const PRIVACY: &[&str] = &["privacy", "privacyPolicy", "privacy_policy"];
const TERMS: &[&str] = &["terms", "termsOfService", "terms_of_service"];
const COOKIES: &[&str] = &["cookies", "cookiePolicy", "cookie_policy"];
const CONSENT: &[&str] = &["consent"];
const BANNER: &[&str] = &["bannerDetected", "banner_detected", "banner"];
const VENDORS: &[&str] = &["vendors"];
const TRACKING: &[&str] = &["trackingScripts", "tracking_scripts", "trackers"];
const FORMS: &[&str] = &["forms"];
const FORMS_DETECTED: &[&str] = &["detected", "count"];
const PERSONAL_DATA: &[&str] = &["personalDataSignals", "personal_data_signals"];
const ACCESSIBILITY: &[&str] = &["accessibility"];
const IMAGES: &[&str] = &["images"];
const IMAGES_TOTAL: &[&str] = &["total"];
const MISSING_ALT: &[&str] = &["missingAlt", "missing_alt"];
const CONTACT: &[&str] = &["contact"];
const CONTACT_DETECTED: &[&str] = &["detected"];

// Flat legacy names for the same facts
const LEGACY_PRIVACY: &[&str] = &["privacyPolicy", "privacy_policy", "hasPrivacyPolicy"];
const LEGACY_TERMS: &[&str] = &["termsOfService", "terms_of_service", "terms", "hasTerms"];
const LEGACY_COOKIES: &[&str] = &["cookiePolicy", "cookie_policy", "hasCookiePolicy"];
const LEGACY_BANNER: &[&str] = &[
    "cookieBanner",
    "cookie_banner",
    "consentBanner",
    "consent_banner",
    "bannerDetected",
];
const LEGACY_VENDORS: &[&str] = &["consentVendors", "consent_vendors", "vendors", "cmpVendors"];
const LEGACY_FORMS: &[&str] = &["formsDetected", "forms_detected", "forms"];
const LEGACY_PERSONAL_DATA: &[&str] = &[
    "personalDataSignals",
    "personal_data_signals",
    "personalDataFields",
];
const LEGACY_A11Y_NOTES: &[&str] = &["accessibilityNotes", "accessibility_notes"];
const LEGACY_IMAGES_TOTAL: &[&str] = &["imagesTotal", "images_total", "imageCount"];
const LEGACY_MISSING_ALT: &[&str] = &["imagesMissingAlt", "images_missing_alt", "missingAlt"];
const LEGACY_CONTACT: &[&str] = &["contactDetected", "contact_detected", "contact", "hasContact"];
const LEGACY_NOTES: &[&str] = &["coverageNotes", "coverage_notes", "notes"];

// ============================================================================
// Public API
// ============================================================================

/// Normalization result with the degradations that were absorbed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Normalized {
    pub model: CanonicalModel,
    pub degradations: Vec<Degradation>,
}

/// Normalize raw facts into the canonical model. Never fails.
pub fn normalize(raw: &RawFacts) -> CanonicalModel {
    normalize_with_report(raw).model
}

/// Normalize an arbitrary JSON record (shape is detected first).
pub fn normalize_value(value: &Value) -> CanonicalModel {
    normalize(&RawFacts::from(value.clone()))
}

/// Normalize and report every field that fell back to a zero value.
pub fn normalize_with_report(raw: &RawFacts) -> Normalized {
    let mut ctx = Normalizer::default();
    let model = match raw {
        RawFacts::Legacy(fields) => ctx.legacy(Fields::new(fields)),
        RawFacts::Structured {
            meta,
            coverage,
            signals,
        } => ctx.structured(Fields::new(meta), Fields::new(coverage), Fields::new(signals)),
    };

    for degradation in &ctx.degradations {
        tracing::debug!(
            code = degradation.code.as_str(),
            field = %degradation.field,
            "normalization degraded: {}",
            degradation.detail
        );
    }

    Normalized {
        model,
        degradations: ctx.degradations,
    }
}

// ============================================================================
// Shape mapping
// ============================================================================

#[derive(Default)]
struct Normalizer {
    degradations: Vec<Degradation>,
}

impl Normalizer {
    fn structured(&mut self, meta: Fields<'_>, coverage: Fields<'_>, signals: Fields<'_>) -> CanonicalModel {
        let policies = signals.group(POLICIES);
        let consent = signals.group(CONSENT);
        let forms = signals.group(FORMS);
        let accessibility = signals.group(ACCESSIBILITY);
        let images = accessibility.group(IMAGES);
        let contact = signals.group(CONTACT);

        CanonicalModel {
            meta: self.meta(meta),
            coverage: Coverage {
                notes: self.string_set("coverage.notes", coverage.lookup(NOTES)),
                checked_pages: self.pages("coverage.checkedPages", coverage.lookup(CHECKED_PAGES)),
                failed_pages: self.pages("coverage.failedPages", coverage.lookup(FAILED_PAGES)),
            },
            signals: Signals {
                policies: Policies {
                    privacy: self.flag("signals.policies.privacy", policies.lookup(PRIVACY)),
                    terms: self.flag("signals.policies.terms", policies.lookup(TERMS)),
                    cookies: self.flag("signals.policies.cookies", policies.lookup(COOKIES)),
                },
                consent: Consent {
                    banner_detected: self.flag("signals.consent.bannerDetected", consent.lookup(BANNER)),
                    vendors: self.string_set("signals.consent.vendors", consent.lookup(VENDORS)),
                },
                tracking_scripts: self.string_set("signals.trackingScripts", signals.lookup(TRACKING)),
                forms: Forms {
                    detected: self.count("signals.forms.detected", forms.lookup(FORMS_DETECTED)),
                    personal_data_signals: self
                        .count("signals.forms.personalDataSignals", forms.lookup(PERSONAL_DATA)),
                },
                accessibility: Accessibility {
                    notes: self.string_set("signals.accessibility.notes", accessibility.lookup(NOTES)),
                    images: Images {
                        total: self.count("signals.accessibility.images.total", images.lookup(IMAGES_TOTAL)),
                        missing_alt: self
                            .count("signals.accessibility.images.missingAlt", images.lookup(MISSING_ALT)),
                    },
                },
                contact: Contact {
                    detected: self.flag("signals.contact.detected", contact.lookup(CONTACT_DETECTED)),
                },
            },
        }
    }

    fn legacy(&mut self, flat: Fields<'_>) -> CanonicalModel {
        // A legacy record may still nest individual groups (e.g. `forms: {...}`)
        let forms_value = flat.lookup(LEGACY_FORMS);
        let (forms_detected, nested_personal) = match forms_value {
            Some(Value::Object(map)) => {
                let nested = Fields::new(map);
                (
                    self.count("signals.forms.detected", nested.lookup(FORMS_DETECTED)),
                    nested.lookup(PERSONAL_DATA),
                )
            }
            other => (self.count("signals.forms.detected", other), None),
        };
        let personal = flat.lookup(LEGACY_PERSONAL_DATA).or(nested_personal);
        let contact = match flat.lookup(LEGACY_CONTACT) {
            Some(Value::Object(map)) => Fields::new(map).lookup(CONTACT_DETECTED),
            other => other,
        };

        CanonicalModel {
            meta: self.meta(flat),
            coverage: Coverage {
                notes: self.string_set("coverage.notes", flat.lookup(LEGACY_NOTES)),
                checked_pages: self.pages("coverage.checkedPages", flat.lookup(CHECKED_PAGES)),
                failed_pages: self.pages("coverage.failedPages", flat.lookup(FAILED_PAGES)),
            },
            signals: Signals {
                policies: Policies {
                    privacy: self.flag("signals.policies.privacy", flat.lookup(LEGACY_PRIVACY)),
                    terms: self.flag("signals.policies.terms", flat.lookup(LEGACY_TERMS)),
                    cookies: self.flag("signals.policies.cookies", flat.lookup(LEGACY_COOKIES)),
                },
                consent: Consent {
                    banner_detected: self.flag("signals.consent.bannerDetected", flat.lookup(LEGACY_BANNER)),
                    vendors: self.string_set("signals.consent.vendors", flat.lookup(LEGACY_VENDORS)),
                },
                tracking_scripts: self.string_set("signals.trackingScripts", flat.lookup(TRACKING)),
                forms: Forms {
                    detected: forms_detected,
                    personal_data_signals: self.count("signals.forms.personalDataSignals", personal),
                },
                accessibility: Accessibility {
                    notes: self.string_set("signals.accessibility.notes", flat.lookup(LEGACY_A11Y_NOTES)),
                    images: Images {
                        total: self.count("signals.accessibility.images.total", flat.lookup(LEGACY_IMAGES_TOTAL)),
                        missing_alt: self
                            .count("signals.accessibility.images.missingAlt", flat.lookup(LEGACY_MISSING_ALT)),
                    },
                },
                contact: Contact {
                    detected: self.flag("signals.contact.detected", contact),
                },
            },
        }
    }

    fn meta(&mut self, fields: Fields<'_>) -> Meta {
        let url = self.text("meta.url", fields.lookup(URL));
        let mut hostname = self.text("meta.hostname", fields.lookup(HOSTNAME)).to_ascii_lowercase();
        if hostname.is_empty() {
            hostname = host_from_url(&url);
        }

        let scanned_at = match fields.lookup(SCANNED_AT) {
            Some(value) => self.timestamp("meta.scannedAt", value),
            None => {
                self.degrade(DegradationCode::MissingField, "meta.scannedAt", "no scan timestamp recorded");
                String::new()
            }
        };
        if url.is_empty() {
            self.degrade(DegradationCode::MissingField, "meta.url", "no target url recorded");
        }

        Meta {
            url,
            hostname,
            scan_id: self.text("meta.scanId", fields.lookup(SCAN_ID)),
            scanned_at,
            https: self.flag("meta.https", fields.lookup(HTTPS)),
        }
    }

    // ------------------------------------------------------------------------
    // Coercions
    // ------------------------------------------------------------------------

    fn degrade(&mut self, code: DegradationCode, field: &str, detail: impl Into<String>) {
        self.degradations.push(Degradation::new(code, field, detail));
    }

    fn wrong_type(&mut self, field: &str, value: &Value) {
        self.degrade(
            DegradationCode::WrongType,
            field,
            format!("unexpected {}", json_kind(value)),
        );
    }

    fn flag(&mut self, field: &str, value: Option<&Value>) -> bool {
        match value {
            None => false,
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
            Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "y" | "on" | "1" => true,
                "false" | "no" | "n" | "off" | "0" | "" => false,
                _ => {
                    self.degrade(DegradationCode::WrongType, field, format!("unrecognized flag {:?}", s));
                    false
                }
            },
            Some(other) => {
                self.wrong_type(field, other);
                false
            }
        }
    }

    fn count(&mut self, field: &str, value: Option<&Value>) -> u32 {
        let Some(value) = value else { return 0 };
        let parsed = match value {
            Value::Bool(b) => Some(f64::from(u8::from(*b))),
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            Value::Array(items) => Some(items.len() as f64),
            _ => None,
        };
        match parsed {
            Some(n) if n.is_finite() && n >= 0.0 => n.trunc().min(f64::from(u32::MAX)) as u32,
            _ => {
                self.wrong_type(field, value);
                0
            }
        }
    }

    fn text(&mut self, field: &str, value: Option<&Value>) -> String {
        match value {
            None => String::new(),
            Some(Value::String(s)) => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            Some(other) => {
                self.wrong_type(field, other);
                String::new()
            }
        }
    }

    fn string_set(&mut self, field: &str, value: Option<&Value>) -> Vec<String> {
        let mut set = BTreeSet::new();
        match value {
            None => {}
            Some(Value::String(s)) => {
                set.insert(s.trim().to_string());
            }
            Some(Value::Array(items)) => {
                for item in items {
                    match item {
                        Value::String(s) => {
                            set.insert(s.trim().to_string());
                        }
                        Value::Number(n) => {
                            set.insert(n.to_string());
                        }
                        other => self.degrade(
                            DegradationCode::DroppedEntry,
                            field,
                            format!("dropped {} entry", json_kind(other)),
                        ),
                    }
                }
            }
            Some(other) => self.wrong_type(field, other),
        }
        set.remove("");
        set.into_iter().collect()
    }

    fn pages(&mut self, field: &str, value: Option<&Value>) -> Vec<PageRef> {
        let items: &[Value] = match value {
            None => &[],
            Some(Value::Array(items)) => items,
            Some(other) => {
                self.wrong_type(field, other);
                &[]
            }
        };

        let mut pages = Vec::with_capacity(items.len());
        for item in items {
            let (url, status) = match item {
                Value::String(url) => (url.trim().to_string(), 0),
                Value::Object(map) => {
                    let entry = Fields::new(map);
                    let url = self.text(field, entry.lookup(&["url", "href"]));
                    let status = self.status(field, entry.lookup(&["status", "statusCode", "status_code"]));
                    (url, status)
                }
                other => {
                    self.degrade(
                        DegradationCode::DroppedEntry,
                        field,
                        format!("dropped {} page entry", json_kind(other)),
                    );
                    continue;
                }
            };
            if url.is_empty() {
                self.degrade(DegradationCode::DroppedEntry, field, "dropped page entry without url");
                continue;
            }
            pages.push(PageRef { url, status });
        }
        pages.sort();
        pages
    }

    fn status(&mut self, field: &str, value: Option<&Value>) -> u16 {
        let Some(value) = value else { return 0 };
        let parsed = match value {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        };
        match parsed.and_then(|n| u16::try_from(n).ok()) {
            Some(status) => status,
            None => {
                self.wrong_type(field, value);
                0
            }
        }
    }

    fn timestamp(&mut self, field: &str, value: &Value) -> String {
        match canonical_timestamp(value) {
            Some(ts) => ts,
            None => {
                let passthrough = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                self.degrade(
                    DegradationCode::UnparseableTimestamp,
                    field,
                    format!("kept verbatim: {}", passthrough),
                );
                passthrough
            }
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Convert epoch millis or a date-like string into canonical RFC 3339 UTC
/// with millisecond precision. Returns `None` when the value is not a date.
pub fn canonical_timestamp(value: &Value) -> Option<String> {
    let parsed = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .and_then(DateTime::<Utc>::from_timestamp_millis),
        Value::String(s) => parse_date_string(s.trim()),
        _ => None,
    }?;
    Some(parsed.to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn parse_date_string(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }
    let digits = s.strip_prefix('-').unwrap_or(s);
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        return s.parse::<i64>().ok().and_then(DateTime::<Utc>::from_timestamp_millis);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Lowercased host portion of a URL, without userinfo or port.
fn host_from_url(url: &str) -> String {
    let rest = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    let authority = rest.split(['/', '?', '#']).next().unwrap_or("");
    let host_port = authority.rsplit_once('@').map(|(_, h)| h).unwrap_or(authority);
    let host = if host_port.starts_with('[') {
        // IPv6 literal keeps its brackets
        host_port.split_inclusive(']').next().unwrap_or(host_port)
    } else {
        host_port.split(':').next().unwrap_or(host_port)
    };
    host.to_ascii_lowercase()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
