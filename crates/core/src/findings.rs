//! Finding Synthesizer: risk-register rows derived from canonical signals.
//!
//! Output order is fixed by category precedence: Coverage first, Trust last,
//! conditional categories in between. The list is the row source for the
//! report's findings table.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::CanonicalModel;

/// Explicit score for a scan that retrieved nothing.
const NO_COVERAGE_SCORE_OVERRIDE: u8 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Coverage,
    Security,
    Compliance,
    #[serde(rename = "Tracking & Consent")]
    TrackingConsent,
    #[serde(rename = "Data Capture")]
    DataCapture,
    Accessibility,
    Trust,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Coverage => "Coverage",
            Category::Security => "Security",
            Category::Compliance => "Compliance",
            Category::TrackingConsent => "Tracking & Consent",
            Category::DataCapture => "Data Capture",
            Category::Accessibility => "Accessibility",
            Category::Trust => "Trust",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const PROBABILITY_LABELS: [&str; 5] = ["Rare", "Unlikely", "Possible", "Likely", "Almost certain"];
const IMPACT_LABELS: [&str; 5] = ["Low", "Minor", "Moderate", "Major", "Severe"];

/// A 1..=5 rating with its fixed label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    pub value: u8,
    pub label: String,
}

impl Rating {
    pub fn probability(value: u8) -> Self {
        Self::from_table(value, &PROBABILITY_LABELS)
    }

    pub fn impact(value: u8) -> Self {
        Self::from_table(value, &IMPACT_LABELS)
    }

    fn from_table(value: u8, labels: &[&str; 5]) -> Self {
        let value = value.clamp(1, 5);
        Self {
            value,
            label: labels[usize::from(value - 1)].to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub id: String,
    pub category: Category,
    pub description: String,
    pub probability: Rating,
    pub impact: Rating,
    pub score: u8,
    pub trigger: String,
    pub mitigation: String,
    pub evidence: String,
}

/// Intermediate form before ids and scores are assigned.
struct Draft {
    category: Category,
    description: String,
    probability: u8,
    impact: u8,
    score_override: Option<u8>,
    trigger: String,
    mitigation: String,
    evidence: String,
}

impl Draft {
    fn new(category: Category, probability: u8, impact: u8) -> Self {
        Self {
            category,
            description: String::new(),
            probability,
            impact,
            score_override: None,
            trigger: String::new(),
            mitigation: String::new(),
            evidence: String::new(),
        }
    }

    fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    fn trigger(mut self, trigger: impl Into<String>) -> Self {
        self.trigger = trigger.into();
        self
    }

    fn mitigation(mut self, mitigation: impl Into<String>) -> Self {
        self.mitigation = mitigation.into();
        self
    }

    fn evidence(mut self, evidence: impl Into<String>) -> Self {
        self.evidence = evidence.into();
        self
    }

    fn score_override(mut self, score: u8) -> Self {
        self.score_override = Some(score);
        self
    }

    fn finish(self, position: usize) -> Finding {
        let probability = Rating::probability(self.probability);
        let impact = Rating::impact(self.impact);
        let score = self
            .score_override
            .unwrap_or(probability.value * impact.value);
        Finding {
            id: format!("F-{:02}", position + 1),
            category: self.category,
            description: self.description,
            probability,
            impact,
            score,
            trigger: self.trigger,
            mitigation: self.mitigation,
            evidence: self.evidence,
        }
    }
}

/// Derive the ordered findings list for a canonical model.
pub fn synthesize(model: &CanonicalModel) -> Vec<Finding> {
    let mut drafts = vec![coverage(model)];
    drafts.extend(security(model));
    drafts.extend(compliance(model));
    drafts.extend(tracking(model));
    drafts.extend(data_capture(model));
    drafts.extend(accessibility(model));
    drafts.push(trust(model));

    // Precedence is the category order; a stable sort keeps it explicit
    drafts.sort_by_key(|draft| draft.category);

    drafts
        .into_iter()
        .enumerate()
        .map(|(position, draft)| draft.finish(position))
        .collect()
}

// ============================================================================
// Category rules
// ============================================================================

fn coverage(model: &CanonicalModel) -> Draft {
    let coverage = &model.coverage;
    let checked = coverage.checked_pages.len();
    let failed = coverage.failed_pages.len();
    let mut evidence = format!("checked pages: {}; failed pages: {}", checked, failed);
    if !coverage.notes.is_empty() {
        evidence.push_str(&format!("; notes: {}", coverage.notes.join("; ")));
    }

    let draft = if checked == 0 {
        Draft::new(Category::Coverage, 5, 4)
            .describe("No pages could be retrieved; every other finding is unverified")
            .trigger("Scanner retrieved zero pages")
            .mitigation("Confirm the site is reachable and re-run the scan before relying on this report")
            .score_override(NO_COVERAGE_SCORE_OVERRIDE)
    } else if failed > 0 {
        Draft::new(Category::Coverage, 3, 2)
            .describe(format!(
                "{} of {} attempted pages could not be retrieved",
                failed,
                checked + failed
            ))
            .trigger("Some pages failed to load during the scan")
            .mitigation("Review failed pages manually; signals on them are not reflected here")
    } else {
        Draft::new(Category::Coverage, 1, 1)
            .describe(format!("All {} checked pages were retrieved", checked))
            .trigger("Scan coverage")
            .mitigation("No action required")
    };
    draft.evidence(evidence)
}

fn security(model: &CanonicalModel) -> Option<Draft> {
    if model.meta.https {
        return None;
    }
    Some(
        Draft::new(Category::Security, 4, 4)
            .describe("Site is served without HTTPS; traffic can be read or altered in transit")
            .trigger("meta.https is false")
            .mitigation("Serve all pages over TLS, redirect HTTP to HTTPS and enable HSTS")
            .evidence(format!("url: {}", display_or_none(&model.meta.url))),
    )
}

fn compliance(model: &CanonicalModel) -> Option<Draft> {
    let policies = model.signals.policies;
    let missing = policies.missing_count();
    if missing == 0 {
        return None;
    }

    let mut absent = Vec::new();
    if !policies.privacy {
        absent.push("privacy policy");
    }
    if !policies.terms {
        absent.push("terms of service");
    }
    if !policies.cookies {
        absent.push("cookie policy");
    }

    let probability = if missing >= 2 { 4 } else { 3 };
    let impact = if policies.privacy { 3 } else { 4 };
    Some(
        Draft::new(Category::Compliance, probability, impact)
            .describe(format!("Missing legal pages: {}", absent.join(", ")))
            .trigger("Required policy pages not linked from scanned pages")
            .mitigation("Publish the missing policies and link them from every page footer")
            .evidence(format!(
                "privacy: {}; terms: {}; cookies: {}",
                present_or_missing(policies.privacy),
                present_or_missing(policies.terms),
                present_or_missing(policies.cookies)
            )),
    )
}

fn tracking(model: &CanonicalModel) -> Option<Draft> {
    let signals = &model.signals;
    if !signals.has_tracking() {
        return None;
    }
    let evidence = format!(
        "tracking scripts: {}; vendors: {}; consent banner: {}",
        list_or_none(&signals.tracking_scripts),
        list_or_none(&signals.consent.vendors),
        if signals.consent.banner_detected {
            "detected"
        } else {
            "not detected"
        }
    );

    let draft = if signals.consent.banner_detected {
        Draft::new(Category::TrackingConsent, 2, 3)
            .describe("Tracking runs alongside a consent banner")
            .trigger("Tracking or consent-vendor signals with a banner present")
            .mitigation("Verify that tracking only fires after consent is granted")
    } else {
        Draft::new(Category::TrackingConsent, 4, 4)
            .describe("Tracking runs without any detectable consent mechanism")
            .trigger("Tracking or consent-vendor signals without a banner")
            .mitigation("Deploy a consent banner and block tracking until consent is given")
    };
    Some(draft.evidence(evidence))
}

fn data_capture(model: &CanonicalModel) -> Option<Draft> {
    let forms = model.signals.forms;
    if forms.detected == 0 {
        return None;
    }
    let evidence = format!(
        "forms: {}; personal-data field matches: {}",
        forms.detected, forms.personal_data_signals
    );
    let draft = if forms.personal_data_signals > 0 {
        Draft::new(Category::DataCapture, 3, 4)
            .describe("Forms collect personal data")
            .trigger("Form fields matched personal-data heuristics")
            .mitigation("State the purpose and legal basis next to each form and minimise collected fields")
    } else {
        Draft::new(Category::DataCapture, 2, 2)
            .describe("Forms present without personal-data fields")
            .trigger("Forms detected")
            .mitigation("Keep forms free of personal data or document their processing")
    };
    Some(draft.evidence(evidence))
}

fn accessibility(model: &CanonicalModel) -> Option<Draft> {
    let a11y = &model.signals.accessibility;
    let images = a11y.images;
    if images.total == 0 {
        return None;
    }
    let percent = images.missing_alt_percent();
    let mut evidence = format!(
        "images: {}; missing alt: {} ({}%)",
        images.total, images.missing_alt, percent
    );
    if !a11y.notes.is_empty() {
        evidence.push_str(&format!("; notes: {}", a11y.notes.join("; ")));
    }

    let (probability, impact, description) = if percent >= 30 {
        (4, 3, "Many images lack alternative text")
    } else if percent >= 10 {
        (3, 2, "Some images lack alternative text")
    } else {
        (1, 1, "Images carry alternative text")
    };
    Some(
        Draft::new(Category::Accessibility, probability, impact)
            .describe(description)
            .trigger("Alt-text coverage of scanned images")
            .mitigation("Add descriptive alt attributes; mark decorative images with empty alt")
            .evidence(evidence),
    )
}

fn trust(model: &CanonicalModel) -> Draft {
    if model.signals.contact.detected {
        Draft::new(Category::Trust, 1, 2)
            .describe("Contact or identity information is published")
            .trigger("Contact signals found")
            .mitigation("Keep contact details current")
            .evidence("contact: detected")
    } else {
        Draft::new(Category::Trust, 3, 3)
            .describe("No contact or operator identity information found")
            .trigger("No contact signals on scanned pages")
            .mitigation("Publish an imprint or contact page naming the operator")
            .evidence("contact: not detected")
    }
}

fn display_or_none(s: &str) -> &str {
    if s.is_empty() {
        "none recorded"
    } else {
        s
    }
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

fn present_or_missing(present: bool) -> &'static str {
    if present {
        "present"
    } else {
        "missing"
    }
}
