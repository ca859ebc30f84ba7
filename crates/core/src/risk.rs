//! Risk Scoring Engine: bounded additive score over canonical signals.
//!
//! Every rule contributes exactly one reason, including rules that found no
//! issue, so the reasons list always explains the whole score.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::CanonicalModel;
use crate::normalize::normalize;
use crate::raw::RawFacts;

pub const MAX_SCORE: u8 = 12;

/// Score assigned when no page could be retrieved. Unknown is worst case.
pub const NO_COVERAGE_SCORE: u8 = 9;

const HIGH_THRESHOLD: u8 = 7;
const MEDIUM_THRESHOLD: u8 = 4;

/// Image count below which alt-text coverage is not scored.
const MIN_IMAGES_FOR_ALT_RULE: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_score(score: u8) -> Self {
        if score >= HIGH_THRESHOLD {
            RiskLevel::High
        } else if score >= MEDIUM_THRESHOLD {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    /// Always within `0..=MAX_SCORE`
    pub score: u8,
    /// Never empty
    pub reasons: Vec<String>,
}

/// Assess a raw record through the normal normalization path.
pub fn assess_raw(raw: &RawFacts) -> RiskAssessment {
    assess(&normalize(raw))
}

pub fn assess(model: &CanonicalModel) -> RiskAssessment {
    if model.coverage.is_empty() {
        return RiskAssessment {
            level: RiskLevel::High,
            score: NO_COVERAGE_SCORE,
            reasons: vec![
                "No pages retrieved during the scan; the site could not be assessed and is treated as worst case"
                    .to_string(),
            ],
        };
    }

    let signals = &model.signals;
    let mut tally = Tally::default();

    if model.meta.https {
        tally.add(0, "Site is served over HTTPS");
    } else {
        tally.add(3, "Site is not served over HTTPS");
    }

    if signals.policies.privacy {
        tally.add(0, "Privacy policy found");
    } else {
        tally.add(2, "No privacy policy found");
    }
    if signals.policies.terms {
        tally.add(0, "Terms of service found");
    } else {
        tally.add(1, "No terms of service found");
    }
    if signals.policies.cookies {
        tally.add(0, "Cookie policy found");
    } else {
        tally.add(1, "No cookie policy found");
    }

    match (signals.has_tracking(), signals.consent.banner_detected) {
        (true, false) => tally.add(3, "Tracking detected without a consent banner"),
        (true, true) => tally.add(1, "Tracking detected with a consent banner"),
        (false, _) => tally.add(0, "No tracking scripts or consent vendors detected"),
    }

    let forms = signals.forms;
    if forms.detected == 0 {
        tally.add(0, "No forms detected");
    } else if forms.personal_data_signals > 0 {
        tally.add(2, "Forms collect personal data");
    } else {
        tally.add(1, "Forms present without personal-data fields");
    }

    let images = signals.accessibility.images;
    if images.total < MIN_IMAGES_FOR_ALT_RULE {
        tally.add(0, "Too few images to score alt-text coverage");
    } else {
        let percent = images.missing_alt_percent();
        if percent >= 30 {
            tally.add(2, format!("{}% of images lack alt text", percent));
        } else if percent >= 10 {
            tally.add(1, format!("{}% of images lack alt text", percent));
        } else {
            tally.add(0, "Alt text present on nearly all images");
        }
    }

    if signals.contact.detected {
        tally.add(0, "Contact or identity information found");
    } else {
        tally.add(1, "No contact or identity information found");
    }

    let score = tally.total.min(u32::from(MAX_SCORE)) as u8;
    RiskAssessment {
        level: RiskLevel::from_score(score),
        score,
        reasons: tally.reasons,
    }
}

#[derive(Default)]
struct Tally {
    total: u32,
    reasons: Vec<String>,
}

impl Tally {
    fn add(&mut self, delta: u32, reason: impl Into<String>) {
        self.total += delta;
        self.reasons.push(reason.into());
    }
}
