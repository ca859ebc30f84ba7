//! Canonical Model: the single normalized representation of scan facts.
//!
//! Every downstream component (fingerprint, risk, findings, layout) reads this
//! model and nothing else. Invariants held by construction in `normalize`:
//! - String sets are trimmed, deduplicated and sorted ascending
//! - Page lists are sorted by url, then status
//! - Timestamps are canonical RFC 3339 strings (or passed through verbatim)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CanonicalModel {
    pub meta: Meta,
    pub coverage: Coverage,
    pub signals: Signals,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Meta {
    pub url: String,
    pub hostname: String,
    pub scan_id: String,
    /// Recorded scan time. This is the only timestamp that is fingerprinted.
    pub scanned_at: String,
    pub https: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Coverage {
    pub notes: Vec<String>,
    pub checked_pages: Vec<PageRef>,
    pub failed_pages: Vec<PageRef>,
}

impl Coverage {
    /// Zero retrieved pages means nothing about the target is actually known.
    pub fn is_empty(&self) -> bool {
        self.checked_pages.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct PageRef {
    pub url: String,
    pub status: u16,
}

impl PageRef {
    pub fn new(url: impl Into<String>, status: u16) -> Self {
        Self {
            url: url.into(),
            status,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Signals {
    pub policies: Policies,
    pub consent: Consent,
    pub tracking_scripts: Vec<String>,
    pub forms: Forms,
    pub accessibility: Accessibility,
    pub contact: Contact,
}

impl Signals {
    /// True when any tracking script or consent vendor was observed.
    pub fn has_tracking(&self) -> bool {
        !self.tracking_scripts.is_empty() || !self.consent.vendors.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Policies {
    pub privacy: bool,
    pub terms: bool,
    pub cookies: bool,
}

impl Policies {
    pub fn missing_count(&self) -> usize {
        [self.privacy, self.terms, self.cookies]
            .iter()
            .filter(|present| !**present)
            .count()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Consent {
    pub banner_detected: bool,
    pub vendors: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Forms {
    pub detected: u32,
    pub personal_data_signals: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Accessibility {
    pub notes: Vec<String>,
    pub images: Images,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Images {
    pub total: u32,
    pub missing_alt: u32,
}

impl Images {
    /// Missing-alt share in whole percent, rounded down. Zero when no images.
    pub fn missing_alt_percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        let missing = u64::from(self.missing_alt.min(self.total));
        (missing * 100 / u64::from(self.total)) as u32
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contact {
    pub detected: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serializes_with_camel_case_names() {
        let mut model = CanonicalModel::default();
        model.meta.scan_id = "scan-1".to_string();
        model.signals.consent.banner_detected = true;
        model.signals.accessibility.images.missing_alt = 2;

        let value = serde_json::to_value(&model).unwrap();
        assert_eq!(value["meta"]["scanId"], json!("scan-1"));
        assert_eq!(value["signals"]["consent"]["bannerDetected"], json!(true));
        assert_eq!(
            value["signals"]["accessibility"]["images"]["missingAlt"],
            json!(2)
        );
        assert!(value["coverage"]["checkedPages"].is_array());
    }

    #[test]
    fn test_missing_alt_percent() {
        let images = Images {
            total: 10,
            missing_alt: 4,
        };
        assert_eq!(images.missing_alt_percent(), 40);
        assert_eq!(Images::default().missing_alt_percent(), 0);

        // More missing than total is capped rather than exceeding 100%
        let odd = Images {
            total: 3,
            missing_alt: 9,
        };
        assert_eq!(odd.missing_alt_percent(), 100);
    }

    #[test]
    fn test_policies_missing_count() {
        let policies = Policies {
            privacy: true,
            terms: false,
            cookies: false,
        };
        assert_eq!(policies.missing_count(), 2);
    }
}
