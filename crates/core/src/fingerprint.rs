//! Integrity Fingerprint Engine
//!
//! Derives a stable digest from the canonical model so a delivered report can
//! be verified independently of how the raw facts were shaped.
//!
//! Fingerprint = SHA256( canonical_serialization(model) ), lowercase hex.
//!
//! The serializer only imposes object-key order. Array order is owned by the
//! normalizer; hashing a non-normalized array directly breaks determinism.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::CoreError;
use crate::model::CanonicalModel;
use crate::normalize::normalize_value;

pub const FINGERPRINT_ALGORITHM: &str = "sha256";

/// Hex length of a full fingerprint.
pub const FINGERPRINT_HEX_LEN: usize = 64;

/// Keys that never contribute to the digest, wherever they appear.
/// Transient identifiers, storage locations, credentials and render metadata
/// change between deliveries of the same facts.
const EXCLUDED_KEYS: &[&str] = &[
    "sessionId",
    "session_id",
    "paymentId",
    "payment_id",
    "checkoutId",
    "checkout_id",
    "storagePath",
    "storage_path",
    "filePath",
    "file_path",
    "accessToken",
    "access_token",
    "shareToken",
    "share_token",
    "reportId",
    "report_id",
    "generatedAt",
    "generated_at",
    "rendering",
    "render",
];

/// A SHA-256 digest over the canonical serialization, as 64 lowercase hex chars.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntegrityFingerprint(String);

impl IntegrityFingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading 16 hex characters, for page footers.
    pub fn short(&self) -> &str {
        self.0.get(..16).unwrap_or(&self.0)
    }

    /// Compare against an externally supplied digest (case-insensitive hex).
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other.trim())
    }
}

impl fmt::Display for IntegrityFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of recomputing a fingerprint for the verification collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verification {
    pub matches: bool,
    pub expected: String,
    pub actual: IntegrityFingerprint,
}

// ============================================================================
// Digest
// ============================================================================

/// Fingerprint a canonical model.
///
/// Fails only if the model cannot be represented as JSON, which a well-typed
/// model never does.
pub fn fingerprint(model: &CanonicalModel) -> Result<IntegrityFingerprint, CoreError> {
    let value = serde_json::to_value(model)?;
    Ok(fingerprint_value(&value))
}

/// Fingerprint an arbitrary JSON tree, skipping excluded keys at any depth.
pub fn fingerprint_value(value: &Value) -> IntegrityFingerprint {
    let canonical = canonical_string(value);
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    IntegrityFingerprint(hex::encode(hasher.finalize()))
}

/// Deterministic text form of a JSON tree: sorted object keys, arrays in
/// their existing order, JSON literals for primitives.
pub fn canonical_string(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => write_escaped(s, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map
                .keys()
                .filter(|key| !EXCLUDED_KEYS.contains(&key.as_str()))
                .collect();
            keys.sort();

            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_escaped(key, out);
                out.push(':');
                write_canonical(&map[key.as_str()], out);
            }
            out.push('}');
        }
    }
}

fn write_escaped(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}

// ============================================================================
// Verification
// ============================================================================

/// Recompute the fingerprint of `model` and compare it to `expected`.
pub fn verify(model: &CanonicalModel, expected: &str) -> Result<Verification, CoreError> {
    let actual = fingerprint(model)?;
    Ok(Verification {
        matches: actual.matches(expected),
        expected: expected.trim().to_ascii_lowercase(),
        actual,
    })
}

/// Verify against independently stored facts. The stored record is normalized
/// first, so either raw shape (or a stored canonical model) is accepted.
pub fn verify_stored(stored: &Value, expected: &str) -> Result<Verification, CoreError> {
    verify(&normalize_value(stored), expected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_string_sorts_keys() {
        let a = json!({"b": 1, "a": {"d": [3, 1], "c": null}});
        assert_eq!(canonical_string(&a), r#"{"a":{"c":null,"d":[3,1]},"b":1}"#);
    }

    #[test]
    fn test_canonical_string_escapes() {
        let v = json!({"k": "quote\" slash\\ nl\n \u{0001}"});
        assert_eq!(
            canonical_string(&v),
            "{\"k\":\"quote\\\" slash\\\\ nl\\n \\u0001\"}"
        );
    }

    #[test]
    fn test_excluded_keys_do_not_affect_digest() {
        let base = json!({"meta": {"url": "https://a.test"}});
        let noisy = json!({
            "meta": {"url": "https://a.test", "sessionId": "cs_123"},
            "generatedAt": "2025-01-01T00:00:00Z",
            "accessToken": "secret",
            "storagePath": "/var/reports/x.pdf"
        });
        assert_eq!(fingerprint_value(&base), fingerprint_value(&noisy));
    }

    #[test]
    fn test_fingerprint_shape() {
        let fp = fingerprint(&CanonicalModel::default()).unwrap();
        assert_eq!(fp.as_str().len(), FINGERPRINT_HEX_LEN);
        assert!(fp.as_str().chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(fp.short().len(), 16);
    }

    #[test]
    fn test_verify_accepts_uppercase_expected() {
        let model = CanonicalModel::default();
        let fp = fingerprint(&model).unwrap();
        let outcome = verify(&model, &fp.as_str().to_ascii_uppercase()).unwrap();
        assert!(outcome.matches);

        let mismatch = verify(&model, "deadbeef").unwrap();
        assert!(!mismatch.matches);
        assert_eq!(mismatch.actual, fp);
    }
}
