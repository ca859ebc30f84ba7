/// Error and degradation taxonomy for the canonicalization core.
///
/// Malformed input never surfaces as an error: it degrades to a zero value and
/// is optionally reported as a [`Degradation`]. Only defects reach [`CoreError`].
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DegradationCode {
    MissingField,
    WrongType,
    UnparseableTimestamp,
    DroppedEntry,
}

impl DegradationCode {
    pub fn as_str(&self) -> &str {
        match self {
            DegradationCode::MissingField => "missing_field",
            DegradationCode::WrongType => "wrong_type",
            DegradationCode::UnparseableTimestamp => "unparseable_timestamp",
            DegradationCode::DroppedEntry => "dropped_entry",
        }
    }
}

/// One field that fell back to its zero value (or passed through) during
/// normalization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Degradation {
    pub code: DegradationCode,
    /// Dotted path of the canonical field, e.g. `signals.forms.detected`
    pub field: String,
    pub detail: String,
}

impl Degradation {
    pub fn new(code: DegradationCode, field: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            code,
            field: field.into(),
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum CoreError {
    /// The canonical model could not be turned into a JSON tree. A well-typed
    /// model never hits this; treat it as a programming defect.
    #[error("fingerprint computation failed: {0}")]
    Fingerprint(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degradation_code_serializes_snake_case() {
        let json = serde_json::to_string(&DegradationCode::UnparseableTimestamp).unwrap();
        assert_eq!(json, "\"unparseable_timestamp\"");
        assert_eq!(
            DegradationCode::UnparseableTimestamp.as_str(),
            "unparseable_timestamp"
        );
    }
}
