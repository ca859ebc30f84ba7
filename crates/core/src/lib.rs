//! Dossier core: canonical scan facts and everything derived from them.
//!
//! Data flows strictly forward: raw facts are normalized once, then the
//! fingerprint, risk and findings engines read the canonical model without
//! mutating it.

pub mod error;
pub mod findings;
pub mod fingerprint;
pub mod model;
pub mod normalize;
pub mod raw;
pub mod risk;

pub use error::{CoreError, Degradation, DegradationCode};
pub use findings::{synthesize, Category, Finding, Rating};
pub use fingerprint::{
    canonical_string, fingerprint, fingerprint_value, verify, verify_stored, IntegrityFingerprint,
    Verification, FINGERPRINT_ALGORITHM,
};
pub use model::{
    Accessibility, CanonicalModel, Consent, Contact, Coverage, Forms, Images, Meta, PageRef,
    Policies, Signals,
};
pub use normalize::{normalize, normalize_value, normalize_with_report, Normalized};
pub use raw::RawFacts;
pub use risk::{assess, assess_raw, RiskAssessment, RiskLevel, MAX_SCORE, NO_COVERAGE_SCORE};
