use thiserror::Error;

use crate::certificate::CertificateStatus;

#[derive(Debug, Error)]
pub enum CertxError {
    // ── Eligibility ──────────────────────────────────────────────────────────
    #[error(
        "not eligible: {completed_lessons}/{total_lessons} lessons ({completion_percentage}%), \
         passed a quiz: {has_passed_any_quiz}"
    )]
    NotEligible {
        completion_percentage: u8,
        has_passed_any_quiz: bool,
        completed_lessons: u32,
        total_lessons: u32,
    },

    #[error("dependency unavailable: {0}")]
    DependencyUnavailable(String),

    // ── Lookup ───────────────────────────────────────────────────────────────
    #[error("not found: {0}")]
    NotFound(String),

    // ── Status ───────────────────────────────────────────────────────────────
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: CertificateStatus,
        to: CertificateStatus,
    },

    #[error("certificate is {status}")]
    CertificateInactive { status: CertificateStatus },

    // ── Anchoring ────────────────────────────────────────────────────────────
    #[error("mint failed: {reason}")]
    MintFailed { reason: String },

    // ── Input ────────────────────────────────────────────────────────────────
    #[error("invalid input: {0}")]
    InvalidInput(String),

    // ── Serialization / storage ──────────────────────────────────────────────
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl CertxError {
    /// Whether the same request may succeed if simply retried later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CertxError::DependencyUnavailable(_) | CertxError::MintFailed { .. }
        )
    }

    /// Stable machine-readable name, used as the error code on the wire.
    pub fn code(&self) -> &'static str {
        match self {
            CertxError::NotEligible { .. } => "NOT_ELIGIBLE",
            CertxError::DependencyUnavailable(_) => "DEPENDENCY_UNAVAILABLE",
            CertxError::NotFound(_) => "NOT_FOUND",
            CertxError::InvalidTransition { .. } => "INVALID_TRANSITION",
            CertxError::CertificateInactive { .. } => "CERTIFICATE_INACTIVE",
            CertxError::MintFailed { .. } => "MINT_FAILED",
            CertxError::InvalidInput(_) => "INVALID_INPUT",
            CertxError::Serialization(_) => "SERIALIZATION_ERROR",
            CertxError::Storage(_) => "STORAGE_ERROR",
        }
    }
}
