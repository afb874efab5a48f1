use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::constants::{MAX_METADATA_ENTRIES, MAX_METADATA_KEY_LEN, MAX_METADATA_VALUE_LEN};
use crate::error::CertxError;
use crate::types::{CertificateId, CourseId, Timestamp, UserId};

/// Domain separation tag mixed into every content fingerprint.
const FINGERPRINT_DOMAIN: &[u8] = b"certx.certificate.v1";

// ── CertificateStatus ────────────────────────────────────────────────────────

/// Lifecycle state of a certificate.
///
/// `Active` is the only initial state. `Revoked` and `Expired` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertificateStatus {
    Active,
    Revoked,
    Expired,
}

impl CertificateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CertificateStatus::Active => "active",
            CertificateStatus::Revoked => "revoked",
            CertificateStatus::Expired => "expired",
        }
    }

    /// Validate an administrative status change.
    ///
    /// Re-applying the current status is accepted as a no-op.
    pub fn check_transition(self, to: CertificateStatus) -> Result<(), CertxError> {
        use CertificateStatus::*;
        match (self, to) {
            (from, to) if from == to => Ok(()),
            (Active, Revoked) | (Active, Expired) => Ok(()),
            (from, to) => Err(CertxError::InvalidTransition { from, to }),
        }
    }
}

impl fmt::Display for CertificateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CertificateStatus {
    type Err = CertxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(CertificateStatus::Active),
            "revoked" => Ok(CertificateStatus::Revoked),
            "expired" => Ok(CertificateStatus::Expired),
            other => Err(CertxError::InvalidInput(format!("unknown status: {other}"))),
        }
    }
}

// ── Certificate ──────────────────────────────────────────────────────────────

/// The authoritative off-chain record that a learner completed a course.
///
/// Name fields are copies taken at issuance and are never refreshed from the
/// upstream catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Certificate {
    pub certificate_id: CertificateId,
    pub user_id: UserId,
    pub course_id: CourseId,
    pub student_name: String,
    pub course_name: String,
    pub course_description: Option<String>,
    pub course_level: Option<String>,
    /// When the eligibility gate was first satisfied.
    pub completion_date: Timestamp,
    pub issue_date: Timestamp,
    /// End of the validity window, if one was configured at issuance.
    pub expires_at: Option<Timestamp>,
    pub status: CertificateStatus,
    pub metadata: BTreeMap<String, String>,
}

impl Certificate {
    /// Status as observed at `now`: an active certificate past its validity
    /// window reads as expired even before anyone persists that transition.
    pub fn effective_status(&self, now: Timestamp) -> CertificateStatus {
        match (self.status, self.expires_at) {
            (CertificateStatus::Active, Some(exp)) if now >= exp => CertificateStatus::Expired,
            (status, _) => status,
        }
    }

    /// BLAKE3 fingerprint over the immutable fields, hex-encoded.
    ///
    /// Status and metadata are excluded: they may legitimately change after an
    /// anchor has been minted.
    pub fn content_digest(&self) -> String {
        let mut h = blake3::Hasher::new();
        put_field(&mut h, FINGERPRINT_DOMAIN);
        put_field(&mut h, self.certificate_id.as_bytes());
        put_field(&mut h, self.user_id.as_str().as_bytes());
        put_field(&mut h, self.course_id.as_str().as_bytes());
        put_field(&mut h, self.student_name.as_bytes());
        put_field(&mut h, self.course_name.as_bytes());
        put_opt(&mut h, self.course_description.as_deref());
        put_opt(&mut h, self.course_level.as_deref());
        h.update(&self.completion_date.to_le_bytes());
        h.update(&self.issue_date.to_le_bytes());
        hex::encode(h.finalize().as_bytes())
    }

    /// Add a metadata entry. Existing keys are never overwritten.
    pub fn add_metadata(&mut self, key: &str, value: &str) -> Result<(), CertxError> {
        let key = key.trim();
        if key.is_empty() || key.len() > MAX_METADATA_KEY_LEN {
            return Err(CertxError::InvalidInput(format!(
                "metadata key must be 1..={MAX_METADATA_KEY_LEN} characters"
            )));
        }
        if value.len() > MAX_METADATA_VALUE_LEN {
            return Err(CertxError::InvalidInput(format!(
                "metadata value exceeds {MAX_METADATA_VALUE_LEN} characters"
            )));
        }
        if self.metadata.contains_key(key) {
            return Err(CertxError::InvalidInput(format!("metadata key already set: {key}")));
        }
        if self.metadata.len() >= MAX_METADATA_ENTRIES {
            return Err(CertxError::InvalidInput(format!(
                "at most {MAX_METADATA_ENTRIES} metadata entries"
            )));
        }
        self.metadata.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

fn put_field(h: &mut blake3::Hasher, bytes: &[u8]) {
    h.update(&(bytes.len() as u64).to_le_bytes());
    h.update(bytes);
}

fn put_opt(h: &mut blake3::Hasher, value: Option<&str>) {
    match value {
        Some(v) => {
            h.update(&[1]);
            put_field(h, v.as_bytes());
        }
        None => {
            h.update(&[0]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Certificate {
        Certificate {
            certificate_id: CertificateId::from_bytes([3u8; 16]),
            user_id: UserId::new("u-1"),
            course_id: CourseId::new("rust-101"),
            student_name: "Ada Lovelace".into(),
            course_name: "Rust 101".into(),
            course_description: Some("Ownership and borrowing".into()),
            course_level: Some("Beginner".into()),
            completion_date: 1_700_000_000,
            issue_date: 1_700_000_100,
            expires_at: None,
            status: CertificateStatus::Active,
            metadata: BTreeMap::new(),
        }
    }

    #[test]
    fn legal_transitions() {
        use CertificateStatus::*;
        assert!(Active.check_transition(Revoked).is_ok());
        assert!(Active.check_transition(Expired).is_ok());
        assert!(Revoked.check_transition(Revoked).is_ok());
    }

    #[test]
    fn terminal_states_cannot_be_left() {
        use CertificateStatus::*;
        assert!(Revoked.check_transition(Active).is_err());
        assert!(Expired.check_transition(Active).is_err());
        assert!(Revoked.check_transition(Expired).is_err());
        assert!(Expired.check_transition(Revoked).is_err());
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("Revoked".parse::<CertificateStatus>().unwrap(), CertificateStatus::Revoked);
        assert!("suspended".parse::<CertificateStatus>().is_err());
    }

    #[test]
    fn validity_window_expires_active_certificate() {
        let mut cert = sample();
        cert.expires_at = Some(2_000);
        assert_eq!(cert.effective_status(1_999), CertificateStatus::Active);
        assert_eq!(cert.effective_status(2_000), CertificateStatus::Expired);

        cert.status = CertificateStatus::Revoked;
        assert_eq!(cert.effective_status(5_000), CertificateStatus::Revoked);
    }

    #[test]
    fn digest_ignores_status_and_metadata() {
        let cert = sample();
        let before = cert.content_digest();

        let mut changed = cert.clone();
        changed.status = CertificateStatus::Revoked;
        changed.add_metadata("skills", "rust").unwrap();
        assert_eq!(changed.content_digest(), before);
    }

    #[test]
    fn digest_tracks_frozen_names() {
        let cert = sample();
        let mut tampered = cert.clone();
        tampered.student_name = "Mallory".into();
        assert_ne!(tampered.content_digest(), cert.content_digest());
        assert_eq!(cert.content_digest().len(), 64);
    }

    #[test]
    fn metadata_is_additive_only() {
        let mut cert = sample();
        cert.add_metadata("skills", "rust").unwrap();
        assert!(cert.add_metadata("skills", "go").is_err());
        assert_eq!(cert.metadata["skills"], "rust");
        assert!(cert.add_metadata("  ", "x").is_err());
    }
}
