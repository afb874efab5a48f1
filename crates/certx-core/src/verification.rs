use serde::{Deserialize, Serialize};

use crate::anchor::CertificateAnchor;
use crate::certificate::{Certificate, CertificateStatus};
use crate::types::{CertificateId, Timestamp};

pub const MSG_VERIFIED: &str = "Certificate successfully verified.";
pub const MSG_NOT_FOUND: &str =
    "Certificate verification failed. This certificate is either invalid or has been revoked.";
pub const MSG_TAMPERED: &str =
    "Certificate content does not match the fingerprint anchored on-chain.";

/// Outcome of a public verification lookup.
///
/// `status` is present only when the certificate exists, so a relying party
/// can tell "was once valid" apart from "never existed".
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub verified: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CertificateStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none", flatten)]
    pub certificate: Option<PublicCertificate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<PublicAnchor>,
}

impl VerificationResult {
    pub fn not_found() -> Self {
        Self {
            verified: false,
            message: MSG_NOT_FOUND.to_string(),
            status: None,
            certificate: None,
            anchor: None,
        }
    }

    pub fn inactive(status: CertificateStatus) -> Self {
        Self {
            verified: false,
            message: format!("Certificate is {status}."),
            status: Some(status),
            certificate: None,
            anchor: None,
        }
    }
}

/// Fields of a certificate that are safe to disclose to anyone holding its id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicCertificate {
    pub certificate_id: CertificateId,
    pub student_name: String,
    pub course_name: String,
    pub course_description: Option<String>,
    pub course_level: Option<String>,
    pub completion_date: Timestamp,
    pub issue_date: Timestamp,
    pub expires_at: Option<Timestamp>,
}

impl From<&Certificate> for PublicCertificate {
    fn from(c: &Certificate) -> Self {
        Self {
            certificate_id: c.certificate_id,
            student_name: c.student_name.clone(),
            course_name: c.course_name.clone(),
            course_description: c.course_description.clone(),
            course_level: c.course_level.clone(),
            completion_date: c.completion_date,
            issue_date: c.issue_date,
            expires_at: c.expires_at,
        }
    }
}

/// Anchor data exposed for cross-checking against a public ledger explorer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicAnchor {
    pub policy_id: String,
    pub asset_id: String,
    pub asset_name: String,
    pub tx_hash: String,
    pub image_uri: String,
    pub minted_at: Timestamp,
    /// The stored certificate still hashes to the anchored fingerprint.
    pub digest_matches: bool,
    /// Independent on-chain lookup agreed with the anchor. Absent when no
    /// explorer is configured or the lookup could not be completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_corroborated: Option<bool>,
}

impl PublicAnchor {
    pub fn new(a: &CertificateAnchor, digest_matches: bool, chain_corroborated: Option<bool>) -> Self {
        Self {
            policy_id: a.policy_id.clone(),
            asset_id: a.asset_id.clone(),
            asset_name: a.asset_name.clone(),
            tx_hash: a.tx_hash.clone(),
            image_uri: a.image_uri.clone(),
            minted_at: a.minted_at,
            digest_matches,
            chain_corroborated,
        }
    }
}
