use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use certx_core::anchor::CertificateAnchor;
use certx_core::certificate::Certificate;

/// JSON-serializable certificate returned by `certx_getCertificate` and friends.
/// `status` is the effective status at the time of the call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcCertificate {
    pub certificate_id: String,
    pub user_id: String,
    pub course_id: String,
    pub student_name: String,
    pub course_name: String,
    pub course_description: Option<String>,
    pub course_level: Option<String>,
    pub completion_date: i64,
    pub issue_date: i64,
    pub expires_at: Option<i64>,
    pub status: String,
    pub metadata: BTreeMap<String, String>,
    /// Hex BLAKE3 fingerprint of the immutable fields.
    pub content_digest: String,
}

impl From<&Certificate> for RpcCertificate {
    fn from(c: &Certificate) -> Self {
        Self {
            certificate_id: c.certificate_id.to_b58(),
            user_id: c.user_id.to_string(),
            course_id: c.course_id.to_string(),
            student_name: c.student_name.clone(),
            course_name: c.course_name.clone(),
            course_description: c.course_description.clone(),
            course_level: c.course_level.clone(),
            completion_date: c.completion_date,
            issue_date: c.issue_date,
            expires_at: c.expires_at,
            status: c.status.to_string(),
            metadata: c.metadata.clone(),
            content_digest: c.content_digest(),
        }
    }
}

/// Result of `certx_issueCertificate`. `created` is false when the
/// certificate already existed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcIssueResult {
    pub created: bool,
    pub certificate: RpcCertificate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcAnchor {
    pub certificate_id: String,
    pub policy_id: String,
    pub asset_id: String,
    pub asset_name: String,
    pub tx_hash: String,
    pub image_uri: String,
    pub minted_at: i64,
    pub destination_address: String,
    pub content_digest: String,
}

impl From<&CertificateAnchor> for RpcAnchor {
    fn from(a: &CertificateAnchor) -> Self {
        Self {
            certificate_id: a.certificate_id.to_b58(),
            policy_id: a.policy_id.clone(),
            asset_id: a.asset_id.clone(),
            asset_name: a.asset_name.clone(),
            tx_hash: a.tx_hash.clone(),
            image_uri: a.image_uri.clone(),
            minted_at: a.minted_at,
            destination_address: a.destination_address.clone(),
            content_digest: a.content_digest.clone(),
        }
    }
}

/// Result of `certx_mintAnchor`. `minted` is false when an anchor already
/// existed and no transaction was broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcMintResult {
    pub minted: bool,
    pub anchor: RpcAnchor,
}

/// Node identity and limits returned by `certx_getServiceInfo`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcServiceInfo {
    pub version: String,
    pub certificate_count: u64,
    pub anchor_count: u64,
    /// Validity window stamped onto new certificates, if any (seconds).
    pub validity_secs: Option<i64>,
    pub ledger_timeout_ms: u64,
    pub mint_timeout_ms: u64,
    pub anchor_image_uri: String,
    pub chain_explorer: bool,
}
