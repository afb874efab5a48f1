//! Request and response bodies

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use certx_core::anchor::CertificateAnchor;
use certx_core::certificate::Certificate;

#[derive(Debug, Deserialize)]
pub struct IssueCertificateRequest {
    pub user_id: String,
    pub course_id: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct AnnotateRequest {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct MintAnchorRequest {
    pub destination_address: String,
}

/// Certificate as returned to its holder and administrators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateResponse {
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
}

impl From<Certificate> for CertificateResponse {
    fn from(c: Certificate) -> Self {
        Self {
            certificate_id: c.certificate_id.to_b58(),
            user_id: c.user_id.0,
            course_id: c.course_id.0,
            student_name: c.student_name,
            course_name: c.course_name,
            course_description: c.course_description,
            course_level: c.course_level,
            completion_date: c.completion_date,
            issue_date: c.issue_date,
            expires_at: c.expires_at,
            status: c.status.to_string(),
            metadata: c.metadata,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorResponse {
    pub certificate_id: String,
    pub policy_id: String,
    pub asset_id: String,
    pub asset_name: String,
    pub tx_hash: String,
    pub image: String,
    pub minted_at: i64,
    pub destination_address: String,
    pub content_digest: String,
}

impl From<CertificateAnchor> for AnchorResponse {
    fn from(a: CertificateAnchor) -> Self {
        Self {
            certificate_id: a.certificate_id.to_b58(),
            policy_id: a.policy_id,
            asset_id: a.asset_id,
            asset_name: a.asset_name,
            tx_hash: a.tx_hash,
            image: a.image_uri,
            minted_at: a.minted_at,
            destination_address: a.destination_address,
            content_digest: a.content_digest,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub certificates: u64,
    pub anchors: u64,
}
