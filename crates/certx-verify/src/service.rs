use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use certx_anchor::ChainExplorer;
use certx_core::anchor::CertificateAnchor;
use certx_core::certificate::CertificateStatus;
use certx_core::constants::DEFAULT_LEDGER_TIMEOUT_MS;
use certx_core::error::CertxError;
use certx_core::types::{CertificateId, Timestamp};
use certx_core::verification::{PublicAnchor, PublicCertificate, VerificationResult, MSG_TAMPERED, MSG_VERIFIED};
use certx_state::StateDb;

/// Public, unauthenticated certificate verification.
///
/// Read-only. An unknown id and a malformed id produce the same answer so
/// the endpoint cannot be used to probe the id space.
pub struct VerificationService {
    db: Arc<StateDb>,
    explorer: Option<Arc<dyn ChainExplorer>>,
    explorer_timeout: Duration,
}

impl VerificationService {
    pub fn new(db: Arc<StateDb>) -> Self {
        Self {
            db,
            explorer: None,
            explorer_timeout: Duration::from_millis(DEFAULT_LEDGER_TIMEOUT_MS),
        }
    }

    /// Cross-check anchors against the chain on every verification.
    pub fn with_explorer(mut self, explorer: Arc<dyn ChainExplorer>, timeout: Duration) -> Self {
        self.explorer = Some(explorer);
        self.explorer_timeout = timeout;
        self
    }

    pub fn has_explorer(&self) -> bool {
        self.explorer.is_some()
    }

    pub async fn verify(&self, certificate_id: &str, now: Timestamp) -> Result<VerificationResult, CertxError> {
        let Ok(id) = CertificateId::from_b58(certificate_id) else {
            debug!("verification of malformed id");
            return Ok(VerificationResult::not_found());
        };
        let Some(cert) = self.db.get_certificate(&id)? else {
            debug!(certificate_id = %id, "verification of unknown id");
            return Ok(VerificationResult::not_found());
        };

        let status = cert.effective_status(now);
        if status != CertificateStatus::Active {
            debug!(certificate_id = %id, %status, "verification of inactive certificate");
            return Ok(VerificationResult::inactive(status));
        }

        let Some(anchor) = self.db.get_anchor(&id)? else {
            debug!(certificate_id = %id, "certificate verified");
            return Ok(VerificationResult {
                verified: true,
                message: MSG_VERIFIED.to_string(),
                status: Some(status),
                certificate: Some(PublicCertificate::from(&cert)),
                anchor: None,
            });
        };

        let digest_matches = cert.content_digest() == anchor.content_digest;
        let corroborated = self.corroborate(&anchor).await;
        let public_anchor = PublicAnchor::new(&anchor, digest_matches, corroborated);

        if !digest_matches {
            warn!(certificate_id = %id, asset_id = %anchor.asset_id, "certificate does not match its anchored digest");
            return Ok(VerificationResult {
                verified: false,
                message: MSG_TAMPERED.to_string(),
                status: Some(status),
                certificate: None,
                anchor: Some(public_anchor),
            });
        }

        debug!(certificate_id = %id, ?corroborated, "anchored certificate verified");
        Ok(VerificationResult {
            verified: true,
            message: MSG_VERIFIED.to_string(),
            status: Some(status),
            certificate: Some(PublicCertificate::from(&cert)),
            anchor: Some(public_anchor),
        })
    }

    /// `None` when no explorer is configured or the lookup failed.
    async fn corroborate(&self, anchor: &CertificateAnchor) -> Option<bool> {
        let explorer = self.explorer.as_ref()?;
        match tokio::time::timeout(self.explorer_timeout, explorer.lookup_asset(&anchor.asset_id)).await {
            Ok(Ok(Some(asset))) => Some(asset.corroborates(anchor)),
            Ok(Ok(None)) => Some(false),
            Ok(Err(e)) => {
                warn!(asset_id = %anchor.asset_id, error = %e, "chain lookup failed");
                None
            }
            Err(_) => {
                warn!(asset_id = %anchor.asset_id, "chain lookup timed out");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use certx_anchor::{AnchorConfig, LedgerAnchorService, SimulatedMintingNetwork};
    use certx_core::certificate::Certificate;
    use certx_core::types::{CourseId, UserId};
    use std::collections::BTreeMap;

    const NOW: Timestamp = 1_700_000_000;
    const ADDR: &str = "addr_test1qpz4k8xv0u2";

    fn store(expires_at: Option<Timestamp>) -> (Arc<StateDb>, String) {
        let db = Arc::new(StateDb::temporary().unwrap());
        let cert = Certificate {
            certificate_id: CertificateId::generate(),
            user_id: UserId::new("learner-42"),
            course_id: CourseId::new("rust-101"),
            student_name: "Ada Lovelace".into(),
            course_name: "Rust 101".into(),
            course_description: Some("Ownership".into()),
            course_level: None,
            completion_date: NOW - 60,
            issue_date: NOW,
            expires_at,
            status: CertificateStatus::Active,
            metadata: BTreeMap::from([("grader".to_string(), "internal-note".to_string())]),
        };
        db.insert_certificate_if_absent(&cert).unwrap();
        (db, cert.certificate_id.to_b58())
    }

    async fn anchor(db: &Arc<StateDb>, net: &Arc<SimulatedMintingNetwork>, id: &str) -> CertificateAnchor {
        LedgerAnchorService::new(db.clone(), net.clone(), AnchorConfig::default())
            .unwrap()
            .mint(id, ADDR, NOW)
            .await
            .unwrap()
            .into_anchor()
    }

    #[tokio::test]
    async fn active_certificate_discloses_public_fields_only() {
        let (db, id) = store(None);
        let result = VerificationService::new(db).verify(&id, NOW).await.unwrap();
        assert!(result.verified);
        assert_eq!(result.message, MSG_VERIFIED);
        assert_eq!(result.status, Some(CertificateStatus::Active));
        assert!(result.anchor.is_none());

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["student_name"], "Ada Lovelace");
        assert_eq!(json["course_name"], "Rust 101");
        assert!(json.get("user_id").is_none());
        assert!(json.get("metadata").is_none());
        assert!(!json.to_string().contains("learner-42"));
    }

    #[tokio::test]
    async fn unknown_and_malformed_ids_look_the_same() {
        let (db, _) = store(None);
        let svc = VerificationService::new(db);
        let unknown = svc.verify(&CertificateId::generate().to_b58(), NOW).await.unwrap();
        let malformed = svc.verify("../../etc/passwd", NOW).await.unwrap();
        assert_eq!(unknown, malformed);
        assert!(!unknown.verified);
        assert!(unknown.status.is_none());
    }

    #[tokio::test]
    async fn revoked_certificate_reports_status() {
        let (db, id) = store(None);
        db.update_certificate(&CertificateId::from_b58(&id).unwrap(), |c| {
            c.status = CertificateStatus::Revoked;
            Ok(())
        })
        .unwrap();
        let result = VerificationService::new(db).verify(&id, NOW).await.unwrap();
        assert!(!result.verified);
        assert_eq!(result.status, Some(CertificateStatus::Revoked));
        assert!(result.certificate.is_none());
    }

    #[tokio::test]
    async fn lapsed_validity_reads_as_expired() {
        let (db, id) = store(Some(NOW + 10));
        let svc = VerificationService::new(db);
        assert!(svc.verify(&id, NOW + 9).await.unwrap().verified);
        let later = svc.verify(&id, NOW + 10).await.unwrap();
        assert!(!later.verified);
        assert_eq!(later.status, Some(CertificateStatus::Expired));
        assert_eq!(later.message, "Certificate is expired.");
    }

    #[tokio::test]
    async fn anchored_certificate_is_corroborated_by_the_chain() {
        let (db, id) = store(None);
        let net = Arc::new(SimulatedMintingNetwork::new());
        let stored = anchor(&db, &net, &id).await;

        let svc = VerificationService::new(db).with_explorer(net.clone(), Duration::from_secs(1));
        let result = svc.verify(&id, NOW + 1).await.unwrap();
        assert!(result.verified);
        let a = result.anchor.unwrap();
        assert_eq!(a.tx_hash, stored.tx_hash);
        assert!(a.digest_matches);
        assert_eq!(a.chain_corroborated, Some(true));

        net.overwrite_onchain_digest(&stored.asset_id, "00ff");
        let result = svc.verify(&id, NOW + 2).await.unwrap();
        // Disagreement with the explorer is reported but does not flip the verdict.
        assert!(result.verified);
        assert_eq!(result.anchor.unwrap().chain_corroborated, Some(false));
    }

    #[tokio::test]
    async fn edited_record_fails_against_its_anchor() {
        let (db, id) = store(None);
        let net = Arc::new(SimulatedMintingNetwork::new());
        anchor(&db, &net, &id).await;

        db.update_certificate(&CertificateId::from_b58(&id).unwrap(), |c| {
            c.course_name = "Rust 999".into();
            Ok(())
        })
        .unwrap();

        let result = VerificationService::new(db).verify(&id, NOW + 1).await.unwrap();
        assert!(!result.verified);
        assert_eq!(result.message, MSG_TAMPERED);
        assert!(result.certificate.is_none());
        let a = result.anchor.unwrap();
        assert!(!a.digest_matches);
        assert_eq!(a.chain_corroborated, None);
    }

    #[tokio::test]
    async fn metadata_changes_do_not_break_the_anchor() {
        let (db, id) = store(None);
        let net = Arc::new(SimulatedMintingNetwork::new());
        anchor(&db, &net, &id).await;
        db.update_certificate(&CertificateId::from_b58(&id).unwrap(), |c| c.add_metadata("badge", "gold"))
            .unwrap();

        let result = VerificationService::new(db).verify(&id, NOW + 1).await.unwrap();
        assert!(result.verified);
        assert!(result.anchor.unwrap().digest_matches);
    }
}
