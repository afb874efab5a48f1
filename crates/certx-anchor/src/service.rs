use std::sync::Arc;
use tracing::{info, warn};

use certx_core::anchor::{asset_name_for, CertificateAnchor};
use certx_core::certificate::{Certificate, CertificateStatus};
use certx_core::constants::{MAX_DESTINATION_ADDRESS_LEN, MIN_DESTINATION_ADDRESS_LEN};
use certx_core::error::CertxError;
use certx_core::types::{CertificateId, Timestamp};
use certx_state::{InsertOutcome, StateDb};

use crate::config::AnchorConfig;
use crate::network::{AssetMetadata, MintError, MintRequest, MintingNetwork};

#[derive(Clone, Debug, PartialEq)]
pub enum MintOutcome {
    /// This call minted the asset and stored the anchor.
    Minted(CertificateAnchor),
    /// The certificate was already anchored; nothing was broadcast.
    Existing(CertificateAnchor),
}

impl MintOutcome {
    pub fn anchor(&self) -> &CertificateAnchor {
        match self {
            MintOutcome::Minted(a) | MintOutcome::Existing(a) => a,
        }
    }

    pub fn into_anchor(self) -> CertificateAnchor {
        match self {
            MintOutcome::Minted(a) | MintOutcome::Existing(a) => a,
        }
    }

    pub fn is_minted(&self) -> bool {
        matches!(self, MintOutcome::Minted(_))
    }
}

/// Mints certificates as on-chain assets and records the resulting anchors.
///
/// The only writer of anchor rows and mint leases. An anchor is written only
/// after the network confirmed the mint; a failed or timed-out call leaves
/// no trace besides a log line.
pub struct LedgerAnchorService {
    db: Arc<StateDb>,
    network: Arc<dyn MintingNetwork>,
    config: AnchorConfig,
}

impl LedgerAnchorService {
    pub fn new(db: Arc<StateDb>, network: Arc<dyn MintingNetwork>, config: AnchorConfig) -> Result<Self, CertxError> {
        config.validate()?;
        Ok(Self { db, network, config })
    }

    pub fn config(&self) -> &AnchorConfig {
        &self.config
    }

    pub async fn mint(
        &self,
        certificate_id: &str,
        destination_address: &str,
        now: Timestamp,
    ) -> Result<MintOutcome, CertxError> {
        let id = parse_id(certificate_id)?;
        let cert = self
            .db
            .get_certificate(&id)?
            .ok_or_else(|| not_found(certificate_id))?;

        let status = cert.effective_status(now);
        if status != CertificateStatus::Active {
            return Err(CertxError::CertificateInactive { status });
        }
        let destination = validate_address(destination_address)?;

        if let Some(anchor) = self.db.get_anchor(&id)? {
            return Ok(MintOutcome::Existing(anchor));
        }

        if !self.db.try_acquire_mint_lease(&id, now)? {
            return Err(CertxError::MintFailed { reason: "mint already in progress".into() });
        }
        let _lease = MintLease { db: &self.db, id };
        self.mint_under_lease(&cert, destination, now).await
    }

    async fn mint_under_lease(
        &self,
        cert: &Certificate,
        destination: &str,
        now: Timestamp,
    ) -> Result<MintOutcome, CertxError> {
        let id = cert.certificate_id;

        // A mint that finished between our first check and taking the lease.
        if let Some(anchor) = self.db.get_anchor(&id)? {
            return Ok(MintOutcome::Existing(anchor));
        }

        let request = self.mint_request(cert, destination);
        info!(certificate_id = %id, asset_name = %request.asset_name, "minting certificate");

        let receipt = match tokio::time::timeout(self.config.mint_timeout, self.network.mint(&request)).await {
            Ok(Ok(receipt)) => receipt,
            Ok(Err(e)) => {
                warn!(certificate_id = %id, error = %e, "mint failed");
                return Err(e.into());
            }
            Err(_) => {
                warn!(certificate_id = %id, timeout_ms = self.config.mint_timeout.as_millis() as u64, "mint timed out");
                return Err(CertxError::MintFailed {
                    reason: format!("minting network did not confirm within {:?}", self.config.mint_timeout),
                });
            }
        };

        if [&receipt.policy_id, &receipt.asset_id, &receipt.tx_hash].iter().any(|f| f.trim().is_empty()) {
            warn!(certificate_id = %id, ?receipt, "mint receipt is missing its policy, asset or transaction id");
            return Err(MintError::Malformed("incomplete mint receipt".into()).into());
        }

        let image_uri = if receipt.image_uri.is_empty() {
            request.metadata.image.clone()
        } else {
            receipt.image_uri
        };
        let anchor = CertificateAnchor {
            certificate_id: id,
            policy_id: receipt.policy_id,
            asset_id: receipt.asset_id,
            asset_name: receipt.asset_name,
            tx_hash: receipt.tx_hash,
            image_uri,
            minted_at: now,
            destination_address: destination.to_string(),
            content_digest: request.metadata.content_digest,
        };

        match self.db.insert_anchor_if_absent(&anchor)? {
            InsertOutcome::Inserted => {
                info!(
                    certificate_id = %id,
                    asset_id = %anchor.asset_id,
                    tx_hash = %anchor.tx_hash,
                    "certificate anchored"
                );
                Ok(MintOutcome::Minted(anchor))
            }
            InsertOutcome::Existing(stored) => {
                warn!(certificate_id = %id, tx_hash = %anchor.tx_hash, "anchor already stored; keeping it");
                Ok(MintOutcome::Existing(stored))
            }
        }
    }

    fn mint_request(&self, cert: &Certificate, destination: &str) -> MintRequest {
        MintRequest {
            asset_name: asset_name_for(&cert.certificate_id),
            destination_address: destination.to_string(),
            metadata: AssetMetadata {
                name: format!("{} Certificate", cert.course_name),
                image: self.config.image_uri.clone(),
                certificate_id: cert.certificate_id,
                student_name: cert.student_name.clone(),
                course_name: cert.course_name.clone(),
                completion_date: cert.completion_date,
                issue_date: cert.issue_date,
                content_digest: cert.content_digest(),
            },
        }
    }

    pub fn get_anchor(&self, certificate_id: &str) -> Result<CertificateAnchor, CertxError> {
        let id = parse_id(certificate_id)?;
        self.db
            .get_anchor(&id)?
            .ok_or_else(|| CertxError::NotFound(format!("anchor for certificate {id}")))
    }
}

/// Held while a mint is in flight. Dropping it releases the lease, including
/// when the caller abandons the request mid-mint.
struct MintLease<'a> {
    db: &'a StateDb,
    id: CertificateId,
}

impl Drop for MintLease<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.db.release_mint_lease(&self.id) {
            warn!(certificate_id = %self.id, error = %e, "failed to release mint lease");
        }
    }
}

fn parse_id(certificate_id: &str) -> Result<CertificateId, CertxError> {
    CertificateId::from_b58(certificate_id).map_err(|_| not_found(certificate_id))
}

fn not_found(certificate_id: &str) -> CertxError {
    CertxError::NotFound(format!("certificate {}", certificate_id.trim()))
}

/// Wallet addresses are opaque to us beyond a length range and an
/// alphanumeric alphabet (bech32 and base58 addresses both satisfy it).
fn validate_address(address: &str) -> Result<&str, CertxError> {
    let address = address.trim();
    let len = address.chars().count();
    if !(MIN_DESTINATION_ADDRESS_LEN..=MAX_DESTINATION_ADDRESS_LEN).contains(&len) {
        return Err(CertxError::InvalidInput(format!(
            "destination address must be {MIN_DESTINATION_ADDRESS_LEN}..={MAX_DESTINATION_ADDRESS_LEN} characters"
        )));
    }
    if !address.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(CertxError::InvalidInput("destination address contains invalid characters".into()));
    }
    Ok(address)
}
