use std::net::SocketAddr;
use std::sync::Arc;

use jsonrpsee::core::{async_trait, RpcResult};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::ErrorObject;
use serde_json::json;
use tracing::{error, info, warn};

use certx_anchor::LedgerAnchorService;
use certx_core::certificate::CertificateStatus;
use certx_core::error::CertxError;
use certx_core::types::{now, CourseId, UserId};
use certx_core::verification::VerificationResult;
use certx_issuance::CertificateStore;
use certx_state::StateDb;
use certx_verify::VerificationService;

use crate::api::CertxApiServer;
use crate::types::{RpcAnchor, RpcCertificate, RpcIssueResult, RpcMintResult, RpcServiceInfo};

// ── Error codes ───────────────────────────────────────────────────────────────

pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;
pub const NOT_FOUND: i32 = -32001;
pub const NOT_ELIGIBLE: i32 = -32010;
pub const DEPENDENCY_UNAVAILABLE: i32 = -32011;
pub const INVALID_TRANSITION: i32 = -32012;
pub const CERTIFICATE_INACTIVE: i32 = -32013;
pub const MINT_FAILED: i32 = -32014;

/// Translate a service error into a JSON-RPC error. The taxonomy name goes
/// into `data.code` so clients can branch without parsing messages.
fn certx_err(e: CertxError) -> ErrorObject<'static> {
    let code = match &e {
        CertxError::NotEligible { .. } => NOT_ELIGIBLE,
        CertxError::DependencyUnavailable(_) => DEPENDENCY_UNAVAILABLE,
        CertxError::NotFound(_) => NOT_FOUND,
        CertxError::InvalidTransition { .. } => INVALID_TRANSITION,
        CertxError::CertificateInactive { .. } => CERTIFICATE_INACTIVE,
        CertxError::MintFailed { .. } => MINT_FAILED,
        CertxError::InvalidInput(_) => INVALID_PARAMS,
        CertxError::Serialization(_) | CertxError::Storage(_) => INTERNAL_ERROR,
    };

    let message = match &e {
        CertxError::DependencyUnavailable(detail) => {
            warn!(error = %detail, "RPC: dependency unavailable");
            "a dependency is temporarily unavailable, try again later".to_string()
        }
        CertxError::MintFailed { reason } => {
            warn!(error = %reason, "RPC: mint failed");
            "the certificate could not be minted right now, try again later".to_string()
        }
        CertxError::Serialization(_) | CertxError::Storage(_) => {
            error!(error = %e, "RPC: internal error");
            "internal error".to_string()
        }
        _ => e.to_string(),
    };

    let mut data = json!({ "code": e.code(), "retryable": e.is_retryable() });
    if let CertxError::NotEligible {
        completion_percentage,
        has_passed_any_quiz,
        completed_lessons,
        total_lessons,
    } = &e
    {
        data["completion_percentage"] = json!(completion_percentage);
        data["has_passed_any_quiz"] = json!(has_passed_any_quiz);
        data["completed_lessons"] = json!(completed_lessons);
        data["total_lessons"] = json!(total_lessons);
    }

    ErrorObject::owned(code, message, Some(data))
}

/// Shared state passed to the RPC server.
pub struct RpcServerState {
    pub db: Arc<StateDb>,
    pub store: Arc<CertificateStore>,
    pub verifier: Arc<VerificationService>,
    pub anchors: Arc<LedgerAnchorService>,
}

/// The RPC server implementation.
pub struct RpcServer {
    state: Arc<RpcServerState>,
}

impl RpcServer {
    pub fn new(state: Arc<RpcServerState>) -> Self {
        Self { state }
    }

    /// Start the JSON-RPC server on `addr`. Returns a handle to stop it.
    pub async fn start(self, addr: SocketAddr) -> anyhow::Result<ServerHandle> {
        let server = Server::builder().build(addr).await?;
        let module = self.into_rpc();
        let handle = server.start(module);
        info!(%addr, "RPC server started");
        Ok(handle)
    }
}

#[async_trait]
impl CertxApiServer for RpcServer {
    async fn issue_certificate(&self, user_id: String, course_id: String) -> RpcResult<RpcIssueResult> {
        let outcome = self
            .state
            .store
            .issue(&UserId::new(user_id), &CourseId::new(course_id), now())
            .await
            .map_err(certx_err)?;

        Ok(RpcIssueResult {
            created: outcome.is_created(),
            certificate: RpcCertificate::from(outcome.certificate()),
        })
    }

    async fn get_certificate(&self, certificate_id: String) -> RpcResult<Option<RpcCertificate>> {
        match self.state.store.get_by_id(&certificate_id, now()) {
            Ok(cert) => Ok(Some(RpcCertificate::from(&cert))),
            Err(CertxError::NotFound(_)) => Ok(None),
            Err(e) => Err(certx_err(e)),
        }
    }

    async fn list_certificates(&self, user_id: String) -> RpcResult<Vec<RpcCertificate>> {
        let certs = self
            .state
            .store
            .list_for_user(&UserId::new(user_id), now())
            .map_err(certx_err)?;
        Ok(certs.iter().map(RpcCertificate::from).collect())
    }

    async fn set_certificate_status(&self, certificate_id: String, status: String) -> RpcResult<RpcCertificate> {
        let status: CertificateStatus = status.parse().map_err(certx_err)?;
        let cert = self
            .state
            .store
            .set_status(&certificate_id, status, now())
            .map_err(certx_err)?;
        Ok(RpcCertificate::from(&cert))
    }

    async fn annotate_certificate(&self, certificate_id: String, key: String, value: String) -> RpcResult<RpcCertificate> {
        let cert = self
            .state
            .store
            .annotate(&certificate_id, &key, &value, now())
            .map_err(certx_err)?;
        Ok(RpcCertificate::from(&cert))
    }

    async fn verify_certificate(&self, certificate_id: String) -> RpcResult<VerificationResult> {
        self.state
            .verifier
            .verify(&certificate_id, now())
            .await
            .map_err(certx_err)
    }

    async fn mint_anchor(&self, certificate_id: String, destination_address: String) -> RpcResult<RpcMintResult> {
        let outcome = self
            .state
            .anchors
            .mint(&certificate_id, &destination_address, now())
            .await
            .map_err(certx_err)?;

        Ok(RpcMintResult {
            minted: outcome.is_minted(),
            anchor: RpcAnchor::from(outcome.anchor()),
        })
    }

    async fn get_anchor(&self, certificate_id: String) -> RpcResult<Option<RpcAnchor>> {
        match self.state.anchors.get_anchor(&certificate_id) {
            Ok(anchor) => Ok(Some(RpcAnchor::from(&anchor))),
            Err(CertxError::NotFound(_)) => Ok(None),
            Err(e) => Err(certx_err(e)),
        }
    }

    async fn get_service_info(&self) -> RpcResult<RpcServiceInfo> {
        let issuance = self.state.store.config();
        let anchoring = self.state.anchors.config();
        Ok(RpcServiceInfo {
            version: env!("CARGO_PKG_VERSION").to_string(),
            certificate_count: self.state.db.certificate_count() as u64,
            anchor_count: self.state.db.anchor_count() as u64,
            validity_secs: issuance.validity_secs,
            ledger_timeout_ms: issuance.ledger_timeout.as_millis() as u64,
            mint_timeout_ms: anchoring.mint_timeout.as_millis() as u64,
            anchor_image_uri: anchoring.image_uri.clone(),
            chain_explorer: self.state.verifier.has_explorer(),
        })
    }
}
