use jsonrpsee::core::RpcResult;
use jsonrpsee::proc_macros::rpc;

use certx_core::verification::VerificationResult;

use crate::types::{RpcAnchor, RpcCertificate, RpcIssueResult, RpcMintResult, RpcServiceInfo};

/// certx JSON-RPC 2.0 API definition.
///
/// All method names are prefixed with "certx_" via `namespace = "certx"`.
#[rpc(server, namespace = "certx")]
pub trait CertxApi {
    /// Issue the certificate for (user, course) if the learner is eligible.
    /// Calling again returns the existing certificate with `created = false`.
    #[method(name = "issueCertificate")]
    async fn issue_certificate(&self, user_id: String, course_id: String) -> RpcResult<RpcIssueResult>;

    /// Full certificate record by base-58 id, or null.
    #[method(name = "getCertificate")]
    async fn get_certificate(&self, certificate_id: String) -> RpcResult<Option<RpcCertificate>>;

    /// Certificates held by `user_id`. Sorted newest-first.
    #[method(name = "listCertificates")]
    async fn list_certificates(&self, user_id: String) -> RpcResult<Vec<RpcCertificate>>;

    /// Administrative status change. `status` is "revoked" or "expired".
    #[method(name = "setCertificateStatus")]
    async fn set_certificate_status(&self, certificate_id: String, status: String) -> RpcResult<RpcCertificate>;

    /// Attach a metadata entry. Keys are write-once.
    #[method(name = "annotateCertificate")]
    async fn annotate_certificate(&self, certificate_id: String, key: String, value: String) -> RpcResult<RpcCertificate>;

    /// Public verification verdict.
    #[method(name = "verifyCertificate")]
    async fn verify_certificate(&self, certificate_id: String) -> RpcResult<VerificationResult>;

    /// Mint the certificate as an on-chain asset sent to `destination_address`.
    #[method(name = "mintAnchor")]
    async fn mint_anchor(&self, certificate_id: String, destination_address: String) -> RpcResult<RpcMintResult>;

    /// Anchor of a certificate, or null if it was never minted.
    #[method(name = "getAnchor")]
    async fn get_anchor(&self, certificate_id: String) -> RpcResult<Option<RpcAnchor>>;

    #[method(name = "getServiceInfo")]
    async fn get_service_info(&self) -> RpcResult<RpcServiceInfo>;
}
