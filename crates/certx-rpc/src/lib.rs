//! certx-rpc
//!
//! JSON-RPC 2.0 server for certx nodes.
//!
//! Namespace: "certx"
//! Methods:
//!   certx_issueCertificate      — issue (or return) the certificate for a user and course
//!   certx_getCertificate        — full certificate record by id
//!   certx_listCertificates      — certificates held by a user, newest first
//!   certx_setCertificateStatus  — administrative revoke / expire
//!   certx_annotateCertificate   — attach a write-once metadata entry
//!   certx_verifyCertificate     — public verification verdict
//!   certx_mintAnchor            — anchor a certificate on chain
//!   certx_getAnchor             — anchor record for a certificate
//!   certx_getServiceInfo        — version, counters and configured limits

pub mod api;
pub mod server;
pub mod types;

pub use server::{RpcServer, RpcServerState};
pub use types::{RpcAnchor, RpcCertificate, RpcIssueResult, RpcMintResult, RpcServiceInfo};
