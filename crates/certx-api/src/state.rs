//! Application state for the API server

use std::sync::Arc;

use certx_anchor::LedgerAnchorService;
use certx_issuance::CertificateStore;
use certx_state::StateDb;
use certx_verify::VerificationService;

/// API server state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<StateDb>,
    pub store: Arc<CertificateStore>,
    pub verifier: Arc<VerificationService>,
    pub anchors: Arc<LedgerAnchorService>,
    pub version: String,
}

impl AppState {
    pub fn new(
        db: Arc<StateDb>,
        store: Arc<CertificateStore>,
        verifier: Arc<VerificationService>,
        anchors: Arc<LedgerAnchorService>,
    ) -> Self {
        Self {
            db,
            store,
            verifier,
            anchors,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub enable_cors: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            enable_cors: false,
        }
    }
}
