//! API route handlers

pub mod anchor;
pub mod certificate;
pub mod health;
pub mod verify;

use axum::{routing::get, routing::post, Router};

use crate::state::AppState;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        // Issuance
        .route("/certificate", post(certificate::issue_certificate))
        .route("/certificate/:certificate_id", get(certificate::get_certificate))
        .route("/certificate/:certificate_id/status", post(certificate::update_status))
        .route("/certificate/:certificate_id/metadata", post(certificate::annotate_certificate))
        .route("/certificates/user/:user_id", get(certificate::list_user_certificates))
        // Public verification
        .route("/verify-certificate/:certificate_id", get(verify::verify_certificate))
        // Anchoring
        .route("/certificate/:certificate_id/mint", post(anchor::mint_anchor))
        .route("/certificate-nft/by-certificate/:certificate_id", get(anchor::get_anchor))
        .with_state(state)
}
