//! Public verification endpoint

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use certx_core::types::now;
use certx_core::verification::VerificationResult;

use crate::error::ApiResult;
use crate::state::AppState;

/// GET /verify-certificate/:certificate_id
///
/// 200 verified, 404 unknown id, 400 revoked / expired / tampered.
pub async fn verify_certificate(
    State(state): State<AppState>,
    Path(certificate_id): Path<String>,
) -> ApiResult<(StatusCode, Json<VerificationResult>)> {
    let result = state.verifier.verify(&certificate_id, now()).await?;
    let status = match (&result.verified, &result.status) {
        (true, _) => StatusCode::OK,
        (false, None) => StatusCode::NOT_FOUND,
        (false, Some(_)) => StatusCode::BAD_REQUEST,
    };
    Ok((status, Json(result)))
}
