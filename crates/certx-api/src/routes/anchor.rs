//! Certificate anchoring endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use certx_core::types::now;

use crate::dto::{AnchorResponse, MintAnchorRequest};
use crate::error::ApiResult;
use crate::state::AppState;

/// POST /certificate/:certificate_id/mint
///
/// 201 when this call minted, 200 when the certificate was already anchored.
pub async fn mint_anchor(
    State(state): State<AppState>,
    Path(certificate_id): Path<String>,
    Json(req): Json<MintAnchorRequest>,
) -> ApiResult<(StatusCode, Json<AnchorResponse>)> {
    let outcome = state
        .anchors
        .mint(&certificate_id, &req.destination_address, now())
        .await?;

    let status = if outcome.is_minted() { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(outcome.into_anchor().into())))
}

/// GET /certificate-nft/by-certificate/:certificate_id
pub async fn get_anchor(
    State(state): State<AppState>,
    Path(certificate_id): Path<String>,
) -> ApiResult<Json<AnchorResponse>> {
    let anchor = state.anchors.get_anchor(&certificate_id)?;
    Ok(Json(anchor.into()))
}
