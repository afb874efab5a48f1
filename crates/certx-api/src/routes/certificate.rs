//! Certificate issuance and administration endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use certx_core::certificate::CertificateStatus;
use certx_core::types::{now, CourseId, UserId};

use crate::dto::{AnnotateRequest, CertificateResponse, IssueCertificateRequest, UpdateStatusRequest};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// POST /certificate
///
/// 201 when this call created the certificate, 200 when it already existed.
pub async fn issue_certificate(
    State(state): State<AppState>,
    Json(req): Json<IssueCertificateRequest>,
) -> ApiResult<(StatusCode, Json<CertificateResponse>)> {
    let outcome = state
        .store
        .issue(&UserId::new(req.user_id), &CourseId::new(req.course_id), now())
        .await?;

    let status = if outcome.is_created() { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(outcome.into_certificate().into())))
}

/// GET /certificate/:certificate_id
pub async fn get_certificate(
    State(state): State<AppState>,
    Path(certificate_id): Path<String>,
) -> ApiResult<Json<CertificateResponse>> {
    let cert = state.store.get_by_id(&certificate_id, now())?;
    Ok(Json(cert.into()))
}

/// GET /certificates/user/:user_id
pub async fn list_user_certificates(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Vec<CertificateResponse>>> {
    let certs = state.store.list_for_user(&UserId::new(user_id), now())?;
    Ok(Json(certs.into_iter().map(Into::into).collect()))
}

/// POST /certificate/:certificate_id/status
pub async fn update_status(
    State(state): State<AppState>,
    Path(certificate_id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> ApiResult<Json<CertificateResponse>> {
    let status: CertificateStatus = req
        .status
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("unknown status: {}", req.status)))?;
    let cert = state.store.set_status(&certificate_id, status, now())?;
    Ok(Json(cert.into()))
}

/// POST /certificate/:certificate_id/metadata
pub async fn annotate_certificate(
    State(state): State<AppState>,
    Path(certificate_id): Path<String>,
    Json(req): Json<AnnotateRequest>,
) -> ApiResult<Json<CertificateResponse>> {
    let cert = state.store.annotate(&certificate_id, &req.key, &req.value, now())?;
    Ok(Json(cert.into()))
}
