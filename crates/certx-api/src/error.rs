//! API Error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use certx_core::error::CertxError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Certx(#[from] CertxError),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
    pub code: String,
    // Progress details of a refused issuance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_lessons: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_lectures: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_percentage: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_passed_any_quiz: Option<bool>,
}

impl ErrorResponse {
    fn new(message: impl Into<String>, code: &str) -> Self {
        Self {
            message: message.into(),
            code: code.to_string(),
            completed_lessons: None,
            total_lectures: None,
            completion_percentage: None,
            has_passed_any_quiz: None,
        }
    }
}

pub fn status_for(e: &CertxError) -> StatusCode {
    match e {
        CertxError::NotEligible { .. } | CertxError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        CertxError::NotFound(_) => StatusCode::NOT_FOUND,
        CertxError::InvalidTransition { .. } | CertxError::CertificateInactive { .. } => StatusCode::CONFLICT,
        CertxError::DependencyUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        CertxError::MintFailed { .. } => StatusCode::BAD_GATEWAY,
        CertxError::Serialization(_) | CertxError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorResponse::new(msg, "BAD_REQUEST")),
            ApiError::Certx(e) => {
                let status = status_for(&e);
                let body = match &e {
                    CertxError::NotEligible {
                        completion_percentage,
                        has_passed_any_quiz,
                        completed_lessons,
                        total_lessons,
                    } => ErrorResponse {
                        completed_lessons: Some(*completed_lessons),
                        total_lectures: Some(*total_lessons),
                        completion_percentage: Some(*completion_percentage),
                        has_passed_any_quiz: Some(*has_passed_any_quiz),
                        ..ErrorResponse::new(
                            "You are not eligible for a certificate yet. Complete every lesson and pass at least one quiz.",
                            e.code(),
                        )
                    },
                    CertxError::DependencyUnavailable(detail) => {
                        warn!(error = %detail, "dependency unavailable");
                        ErrorResponse::new("A dependency is temporarily unavailable. Please try again.", e.code())
                    }
                    CertxError::MintFailed { reason } => {
                        warn!(error = %reason, "mint failed");
                        ErrorResponse::new("The certificate could not be minted right now. Please try again.", e.code())
                    }
                    CertxError::Serialization(_) | CertxError::Storage(_) => {
                        error!(error = %e, "internal error");
                        ErrorResponse::new("Internal error", e.code())
                    }
                    _ => ErrorResponse::new(e.to_string(), e.code()),
                };
                (status, body)
            }
        };

        (status, Json(body)).into_response()
    }
}

/// API result type
pub type ApiResult<T> = Result<T, ApiError>;
