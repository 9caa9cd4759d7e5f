// SPDX-FileCopyrightText: 2026 Lumo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping of domain errors to HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use lumo_core::{EligibilityReport, LumoError};
use lumo_evaluation::eligibility::ALREADY_EVALUATED_REASON;
use serde::Serialize;

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Eligibility diagnostics, for evaluation rejections.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eligibility: Option<EligibilityReport>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            eligibility: None,
        }
    }
}

/// Error returned by handlers.
#[derive(Debug)]
pub enum ApiError {
    /// The user identity header is missing.
    Unauthenticated,
    Lumo(LumoError),
}

impl From<LumoError> for ApiError {
    fn from(err: LumoError) -> Self {
        Self::Lumo(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse::new("missing user identity"),
            ),
            Self::Lumo(LumoError::Ineligible(report)) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: report.reason.clone(),
                    eligibility: Some(*report),
                },
            ),
            Self::Lumo(LumoError::AlreadyEvaluated { .. }) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: ALREADY_EVALUATED_REASON.to_string(),
                    eligibility: Some(EligibilityReport {
                        eligible: false,
                        existing: true,
                        questions_count: 0,
                        responses_count: 0,
                        min_questions: 0,
                        min_responses: 0,
                        reason: ALREADY_EVALUATED_REASON.to_string(),
                    }),
                },
            ),
            Self::Lumo(err @ LumoError::BadRequest(_))
            | Self::Lumo(err @ LumoError::InvalidState(_)) => {
                (StatusCode::BAD_REQUEST, ErrorResponse::new(err.to_string()))
            }
            Self::Lumo(err @ LumoError::NotFound { .. }) => {
                (StatusCode::NOT_FOUND, ErrorResponse::new(err.to_string()))
            }
            Self::Lumo(err) => {
                tracing::error!(error = %err, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("internal error"),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: LumoError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn client_errors_map_to_4xx() {
        assert_eq!(
            status_of(LumoError::session_not_found("s1")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(LumoError::BadRequest("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(LumoError::AlreadyEvaluated {
                session_id: "s1".into()
            }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Unauthenticated.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn lost_evaluation_race_reports_existing_eligibility() {
        let response = ApiError::from(LumoError::AlreadyEvaluated {
            session_id: "s1".into(),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["eligibility"]["existing"], true);
        assert_eq!(body["eligibility"]["eligible"], false);
        assert_eq!(body["error"], ALREADY_EVALUATED_REASON);
    }

    #[test]
    fn upstream_failures_map_to_500() {
        let provider = LumoError::Provider {
            message: "quota".into(),
            source: None,
        };
        assert_eq!(status_of(provider), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            status_of(LumoError::Internal("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
