use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use super::payload::NotFoundResponse;
use super::status::{ETALON_STATUS_HEADER, SearchStatus};
use crate::classifier::ClassifierError;
use crate::scenario::{Attempt, ScenarioError};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("no answer found for sys_id '{sys_id}'")]
    NotFound {
        sys_id: String,
        attempts: Vec<Attempt>,
    },

    #[error("backend error: {0}")]
    BackendError(String),

    #[error("internal error: {0}")]
    InternalError(String),
}

impl From<ScenarioError> for GatewayError {
    fn from(err: ScenarioError) -> Self {
        match err {
            ScenarioError::Exhausted { sys_id, attempts } => Self::NotFound { sys_id, attempts },
            ScenarioError::Classifier {
                classifier,
                source: ClassifierError::Retrieval(source),
            } => Self::BackendError(format!("{classifier}: {source}")),
            other => Self::InternalError(other.to_string()),
        }
    }
}

#[derive(serde::Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, etalon_status) = match &self {
            GatewayError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            GatewayError::NotFound { .. } => {
                (StatusCode::NOT_FOUND, SearchStatus::NotFound.as_header_value())
            }
            GatewayError::BackendError(_) => (StatusCode::BAD_GATEWAY, "backend_error"),
            GatewayError::InternalError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        };

        let mut headers = HeaderMap::new();
        headers.insert(
            ETALON_STATUS_HEADER,
            HeaderValue::from_static(etalon_status),
        );

        match self {
            GatewayError::NotFound { sys_id, attempts } => {
                let body = Json(NotFoundResponse {
                    status: "not_found",
                    sys_id,
                    attempts,
                });
                (status, headers, body).into_response()
            }
            other => {
                let body = Json(ErrorResponse {
                    error: other.to_string(),
                    code: status.as_u16(),
                });
                (status, headers, body).into_response()
            }
        }
    }
}
