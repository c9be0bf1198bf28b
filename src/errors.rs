use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application error taxonomy, rendered as `{"msg": ...}` JSON bodies.
///
/// `Auth` deliberately maps to 400 while an unknown email maps to
/// `NotFound` (404) — the upstream API contract differentiates the two.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Auth(String),
    #[error("{msg}")]
    Dependency {
        msg: String,
        peer_error: Option<serde_json::Value>,
    },
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Auth(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Dependency { .. } | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Dependency { msg, peer_error } => {
                tracing::error!(%msg, "peer dependency failed");
                json!({ "msg": msg, "poc_error": peer_error })
            }
            ApiError::Internal(e) => {
                tracing::error!(error = %e, "internal error");
                json!({ "msg": "Server Error", "error": e.to_string() })
            }
            other => json!({ "msg": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            ApiError::Validation("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Auth("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::Dependency {
                msg: "x".into(),
                peer_error: None
            }
            .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn messages_pass_through() {
        let e = ApiError::Validation("Full name and email are required".into());
        assert_eq!(e.to_string(), "Full name and email are required");
    }
}
