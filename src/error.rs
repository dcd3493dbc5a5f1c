use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

use crate::aggregator::AggregateError;

/// Application error types
///
/// Row-level parse problems never reach this type; they are absorbed by the
/// aggregator and only show up in its row statistics.
#[derive(Debug)]
pub enum AppError {
    /// Uploaded file rejected (extension, missing field, unreadable workbook)
    InvalidUpload(String),
    /// Query parameters rejected
    InvalidRequest(String),
    /// Table could not be aggregated
    Aggregation(AggregateError),
    /// Missing or invalid configuration (credentials)
    ConfigError(String),
    /// Remote API answered with a non-success status
    UpstreamError { status: StatusCode, message: String },
    /// Remote API could not be reached
    HttpRequest(reqwest::Error),
    /// Internal server error
    InternalError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUpload(msg) => write!(f, "{}", msg),
            Self::InvalidRequest(msg) => write!(f, "{}", msg),
            Self::Aggregation(err) => write!(f, "Aggregation failed: {}", err),
            Self::ConfigError(msg) => write!(f, "{}", msg),
            Self::UpstreamError { status, message } => {
                write!(f, "Upstream error ({}): {}", status, message)
            }
            Self::HttpRequest(err) => write!(f, "HTTP request error: {}", err),
            Self::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidUpload(_) | Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Aggregation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::ConfigError(_)
            | Self::UpstreamError { .. }
            | Self::HttpRequest(_)
            | Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidUpload(_) => "invalid_upload",
            Self::InvalidRequest(_) => "invalid_request",
            Self::Aggregation(_) => "aggregation_error",
            Self::ConfigError(_) => "config_error",
            Self::UpstreamError { .. } => "upstream_error",
            Self::HttpRequest(_) => "http_request_error",
            Self::InternalError(_) => "internal_error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "Request failed");
        } else {
            tracing::warn!(code = self.code(), error = %self, "Request rejected");
        }

        let body = Json(json!({
            "detail": self.to_string(),
            "code": self.code(),
        }));

        (status, body).into_response()
    }
}

impl From<AggregateError> for AppError {
    fn from(err: AggregateError) -> Self {
        Self::Aggregation(err)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        Self::HttpRequest(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::InternalError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = AppError::InvalidUpload("Only Excel files are supported".to_string());
        assert_eq!(error.to_string(), "Only Excel files are supported");

        let error = AppError::UpstreamError {
            status: StatusCode::FORBIDDEN,
            message: "denied".to_string(),
        };
        assert_eq!(error.to_string(), "Upstream error (403 Forbidden): denied");
    }

    #[test]
    fn test_error_code() {
        assert_eq!(AppError::ConfigError("x".to_string()).code(), "config_error");
        assert_eq!(
            AppError::Aggregation(AggregateError::InsufficientColumns { required: 2, found: 1 }).code(),
            "aggregation_error"
        );
    }

    #[test]
    fn test_upstream_errors_are_server_errors() {
        let error = AppError::UpstreamError {
            status: StatusCode::NOT_FOUND,
            message: "missing".to_string(),
        };
        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_error_response() {
        let error = AppError::InvalidUpload("bad file".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["detail"], "bad file");
        assert_eq!(json["code"], "invalid_upload");
    }
}
