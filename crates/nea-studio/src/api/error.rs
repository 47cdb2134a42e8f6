//! HTTP mapping for service errors

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use nea_common::{NeaError, ParseError};
use tracing::error;

/// Error returned from a route handler
#[derive(Debug)]
pub struct ApiError(pub NeaError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        if self.0.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl From<NeaError> for ApiError {
    fn from(err: NeaError) -> Self {
        ApiError(err)
    }
}

impl From<ParseError> for ApiError {
    fn from(err: ParseError) -> Self {
        ApiError(err.into())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.0, "Request failed");
        }
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_is_bad_request() {
        let err: ApiError = ParseError::UnknownDomain("maritime".to_string()).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_internal_error_is_server_error() {
        let err = ApiError(NeaError::Internal("encoder".to_string()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
