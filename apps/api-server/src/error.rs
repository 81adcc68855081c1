use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Request-level failures. There is no recovery path: a request either
/// fully succeeds or surfaces one of these.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("no image was uploaded")]
    MissingImage,
    #[error("failed to read the uploaded form: {0}")]
    BadUpload(String),
    #[error("caption generation failed: {0}")]
    Caption(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingImage | ApiError::BadUpload(_) => StatusCode::BAD_REQUEST,
            ApiError::Caption(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!("request failed: {}", self);
        (self.status_code(), self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::MissingImage.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::BadUpload("truncated".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Caption("not an image".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
