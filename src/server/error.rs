use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

/// Handler failures, rendered as `{"error": "<message>"}`
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("No file uploaded")]
    NoFile,

    #[error("Upload exceeds {0} bytes")]
    TooLarge(usize),

    #[error("{0}")]
    BadUpload(String),

    #[error("No tables detected")]
    NoTables,

    #[error("Extraction timed out after {0}s")]
    Timeout(u64),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal(e: impl std::fmt::Display) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NoFile | ApiError::BadUpload(_) | ApiError::NoTables => StatusCode::BAD_REQUEST,
            ApiError::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Timeout(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({ "error": self.to_string() }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::NoTables.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NoFile.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::TooLarge(10).status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(ApiError::Timeout(5).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ApiError::internal("disk full").status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_messages() {
        assert_eq!(ApiError::NoTables.to_string(), "No tables detected");
        assert_eq!(ApiError::TooLarge(1024).to_string(), "Upload exceeds 1024 bytes");
        assert_eq!(ApiError::Timeout(30).to_string(), "Extraction timed out after 30s");
    }
}
