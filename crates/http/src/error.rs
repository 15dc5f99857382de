//! Error handling for the HTTP layer
//!
//! Handlers surface exactly two failure kinds. Both answer with a bare status
//! code; the detail only goes to the log, tagged with an `error_id`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use uuid::{NoContext, Timestamp, Uuid};

/// Application error types that map to HTTP responses
#[derive(Error, Debug)]
pub enum AppError {
    #[error("not found: {message}")]
    NotFound { message: String },

    #[error("storage failure: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl AppError {
    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a storage failure from any error value
    pub fn storage<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage(anyhow::Error::new(error))
    }

    /// HTTP status this error maps to
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v7(Timestamp::now(NoContext));
        let status = self.status();

        match &self {
            AppError::NotFound { message } => tracing::info!(
                error_id = %error_id,
                status_code = %status.as_u16(),
                %message,
                "resource not found"
            ),
            AppError::Storage(e) => tracing::error!(
                error_id = %error_id,
                status_code = %status.as_u16(),
                error = %format!("{e:#}"),
                "storage failure"
            ),
        }

        status.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("disk on fire")]
    struct DiskOnFire;

    #[test]
    fn test_not_found_mapping() {
        let error = AppError::not_found("joke 42");
        assert_eq!(error.to_string(), "not found: joke 42");

        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_storage_mapping() {
        let error = AppError::storage(DiskOnFire);
        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.to_string(), "storage failure: disk on fire");
    }

    #[test]
    fn test_anyhow_converts_to_storage() {
        let error: AppError = anyhow::anyhow!("Database connection failed").into();
        assert!(matches!(error, AppError::Storage(_)));
    }

    #[tokio::test]
    async fn test_error_body_is_empty() {
        let response = AppError::storage(DiskOnFire).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(body.is_empty());
    }
}
