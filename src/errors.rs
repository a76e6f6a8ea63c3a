use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::error::DbErr;
use serde::{Deserialize, Serialize};

/// Error payload returned by every HTTP endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always `"error"`
    pub status: String,
    /// HTTP status category (e.g., "Not Found", "Internal Server Error")
    pub error: String,
    /// Human-readable error description
    pub message: String,
    /// Underlying cause, present for fatal pipeline failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// RFC 3339 timestamp when the error was rendered
    pub timestamp: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Run id allocation failed: {0}")]
    AllocationError(String),

    #[error("Forecast processing failed for reagent {reagent_id}: {source}")]
    ProcessingError {
        reagent_id: i32,
        #[source]
        source: Box<ServiceError>,
    },

    #[error("Model error: {0}")]
    ModelError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl ServiceError {
    /// Wraps a failure raised while handling one reagent so the run aborts with context.
    pub fn processing(reagent_id: i32, source: ServiceError) -> Self {
        match source {
            already @ ServiceError::ProcessingError { .. } => already,
            other => ServiceError::ProcessingError {
                reagent_id,
                source: Box::new(other),
            },
        }
    }

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::ConnectionError(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::DatabaseError(_)
            | Self::AllocationError(_)
            | Self::ProcessingError { .. }
            | Self::ModelError(_)
            | Self::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message suitable for HTTP responses.
    /// Raw database errors are not echoed back to callers.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::Other(_) => "Internal server error".to_string(),
            Self::ConnectionError(_) => "Database connection error".to_string(),
            Self::AllocationError(_) => "Could not allocate a prediction run id".to_string(),
            Self::ProcessingError { reagent_id, .. } => {
                format!("Forecast run aborted while processing reagent {}", reagent_id)
            }
            _ => self.to_string(),
        }
    }

    /// Cause reported alongside fatal pipeline failures.
    pub fn cause(&self) -> Option<String> {
        match self {
            Self::ConnectionError(cause) | Self::AllocationError(cause) => Some(cause.clone()),
            Self::ProcessingError { source, .. } => Some(source.to_string()),
            _ => None,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let err = ErrorResponse {
            status: "error".to_string(),
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.response_message(),
            details: self.cause(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(err)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use axum::body::to_bytes;

    #[test]
    fn processing_error_keeps_innermost_reagent() {
        let inner = ServiceError::processing(3, ServiceError::ModelError("singular fit".into()));
        let outer = ServiceError::processing(9, inner);

        assert_matches!(outer, ServiceError::ProcessingError { reagent_id: 3, .. });
    }

    #[test]
    fn status_code_mapping() {
        assert_eq!(
            ServiceError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::ConnectionError("refused".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ServiceError::processing(1, ServiceError::ModelError("x".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ServiceError::ValidationError("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn response_message_hides_database_details() {
        let err = ServiceError::DatabaseError(DbErr::Custom("table secrets missing".into()));
        assert_eq!(err.response_message(), "Database error");
        assert_eq!(err.cause(), None);
    }

    #[tokio::test]
    async fn fatal_error_body_carries_cause() {
        let err = ServiceError::processing(7, ServiceError::ModelError("diverged".into()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let payload: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(payload.status, "error");
        assert_eq!(
            payload.message,
            "Forecast run aborted while processing reagent 7"
        );
        assert_eq!(payload.details.as_deref(), Some("Model error: diverged"));
    }
}
