use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use workflow::ErrorKind;

use crate::response::ApiResponse;

/// Error returned by every handler; converted to the JSON envelope.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Workflow(#[from] workflow::Error),

    /// Body could not be read as a scenario.
    #[error("Invalid request body: {message}")]
    InvalidBody { message: String },

    /// Path id that is not a UUID; nothing can exist under it.
    #[error("{kind} {id} not found")]
    UnknownId { kind: &'static str, id: String },
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Workflow(e) => match e.kind() {
                ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::MissingInput | ErrorKind::Upstream | ErrorKind::Persistence => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::InvalidBody { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::UnknownId { .. } => StatusCode::NOT_FOUND,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Workflow(e) => e.kind().as_str(),
            Self::InvalidBody { .. } => ErrorKind::Validation.as_str(),
            Self::UnknownId { .. } => ErrorKind::NotFound.as_str(),
        }
    }

    fn failed_step(&self) -> Option<workflow::StepName> {
        match self {
            Self::Workflow(e) => e.failed_step(),
            _ => None,
        }
    }

    fn summary(&self) -> &'static str {
        match self.status_code() {
            StatusCode::UNPROCESSABLE_ENTITY => "Validation failed",
            StatusCode::NOT_FOUND => "Resource not found",
            _ => "Internal server error",
        }
    }

    fn details(&self) -> serde_json::Value {
        match self {
            Self::Workflow(e) => {
                let fields = e.field_errors();
                json!({
                    "code": self.error_code(),
                    "step": e.failed_step(),
                    "fields": if fields.is_empty() { None } else { Some(fields) },
                })
            }
            _ => json!({ "code": self.error_code() }),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(
                code = self.error_code(),
                step = ?self.failed_step(),
                error = %self,
                "Request failed"
            );
        }

        let body = ApiResponse {
            success: false,
            message: self.summary().to_string(),
            data: Some(self.details()),
            error: Some(self.to_string()),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use workflow::{Error, StepName};

    #[test]
    fn test_status_mapping() {
        let missing = ApiError::from(Error::StepFailed {
            step: StepName::Allocate,
            source: Box::new(Error::MissingInput {
                key: "predicted_needs",
            }),
            steps: vec![],
        });
        assert_eq!(missing.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(missing.to_string().contains("allocate"));

        let not_found = ApiError::from(Error::not_found("plan", "abc"));
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);

        let invalid = ApiError::InvalidBody {
            message: "missing field `severity`".to_string(),
        };
        assert_eq!(invalid.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(invalid.error_code(), "validation_error");
    }
}
