use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

/// Failures of the chat endpoint, each mapped to one HTTP status.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("{0}")]
    Validation(String),
    #[error("AI service temporarily unavailable")]
    ServiceUnavailable,
    #[error("Network error contacting AI service")]
    Network(String),
    #[error("{message}")]
    Upstream {
        message: String,
        details: Option<String>,
    },
    #[error("AI service is not configured")]
    Configuration(String),
    #[error("Internal server error")]
    Internal(String),
}

impl ChatError {
    pub fn upstream(message: impl Into<String>, details: impl Into<String>) -> Self {
        ChatError::Upstream {
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Extra context safe to hand back to the client.
    pub fn details(&self) -> Option<String> {
        match self {
            ChatError::ServiceUnavailable => Some(
                "The AI model is currently busy. Please try again in a few minutes.".to_string(),
            ),
            ChatError::Network(cause) => Some(cause.clone()),
            ChatError::Upstream { details, .. } => details.clone(),
            ChatError::Configuration(detail) => Some(detail.clone()),
            ChatError::Validation(_) | ChatError::Internal(_) => None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ResponseError for ChatError {
    fn status_code(&self) -> StatusCode {
        match self {
            ChatError::Validation(_) => StatusCode::BAD_REQUEST,
            ChatError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ChatError::Network(_) | ChatError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            ChatError::Configuration(_) | ChatError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
            details: self.details(),
        })
    }
}
