//! Error types for admin API.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rdkafka::error::KafkaError;
use serde_json::{json, Value};
use thiserror::Error;

/// Admin API error
#[derive(Error, Debug)]
pub enum AdminError {
    /// Client input rejected before any cluster call
    #[error("{message}")]
    BadRequest {
        message: String,
        example: Option<Value>,
    },

    #[error("{0}")]
    NotFound(String),

    /// Known route, unsupported method
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Request-level failure from the admin client (timeout, transport, auth)
    #[error("{0}")]
    Kafka(#[from] KafkaError),

    /// Per-resource error reported by the cluster inside a batch response
    #[error("{0}")]
    Upstream(String),

    #[error("{0}")]
    Internal(String),
}

/// Admin result type
pub type AdminResult<T> = Result<T, AdminError>;

impl AdminError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        AdminError::BadRequest {
            message: message.into(),
            example: None,
        }
    }

    pub fn bad_request_with_example(message: impl Into<String>, example: Value) -> Self {
        AdminError::BadRequest {
            message: message.into(),
            example: Some(example),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AdminError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AdminError::NotFound(_) => StatusCode::NOT_FOUND,
            AdminError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AdminError::Kafka(_) | AdminError::Upstream(_) | AdminError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<tokio::task::JoinError> for AdminError {
    fn from(e: tokio::task::JoinError) -> Self {
        AdminError::Internal(format!("Admin task failed: {}", e))
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %message, "Admin request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %message, "Admin request rejected");
        }

        let mut body = json!({
            "error": message,
            "status": "failed",
        });
        if let AdminError::BadRequest { example: Some(example), .. } = self {
            body["example"] = example;
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdkafka::error::RDKafkaErrorCode;

    #[test]
    fn test_status_codes() {
        assert_eq!(AdminError::bad_request("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AdminError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AdminError::MethodNotAllowed.status_code(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            AdminError::Upstream("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AdminError::Kafka(KafkaError::MetadataFetch(RDKafkaErrorCode::OperationTimedOut))
                .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_kafka_message_passed_through() {
        let inner = KafkaError::MetadataFetch(RDKafkaErrorCode::OperationTimedOut);
        let expected = inner.to_string();
        assert_eq!(AdminError::from(inner).to_string(), expected);
    }

    #[test]
    fn test_bad_request_with_example_status() {
        let response =
            AdminError::bad_request_with_example("missing", json!({"configs": {}})).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
