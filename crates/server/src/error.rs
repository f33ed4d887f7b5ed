//! Error types and HTTP error responses.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use docsift_core::AppError;
use serde::Serialize;

/// Errors a handler can return.
#[derive(Debug)]
pub enum ServerError {
    /// The service returned an error.
    App(AppError),
    /// The request body was not valid JSON for the endpoint.
    BadRequest(String),
}

/// JSON body returned on error.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: u16,
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::App(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            ServerError::App(AppError::ProviderFailure(_)) => StatusCode::BAD_GATEWAY,
            ServerError::App(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ServerError::App(e) => e.to_string(),
            ServerError::BadRequest(msg) => msg,
        };

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "{}", message);
        } else {
            tracing::debug!(status = status.as_u16(), "{}", message);
        }

        let body = ErrorBody {
            error: message,
            code: status.as_u16(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<AppError> for ServerError {
    fn from(e: AppError) -> Self {
        ServerError::App(e)
    }
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        ServerError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (
                AppError::DimensionMismatch {
                    expected: 3,
                    actual: 2,
                },
                StatusCode::BAD_REQUEST,
            ),
            (AppError::ProviderFailure("x".into()), StatusCode::BAD_GATEWAY),
            (AppError::Config("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (AppError::Knowledge("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(ServerError::from(err).status(), expected);
        }
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = ServerError::BadRequest("documentId is required".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "documentId is required");
        assert_eq!(json["code"], 400);
    }
}
