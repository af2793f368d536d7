//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::{CheckoutError, ErrorKind};

use crate::response::ApiResponse;

/// API-level error type that maps to the failure envelope.
#[derive(Debug)]
pub enum ApiError {
    /// Missing or malformed requester identity.
    Unauthorized(String),
    /// Requester lacks the required role.
    Forbidden,
    /// Unreadable request body or query.
    BadRequest(String),
    /// Error raised by a checkout service.
    Checkout(CheckoutError),
}

impl ApiError {
    fn kind(&self) -> &'static str {
        match self {
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Forbidden => "forbidden",
            ApiError::BadRequest(_) => ErrorKind::Validation.as_str(),
            ApiError::Checkout(err) => err.kind().as_str(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        metrics::counter!("api_errors_total", "kind" => kind).increment(1);

        let (status, message) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden => (
                StatusCode::FORBIDDEN,
                "You are not allowed to perform this action".to_string(),
            ),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Checkout(err) => match err.kind() {
                ErrorKind::Internal => {
                    tracing::error!(error = %err, kind, "internal server error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Something went wrong".to_string(),
                    )
                }
                _ => {
                    tracing::warn!(error = %err, kind, "request rejected");
                    (StatusCode::BAD_REQUEST, err.to_string())
                }
            },
        };

        ApiResponse::<()>::failure(status, message).into_response()
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        ApiError::Checkout(err)
    }
}

impl From<common::IdParseError> for ApiError {
    fn from(err: common::IdParseError) -> Self {
        ApiError::Checkout(err.into())
    }
}

#[cfg(test)]
mod tests {
    use store::StoreError;

    use super::*;

    async fn render(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_domain_failures_render_as_400() {
        let (status, body) = render(CheckoutError::not_found("Order").into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["statusCode"], 400);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Order is not found");
    }

    #[tokio::test]
    async fn test_internal_failures_hide_details() {
        let err = CheckoutError::Store(StoreError::Decode("bad row".to_string()));
        let (status, body) = render(err.into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Something went wrong");
    }

    #[tokio::test]
    async fn test_identity_failures() {
        let (status, body) = render(ApiError::Unauthorized("Missing X-User-Id header".into())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["statusCode"], 401);

        let (status, _) = render(ApiError::Forbidden).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
