//! The uniform response envelope.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// `{statusCode, success, message?, data?}`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    #[serde(skip)]
    status: StatusCode,
    status_code: u16,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self::success(StatusCode::OK, None, Some(data))
    }

    pub fn created(data: T) -> Self {
        Self::success(StatusCode::CREATED, None, Some(data))
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    fn success(status: StatusCode, message: Option<String>, data: Option<T>) -> Self {
        Self {
            status,
            status_code: status.as_u16(),
            success: true,
            message,
            data,
        }
    }
}

impl ApiResponse<()> {
    /// A success carrying only a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self::success(StatusCode::OK, Some(message.into()), None)
    }

    pub fn failure(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            status_code: status.as_u16(),
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}
