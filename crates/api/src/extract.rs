//! Request extractors: requester identity and JSON bodies.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use common::UserId;
use domain::Role;
use serde::de::DeserializeOwned;

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";
pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

/// The authenticated caller, as asserted by the upstream auth layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requester {
    pub user_id: UserId,
    pub role: Role,
}

impl<S: Send + Sync> FromRequestParts<S> for Requester {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| ApiError::Unauthorized("Missing X-User-Id header".to_string()))?
            .to_str()
            .ok()
            .and_then(|v| UserId::parse(v.trim()).ok())
            .ok_or_else(|| ApiError::Unauthorized("Invalid X-User-Id header".to_string()))?;

        let role = match parts.headers.get(USER_ROLE_HEADER) {
            None => Role::User,
            Some(value) => match value.to_str().map(|v| v.trim().to_ascii_lowercase()) {
                Ok(v) if v == "user" => Role::User,
                Ok(v) if v == "admin" => Role::Admin,
                _ => {
                    return Err(ApiError::Unauthorized(
                        "Invalid X-User-Role header".to_string(),
                    ));
                }
            },
        };

        Ok(Self { user_id, role })
    }
}

/// A requester holding the admin role.
#[derive(Debug, Clone, Copy)]
pub struct Admin(pub Requester);

impl<S: Send + Sync> FromRequestParts<S> for Admin {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let requester = Requester::from_request_parts(parts, state).await?;
        if requester.role != Role::Admin {
            tracing::warn!(user_id = %requester.user_id, "non-admin hit admin route");
            return Err(ApiError::Forbidden);
        }
        Ok(Self(requester))
    }
}

/// The optional `Idempotency-Key` header.
#[derive(Debug, Clone, Default)]
pub struct IdempotencyKey(pub Option<String>);

impl<S: Send + Sync> FromRequestParts<S> for IdempotencyKey {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.headers.get(IDEMPOTENCY_KEY_HEADER) {
            None => Ok(Self(None)),
            Some(value) => {
                let key = value
                    .to_str()
                    .map_err(|_| ApiError::BadRequest("Invalid Idempotency-Key header".to_string()))?
                    .trim();
                Ok(Self((!key.is_empty()).then(|| key.to_string())))
            }
        }
    }
}

/// `Json` whose rejection renders as the failure envelope.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e: JsonRejection| ApiError::BadRequest(e.body_text()))?;
        Ok(Self(value))
    }
}

/// `Query` whose rejection renders as the failure envelope.
#[derive(Debug)]
pub struct QueryParams<T>(pub T);

impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e: QueryRejection| ApiError::BadRequest(e.body_text()))?;
        Ok(Self(value))
    }
}
