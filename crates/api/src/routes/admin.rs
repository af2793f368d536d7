//! Admin order endpoints.

use std::sync::Arc;

use axum::extract::State;
use checkout::OrderDetails;
use serde::{Deserialize, Serialize};
use store::Store;

use crate::error::ApiError;
use crate::extract::{Admin, JsonBody};
use crate::response::ApiResponse;
use crate::routes::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetStatusRequest {
    pub order_id: String,
    pub status: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetStatusResponse {
    pub email_delivered: bool,
}

/// GET /admin/orders — every non-pending order with its owner, newest first.
#[tracing::instrument(skip(state, _admin))]
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    _admin: Admin,
) -> Result<ApiResponse<Vec<OrderDetails>>, ApiError> {
    let orders = state.checkout.queries.admin_orders().await?;
    Ok(ApiResponse::ok(orders))
}

/// POST /admin/orders/status
#[tracing::instrument(skip(state, body), fields(admin_id = %admin.0.user_id))]
pub async fn set_status<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    admin: Admin,
    JsonBody(body): JsonBody<SetStatusRequest>,
) -> Result<ApiResponse<SetStatusResponse>, ApiError> {
    let change = state
        .checkout
        .status
        .set_status(&body.order_id, &body.status)
        .await?;

    Ok(ApiResponse::ok(SetStatusResponse {
        email_delivered: change.email_delivered,
    })
    .with_message(format!("Order status updated to {}", change.order.status)))
}
