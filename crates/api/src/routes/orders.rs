//! Customer order endpoints: quote, commit, listing and cancellation.

use std::sync::Arc;

use axum::extract::{Path, State};
use checkout::{CheckoutParams, CommitOutcome, CommitRequest, LineRequest, OrderDetails};
use common::OrderId;
use domain::{GeoPoint, PaymentMethod, Quote};
use serde::{Deserialize, Serialize};
use store::Store;

use crate::error::ApiError;
use crate::extract::{IdempotencyKey, JsonBody, Requester};
use crate::response::ApiResponse;
use crate::routes::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitOrderRequest {
    pub lines: Vec<LineRequest>,
    pub address_id: String,
    /// True for cash on delivery, false for online payment.
    pub cash: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl CommitOrderRequest {
    fn location(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint {
                latitude,
                longitude,
            }),
            _ => None,
        }
    }
}

/// Commit result: the order id for cash orders, checkout parameters otherwise.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum CommitResponse {
    #[serde(rename_all = "camelCase")]
    Cash { order_id: OrderId },
    Online(CheckoutParams),
}

impl From<CommitOutcome> for CommitResponse {
    fn from(outcome: CommitOutcome) -> Self {
        match outcome {
            CommitOutcome::Cash { order_id } => CommitResponse::Cash { order_id },
            CommitOutcome::Online(params) => CommitResponse::Online(params),
        }
    }
}

/// POST /orders/quote
#[tracing::instrument(skip(state, lines), fields(user_id = %requester.user_id))]
pub async fn quote<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    requester: Requester,
    JsonBody(lines): JsonBody<Vec<LineRequest>>,
) -> Result<ApiResponse<Quote>, ApiError> {
    let quote = state.checkout.orders.quote(&lines).await?;
    Ok(ApiResponse::ok(quote))
}

/// POST /orders — commit an order, optionally keyed by `Idempotency-Key`.
#[tracing::instrument(skip(state, body, key), fields(user_id = %requester.user_id))]
pub async fn commit<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    requester: Requester,
    IdempotencyKey(key): IdempotencyKey,
    JsonBody(body): JsonBody<CommitOrderRequest>,
) -> Result<ApiResponse<CommitResponse>, ApiError> {
    let method = if body.cash {
        PaymentMethod::Cash
    } else {
        PaymentMethod::Online
    };
    let location = body.location();
    let outcome = state
        .checkout
        .orders
        .commit(CommitRequest {
            user_id: requester.user_id,
            lines: body.lines,
            address_id: body.address_id,
            method,
            idempotency_key: key,
            location,
        })
        .await?;

    let message = match outcome {
        CommitOutcome::Cash { .. } => "Order placed successfully",
        CommitOutcome::Online(_) => "Proceed to payment",
    };
    Ok(ApiResponse::created(CommitResponse::from(outcome)).with_message(message))
}

/// GET /orders — the requester's orders, newest first.
#[tracing::instrument(skip(state), fields(user_id = %requester.user_id))]
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    requester: Requester,
) -> Result<ApiResponse<Vec<OrderDetails>>, ApiError> {
    let orders = state.checkout.queries.user_orders(requester.user_id).await?;
    Ok(ApiResponse::ok(orders))
}

/// GET /orders/{id}
#[tracing::instrument(skip(state), fields(user_id = %requester.user_id))]
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    requester: Requester,
    Path(id): Path<String>,
) -> Result<ApiResponse<OrderDetails>, ApiError> {
    let order = state
        .checkout
        .queries
        .user_order(requester.user_id, &id)
        .await?;
    Ok(ApiResponse::ok(order))
}

/// POST /orders/{id}/cancel
#[tracing::instrument(skip(state), fields(user_id = %requester.user_id))]
pub async fn cancel<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    requester: Requester,
    Path(id): Path<String>,
) -> Result<ApiResponse<()>, ApiError> {
    state
        .checkout
        .status
        .cancel_by_user(requester.user_id, &id)
        .await?;
    Ok(ApiResponse::message("Order cancelled successfully"))
}
