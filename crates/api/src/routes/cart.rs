//! Cart endpoints.

use std::sync::Arc;

use axum::extract::{Path, State};
use common::ProductId;
use domain::CartSummary;
use serde::{Deserialize, Serialize};
use store::Store;

use crate::error::ApiError;
use crate::extract::{JsonBody, Requester};
use crate::response::ApiResponse;
use crate::routes::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSizeResponse {
    pub cart_size: usize,
}

/// POST /cart — add one unit of a product.
#[tracing::instrument(skip(state, body), fields(user_id = %requester.user_id))]
pub async fn add<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    requester: Requester,
    JsonBody(body): JsonBody<AddToCartRequest>,
) -> Result<ApiResponse<CartSizeResponse>, ApiError> {
    let cart_size = state
        .checkout
        .cart
        .add_line(requester.user_id, &body.product_id)
        .await?;
    Ok(ApiResponse::ok(CartSizeResponse { cart_size }).with_message("Product added to cart"))
}

/// GET /cart
#[tracing::instrument(skip(state), fields(user_id = %requester.user_id))]
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    requester: Requester,
) -> Result<ApiResponse<CartSummary>, ApiError> {
    let summary = state.checkout.cart.list_lines(requester.user_id).await?;
    Ok(ApiResponse::ok(summary))
}

/// GET /cart/ids
pub async fn ids<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    requester: Requester,
) -> Result<ApiResponse<Vec<ProductId>>, ApiError> {
    let ids = state
        .checkout
        .cart
        .cart_product_ids(requester.user_id)
        .await?;
    Ok(ApiResponse::ok(ids))
}

/// PATCH /cart/{productId}
#[tracing::instrument(skip(state, body), fields(user_id = %requester.user_id))]
pub async fn update<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    requester: Requester,
    Path(product_id): Path<String>,
    JsonBody(body): JsonBody<UpdateQuantityRequest>,
) -> Result<ApiResponse<()>, ApiError> {
    state
        .checkout
        .cart
        .update_line(requester.user_id, &product_id, body.quantity)
        .await?;
    Ok(ApiResponse::message("Cart updated"))
}

/// DELETE /cart/{productId}
#[tracing::instrument(skip(state), fields(user_id = %requester.user_id))]
pub async fn remove<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    requester: Requester,
    Path(product_id): Path<String>,
) -> Result<ApiResponse<()>, ApiError> {
    state
        .checkout
        .cart
        .remove_line(requester.user_id, &product_id)
        .await?;
    Ok(ApiResponse::message("Product removed from cart"))
}
