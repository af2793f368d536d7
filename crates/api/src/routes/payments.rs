//! Payment verification callback.

use std::sync::Arc;

use axum::extract::State;
use checkout::PaymentCallback;
use store::Store;

use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::response::ApiResponse;
use crate::routes::AppState;

/// POST /payments/verify
///
/// Called by the client with the values the gateway's checkout form returned.
#[tracing::instrument(skip(state, callback))]
pub async fn verify<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    JsonBody(callback): JsonBody<PaymentCallback>,
) -> Result<ApiResponse<()>, ApiError> {
    state.checkout.payments.verify(&callback).await?;
    Ok(ApiResponse::message("Payment verified"))
}
