//! Product rating endpoint.

use std::sync::Arc;

use axum::extract::State;
use domain::Rating;
use serde::Deserialize;
use store::Store;

use crate::error::ApiError;
use crate::extract::{JsonBody, Requester};
use crate::response::ApiResponse;
use crate::routes::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingRequest {
    pub product_id: String,
    pub star: i64,
    pub description: Option<String>,
}

/// POST /ratings
#[tracing::instrument(skip(state, body), fields(user_id = %requester.user_id))]
pub async fn create<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    requester: Requester,
    JsonBody(body): JsonBody<RatingRequest>,
) -> Result<ApiResponse<Rating>, ApiError> {
    let rating = state
        .checkout
        .ratings
        .add_rating(
            requester.user_id,
            &body.product_id,
            body.star,
            body.description,
        )
        .await?;
    Ok(ApiResponse::created(rating).with_message("Thanks for rating"))
}
