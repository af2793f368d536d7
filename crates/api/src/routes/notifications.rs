//! Notification feed.

use std::sync::Arc;

use axum::extract::State;
use domain::Notification;
use store::Store;

use crate::error::ApiError;
use crate::extract::Requester;
use crate::response::ApiResponse;
use crate::routes::AppState;

/// GET /notifications — private notices for the requester plus public ones.
#[tracing::instrument(skip(state), fields(user_id = %requester.user_id))]
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    requester: Requester,
) -> Result<ApiResponse<Vec<Notification>>, ApiError> {
    let notifications = state
        .checkout
        .queries
        .notifications(requester.user_id)
        .await?;
    Ok(ApiResponse::ok(notifications))
}
