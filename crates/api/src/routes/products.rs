//! Catalog listing endpoints.

use std::sync::Arc;

use axum::extract::{Path, State};
use common::{BrandId, CategoryId, ProductId};
use domain::{ProductFilter, ProductView};
use serde::Deserialize;
use store::Store;

use crate::error::ApiError;
use crate::extract::QueryParams;
use crate::response::ApiResponse;
use crate::routes::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub brand: Option<String>,
    pub category: Option<String>,
}

/// GET /products — active products, optionally by brand or category.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    QueryParams(query): QueryParams<ProductQuery>,
) -> Result<ApiResponse<Vec<ProductView>>, ApiError> {
    let mut filter = ProductFilter::all().active();
    if let Some(brand) = query.brand.as_deref().filter(|b| !b.is_empty()) {
        filter = filter.with_brand(BrandId::parse(brand)?);
    }
    if let Some(category) = query.category.as_deref().filter(|c| !c.is_empty()) {
        filter = filter.with_category(CategoryId::parse(category)?);
    }

    let views = state.checkout.catalog.list(&filter).await?;
    Ok(ApiResponse::ok(views))
}

/// GET /products/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<ApiResponse<ProductView>, ApiError> {
    let product_id = ProductId::parse(&id)?;
    let view = state.checkout.catalog.active_view(product_id).await?;
    Ok(ApiResponse::ok(view))
}
