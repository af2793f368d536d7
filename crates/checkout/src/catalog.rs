//! Catalog view builder service.

use std::collections::HashMap;

use common::ProductId;
use domain::{ProductFilter, ProductView, build_views};
use store::Store;
use tracing::instrument;

use crate::error::{CheckoutError, Result};

/// Read-only access to denormalized product views.
///
/// Every price and stock figure used by the cart and order engine comes
/// from here.
#[derive(Clone)]
pub struct Catalog<S> {
    store: S,
}

impl<S: Store> Catalog<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns views of the products matching `filter`, newest first.
    #[instrument(skip(self))]
    pub async fn list(&self, filter: &ProductFilter) -> Result<Vec<ProductView>> {
        let records = self.store.catalog_records(filter).await?;
        Ok(build_views(records))
    }

    /// Returns the view of any product, active or not.
    pub async fn view(&self, product_id: ProductId) -> Result<Option<ProductView>> {
        let mut views = self.list(&ProductFilter::by_id(product_id)).await?;
        Ok(views.pop())
    }

    /// Returns the view of an active product.
    pub async fn active_view(&self, product_id: ProductId) -> Result<ProductView> {
        self.list(&ProductFilter::by_id(product_id).active())
            .await?
            .pop()
            .ok_or_else(|| CheckoutError::not_found("Product"))
    }

    /// Views for a batch of products keyed by id. Missing products are absent.
    pub async fn views_by_id(
        &self,
        product_ids: impl IntoIterator<Item = ProductId>,
    ) -> Result<HashMap<ProductId, ProductView>> {
        let ids: Vec<ProductId> = product_ids.into_iter().collect();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let views = self.list(&ProductFilter::by_ids(ids)).await?;
        Ok(views.into_iter().map(|v| (v.id, v)).collect())
    }
}
