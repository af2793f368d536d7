//! Cart aggregator.

use chrono::Utc;
use common::{ProductId, UserId};
use domain::{CartSummary, summarize};
use store::Store;
use tracing::instrument;

use crate::catalog::Catalog;
use crate::error::{CheckoutError, Result};

/// Per-user cart operations priced against the live catalog.
#[derive(Clone)]
pub struct CartAggregator<S> {
    store: S,
    catalog: Catalog<S>,
}

/// Cart routes treat a malformed product id like an unknown product.
fn cart_product_id(product_id: &str) -> Result<ProductId> {
    ProductId::parse(product_id).map_err(|_| CheckoutError::not_found("Product"))
}

impl<S: Store + Clone> CartAggregator<S> {
    pub fn new(store: S) -> Self {
        Self {
            catalog: Catalog::new(store.clone()),
            store,
        }
    }

    /// Adds one unit of a product, returning the number of distinct lines.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn add_line(&self, user_id: UserId, product_id: &str) -> Result<usize> {
        let product_id = cart_product_id(product_id)?;
        self.catalog.active_view(product_id).await?;

        let size = self
            .store
            .add_or_increment(user_id, product_id, Utc::now())
            .await?;
        tracing::debug!(%product_id, cart_size = size, "cart line added");
        Ok(size)
    }

    /// Lists the cart with per-line and cart-level totals.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn list_lines(&self, user_id: UserId) -> Result<CartSummary> {
        let lines = self.store.cart_lines(user_id).await?;
        let views = self
            .catalog
            .views_by_id(lines.iter().map(|l| l.product_id))
            .await?;
        Ok(summarize(&lines, &views))
    }

    /// Sets a line's quantity; 0 removes the line.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn update_line(&self, user_id: UserId, product_id: &str, quantity: u32) -> Result<()> {
        let product_id = cart_product_id(product_id)?;
        self.store
            .set_quantity(user_id, product_id, quantity, Utc::now())
            .await?;
        Ok(())
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn remove_line(&self, user_id: UserId, product_id: &str) -> Result<()> {
        let product_id = cart_product_id(product_id)?;
        self.store.remove_line(user_id, product_id).await?;
        Ok(())
    }

    /// Product ids currently in the cart, in insertion order.
    pub async fn cart_product_ids(&self, user_id: UserId) -> Result<Vec<ProductId>> {
        let lines = self.store.cart_lines(user_id).await?;
        Ok(lines.into_iter().map(|l| l.product_id).collect())
    }
}

#[cfg(test)]
mod tests {
    use common::Money;

    use super::*;
    use crate::error::ErrorKind;
    use crate::testing::Fixture;

    #[tokio::test]
    async fn test_adding_twice_increments_one_line() {
        let fx = Fixture::new().await;
        let cart = &fx.checkout.cart;
        let id = fx.kettle.id.to_string();

        assert_eq!(cart.add_line(fx.user.id, &id).await.unwrap(), 1);
        assert_eq!(cart.add_line(fx.user.id, &id).await.unwrap(), 1);

        let summary = cart.list_lines(fx.user.id).await.unwrap();
        assert_eq!(summary.lines.len(), 1);
        assert_eq!(summary.lines[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_cart_totals() {
        let fx = Fixture::new().await;
        let cart = &fx.checkout.cart;
        cart.add_line(fx.user.id, &fx.kettle.id.to_string())
            .await
            .unwrap();
        cart.add_line(fx.user.id, &fx.kettle.id.to_string())
            .await
            .unwrap();
        cart.add_line(fx.user.id, &fx.toaster.id.to_string())
            .await
            .unwrap();

        // kettle 100/120 x2, toaster 50/50 x1
        let summary = cart.list_lines(fx.user.id).await.unwrap();
        assert_eq!(summary.total_amount, Money::from_major(290));
        assert_eq!(summary.payment_amount, Money::from_major(250));
        assert_eq!(summary.discount_amount, Money::from_major(40));
    }

    #[tokio::test]
    async fn test_inactive_product_line_is_unavailable() {
        let fx = Fixture::new().await;
        let cart = &fx.checkout.cart;
        cart.add_line(fx.user.id, &fx.kettle.id.to_string())
            .await
            .unwrap();
        fx.set_active(fx.kettle.id, false).await;

        let summary = cart.list_lines(fx.user.id).await.unwrap();
        assert_eq!(summary.lines.len(), 1);
        assert!(!summary.lines[0].available);
        assert_eq!(summary.payment_amount, Money::zero());
    }

    #[tokio::test]
    async fn test_unknown_or_malformed_product_is_not_found() {
        let fx = Fixture::new().await;
        let cart = &fx.checkout.cart;

        let err = cart.add_line(fx.user.id, "not-a-uuid").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = cart
            .add_line(fx.user.id, &ProductId::new().to_string())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_update_and_remove_lines() {
        let fx = Fixture::new().await;
        let cart = &fx.checkout.cart;
        let kettle = fx.kettle.id.to_string();
        let toaster = fx.toaster.id.to_string();
        cart.add_line(fx.user.id, &kettle).await.unwrap();
        cart.add_line(fx.user.id, &toaster).await.unwrap();

        cart.update_line(fx.user.id, &kettle, 4).await.unwrap();
        let summary = cart.list_lines(fx.user.id).await.unwrap();
        assert_eq!(summary.lines[0].quantity, 4);

        cart.update_line(fx.user.id, &kettle, 0).await.unwrap();
        assert_eq!(
            cart.cart_product_ids(fx.user.id).await.unwrap(),
            vec![fx.toaster.id]
        );

        cart.remove_line(fx.user.id, &toaster).await.unwrap();
        assert!(cart.cart_product_ids(fx.user.id).await.unwrap().is_empty());

        let err = cart.remove_line(fx.user.id, &toaster).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = cart.update_line(fx.user.id, &kettle, 2).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
