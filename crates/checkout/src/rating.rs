//! Rating intake.

use chrono::Utc;
use common::{ProductId, UserId};
use domain::{DomainError, Rating};
use store::Store;
use tracing::instrument;

use crate::catalog::Catalog;
use crate::error::{CheckoutError, Result};

/// Accepts product ratings from customers who received the product.
#[derive(Clone)]
pub struct RatingIntake<S> {
    store: S,
    catalog: Catalog<S>,
}

impl<S: Store + Clone> RatingIntake<S> {
    pub fn new(store: S) -> Self {
        Self {
            catalog: Catalog::new(store.clone()),
            store,
        }
    }

    #[instrument(skip(self, description), fields(user_id = %user_id))]
    pub async fn add_rating(
        &self,
        user_id: UserId,
        product_id: &str,
        star: i64,
        description: Option<String>,
    ) -> Result<Rating> {
        let product_id = ProductId::parse(product_id)?;
        let star = u8::try_from(star).map_err(|_| DomainError::InvalidRating { star })?;
        let rating = Rating::new(user_id, product_id, star, description, Utc::now())?;

        if self.catalog.view(product_id).await?.is_none() {
            return Err(CheckoutError::not_found("Product"));
        }
        if !self.store.has_delivered_product(user_id, product_id).await? {
            return Err(CheckoutError::Conflict(
                "only delivered products can be rated".to_string(),
            ));
        }

        self.store.insert_rating(&rating).await?;
        tracing::info!(%product_id, star, "rating added");
        Ok(rating)
    }
}
