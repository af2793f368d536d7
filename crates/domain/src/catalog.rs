//! Catalog records and the canonical product view builder.
//!
//! Every place that shows or charges a price (catalog listing, cart, order
//! line resolution) goes through [`build_views`], so price, stock and rating
//! aggregates are computed one way only.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use common::{BrandId, CategoryId, Money, ProductId, RatingId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// A product brand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Brand {
    pub id: BrandId,
    pub name: String,
    pub icon: Option<String>,
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub icon: Option<String>,
}

/// An uploaded product image asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductImage {
    pub url: String,
    pub public_id: Option<String>,
}

impl ProductImage {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            public_id: None,
        }
    }
}

/// A catalog product as stored by catalog management.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    /// Selling price per unit.
    pub price: Money,
    /// Pre-discount list price per unit.
    pub list_price: Money,
    pub stock: u32,
    pub is_active: bool,
    pub brand_id: Option<BrandId>,
    pub category_ids: Vec<CategoryId>,
    pub images: Vec<ProductImage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Creates an active product with no brand, categories or images.
    pub fn new(name: impl Into<String>, price: Money, list_price: Money, stock: u32) -> Self {
        let now = Utc::now();
        Self {
            id: ProductId::new(),
            name: name.into(),
            description: String::new(),
            price,
            list_price,
            stock,
            is_active: true,
            brand_id: None,
            category_ids: Vec::new(),
            images: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// A customer's star rating of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub id: RatingId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub star: u8,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Rating {
    /// Creates a rating, rejecting stars outside `1..=5`.
    pub fn new(
        user_id: UserId,
        product_id: ProductId,
        star: u8,
        description: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if !(1..=5).contains(&star) {
            return Err(DomainError::InvalidRating { star: star.into() });
        }
        Ok(Self {
            id: RatingId::new(),
            user_id,
            product_id,
            star,
            description,
            created_at: now,
        })
    }
}

/// Denormalized, read-only product representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Money,
    #[serde(rename = "dummyPrice")]
    pub list_price: Money,
    pub stock: u32,
    pub is_active: bool,
    pub brand: Option<Brand>,
    pub categories: Vec<Category>,
    pub images: Vec<String>,
    /// Mean star rating, 0 when unrated.
    pub rating: f64,
    pub total_reviews: u32,
}

/// Predicate over products used by every catalog read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub ids: Option<Vec<ProductId>>,
    pub active_only: bool,
    pub brand: Option<BrandId>,
    pub category: Option<CategoryId>,
}

impl ProductFilter {
    /// Matches every product.
    pub fn all() -> Self {
        Self::default()
    }

    /// Matches a single product.
    pub fn by_id(id: ProductId) -> Self {
        Self {
            ids: Some(vec![id]),
            ..Self::default()
        }
    }

    /// Matches any of the given products.
    pub fn by_ids(ids: impl IntoIterator<Item = ProductId>) -> Self {
        Self {
            ids: Some(ids.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Restricts the filter to active products.
    pub fn active(mut self) -> Self {
        self.active_only = true;
        self
    }

    pub fn with_brand(mut self, brand: BrandId) -> Self {
        self.brand = Some(brand);
        self
    }

    pub fn with_category(mut self, category: CategoryId) -> Self {
        self.category = Some(category);
        self
    }

    /// Returns true if the product satisfies the filter.
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(ref ids) = self.ids
            && !ids.contains(&product.id)
        {
            return false;
        }
        if self.active_only && !product.is_active {
            return false;
        }
        if let Some(brand) = self.brand
            && product.brand_id != Some(brand)
        {
            return false;
        }
        if let Some(category) = self.category
            && !product.category_ids.contains(&category)
        {
            return false;
        }
        true
    }
}

/// Raw catalog rows needed to build views for a set of products.
#[derive(Debug, Clone, Default)]
pub struct CatalogRecords {
    pub products: Vec<Product>,
    pub brands: Vec<Brand>,
    pub categories: Vec<Category>,
    pub ratings: Vec<Rating>,
}

/// Returns `(mean star, count)` over the given ratings; `(0.0, 0)` when empty.
pub fn rating_summary<'a>(ratings: impl IntoIterator<Item = &'a Rating>) -> (f64, u32) {
    let (sum, count) = ratings
        .into_iter()
        .fold((0u32, 0u32), |(sum, count), r| (sum + u32::from(r.star), count + 1));
    if count == 0 {
        (0.0, 0)
    } else {
        (f64::from(sum) / f64::from(count), count)
    }
}

/// Joins products with their brand, categories and ratings.
///
/// Output order follows `records.products`. References to brands or
/// categories missing from the records are dropped from the view.
pub fn build_views(records: CatalogRecords) -> Vec<ProductView> {
    let brands: HashMap<BrandId, Brand> =
        records.brands.into_iter().map(|b| (b.id, b)).collect();
    let categories: HashMap<CategoryId, Category> =
        records.categories.into_iter().map(|c| (c.id, c)).collect();
    let mut ratings: HashMap<ProductId, Vec<Rating>> = HashMap::new();
    for rating in records.ratings {
        ratings.entry(rating.product_id).or_default().push(rating);
    }

    records
        .products
        .into_iter()
        .map(|product| {
            let (rating, total_reviews) =
                rating_summary(ratings.get(&product.id).into_iter().flatten());
            ProductView {
                brand: product.brand_id.and_then(|id| brands.get(&id).cloned()),
                categories: product
                    .category_ids
                    .iter()
                    .filter_map(|id| categories.get(id).cloned())
                    .collect(),
                images: product.images.into_iter().map(|img| img.url).collect(),
                id: product.id,
                name: product.name,
                description: product.description,
                price: product.price,
                list_price: product.list_price,
                stock: product.stock,
                is_active: product.is_active,
                rating,
                total_reviews,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rating(product_id: ProductId, star: u8) -> Rating {
        Rating::new(UserId::new(), product_id, star, None, Utc::now()).unwrap()
    }

    #[test]
    fn test_rating_summary_empty_is_zero() {
        assert_eq!(rating_summary(&Vec::<Rating>::new()), (0.0, 0));
    }

    #[test]
    fn test_rating_summary_mean() {
        let id = ProductId::new();
        let ratings = [rating(id, 5), rating(id, 4), rating(id, 3)];
        assert_eq!(rating_summary(&ratings), (4.0, 3));
    }

    #[test]
    fn test_rating_rejects_out_of_range_star() {
        let result = Rating::new(UserId::new(), ProductId::new(), 6, None, Utc::now());
        assert!(matches!(result, Err(DomainError::InvalidRating { star: 6 })));
        assert!(Rating::new(UserId::new(), ProductId::new(), 0, None, Utc::now()).is_err());
    }

    #[test]
    fn test_build_views_joins_brand_categories_images_and_ratings() {
        let brand = Brand {
            id: BrandId::new(),
            name: "Chrono".to_string(),
            icon: None,
        };
        let category = Category {
            id: CategoryId::new(),
            name: "Analog".to_string(),
            icon: None,
        };
        let mut product = Product::new(
            "Field Watch",
            Money::from_minor(10_000),
            Money::from_minor(12_000),
            4,
        );
        product.brand_id = Some(brand.id);
        product.category_ids = vec![category.id, CategoryId::new()];
        product.images = vec![ProductImage::new("a.png"), ProductImage::new("b.png")];

        let views = build_views(CatalogRecords {
            ratings: vec![rating(product.id, 4), rating(product.id, 2)],
            products: vec![product.clone()],
            brands: vec![brand.clone()],
            categories: vec![category.clone()],
        });

        assert_eq!(views.len(), 1);
        let view = &views[0];
        assert_eq!(view.id, product.id);
        assert_eq!(view.brand.as_ref(), Some(&brand));
        assert_eq!(view.categories, vec![category]);
        assert_eq!(view.images, vec!["a.png", "b.png"]);
        assert_eq!(view.rating, 3.0);
        assert_eq!(view.total_reviews, 2);
        assert_eq!(view.price, Money::from_minor(10_000));
        assert_eq!(view.list_price, Money::from_minor(12_000));
    }

    #[test]
    fn test_build_views_unrated_product_has_zero_rating() {
        let product = Product::new("Plain", Money::from_minor(500), Money::from_minor(500), 1);
        let views = build_views(CatalogRecords {
            products: vec![product],
            ..CatalogRecords::default()
        });
        assert_eq!(views[0].rating, 0.0);
        assert_eq!(views[0].total_reviews, 0);
        assert!(views[0].brand.is_none());
    }

    #[test]
    fn test_filter_matches() {
        let brand = BrandId::new();
        let mut product = Product::new("A", Money::from_minor(1), Money::from_minor(1), 1);
        product.brand_id = Some(brand);

        assert!(ProductFilter::all().matches(&product));
        assert!(ProductFilter::by_id(product.id).active().matches(&product));
        assert!(!ProductFilter::by_id(ProductId::new()).matches(&product));
        assert!(ProductFilter::all().with_brand(brand).matches(&product));
        assert!(!ProductFilter::all().with_category(CategoryId::new()).matches(&product));

        product.is_active = false;
        assert!(!ProductFilter::all().active().matches(&product));
        assert!(ProductFilter::all().matches(&product));
    }

    #[test]
    fn test_view_serializes_list_price_as_dummy_price() {
        let product = Product::new("A", Money::from_minor(100), Money::from_minor(120), 1);
        let view = build_views(CatalogRecords {
            products: vec![product],
            ..CatalogRecords::default()
        })
        .remove(0);
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["dummyPrice"], 120);
        assert_eq!(json["totalReviews"], 0);
    }
}
