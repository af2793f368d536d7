//! Shared fixture for unit tests.

use std::sync::Arc;

use chrono::Utc;
use common::{AddressId, Money, ProductId};
use domain::{Address, PaymentMethod, Product, User};
use store::{InMemoryStore, SeedStore};

use crate::Checkout;
use crate::ordering::{CommitRequest, LineRequest};
use crate::services::{InMemoryMailer, InMemoryPaymentGateway};
use crate::settings::CheckoutSettings;

pub struct Fixture {
    pub store: InMemoryStore,
    pub gateway: InMemoryPaymentGateway,
    pub mailer: InMemoryMailer,
    pub checkout: Checkout<InMemoryStore>,
    pub user: User,
    pub address: Address,
    /// Price 100, list price 120, stock 10.
    pub kettle: Product,
    /// Price 50, list price 50, stock 4.
    pub toaster: Product,
}

impl Fixture {
    pub async fn new() -> Self {
        Self::with_settings(CheckoutSettings::default()).await
    }

    pub async fn with_settings(settings: CheckoutSettings) -> Self {
        let store = InMemoryStore::new();
        let gateway = InMemoryPaymentGateway::new("test_key", "test_secret");
        let mailer = InMemoryMailer::new();
        let checkout = Checkout::new(
            store.clone(),
            Arc::new(gateway.clone()),
            Arc::new(mailer.clone()),
            settings,
        );

        let user = User::new("asha", "asha@example.com").with_phone("9999999999");
        let address = Address {
            id: AddressId::new(),
            user_id: user.id,
            full_name: "Asha Rao".to_string(),
            phone: "9999999999".to_string(),
            alternate_phone: None,
            state: "Karnataka".to_string(),
            city: "Bengaluru".to_string(),
            address: "12 MG Road".to_string(),
            pincode: "560001".to_string(),
            address_type: "Home".to_string(),
            created_at: Utc::now(),
        };
        let kettle = Product::new("Kettle", Money::from_major(100), Money::from_major(120), 10);
        let toaster = Product::new("Toaster", Money::from_major(50), Money::from_major(50), 4);

        store.insert_user(&user).await.unwrap();
        store.insert_address(&address).await.unwrap();
        store.upsert_product(&kettle).await.unwrap();
        store.upsert_product(&toaster).await.unwrap();

        Self {
            store,
            gateway,
            mailer,
            checkout,
            user,
            address,
            kettle,
            toaster,
        }
    }

    pub async fn add_product(
        &self,
        name: &str,
        price: i64,
        list_price: i64,
        stock: u32,
        active: bool,
    ) -> Product {
        let mut product = Product::new(
            name,
            Money::from_major(price),
            Money::from_major(list_price),
            stock,
        );
        product.is_active = active;
        self.store.upsert_product(&product).await.unwrap();
        product
    }

    /// Flips the active flag of the kettle or toaster, keeping current stock.
    pub async fn set_active(&self, product_id: ProductId, active: bool) {
        let mut product = [&self.kettle, &self.toaster]
            .into_iter()
            .find(|p| p.id == product_id)
            .cloned()
            .expect("fixture product");
        product.stock = self.store.stock_of(product_id).await.unwrap();
        product.is_active = active;
        self.store.upsert_product(&product).await.unwrap();
    }

    /// Puts one kettle in the user's cart.
    pub async fn fill_cart(&self) {
        self.checkout
            .cart
            .add_line(self.user.id, &self.kettle.id.to_string())
            .await
            .unwrap();
    }

    /// A commit of `kettles` kettles to the fixture address.
    pub fn commit_request(&self, method: PaymentMethod, kettles: u32) -> CommitRequest {
        CommitRequest {
            user_id: self.user.id,
            lines: vec![LineRequest::new(self.kettle.id, kettles)],
            address_id: self.address.id.to_string(),
            method,
            idempotency_key: None,
            location: None,
        }
    }
}
