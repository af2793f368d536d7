//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use checkout::{CheckoutSettings, InMemoryMailer, InMemoryPaymentGateway};
use common::{AddressId, Money};
use domain::{Address, Product, User};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use store::{InMemoryStore, SeedStore};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

struct TestApp {
    app: axum::Router,
    store: InMemoryStore,
    gateway: InMemoryPaymentGateway,
    mailer: InMemoryMailer,
    user: User,
    address: Address,
    /// Price 100, list price 120, stock 5.
    product: Product,
}

async fn setup() -> TestApp {
    let store = InMemoryStore::new();
    let gateway = InMemoryPaymentGateway::new("api_key", "api_secret");
    let mailer = InMemoryMailer::new();
    let state = api::create_state(
        store.clone(),
        Arc::new(gateway.clone()),
        Arc::new(mailer.clone()),
        CheckoutSettings::default(),
    );
    let app = api::create_app(state, get_metrics_handle());

    let user = User::new("kiran", "kiran@example.com").with_phone("9876543210");
    let address = Address {
        id: AddressId::new(),
        user_id: user.id,
        full_name: "Kiran".to_string(),
        phone: "9876543210".to_string(),
        alternate_phone: None,
        state: "Goa".to_string(),
        city: "Panaji".to_string(),
        address: "7 River Lane".to_string(),
        pincode: "403001".to_string(),
        address_type: "Work".to_string(),
        created_at: Utc::now(),
    };
    let product = Product::new("Teapot", Money::from_major(100), Money::from_major(120), 5);

    store.insert_user(&user).await.unwrap();
    store.insert_address(&address).await.unwrap();
    store.upsert_product(&product).await.unwrap();

    TestApp {
        app,
        store,
        gateway,
        mailer,
        user,
        address,
        product,
    }
}

enum As<'a> {
    Anonymous,
    User(&'a User),
    Admin,
}

async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    who: As<'_>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    send_with(app, method, uri, who, body, &[]).await
}

async fn send_with(
    app: &axum::Router,
    method: &str,
    uri: &str,
    who: As<'_>,
    body: Option<Value>,
    headers: &[(&str, &str)],
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    match who {
        As::Anonymous => {}
        As::User(user) => {
            builder = builder
                .header("x-user-id", user.id.to_string())
                .header("x-user-role", "user");
        }
        As::Admin => {
            builder = builder
                .header("x-user-id", common::UserId::new().to_string())
                .header("x-user-role", "admin");
        }
    }
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

#[tokio::test]
async fn test_health_check() {
    let t = setup().await;
    let (status, json) = send(&t.app, "GET", "/health", As::Anonymous, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let t = setup().await;
    let response = t
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()["content-type"].to_str().unwrap();
    assert!(content_type.starts_with("text/plain"));
}

#[tokio::test]
async fn test_product_endpoints() {
    let t = setup().await;

    let (status, json) = send(&t.app, "GET", "/products", As::Anonymous, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"][0]["name"], "Teapot");
    assert_eq!(json["data"][0]["price"], 10000);

    let uri = format!("/products/{}", t.product.id);
    let (status, json) = send(&t.app, "GET", &uri, As::Anonymous, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["totalReviews"], 0);

    let (status, json) = send(&t.app, "GET", "/products/not-an-id", As::Anonymous, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
    assert_eq!(json["statusCode"], 400);
}

#[tokio::test]
async fn test_identity_is_required() {
    let t = setup().await;

    let (status, json) = send(&t.app, "GET", "/cart", As::Anonymous, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["success"], false);

    let (status, _) = send(&t.app, "GET", "/admin/orders", As::User(&t.user), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, json) = send(&t.app, "GET", "/admin/orders", As::Admin, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"], json!([]));
}

#[tokio::test]
async fn test_cart_endpoints() {
    let t = setup().await;
    let body = json!({ "productId": t.product.id.to_string() });

    let (status, json) = send(&t.app, "POST", "/cart", As::User(&t.user), Some(body.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["cartSize"], 1);
    send(&t.app, "POST", "/cart", As::User(&t.user), Some(body)).await;

    let (_, json) = send(&t.app, "GET", "/cart", As::User(&t.user), None).await;
    assert_eq!(json["data"]["lines"][0]["quantity"], 2);
    assert_eq!(json["data"]["paymentAmount"], 20000);
    assert_eq!(json["data"]["discountAmount"], 4000);

    let uri = format!("/cart/{}", t.product.id);
    let (status, _) = send(&t.app, "PATCH", &uri, As::User(&t.user), Some(json!({ "quantity": 3 }))).await;
    assert_eq!(status, StatusCode::OK);

    let (_, json) = send(&t.app, "GET", "/cart/ids", As::User(&t.user), None).await;
    assert_eq!(json["data"], json!([t.product.id.to_string()]));

    let (status, _) = send(&t.app, "DELETE", &uri, As::User(&t.user), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, json) = send(&t.app, "DELETE", &uri, As::User(&t.user), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Cart line is not found");
}

#[tokio::test]
async fn test_quote_endpoint() {
    let t = setup().await;
    let lines = json!([{ "productId": t.product.id.to_string(), "quantity": 2 }]);

    let (status, json) = send(&t.app, "POST", "/orders/quote", As::User(&t.user), Some(lines)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["totalAmount"], 24000);
    assert_eq!(json["data"]["discountAmount"], 4000);
    assert_eq!(json["data"]["paymentAmount"], 20000);
    assert!(json["data"]["deliveryDate"].is_string());

    let too_many = json!([{ "productId": t.product.id.to_string(), "quantity": 6 }]);
    let (status, json) = send(&t.app, "POST", "/orders/quote", As::User(&t.user), Some(too_many)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["message"].as_str().unwrap().contains("Teapot"));
}

#[tokio::test]
async fn test_online_checkout_flow() {
    let t = setup().await;
    let body = json!({
        "lines": [{ "productId": t.product.id.to_string(), "quantity": 1 }],
        "addressId": t.address.id.to_string(),
        "cash": false,
        "latitude": 15.49,
        "longitude": 73.82
    });

    let (status, json) = send(&t.app, "POST", "/orders", As::User(&t.user), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    let data = &json["data"];
    assert_eq!(data["amount"], 10000);
    assert_eq!(data["gatewayKey"], "api_key");
    assert_eq!(data["prefill"]["email"], "kiran@example.com");
    let intent = data["orderIntentId"].as_str().unwrap().to_string();
    let order_id = data["orderId"].as_str().unwrap().to_string();

    let bad = json!({
        "gatewayOrderId": intent,
        "gatewayPaymentId": "pay_1",
        "signature": "00ff"
    });
    let (status, json) = send(&t.app, "POST", "/payments/verify", As::Anonymous, Some(bad)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "payment verification failed");

    let good = json!({
        "gatewayOrderId": intent,
        "gatewayPaymentId": "pay_1",
        "signature": t.gateway.sign(&intent, "pay_1")
    });
    let (status, json) = send(&t.app, "POST", "/payments/verify", As::Anonymous, Some(good)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);

    let (status, json) = send(
        &t.app,
        "POST",
        "/admin/orders/status",
        As::Admin,
        Some(json!({ "orderId": order_id, "status": "SHIPPED" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["emailDelivered"], true);
    assert_eq!(json["message"], "Order status updated to SHIPPED");

    let uri = format!("/orders/{order_id}");
    let (status, json) = send(&t.app, "GET", &uri, As::User(&t.user), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["order"]["status"], "SHIPPED");
    assert_eq!(json["data"]["order"]["paymentStatus"], "PAID");
    assert_eq!(json["data"]["items"][0]["available"], true);

    let (_, json) = send(&t.app, "GET", "/notifications", As::User(&t.user), None).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);
    assert_eq!(t.mailer.sent_count(), 2);

    let (_, json) = send(&t.app, "GET", "/admin/orders", As::Admin, None).await;
    assert_eq!(json["data"][0]["customer"]["username"], "kiran");
}

#[tokio::test]
async fn test_idempotent_cash_commit() {
    let t = setup().await;
    let body = json!({
        "lines": [{ "productId": t.product.id.to_string(), "quantity": 2 }],
        "addressId": t.address.id.to_string(),
        "cash": true
    });
    let headers = [("idempotency-key", "checkout-42")];

    let (status, first) = send_with(&t.app, "POST", "/orders", As::User(&t.user), Some(body.clone()), &headers).await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, second) = send_with(&t.app, "POST", "/orders", As::User(&t.user), Some(body), &headers).await;

    assert_eq!(first["data"]["orderId"], second["data"]["orderId"]);
    assert_eq!(t.store.order_count().await, 1);
    assert_eq!(t.store.stock_of(t.product.id).await, Some(3));
}

#[tokio::test]
async fn test_cancel_and_rate() {
    let t = setup().await;
    let body = json!({
        "lines": [{ "productId": t.product.id.to_string(), "quantity": 1 }],
        "addressId": t.address.id.to_string(),
        "cash": true
    });
    let (_, json) = send(&t.app, "POST", "/orders", As::User(&t.user), Some(body.clone())).await;
    let first = json["data"]["orderId"].as_str().unwrap().to_string();

    let uri = format!("/orders/{first}/cancel");
    let (status, json) = send(&t.app, "POST", &uri, As::User(&t.user), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Order cancelled successfully");
    let (status, _) = send(&t.app, "POST", &uri, As::User(&t.user), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let rating = json!({ "productId": t.product.id.to_string(), "star": 5 });
    let (status, _) = send(&t.app, "POST", "/ratings", As::User(&t.user), Some(rating.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, json) = send(&t.app, "POST", "/orders", As::User(&t.user), Some(body)).await;
    let second = json["data"]["orderId"].as_str().unwrap().to_string();
    send(
        &t.app,
        "POST",
        "/admin/orders/status",
        As::Admin,
        Some(json!({ "orderId": second, "status": "DELIVERED" })),
    )
    .await;

    let (status, json) = send(&t.app, "POST", "/ratings", As::User(&t.user), Some(rating)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["star"], 5);
}

#[tokio::test]
async fn test_malformed_body_uses_envelope() {
    let t = setup().await;
    let (status, json) = send(
        &t.app,
        "POST",
        "/admin/orders/status",
        As::Admin,
        Some(json!({ "orderId": 7 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
}
