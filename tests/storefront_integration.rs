//! Integration tests for the storefront REST API
//!
//! These tests drive the full router against the demo catalog:
//! - Cart lifecycle, merging and quantity updates
//! - Bundle composition and its refusals
//! - Gift eligibility, choice refusal and the random reveal
//! - Checkout, receipts, the submission rate limit and backend failures

use axum::body::Body;
use axum::http::{Request, StatusCode};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt; // for `oneshot`

use storefront_engine::cart::{AppState, MemoryCartStore};
use storefront_engine::config::AppConfig;
use storefront_engine::data::{Collection, MemoryDataService};
use storefront_engine::demo::seed_catalog;
use storefront_engine::router::create_app_router;

/// Helper function to create a test app instance over the demo catalog
fn create_test_app() -> (axum::Router, Arc<MemoryDataService>) {
    let data = Arc::new(MemoryDataService::new());
    seed_catalog(&data);

    let mut config = AppConfig::default();
    config.retry.max_retries = 0;

    let state = Arc::new(AppState::new(
        config,
        data.clone(),
        Arc::new(MemoryCartStore::new()),
    ));
    (create_app_router(state), data)
}

/// Helper function to send a JSON request and get the response
async fn send(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(json!({}));

    (status, body)
}

fn dec(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().unwrap(),
        other => other.to_string().parse().unwrap(),
    }
}

async fn new_cart(app: &axum::Router) -> String {
    let (status, body) = send(app, "POST", "/carts", None).await;
    assert_eq!(status, StatusCode::CREATED);
    body["cartId"].as_str().unwrap().to_string()
}

async fn add(app: &axum::Router, cart_id: &str, item: Value) -> (StatusCode, Value) {
    send(app, "POST", &format!("/carts/{cart_id}/items"), Some(item)).await
}

async fn add_perfume_trio(app: &axum::Router, cart_id: &str) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        &format!("/carts/{cart_id}/bundles"),
        Some(json!({ "offerId": "offer-perfume-trio", "productIds": ["p-oud", "p-musk", "p-rose"] })),
    )
    .await
}

fn customer() -> Value {
    json!({
        "name": "نورة",
        "phone": "050 123 4567",
        "city": "الرياض",
        "address": "حي النرجس"
    })
}

#[tokio::test]
async fn test_health() {
    let (app, data) = create_test_app();
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    data.set_offline(true);
    let (status, _) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_create_cart() {
    let (app, _) = create_test_app();

    let generated = new_cart(&app).await;
    assert_eq!(generated.len(), 32);

    let (status, body) = send(&app, "POST", "/carts", Some(json!({ "cartId": "tab-1" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["cartId"], "tab-1");

    let (status, _) = send(&app, "POST", "/carts", Some(json!({ "cartId": "../x" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, "GET", "/carts/tab-1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"], json!([]));
    assert_eq!(dec(&body["total"]), Decimal::ZERO);
}

#[tokio::test]
async fn test_add_item_merges_and_applies_discount() {
    let (app, _) = create_test_app();
    let cart_id = new_cart(&app).await;

    let (status, _) = add(&app, &cart_id, json!({ "productId": "p-musk" })).await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, body) = add(&app, &cart_id, json!({ "productId": "p-musk", "quantity": 2 })).await;

    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1, "same product and options must merge");
    assert_eq!(items[0]["quantity"], 3);
    assert_eq!(dec(&items[0]["unitPrice"]), Decimal::new(855, 1));
    assert_eq!(dec(&body["total"]), Decimal::new(2565, 1));
    assert_eq!(body["itemCount"], 3);

    let (status, _) = add(&app, &cart_id, json!({ "productId": "p-missing" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_product_options_are_checked() {
    let (app, _) = create_test_app();
    let cart_id = new_cart(&app).await;

    let (status, _) = add(&app, &cart_id, json!({ "productId": "p-abaya" })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = add(
        &app,
        &cart_id,
        json!({ "productId": "p-abaya", "selectedOptions": { "size": "60", "color": "أسود" } }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let abaya = |size: &str| {
        json!({ "productId": "p-abaya", "selectedOptions": { "size": size, "color": "أسود" } })
    };
    add(&app, &cart_id, abaya("54")).await;
    let (status, body) = add(&app, &cart_id, abaya("56")).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["items"].as_array().unwrap().len(), 2, "different sizes stay apart");
    assert_eq!(dec(&body["total"]), Decimal::from(400));
}

#[tokio::test]
async fn test_update_and_remove_lines() {
    let (app, _) = create_test_app();
    let cart_id = new_cart(&app).await;

    let (_, body) = add(&app, &cart_id, json!({ "productId": "p-oud" })).await;
    let line_id = body["items"][0]["id"].as_str().unwrap().to_string();
    let uri = format!("/carts/{cart_id}/items/{line_id}");

    let (status, body) = send(&app, "PATCH", &uri, Some(json!({ "quantity": 4 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dec(&body["total"]), Decimal::from(720));

    let (status, body) = send(&app, "PATCH", &uri, Some(json!({ "quantity": 0 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"], json!([]));

    let (status, _) = send(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    add(&app, &cart_id, json!({ "productId": "p-amber" })).await;
    let (status, body) = send(&app, "DELETE", &format!("/carts/{cart_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["itemCount"], 0);
}

#[tokio::test]
async fn test_bundles() {
    let (app, _) = create_test_app();
    let cart_id = new_cart(&app).await;
    let uri = format!("/carts/{cart_id}/bundles");

    let (status, _) = send(
        &app,
        "POST",
        &uri,
        Some(json!({ "offerId": "offer-perfume-trio", "productIds": ["p-oud", "p-musk"] })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "incomplete selection");

    let (status, _) = send(
        &app,
        "POST",
        &uri,
        Some(json!({ "offerId": "offer-perfume-trio", "productIds": ["p-oud", "p-mug", "p-rose"] })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "product outside the pool");

    let (status, _) = send(
        &app,
        "POST",
        &uri,
        Some(json!({ "offerId": "offer-perfume-trio", "productIds": ["p-oud", "p-oud", "p-rose"] })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "duplicate product");

    let (status, body) = send(
        &app,
        "POST",
        &uri,
        Some(json!({
            "offerId": "offer-perfume-trio",
            "productIds": ["p-oud", "p-musk", "p-amber", "p-rose"]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "over the ceiling");
    assert!(body["error"].as_str().unwrap().contains('3'));

    let (status, _) = send(
        &app,
        "POST",
        &uri,
        Some(json!({ "offerId": "offer-missing", "productIds": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = add_perfume_trio(&app, &cart_id).await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, body) = add_perfume_trio(&app, &cart_id).await;

    let offers = body["specialOffers"].as_array().unwrap();
    assert_eq!(offers.len(), 2, "bundle lines never merge");
    assert_eq!(offers[0]["isBundle"], true);
    assert_eq!(offers[0]["bundleDetails"]["products"].as_array().unwrap().len(), 3);
    assert_ne!(offers[0]["id"], offers[1]["id"]);
    assert_eq!(body["regularItems"], json!([]));
    assert_eq!(dec(&body["total"]), Decimal::from(598));
}

#[tokio::test]
async fn test_gift_threshold_and_reveal() {
    let (app, _) = create_test_app();
    let cart_id = new_cart(&app).await;
    let gift_uri = format!("/carts/{cart_id}/gift");
    let reveal_uri = format!("/carts/{cart_id}/gift/reveal");

    add(&app, &cart_id, json!({ "productId": "p-keychain", "quantity": 4 })).await;
    let (status, body) = send(&app, "GET", &gift_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["eligible"], false);
    assert_eq!(dec(&body["progressPercent"]), Decimal::from(50));
    assert_eq!(dec(&body["remaining"]), Decimal::from(100));

    let (status, _) = send(&app, "POST", &reveal_uri, None).await;
    assert_eq!(status, StatusCode::CONFLICT, "below the threshold");

    add_perfume_trio(&app, &cart_id).await;
    let (status, first) = send(&app, "POST", &reveal_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["interim"].as_array().unwrap().len(), 12);
    let pick = first["finalPick"]["candidate"]["id"].as_str().unwrap().to_string();
    assert!(pick == "p-keychain" || pick == "p-mug");

    let (_, second) = send(&app, "POST", &reveal_uri, None).await;
    assert_eq!(second["finalPick"]["candidate"]["id"], pick.as_str(), "draw is not repeated");

    let (_, body) = send(&app, "GET", &gift_uri, None).await;
    assert_eq!(body["eligible"], true);
    assert_eq!(body["selected"]["candidate"]["id"], pick.as_str());

    let (status, _) = send(&app, "POST", &gift_uri, Some(json!({ "candidateId": "p-mug" }))).await;
    assert_eq!(status, StatusCode::CONFLICT, "random promotion refuses a choice");
}

#[tokio::test]
async fn test_checkout_places_order_and_keeps_receipt() {
    let (app, data) = create_test_app();
    let cart_id = new_cart(&app).await;
    let checkout_uri = format!("/carts/{cart_id}/checkout");

    let (status, _) = send(&app, "POST", &checkout_uri, Some(customer())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "empty cart");

    add_perfume_trio(&app, &cart_id).await;
    send(&app, "POST", &format!("/carts/{cart_id}/gift/reveal"), None).await;

    let mut bad = customer();
    bad["phone"] = json!("123");
    let (status, body) = send(&app, "POST", &checkout_uri, Some(bad)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("رقم الجوال"));

    let (status, receipt) = send(&app, "POST", &checkout_uri, Some(customer())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(dec(&receipt["total"]), Decimal::from(299));
    assert!(receipt["gift"].is_string());

    let orders = data.snapshot(Collection::Orders);
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["customer_phone"], "0501234567");
    assert_eq!(orders[0]["status"], "pending");
    assert_eq!(orders[0]["items"][0]["is_bundle"], true);
    assert!(orders[0]["gift"].is_object());
    assert_eq!(receipt["orderId"], orders[0]["id"]);
    assert_eq!(data.snapshot(Collection::OrderRateLimits).len(), 1);

    let (_, cart) = send(&app, "GET", &format!("/carts/{cart_id}"), None).await;
    assert_eq!(cart["items"], json!([]));

    let (status, stored) = send(&app, "GET", &format!("/carts/{cart_id}/receipt"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stored["receiptId"], receipt["receiptId"]);
}

#[tokio::test]
async fn test_gift_dropped_when_cart_falls_below_threshold() {
    let (app, data) = create_test_app();
    let cart_id = new_cart(&app).await;

    let (_, body) = add(&app, &cart_id, json!({ "productId": "p-oud", "quantity": 2 })).await;
    let line_id = body["items"][0]["id"].as_str().unwrap().to_string();
    send(&app, "POST", &format!("/carts/{cart_id}/gift/reveal"), None).await;
    send(
        &app,
        "PATCH",
        &format!("/carts/{cart_id}/items/{line_id}"),
        Some(json!({ "quantity": 1 })),
    )
    .await;

    let (status, receipt) = send(&app, "POST", &format!("/carts/{cart_id}/checkout"), Some(customer())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(receipt.get("gift").is_none());
    assert!(data.snapshot(Collection::Orders)[0].get("gift").is_none());
}

#[tokio::test]
async fn test_rate_limit_refuses_sixth_order() {
    let (app, _) = create_test_app();
    let cart_id = new_cart(&app).await;
    let checkout_uri = format!("/carts/{cart_id}/checkout");

    for _ in 0..5 {
        add(&app, &cart_id, json!({ "productId": "p-mug" })).await;
        let (status, _) = send(&app, "POST", &checkout_uri, Some(customer())).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    add(&app, &cart_id, json!({ "productId": "p-mug" })).await;
    let (status, body) = send(&app, "POST", &checkout_uri, Some(customer())).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert!(body["error"].as_str().unwrap().contains("30"));

    let (_, cart) = send(&app, "GET", &format!("/carts/{cart_id}"), None).await;
    assert_eq!(cart["itemCount"], 1, "refused order keeps the cart");

    let (status, decision) = send(&app, "GET", "/rate-limit/0501234567", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decision["allowed"], false);
    assert_eq!(decision["remaining"], 0);
    assert_eq!(decision["retryAfterMinutes"], 30);

    let (_, other) = send(&app, "GET", "/rate-limit/0559876543", None).await;
    assert_eq!(other["allowed"], true);
    assert_eq!(other["remaining"], 5);
}

#[tokio::test]
async fn test_backend_failure_keeps_cart() {
    let (app, data) = create_test_app();
    let cart_id = new_cart(&app).await;
    add(&app, &cart_id, json!({ "productId": "p-amber" })).await;

    data.set_offline(true);
    let (status, body) = send(&app, "POST", &format!("/carts/{cart_id}/checkout"), Some(customer())).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("لم يتم حذف"));
    data.set_offline(false);

    let (_, cart) = send(&app, "GET", &format!("/carts/{cart_id}"), None).await;
    assert_eq!(cart["itemCount"], 1);
    assert!(data.snapshot(Collection::Orders).is_empty());
}
