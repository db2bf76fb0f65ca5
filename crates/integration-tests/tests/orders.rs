//! Cart and order lifecycle through the HTTP API.

use axum::http::StatusCode;
use serde_json::{Value, json};

use vintage_shop_integration_tests::{Caller, TestApp};

fn lines(product: &str, quantity: i64, total: &str) -> Value {
    json!({
        "products": [{ "product": product, "quantity": quantity }],
        "totalAmount": total,
    })
}

// =============================================================================
// Cart
// =============================================================================

#[tokio::test]
async fn test_adding_same_product_twice_merges_into_one_line() {
    let app = TestApp::new();
    let p1 = app.create_product("Shirt", "10.00", &["Shirts"]).await;
    let customer = Caller::customer();

    let first = app.post("/api/orders", customer, lines(&p1, 2, "20.00")).await;
    assert_eq!(first.status, StatusCode::CREATED, "{:?}", first.body);
    let second = app.post("/api/orders", customer, lines(&p1, 1, "10.00")).await;
    assert_eq!(second.status, StatusCode::CREATED);

    let order = &second.body;
    assert_eq!(order["id"], first.body["id"]);
    assert_eq!(order["status"], "pending");
    assert_eq!(order["totalAmount"], "30.00");
    let products = order["products"].as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["quantity"], 3);
    assert_eq!(products[0]["product"]["name"], "Shirt");

    let active = app.get("/api/orders", customer).await;
    assert_eq!(active.status, StatusCode::OK);
    assert_eq!(active.body.as_array().unwrap().len(), 1);

    let count = app.get("/api/orders/count", customer).await;
    assert_eq!(count.body["count"], 3);
}

#[tokio::test]
async fn test_new_product_appends_a_line() {
    let app = TestApp::new();
    let p1 = app.create_product("Shirt", "10.00", &["Shirts"]).await;
    let p2 = app.create_product("Belt", "5.00", &["Accessories"]).await;
    let customer = Caller::customer();

    app.post("/api/orders", customer, lines(&p1, 1, "10.00")).await;
    let order = app.post("/api/orders", customer, lines(&p2, 2, "10.00")).await;

    let products = order.body["products"].as_array().unwrap();
    assert_eq!(products.len(), 2);
    assert_eq!(products[0]["productId"], p1.as_str());
    assert_eq!(products[1]["productId"], p2.as_str());
}

#[tokio::test]
async fn test_customers_have_separate_carts() {
    let app = TestApp::new();
    let p1 = app.create_product("Shirt", "10.00", &["Shirts"]).await;
    let (alice, bob) = (Caller::customer(), Caller::customer());

    app.post("/api/orders", alice, lines(&p1, 1, "10.00")).await;
    let bobs = app.post("/api/orders", bob, lines(&p1, 4, "40.00")).await;

    assert_eq!(bobs.body["products"][0]["quantity"], 4);
    assert_eq!(app.get("/api/orders/count", alice).await.body["count"], 1);
    assert!(app.get("/api/orders", Caller::customer()).await.body.as_array().unwrap().is_empty());
    assert_eq!(app.get("/api/orders/count", Caller::customer()).await.body["count"], 0);
}

#[tokio::test]
async fn test_invalid_cart_requests_are_rejected() {
    let app = TestApp::new();
    let p1 = app.create_product("Shirt", "10.00", &["Shirts"]).await;
    let customer = Caller::customer();

    for body in [
        lines(&p1, 0, "0.00"),
        lines(&p1, -2, "0.00"),
        lines(&p1, 1, "-5.00"),
        json!({ "products": [], "totalAmount": "0" }),
    ] {
        let response = app.post("/api/orders", customer, body).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{:?}", response.body);
        assert!(response.body["message"].is_string());
    }

    let malformed = app
        .post("/api/orders", customer, json!({ "products": "nope" }))
        .await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_set_quantity_and_remove_line_reprice() {
    let app = TestApp::new();
    let p1 = app.create_product("Shirt", "10.00", &["Shirts"]).await;
    let p2 = app.create_product("Belt", "5.00", &["Accessories"]).await;
    let customer = Caller::customer();
    app.post("/api/orders", customer, lines(&p1, 2, "20.00")).await;
    app.post("/api/orders", customer, lines(&p2, 1, "5.00")).await;

    let updated = app
        .patch(
            "/api/orders",
            customer,
            json!({ "productId": p1, "quantity": 4 }),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK, "{:?}", updated.body);
    assert_eq!(updated.body["totalAmount"], "45.00");

    let removed = app.delete(&format!("/api/orders/{p1}"), customer).await;
    assert_eq!(removed.status, StatusCode::OK);
    assert_eq!(removed.body["products"].as_array().unwrap().len(), 1);
    assert_eq!(removed.body["totalAmount"], "5.00");

    let missing = app
        .patch(
            "/api/orders",
            customer,
            json!({ "productId": p1, "quantity": 1 }),
        )
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_edits_without_a_cart_are_not_found() {
    let app = TestApp::new();
    let p1 = app.create_product("Shirt", "10.00", &["Shirts"]).await;
    let customer = Caller::customer();

    let patch = app
        .patch(
            "/api/orders",
            customer,
            json!({ "productId": p1, "quantity": 1 }),
        )
        .await;
    assert_eq!(patch.status, StatusCode::NOT_FOUND);

    let delete = app.delete(&format!("/api/orders/{p1}"), customer).await;
    assert_eq!(delete.status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Lifecycle
// =============================================================================

async fn placed_order(app: &TestApp, customer: Caller) -> String {
    let p1 = app.create_product("Coat", "80.00", &["Coats"]).await;
    let order = app.post("/api/orders", customer, lines(&p1, 1, "80.00")).await;
    order.body["id"].as_str().unwrap().to_owned()
}

#[tokio::test]
async fn test_shipping_twice_records_one_shipment() {
    let app = TestApp::new();
    let admin = Caller::admin();
    let id = placed_order(&app, Caller::customer()).await;

    for _ in 0..2 {
        let shipped = app
            .patch(
                &format!("/api/orders/{id}"),
                admin,
                json!({ "status": "shipped", "trackingNumber": "TRK-9" }),
            )
            .await;
        assert_eq!(shipped.status, StatusCode::OK, "{:?}", shipped.body);
        assert_eq!(shipped.body["status"], "shipped");
    }

    let records = app.get("/api/shipped-orders", admin).await;
    let records = records.body.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["trackingNumber"], "TRK-9");
    assert_eq!(records[0]["originalOrder"]["id"], id.as_str());
}

#[tokio::test]
async fn test_unknown_status_is_rejected() {
    let app = TestApp::new();
    let id = placed_order(&app, Caller::customer()).await;

    let response = app
        .patch(
            &format!("/api/orders/{id}"),
            Caller::admin(),
            json!({ "status": "refunded" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cancel_records_reason_and_allows_recancel() {
    let app = TestApp::new();
    let admin = Caller::admin();
    let id = placed_order(&app, Caller::customer()).await;

    let cancelled = app
        .post(
            &format!("/api/orders/{id}/cancel"),
            admin,
            json!({ "reason": "out of stock" }),
        )
        .await;
    assert_eq!(cancelled.status, StatusCode::OK, "{:?}", cancelled.body);
    assert_eq!(cancelled.body["order"]["status"], "cancelled");
    assert_eq!(cancelled.body["cancelledOrder"]["reason"], "out of stock");

    // No body at all falls back to the default reason.
    let again = app
        .send(
            axum::http::Method::POST,
            &format!("/api/orders/{id}/cancel"),
            admin,
            None,
        )
        .await;
    assert_eq!(again.status, StatusCode::OK);
    assert_eq!(again.body["cancelledOrder"]["reason"], "No reason provided");

    let records = app.get("/api/orders/cancelled", admin).await;
    assert_eq!(records.body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_cancel_is_refused_once_shipped_or_delivered() {
    let app = TestApp::new();
    let admin = Caller::admin();
    let id = placed_order(&app, Caller::customer()).await;

    for status in ["shipped", "delivered"] {
        app.patch(&format!("/api/orders/{id}"), admin, json!({ "status": status }))
            .await;
        let response = app
            .post(&format!("/api/orders/{id}/cancel"), admin, json!({}))
            .await;
        assert_eq!(response.status, StatusCode::CONFLICT, "{status}");
    }
}

#[tokio::test]
async fn test_processing_order_can_be_cancelled() {
    let app = TestApp::new();
    let admin = Caller::admin();
    let id = placed_order(&app, Caller::customer()).await;
    app.patch(&format!("/api/orders/{id}"), admin, json!({ "status": "processing" }))
        .await;

    let response = app
        .post(&format!("/api/orders/{id}/cancel"), admin, json!({}))
        .await;

    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_delete_order_keeps_cancellation_record() {
    let app = TestApp::new();
    let admin = Caller::admin();
    let id = placed_order(&app, Caller::customer()).await;
    app.post(&format!("/api/orders/{id}/cancel"), admin, json!({}))
        .await;

    let deleted = app
        .delete(&format!("/api/orders/delete-order/{id}"), admin)
        .await;
    assert_eq!(deleted.status, StatusCode::OK);

    let records = app.get("/api/orders/cancelled", admin).await;
    let records = records.body.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["originalOrderId"], id.as_str());
    assert!(records[0]["originalOrder"].is_null());

    let again = app
        .delete(&format!("/api/orders/delete-order/{id}"), admin)
        .await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_customer_reads_only_own_orders() {
    let app = TestApp::new();
    let owner = Caller::customer();
    let id = placed_order(&app, owner).await;

    let own = app.get(&format!("/api/orders/{id}"), owner).await;
    assert_eq!(own.status, StatusCode::OK);

    let other = app.get(&format!("/api/orders/{id}"), Caller::customer()).await;
    assert_eq!(other.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_listing_filters_by_status() {
    let app = TestApp::new();
    let admin = Caller::admin();
    let first = placed_order(&app, Caller::customer()).await;
    placed_order(&app, Caller::customer()).await;
    app.patch(&format!("/api/orders/{first}"), admin, json!({ "status": "processing" }))
        .await;

    let all = app.get("/api/orders/all", admin).await;
    assert_eq!(all.body.as_array().unwrap().len(), 2);

    let processing = app.get("/api/orders/all?status=processing", admin).await;
    let processing = processing.body.as_array().unwrap();
    assert_eq!(processing.len(), 1);
    assert_eq!(processing[0]["id"], first.as_str());

    let bogus = app.get("/api/orders/all?status=lost", admin).await;
    assert_eq!(bogus.status, StatusCode::BAD_REQUEST);

    let detail = app.get(&format!("/api/admin/orders/{first}"), admin).await;
    assert_eq!(detail.status, StatusCode::OK);
    assert_eq!(detail.body["status"], "processing");
}
