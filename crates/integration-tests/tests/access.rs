//! Identity checks, admin endpoints and health probes.

use axum::http::{Method, StatusCode};
use serde_json::json;

use vintage_shop_integration_tests::{Caller, TestApp};

#[tokio::test]
async fn test_customer_routes_require_identity() {
    let app = TestApp::new();

    for (method, uri) in [
        (Method::GET, "/api/orders"),
        (Method::GET, "/api/orders/count"),
        (Method::POST, "/api/orders"),
    ] {
        let response = app.send(method, uri, Caller::Anonymous, None).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{uri}");
        assert!(response.body["message"].is_string());
    }
}

#[tokio::test]
async fn test_admin_routes_reject_customers() {
    let app = TestApp::new();

    for uri in [
        "/api/orders/all",
        "/api/orders/cancelled",
        "/api/shipped-orders",
        "/api/admin/verify",
        "/api/admin/dashboard-stats",
    ] {
        let anonymous = app.get(uri, Caller::Anonymous).await;
        assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED, "{uri}");

        let customer = app.get(uri, Caller::customer()).await;
        assert_eq!(customer.status, StatusCode::FORBIDDEN, "{uri}");
    }
}

#[tokio::test]
async fn test_malformed_user_id_is_unauthorized() {
    let app = TestApp::new();
    let request = axum::http::Request::builder()
        .uri("/api/orders/count")
        .header("x-user-id", "12345")
        .body(axum::body::Body::empty())
        .unwrap();

    let response = tower::ServiceExt::oneshot(
        vintage_shop_storefront::app(app.state.clone()),
        request,
    )
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_verify() {
    let app = TestApp::new();
    let admin = Caller::admin();

    let response = app.get("/api/admin/verify", admin).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["isAdmin"], true);
    assert_eq!(response.body["user"]["role"], "admin");
}

#[tokio::test]
async fn test_dashboard_stats() {
    let app = TestApp::new();
    let admin = Caller::admin();
    let p1 = app.create_product("Shirt", "10.00", &["Shirts"]).await;
    app.create_product("Belt", "5.00", &["Accessories"]).await;
    for _ in 0..6 {
        app.post(
            "/api/orders",
            Caller::customer(),
            json!({ "products": [{ "product": p1, "quantity": 1 }], "totalAmount": "10.00" }),
        )
        .await;
    }

    let stats = app.get("/api/admin/dashboard-stats", admin).await;

    assert_eq!(stats.status, StatusCode::OK);
    assert_eq!(stats.body["totalProducts"], 2);
    assert_eq!(stats.body["totalOrders"], 6);
    assert_eq!(stats.body["recentOrders"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_unknown_order_is_not_found() {
    let app = TestApp::new();
    let missing = uuid::Uuid::new_v4();

    let response = app
        .patch(
            &format!("/api/orders/{missing}"),
            Caller::admin(),
            json!({ "status": "shipped" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["message"], "order not found");
}

#[tokio::test]
async fn test_health_probes() {
    let app = TestApp::new();

    let live = app.get("/health", Caller::Anonymous).await;
    assert_eq!(live.status, StatusCode::OK);
    assert_eq!(live.body, "ok");

    let ready = app.get("/health/ready", Caller::Anonymous).await;
    assert_eq!(ready.status, StatusCode::OK);
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = TestApp::new();
    let request = axum::http::Request::builder()
        .uri("/health")
        .header("x-request-id", "gw-1234")
        .body(axum::body::Body::empty())
        .unwrap();

    let response = tower::ServiceExt::oneshot(
        vintage_shop_storefront::app(app.state.clone()),
        request,
    )
    .await
    .unwrap();

    assert_eq!(response.headers()["x-request-id"], "gw-1234");
}
