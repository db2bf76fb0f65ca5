//! Integration tests for Vintage Shop.
//!
//! Tests drive the real Axum router through `tower::ServiceExt::oneshot`
//! against the in-memory store and image store, so no database is needed.
//!
//! ```bash
//! cargo test -p vintage-shop-integration-tests
//! ```

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use vintage_shop_storefront::config::StorefrontConfig;
use vintage_shop_storefront::db::Repositories;
use vintage_shop_storefront::models::identity::{USER_ID_HEADER, USER_ROLE_HEADER};
use vintage_shop_storefront::services::MemoryImageStore;
use vintage_shop_storefront::state::AppState;

const BOUNDARY: &str = "vintage-shop-test-boundary";

/// Who a request is sent as.
#[derive(Debug, Clone, Copy)]
pub enum Caller {
    Anonymous,
    Customer(Uuid),
    Admin(Uuid),
}

impl Caller {
    #[must_use]
    pub fn customer() -> Self {
        Self::Customer(Uuid::new_v4())
    }

    #[must_use]
    pub fn admin() -> Self {
        Self::Admin(Uuid::new_v4())
    }
}

/// One part of a multipart body.
#[derive(Debug, Clone)]
pub enum Part {
    Text(&'static str, String),
    File {
        field: &'static str,
        file_name: &'static str,
        content_type: &'static str,
        bytes: Vec<u8>,
    },
}

impl Part {
    #[must_use]
    pub fn text(name: &'static str, value: impl Into<String>) -> Self {
        Self::Text(name, value.into())
    }

    #[must_use]
    pub fn png(field: &'static str, file_name: &'static str) -> Self {
        Self::File {
            field,
            file_name,
            content_type: "image/png",
            bytes: b"\x89PNG\r\n\x1a\n".to_vec(),
        }
    }
}

/// A response with its body decoded as JSON (`Value::Null` when empty).
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// An application wired to in-memory collaborators.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub images: Arc<MemoryImageStore>,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    #[must_use]
    pub fn new() -> Self {
        let images = Arc::new(MemoryImageStore::new());
        let state = AppState::new(test_config(), Repositories::in_memory(), images.clone());
        let router = vintage_shop_storefront::app(state.clone());
        Self {
            router,
            state,
            images,
        }
    }

    /// Send a request with an optional JSON body.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body is not JSON.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        caller: Caller,
        json: Option<Value>,
    ) -> TestResponse {
        let builder = with_caller(Request::builder().method(method).uri(uri), caller);
        let request = match json {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");
        self.dispatch(request).await
    }

    /// Send a multipart form.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body is not JSON.
    pub async fn send_form(
        &self,
        method: Method,
        uri: &str,
        caller: Caller,
        parts: Vec<Part>,
    ) -> TestResponse {
        let request = with_caller(Request::builder().method(method).uri(uri), caller)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(parts)))
            .expect("request");
        self.dispatch(request).await
    }

    pub async fn get(&self, uri: &str, caller: Caller) -> TestResponse {
        self.send(Method::GET, uri, caller, None).await
    }

    pub async fn post(&self, uri: &str, caller: Caller, json: Value) -> TestResponse {
        self.send(Method::POST, uri, caller, Some(json)).await
    }

    pub async fn patch(&self, uri: &str, caller: Caller, json: Value) -> TestResponse {
        self.send(Method::PATCH, uri, caller, Some(json)).await
    }

    pub async fn delete(&self, uri: &str, caller: Caller) -> TestResponse {
        self.send(Method::DELETE, uri, caller, None).await
    }

    /// Create a product as an admin and return its ID.
    ///
    /// # Panics
    ///
    /// Panics if the product is rejected.
    pub async fn create_product(&self, name: &str, price: &str, categories: &[&str]) -> String {
        let response = self
            .send_form(
                Method::POST,
                "/api/products",
                Caller::admin(),
                vec![
                    Part::text("name", name),
                    Part::text("description", format!("Vintage {name}")),
                    Part::text("price", price),
                    Part::text(
                        "categories",
                        serde_json::to_string(categories).expect("categories"),
                    ),
                ],
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body["id"].as_str().expect("product id").to_owned()
    }

    async fn dispatch(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        TestResponse { status, body }
    }
}

fn with_caller(
    builder: axum::http::request::Builder,
    caller: Caller,
) -> axum::http::request::Builder {
    match caller {
        Caller::Anonymous => builder,
        Caller::Customer(id) => builder
            .header(USER_ID_HEADER, id.to_string())
            .header(USER_ROLE_HEADER, "customer"),
        Caller::Admin(id) => builder
            .header(USER_ID_HEADER, id.to_string())
            .header(USER_ROLE_HEADER, "admin"),
    }
}

fn multipart_body(parts: Vec<Part>) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                field,
                file_name,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
                         Content-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(&bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        database_url: secrecy::SecretString::from("postgres://unused"),
        host: std::net::IpAddr::from([127, 0, 0, 1]),
        port: 0,
        upload_dir: std::env::temp_dir().join("vintage-shop-test-uploads"),
        upload_base_url: "/uploads".to_owned(),
        max_upload_bytes: 10 * 1024 * 1024,
        cors_origins: vec!["http://localhost:5173".to_owned()],
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}
