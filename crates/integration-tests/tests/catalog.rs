//! Product listing and maintenance through the HTTP API.

use axum::http::{Method, StatusCode};
use serde_json::Value;

use vintage_shop_integration_tests::{Caller, Part, TestApp};

fn names(body: &Value) -> Vec<String> {
    body["products"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap().to_owned())
        .collect()
}

#[tokio::test]
async fn test_second_page_of_twenty_five() {
    let app = TestApp::new();
    for i in 1..=25 {
        app.create_product(&format!("Shirt {i:02}"), "10.00", &["Shirts"])
            .await;
    }

    let page = app
        .get("/api/products?category=Shirts&page=2&limit=10", Caller::Anonymous)
        .await;

    assert_eq!(page.status, StatusCode::OK);
    assert_eq!(page.body["currentPage"], 2);
    assert_eq!(page.body["totalPages"], 3);
    assert_eq!(page.body["total"], 25);
    let expected: Vec<String> = (11..=20).map(|i| format!("Shirt {i:02}")).collect();
    assert_eq!(names(&page.body), expected);
}

#[tokio::test]
async fn test_filters_and_sorting() {
    let app = TestApp::new();
    app.create_product("Denim Jacket", "45.00", &["Jackets"]).await;
    app.create_product("Wool Coat", "80.00", &["Jackets"]).await;
    app.create_product("Silk Scarf", "12.50", &["Accessories"]).await;

    let jackets = app
        .get("/api/products?category=Jackets&sort=price_desc", Caller::Anonymous)
        .await;
    assert_eq!(names(&jackets.body), vec!["Wool Coat", "Denim Jacket"]);

    let cheapest = app
        .get("/api/products?sort=price_asc&limit=1", Caller::Anonymous)
        .await;
    assert_eq!(names(&cheapest.body), vec!["Silk Scarf"]);
    assert_eq!(cheapest.body["totalPages"], 3);

    let search = app
        .get("/api/products?search=denim%20scarf", Caller::Anonymous)
        .await;
    assert_eq!(names(&search.body), vec!["Denim Jacket", "Silk Scarf"]);

    let nothing = app
        .get("/api/products?search=velvet", Caller::Anonymous)
        .await;
    assert_eq!(nothing.body["total"], 0);
    assert_eq!(nothing.body["totalPages"], 0);
}

#[tokio::test]
async fn test_featured_filter() {
    let app = TestApp::new();
    app.create_product("Plain Tee", "8.00", &["Shirts"]).await;
    let featured = app
        .send_form(
            Method::POST,
            "/api/products",
            Caller::admin(),
            vec![
                Part::text("name", "Band Tee"),
                Part::text("description", "1994 tour shirt"),
                Part::text("price", "30.00"),
                Part::text("categories", r#"["Shirts"]"#),
                Part::text("featured", "true"),
                Part::text("inStock", "false"),
            ],
        )
        .await;
    assert_eq!(featured.status, StatusCode::CREATED);
    assert_eq!(featured.body["featured"], true);
    assert_eq!(featured.body["inStock"], false);

    let listing = app
        .get("/api/products?featured=true", Caller::Anonymous)
        .await;
    assert_eq!(names(&listing.body), vec!["Band Tee"]);
}

#[tokio::test]
async fn test_create_with_images_and_update_keeps_retained_first() {
    let app = TestApp::new();
    let admin = Caller::admin();

    let created = app
        .send_form(
            Method::POST,
            "/api/products",
            admin,
            vec![
                Part::text("name", "Leather Bag"),
                Part::text("description", "Worn brown leather"),
                Part::text("price", "60.00"),
                Part::text("categories", r#"["Accessories"]"#),
                Part::png("images", "front.png"),
                Part::png("images", "back.png"),
            ],
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED, "{:?}", created.body);
    let stored = app.images.references().await;
    assert_eq!(stored.len(), 2);
    assert_eq!(created.body["images"], serde_json::json!(stored));

    let id = created.body["id"].as_str().unwrap();
    let keep = serde_json::to_string(&[&stored[1]]).unwrap();
    let updated = app
        .send_form(
            Method::PATCH,
            &format!("/api/products/{id}"),
            admin,
            vec![
                Part::text("name", "Leather Bag"),
                Part::text("description", "Worn brown leather"),
                Part::text("price", "55.00"),
                Part::text("categories", r#"["Accessories","Bags"]"#),
                Part::text("existingImages", keep),
                Part::png("images", "side.png"),
            ],
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK, "{:?}", updated.body);

    let stored = app.images.references().await;
    assert_eq!(
        updated.body["images"],
        serde_json::json!([stored[1], stored[2]])
    );
    assert_eq!(updated.body["price"], "55.00");
    assert_eq!(updated.body["createdAt"], created.body["createdAt"]);
}

#[tokio::test]
async fn test_invalid_products_are_rejected() {
    let app = TestApp::new();
    let admin = Caller::admin();

    let cases = vec![
        vec![
            Part::text("description", "No name"),
            Part::text("price", "1.00"),
            Part::text("categories", r#"["Shirts"]"#),
        ],
        vec![
            Part::text("name", "Negative"),
            Part::text("description", "Below zero"),
            Part::text("price", "-1.00"),
            Part::text("categories", r#"["Shirts"]"#),
        ],
        vec![
            Part::text("name", "Homeless"),
            Part::text("description", "No category"),
            Part::text("price", "1.00"),
        ],
        vec![
            Part::text("name", "Animated"),
            Part::text("description", "Wrong file type"),
            Part::text("price", "1.00"),
            Part::text("categories", r#"["Shirts"]"#),
            Part::File {
                field: "images",
                file_name: "dance.gif",
                content_type: "image/gif",
                bytes: b"GIF89a".to_vec(),
            },
        ],
    ];

    for parts in cases {
        let response = app
            .send_form(Method::POST, "/api/products", admin, parts)
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{:?}", response.body);
    }
    assert!(app.images.references().await.is_empty());
    assert_eq!(app.get("/api/products", Caller::Anonymous).await.body["total"], 0);
}

#[tokio::test]
async fn test_too_many_images_are_rejected() {
    let app = TestApp::new();
    let mut parts = vec![
        Part::text("name", "Gallery"),
        Part::text("description", "Eleven angles"),
        Part::text("price", "1.00"),
        Part::text("categories", r#"["Shirts"]"#),
    ];
    parts.extend((0..11).map(|_| Part::png("images", "angle.png")));

    let response = app
        .send_form(Method::POST, "/api/products", Caller::admin(), parts)
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(app.images.references().await.is_empty());
}

#[tokio::test]
async fn test_get_and_delete() {
    let app = TestApp::new();
    let id = app.create_product("Shirt", "10.00", &["Shirts"]).await;

    let found = app.get(&format!("/api/products/{id}"), Caller::Anonymous).await;
    assert_eq!(found.status, StatusCode::OK);
    assert_eq!(found.body["name"], "Shirt");

    let deleted = app.delete(&format!("/api/products/{id}"), Caller::admin()).await;
    assert_eq!(deleted.status, StatusCode::OK);

    let gone = app.get(&format!("/api/products/{id}"), Caller::Anonymous).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
    let again = app.delete(&format!("/api/products/{id}"), Caller::admin()).await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);

    let malformed = app.get("/api/products/not-a-uuid", Caller::Anonymous).await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);
}
