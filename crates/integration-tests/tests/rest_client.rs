//! Integration tests for the catalog REST client.
//!
//! Each test starts its own [`FakeBackend`] on an ephemeral port.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::collections::BTreeMap;

use axum::http::{Method, StatusCode};
use chatshop_admin::AdminConfig;
use chatshop_admin::catalog::{
    ApiError, CatalogApi, NewVariant, ProductUpdate, RestCatalogClient, StagedBinary,
    VariantUpdate,
};
use chatshop_core::{
    Category, CategoryId, ImageId, ImageRecord, Price, Product, ProductId, Variant, VariantId,
    VariantOptions,
};
use chatshop_integration_tests::FakeBackend;
use serde_json::json;

fn product() -> Product {
    Product {
        id: ProductId::new("12"),
        name: "Camiseta".to_string(),
        description: Some("Algodón".to_string()),
        price: Some(Price::parse("45000.5").unwrap()),
        stock: None,
        product_variants: vec![Variant {
            id: VariantId::new("7"),
            options: VariantOptions::from([("Talla".to_string(), "M".to_string())]),
            price: Some(Price::from_pesos(45_000)),
            stock: Some(6),
        }],
        product_images: vec![ImageRecord {
            id: ImageId::new("30"),
            url: "https://cdn.test/30.jpg".to_string(),
            variant_id: None,
        }],
        category: Some(Category {
            id: CategoryId::new("3"),
            name: "Ropa".to_string(),
            description: None,
            parent_id: None,
            image_url: None,
        }),
    }
}

async fn setup() -> (FakeBackend, RestCatalogClient) {
    let backend = FakeBackend::start(vec![product()], vec![product().category.unwrap()]).await;
    let client = RestCatalogClient::new(&backend.config()).unwrap();
    (backend, client)
}

// ============================================================================
// Reads
// ============================================================================

#[tokio::test]
async fn test_list_products_round_trips_catalog() {
    let (backend, client) = setup().await;

    let products = client.list_products().await.unwrap();
    assert_eq!(products, vec![product()]);

    let requests = backend.requests();
    assert_eq!(requests[0].method, Method::GET);
    assert_eq!(requests[0].path, "/products/");
}

#[tokio::test]
async fn test_list_categories() {
    let (_backend, client) = setup().await;
    let categories = client.list_categories().await.unwrap();
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0].name, "Ropa");
}

// ============================================================================
// Writes
// ============================================================================

#[tokio::test]
async fn test_update_product_sends_only_set_fields() {
    let (backend, client) = setup().await;
    let update = ProductUpdate {
        price: Some(Price::from_pesos(50_000)),
        category_id: Some(CategoryId::new("4")),
        ..ProductUpdate::default()
    };

    client
        .update_product_fields(&ProductId::new("12"), &update)
        .await
        .unwrap();

    let request = &backend.requests()[0];
    assert_eq!(request.method, Method::PATCH);
    assert_eq!(request.path, "/products/12");
    assert_eq!(
        request.json,
        Some(json!({ "price": 50000.0, "category_id": "4" }))
    );
}

#[tokio::test]
async fn test_add_image_multipart() {
    let (backend, client) = setup().await;
    let image = StagedBinary::new("frente.png", vec![7_u8; 32]);

    let uploaded = client
        .add_image(&ProductId::new("12"), &image, Some(&VariantId::new("7")))
        .await
        .unwrap();
    assert_eq!(uploaded.url, "https://cdn.test/frente.png");
    assert!(uploaded.id.is_some());

    let request = &backend.requests()[0];
    assert_eq!(request.path, "/products/12/images");
    assert_eq!(request.fields.get("variant_id").map(String::as_str), Some("7"));
    assert_eq!(request.files.len(), 1);
    assert_eq!(request.files[0].field, "image");
    assert_eq!(request.files[0].content_type.as_deref(), Some("image/png"));
    assert_eq!(request.files[0].len, 32);
}

#[tokio::test]
async fn test_variant_update_and_delete_paths() {
    let (backend, client) = setup().await;
    let id = VariantId::new("7");

    client
        .update_variant_fields(
            &id,
            &VariantUpdate {
                stock: Some(0),
                ..VariantUpdate::default()
            },
        )
        .await
        .unwrap();
    client.delete_variant(&id).await.unwrap();
    client.delete_image(&ImageId::new("30")).await.unwrap();

    let requests = backend.requests();
    assert_eq!(requests[0].path, "/products/variants/7");
    assert_eq!(requests[0].json, Some(json!({ "stock": 0 })));
    assert_eq!(
        (requests[1].method.clone(), requests[1].path.as_str()),
        (Method::DELETE, "/products/variants/7")
    );
    assert_eq!(requests[2].path, "/products/images/30");
}

#[tokio::test]
async fn test_set_variant_image_sends_product_id() {
    let (backend, client) = setup().await;
    let image = StagedBinary::new("talla-m.jpg", vec![1_u8; 4]);

    let uploaded = client
        .set_variant_image(&VariantId::new("7"), &ProductId::new("12"), &image)
        .await
        .unwrap();
    assert_eq!(uploaded.url, "https://cdn.test/talla-m.jpg");
    assert!(uploaded.id.is_none());

    let request = &backend.requests()[0];
    assert_eq!(request.path, "/products/variants/7/image");
    assert_eq!(request.fields.get("product_id").map(String::as_str), Some("12"));
    assert_eq!(request.files[0].file_name, "talla-m.jpg");
}

#[tokio::test]
async fn test_create_variant_form_fields() {
    let (backend, client) = setup().await;
    let variant = NewVariant {
        option_key: "Color".to_string(),
        option_value: "Red".to_string(),
        price: Price::from_pesos(500),
        stock: 3,
        image: None,
    };

    let created = client
        .create_variant(&ProductId::new("12"), &variant)
        .await
        .unwrap();
    assert!(created.id.as_str().starts_with("var-"));
    assert!(created.image_url.is_none());

    let request = &backend.requests()[0];
    assert_eq!(request.path, "/products/12/variants");
    let expected: BTreeMap<String, String> = [
        ("option_key", "Color"),
        ("option_value", "Red"),
        ("price", "500"),
        ("stock", "3"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    assert_eq!(request.fields, expected);
    assert!(request.files.is_empty());
}

#[tokio::test]
async fn test_create_variant_with_image_is_one_request() {
    let (backend, client) = setup().await;
    let variant = NewVariant {
        option_key: "Talla".to_string(),
        option_value: "L".to_string(),
        price: Price::from_pesos(47_000),
        stock: 2,
        image: Some(StagedBinary::new("talla-l.webp", vec![9_u8; 12])),
    };

    let created = client
        .create_variant(&ProductId::new("12"), &variant)
        .await
        .unwrap();
    assert_eq!(created.image_url.as_deref(), Some("https://cdn.test/talla-l.webp"));

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.path, "/products/12/variants");
    assert_eq!(request.fields.get("option_key").map(String::as_str), Some("Talla"));
    assert_eq!(request.fields.get("option_value").map(String::as_str), Some("L"));
    assert_eq!(request.fields.get("price").map(String::as_str), Some("47000"));
    assert_eq!(request.fields.get("stock").map(String::as_str), Some("2"));
    assert_eq!(request.files.len(), 1);
    assert_eq!(request.files[0].field, "image");
    assert_eq!(request.files[0].file_name, "talla-l.webp");
    assert_eq!(request.files[0].content_type.as_deref(), Some("image/webp"));
    assert_eq!(request.files[0].len, 12);
}

// ============================================================================
// Errors
// ============================================================================

#[tokio::test]
async fn test_error_detail_is_surfaced() {
    let (backend, client) = setup().await;
    backend.fail(
        Method::DELETE,
        "/products/images/30",
        StatusCode::CONFLICT,
        "Image is in use",
    );

    let err = client.delete_image(&ImageId::new("30")).await.unwrap_err();
    match err {
        ApiError::Api { status, message } => {
            assert_eq!(status, 409);
            assert_eq!(message, "Image is in use");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_error_without_detail_uses_fallback() {
    let (backend, client) = setup().await;
    backend.fail_with_body(
        Method::POST,
        "/products/12/variants",
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "error": "boom" }),
    );
    let variant = NewVariant {
        option_key: "Color".to_string(),
        option_value: "Azul".to_string(),
        price: Price::ZERO,
        stock: 0,
        image: None,
    };

    let err = client
        .create_variant(&ProductId::new("12"), &variant)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "API error: 500 - Failed to add variant");
}

#[tokio::test]
async fn test_not_found_maps_to_not_found() {
    let (backend, client) = setup().await;
    backend.fail(
        Method::PATCH,
        "/products/variants/99",
        StatusCode::NOT_FOUND,
        "Variant not found",
    );

    let err = client
        .update_variant_fields(
            &VariantId::new("99"),
            &VariantUpdate {
                stock: Some(1),
                ..VariantUpdate::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(message) if message == "Variant not found"));
}

#[tokio::test]
async fn test_unreachable_backend_is_http_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = AdminConfig {
        api_url: format!("http://{addr}"),
        ..AdminConfig::default()
    };
    let client = RestCatalogClient::new(&config).unwrap();
    let result = client.list_categories().await;
    assert!(matches!(result, Err(ApiError::Http(_))));
}
