//! End-to-end commits: draft edits reconciled over HTTP against the fake
//! backend.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::{Method, StatusCode};
use chatshop_admin::catalog::{RestCatalogClient, StagedBinary};
use chatshop_admin::draft::VariantPatch;
use chatshop_admin::reconcile::{CommitStep, ReconciliationEngine, SessionState};
use chatshop_core::{ImageId, ImageRecord, Price, Product, ProductId, Variant, VariantId, VariantOptions};
use chatshop_integration_tests::{FakeBackend, RecordedRequest};
use serde_json::json;

fn product() -> Product {
    Product {
        id: ProductId::new("5"),
        name: "Gorra".to_string(),
        description: None,
        price: None,
        stock: None,
        product_variants: vec![
            Variant {
                id: VariantId::new("8"),
                options: VariantOptions::from([("Color".to_string(), "Negro".to_string())]),
                price: Some(Price::from_pesos(1000)),
                stock: Some(4),
            },
            Variant {
                id: VariantId::new("9"),
                options: VariantOptions::from([("Color".to_string(), "Blanco".to_string())]),
                price: Some(Price::from_pesos(1000)),
                stock: Some(1),
            },
        ],
        product_images: vec![
            ImageRecord {
                id: ImageId::new("17"),
                url: "https://cdn.test/17.jpg".to_string(),
                variant_id: None,
            },
            ImageRecord {
                id: ImageId::new("40"),
                url: "https://cdn.test/40.jpg".to_string(),
                variant_id: Some(VariantId::new("8")),
            },
        ],
        category: None,
    }
}

async fn setup() -> (FakeBackend, ReconciliationEngine<RestCatalogClient>) {
    let backend = FakeBackend::start(vec![product()], vec![]).await;
    let config = backend.config();
    let engine = ReconciliationEngine::with_config(RestCatalogClient::new(&config).unwrap(), &config);
    (backend, engine)
}

fn route(request: &RecordedRequest) -> (Method, &str) {
    (request.method.clone(), request.path.as_str())
}

#[tokio::test]
async fn test_unchanged_draft_issues_no_calls() {
    let (backend, engine) = setup().await;
    let session = engine.begin_edit(&product());

    let outcome = engine.commit(session).await;

    assert!(outcome.succeeded());
    assert_eq!(outcome.calls_issued(), 0);
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_variant_price_change_is_single_update() {
    let (backend, engine) = setup().await;
    let mut session = engine.begin_edit(&product());
    session
        .draft_mut()
        .variants_mut()
        .patch_existing(&VariantId::new("8"), &VariantPatch::new().price(Price::from_pesos(1200)));

    let outcome = engine.commit(session).await;
    assert_eq!(outcome.state(), SessionState::ClosedSuccess);

    let mutations = backend.mutations();
    assert_eq!(mutations.len(), 1);
    assert_eq!(route(&mutations[0]), (Method::PATCH, "/products/variants/8"));
    assert_eq!(mutations[0].json, Some(json!({ "price": 1200.0 })));
}

#[tokio::test]
async fn test_new_variant_is_single_create() {
    let (backend, engine) = setup().await;
    let mut session = engine.begin_edit(&product());
    let variants = session.draft_mut().variants_mut();
    let local = variants.add_new();
    let patch = VariantPatch::new()
        .option_key("Color")
        .option_value("Red")
        .price_text("500")
        .unwrap()
        .stock_text("3")
        .unwrap();
    variants.patch_new(local, &patch);

    assert!(engine.commit(session).await.succeeded());

    let mutations = backend.mutations();
    assert_eq!(mutations.len(), 1);
    assert_eq!(route(&mutations[0]), (Method::POST, "/products/5/variants"));
    assert_eq!(mutations[0].fields.get("option_key").unwrap(), "Color");
    assert_eq!(mutations[0].fields.get("option_value").unwrap(), "Red");
    assert_eq!(mutations[0].fields.get("price").unwrap(), "500");
    assert_eq!(mutations[0].fields.get("stock").unwrap(), "3");
    assert!(mutations[0].files.is_empty());
}

#[tokio::test]
async fn test_new_variant_with_image_is_single_create() {
    let (backend, engine) = setup().await;
    let mut session = engine.begin_edit(&product());
    let draft = session.draft_mut();
    let local = draft.variants_mut().add_new();
    draft.variants_mut().patch_new(
        local,
        &VariantPatch::new().option_key("Color").option_value("Rojo"),
    );
    assert!(draft.stage_new_variant_image(local, StagedBinary::new("rojo.png", vec![5_u8; 10])));

    assert!(engine.commit(session).await.succeeded());

    let mutations = backend.mutations();
    assert_eq!(mutations.len(), 1);
    assert_eq!(route(&mutations[0]), (Method::POST, "/products/5/variants"));
    assert_eq!(mutations[0].fields.get("option_value").unwrap(), "Rojo");
    assert_eq!(mutations[0].files.len(), 1);
    assert_eq!(mutations[0].files[0].field, "image");
    assert_eq!(mutations[0].files[0].file_name, "rojo.png");
    assert_eq!(engine.previews().live_count(), 0);
}

#[tokio::test]
async fn test_general_image_swap() {
    let (backend, engine) = setup().await;
    let mut session = engine.begin_edit(&product());
    assert!(session.draft_mut().remove_image(&ImageId::new("17")));
    session
        .draft_mut()
        .stage_image(StagedBinary::new("nueva.jpg", vec![0_u8; 16]))
        .unwrap();
    assert_eq!(engine.previews().live_count(), 1);

    let outcome = engine.commit(session).await;
    assert!(outcome.succeeded());
    assert_eq!(engine.previews().live_count(), 0);

    let mut routes: Vec<(Method, String)> = backend
        .mutations()
        .iter()
        .map(|r| (r.method.clone(), r.path.clone()))
        .collect();
    routes.sort_by(|a, b| a.1.cmp(&b.1));
    assert_eq!(
        routes,
        vec![
            (Method::POST, "/products/5/images".to_string()),
            (Method::DELETE, "/products/images/17".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_deleted_variant_skips_its_edits() {
    let (backend, engine) = setup().await;
    let mut session = engine.begin_edit(&product());
    let id = VariantId::new("9");
    let variants = session.draft_mut().variants_mut();
    variants.patch_existing(&id, &VariantPatch::new().price(Price::from_pesos(5000)));
    variants.mark_existing_deleted(&id);

    assert!(engine.commit(session).await.succeeded());

    let mutations = backend.mutations();
    assert_eq!(mutations.len(), 1);
    assert_eq!(route(&mutations[0]), (Method::DELETE, "/products/variants/9"));
}

#[tokio::test]
async fn test_steps_run_in_order() {
    let (backend, engine) = setup().await;
    let mut session = engine.begin_edit(&product());
    let draft = session.draft_mut();
    draft.set_name("Gorra trucker");
    draft.remove_image(&ImageId::new("17"));
    draft.stage_image(StagedBinary::new("frente.png", vec![1_u8; 8]));
    draft.variants_mut().remove_existing_image(&VariantId::new("8"));
    draft
        .variants_mut()
        .patch_existing(&VariantId::new("8"), &VariantPatch::new().stock(0));
    let local = draft.variants_mut().add_new();
    draft.variants_mut().patch_new(
        local,
        &VariantPatch::new().option_key("Color").option_value("Azul"),
    );

    assert!(engine.commit(session).await.succeeded());

    let mutations = backend.mutations();
    let routes: Vec<(Method, &str)> = mutations.iter().map(route).collect();
    assert_eq!(
        routes,
        vec![
            (Method::PATCH, "/products/5"),
            (Method::DELETE, "/products/images/17"),
            (Method::POST, "/products/5/images"),
            (Method::PATCH, "/products/variants/8"),
            (Method::DELETE, "/products/images/40"),
            (Method::POST, "/products/5/variants"),
        ]
    );
    // Price and stock of a new variant default to zero
    assert_eq!(mutations[5].fields.get("price").unwrap(), "0");
    assert_eq!(mutations[5].fields.get("stock").unwrap(), "0");
}

#[tokio::test]
async fn test_replaced_variant_image_uses_set_image_only() {
    let (backend, engine) = setup().await;
    let mut session = engine.begin_edit(&product());
    session
        .draft_mut()
        .stage_variant_image(&VariantId::new("8"), StagedBinary::new("negro.jpg", vec![2_u8; 8]));

    assert!(engine.commit(session).await.succeeded());

    let mutations = backend.mutations();
    assert_eq!(mutations.len(), 1);
    assert_eq!(route(&mutations[0]), (Method::POST, "/products/variants/8/image"));
    assert_eq!(mutations[0].fields.get("product_id").unwrap(), "5");
    assert_eq!(mutations[0].files[0].file_name, "negro.jpg");
}

#[tokio::test]
async fn test_failures_are_aggregated_and_later_steps_still_run() {
    let (backend, engine) = setup().await;
    backend.fail(Method::PATCH, "/products/5", StatusCode::BAD_REQUEST, "Name too long");
    backend.fail(
        Method::DELETE,
        "/products/variants/9",
        StatusCode::INTERNAL_SERVER_ERROR,
        "Variant is referenced by an order",
    );

    let mut session = engine.begin_edit(&product());
    let draft = session.draft_mut();
    draft.set_name("x".repeat(300));
    draft.variants_mut().mark_existing_deleted(&VariantId::new("9"));
    draft
        .variants_mut()
        .patch_existing(&VariantId::new("8"), &VariantPatch::new().stock(7));

    let outcome = engine.commit(session).await;
    assert_eq!(outcome.state(), SessionState::ClosedPartialFailure);
    assert_eq!(outcome.calls_issued(), 3);
    assert_eq!(outcome.calls_failed(), 2);

    // Every planned call reached the backend
    assert_eq!(backend.mutations().len(), 3);

    let failure = outcome.into_result().unwrap_err();
    let steps: Vec<CommitStep> = failure.failures().iter().map(|f| f.step).collect();
    assert_eq!(steps, vec![CommitStep::UpdateProduct, CommitStep::ExistingVariants]);
    assert_eq!(failure.first().unwrap().error.to_string(), "API error: 400 - Name too long");
    assert!(failure.to_string().contains("2 change(s)"));
}
