//! Integration tests for Chatshop.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p chatshop-integration-tests
//! ```
//!
//! Tests run the real [`RestCatalogClient`](chatshop_admin::catalog::RestCatalogClient)
//! against [`FakeBackend`], an axum server bound to `127.0.0.1:0` that
//! serves the catalog routes, records every request and can be told to
//! fail specific routes. No external services are needed.

use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Multipart, State};
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use chatshop_admin::AdminConfig;
use chatshop_core::{Category, Product};
use serde_json::{Value, json};
use tokio::task::JoinHandle;

/// A file part received in a multipart request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedFile {
    pub field: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub len: usize,
}

/// One request received by the fake backend.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    /// JSON body, for PATCH requests
    pub json: Option<Value>,
    /// Text parts, for multipart requests
    pub fields: BTreeMap<String, String>,
    pub files: Vec<ReceivedFile>,
}

impl RecordedRequest {
    fn new(method: Method, uri: &Uri) -> Self {
        Self {
            method,
            path: uri.path().to_string(),
            json: None,
            fields: BTreeMap::new(),
            files: Vec::new(),
        }
    }

    /// Whether the request changes backend state.
    #[must_use]
    pub fn is_mutation(&self) -> bool {
        self.method != Method::GET
    }
}

#[derive(Default)]
struct BackendState {
    products: Vec<Product>,
    categories: Vec<Category>,
    requests: Vec<RecordedRequest>,
    failures: HashMap<(Method, String), (StatusCode, Value)>,
    next_id: u64,
}

#[derive(Clone, Default)]
struct Shared(Arc<Mutex<BackendState>>);

impl Shared {
    fn lock(&self) -> MutexGuard<'_, BackendState> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record `request`, then answer with an injected failure or `ok`.
    fn reply(&self, request: RecordedRequest, ok: impl FnOnce(u64) -> Value) -> Response {
        let mut state = self.lock();
        let key = (request.method.clone(), request.path.clone());
        state.requests.push(request);
        if let Some((status, body)) = state.failures.get(&key) {
            return (*status, Json(body.clone())).into_response();
        }
        state.next_id += 1;
        Json(ok(state.next_id)).into_response()
    }
}

/// In-process catalog backend for tests.
pub struct FakeBackend {
    addr: SocketAddr,
    state: Shared,
    server: JoinHandle<()>,
}

impl FakeBackend {
    /// Start serving `products` and `categories` on an ephemeral port.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start(products: Vec<Product>, categories: Vec<Category>) -> Self {
        let state = Shared::default();
        {
            let mut inner = state.lock();
            inner.products = products;
            inner.categories = categories;
        }

        let app = Router::new()
            .route("/products/", get(list_products))
            .route("/categories", get(list_categories))
            .route("/products/{id}", patch(json_update))
            .route("/products/{id}/images", post(add_image))
            .route("/products/{id}/variants", post(create_variant))
            .route("/products/images/{id}", axum::routing::delete(delete))
            .route(
                "/products/variants/{id}",
                patch(json_update).delete(delete),
            )
            .route("/products/variants/{id}/image", post(set_variant_image))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake backend");
        let addr = listener.local_addr().expect("Listener has no address");
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self {
            addr,
            state,
            server,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Client configuration pointing at this backend.
    #[must_use]
    pub fn config(&self) -> AdminConfig {
        AdminConfig {
            api_url: self.base_url(),
            ..AdminConfig::default()
        }
    }

    /// Answer `method path` with `status` and a `{"detail": ...}` body.
    pub fn fail(&self, method: Method, path: &str, status: StatusCode, detail: &str) {
        self.fail_with_body(method, path, status, json!({ "detail": detail }));
    }

    pub fn fail_with_body(&self, method: Method, path: &str, status: StatusCode, body: Value) {
        self.state
            .lock()
            .failures
            .insert((method, path.to_string()), (status, body));
    }

    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().requests.clone()
    }

    /// Requests other than listings.
    #[must_use]
    pub fn mutations(&self) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(RecordedRequest::is_mutation)
            .collect()
    }
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

// =============================================================================
// Handlers
// =============================================================================

async fn list_products(State(state): State<Shared>, method: Method, uri: Uri) -> Response {
    let products = state.lock().products.clone();
    state.reply(RecordedRequest::new(method, &uri), |_| json!(products))
}

async fn list_categories(State(state): State<Shared>, method: Method, uri: Uri) -> Response {
    let categories = state.lock().categories.clone();
    state.reply(RecordedRequest::new(method, &uri), |_| json!(categories))
}

async fn json_update(
    State(state): State<Shared>,
    method: Method,
    uri: Uri,
    Json(body): Json<Value>,
) -> Response {
    let mut request = RecordedRequest::new(method, &uri);
    request.json = Some(body);
    state.reply(request, |_| json!({ "ok": true }))
}

async fn delete(State(state): State<Shared>, method: Method, uri: Uri) -> Response {
    state.reply(RecordedRequest::new(method, &uri), |_| json!({ "ok": true }))
}

async fn add_image(
    State(state): State<Shared>,
    method: Method,
    uri: Uri,
    multipart: Multipart,
) -> Response {
    let request = read_multipart(RecordedRequest::new(method, &uri), multipart).await;
    let file = first_file_name(&request);
    state.reply(request, |n| {
        json!({ "id": format!("img-{n}"), "url": format!("https://cdn.test/{file}") })
    })
}

async fn set_variant_image(
    State(state): State<Shared>,
    method: Method,
    uri: Uri,
    multipart: Multipart,
) -> Response {
    let request = read_multipart(RecordedRequest::new(method, &uri), multipart).await;
    let file = first_file_name(&request);
    state.reply(request, |_| json!({ "url": format!("https://cdn.test/{file}") }))
}

async fn create_variant(
    State(state): State<Shared>,
    method: Method,
    uri: Uri,
    multipart: Multipart,
) -> Response {
    let request = read_multipart(RecordedRequest::new(method, &uri), multipart).await;
    let image_url = request
        .files
        .first()
        .map(|f| format!("https://cdn.test/{}", f.file_name));
    state.reply(request, |n| {
        json!({ "id": format!("var-{n}"), "image_url": image_url })
    })
}

async fn read_multipart(mut request: RecordedRequest, mut multipart: Multipart) -> RecordedRequest {
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        if let Some(file_name) = field.file_name().map(str::to_string) {
            let content_type = field.content_type().map(str::to_string);
            let len = field.bytes().await.map_or(0, |b| b.len());
            request.files.push(ReceivedFile {
                field: name,
                file_name,
                content_type,
                len,
            });
        } else {
            let value = field.text().await.unwrap_or_default();
            request.fields.insert(name, value);
        }
    }
    request
}

fn first_file_name(request: &RecordedRequest) -> String {
    request
        .files
        .first()
        .map(|f| f.file_name.clone())
        .unwrap_or_default()
}
