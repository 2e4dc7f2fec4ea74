//! HTTP implementation of [`CatalogApi`].
//!
//! # Endpoints
//!
//! - `GET /products/`, `PATCH /products/{id}`
//! - `POST /products/{id}/images` (multipart), `DELETE /products/images/{id}`
//! - `PATCH /products/variants/{id}`, `DELETE /products/variants/{id}`
//! - `POST /products/variants/{id}/image` (multipart)
//! - `POST /products/{id}/variants` (multipart)
//! - `GET /categories`
//!
//! Error responses carry a JSON body `{"detail": "..."}`.

use std::sync::Arc;

use async_trait::async_trait;
use chatshop_core::{Category, ImageId, Product, ProductId, VariantId};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::types::{
    CreatedVariant, NewVariant, ProductUpdate, StagedBinary, UploadedImage, VariantUpdate,
};
use super::{ApiError, CatalogApi};
use crate::config::AdminConfig;

/// Catalog backend REST client.
#[derive(Clone)]
pub struct RestCatalogClient {
    inner: Arc<RestCatalogClientInner>,
}

struct RestCatalogClientInner {
    client: reqwest::Client,
    base_url: String,
}

impl std::fmt::Debug for RestCatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestCatalogClient")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}

/// Error body returned by the backend.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

impl RestCatalogClient {
    /// Create a new client for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &AdminConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(RestCatalogClientInner {
                client,
                base_url: config.api_url.trim_end_matches('/').to_string(),
            }),
        })
    }

    /// Get the backend base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    /// Execute a GET request and parse the JSON body.
    async fn get<T: DeserializeOwned>(&self, path: &str, what: &str) -> Result<T, ApiError> {
        let response = self.inner.client.get(self.url(path)).send().await?;
        Self::handle_json(response, what).await
    }

    /// Execute a PATCH request with a JSON body, ignoring the response body.
    async fn patch<B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
        what: &str,
    ) -> Result<(), ApiError> {
        let response = self
            .inner
            .client
            .patch(self.url(path))
            .json(body)
            .send()
            .await?;
        Self::handle_empty(response, what).await
    }

    /// Execute a DELETE request.
    async fn delete(&self, path: &str, what: &str) -> Result<(), ApiError> {
        let response = self.inner.client.delete(self.url(path)).send().await?;
        Self::handle_empty(response, what).await
    }

    /// Execute a multipart POST request and parse the JSON body.
    async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        form: Form,
        what: &str,
    ) -> Result<T, ApiError> {
        let response = self
            .inner
            .client
            .post(self.url(path))
            .multipart(form)
            .send()
            .await?;
        Self::handle_json(response, what).await
    }

    async fn handle_json<T: DeserializeOwned>(
        response: reqwest::Response,
        what: &str,
    ) -> Result<T, ApiError> {
        if response.status().is_success() {
            return response
                .json()
                .await
                .map_err(|e| ApiError::Parse(format!("Failed to parse response: {e}")));
        }
        Err(Self::parse_error(response, what).await)
    }

    async fn handle_empty(response: reqwest::Response, what: &str) -> Result<(), ApiError> {
        if response.status().is_success() {
            return Ok(());
        }
        Err(Self::parse_error(response, what).await)
    }

    /// Turn a non-success response into an error, preferring the backend's
    /// `detail` message over the generic `fallback`.
    async fn parse_error(response: reqwest::Response, fallback: &str) -> ApiError {
        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();

        let message = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(|body| body.detail)
            .map_or_else(
                || fallback.to_string(),
                |detail| match detail {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                },
            );

        debug!(status, %message, "Catalog backend returned an error");

        if status == 404 {
            return ApiError::NotFound(message);
        }
        ApiError::Api { status, message }
    }
}

/// Build the multipart part for a staged image.
fn image_part(image: &StagedBinary) -> Result<Part, ApiError> {
    Part::bytes(image.bytes().to_vec())
        .file_name(image.file_name().to_string())
        .mime_str(image.content_type())
        .map_err(ApiError::from)
}

#[async_trait]
impl CatalogApi for RestCatalogClient {
    #[instrument(skip(self))]
    async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        self.get("/products/", "Failed to fetch products").await
    }

    #[instrument(skip(self))]
    async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        self.get("/categories", "Failed to fetch categories").await
    }

    #[instrument(skip(self, update), fields(product_id = %product_id))]
    async fn update_product_fields(
        &self,
        product_id: &ProductId,
        update: &ProductUpdate,
    ) -> Result<(), ApiError> {
        self.patch(
            &format!("/products/{product_id}"),
            update,
            "Failed to update product",
        )
        .await
    }

    #[instrument(skip(self), fields(image_id = %image_id))]
    async fn delete_image(&self, image_id: &ImageId) -> Result<(), ApiError> {
        self.delete(
            &format!("/products/images/{image_id}"),
            "Failed to delete image",
        )
        .await
    }

    #[instrument(skip(self, image), fields(product_id = %product_id, file = image.file_name()))]
    async fn add_image(
        &self,
        product_id: &ProductId,
        image: &StagedBinary,
        variant_id: Option<&VariantId>,
    ) -> Result<UploadedImage, ApiError> {
        let mut form = Form::new().part("image", image_part(image)?);
        if let Some(variant_id) = variant_id {
            form = form.text("variant_id", variant_id.to_string());
        }
        self.post_form(
            &format!("/products/{product_id}/images"),
            form,
            "Failed to upload image",
        )
        .await
    }

    #[instrument(skip(self, update), fields(variant_id = %variant_id))]
    async fn update_variant_fields(
        &self,
        variant_id: &VariantId,
        update: &VariantUpdate,
    ) -> Result<(), ApiError> {
        self.patch(
            &format!("/products/variants/{variant_id}"),
            update,
            "Failed to update variant",
        )
        .await
    }

    #[instrument(skip(self), fields(variant_id = %variant_id))]
    async fn delete_variant(&self, variant_id: &VariantId) -> Result<(), ApiError> {
        self.delete(
            &format!("/products/variants/{variant_id}"),
            "Failed to delete variant",
        )
        .await
    }

    #[instrument(skip(self, image), fields(variant_id = %variant_id, file = image.file_name()))]
    async fn set_variant_image(
        &self,
        variant_id: &VariantId,
        product_id: &ProductId,
        image: &StagedBinary,
    ) -> Result<UploadedImage, ApiError> {
        let form = Form::new()
            .text("product_id", product_id.to_string())
            .part("image", image_part(image)?);
        self.post_form(
            &format!("/products/variants/{variant_id}/image"),
            form,
            "Failed to set variant image",
        )
        .await
    }

    #[instrument(skip(self, variant), fields(product_id = %product_id, option = %variant.option_key))]
    async fn create_variant(
        &self,
        product_id: &ProductId,
        variant: &NewVariant,
    ) -> Result<CreatedVariant, ApiError> {
        let mut form = Form::new()
            .text("option_key", variant.option_key.clone())
            .text("option_value", variant.option_value.clone())
            .text("price", variant.price.to_string())
            .text("stock", variant.stock.to_string());
        if let Some(image) = &variant.image {
            form = form.part("image", image_part(image)?);
        }
        self.post_form(
            &format!("/products/{product_id}/variants"),
            form,
            "Failed to add variant",
        )
        .await
    }
}
