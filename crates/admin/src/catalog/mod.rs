//! Catalog backend boundary.
//!
//! The reconciliation engine only ever talks to the backend through the
//! [`CatalogApi`] trait. This module provides:
//! - [`RestCatalogClient`] - the HTTP implementation used in production
//! - [`RecordingCatalog`] - an in-memory implementation that records every
//!   call (tests and the `test-util` feature only)
//!
//! Every call is independent; the backend offers no multi-entity
//! transaction.

mod rest;
mod types;

#[cfg(any(test, feature = "test-util"))]
mod recording;

pub use rest::RestCatalogClient;
pub use types::{
    CreatedVariant, NewVariant, ProductUpdate, StagedBinary, UploadedImage, VariantUpdate,
};

#[cfg(any(test, feature = "test-util"))]
pub use recording::{ApiCall, RecordingCatalog};

use async_trait::async_trait;
use chatshop_core::{Category, ImageId, Product, ProductId, VariantId};
use thiserror::Error;

/// Errors that can occur when calling the catalog backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend rejected the request.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Operations the admin consumes from the catalog backend.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Fetch every product with its variants and images.
    async fn list_products(&self) -> Result<Vec<Product>, ApiError>;

    /// Fetch every category.
    async fn list_categories(&self) -> Result<Vec<Category>, ApiError>;

    /// Update the given product fields; unset fields keep their server value.
    async fn update_product_fields(
        &self,
        product_id: &ProductId,
        update: &ProductUpdate,
    ) -> Result<(), ApiError>;

    /// Delete one image, general or variant.
    async fn delete_image(&self, image_id: &ImageId) -> Result<(), ApiError>;

    /// Upload an image for the product, optionally attached to a variant.
    async fn add_image(
        &self,
        product_id: &ProductId,
        image: &StagedBinary,
        variant_id: Option<&VariantId>,
    ) -> Result<UploadedImage, ApiError>;

    /// Update the given variant fields; unset fields keep their server value.
    async fn update_variant_fields(
        &self,
        variant_id: &VariantId,
        update: &VariantUpdate,
    ) -> Result<(), ApiError>;

    /// Delete a variant.
    async fn delete_variant(&self, variant_id: &VariantId) -> Result<(), ApiError>;

    /// Upload or replace the image of a variant.
    async fn set_variant_image(
        &self,
        variant_id: &VariantId,
        product_id: &ProductId,
        image: &StagedBinary,
    ) -> Result<UploadedImage, ApiError>;

    /// Create a variant together with its optional image.
    async fn create_variant(
        &self,
        product_id: &ProductId,
        variant: &NewVariant,
    ) -> Result<CreatedVariant, ApiError>;
}
