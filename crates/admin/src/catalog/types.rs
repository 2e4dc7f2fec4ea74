//! Request and response shapes for the catalog backend.

use std::path::Path;
use std::sync::Arc;

use chatshop_core::{CategoryId, ImageId, Price, VariantId, VariantOptions};
use serde::{Deserialize, Serialize};

/// An image selected locally and not yet uploaded.
///
/// The bytes are shared, so cloning a staged binary into a frozen draft or
/// a commit plan never copies the file contents.
#[derive(Clone, PartialEq, Eq)]
pub struct StagedBinary {
    file_name: String,
    content_type: String,
    bytes: Arc<[u8]>,
}

impl std::fmt::Debug for StagedBinary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StagedBinary")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl StagedBinary {
    /// Wrap in-memory bytes. The content type is guessed from the file name.
    #[must_use]
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        let file_name = file_name.into();
        let content_type = mime_guess::from_path(&file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Self {
            file_name,
            content_type,
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file cannot be read.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map_or_else(|| "upload".to_string(), |n| n.to_string_lossy().into_owned());
        Ok(Self::new(file_name, bytes))
    }

    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Partial update of a product's scalar fields.
///
/// All fields are optional - only provided fields are sent, so the backend
/// keeps its current value for everything else.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProductUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
}

impl ProductUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.stock.is_none()
            && self.category_id.is_none()
    }
}

/// Partial update of a variant. Same omit-if-unset rule as [`ProductUpdate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VariantUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<VariantOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
}

impl VariantUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.options.is_none() && self.price.is_none() && self.stock.is_none()
    }
}

/// A variant to create, with its optional image, sent as one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVariant {
    pub option_key: String,
    pub option_value: String,
    pub price: Price,
    pub stock: u32,
    pub image: Option<StagedBinary>,
}

/// Response to an image upload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadedImage {
    #[serde(default)]
    pub id: Option<ImageId>,
    pub url: String,
}

/// Response to a variant creation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedVariant {
    pub id: VariantId,
    #[serde(default)]
    pub image_url: Option<String>,
}
