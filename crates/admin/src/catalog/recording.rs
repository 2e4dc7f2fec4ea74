//! In-memory catalog backend that records every call.
//!
//! Calls are applied to an in-memory product list so a re-fetch after a
//! commit reflects the effect, and individual calls can be made to fail.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chatshop_core::{
    Category, ImageId, ImageRecord, Price, Product, ProductId, Variant, VariantId, VariantOptions,
};

use super::types::{
    CreatedVariant, NewVariant, ProductUpdate, StagedBinary, UploadedImage, VariantUpdate,
};
use super::{ApiError, CatalogApi};

/// One call received by [`RecordingCatalog`], in issue order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    ListProducts,
    ListCategories,
    UpdateProductFields {
        product_id: ProductId,
        update: ProductUpdate,
    },
    DeleteImage {
        image_id: ImageId,
    },
    AddImage {
        product_id: ProductId,
        file_name: String,
        variant_id: Option<VariantId>,
    },
    UpdateVariantFields {
        variant_id: VariantId,
        update: VariantUpdate,
    },
    DeleteVariant {
        variant_id: VariantId,
    },
    SetVariantImage {
        variant_id: VariantId,
        product_id: ProductId,
        file_name: String,
    },
    CreateVariant {
        product_id: ProductId,
        option_key: String,
        option_value: String,
        price: Price,
        stock: u32,
        file_name: Option<String>,
    },
}

impl ApiCall {
    /// Whether the call writes to the backend.
    #[must_use]
    pub const fn is_mutation(&self) -> bool {
        !matches!(self, Self::ListProducts | Self::ListCategories)
    }
}

type FailureRule = Box<dyn Fn(&ApiCall) -> bool + Send + Sync>;

/// In-memory [`CatalogApi`] for tests.
#[derive(Default)]
pub struct RecordingCatalog {
    products: Mutex<Vec<Product>>,
    categories: Mutex<Vec<Category>>,
    calls: Mutex<Vec<ApiCall>>,
    failures: Mutex<Vec<FailureRule>>,
    next_id: AtomicU64,
}

impl std::fmt::Debug for RecordingCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingCatalog")
            .field("products", &lock(&self.products).len())
            .field("calls", &lock(&self.calls).len())
            .finish_non_exhaustive()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RecordingCatalog {
    #[must_use]
    pub fn new(products: Vec<Product>, categories: Vec<Category>) -> Self {
        Self {
            products: Mutex::new(products),
            categories: Mutex::new(categories),
            ..Self::default()
        }
    }

    /// Make every call matching `rule` fail with a 500 after being recorded.
    pub fn fail_when(&self, rule: impl Fn(&ApiCall) -> bool + Send + Sync + 'static) {
        lock(&self.failures).push(Box::new(rule));
    }

    /// Every call received so far.
    #[must_use]
    pub fn calls(&self) -> Vec<ApiCall> {
        lock(&self.calls).clone()
    }

    /// Calls that write to the backend, ignoring listings.
    #[must_use]
    pub fn mutations(&self) -> Vec<ApiCall> {
        lock(&self.calls)
            .iter()
            .filter(|c| c.is_mutation())
            .cloned()
            .collect()
    }

    /// Current state of one product.
    #[must_use]
    pub fn product(&self, id: &ProductId) -> Option<Product> {
        lock(&self.products).iter().find(|p| &p.id == id).cloned()
    }

    fn fresh_id(&self, prefix: &str) -> String {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{prefix}-{n}")
    }

    /// Record the call, then report a failure if a rule matches.
    fn record(&self, call: ApiCall) -> Result<(), ApiError> {
        let failing = lock(&self.failures).iter().any(|rule| rule(&call));
        let label = format!("{call:?}");
        lock(&self.calls).push(call);
        if failing {
            return Err(ApiError::Api {
                status: 500,
                message: format!("injected failure for {label}"),
            });
        }
        Ok(())
    }

    fn with_product<T>(
        &self,
        id: &ProductId,
        f: impl FnOnce(&mut Product) -> T,
    ) -> Result<T, ApiError> {
        let mut products = lock(&self.products);
        let product = products
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| ApiError::NotFound(format!("product {id}")))?;
        Ok(f(product))
    }

    fn with_variant_owner<T>(
        &self,
        variant_id: &VariantId,
        f: impl FnOnce(&mut Product) -> T,
    ) -> Result<T, ApiError> {
        let mut products = lock(&self.products);
        let product = products
            .iter_mut()
            .find(|p| p.product_variants.iter().any(|v| &v.id == variant_id))
            .ok_or_else(|| ApiError::NotFound(format!("variant {variant_id}")))?;
        Ok(f(product))
    }
}

#[async_trait]
impl CatalogApi for RecordingCatalog {
    async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        self.record(ApiCall::ListProducts)?;
        Ok(lock(&self.products).clone())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        self.record(ApiCall::ListCategories)?;
        Ok(lock(&self.categories).clone())
    }

    async fn update_product_fields(
        &self,
        product_id: &ProductId,
        update: &ProductUpdate,
    ) -> Result<(), ApiError> {
        self.record(ApiCall::UpdateProductFields {
            product_id: product_id.clone(),
            update: update.clone(),
        })?;
        let category = update.category_id.as_ref().and_then(|id| {
            lock(&self.categories)
                .iter()
                .find(|c| &c.id == id)
                .cloned()
        });
        self.with_product(product_id, |p| {
            if let Some(name) = &update.name {
                p.name.clone_from(name);
            }
            if let Some(description) = &update.description {
                p.description = Some(description.clone());
            }
            if let Some(price) = update.price {
                p.price = Some(price);
            }
            if let Some(stock) = update.stock {
                p.stock = Some(stock);
            }
            if category.is_some() {
                p.category = category;
            }
        })
    }

    async fn delete_image(&self, image_id: &ImageId) -> Result<(), ApiError> {
        self.record(ApiCall::DeleteImage {
            image_id: image_id.clone(),
        })?;
        let mut products = lock(&self.products);
        let removed = products.iter_mut().any(|p| {
            let before = p.product_images.len();
            p.product_images.retain(|img| &img.id != image_id);
            p.product_images.len() != before
        });
        if removed {
            Ok(())
        } else {
            Err(ApiError::NotFound(format!("image {image_id}")))
        }
    }

    async fn add_image(
        &self,
        product_id: &ProductId,
        image: &StagedBinary,
        variant_id: Option<&VariantId>,
    ) -> Result<UploadedImage, ApiError> {
        self.record(ApiCall::AddImage {
            product_id: product_id.clone(),
            file_name: image.file_name().to_string(),
            variant_id: variant_id.cloned(),
        })?;
        let id = ImageId::new(self.fresh_id("img"));
        let url = format!("memory://{id}/{}", image.file_name());
        self.with_product(product_id, |p| {
            p.product_images.push(ImageRecord {
                id: id.clone(),
                url: url.clone(),
                variant_id: variant_id.cloned(),
            });
        })?;
        Ok(UploadedImage { id: Some(id), url })
    }

    async fn update_variant_fields(
        &self,
        variant_id: &VariantId,
        update: &VariantUpdate,
    ) -> Result<(), ApiError> {
        self.record(ApiCall::UpdateVariantFields {
            variant_id: variant_id.clone(),
            update: update.clone(),
        })?;
        self.with_variant_owner(variant_id, |p| {
            if let Some(v) = p.product_variants.iter_mut().find(|v| &v.id == variant_id) {
                if let Some(options) = &update.options {
                    v.options.clone_from(options);
                }
                if let Some(price) = update.price {
                    v.price = Some(price);
                }
                if let Some(stock) = update.stock {
                    v.stock = Some(stock);
                }
            }
        })
    }

    async fn delete_variant(&self, variant_id: &VariantId) -> Result<(), ApiError> {
        self.record(ApiCall::DeleteVariant {
            variant_id: variant_id.clone(),
        })?;
        self.with_variant_owner(variant_id, |p| {
            p.product_variants.retain(|v| &v.id != variant_id);
            p.product_images
                .retain(|img| img.variant_id.as_ref() != Some(variant_id));
        })
    }

    async fn set_variant_image(
        &self,
        variant_id: &VariantId,
        product_id: &ProductId,
        image: &StagedBinary,
    ) -> Result<UploadedImage, ApiError> {
        self.record(ApiCall::SetVariantImage {
            variant_id: variant_id.clone(),
            product_id: product_id.clone(),
            file_name: image.file_name().to_string(),
        })?;
        let id = ImageId::new(self.fresh_id("img"));
        let url = format!("memory://{id}/{}", image.file_name());
        self.with_product(product_id, |p| {
            p.product_images
                .retain(|img| img.variant_id.as_ref() != Some(variant_id));
            p.product_images.push(ImageRecord {
                id: id.clone(),
                url: url.clone(),
                variant_id: Some(variant_id.clone()),
            });
        })?;
        Ok(UploadedImage { id: Some(id), url })
    }

    async fn create_variant(
        &self,
        product_id: &ProductId,
        variant: &NewVariant,
    ) -> Result<CreatedVariant, ApiError> {
        self.record(ApiCall::CreateVariant {
            product_id: product_id.clone(),
            option_key: variant.option_key.clone(),
            option_value: variant.option_value.clone(),
            price: variant.price,
            stock: variant.stock,
            file_name: variant.image.as_ref().map(|i| i.file_name().to_string()),
        })?;
        let id = VariantId::new(self.fresh_id("var"));
        let image = variant.image.as_ref().map(|img| ImageRecord {
            id: ImageId::new(self.fresh_id("img")),
            url: format!("memory://{}", img.file_name()),
            variant_id: Some(id.clone()),
        });
        let image_url = image.as_ref().map(|i| i.url.clone());
        self.with_product(product_id, |p| {
            p.product_variants.push(Variant {
                id: id.clone(),
                options: VariantOptions::from([(
                    variant.option_key.clone(),
                    variant.option_value.clone(),
                )]),
                price: Some(variant.price),
                stock: Some(variant.stock),
            });
            p.product_images.extend(image);
        })?;
        Ok(CreatedVariant { id, image_url })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn product() -> Product {
        Product {
            id: ProductId::new("p1"),
            name: "Taza".to_string(),
            description: None,
            price: Some(Price::from_pesos(900)),
            stock: Some(3),
            product_variants: vec![Variant {
                id: VariantId::new("v1"),
                options: VariantOptions::from([("Color".to_string(), "Blanco".to_string())]),
                price: Some(Price::from_pesos(900)),
                stock: Some(3),
            }],
            product_images: vec![ImageRecord {
                id: ImageId::new("i1"),
                url: "https://cdn/i1.png".to_string(),
                variant_id: None,
            }],
            category: None,
        }
    }

    #[tokio::test]
    async fn test_records_calls_in_order() {
        let catalog = RecordingCatalog::new(vec![product()], vec![]);
        catalog.list_products().await.unwrap();
        catalog.delete_image(&ImageId::new("i1")).await.unwrap();

        assert_eq!(
            catalog.calls(),
            vec![
                ApiCall::ListProducts,
                ApiCall::DeleteImage {
                    image_id: ImageId::new("i1")
                }
            ]
        );
        assert_eq!(catalog.mutations().len(), 1);
    }

    #[tokio::test]
    async fn test_failure_rule_still_records_call() {
        let catalog = RecordingCatalog::new(vec![product()], vec![]);
        catalog.fail_when(|call| matches!(call, ApiCall::DeleteVariant { .. }));

        let result = catalog.delete_variant(&VariantId::new("v1")).await;
        assert!(matches!(result, Err(ApiError::Api { status: 500, .. })));
        assert_eq!(catalog.calls().len(), 1);
        // Failed call leaves state untouched
        assert_eq!(
            catalog
                .product(&ProductId::new("p1"))
                .unwrap()
                .product_variants
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_create_variant_applies_to_product() {
        let catalog = RecordingCatalog::new(vec![product()], vec![]);
        let created = catalog
            .create_variant(
                &ProductId::new("p1"),
                &NewVariant {
                    option_key: "Color".to_string(),
                    option_value: "Negro".to_string(),
                    price: Price::from_pesos(950),
                    stock: 2,
                    image: Some(StagedBinary::new("negro.png", vec![1_u8])),
                },
            )
            .await
            .unwrap();

        let stored = catalog.product(&ProductId::new("p1")).unwrap();
        assert_eq!(stored.product_variants.len(), 2);
        assert!(stored.variant_image(&created.id).is_some());
        assert!(created.image_url.is_some());
    }

    #[tokio::test]
    async fn test_delete_unknown_image_is_not_found() {
        let catalog = RecordingCatalog::new(vec![product()], vec![]);
        let result = catalog.delete_image(&ImageId::new("nope")).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_set_variant_image_replaces_previous() {
        let catalog = RecordingCatalog::new(vec![product()], vec![]);
        let variant = VariantId::new("v1");
        let product_id = ProductId::new("p1");

        catalog
            .set_variant_image(&variant, &product_id, &StagedBinary::new("a.png", vec![1_u8]))
            .await
            .unwrap();
        catalog
            .set_variant_image(&variant, &product_id, &StagedBinary::new("b.png", vec![2_u8]))
            .await
            .unwrap();

        let stored = catalog.product(&product_id).unwrap();
        let variant_images: Vec<_> = stored
            .product_images
            .iter()
            .filter(|i| i.variant_id.as_ref() == Some(&variant))
            .collect();
        assert_eq!(variant_images.len(), 1);
        assert!(variant_images[0].url.ends_with("b.png"));
    }
}
