//! Catalog records as returned by the backend's product listing.
//!
//! These are persisted, authoritative snapshots. Editing happens on a draft
//! built from one of them; nothing here is ever mutated locally.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::category::Category;
use super::id::{ImageId, ProductId, VariantId};
use super::price::Price;

/// A product with its variants and images.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Top-level price. Only meaningful when the product has no variants.
    #[serde(default)]
    pub price: Option<Price>,
    /// Top-level stock. Only meaningful when the product has no variants.
    #[serde(default)]
    pub stock: Option<u32>,
    #[serde(default)]
    pub product_variants: Vec<Variant>,
    /// All images of the product, general and per-variant.
    #[serde(default)]
    pub product_images: Vec<ImageRecord>,
    #[serde(default)]
    pub category: Option<Category>,
}

impl Product {
    /// Images not attached to any variant, in backend order.
    pub fn general_images(&self) -> impl Iterator<Item = &ImageRecord> {
        self.product_images
            .iter()
            .filter(|img| img.variant_id.is_none())
    }

    /// The image shown for a variant: the first one attached to it.
    #[must_use]
    pub fn variant_image(&self, variant_id: &VariantId) -> Option<&ImageRecord> {
        self.product_images
            .iter()
            .find(|img| img.variant_id.as_ref() == Some(variant_id))
    }
}

/// Option name to option value, in the order the backend lists them.
pub type VariantOptions = IndexMap<String, String>;

/// A purchasable variant of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub id: VariantId,
    /// Option name to option value, e.g. `{"Color": "Red"}`.
    #[serde(default)]
    pub options: VariantOptions,
    #[serde(default)]
    pub price: Option<Price>,
    #[serde(default)]
    pub stock: Option<u32>,
}

impl Variant {
    /// The first option pair as listed by the backend. The admin edits a
    /// single option per variant.
    #[must_use]
    pub fn primary_option(&self) -> Option<(&str, &str)> {
        self.options
            .iter()
            .next()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

/// A stored image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: ImageId,
    pub url: String,
    /// The variant the image belongs to, if any.
    #[serde(default)]
    pub variant_id: Option<VariantId>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_json() -> &'static str {
        r#"{
            "id": "p1",
            "name": "Camiseta",
            "description": null,
            "price": 1000,
            "stock": 4,
            "product_variants": [
                {"id": "v1", "options": {"Color": "Rojo"}, "price": 1000, "stock": 2},
                {"id": "v2", "options": {"Color": "Azul"}, "price": 1100, "stock": 0}
            ],
            "product_images": [
                {"id": "i1", "url": "https://cdn.test/i1.png", "variant_id": null},
                {"id": "i2", "url": "https://cdn.test/i2.png", "variant_id": "v2"},
                {"id": "i3", "url": "https://cdn.test/i3.png"}
            ],
            "category": {"id": "c1", "name": "Ropa"}
        }"#
    }

    #[test]
    fn test_deserialize_backend_product() {
        let product: Product = serde_json::from_str(sample_json()).unwrap();
        assert_eq!(product.id.as_str(), "p1");
        assert_eq!(product.price, Some(Price::from_pesos(1000)));
        assert_eq!(product.product_variants.len(), 2);
        assert_eq!(product.category.unwrap().name, "Ropa");
    }

    #[test]
    fn test_primary_option_follows_backend_order() {
        let variant: Variant = serde_json::from_str(
            r#"{"id": "v9", "options": {"Talla": "M", "Color": "Rojo"}, "price": 1000}"#,
        )
        .unwrap();
        assert_eq!(variant.primary_option(), Some(("Talla", "M")));
        assert_eq!(
            serde_json::to_string(&variant.options).unwrap(),
            r#"{"Talla":"M","Color":"Rojo"}"#
        );
    }

    #[test]
    fn test_deserialize_minimal_product() {
        let product: Product = serde_json::from_str(r#"{"id": "p2", "name": "Gorra"}"#).unwrap();
        assert!(product.product_variants.is_empty());
        assert!(product.product_images.is_empty());
        assert_eq!(product.stock, None);
    }

    #[test]
    fn test_general_images_skip_variant_images() {
        let product: Product = serde_json::from_str(sample_json()).unwrap();
        let ids: Vec<_> = product.general_images().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["i1", "i3"]);
    }

    #[test]
    fn test_variant_image_lookup() {
        let product: Product = serde_json::from_str(sample_json()).unwrap();
        let img = product.variant_image(&VariantId::new("v2")).unwrap();
        assert_eq!(img.id.as_str(), "i2");
        assert!(product.variant_image(&VariantId::new("v1")).is_none());
    }

    #[test]
    fn test_primary_option() {
        let product: Product = serde_json::from_str(sample_json()).unwrap();
        let variant = product.product_variants.first().unwrap();
        assert_eq!(variant.primary_option(), Some(("Color", "Rojo")));
    }
}
