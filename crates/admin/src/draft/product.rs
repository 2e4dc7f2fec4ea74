//! The product draft: the edit buffer of one session.

use chatshop_core::{CategoryId, CategoryIndex, ImageId, Price, Product, ProductId, VariantId};
use tracing::debug;

use super::DraftError;
use super::asset::{GeneralImages, PreviewRegistry, SlotChange, StagedId};
use super::variants::{LocalId, VariantDraftSet, VariantFields};
use crate::catalog::StagedBinary;

/// Scalar fields of a product.
///
/// Strings are kept as typed; a blank string means "not provided" and is
/// never sent to the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFields {
    pub name: String,
    pub description: String,
    pub price: Option<Price>,
    pub stock: Option<u32>,
    pub category_id: Option<CategoryId>,
}

impl ProductFields {
    fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone().unwrap_or_default(),
            price: product.price,
            stock: product.stock,
            category_id: product.category.as_ref().map(|c| c.id.clone()),
        }
    }
}

/// Pending changes to one product.
#[derive(Debug)]
pub struct ProductDraft {
    product_id: ProductId,
    original: ProductFields,
    fields: ProductFields,
    images: GeneralImages,
    variants: VariantDraftSet,
    previews: PreviewRegistry,
}

impl ProductDraft {
    /// Seed a draft from a persisted product.
    ///
    /// General images are the product images not attached to a variant.
    #[must_use]
    pub fn seed(product: &Product, previews: PreviewRegistry, max_general_images: usize) -> Self {
        let fields = ProductFields::from_product(product);
        Self {
            product_id: product.id.clone(),
            original: fields.clone(),
            fields,
            images: GeneralImages::seeded(product.general_images(), max_general_images),
            variants: VariantDraftSet::seeded(product),
            previews,
        }
    }

    #[must_use]
    pub const fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    #[must_use]
    pub const fn original(&self) -> &ProductFields {
        &self.original
    }

    #[must_use]
    pub const fn fields(&self) -> &ProductFields {
        &self.fields
    }

    // -------------------------------------------------------------------------
    // Scalar fields
    // -------------------------------------------------------------------------

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.fields.name = name.into();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.fields.description = description.into();
    }

    pub const fn set_price(&mut self, price: Option<Price>) {
        self.fields.price = price;
    }

    pub const fn set_stock(&mut self, stock: Option<u32>) {
        self.fields.stock = stock;
    }

    /// Set the price from operator input. Blank input clears it.
    ///
    /// # Errors
    ///
    /// Returns [`DraftError::InvalidPrice`] and leaves the field unchanged
    /// if the text is not a non-negative number.
    pub fn set_price_text(&mut self, text: &str) -> Result<(), DraftError> {
        self.fields.price = if text.trim().is_empty() {
            None
        } else {
            Some(Price::parse(text)?)
        };
        Ok(())
    }

    /// Set the stock from operator input. Blank input clears it.
    ///
    /// # Errors
    ///
    /// Returns [`DraftError::InvalidStock`] and leaves the field unchanged
    /// if the text is not a non-negative whole number.
    pub fn set_stock_text(&mut self, text: &str) -> Result<(), DraftError> {
        self.fields.stock = if text.trim().is_empty() {
            None
        } else {
            Some(super::parse_stock(text)?)
        };
        Ok(())
    }

    /// Choose a category. When `index` is given the id must exist in it.
    ///
    /// # Errors
    ///
    /// Returns [`DraftError::UnknownCategory`] if the id is not in `index`.
    pub fn set_category(
        &mut self,
        category_id: Option<CategoryId>,
        index: Option<&CategoryIndex>,
    ) -> Result<(), DraftError> {
        if let (Some(id), Some(index)) = (&category_id, index) {
            if !index.contains(id) {
                return Err(DraftError::UnknownCategory(id.clone()));
            }
        }
        self.fields.category_id = category_id;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // General images
    // -------------------------------------------------------------------------

    #[must_use]
    pub const fn images(&self) -> &GeneralImages {
        &self.images
    }

    pub fn remove_image(&mut self, id: &ImageId) -> bool {
        let removed = self.images.remove_image(id);
        if !removed {
            debug!(image_id = %id, "No general image with this id");
        }
        removed
    }

    pub fn restore_image(&mut self, id: &ImageId) -> bool {
        self.images.restore_image(id)
    }

    /// Stage a new general image. Returns `None` once the staging cap is
    /// reached.
    pub fn stage_image(&mut self, binary: StagedBinary) -> Option<StagedId> {
        if self.images.is_full() {
            debug!(file = binary.file_name(), "General image cap reached");
            return None;
        }
        self.images.stage(self.previews.stage(binary))
    }

    pub fn unstage_image(&mut self, id: StagedId) -> bool {
        self.images.unstage(id)
    }

    /// Stored images still shown plus staged uploads.
    #[must_use]
    pub fn visible_image_count(&self) -> usize {
        self.images.visible_count()
    }

    // -------------------------------------------------------------------------
    // Variants
    // -------------------------------------------------------------------------

    #[must_use]
    pub const fn variants(&self) -> &VariantDraftSet {
        &self.variants
    }

    pub const fn variants_mut(&mut self) -> &mut VariantDraftSet {
        &mut self.variants
    }

    pub fn stage_variant_image(&mut self, id: &VariantId, binary: StagedBinary) -> bool {
        let asset = self.previews.stage(binary);
        self.variants.stage_existing_image(id, asset)
    }

    pub fn stage_new_variant_image(&mut self, id: LocalId, binary: StagedBinary) -> bool {
        let asset = self.previews.stage(binary);
        self.variants.stage_new_image(id, asset)
    }

    /// Whether the product will still have variants after commit. Product
    /// price and stock are optional in that case.
    #[must_use]
    pub fn has_variants(&self) -> bool {
        self.variants.live_count() > 0
    }

    /// Immutable copy of the pending changes.
    ///
    /// Staged binaries are shared, not copied. Edits made to the draft
    /// afterwards do not affect the snapshot.
    #[must_use]
    pub fn snapshot(&self) -> FrozenDraft {
        FrozenDraft {
            product_id: self.product_id.clone(),
            original: self.original.clone(),
            fields: self.fields.clone(),
            removed_images: self.images.removed_ids(),
            staged_images: self.images.staged(),
            existing_variants: self
                .variants
                .existing()
                .iter()
                .map(|v| FrozenVariant {
                    remote_id: v.remote_id().clone(),
                    original: v.original().clone(),
                    fields: v.fields().clone(),
                    image: v.image().change(),
                    marked_for_delete: v.is_marked_for_delete(),
                })
                .collect(),
            new_variants: self
                .variants
                .new_variants()
                .iter()
                .map(|v| FrozenNewVariant {
                    local_id: v.local_id(),
                    fields: v.fields().clone(),
                    image: v.image().staged().map(|a| a.binary().clone()),
                })
                .collect(),
        }
    }
}

/// Snapshot of a [`ProductDraft`] taken for a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrozenDraft {
    pub product_id: ProductId,
    pub original: ProductFields,
    pub fields: ProductFields,
    pub removed_images: Vec<ImageId>,
    pub staged_images: Vec<StagedBinary>,
    pub existing_variants: Vec<FrozenVariant>,
    pub new_variants: Vec<FrozenNewVariant>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrozenVariant {
    pub remote_id: VariantId,
    pub original: VariantFields,
    pub fields: VariantFields,
    pub image: SlotChange,
    pub marked_for_delete: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrozenNewVariant {
    pub local_id: LocalId,
    pub fields: VariantFields,
    pub image: Option<StagedBinary>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chatshop_core::{Category, ImageRecord, Variant, VariantOptions};

    use super::*;
    use crate::draft::VariantPatch;

    fn category(id: &str, name: &str) -> Category {
        Category {
            id: CategoryId::new(id),
            name: name.to_string(),
            description: None,
            parent_id: None,
            image_url: None,
        }
    }

    fn product() -> Product {
        Product {
            id: ProductId::new("p1"),
            name: "Bolso".to_string(),
            description: Some("Cuero".to_string()),
            price: Some(Price::from_pesos(50_000)),
            stock: Some(2),
            product_variants: vec![Variant {
                id: VariantId::new("v1"),
                options: VariantOptions::from([("Color".to_string(), "Café".to_string())]),
                price: Some(Price::from_pesos(50_000)),
                stock: Some(2),
            }],
            product_images: vec![
                ImageRecord {
                    id: ImageId::new("g1"),
                    url: "https://cdn/g1.png".to_string(),
                    variant_id: None,
                },
                ImageRecord {
                    id: ImageId::new("v1-img"),
                    url: "https://cdn/v1.png".to_string(),
                    variant_id: Some(VariantId::new("v1")),
                },
            ],
            category: Some(category("c1", "Accesorios")),
        }
    }

    fn draft() -> ProductDraft {
        ProductDraft::seed(&product(), PreviewRegistry::new(), 10)
    }

    #[test]
    fn test_seed_copies_fields() {
        let draft = draft();
        assert_eq!(draft.fields(), draft.original());
        assert_eq!(draft.fields().description, "Cuero");
        assert_eq!(draft.fields().category_id, Some(CategoryId::new("c1")));
        // Only the general image, not the variant one
        assert_eq!(draft.visible_image_count(), 1);
        assert!(draft.has_variants());
    }

    #[test]
    fn test_invalid_text_leaves_field_unchanged() {
        let mut draft = draft();
        assert!(matches!(
            draft.set_price_text("mucho"),
            Err(DraftError::InvalidPrice(_))
        ));
        assert!(matches!(
            draft.set_stock_text("-2"),
            Err(DraftError::InvalidStock(_))
        ));
        assert_eq!(draft.fields().price, Some(Price::from_pesos(50_000)));
        assert_eq!(draft.fields().stock, Some(2));

        draft.set_price_text("").unwrap();
        assert_eq!(draft.fields().price, None);
    }

    #[test]
    fn test_set_category_checks_index() {
        let index = CategoryIndex::new(vec![category("c1", "Accesorios"), category("c2", "Ropa")]);
        let mut draft = draft();

        draft
            .set_category(Some(CategoryId::new("c2")), Some(&index))
            .unwrap();
        assert_eq!(draft.fields().category_id, Some(CategoryId::new("c2")));

        let err = draft
            .set_category(Some(CategoryId::new("c9")), Some(&index))
            .unwrap_err();
        assert!(matches!(err, DraftError::UnknownCategory(_)));
        assert_eq!(draft.fields().category_id, Some(CategoryId::new("c2")));

        // Without an index any id is accepted
        draft.set_category(Some(CategoryId::new("c9")), None).unwrap();
    }

    #[test]
    fn test_image_cap_from_seed() {
        let mut draft = ProductDraft::seed(&product(), PreviewRegistry::new(), 1);
        assert!(draft.stage_image(StagedBinary::new("a.png", vec![1_u8])).is_some());
        assert!(draft.stage_image(StagedBinary::new("b.png", vec![1_u8])).is_none());
        assert_eq!(draft.visible_image_count(), 2);
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_edits() {
        let mut draft = draft();
        draft.set_name("Bolso grande");
        let frozen = draft.snapshot();

        draft.set_name("Otro");
        draft.remove_image(&ImageId::new("g1"));

        assert_eq!(frozen.fields.name, "Bolso grande");
        assert!(frozen.removed_images.is_empty());
    }

    #[test]
    fn test_snapshot_captures_variant_changes() {
        let registry = PreviewRegistry::new();
        let mut draft = ProductDraft::seed(&product(), registry.clone(), 10);
        let v1 = VariantId::new("v1");
        draft
            .variants_mut()
            .patch_existing(&v1, &VariantPatch::new().stock(7));
        assert!(draft.stage_variant_image(&v1, StagedBinary::new("new.png", vec![1_u8])));

        let local = draft.variants_mut().add_new();
        assert!(draft.stage_new_variant_image(local, StagedBinary::new("n.png", vec![2_u8])));

        let frozen = draft.snapshot();
        assert_eq!(frozen.existing_variants[0].fields.stock, Some(7));
        assert!(matches!(frozen.existing_variants[0].image, SlotChange::Replace(_)));
        assert_eq!(frozen.new_variants.len(), 1);
        assert!(frozen.new_variants[0].image.is_some());

        assert_eq!(registry.live_count(), 2);
        drop(draft);
        assert_eq!(registry.live_count(), 0);
        // The snapshot still owns the bytes
        assert_eq!(frozen.new_variants[0].image.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn test_staging_for_unknown_variant_does_not_leak_preview() {
        let registry = PreviewRegistry::new();
        let mut draft = ProductDraft::seed(&product(), registry.clone(), 10);
        assert!(!draft.stage_variant_image(&VariantId::new("nope"), StagedBinary::new("x.png", vec![1_u8])));
        assert_eq!(registry.live_count(), 0);
    }
}
