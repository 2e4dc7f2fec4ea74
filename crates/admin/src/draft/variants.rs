//! Existing and new variant drafts.
//!
//! Nothing in this module contacts the backend. Operations addressed to an
//! id that is not in the set are no-ops that return `false`.

use chatshop_core::{Price, Product, Variant, VariantId, VariantOptions};
use tracing::debug;

use super::DraftError;
use super::asset::{AssetRef, StagedAsset};

/// Editable fields of one variant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariantFields {
    pub option_key: String,
    pub option_value: String,
    pub price: Option<Price>,
    pub stock: Option<u32>,
}

impl VariantFields {
    fn from_variant(variant: &Variant) -> Self {
        let (key, value) = variant.primary_option().unwrap_or_default();
        Self {
            option_key: key.to_string(),
            option_value: value.to_string(),
            price: variant.price,
            stock: variant.stock,
        }
    }

    /// The option as sent to the backend, when both parts are filled in.
    #[must_use]
    pub fn option(&self) -> Option<(&str, &str)> {
        let key = self.option_key.trim();
        let value = self.option_value.trim();
        (!key.is_empty() && !value.is_empty()).then_some((key, value))
    }

    #[must_use]
    pub fn options_map(&self) -> Option<VariantOptions> {
        self.option()
            .map(|(k, v)| VariantOptions::from([(k.to_string(), v.to_string())]))
    }
}

/// A partial edit of [`VariantFields`]. Unset parts leave the field as is.
///
/// ```
/// use chatshop_admin::draft::VariantPatch;
///
/// let patch = VariantPatch::new()
///     .option_value("Rojo")
///     .price_text("1200")
///     .unwrap();
/// assert!(!patch.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariantPatch {
    option_key: Option<String>,
    option_value: Option<String>,
    price: Option<Price>,
    stock: Option<u32>,
}

impl VariantPatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn option_key(mut self, key: impl Into<String>) -> Self {
        self.option_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn option_value(mut self, value: impl Into<String>) -> Self {
        self.option_value = Some(value.into());
        self
    }

    #[must_use]
    pub const fn price(mut self, price: Price) -> Self {
        self.price = Some(price);
        self
    }

    #[must_use]
    pub const fn stock(mut self, stock: u32) -> Self {
        self.stock = Some(stock);
        self
    }

    /// Set the price from operator input. Blank input leaves it unset.
    ///
    /// # Errors
    ///
    /// Returns [`DraftError::InvalidPrice`] if the text is not a
    /// non-negative number.
    pub fn price_text(mut self, text: &str) -> Result<Self, DraftError> {
        if !text.trim().is_empty() {
            self.price = Some(Price::parse(text)?);
        }
        Ok(self)
    }

    /// Set the stock from operator input. Blank input leaves it unset.
    ///
    /// # Errors
    ///
    /// Returns [`DraftError::InvalidStock`] if the text is not a
    /// non-negative whole number.
    pub fn stock_text(mut self, text: &str) -> Result<Self, DraftError> {
        if !text.trim().is_empty() {
            self.stock = Some(super::parse_stock(text)?);
        }
        Ok(self)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.option_key.is_none()
            && self.option_value.is_none()
            && self.price.is_none()
            && self.stock.is_none()
    }

    fn apply(&self, fields: &mut VariantFields) {
        if let Some(key) = &self.option_key {
            fields.option_key.clone_from(key);
        }
        if let Some(value) = &self.option_value {
            fields.option_value.clone_from(value);
        }
        if let Some(price) = self.price {
            fields.price = Some(price);
        }
        if let Some(stock) = self.stock {
            fields.stock = Some(stock);
        }
    }
}

/// Client-only correlation key for a new variant. Never sent to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocalId(u64);

impl std::fmt::Display for LocalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "new-{}", self.0)
    }
}

/// Draft of a variant the backend already stores.
#[derive(Debug)]
pub struct ExistingVariantDraft {
    remote_id: VariantId,
    original: VariantFields,
    fields: VariantFields,
    image: AssetRef,
    marked_for_delete: bool,
}

impl ExistingVariantDraft {
    #[must_use]
    pub const fn remote_id(&self) -> &VariantId {
        &self.remote_id
    }

    /// Field values as seeded.
    #[must_use]
    pub const fn original(&self) -> &VariantFields {
        &self.original
    }

    #[must_use]
    pub const fn fields(&self) -> &VariantFields {
        &self.fields
    }

    #[must_use]
    pub const fn image(&self) -> &AssetRef {
        &self.image
    }

    #[must_use]
    pub const fn is_marked_for_delete(&self) -> bool {
        self.marked_for_delete
    }
}

/// Draft of a variant that exists only in this session.
#[derive(Debug)]
pub struct NewVariantDraft {
    local_id: LocalId,
    fields: VariantFields,
    image: AssetRef,
}

impl NewVariantDraft {
    #[must_use]
    pub const fn local_id(&self) -> LocalId {
        self.local_id
    }

    #[must_use]
    pub const fn fields(&self) -> &VariantFields {
        &self.fields
    }

    #[must_use]
    pub const fn image(&self) -> &AssetRef {
        &self.image
    }

    /// Whether the draft will be created on commit.
    #[must_use]
    pub fn is_committable(&self) -> bool {
        self.fields.option().is_some()
    }
}

/// All variant drafts of one product.
#[derive(Debug, Default)]
pub struct VariantDraftSet {
    existing: Vec<ExistingVariantDraft>,
    new: Vec<NewVariantDraft>,
    next_local: u64,
}

impl VariantDraftSet {
    /// One existing draft per variant of `product`, with its image slot.
    #[must_use]
    pub fn seeded(product: &Product) -> Self {
        let existing = product
            .product_variants
            .iter()
            .map(|variant| {
                let fields = VariantFields::from_variant(variant);
                ExistingVariantDraft {
                    remote_id: variant.id.clone(),
                    original: fields.clone(),
                    fields,
                    image: AssetRef::seeded(product.variant_image(&variant.id)),
                    marked_for_delete: false,
                }
            })
            .collect();

        Self {
            existing,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn existing(&self) -> &[ExistingVariantDraft] {
        &self.existing
    }

    #[must_use]
    pub fn new_variants(&self) -> &[NewVariantDraft] {
        &self.new
    }

    #[must_use]
    pub fn get_existing(&self, id: &VariantId) -> Option<&ExistingVariantDraft> {
        self.existing.iter().find(|v| &v.remote_id == id)
    }

    #[must_use]
    pub fn get_new(&self, id: LocalId) -> Option<&NewVariantDraft> {
        self.new.iter().find(|v| v.local_id == id)
    }

    fn existing_mut(&mut self, id: &VariantId) -> Option<&mut ExistingVariantDraft> {
        let found = self.existing.iter_mut().find(|v| &v.remote_id == id);
        if found.is_none() {
            debug!(variant_id = %id, "No existing variant draft with this id");
        }
        found
    }

    fn new_mut(&mut self, id: LocalId) -> Option<&mut NewVariantDraft> {
        let found = self.new.iter_mut().find(|v| v.local_id == id);
        if found.is_none() {
            debug!(local_id = %id, "No new variant draft with this id");
        }
        found
    }

    /// Merge `patch` into an existing draft.
    pub fn patch_existing(&mut self, id: &VariantId, patch: &VariantPatch) -> bool {
        self.existing_mut(id).is_some_and(|v| {
            patch.apply(&mut v.fields);
            true
        })
    }

    /// Append a blank new variant.
    pub fn add_new(&mut self) -> LocalId {
        self.next_local += 1;
        let local_id = LocalId(self.next_local);
        self.new.push(NewVariantDraft {
            local_id,
            fields: VariantFields::default(),
            image: AssetRef::Empty,
        });
        local_id
    }

    pub fn patch_new(&mut self, id: LocalId, patch: &VariantPatch) -> bool {
        self.new_mut(id).is_some_and(|v| {
            patch.apply(&mut v.fields);
            true
        })
    }

    /// Drop a new variant. Its staged image preview is released.
    pub fn remove_new(&mut self, id: LocalId) -> bool {
        let before = self.new.len();
        self.new.retain(|v| v.local_id != id);
        let removed = self.new.len() != before;
        if !removed {
            debug!(local_id = %id, "No new variant draft with this id");
        }
        removed
    }

    /// Flag an existing variant for deletion. The entry stays in the set
    /// so the flag can be undone.
    pub fn mark_existing_deleted(&mut self, id: &VariantId) -> bool {
        self.existing_mut(id).is_some_and(|v| {
            v.marked_for_delete = true;
            true
        })
    }

    pub fn restore_existing(&mut self, id: &VariantId) -> bool {
        self.existing_mut(id).is_some_and(|v| {
            v.marked_for_delete = false;
            true
        })
    }

    pub fn stage_existing_image(&mut self, id: &VariantId, asset: StagedAsset) -> bool {
        self.existing_mut(id).is_some_and(|v| {
            v.image.stage(asset);
            true
        })
    }

    pub fn remove_existing_image(&mut self, id: &VariantId) -> bool {
        self.existing_mut(id).is_some_and(|v| {
            v.image.mark_removed();
            true
        })
    }

    pub fn restore_existing_image(&mut self, id: &VariantId) -> bool {
        self.existing_mut(id).is_some_and(|v| {
            v.image.restore();
            true
        })
    }

    pub fn stage_new_image(&mut self, id: LocalId, asset: StagedAsset) -> bool {
        self.new_mut(id).is_some_and(|v| {
            v.image.stage(asset);
            true
        })
    }

    pub fn remove_new_image(&mut self, id: LocalId) -> bool {
        self.new_mut(id).is_some_and(|v| {
            v.image.mark_removed();
            true
        })
    }

    /// Existing variants not flagged for deletion plus new variants.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.existing
            .iter()
            .filter(|v| !v.marked_for_delete)
            .count()
            + self.new.len()
    }
}
