//! Diffing a frozen draft into the remote calls it implies.

use chatshop_core::{ImageId, Price, ProductId, VariantId};

use crate::catalog::{NewVariant, ProductUpdate, StagedBinary, VariantUpdate};
use crate::draft::{FrozenDraft, FrozenVariant, ProductFields, SlotChange, VariantFields};

/// Every remote call a commit will issue, grouped by step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitPlan {
    pub product_id: ProductId,
    /// Step 1
    pub product_update: Option<ProductUpdate>,
    /// Step 2
    pub image_deletions: Vec<ImageId>,
    /// Step 3
    pub image_uploads: Vec<StagedBinary>,
    /// Step 4
    pub variant_changes: Vec<VariantChange>,
    /// Step 5
    pub variant_creations: Vec<NewVariant>,
}

/// Calls for one existing variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantChange {
    pub variant_id: VariantId,
    pub action: VariantAction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariantAction {
    /// Delete the variant; nothing else is sent for it.
    Delete,
    /// Issued in order: field update, image delete, image upload.
    Modify {
        update: Option<VariantUpdate>,
        delete_image: Option<ImageId>,
        set_image: Option<StagedBinary>,
    },
}

impl VariantAction {
    #[must_use]
    pub fn call_count(&self) -> usize {
        match self {
            Self::Delete => 1,
            Self::Modify {
                update,
                delete_image,
                set_image,
            } => {
                usize::from(update.is_some())
                    + usize::from(delete_image.is_some())
                    + usize::from(set_image.is_some())
            }
        }
    }
}

impl CommitPlan {
    /// Compute the plan for `draft`.
    ///
    /// A field is sent only when it is provided and differs from the seeded
    /// value, so a draft whose fields were set and then reverted produces
    /// no calls.
    #[must_use]
    pub fn from_draft(draft: &FrozenDraft) -> Self {
        Self {
            product_id: draft.product_id.clone(),
            product_update: product_update(&draft.original, &draft.fields),
            image_deletions: draft.removed_images.clone(),
            image_uploads: draft.staged_images.clone(),
            variant_changes: draft
                .existing_variants
                .iter()
                .filter_map(variant_change)
                .collect(),
            variant_creations: draft
                .new_variants
                .iter()
                .filter_map(|v| {
                    let (key, value) = v.fields.option()?;
                    Some(NewVariant {
                        option_key: key.to_string(),
                        option_value: value.to_string(),
                        price: v.fields.price.unwrap_or(Price::ZERO),
                        stock: v.fields.stock.unwrap_or(0),
                        image: v.image.clone(),
                    })
                })
                .collect(),
        }
    }

    /// Total number of remote calls.
    #[must_use]
    pub fn call_count(&self) -> usize {
        usize::from(self.product_update.is_some())
            + self.image_deletions.len()
            + self.image_uploads.len()
            + self
                .variant_changes
                .iter()
                .map(|c| c.action.call_count())
                .sum::<usize>()
            + self.variant_creations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.call_count() == 0
    }
}

/// Text value to send: trimmed, non-blank and changed.
fn changed_text(original: &str, current: &str) -> Option<String> {
    let current = current.trim();
    (!current.is_empty() && current != original.trim()).then(|| current.to_string())
}

fn changed<T: PartialEq + Clone>(original: Option<&T>, current: Option<&T>) -> Option<T> {
    current.filter(|c| Some(*c) != original).cloned()
}

fn product_update(original: &ProductFields, fields: &ProductFields) -> Option<ProductUpdate> {
    let update = ProductUpdate {
        name: changed_text(&original.name, &fields.name),
        description: changed_text(&original.description, &fields.description),
        price: changed(original.price.as_ref(), fields.price.as_ref()),
        stock: changed(original.stock.as_ref(), fields.stock.as_ref()),
        category_id: changed(original.category_id.as_ref(), fields.category_id.as_ref()),
    };
    (!update.is_empty()).then_some(update)
}

fn variant_update(original: &VariantFields, fields: &VariantFields) -> Option<VariantUpdate> {
    let options = fields
        .options_map()
        .filter(|_| fields.option() != original.option());
    let update = VariantUpdate {
        options,
        price: changed(original.price.as_ref(), fields.price.as_ref()),
        stock: changed(original.stock.as_ref(), fields.stock.as_ref()),
    };
    (!update.is_empty()).then_some(update)
}

fn variant_change(variant: &FrozenVariant) -> Option<VariantChange> {
    let action = if variant.marked_for_delete {
        VariantAction::Delete
    } else {
        let (delete_image, set_image) = match &variant.image {
            SlotChange::Unchanged => (None, None),
            SlotChange::Remove(id) => (Some(id.clone()), None),
            SlotChange::Replace(binary) => (None, Some(binary.clone())),
        };
        let action = VariantAction::Modify {
            update: variant_update(&variant.original, &variant.fields),
            delete_image,
            set_image,
        };
        if action.call_count() == 0 {
            return None;
        }
        action
    };

    Some(VariantChange {
        variant_id: variant.remote_id.clone(),
        action,
    })
}
