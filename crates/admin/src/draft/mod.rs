//! In-memory edit buffers.
//!
//! A [`ProductDraft`] holds every pending change to one product: scalar
//! fields, the general image set and the [`VariantDraftSet`]. Mutating a
//! draft never performs I/O; the reconciliation engine works from a
//! [`FrozenDraft`] taken with [`ProductDraft::snapshot`].

mod asset;
mod product;
mod variants;

pub use asset::{
    AssetKind, AssetRef, GeneralImages, PersistedImage, PreviewRegistry, SlotChange, StagedAsset,
    StagedId,
};
pub use product::{FrozenDraft, FrozenNewVariant, FrozenVariant, ProductDraft, ProductFields};
pub use variants::{
    ExistingVariantDraft, LocalId, NewVariantDraft, VariantDraftSet, VariantFields, VariantPatch,
};

use chatshop_core::{CategoryId, PriceError};
use thiserror::Error;

/// Errors from coercing operator input into draft fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("Invalid price: {0}")]
    InvalidPrice(#[from] PriceError),

    #[error("Invalid stock: expected a whole number of units, got {0:?}")]
    InvalidStock(String),

    #[error("Unknown category: {0}")]
    UnknownCategory(CategoryId),
}

/// Parse a stock count from operator input.
fn parse_stock(text: &str) -> Result<u32, DraftError> {
    let trimmed = text.trim();
    trimmed
        .parse()
        .map_err(|_| DraftError::InvalidStock(trimmed.to_string()))
}
