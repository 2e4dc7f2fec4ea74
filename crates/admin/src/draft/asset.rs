//! Image slots and staged-image previews.
//!
//! An [`AssetRef`] is the pending state of one image slot. Staging a binary
//! acquires a preview from the session's [`PreviewRegistry`]; the preview is
//! released when the staged asset is dropped, whether it was superseded,
//! unstaged, discarded with the draft, or consumed by a commit.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chatshop_core::{ImageId, ImageRecord};
use uuid::Uuid;

use crate::catalog::StagedBinary;

// =============================================================================
// Previews
// =============================================================================

/// Tracks the preview URLs currently handed out for staged binaries.
#[derive(Debug, Clone, Default)]
pub struct PreviewRegistry {
    live: Arc<Mutex<HashSet<Uuid>>>,
}

impl PreviewRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire a preview for `binary`.
    #[must_use]
    pub fn stage(&self, binary: StagedBinary) -> StagedAsset {
        let id = Uuid::new_v4();
        self.lock().insert(id);
        StagedAsset {
            binary,
            preview: PreviewHandle {
                id,
                url: format!("blob:chatshop/{id}"),
                registry: self.clone(),
            },
        }
    }

    /// Number of previews not yet released.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.lock().len()
    }

    /// Whether the preview with this id is still held.
    #[must_use]
    pub fn is_live(&self, id: StagedId) -> bool {
        self.lock().contains(&id.0)
    }

    fn release(&self, id: Uuid) {
        self.lock().remove(&id);
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<Uuid>> {
        self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Identifies one staged binary within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StagedId(Uuid);

impl std::fmt::Display for StagedId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Owned preview resource; released on drop.
#[derive(Debug)]
struct PreviewHandle {
    id: Uuid,
    url: String,
    registry: PreviewRegistry,
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.registry.release(self.id);
    }
}

/// A local binary waiting to be uploaded, with its preview.
#[derive(Debug)]
pub struct StagedAsset {
    binary: StagedBinary,
    preview: PreviewHandle,
}

impl StagedAsset {
    #[must_use]
    pub const fn id(&self) -> StagedId {
        StagedId(self.preview.id)
    }

    #[must_use]
    pub const fn binary(&self) -> &StagedBinary {
        &self.binary
    }

    /// Local URL for rendering the image before upload.
    #[must_use]
    pub fn preview_url(&self) -> &str {
        &self.preview.url
    }
}

// =============================================================================
// Slots
// =============================================================================

/// An image already stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedImage {
    pub id: ImageId,
    pub url: String,
}

impl From<&ImageRecord> for PersistedImage {
    fn from(record: &ImageRecord) -> Self {
        Self {
            id: record.id.clone(),
            url: record.url.clone(),
        }
    }
}

/// Discriminant of an [`AssetRef`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Empty,
    Persisted,
    Staged,
    Removed,
}

/// Pending state of one image slot.
///
/// A slot holds at most one current image. `Staged` remembers the
/// persisted image it replaced so the slot can be restored, and `Removed`
/// keeps the image so its id can be deleted at commit.
#[derive(Debug, Default)]
pub enum AssetRef {
    #[default]
    Empty,
    Persisted(PersistedImage),
    Staged {
        asset: StagedAsset,
        replaces: Option<PersistedImage>,
    },
    Removed(PersistedImage),
}

/// What committing a slot requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotChange {
    Unchanged,
    /// Delete the previously stored image.
    Remove(ImageId),
    /// Upload a binary in place of whatever the slot held.
    Replace(StagedBinary),
}

impl AssetRef {
    /// Slot seeded from a stored image, or empty.
    #[must_use]
    pub fn seeded(record: Option<&ImageRecord>) -> Self {
        record.map_or(Self::Empty, |r| Self::Persisted(r.into()))
    }

    /// Put a staged binary in the slot. A previously staged asset is
    /// dropped, releasing its preview.
    pub fn stage(&mut self, asset: StagedAsset) {
        let replaces = match std::mem::take(self) {
            Self::Empty => None,
            Self::Persisted(img) | Self::Removed(img) => Some(img),
            Self::Staged { replaces, .. } => replaces,
        };
        *self = Self::Staged { asset, replaces };
    }

    /// Remove the slot's current image.
    ///
    /// A persisted image becomes `Removed`. A staged binary is discarded;
    /// if it had replaced a persisted image, that image is marked removed
    /// too, otherwise the slot becomes empty.
    pub fn mark_removed(&mut self) {
        *self = match std::mem::take(self) {
            Self::Persisted(img) | Self::Removed(img) => Self::Removed(img),
            Self::Staged {
                replaces: Some(img),
                ..
            } => Self::Removed(img),
            Self::Staged { replaces: None, .. } | Self::Empty => Self::Empty,
        };
    }

    /// Undo every edit to the slot, returning it to its seeded state.
    pub fn restore(&mut self) {
        *self = match std::mem::take(self) {
            Self::Persisted(img)
            | Self::Removed(img)
            | Self::Staged {
                replaces: Some(img),
                ..
            } => Self::Persisted(img),
            Self::Staged { replaces: None, .. } | Self::Empty => Self::Empty,
        };
    }

    #[must_use]
    pub const fn kind(&self) -> AssetKind {
        match self {
            Self::Empty => AssetKind::Empty,
            Self::Persisted(_) => AssetKind::Persisted,
            Self::Staged { .. } => AssetKind::Staged,
            Self::Removed(_) => AssetKind::Removed,
        }
    }

    /// URL to render for the slot, if it shows an image.
    #[must_use]
    pub fn display_url(&self) -> Option<&str> {
        match self {
            Self::Persisted(img) => Some(&img.url),
            Self::Staged { asset, .. } => Some(asset.preview_url()),
            Self::Empty | Self::Removed(_) => None,
        }
    }

    #[must_use]
    pub const fn persisted(&self) -> Option<&PersistedImage> {
        match self {
            Self::Persisted(img) => Some(img),
            _ => None,
        }
    }

    #[must_use]
    pub const fn staged(&self) -> Option<&StagedAsset> {
        match self {
            Self::Staged { asset, .. } => Some(asset),
            _ => None,
        }
    }

    /// Whether the slot currently shows an image.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        matches!(self, Self::Persisted(_) | Self::Staged { .. })
    }

    #[must_use]
    pub fn change(&self) -> SlotChange {
        match self {
            Self::Removed(img) => SlotChange::Remove(img.id.clone()),
            Self::Staged { asset, .. } => SlotChange::Replace(asset.binary().clone()),
            Self::Empty | Self::Persisted(_) => SlotChange::Unchanged,
        }
    }
}

// =============================================================================
// General images
// =============================================================================

/// The product's general image set: stored images in backend order, then
/// staged uploads in the order they were added.
#[derive(Debug)]
pub struct GeneralImages {
    slots: Vec<AssetRef>,
    max_staged: usize,
}

impl GeneralImages {
    #[must_use]
    pub fn seeded<'a>(records: impl IntoIterator<Item = &'a ImageRecord>, max_staged: usize) -> Self {
        Self {
            slots: records
                .into_iter()
                .map(|r| AssetRef::Persisted(r.into()))
                .collect(),
            max_staged,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &AssetRef> {
        self.slots.iter()
    }

    /// Mark a stored image for deletion. Returns false for an unknown id.
    pub fn remove_image(&mut self, id: &ImageId) -> bool {
        self.find_persisted(id).is_some_and(|slot| {
            slot.mark_removed();
            true
        })
    }

    /// Undo [`remove_image`](Self::remove_image).
    pub fn restore_image(&mut self, id: &ImageId) -> bool {
        self.find_persisted(id).is_some_and(|slot| {
            slot.restore();
            true
        })
    }

    #[must_use]
    pub fn staged_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.kind() == AssetKind::Staged)
            .count()
    }

    /// Whether another upload can be staged.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.staged_count() >= self.max_staged
    }

    /// Add a staged upload. Rejected (and its preview released) once the
    /// cap is reached.
    pub fn stage(&mut self, asset: StagedAsset) -> Option<StagedId> {
        if self.is_full() {
            return None;
        }
        let id = asset.id();
        self.slots.push(AssetRef::Staged {
            asset,
            replaces: None,
        });
        Some(id)
    }

    /// Drop a staged upload. Returns false for an unknown id.
    pub fn unstage(&mut self, id: StagedId) -> bool {
        let before = self.slots.len();
        self.slots
            .retain(|slot| slot.staged().is_none_or(|asset| asset.id() != id));
        self.slots.len() != before
    }

    /// Ids of stored images marked for deletion.
    #[must_use]
    pub fn removed_ids(&self) -> Vec<ImageId> {
        self.slots
            .iter()
            .filter_map(|slot| match slot {
                AssetRef::Removed(img) => Some(img.id.clone()),
                _ => None,
            })
            .collect()
    }

    /// Binaries waiting to be uploaded, in staging order.
    #[must_use]
    pub fn staged(&self) -> Vec<StagedBinary> {
        self.slots
            .iter()
            .filter_map(|slot| slot.staged().map(|a| a.binary().clone()))
            .collect()
    }

    #[must_use]
    pub fn visible_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_visible()).count()
    }

    fn find_persisted(&mut self, id: &ImageId) -> Option<&mut AssetRef> {
        self.slots.iter_mut().find(|slot| match slot {
            AssetRef::Persisted(img) | AssetRef::Removed(img) => &img.id == id,
            _ => false,
        })
    }
}
