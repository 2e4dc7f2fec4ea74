//! Category records and a read-only lookup index over them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::id::CategoryId;

/// A product category. Categories form a two-level tree through `parent_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parent_id: Option<CategoryId>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Lookup of category id to category, preserving backend order.
///
/// Used for rendering the category selector and for checking that a
/// category chosen in a draft actually exists.
#[derive(Debug, Clone, Default)]
pub struct CategoryIndex {
    categories: Vec<Category>,
    by_id: HashMap<CategoryId, usize>,
}

impl CategoryIndex {
    /// Build an index from the backend's category list.
    #[must_use]
    pub fn new(categories: Vec<Category>) -> Self {
        let by_id = categories
            .iter()
            .enumerate()
            .map(|(pos, cat)| (cat.id.clone(), pos))
            .collect();
        Self { categories, by_id }
    }

    #[must_use]
    pub fn get(&self, id: &CategoryId) -> Option<&Category> {
        self.by_id.get(id).and_then(|&pos| self.categories.get(pos))
    }

    #[must_use]
    pub fn contains(&self, id: &CategoryId) -> bool {
        self.by_id.contains_key(id)
    }

    /// Top-level categories (no parent).
    pub fn main_categories(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter().filter(|c| c.parent_id.is_none())
    }

    /// Direct children of `parent`.
    pub fn subcategories<'a>(
        &'a self,
        parent: &'a CategoryId,
    ) -> impl Iterator<Item = &'a Category> + 'a {
        self.categories
            .iter()
            .filter(move |c| c.parent_id.as_ref() == Some(parent))
    }

    /// Display path such as `Ropa / Camisetas`.
    ///
    /// A parent that is missing from the index is left out of the path.
    #[must_use]
    pub fn path(&self, id: &CategoryId) -> Option<String> {
        let category = self.get(id)?;
        match category.parent_id.as_ref().and_then(|p| self.get(p)) {
            Some(parent) => Some(format!("{} / {}", parent.name, category.name)),
            None => Some(category.name.clone()),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }
}
