//! Inventory aggregation over persisted products.
//!
//! Everything here derives from backend data only; drafts never feed into
//! these numbers.

use serde::Serialize;

use super::catalog::{ImageRecord, Product};

/// Stock below this is reported as [`StockLevel::Low`].
pub const LOW_STOCK_THRESHOLD: u64 = 5;

/// Total units available for a product.
///
/// Sums the variant stock when the product has variants, otherwise falls
/// back to the product's own stock.
#[must_use]
pub fn total_stock(product: &Product) -> u64 {
    if product.product_variants.is_empty() {
        return product.stock.map_or(0, u64::from);
    }
    product
        .product_variants
        .iter()
        .map(|v| v.stock.map_or(0, u64::from))
        .sum()
}

/// Coarse stock classification used for list badges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StockLevel {
    Out,
    Low,
    Healthy,
}

impl StockLevel {
    #[must_use]
    pub const fn from_units(units: u64) -> Self {
        if units == 0 {
            Self::Out
        } else if units < LOW_STOCK_THRESHOLD {
            Self::Low
        } else {
            Self::Healthy
        }
    }

    #[must_use]
    pub fn of(product: &Product) -> Self {
        Self::from_units(total_stock(product))
    }
}

impl std::fmt::Display for StockLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Out => write!(f, "out"),
            Self::Low => write!(f, "low"),
            Self::Healthy => write!(f, "ok"),
        }
    }
}

/// Header counts for the inventory list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InventorySummary {
    pub total: usize,
    pub in_stock: usize,
    pub out_of_stock: usize,
}

impl InventorySummary {
    #[must_use]
    pub fn from_products(products: &[Product]) -> Self {
        products.iter().fold(Self::default(), |mut acc, product| {
            acc.total += 1;
            if total_stock(product) > 0 {
                acc.in_stock += 1;
            } else {
                acc.out_of_stock += 1;
            }
            acc
        })
    }
}

/// The list thumbnail: first general image, else any image.
#[must_use]
pub fn thumbnail(product: &Product) -> Option<&ImageRecord> {
    product
        .general_images()
        .next()
        .or_else(|| product.product_images.first())
}

/// Case-insensitive search on product name or category name.
///
/// An empty query matches everything.
#[must_use]
pub fn filter_products<'a>(products: &'a [Product], query: &str) -> Vec<&'a Product> {
    let needle = query.trim().to_lowercase();
    products
        .iter()
        .filter(|p| {
            needle.is_empty()
                || p.name.to_lowercase().contains(&needle)
                || p.category
                    .as_ref()
                    .is_some_and(|c| c.name.to_lowercase().contains(&needle))
        })
        .collect()
}
