//! Core types for Chatshop.
//!
//! This module provides type-safe wrappers for catalog concepts as the
//! backend reports them.

pub mod catalog;
pub mod category;
pub mod id;
pub mod inventory;
pub mod price;

pub use catalog::{ImageRecord, Product, Variant, VariantOptions};
pub use category::{Category, CategoryIndex};
pub use id::*;
pub use inventory::{InventorySummary, StockLevel, filter_products, thumbnail, total_stock};
pub use price::{Price, PriceError};
