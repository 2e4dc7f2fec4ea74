//! Chatshop Core - Shared catalog types.
//!
//! This crate provides the types shared by every Chatshop admin component:
//! - `admin` - Draft editing and reconciliation against the catalog backend
//! - `cli` - Command-line operator tools
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Type-safe remote IDs, prices, catalog records, the category
//!   index and inventory aggregation helpers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
