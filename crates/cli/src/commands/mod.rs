//! CLI command implementations.

pub mod categories;
pub mod products;
pub mod script;
