//! Chatshop admin library.
//!
//! Edits a product of the chat-commerce catalog entirely in memory and
//! commits the accumulated changes to the catalog backend as one logical
//! save built from many independent REST calls.
//!
//! - [`catalog`] - the backend boundary ([`catalog::CatalogApi`]) and its
//!   REST client
//! - [`draft`] - product, variant and image edit buffers
//! - [`reconcile`] - edit sessions, commit planning and execution

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod draft;
pub mod error;
pub mod reconcile;

pub use config::AdminConfig;
pub use error::AdminError;
