//! Unified error handling for the admin library.

use thiserror::Error;

use crate::catalog::ApiError;
use crate::config::ConfigError;
use crate::draft::DraftError;
use crate::reconcile::CommitFailure;

/// Any error surfaced by the admin library.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A backend call outside a commit failed.
    #[error("Catalog error: {0}")]
    Api(#[from] ApiError),

    /// Operator input could not be applied to a draft.
    #[error("Draft error: {0}")]
    Draft(#[from] DraftError),

    /// A commit closed with failed calls.
    #[error(transparent)]
    Commit(#[from] CommitFailure),
}

impl AdminError {
    /// Whether the error came from the backend, as opposed to local input.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Api(_) | Self::Commit(_))
    }
}
