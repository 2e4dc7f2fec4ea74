//! CLI error type.

use std::path::PathBuf;

use chatshop_admin::AdminError;
use chatshop_admin::catalog::ApiError;
use chatshop_admin::draft::DraftError;
use chatshop_admin::reconcile::CommitFailure;
use chatshop_core::ProductId;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Admin(#[from] AdminError),

    /// A file named on the command line or in a script could not be read.
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid edit script: {0}")]
    Script(#[from] serde_yaml::Error),

    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// A script operation names something the product does not have.
    #[error("Edit script step {step}: {message}")]
    InvalidStep { step: usize, message: String },
}

impl From<ApiError> for CliError {
    fn from(e: ApiError) -> Self {
        Self::Admin(e.into())
    }
}

impl From<DraftError> for CliError {
    fn from(e: DraftError) -> Self {
        Self::Admin(e.into())
    }
}

impl From<CommitFailure> for CliError {
    fn from(e: CommitFailure) -> Self {
        Self::Admin(e.into())
    }
}
