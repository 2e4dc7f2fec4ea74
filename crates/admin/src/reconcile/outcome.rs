//! Session states and commit results.

use std::fmt;

use chatshop_core::ProductId;
use thiserror::Error;
use uuid::Uuid;

use crate::catalog::ApiError;

/// Lifecycle of an edit session.
///
/// `Open -> Committing -> ClosedSuccess | ClosedPartialFailure`. Closed
/// sessions never reopen; retrying means seeding a new session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    Committing,
    ClosedSuccess,
    ClosedPartialFailure,
}

impl SessionState {
    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::ClosedSuccess | Self::ClosedPartialFailure)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Open => "open",
            Self::Committing => "committing",
            Self::ClosedSuccess => "closed (success)",
            Self::ClosedPartialFailure => "closed (partial failure)",
        };
        f.write_str(s)
    }
}

/// The five commit steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CommitStep {
    UpdateProduct,
    DeleteImages,
    UploadImages,
    ExistingVariants,
    CreateVariants,
}

impl fmt::Display for CommitStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::UpdateProduct => "update product",
            Self::DeleteImages => "delete images",
            Self::UploadImages => "upload images",
            Self::ExistingVariants => "update variants",
            Self::CreateVariants => "create variants",
        };
        f.write_str(s)
    }
}

/// One failed remote call.
#[derive(Debug, Error)]
#[error("{step} [{target}]: {error}")]
pub struct StepFailure {
    pub step: CommitStep,
    /// What the call was about, e.g. an image id or a file name.
    pub target: String,
    #[source]
    pub error: ApiError,
}

/// Every failure of a commit.
///
/// Independent calls keep running after a failure, so this can hold more
/// than one error. Never empty.
#[derive(Debug)]
pub struct CommitFailure {
    failures: Vec<StepFailure>,
}

impl CommitFailure {
    pub(crate) fn new(failures: Vec<StepFailure>) -> Option<Self> {
        (!failures.is_empty()).then_some(Self { failures })
    }

    /// The first failure, in step order.
    #[must_use]
    pub fn first(&self) -> Option<&StepFailure> {
        self.failures.first()
    }

    #[must_use]
    pub fn failures(&self) -> &[StepFailure] {
        &self.failures
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for CommitFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Saving failed for {} change(s); reload the product and retry the remaining edits",
            self.failures.len()
        )?;
        if let Some(first) = self.first() {
            write!(f, " (first error: {first})")?;
        }
        Ok(())
    }
}

impl std::error::Error for CommitFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.first().map(|f| f as &(dyn std::error::Error + 'static))
    }
}

/// Result of committing one edit session.
#[derive(Debug)]
pub struct CommitOutcome {
    pub(crate) session_id: Uuid,
    pub(crate) product_id: ProductId,
    pub(crate) calls_issued: usize,
    pub(crate) failure: Option<CommitFailure>,
}

impl CommitOutcome {
    #[must_use]
    pub const fn session_id(&self) -> Uuid {
        self.session_id
    }

    #[must_use]
    pub const fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.failure.is_none()
    }

    /// The terminal state of the session.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        if self.succeeded() {
            SessionState::ClosedSuccess
        } else {
            SessionState::ClosedPartialFailure
        }
    }

    /// Remote calls attempted, failed ones included.
    #[must_use]
    pub const fn calls_issued(&self) -> usize {
        self.calls_issued
    }

    #[must_use]
    pub fn calls_failed(&self) -> usize {
        self.failure.as_ref().map_or(0, CommitFailure::len)
    }

    #[must_use]
    pub const fn failure(&self) -> Option<&CommitFailure> {
        self.failure.as_ref()
    }

    /// Convert into a `Result`.
    ///
    /// # Errors
    ///
    /// Returns the aggregated [`CommitFailure`] if any call failed.
    pub fn into_result(self) -> Result<(), CommitFailure> {
        self.failure.map_or(Ok(()), Err)
    }
}
