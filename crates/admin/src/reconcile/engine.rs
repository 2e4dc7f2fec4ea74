//! Executing commit plans against the catalog backend.

use chrono::{DateTime, Utc};
use chatshop_core::Product;
use futures::future::join_all;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::outcome::{CommitFailure, CommitOutcome, CommitStep, SessionState, StepFailure};
use super::plan::{CommitPlan, VariantAction, VariantChange};
use crate::catalog::{ApiError, CatalogApi};
use crate::config::AdminConfig;
use crate::draft::{FrozenDraft, PreviewRegistry, ProductDraft};

const DEFAULT_MAX_GENERAL_IMAGES: usize = 10;

/// One operator edit session over one product.
///
/// The session exclusively owns its draft. Committing or discarding
/// consumes it, so a closed session cannot be committed again.
#[derive(Debug)]
pub struct EditSession {
    id: Uuid,
    opened_at: DateTime<Utc>,
    draft: ProductDraft,
    state: SessionState,
}

impl EditSession {
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub const fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub const fn draft(&self) -> &ProductDraft {
        &self.draft
    }

    pub const fn draft_mut(&mut self) -> &mut ProductDraft {
        &mut self.draft
    }
}

/// Turns product drafts into remote calls.
///
/// Steps run in a fixed order: product fields, general image deletions,
/// general image uploads, existing variants, new variants. Calls within a
/// step run concurrently. A failed call never stops the others; every
/// failure is collected into the [`CommitOutcome`].
#[derive(Debug)]
pub struct ReconciliationEngine<A> {
    api: A,
    previews: PreviewRegistry,
    max_general_images: usize,
}

impl<A: CatalogApi> ReconciliationEngine<A> {
    #[must_use]
    pub fn new(api: A) -> Self {
        Self {
            api,
            previews: PreviewRegistry::new(),
            max_general_images: DEFAULT_MAX_GENERAL_IMAGES,
        }
    }

    #[must_use]
    pub fn with_config(api: A, config: &AdminConfig) -> Self {
        Self {
            max_general_images: config.max_general_images,
            ..Self::new(api)
        }
    }

    #[must_use]
    pub const fn api(&self) -> &A {
        &self.api
    }

    /// Previews held by every open session of this engine.
    #[must_use]
    pub const fn previews(&self) -> &PreviewRegistry {
        &self.previews
    }

    /// Open a session seeded from a freshly fetched product.
    #[must_use]
    pub fn begin_edit(&self, product: &Product) -> EditSession {
        let session = EditSession {
            id: Uuid::new_v4(),
            opened_at: Utc::now(),
            draft: ProductDraft::seed(product, self.previews.clone(), self.max_general_images),
            state: SessionState::Open,
        };
        info!(session_id = %session.id, product_id = %product.id, "Edit session opened");
        session
    }

    /// Close a session without any remote call, releasing its previews.
    pub fn discard(&self, session: EditSession) {
        info!(session_id = %session.id, product_id = %session.draft.product_id(), "Edit session discarded");
        drop(session);
    }

    /// The calls committing `draft` would issue.
    #[must_use]
    #[allow(clippy::unused_self)]
    pub fn plan(&self, draft: &FrozenDraft) -> CommitPlan {
        CommitPlan::from_draft(draft)
    }

    /// Commit the session's draft and close the session.
    ///
    /// The draft is frozen before the first call, and its previews are
    /// released once every call has finished. The caller should re-fetch
    /// the product afterwards; no local state is kept.
    #[instrument(skip(self, session), fields(session_id = %session.id, product_id = %session.draft.product_id()))]
    pub async fn commit(&self, mut session: EditSession) -> CommitOutcome {
        session.state = SessionState::Committing;
        let plan = self.plan(&session.draft.snapshot());
        info!(calls = plan.call_count(), state = %session.state, "Committing draft");

        let failures = self.execute(&plan).await;
        let outcome = CommitOutcome {
            session_id: session.id,
            product_id: plan.product_id.clone(),
            calls_issued: plan.call_count(),
            failure: CommitFailure::new(failures),
        };
        drop(session);

        match outcome.failure() {
            None => info!("Commit succeeded"),
            Some(failure) => warn!(failed = failure.len(), "Commit finished with failures"),
        }
        outcome
    }

    /// Run `plan`, returning every failed call in step order.
    pub async fn execute(&self, plan: &CommitPlan) -> Vec<StepFailure> {
        let mut failures = Vec::new();
        let product_id = &plan.product_id;

        // 1. Product fields
        if let Some(update) = &plan.product_update {
            info!(step = %CommitStep::UpdateProduct, "Running commit step");
            if let Err(error) = self.api.update_product_fields(product_id, update).await {
                failures.push(failed(CommitStep::UpdateProduct, product_id.to_string(), error));
            }
        }

        // 2. General image deletions
        if !plan.image_deletions.is_empty() {
            info!(step = %CommitStep::DeleteImages, count = plan.image_deletions.len(), "Running commit step");
            let results = join_all(
                plan.image_deletions
                    .iter()
                    .map(|id| async move { (id, self.api.delete_image(id).await) }),
            )
            .await;
            failures.extend(results.into_iter().filter_map(|(id, result)| {
                result
                    .err()
                    .map(|error| failed(CommitStep::DeleteImages, id.to_string(), error))
            }));
        }

        // 3. General image uploads
        if !plan.image_uploads.is_empty() {
            info!(step = %CommitStep::UploadImages, count = plan.image_uploads.len(), "Running commit step");
            let results = join_all(plan.image_uploads.iter().map(|image| async move {
                (image, self.api.add_image(product_id, image, None).await)
            }))
            .await;
            failures.extend(results.into_iter().filter_map(|(image, result)| {
                result.err().map(|error| {
                    failed(CommitStep::UploadImages, image.file_name().to_string(), error)
                })
            }));
        }

        // 4. Existing variants
        if !plan.variant_changes.is_empty() {
            info!(step = %CommitStep::ExistingVariants, count = plan.variant_changes.len(), "Running commit step");
            let results = join_all(
                plan.variant_changes
                    .iter()
                    .map(|change| self.apply_variant_change(plan, change)),
            )
            .await;
            failures.extend(results.into_iter().flatten());
        }

        // 5. New variants
        if !plan.variant_creations.is_empty() {
            info!(step = %CommitStep::CreateVariants, count = plan.variant_creations.len(), "Running commit step");
            let results = join_all(plan.variant_creations.iter().map(|variant| async move {
                (variant, self.api.create_variant(product_id, variant).await)
            }))
            .await;
            failures.extend(results.into_iter().filter_map(|(variant, result)| {
                result.err().map(|error| {
                    failed(
                        CommitStep::CreateVariants,
                        format!("{}={}", variant.option_key, variant.option_value),
                        error,
                    )
                })
            }));
        }

        failures
    }

    /// Calls for one variant run one after another; a failed call does not
    /// skip the next.
    async fn apply_variant_change(
        &self,
        plan: &CommitPlan,
        change: &VariantChange,
    ) -> Vec<StepFailure> {
        let variant_id = &change.variant_id;
        let target = variant_id.to_string();
        let mut failures = Vec::new();

        match &change.action {
            VariantAction::Delete => {
                if let Err(error) = self.api.delete_variant(variant_id).await {
                    failures.push(failed(CommitStep::ExistingVariants, target, error));
                }
            }
            VariantAction::Modify {
                update,
                delete_image,
                set_image,
            } => {
                if let Some(update) = update {
                    if let Err(error) = self.api.update_variant_fields(variant_id, update).await {
                        failures.push(failed(CommitStep::ExistingVariants, target.clone(), error));
                    }
                }
                if let Some(image_id) = delete_image {
                    if let Err(error) = self.api.delete_image(image_id).await {
                        failures.push(failed(
                            CommitStep::ExistingVariants,
                            format!("{target} image {image_id}"),
                            error,
                        ));
                    }
                }
                if let Some(image) = set_image {
                    if let Err(error) = self
                        .api
                        .set_variant_image(variant_id, &plan.product_id, image)
                        .await
                    {
                        failures.push(failed(
                            CommitStep::ExistingVariants,
                            format!("{target} image {}", image.file_name()),
                            error,
                        ));
                    }
                }
            }
        }

        failures
    }
}

fn failed(step: CommitStep, target: String, error: ApiError) -> StepFailure {
    warn!(%step, %target, error = %error, "Remote call failed");
    StepFailure {
        step,
        target,
        error,
    }
}
