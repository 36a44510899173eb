//! Destructive plan import.

use crate::task::{
    domain::{
        AccessContext, InvalidPlanError, PlanDraft, PlanImportReport, PlanImportSettings,
        PreparedPlan,
    },
    ports::{PlanProducer, PlanProducerError, TaskStore, TaskStoreError},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument, warn};

/// Service-level errors for plan import.
#[derive(Debug, Clone, Error)]
pub enum PlanImportError {
    /// The producer failed or returned an unusable plan.
    #[error(transparent)]
    Producer(#[from] PlanProducerError),
    /// The plan breaks an import rule; nothing was deleted.
    #[error(transparent)]
    Invalid(#[from] InvalidPlanError),
    /// The replacement failed and rolled back.
    #[error(transparent)]
    Store(#[from] TaskStoreError),
}

/// Result type for plan import operations.
pub type PlanImportResult<T> = Result<T, PlanImportError>;

/// Replaces every task with a freshly imported plan.
#[derive(Clone)]
pub struct PlanImportService<S, P, C>
where
    S: TaskStore,
    P: PlanProducer,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    producer: Arc<P>,
    clock: Arc<C>,
    settings: PlanImportSettings,
}

impl<S, P, C> PlanImportService<S, P, C>
where
    S: TaskStore,
    P: PlanProducer,
    C: Clock + Send + Sync,
{
    /// Creates a plan import service.
    #[must_use]
    pub const fn new(
        store: Arc<S>,
        producer: Arc<P>,
        clock: Arc<C>,
        settings: PlanImportSettings,
    ) -> Self {
        Self {
            store,
            producer,
            clock,
            settings,
        }
    }

    /// Deletes all tasks, dependencies, task grants, task shares and
    /// notifications, then writes `draft` in one transaction.
    ///
    /// Dangling parent and dependency references are dropped and counted in
    /// the report.
    ///
    /// # Errors
    ///
    /// Returns [`PlanImportError::Invalid`] before any deletion when an edge
    /// between two drafts breaks a dependency rule, and
    /// [`PlanImportError::Store`] when the replacement rolls back.
    #[instrument(skip(self, draft), fields(tasks = draft.tasks.len(), edges = draft.dependencies.len()))]
    pub async fn replace_plan(
        &self,
        access: &AccessContext,
        draft: &PlanDraft,
        prompt: Option<&str>,
    ) -> PlanImportResult<PlanImportReport> {
        let today = self.clock.utc().date_naive();
        let prepared = PreparedPlan::prepare(draft, prompt, today, &self.settings)
            .inspect_err(|err| warn!(error = %err, "plan rejected before import"))?;
        let report = self.store.replace_plan(access, &prepared).await?;
        let dropped = report.dropped;
        if dropped.parents > 0 || dropped.dangling_dependencies > 0 {
            warn!(
                parents = dropped.parents,
                dependencies = dropped.dangling_dependencies,
                "dropped dangling plan references"
            );
        }
        info!(
            project = %report.project_id,
            project_created = report.project_created,
            tasks = report.task_ids.len(),
            dependencies = report.dependency_count,
            "plan imported"
        );
        Ok(report)
    }

    /// Asks the producer for a plan and imports it.
    ///
    /// A malformed producer answer is rejected before anything is deleted.
    ///
    /// # Errors
    ///
    /// Returns [`PlanImportError::Producer`] when no usable plan arrives,
    /// [`PlanImportError::Invalid`] when the plan breaks an import rule and
    /// [`PlanImportError::Store`] when the replacement rolls back.
    #[instrument(skip(self, prompt))]
    pub async fn generate_plan(
        &self,
        access: &AccessContext,
        prompt: &str,
    ) -> PlanImportResult<PlanImportReport> {
        let draft = self.producer.produce_plan(prompt).await?;
        self.replace_plan(access, &draft, Some(prompt)).await
    }
}
