//! Gantt and board reordering.

use crate::task::{
    domain::{AccessContext, ProjectId, Task, TaskId, TaskStatus},
    ports::{ReorderRequest, TaskStore, TaskStoreError},
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Why a reorder left the ordering untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderRejection {
    /// The task is missing or belongs to another project.
    TaskNotInProject,
}

/// Result of a reorder request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReorderOutcome {
    /// The move committed; the scope in its new order.
    Reordered(Vec<Task>),
    /// Nothing changed.
    Rejected {
        /// Reason for the rejection.
        reason: ReorderRejection,
        /// The scope as it stands, in its unchanged order.
        ordering: Vec<Task>,
    },
}

impl ReorderOutcome {
    /// Returns `true` when the move committed.
    #[must_use]
    pub const fn is_reordered(&self) -> bool {
        matches!(self, Self::Reordered(_))
    }

    /// Returns the scope carried by either variant.
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        match self {
            Self::Reordered(tasks) | Self::Rejected { ordering: tasks, .. } => tasks,
        }
    }
}

/// Errors from the ordering engine that are not plain rejections.
#[derive(Debug, Clone, Error)]
pub enum OrderingEngineError {
    /// The store failed and the transaction rolled back.
    #[error(transparent)]
    Store(#[from] TaskStoreError),
}

/// Result type for ordering engine operations.
pub type OrderingEngineResult<T> = Result<T, OrderingEngineError>;

/// Applies reorder requests through the store with row filtering bypassed.
///
/// Callers authorize the actor before invoking the engine; see
/// [`super::AuthorizedBoard`].
#[derive(Clone)]
pub struct OrderingEngine<S>
where
    S: TaskStore,
{
    store: Arc<S>,
}

impl<S> OrderingEngine<S>
where
    S: TaskStore,
{
    /// Creates an engine over `store`.
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Moves `task_id` to the 0-based `position` in the project's Gantt
    /// sequence.
    ///
    /// Positions past the end are clamped.
    ///
    /// # Errors
    ///
    /// Returns [`OrderingEngineError::Store`] when persistence fails.
    #[instrument(skip(self), fields(project = %project_id, task = %task_id))]
    pub async fn reorder_gantt(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        position: usize,
    ) -> OrderingEngineResult<ReorderOutcome> {
        let request = ReorderRequest::gantt(project_id, task_id, position);
        match self.store.reorder(&AccessContext::Bypass, request).await {
            Ok(tasks) => {
                debug!(scope_len = tasks.len(), "gantt reorder committed");
                Ok(ReorderOutcome::Reordered(tasks))
            }
            Err(TaskStoreError::TaskNotInProject { .. }) => {
                warn!("gantt reorder rejected: task not in project");
                let ordering = self
                    .store
                    .list_gantt(&AccessContext::Bypass, project_id)
                    .await?;
                Ok(ReorderOutcome::Rejected {
                    reason: ReorderRejection::TaskNotInProject,
                    ordering,
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Moves `task_id` on the board.
    ///
    /// Without a status, or with the current one, `position` is a 0-based
    /// index in the task's column. With a new status it is a 1-based slot
    /// in the destination column.
    ///
    /// # Errors
    ///
    /// Returns [`OrderingEngineError::Store`] when persistence fails.
    #[instrument(skip(self), fields(project = %project_id, task = %task_id))]
    pub async fn reorder_board(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        position: usize,
        status: Option<TaskStatus>,
    ) -> OrderingEngineResult<ReorderOutcome> {
        let request = ReorderRequest::board(project_id, task_id, position, status);
        match self.store.reorder(&AccessContext::Bypass, request).await {
            Ok(tasks) => {
                debug!(scope_len = tasks.len(), "board reorder committed");
                Ok(ReorderOutcome::Reordered(tasks))
            }
            Err(TaskStoreError::TaskNotInProject { .. }) => {
                warn!("board reorder rejected: task not in project");
                let ordering = match status {
                    Some(column) => {
                        self.store
                            .list_board_column(&AccessContext::Bypass, project_id, column)
                            .await?
                    }
                    None => self.store.list_board(&AccessContext::Bypass, project_id).await?,
                };
                Ok(ReorderOutcome::Rejected {
                    reason: ReorderRejection::TaskNotInProject,
                    ordering,
                })
            }
            Err(err) => Err(err.into()),
        }
    }
}
