//! Board and Gantt commands checked against the [`Authorizer`] once.

use super::ordering::{OrderingEngine, OrderingEngineError, ReorderOutcome};
use crate::task::{
    domain::{PermissionLevel, ProjectId, ResourceRef, TaskId, TaskStatus, UserId},
    ports::{Authorizer, TaskStore, TaskStoreError},
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{instrument, warn};

/// Errors from authorized board commands.
#[derive(Debug, Clone, Error)]
pub enum BoardCommandError {
    /// The user may not write to the project.
    #[error("user {user_id} may not reorder tasks in project {project_id}")]
    Forbidden {
        /// Acting user.
        user_id: UserId,
        /// Target project.
        project_id: ProjectId,
    },
    /// The authorizer failed.
    #[error(transparent)]
    Authorization(TaskStoreError),
    /// The reorder failed.
    #[error(transparent)]
    Ordering(#[from] OrderingEngineError),
}

/// Result type for authorized board commands.
pub type BoardCommandResult<T> = Result<T, BoardCommandError>;

/// Checks write access on the project, then delegates to the
/// [`OrderingEngine`].
#[derive(Clone)]
pub struct AuthorizedBoard<S, A>
where
    S: TaskStore,
    A: Authorizer,
{
    engine: OrderingEngine<S>,
    authorizer: Arc<A>,
}

impl<S, A> AuthorizedBoard<S, A>
where
    S: TaskStore,
    A: Authorizer,
{
    /// Creates the façade.
    #[must_use]
    pub const fn new(engine: OrderingEngine<S>, authorizer: Arc<A>) -> Self {
        Self { engine, authorizer }
    }

    /// Authorized [`OrderingEngine::reorder_gantt`].
    ///
    /// # Errors
    ///
    /// Returns [`BoardCommandError::Forbidden`] without touching the
    /// ordering when the user lacks write access.
    #[instrument(skip(self), fields(user = %user_id, project = %project_id, task = %task_id))]
    pub async fn reorder_gantt(
        &self,
        user_id: UserId,
        project_id: ProjectId,
        task_id: TaskId,
        position: usize,
    ) -> BoardCommandResult<ReorderOutcome> {
        self.ensure_write(user_id, project_id).await?;
        Ok(self
            .engine
            .reorder_gantt(project_id, task_id, position)
            .await?)
    }

    /// Authorized [`OrderingEngine::reorder_board`].
    ///
    /// # Errors
    ///
    /// Returns [`BoardCommandError::Forbidden`] without touching the
    /// ordering when the user lacks write access.
    #[instrument(skip(self), fields(user = %user_id, project = %project_id, task = %task_id))]
    pub async fn reorder_board(
        &self,
        user_id: UserId,
        project_id: ProjectId,
        task_id: TaskId,
        position: usize,
        status: Option<TaskStatus>,
    ) -> BoardCommandResult<ReorderOutcome> {
        self.ensure_write(user_id, project_id).await?;
        Ok(self
            .engine
            .reorder_board(project_id, task_id, position, status)
            .await?)
    }

    async fn ensure_write(&self, user_id: UserId, project_id: ProjectId) -> BoardCommandResult<()> {
        let allowed = self
            .authorizer
            .authorize(
                user_id,
                ResourceRef::Project(project_id),
                PermissionLevel::Write,
            )
            .await
            .map_err(BoardCommandError::Authorization)?;
        if allowed {
            Ok(())
        } else {
            warn!("reorder refused");
            Err(BoardCommandError::Forbidden {
                user_id,
                project_id,
            })
        }
    }
}
