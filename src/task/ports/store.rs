//! Store port for tasks, their orderings, dependencies and shares.
//!
//! Every call states who it acts for through an [`AccessContext`]. Actor
//! contexts only see rows the visibility policy allows; the bypass context
//! sees everything and is reserved for maintenance paths that were
//! authorized beforehand.

use crate::task::domain::{
    AccessContext, DependencyId, DependencyRuleViolation, ExternalNotification, LinkAction,
    NewDependency, NewTask, OrganizationId, ParseTokenError, PlanImportReport, PreparedPlan,
    ProjectId, ShareRecipient, SharedLink, Task, TaskChanges, TaskDependency, TaskDomainError,
    TaskId, TaskStatus,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for store operations.
pub type TaskStoreResult<T> = Result<T, TaskStoreError>;

/// Where a reorder moves a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderTarget {
    /// A 0-based index into the project's Gantt sequence.
    Gantt {
        /// Target index.
        position: usize,
    },
    /// A board move.
    ///
    /// Within the current column the position is a 0-based index; with a
    /// different status it is a 1-based slot in the new column.
    Board {
        /// Target index or slot.
        position: usize,
        /// New column, if changing.
        status: Option<TaskStatus>,
    },
}

/// A request to move one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReorderRequest {
    /// Project the task must belong to.
    pub project_id: ProjectId,
    /// Task to move.
    pub task_id: TaskId,
    /// Destination.
    pub target: ReorderTarget,
}

impl ReorderRequest {
    /// Builds a Gantt move.
    #[must_use]
    pub const fn gantt(project_id: ProjectId, task_id: TaskId, position: usize) -> Self {
        Self {
            project_id,
            task_id,
            target: ReorderTarget::Gantt { position },
        }
    }

    /// Builds a board move.
    #[must_use]
    pub const fn board(
        project_id: ProjectId,
        task_id: TaskId,
        position: usize,
        status: Option<TaskStatus>,
    ) -> Self {
        Self {
            project_id,
            task_id,
            target: ReorderTarget::Board { position, status },
        }
    }
}

/// Task persistence contract.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Stores a new task, appending it to both orderings unless explicit
    /// ranks are requested.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::ProjectNotFound`] when the project is not
    /// visible and [`TaskStoreError::ParentNotInProject`] when the parent
    /// belongs elsewhere.
    async fn create_task(&self, access: &AccessContext, request: NewTask)
    -> TaskStoreResult<Task>;

    /// Applies a field edit, shifting neighbours when ordering columns
    /// change.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::TaskNotFound`] when the task is not visible.
    async fn update_task(
        &self,
        access: &AccessContext,
        task_id: TaskId,
        changes: TaskChanges,
    ) -> TaskStoreResult<Task>;

    /// Deletes a task, closing the gaps it leaves and removing rows that
    /// point at it. Subtasks are detached.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::TaskNotFound`] when the task is not visible.
    async fn delete_task(&self, access: &AccessContext, task_id: TaskId) -> TaskStoreResult<()>;

    /// Finds a visible task.
    async fn find_task(
        &self,
        access: &AccessContext,
        task_id: TaskId,
    ) -> TaskStoreResult<Option<Task>>;

    /// Lists a project's visible tasks in Gantt order.
    async fn list_gantt(
        &self,
        access: &AccessContext,
        project_id: ProjectId,
    ) -> TaskStoreResult<Vec<Task>>;

    /// Lists one board column's visible tasks in board order.
    async fn list_board_column(
        &self,
        access: &AccessContext,
        project_id: ProjectId,
        status: TaskStatus,
    ) -> TaskStoreResult<Vec<Task>>;

    /// Lists a project's visible tasks ordered by status, then board order.
    async fn list_board(
        &self,
        access: &AccessContext,
        project_id: ProjectId,
    ) -> TaskStoreResult<Vec<Task>>;

    /// Lists visible direct subtasks in Gantt order.
    async fn list_subtasks(
        &self,
        access: &AccessContext,
        parent_id: TaskId,
    ) -> TaskStoreResult<Vec<Task>>;

    /// Moves a task and renumbers the affected scope in one transaction.
    ///
    /// Returns the scope after the move: the Gantt sequence, or the
    /// destination board column.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::TaskNotInProject`] when the task is not part
    /// of the project and [`TaskStoreError::ScopeNotVisible`] when an actor
    /// cannot see every task in the scope.
    async fn reorder(
        &self,
        access: &AccessContext,
        request: ReorderRequest,
    ) -> TaskStoreResult<Vec<Task>>;

    /// Adds a dependency edge after checking the dependency rules.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::TaskNotFound`] for a missing endpoint and
    /// [`TaskStoreError::DependencyRule`] for a refused edge.
    async fn add_dependency(
        &self,
        access: &AccessContext,
        edge: NewDependency,
    ) -> TaskStoreResult<TaskDependency>;

    /// Removes a dependency edge.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::DependencyNotFound`] when no edge matches.
    async fn remove_dependency(
        &self,
        access: &AccessContext,
        dependency_id: DependencyId,
    ) -> TaskStoreResult<()>;

    /// Lists edges touching a visible task.
    async fn list_dependencies(
        &self,
        access: &AccessContext,
        task_id: TaskId,
    ) -> TaskStoreResult<Vec<TaskDependency>>;

    /// Replaces every task, dependency, task grant, task share and
    /// notification with the prepared plan in one transaction.
    ///
    /// The deletion is global regardless of `access`; the acting user, if
    /// any, becomes creator and assignee of the imported tasks.
    ///
    /// # Errors
    ///
    /// Any failure rolls the whole replacement back.
    async fn replace_plan(
        &self,
        access: &AccessContext,
        plan: &PreparedPlan,
    ) -> TaskStoreResult<PlanImportReport>;

    /// Shares a visible task with an external recipient and queues the
    /// announcement.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::TaskNotFound`] when the task is not visible.
    async fn share_task(
        &self,
        access: &AccessContext,
        task_id: TaskId,
        recipient: ShareRecipient,
    ) -> TaskStoreResult<SharedLink>;

    /// Looks a link up by token, regardless of visibility.
    async fn find_shared_link(&self, token: &str) -> TaskStoreResult<Option<SharedLink>>;

    /// Counts one use of a link when it is still valid and grants `action`.
    ///
    /// Returns the updated link, or `None` when the token is unknown,
    /// expired, exhausted or does not grant the action.
    async fn redeem_shared_link(
        &self,
        token: &str,
        action: LinkAction,
    ) -> TaskStoreResult<Option<SharedLink>>;

    /// Lists notifications queued for a visible task.
    async fn list_notifications(
        &self,
        access: &AccessContext,
        task_id: TaskId,
    ) -> TaskStoreResult<Vec<ExternalNotification>>;
}

/// Errors returned by store and directory implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskStoreError {
    /// The task does not exist or is not visible.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// The task exists but belongs to another project.
    #[error("task {task_id} is not part of project {project_id}")]
    TaskNotInProject {
        /// Requested task.
        task_id: TaskId,
        /// Requested project.
        project_id: ProjectId,
    },

    /// The project does not exist or is not visible.
    #[error("project not found: {0}")]
    ProjectNotFound(ProjectId),

    /// The organization does not exist.
    #[error("organization not found: {0}")]
    OrganizationNotFound(OrganizationId),

    /// A parent task must live in the same project.
    #[error("parent task {parent_id} is not part of project {project_id}")]
    ParentNotInProject {
        /// Requested parent.
        parent_id: TaskId,
        /// Project of the child.
        project_id: ProjectId,
    },

    /// No dependency edge matches.
    #[error("dependency not found: {0}")]
    DependencyNotFound(DependencyId),

    /// A dependency edge was refused.
    #[error(transparent)]
    DependencyRule(#[from] DependencyRuleViolation),

    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),

    /// An actor cannot see every task in the reorder scope.
    #[error("ordering scope in project {0} is not fully visible")]
    ScopeNotVisible(ProjectId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskStoreError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

impl From<ParseTokenError> for TaskStoreError {
    fn from(err: ParseTokenError) -> Self {
        Self::persistence(err)
    }
}
