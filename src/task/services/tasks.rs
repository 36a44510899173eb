//! Task CRUD, listing and sharing.

use crate::task::{
    domain::{
        AccessContext, ExternalNotification, LinkAction, NewTask, ProjectId, ShareRecipient,
        SharedLink, Task, TaskChanges, TaskDomainError, TaskId, TaskStatus,
    },
    ports::{TaskStore, TaskStoreError},
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument};

/// Service-level errors for task operations.
#[derive(Debug, Clone, Error)]
pub enum TaskServiceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
    /// Store operation failed.
    #[error(transparent)]
    Store(#[from] TaskStoreError),
}

/// Result type for task service operations.
pub type TaskServiceResult<T> = Result<T, TaskServiceError>;

/// Task orchestration service.
#[derive(Clone)]
pub struct TaskService<S>
where
    S: TaskStore,
{
    store: Arc<S>,
}

impl<S> TaskService<S>
where
    S: TaskStore,
{
    /// Creates a task service.
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Creates a task, appending it to both orderings unless explicit
    /// positions were requested.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Store`] when the project is not visible,
    /// the parent lives elsewhere or persistence fails.
    #[instrument(skip(self, request), fields(project = %request.project_id()))]
    pub async fn create_task(
        &self,
        access: &AccessContext,
        request: NewTask,
    ) -> TaskServiceResult<Task> {
        let task = self.store.create_task(access, request).await?;
        info!(
            task = %task.id(),
            gantt_order = %task.gantt_order(),
            board_order = %task.board_order(),
            "task created"
        );
        Ok(task)
    }

    /// Applies field edits, shifting neighbours when an ordering column
    /// changes.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError`] when the task is not visible or an edit
    /// is invalid.
    #[instrument(skip(self, changes), fields(task = %task_id))]
    pub async fn update_task(
        &self,
        access: &AccessContext,
        task_id: TaskId,
        changes: TaskChanges,
    ) -> TaskServiceResult<Task> {
        let task = self.store.update_task(access, task_id, changes).await?;
        debug!(status = %task.status().as_str(), "task updated");
        Ok(task)
    }

    /// Deletes a task and closes the gaps it leaves.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Store`] when the task is not visible.
    #[instrument(skip(self), fields(task = %task_id))]
    pub async fn delete_task(
        &self,
        access: &AccessContext,
        task_id: TaskId,
    ) -> TaskServiceResult<()> {
        self.store.delete_task(access, task_id).await?;
        info!("task deleted");
        Ok(())
    }

    /// Finds a visible task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Store`] when persistence fails.
    pub async fn find_task(
        &self,
        access: &AccessContext,
        task_id: TaskId,
    ) -> TaskServiceResult<Option<Task>> {
        Ok(self.store.find_task(access, task_id).await?)
    }

    /// Lists visible tasks in Gantt order.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Store`] when persistence fails.
    pub async fn gantt(
        &self,
        access: &AccessContext,
        project_id: ProjectId,
    ) -> TaskServiceResult<Vec<Task>> {
        Ok(self.store.list_gantt(access, project_id).await?)
    }

    /// Lists one board column.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Store`] when persistence fails.
    pub async fn board_column(
        &self,
        access: &AccessContext,
        project_id: ProjectId,
        status: TaskStatus,
    ) -> TaskServiceResult<Vec<Task>> {
        Ok(self
            .store
            .list_board_column(access, project_id, status)
            .await?)
    }

    /// Lists the whole board ordered by status, then position.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Store`] when persistence fails.
    pub async fn board(
        &self,
        access: &AccessContext,
        project_id: ProjectId,
    ) -> TaskServiceResult<Vec<Task>> {
        Ok(self.store.list_board(access, project_id).await?)
    }

    /// Lists subtasks of `parent_id`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Store`] when persistence fails.
    pub async fn subtasks(
        &self,
        access: &AccessContext,
        parent_id: TaskId,
    ) -> TaskServiceResult<Vec<Task>> {
        Ok(self.store.list_subtasks(access, parent_id).await?)
    }

    /// Shares a task with an external recipient by email.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Domain`] for a malformed address and
    /// [`TaskServiceError::Store`] when the task is not visible.
    #[instrument(skip(self, email, name), fields(task = %task_id))]
    pub async fn share_task(
        &self,
        access: &AccessContext,
        task_id: TaskId,
        email: &str,
        name: Option<String>,
    ) -> TaskServiceResult<SharedLink> {
        let recipient = ShareRecipient::new(email, name)?;
        let link = self.store.share_task(access, task_id, recipient).await?;
        info!(link = %link.id(), "task shared");
        Ok(link)
    }

    /// Redeems a share token for `action`.
    ///
    /// Returns `Ok(None)` for unknown, expired, exhausted or insufficient
    /// links.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Store`] when persistence fails.
    pub async fn redeem_link(
        &self,
        token: &str,
        action: LinkAction,
    ) -> TaskServiceResult<Option<SharedLink>> {
        Ok(self.store.redeem_shared_link(token, action).await?)
    }

    /// Lists notifications queued for a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Store`] when the task is not visible.
    pub async fn notifications(
        &self,
        access: &AccessContext,
        task_id: TaskId,
    ) -> TaskServiceResult<Vec<ExternalNotification>> {
        Ok(self.store.list_notifications(access, task_id).await?)
    }
}
