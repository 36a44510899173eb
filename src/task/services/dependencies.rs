//! Dependency edge management.

use crate::task::{
    domain::{
        AccessContext, DependencyId, DependencyType, NewDependency, ParseTokenError,
        TaskDependency, TaskId,
    },
    ports::{TaskStore, TaskStoreError},
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument};

/// Service-level errors for dependency operations.
#[derive(Debug, Clone, Error)]
pub enum DependencyServiceError {
    /// The dependency type token is unknown.
    #[error(transparent)]
    InvalidType(#[from] ParseTokenError),
    /// Store operation failed or the edge was refused.
    #[error(transparent)]
    Store(#[from] TaskStoreError),
}

/// Result type for dependency service operations.
pub type DependencyServiceResult<T> = Result<T, DependencyServiceError>;

/// Creates, removes and lists dependency edges.
#[derive(Clone)]
pub struct DependencyService<S>
where
    S: TaskStore,
{
    store: Arc<S>,
}

impl<S> DependencyService<S>
where
    S: TaskStore,
{
    /// Creates a dependency service.
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Adds `task_id -> dependent_task_id`.
    ///
    /// `dependency_type` defaults to `finish_to_start`; hyphenated spellings
    /// are accepted.
    ///
    /// # Errors
    ///
    /// Returns [`DependencyServiceError::InvalidType`] for an unknown type,
    /// or a [`TaskStoreError::DependencyRule`] for self, reverse and
    /// duplicate edges.
    #[instrument(skip(self), fields(from = %task_id, to = %dependent_task_id))]
    pub async fn add_dependency(
        &self,
        access: &AccessContext,
        task_id: TaskId,
        dependent_task_id: TaskId,
        dependency_type: Option<&str>,
    ) -> DependencyServiceResult<TaskDependency> {
        let parsed = dependency_type
            .map(DependencyType::try_from)
            .transpose()?
            .unwrap_or_default();
        let edge = NewDependency::new(task_id, dependent_task_id).with_type(parsed);
        let dependency = self.store.add_dependency(access, edge).await?;
        info!(dependency = %dependency.id(), "dependency added");
        Ok(dependency)
    }

    /// Removes an edge.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::DependencyNotFound`] when the edge does not
    /// exist or its predecessor is not visible.
    #[instrument(skip(self), fields(dependency = %dependency_id))]
    pub async fn remove_dependency(
        &self,
        access: &AccessContext,
        dependency_id: DependencyId,
    ) -> DependencyServiceResult<()> {
        Ok(self.store.remove_dependency(access, dependency_id).await?)
    }

    /// Lists edges touching `task_id` in either direction.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::TaskNotFound`] when the task is not visible.
    pub async fn dependencies_of(
        &self,
        access: &AccessContext,
        task_id: TaskId,
    ) -> DependencyServiceResult<Vec<TaskDependency>> {
        Ok(self.store.list_dependencies(access, task_id).await?)
    }
}
