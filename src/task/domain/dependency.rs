//! Task-to-task dependency edges and the rules that guard their creation.

use super::{DependencyId, ParseTokenError, TaskId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Scheduling relationship carried by a dependency edge.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DependencyType {
    /// The dependent task starts after this one finishes.
    #[default]
    FinishToStart,
    /// Both tasks start together.
    StartToStart,
    /// Both tasks finish together.
    FinishToFinish,
    /// The dependent task finishes after this one starts.
    StartToFinish,
}

impl DependencyType {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FinishToStart => "finish_to_start",
            Self::StartToStart => "start_to_start",
            Self::FinishToFinish => "finish_to_finish",
            Self::StartToFinish => "start_to_finish",
        }
    }
}

impl TryFrom<&str> for DependencyType {
    type Error = ParseTokenError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "finish_to_start" => Ok(Self::FinishToStart),
            "start_to_start" => Ok(Self::StartToStart),
            "finish_to_finish" => Ok(Self::FinishToFinish),
            "start_to_finish" => Ok(Self::StartToFinish),
            _ => Err(ParseTokenError::new("dependency type", value)),
        }
    }
}

/// A directed edge: `dependent_task_id` depends on `task_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDependency {
    id: DependencyId,
    task_id: TaskId,
    dependent_task_id: TaskId,
    dependency_type: DependencyType,
    created_at: DateTime<Utc>,
}

impl TaskDependency {
    /// Reconstructs an edge from its stored columns.
    #[must_use]
    pub const fn from_parts(
        id: DependencyId,
        edge: NewDependency,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            task_id: edge.task_id,
            dependent_task_id: edge.dependent_task_id,
            dependency_type: edge.dependency_type,
            created_at,
        }
    }

    /// Returns the edge identifier.
    #[must_use]
    pub const fn id(&self) -> DependencyId {
        self.id
    }

    /// Returns the predecessor task.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the task that depends on the predecessor.
    #[must_use]
    pub const fn dependent_task_id(&self) -> TaskId {
        self.dependent_task_id
    }

    /// Returns the relationship type.
    #[must_use]
    pub const fn dependency_type(&self) -> DependencyType {
        self.dependency_type
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns `true` when the edge touches `task_id` at either end.
    #[must_use]
    pub fn touches(&self, task_id: TaskId) -> bool {
        self.task_id == task_id || self.dependent_task_id == task_id
    }

    /// Returns the edge as a creation request, dropping identity.
    #[must_use]
    pub const fn as_new(&self) -> NewDependency {
        NewDependency {
            task_id: self.task_id,
            dependent_task_id: self.dependent_task_id,
            dependency_type: self.dependency_type,
        }
    }
}

/// Request for a new dependency edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NewDependency {
    /// Predecessor task.
    pub task_id: TaskId,
    /// Task that depends on the predecessor.
    pub dependent_task_id: TaskId,
    /// Relationship type.
    pub dependency_type: DependencyType,
}

impl NewDependency {
    /// Creates a finish-to-start edge request.
    #[must_use]
    pub fn new(task_id: TaskId, dependent_task_id: TaskId) -> Self {
        Self {
            task_id,
            dependent_task_id,
            dependency_type: DependencyType::default(),
        }
    }

    /// Overrides the relationship type.
    #[must_use]
    pub const fn with_type(mut self, dependency_type: DependencyType) -> Self {
        self.dependency_type = dependency_type;
        self
    }

    /// Returns the edge pointing the other way.
    #[must_use]
    pub const fn reversed(&self) -> (TaskId, TaskId) {
        (self.dependent_task_id, self.task_id)
    }

    /// Returns the unordered task pair, smaller identifier first.
    #[must_use]
    pub fn unordered_pair(&self) -> (TaskId, TaskId) {
        if self.task_id <= self.dependent_task_id {
            (self.task_id, self.dependent_task_id)
        } else {
            (self.dependent_task_id, self.task_id)
        }
    }
}

/// A rule broken by a requested dependency edge.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum DependencyRuleViolation {
    /// The edge would connect a task to itself.
    #[error("dependent task can't be the same as task")]
    SelfDependency,
    /// The reverse edge already exists.
    #[error("would create a circular dependency")]
    DirectCycle,
    /// The same ordered pair already has an edge.
    #[error("dependency already exists")]
    Duplicate,
}

/// Validates new edges against the edges already present.
///
/// Only self-loops and direct two-node cycles are detected. Longer cycles
/// pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct DependencyGuard;

impl DependencyGuard {
    /// Checks a request against the existing ordered pairs.
    ///
    /// `has_edge(a, b)` must report whether an edge `a -> b` exists.
    ///
    /// # Errors
    ///
    /// Returns the first rule the request breaks, in the order self, reverse,
    /// duplicate.
    pub fn check(
        edge: &NewDependency,
        has_edge: impl Fn(TaskId, TaskId) -> bool,
    ) -> Result<(), DependencyRuleViolation> {
        if edge.task_id == edge.dependent_task_id {
            return Err(DependencyRuleViolation::SelfDependency);
        }
        let (reverse_from, reverse_to) = edge.reversed();
        if has_edge(reverse_from, reverse_to) {
            return Err(DependencyRuleViolation::DirectCycle);
        }
        if has_edge(edge.task_id, edge.dependent_task_id) {
            return Err(DependencyRuleViolation::Duplicate);
        }
        Ok(())
    }
}
