//! Task aggregate root and the fixed status and priority vocabularies.

use super::{ParseTokenError, ProjectId, Rank, TaskDomainError, TaskId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Board column a task sits in.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum TaskStatus {
    /// Not yet scheduled.
    Backlog,
    /// Scheduled, not started.
    #[default]
    Todo,
    /// Being worked on.
    InProgress,
    /// Awaiting review.
    Review,
    /// Finished.
    Done,
}

impl TaskStatus {
    /// Every status in board column order.
    pub const ALL: [Self; 5] = [
        Self::Backlog,
        Self::Todo,
        Self::InProgress,
        Self::Review,
        Self::Done,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Backlog => "backlog",
            Self::Todo => "todo",
            Self::InProgress => "inProgress",
            Self::Review => "review",
            Self::Done => "done",
        }
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTokenError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized: String = value
            .trim()
            .chars()
            .filter(|ch| !matches!(ch, '_' | '-' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "backlog" => Ok(Self::Backlog),
            "todo" => Ok(Self::Todo),
            "inprogress" => Ok(Self::InProgress),
            "review" => Ok(Self::Review),
            "done" => Ok(Self::Done),
            _ => Err(ParseTokenError::new("task status", value)),
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task urgency.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Can wait.
    Low,
    /// Default urgency.
    #[default]
    Medium,
    /// Should be picked up soon.
    High,
    /// Needs immediate attention.
    Urgent,
}

impl Priority {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

impl TryFrom<&str> for Priority {
    type Error = ParseTokenError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            _ => Err(ParseTokenError::new("priority", value)),
        }
    }
}

/// Completion percentage in `0..=100`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct PercentComplete(u8);

impl PercentComplete {
    /// Nothing done yet.
    pub const ZERO: Self = Self(0);

    /// Creates a validated percentage.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidPercentComplete`] outside `0..=100`.
    pub fn new(value: i64) -> Result<Self, TaskDomainError> {
        u8::try_from(value)
            .ok()
            .filter(|percent| *percent <= 100)
            .map(Self)
            .ok_or(TaskDomainError::InvalidPercentComplete(value))
    }

    /// Returns the underlying value.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for PercentComplete {
    type Error = TaskDomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PercentComplete> for i64 {
    fn from(percent: PercentComplete) -> Self {
        Self::from(percent.0)
    }
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    project_id: ProjectId,
    parent_id: Option<TaskId>,
    name: String,
    description: Option<String>,
    creator_id: Option<UserId>,
    assignee_id: Option<UserId>,
    status: TaskStatus,
    priority: Priority,
    percent_complete: PercentComplete,
    start_date: Option<NaiveDate>,
    due_date: Option<NaiveDate>,
    gantt_order: Rank,
    board_order: Rank,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Parent task, if this is a subtask.
    pub parent_id: Option<TaskId>,
    /// Task name.
    pub name: String,
    /// Free-form description.
    pub description: Option<String>,
    /// User who created the task.
    pub creator_id: Option<UserId>,
    /// User the task is assigned to.
    pub assignee_id: Option<UserId>,
    /// Board column.
    pub status: TaskStatus,
    /// Urgency.
    pub priority: Priority,
    /// Completion percentage.
    pub percent_complete: PercentComplete,
    /// Planned start.
    pub start_date: Option<NaiveDate>,
    /// Planned finish.
    pub due_date: Option<NaiveDate>,
    /// Position in the project's Gantt sequence.
    pub gantt_order: Rank,
    /// Position in the task's board column.
    pub board_order: Rank,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Builds a new task from a creation request at the given positions.
    #[must_use]
    pub fn create(
        request: NewTask,
        gantt_order: Rank,
        board_order: Rank,
        clock: &impl Clock,
    ) -> Self {
        let timestamp = clock.utc();
        Self {
            id: request.id,
            project_id: request.project_id,
            parent_id: request.parent_id,
            name: request.name,
            description: request.description,
            creator_id: request.creator_id,
            assignee_id: request.assignee_id,
            status: request.status,
            priority: request.priority,
            percent_complete: request.percent_complete,
            start_date: request.start_date,
            due_date: request.due_date,
            gantt_order,
            board_order,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            project_id: data.project_id,
            parent_id: data.parent_id,
            name: data.name,
            description: data.description,
            creator_id: data.creator_id,
            assignee_id: data.assignee_id,
            status: data.status,
            priority: data.priority,
            percent_complete: data.percent_complete,
            start_date: data.start_date,
            due_date: data.due_date,
            gantt_order: data.gantt_order,
            board_order: data.board_order,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the owning project.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Returns the parent task, if any.
    #[must_use]
    pub const fn parent_id(&self) -> Option<TaskId> {
        self.parent_id
    }

    /// Returns the task name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the creator, if known.
    #[must_use]
    pub const fn creator_id(&self) -> Option<UserId> {
        self.creator_id
    }

    /// Returns the assignee, if any.
    #[must_use]
    pub const fn assignee_id(&self) -> Option<UserId> {
        self.assignee_id
    }

    /// Returns the board column.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the urgency.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Returns the completion percentage.
    #[must_use]
    pub const fn percent_complete(&self) -> PercentComplete {
        self.percent_complete
    }

    /// Returns the planned start date.
    #[must_use]
    pub const fn start_date(&self) -> Option<NaiveDate> {
        self.start_date
    }

    /// Returns the planned due date.
    #[must_use]
    pub const fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }

    /// Returns the position in the project's Gantt sequence.
    #[must_use]
    pub const fn gantt_order(&self) -> Rank {
        self.gantt_order
    }

    /// Returns the position in the task's board column.
    #[must_use]
    pub const fn board_order(&self) -> Rank {
        self.board_order
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Applies the non-ordering part of a field edit.
    ///
    /// Status and order positions are owned by the ordering planner and are
    /// written through [`Task::set_ordering`].
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTaskName`] for a blank name and
    /// [`TaskDomainError::SelfParent`] when the task would parent itself.
    pub fn apply_fields(
        &mut self,
        changes: &TaskChanges,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        if let Some(name) = &changes.name {
            self.name = validated_name(name)?;
        }
        if let Some(parent_id) = changes.parent_id {
            if parent_id == Some(self.id) {
                return Err(TaskDomainError::SelfParent(self.id));
            }
            self.parent_id = parent_id;
        }
        if let Some(description) = &changes.description {
            self.description.clone_from(description);
        }
        if let Some(assignee_id) = changes.assignee_id {
            self.assignee_id = assignee_id;
        }
        if let Some(priority) = changes.priority {
            self.priority = priority;
        }
        if let Some(percent_complete) = changes.percent_complete {
            self.percent_complete = percent_complete;
        }
        if let Some(start_date) = changes.start_date {
            self.start_date = start_date;
        }
        if let Some(due_date) = changes.due_date {
            self.due_date = due_date;
        }
        self.touch(clock);
        Ok(())
    }

    /// Writes the ordering columns computed by the ordering planner.
    pub fn set_ordering(
        &mut self,
        status: TaskStatus,
        gantt_order: Rank,
        board_order: Rank,
        clock: &impl Clock,
    ) {
        self.status = status;
        self.gantt_order = gantt_order;
        self.board_order = board_order;
        self.touch(clock);
    }

    /// Detaches this task from its parent.
    pub fn detach_from_parent(&mut self, clock: &impl Clock) {
        self.parent_id = None;
        self.touch(clock);
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}

fn validated_name(name: &str) -> Result<String, TaskDomainError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(TaskDomainError::EmptyTaskName);
    }
    Ok(trimmed.to_owned())
}

/// Request payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    id: TaskId,
    project_id: ProjectId,
    parent_id: Option<TaskId>,
    name: String,
    description: Option<String>,
    creator_id: Option<UserId>,
    assignee_id: Option<UserId>,
    status: TaskStatus,
    priority: Priority,
    percent_complete: PercentComplete,
    start_date: Option<NaiveDate>,
    due_date: Option<NaiveDate>,
    gantt_order: Option<Rank>,
    board_order: Option<Rank>,
}

impl NewTask {
    /// Creates a request with the required fields and default status and
    /// priority.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTaskName`] when the name is blank.
    pub fn new(project_id: ProjectId, name: impl Into<String>) -> Result<Self, TaskDomainError> {
        let raw: String = name.into();
        Ok(Self {
            id: TaskId::new(),
            project_id,
            parent_id: None,
            name: validated_name(&raw)?,
            description: None,
            creator_id: None,
            assignee_id: None,
            status: TaskStatus::default(),
            priority: Priority::default(),
            percent_complete: PercentComplete::ZERO,
            start_date: None,
            due_date: None,
            gantt_order: None,
            board_order: None,
        })
    }

    /// Overrides the generated identifier.
    #[must_use]
    pub const fn with_id(mut self, id: TaskId) -> Self {
        self.id = id;
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Makes the new task a subtask of `parent_id`.
    #[must_use]
    pub const fn with_parent(mut self, parent_id: TaskId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Records the creating user.
    #[must_use]
    pub const fn with_creator(mut self, creator_id: UserId) -> Self {
        self.creator_id = Some(creator_id);
        self
    }

    /// Assigns the task.
    #[must_use]
    pub const fn with_assignee(mut self, assignee_id: UserId) -> Self {
        self.assignee_id = Some(assignee_id);
        self
    }

    /// Sets the initial board column.
    #[must_use]
    pub const fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// Sets the urgency.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the completion percentage.
    #[must_use]
    pub const fn with_percent_complete(mut self, percent_complete: PercentComplete) -> Self {
        self.percent_complete = percent_complete;
        self
    }

    /// Sets the planned dates.
    #[must_use]
    pub const fn with_dates(mut self, start: Option<NaiveDate>, due: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.due_date = due;
        self
    }

    /// Requests an explicit Gantt position instead of appending.
    #[must_use]
    pub const fn with_gantt_order(mut self, gantt_order: Rank) -> Self {
        self.gantt_order = Some(gantt_order);
        self
    }

    /// Requests an explicit board position instead of appending.
    #[must_use]
    pub const fn with_board_order(mut self, board_order: Rank) -> Self {
        self.board_order = Some(board_order);
        self
    }

    /// Returns the identifier the task will be stored under.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the target project.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Returns the requested parent.
    #[must_use]
    pub const fn parent_id(&self) -> Option<TaskId> {
        self.parent_id
    }

    /// Returns the initial status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the requested Gantt position, if any.
    #[must_use]
    pub const fn gantt_order(&self) -> Option<Rank> {
        self.gantt_order
    }

    /// Returns the requested board position, if any.
    #[must_use]
    pub const fn board_order(&self) -> Option<Rank> {
        self.board_order
    }

    /// Returns the creating user, if recorded.
    #[must_use]
    pub const fn creator_id(&self) -> Option<UserId> {
        self.creator_id
    }
}

/// A partial field edit. `None` leaves a field untouched; nullable fields use
/// a nested option so they can be cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskChanges {
    name: Option<String>,
    description: Option<Option<String>>,
    parent_id: Option<Option<TaskId>>,
    assignee_id: Option<Option<UserId>>,
    status: Option<TaskStatus>,
    priority: Option<Priority>,
    percent_complete: Option<PercentComplete>,
    start_date: Option<Option<NaiveDate>>,
    due_date: Option<Option<NaiveDate>>,
    gantt_order: Option<Rank>,
    board_order: Option<Rank>,
}

impl TaskChanges {
    /// Creates an empty edit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Renames the task.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Replaces or clears the description.
    #[must_use]
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    /// Replaces or clears the parent task.
    #[must_use]
    pub const fn with_parent(mut self, parent_id: Option<TaskId>) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Replaces or clears the assignee.
    #[must_use]
    pub const fn with_assignee(mut self, assignee_id: Option<UserId>) -> Self {
        self.assignee_id = Some(assignee_id);
        self
    }

    /// Moves the task to another board column.
    #[must_use]
    pub const fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Changes the urgency.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Changes the completion percentage.
    #[must_use]
    pub const fn with_percent_complete(mut self, percent_complete: PercentComplete) -> Self {
        self.percent_complete = Some(percent_complete);
        self
    }

    /// Replaces or clears the start date.
    #[must_use]
    pub const fn with_start_date(mut self, start_date: Option<NaiveDate>) -> Self {
        self.start_date = Some(start_date);
        self
    }

    /// Replaces or clears the due date.
    #[must_use]
    pub const fn with_due_date(mut self, due_date: Option<NaiveDate>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Sets the Gantt position directly.
    #[must_use]
    pub const fn with_gantt_order(mut self, gantt_order: Rank) -> Self {
        self.gantt_order = Some(gantt_order);
        self
    }

    /// Sets the board position directly.
    #[must_use]
    pub const fn with_board_order(mut self, board_order: Rank) -> Self {
        self.board_order = Some(board_order);
        self
    }

    /// Returns the requested parent change, if any.
    #[must_use]
    pub const fn parent_id(&self) -> Option<Option<TaskId>> {
        self.parent_id
    }

    /// Returns the ordering-relevant part of the edit.
    #[must_use]
    pub const fn order_edit(&self) -> super::OrderEdit {
        super::OrderEdit {
            status: self.status,
            gantt_order: self.gantt_order,
            board_order: self.board_order,
        }
    }
}
