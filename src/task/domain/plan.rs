//! Plan drafts produced by a planning collaborator and their preparation
//! into an importable task set.
//!
//! Drafts are read leniently: every field is optional and bad values fall
//! back to defaults. Parsing rejects only a payload lacking the `tasks` or
//! `dependencies` arrays; preparation refuses edges that break a dependency
//! rule.

use super::{
    DependencyGuard, DependencyRuleViolation, DependencyType, NewDependency, NewTask, PercentComplete, Priority, ProjectId,
    Rank, Task, TaskDomainError, TaskId, TaskStatus, UserId,
};
use chrono::{DateTime, Duration, NaiveDate};
use mockable::Clock;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

/// Prompt used when the import has none.
pub const DEFAULT_PLAN_PROMPT: &str = "AI Generated Project";

const TITLE_LIMIT: usize = 50;
const TITLE_CUT: usize = 47;
const GENERATED_NAME_LIMIT: usize = 50;
const SHORT_NAME_LIMIT: usize = 80;
const MIN_DESCRIPTION_FOR_NAME: usize = 10;
const MIN_NAME_LENGTH: usize = 5;

/// Rejection of a plan payload before any mutation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MalformedPlanError {
    /// The payload is not JSON.
    #[error("plan payload is not valid JSON: {0}")]
    InvalidJson(String),
    /// A required top-level array is missing.
    #[error("plan payload must contain a '{0}' array")]
    MissingArray(&'static str),
}

/// A plan that parsed but cannot be imported.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvalidPlanError {
    /// A dependency between two existing drafts breaks a dependency rule.
    #[error("plan dependency from task {from} to task {to} is refused: {violation}")]
    DependencyRule {
        /// 1-based position of the prerequisite draft.
        from: i64,
        /// 1-based position of the dependent draft.
        to: i64,
        /// Rule the edge breaks.
        violation: DependencyRuleViolation,
    },
    /// The planned project end falls outside the calendar.
    #[error("a project of {days} days starting {start} has no representable end date")]
    ProjectEndOutOfRange {
        /// Planned start.
        start: NaiveDate,
        /// Configured duration.
        days: i64,
    },
}

/// One task as proposed by the planner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    /// Proposed name, possibly empty.
    pub name: String,
    /// Proposed description, possibly empty.
    pub description: String,
    /// Raw start date text.
    pub start_date: Option<String>,
    /// Raw end date text.
    pub end_date: Option<String>,
    /// Raw status token.
    pub status: Option<String>,
    /// Proposed completion percentage.
    pub progress: Option<i64>,
    /// Raw priority token.
    pub priority: Option<String>,
    /// 1-based position of the parent draft.
    pub parent: Option<i64>,
}

impl TaskDraft {
    /// Creates a draft with only a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the raw status token.
    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Sets the raw date texts.
    #[must_use]
    pub fn with_dates(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.start_date = Some(start.into());
        self.end_date = Some(end.into());
        self
    }

    /// Sets the completion percentage.
    #[must_use]
    pub const fn with_progress(mut self, progress: i64) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Sets the raw priority token.
    #[must_use]
    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = Some(priority.into());
        self
    }

    /// Points at the 1-based parent draft.
    #[must_use]
    pub const fn with_parent(mut self, parent: i64) -> Self {
        self.parent = Some(parent);
        self
    }

    fn from_value(value: &Value) -> Self {
        let empty = Map::new();
        let fields = value.as_object().unwrap_or(&empty);
        Self {
            name: text_field(fields, "name").unwrap_or_default(),
            description: text_field(fields, "description").unwrap_or_default(),
            start_date: text_field(fields, "start_date"),
            end_date: text_field(fields, "end_date"),
            status: text_field(fields, "status"),
            progress: integer_field(fields, "progress"),
            priority: text_field(fields, "priority"),
            parent: integer_field(fields, "parent_id"),
        }
    }
}

/// One dependency as proposed by the planner, by 1-based draft position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyDraft {
    /// Position of the predecessor draft.
    pub from: i64,
    /// Position of the dependent draft.
    pub to: i64,
    /// Raw dependency type token.
    pub dependency_type: Option<String>,
}

impl DependencyDraft {
    /// Creates a finish-to-start draft edge.
    #[must_use]
    pub const fn new(from: i64, to: i64) -> Self {
        Self {
            from,
            to,
            dependency_type: None,
        }
    }

    /// Sets the raw type token.
    #[must_use]
    pub fn with_type(mut self, dependency_type: impl Into<String>) -> Self {
        self.dependency_type = Some(dependency_type.into());
        self
    }

    fn from_value(value: &Value) -> Self {
        let empty = Map::new();
        let fields = value.as_object().unwrap_or(&empty);
        Self {
            from: integer_field(fields, "from").unwrap_or_default(),
            to: integer_field(fields, "to").unwrap_or_default(),
            dependency_type: text_field(fields, "type"),
        }
    }
}

/// Structured planner output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanDraft {
    /// Ordered task drafts.
    pub tasks: Vec<TaskDraft>,
    /// Dependency drafts.
    pub dependencies: Vec<DependencyDraft>,
}

impl PlanDraft {
    /// Creates a draft from already structured parts.
    #[must_use]
    pub const fn new(tasks: Vec<TaskDraft>, dependencies: Vec<DependencyDraft>) -> Self {
        Self {
            tasks,
            dependencies,
        }
    }

    /// Parses a JSON payload.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedPlanError`] when the text is not JSON or lacks the
    /// `tasks` or `dependencies` arrays.
    pub fn from_json_str(payload: &str) -> Result<Self, MalformedPlanError> {
        let value: Value = serde_json::from_str(payload)
            .map_err(|err| MalformedPlanError::InvalidJson(err.to_string()))?;
        Self::from_value(&value)
    }

    /// Reads a parsed JSON payload.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedPlanError::MissingArray`] when either top-level
    /// array is absent.
    pub fn from_value(value: &Value) -> Result<Self, MalformedPlanError> {
        let tasks = value
            .get("tasks")
            .and_then(Value::as_array)
            .ok_or(MalformedPlanError::MissingArray("tasks"))?;
        let dependencies = value
            .get("dependencies")
            .and_then(Value::as_array)
            .ok_or(MalformedPlanError::MissingArray("dependencies"))?;
        Ok(Self {
            tasks: tasks.iter().map(TaskDraft::from_value).collect(),
            dependencies: dependencies
                .iter()
                .map(DependencyDraft::from_value)
                .collect(),
        })
    }
}

fn text_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    match fields.get(key)? {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn integer_field(fields: &Map<String, Value>, key: &str) -> Option<i64> {
    match fields.get(key)? {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Where imported tasks land and how missing data is filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanImportSettings {
    /// Prefix of the generated project name.
    pub project_prefix: String,
    /// Name of the organization created when none exists.
    pub default_organization_name: String,
    /// Slug of the organization created when none exists.
    pub default_organization_slug: String,
    /// Planned length of a newly created project.
    pub project_duration_days: i64,
}

impl Default for PlanImportSettings {
    fn default() -> Self {
        Self {
            project_prefix: DEFAULT_PLAN_PROMPT.to_owned(),
            default_organization_name: "Default Organization".to_owned(),
            default_organization_slug: "default".to_owned(),
            project_duration_days: 30,
        }
    }
}

/// Project the import is written into, found by name or created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanProject {
    /// Project name used for lookup and creation.
    pub name: String,
    /// Description for a newly created project.
    pub description: String,
    /// Start of a newly created project.
    pub start_date: NaiveDate,
    /// End of a newly created project.
    pub end_date: NaiveDate,
    /// Organization used when none exists yet.
    pub fallback_organization_name: String,
    /// Slug of that organization.
    pub fallback_organization_slug: String,
}

/// A normalized task ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedTask {
    /// Identifier the task will be stored under.
    pub id: TaskId,
    /// Final name.
    pub name: String,
    /// Final description.
    pub description: String,
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
    /// Parent task from the same plan.
    pub parent_id: Option<TaskId>,
    /// Gantt position, the 1-based draft position.
    pub gantt_order: Rank,
    /// Board position within the status column.
    pub board_order: Rank,
}

/// Counts of draft references that did not make it into the import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DroppedReferences {
    /// Parent references that did not resolve to another draft.
    pub parents: usize,
    /// Dependency drafts pointing at missing positions.
    pub dangling_dependencies: usize,
}

/// A plan normalized against the import rules, ready for the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedPlan {
    /// Target project.
    pub project: PlanProject,
    /// Tasks in Gantt order.
    pub tasks: Vec<PreparedTask>,
    /// Edges between tasks.
    pub edges: Vec<NewDependency>,
    /// References dropped during preparation.
    pub dropped: DroppedReferences,
}

impl PreparedPlan {
    /// Normalizes `draft` for import and assigns task identifiers.
    ///
    /// Dates that fail to parse fall back to `today`; `"null"` and empty
    /// dates stay unset. Dependencies pointing at missing drafts are dropped
    /// and counted.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPlanError`] when an edge between two drafts breaks a
    /// dependency rule or the project end date overflows.
    pub fn prepare(
        draft: &PlanDraft,
        prompt: Option<&str>,
        today: NaiveDate,
        settings: &PlanImportSettings,
    ) -> Result<Self, InvalidPlanError> {
        let project = plan_project(prompt, today, settings)?;
        let ids: Vec<TaskId> = draft.tasks.iter().map(|_| TaskId::new()).collect();
        let mut columns: BTreeMap<TaskStatus, usize> = BTreeMap::new();
        let mut dropped = DroppedReferences::default();
        let tasks = draft
            .tasks
            .iter()
            .zip(&ids)
            .enumerate()
            .map(|(index, (task, id))| {
                let status = plan_status(task.status.as_deref());
                let column = columns.entry(status).or_default();
                let board_order = Rank::after_count(*column);
                *column = column.saturating_add(1);
                let parent_id = match task.parent.map(|parent| lookup(&ids, parent)) {
                    Some(Some(parent_id)) if parent_id != *id => Some(parent_id),
                    Some(_) => {
                        dropped.parents = dropped.parents.saturating_add(1);
                        None
                    }
                    None => None,
                };
                let (name, description) = backfill_names(index, &task.name, &task.description);
                PreparedTask {
                    id: *id,
                    name,
                    description,
                    status,
                    priority: task
                        .priority
                        .as_deref()
                        .and_then(|token| Priority::try_from(token).ok())
                        .unwrap_or_default(),
                    percent_complete: task
                        .progress
                        .and_then(|progress| PercentComplete::new(progress).ok())
                        .unwrap_or_default(),
                    start_date: parse_plan_date(task.start_date.as_deref(), today),
                    due_date: parse_plan_date(task.end_date.as_deref(), today),
                    parent_id,
                    gantt_order: Rank::from_index(index),
                    board_order,
                }
            })
            .collect();
        let edges = resolve_edges(&draft.dependencies, &ids, &mut dropped)?;
        Ok(Self {
            project,
            tasks,
            edges,
            dropped,
        })
    }

    /// Turns the plan into task rows for `project_id`.
    ///
    /// Creator and assignee default to `actor`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError`] if a normalized name is still blank.
    pub fn materialize(
        &self,
        project_id: ProjectId,
        actor: Option<UserId>,
        clock: &impl Clock,
    ) -> Result<Vec<Task>, TaskDomainError> {
        self.tasks
            .iter()
            .map(|prepared| {
                let mut request = NewTask::new(project_id, prepared.name.as_str())?
                    .with_id(prepared.id)
                    .with_description(prepared.description.as_str())
                    .with_status(prepared.status)
                    .with_priority(prepared.priority)
                    .with_percent_complete(prepared.percent_complete)
                    .with_dates(prepared.start_date, prepared.due_date);
                if let Some(parent_id) = prepared.parent_id {
                    request = request.with_parent(parent_id);
                }
                if let Some(user_id) = actor {
                    request = request.with_creator(user_id).with_assignee(user_id);
                }
                Ok(Task::create(
                    request,
                    prepared.gantt_order,
                    prepared.board_order,
                    clock,
                ))
            })
            .collect()
    }
}

/// Outcome of a plan replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanImportReport {
    /// Project holding the imported tasks.
    pub project_id: ProjectId,
    /// `true` when the project was created by this import.
    pub project_created: bool,
    /// Created task identifiers in Gantt order.
    pub task_ids: Vec<TaskId>,
    /// Number of dependency edges written.
    pub dependency_count: usize,
    /// References dropped during preparation.
    pub dropped: DroppedReferences,
}

/// Maps a plan status token, including legacy spellings, to a column.
///
/// Unknown or missing tokens map to `todo`.
#[must_use]
pub fn plan_status(token: Option<&str>) -> TaskStatus {
    let Some(raw) = token else {
        return TaskStatus::Todo;
    };
    match raw.trim() {
        "not_started" => TaskStatus::Todo,
        "on_hold" => TaskStatus::Review,
        "completed" | "cancelled" => TaskStatus::Done,
        other => TaskStatus::try_from(other).unwrap_or_default(),
    }
}

/// Parses a plan date.
///
/// Missing, empty and `"null"` values yield `None`; unparseable values
/// fall back to `today`.
#[must_use]
pub fn parse_plan_date(raw: Option<&str>, today: NaiveDate) -> Option<NaiveDate> {
    let text = raw.map(str::trim).filter(|value| !value.is_empty())?;
    if text.eq_ignore_ascii_case("null") {
        return None;
    }
    let parsed = NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(text, "%Y/%m/%d"))
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|instant| instant.date_naive())
        });
    Some(parsed.unwrap_or(today))
}

/// Returns `true` for placeholder names such as `Task 3`.
#[must_use]
pub fn is_generic_name(name: &str) -> bool {
    let mut words = name.split_whitespace();
    let first = words.next();
    let second = words.next();
    let rest = words.next();
    matches!(
        (first, second, rest),
        (Some(word), Some(number), None)
            if word.eq_ignore_ascii_case("task")
                && !number.is_empty()
                && number.chars().all(|ch| ch.is_ascii_digit())
    )
}

/// Fills in missing names and descriptions for the draft at `index`.
#[must_use]
pub fn backfill_names(index: usize, name: &str, description: &str) -> (String, String) {
    let mut final_name = name.trim().to_owned();
    if final_name.is_empty() {
        final_name = format!("Task {}", index.saturating_add(1));
    }
    let mut final_description = description.trim().to_owned();
    if final_description.is_empty() {
        final_description = if is_generic_name(&final_name) {
            format!("Complete activities for {}", final_name.to_lowercase())
        } else {
            format!("Complete the '{final_name}' activities as specified in the project plan")
        };
    }
    let descriptive = final_description.chars().count() > MIN_DESCRIPTION_FOR_NAME;
    if descriptive && is_generic_name(&final_name) {
        let clause = leading_clause(&final_description);
        if !clause.is_empty() {
            final_name = truncate_on_word(clause, GENERATED_NAME_LIMIT);
        }
    }
    if descriptive && final_name.chars().count() < MIN_NAME_LENGTH {
        let clause = leading_clause(&final_description);
        if !clause.is_empty() {
            final_name = truncate_on_word(clause, SHORT_NAME_LIMIT);
        }
    }
    (final_name, final_description)
}

/// Returns the text before the first `.`, `;`, `:`, `!` or `?`, trimmed.
#[must_use]
pub fn leading_clause(text: &str) -> &str {
    text.split(['.', ';', ':', '!', '?'])
        .next()
        .unwrap_or_default()
        .trim()
}

/// Cuts `text` to `limit` characters, dropping a trailing partial word and
/// marking the cut with `...`.
#[must_use]
pub fn truncate_on_word(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_owned();
    }
    let cut: String = text.chars().take(limit).collect();
    let kept = match cut.rsplit_once(char::is_whitespace) {
        Some((head, _)) if !head.trim().is_empty() => head.trim_end(),
        _ => cut.as_str(),
    };
    format!("{kept}...")
}

fn plan_project(
    prompt: Option<&str>,
    today: NaiveDate,
    settings: &PlanImportSettings,
) -> Result<PlanProject, InvalidPlanError> {
    let days = settings.project_duration_days;
    let end_date = Duration::try_days(days)
        .and_then(|duration| today.checked_add_signed(duration))
        .ok_or(InvalidPlanError::ProjectEndOutOfRange { start: today, days })?;
    let description = prompt
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_PLAN_PROMPT);
    let title = if description.chars().count() > TITLE_LIMIT {
        let head: String = description.chars().take(TITLE_CUT).collect();
        format!("{head}...")
    } else {
        description.to_owned()
    };
    Ok(PlanProject {
        name: format!("{}: {title}", settings.project_prefix),
        description: format!("Project created from plan prompt: {description}"),
        start_date: today,
        end_date,
        fallback_organization_name: settings.default_organization_name.clone(),
        fallback_organization_slug: settings.default_organization_slug.clone(),
    })
}

fn lookup(ids: &[TaskId], position: i64) -> Option<TaskId> {
    usize::try_from(position)
        .ok()
        .and_then(|one_based| one_based.checked_sub(1))
        .and_then(|index| ids.get(index))
        .copied()
}

fn resolve_edges(
    drafts: &[DependencyDraft],
    ids: &[TaskId],
    dropped: &mut DroppedReferences,
) -> Result<Vec<NewDependency>, InvalidPlanError> {
    let mut accepted: Vec<NewDependency> = Vec::new();
    let mut pairs: HashSet<(TaskId, TaskId)> = HashSet::new();
    for draft in drafts {
        let (Some(from), Some(to)) = (lookup(ids, draft.from), lookup(ids, draft.to)) else {
            dropped.dangling_dependencies = dropped.dangling_dependencies.saturating_add(1);
            continue;
        };
        let dependency_type = draft
            .dependency_type
            .as_deref()
            .and_then(|token| DependencyType::try_from(token).ok())
            .unwrap_or_default();
        let edge = NewDependency::new(from, to).with_type(dependency_type);
        DependencyGuard::check(&edge, |a, b| pairs.contains(&(a, b))).map_err(|violation| {
            InvalidPlanError::DependencyRule {
                from: draft.from,
                to: draft.to,
                violation,
            }
        })?;
        pairs.insert((from, to));
        accepted.push(edge);
    }
    Ok(accepted)
}
