//! Explicit access context and the visibility policy.

use super::{MemberRole, ParseTokenError, PermissionId, ProjectId, Task, TaskId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who a store call acts for.
///
/// Maintenance paths such as reordering and plan import pass
/// [`AccessContext::Bypass`] after the caller has been authorized once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessContext {
    /// Rows are filtered to what this user may see.
    Actor(UserId),
    /// Row filtering is skipped.
    Bypass,
}

impl AccessContext {
    /// Returns the acting user, if any.
    #[must_use]
    pub const fn actor(&self) -> Option<UserId> {
        match self {
            Self::Actor(user_id) => Some(*user_id),
            Self::Bypass => None,
        }
    }

    /// Returns `true` for the bypass context.
    #[must_use]
    pub const fn is_bypass(&self) -> bool {
        matches!(self, Self::Bypass)
    }
}

/// Access level, ordered from weakest to strongest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PermissionLevel {
    /// May view.
    Read,
    /// May edit.
    Write,
    /// May manage.
    Admin,
}

impl PermissionLevel {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Admin => "admin",
        }
    }
}

impl TryFrom<&str> for PermissionLevel {
    type Error = ParseTokenError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "read" => Ok(Self::Read),
            "write" => Ok(Self::Write),
            "admin" => Ok(Self::Admin),
            _ => Err(ParseTokenError::new("permission level", value)),
        }
    }
}

/// A resource that permissions and shared links point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceRef {
    /// A project.
    Project(ProjectId),
    /// A task.
    Task(TaskId),
}

impl ResourceRef {
    /// Stored type token for projects.
    pub const PROJECT_TYPE: &'static str = "project";
    /// Stored type token for tasks.
    pub const TASK_TYPE: &'static str = "task";

    /// Returns the stored resource type token.
    #[must_use]
    pub const fn resource_type(&self) -> &'static str {
        match self {
            Self::Project(_) => Self::PROJECT_TYPE,
            Self::Task(_) => Self::TASK_TYPE,
        }
    }

    /// Returns the raw identifier of the referenced row.
    #[must_use]
    pub const fn resource_id(&self) -> Uuid {
        match self {
            Self::Project(project_id) => project_id.into_inner(),
            Self::Task(task_id) => task_id.into_inner(),
        }
    }

    /// Rebuilds a reference from its stored columns.
    ///
    /// # Errors
    ///
    /// Returns [`ParseTokenError`] for an unknown resource type.
    pub fn from_stored(resource_type: &str, resource_id: Uuid) -> Result<Self, ParseTokenError> {
        match resource_type {
            Self::PROJECT_TYPE => Ok(Self::Project(ProjectId::from_uuid(resource_id))),
            Self::TASK_TYPE => Ok(Self::Task(TaskId::from_uuid(resource_id))),
            _ => Err(ParseTokenError::new("resource type", resource_type)),
        }
    }
}

/// A permission granted to one user on one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGrant {
    /// Grant identifier.
    pub id: PermissionId,
    /// Grantee.
    pub user_id: UserId,
    /// Resource covered.
    pub resource: ResourceRef,
    /// Level granted.
    pub level: PermissionLevel,
    /// User who issued the grant.
    pub granted_by: Option<UserId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Everything the policy needs to decide one access question.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccessFacts {
    /// Role in the organization owning the resource.
    pub membership: Option<MemberRole>,
    /// The user created the task.
    pub is_creator: bool,
    /// The task is assigned to the user.
    pub is_assignee: bool,
    /// Strongest explicit grant covering the resource.
    pub grant: Option<PermissionLevel>,
}

impl AccessFacts {
    /// Collects facts about `user_id` for a task.
    ///
    /// Grants on the task and on its project both count.
    #[must_use]
    pub fn for_task<'a>(
        user_id: UserId,
        task: &Task,
        membership: Option<MemberRole>,
        grants: impl IntoIterator<Item = &'a PermissionGrant>,
    ) -> Self {
        let task_ref = ResourceRef::Task(task.id());
        let project_ref = ResourceRef::Project(task.project_id());
        Self {
            membership,
            is_creator: task.creator_id() == Some(user_id),
            is_assignee: task.assignee_id() == Some(user_id),
            grant: strongest_grant(user_id, grants, |resource| {
                resource == task_ref || resource == project_ref
            }),
        }
    }

    /// Collects facts about `user_id` for a project.
    #[must_use]
    pub fn for_project<'a>(
        user_id: UserId,
        project_id: ProjectId,
        membership: Option<MemberRole>,
        grants: impl IntoIterator<Item = &'a PermissionGrant>,
    ) -> Self {
        let project_ref = ResourceRef::Project(project_id);
        Self {
            membership,
            is_creator: false,
            is_assignee: false,
            grant: strongest_grant(user_id, grants, |resource| resource == project_ref),
        }
    }

    /// Decides whether the facts allow `level`.
    #[must_use]
    pub fn allows(&self, level: PermissionLevel) -> bool {
        let granted = self.grant.is_some_and(|grant| grant >= level);
        let involved = self.is_creator || self.is_assignee;
        match level {
            PermissionLevel::Read => granted || involved || self.membership.is_some(),
            PermissionLevel::Write => {
                granted
                    || involved
                    || matches!(
                        self.membership,
                        Some(MemberRole::Admin | MemberRole::Member)
                    )
            }
            PermissionLevel::Admin => {
                granted || self.is_creator || self.membership == Some(MemberRole::Admin)
            }
        }
    }
}

fn strongest_grant<'a>(
    user_id: UserId,
    grants: impl IntoIterator<Item = &'a PermissionGrant>,
    covers: impl Fn(ResourceRef) -> bool,
) -> Option<PermissionLevel> {
    grants
        .into_iter()
        .filter(|grant| grant.user_id == user_id && covers(grant.resource))
        .map(|grant| grant.level)
        .max()
}
