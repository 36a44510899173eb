//! Diesel row models for planning persistence.

use super::schema::{
    external_notifications, organization_members, organizations, permissions, projects,
    shared_links, task_dependencies, tasks,
};
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

/// Row of the `organizations` table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = organizations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrganizationRow {
    /// Organization identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Unique URL slug.
    pub slug: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Row of the `organization_members` table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = organization_members)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MembershipRow {
    /// Organization joined.
    pub organization_id: Uuid,
    /// Member.
    pub user_id: Uuid,
    /// Role held.
    pub role: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Row of the `projects` table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = projects)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProjectRow {
    /// Project identifier.
    pub id: Uuid,
    /// Owning organization.
    pub organization_id: Uuid,
    /// Project name.
    pub name: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Lifecycle stage.
    pub status: String,
    /// Planned start.
    pub start_date: Option<NaiveDate>,
    /// Planned end.
    pub end_date: Option<NaiveDate>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Row of the `tasks` table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Task identifier.
    pub id: Uuid,
    /// Owning project.
    pub project_id: Uuid,
    /// Parent task for subtasks.
    pub parent_id: Option<Uuid>,
    /// Task name.
    pub name: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Creating user.
    pub creator_id: Option<Uuid>,
    /// Assigned user.
    pub assignee_id: Option<Uuid>,
    /// Board column.
    pub status: String,
    /// Urgency.
    pub priority: String,
    /// Completion percentage.
    pub percent_complete: i32,
    /// Planned start.
    pub start_date: Option<NaiveDate>,
    /// Planned finish.
    pub due_date: Option<NaiveDate>,
    /// Gantt position.
    pub gantt_order: i32,
    /// Board position.
    pub board_order: i32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Ordering columns loaded for the ordering planner.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskOrderRow {
    /// Task identifier.
    pub id: Uuid,
    /// Board column.
    pub status: String,
    /// Gantt position.
    pub gantt_order: i32,
    /// Board position.
    pub board_order: i32,
}

/// Partial update of the ordering columns; `None` fields are left alone.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = tasks)]
pub struct TaskOrderChangeset {
    /// New board column.
    pub status: Option<String>,
    /// New Gantt position.
    pub gantt_order: Option<i32>,
    /// New board position.
    pub board_order: Option<i32>,
    /// Update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Full update of the editable non-ordering columns.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = tasks)]
#[diesel(treat_none_as_null = true)]
pub struct TaskFieldsChangeset {
    /// Parent task.
    pub parent_id: Option<Uuid>,
    /// Task name.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Assigned user.
    pub assignee_id: Option<Uuid>,
    /// Urgency.
    pub priority: String,
    /// Completion percentage.
    pub percent_complete: i32,
    /// Planned start.
    pub start_date: Option<NaiveDate>,
    /// Planned finish.
    pub due_date: Option<NaiveDate>,
    /// Update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Row of the `task_dependencies` table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = task_dependencies)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DependencyRow {
    /// Edge identifier.
    pub id: Uuid,
    /// Predecessor task.
    pub task_id: Uuid,
    /// Dependent task.
    pub dependent_task_id: Uuid,
    /// Relationship type.
    pub dependency_type: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Row of the `permissions` table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = permissions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PermissionRow {
    /// Grant identifier.
    pub id: Uuid,
    /// Grantee.
    pub user_id: Uuid,
    /// Resource type token.
    pub resource_type: String,
    /// Covered row.
    pub resource_id: Uuid,
    /// Level token.
    pub permission_level: String,
    /// Issuing user.
    pub granted_by: Option<Uuid>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Row of the `shared_links` table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = shared_links)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SharedLinkRow {
    /// Link identifier.
    pub id: Uuid,
    /// Opaque lookup token.
    pub token: String,
    /// Resource type token.
    pub resource_type: String,
    /// Shared row.
    pub resource_id: Uuid,
    /// Sharing user.
    pub creator_id: Option<Uuid>,
    /// Expiry instant.
    pub expires_at: Option<DateTime<Utc>>,
    /// Granted actions.
    pub permissions: Value,
    /// Redemption limit.
    pub max_uses: Option<i32>,
    /// Redemptions so far.
    pub use_count: i32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Row of the `external_notifications` table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = external_notifications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NotificationRow {
    /// Notification identifier.
    pub id: Uuid,
    /// Task the message is about.
    pub task_id: Uuid,
    /// Recipient address.
    pub recipient_email: String,
    /// Recipient display name.
    pub recipient_name: Option<String>,
    /// Subject line.
    pub subject: String,
    /// Message body.
    pub content: String,
    /// Delivery state token.
    pub status: String,
    /// Type token.
    pub notification_type: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}
