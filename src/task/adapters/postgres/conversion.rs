//! Conversions between Diesel rows and domain values.

use super::models::{
    DependencyRow, NotificationRow, OrganizationRow, PermissionRow, ProjectRow, SharedLinkRow,
    TaskFieldsChangeset, TaskOrderChangeset, TaskOrderRow, TaskRow,
};
use crate::task::{
    domain::{
        DependencyId, DependencyType, ExternalNotification, LinkPermissions, NewDependency,
        NotificationId, NotificationStatus, NotificationType, OrderChange, OrderEntry,
        Organization, OrganizationId, PercentComplete, PermissionGrant, PermissionId,
        PermissionLevel, PersistedProjectData, PersistedSharedLinkData, PersistedTaskData,
        Priority, Project, ProjectId, ProjectStatus, Rank, ResourceRef, SharedLink,
        SharedLinkId, Task, TaskDependency, TaskId, TaskStatus, UserId,
    },
    ports::{TaskStoreError, TaskStoreResult},
};
use chrono::{DateTime, Utc};

pub(super) fn rank_to_column(rank: Rank) -> TaskStoreResult<i32> {
    i32::try_from(rank.value()).map_err(TaskStoreError::persistence)
}

fn rank_from_column(value: i32) -> TaskStoreResult<Rank> {
    Ok(Rank::new(i64::from(value))?)
}

fn percent_to_column(percent: PercentComplete) -> i32 {
    i32::from(percent.value())
}

pub(super) fn task_to_row(task: &Task) -> TaskStoreResult<TaskRow> {
    Ok(TaskRow {
        id: task.id().into_inner(),
        project_id: task.project_id().into_inner(),
        parent_id: task.parent_id().map(TaskId::into_inner),
        name: task.name().to_owned(),
        description: task.description().map(str::to_owned),
        creator_id: task.creator_id().map(UserId::into_inner),
        assignee_id: task.assignee_id().map(UserId::into_inner),
        status: task.status().as_str().to_owned(),
        priority: task.priority().as_str().to_owned(),
        percent_complete: percent_to_column(task.percent_complete()),
        start_date: task.start_date(),
        due_date: task.due_date(),
        gantt_order: rank_to_column(task.gantt_order())?,
        board_order: rank_to_column(task.board_order())?,
        created_at: task.created_at(),
        updated_at: task.updated_at(),
    })
}

pub(super) fn row_to_task(row: TaskRow) -> TaskStoreResult<Task> {
    let status = TaskStatus::try_from(row.status.as_str())?;
    let priority = Priority::try_from(row.priority.as_str())?;
    let data = PersistedTaskData {
        id: TaskId::from_uuid(row.id),
        project_id: ProjectId::from_uuid(row.project_id),
        parent_id: row.parent_id.map(TaskId::from_uuid),
        name: row.name,
        description: row.description,
        creator_id: row.creator_id.map(UserId::from_uuid),
        assignee_id: row.assignee_id.map(UserId::from_uuid),
        status,
        priority,
        percent_complete: PercentComplete::new(i64::from(row.percent_complete))?,
        start_date: row.start_date,
        due_date: row.due_date,
        gantt_order: rank_from_column(row.gantt_order)?,
        board_order: rank_from_column(row.board_order)?,
        created_at: row.created_at,
        updated_at: row.updated_at,
    };
    Ok(Task::from_persisted(data))
}

pub(super) fn fields_changeset(task: &Task) -> TaskFieldsChangeset {
    TaskFieldsChangeset {
        parent_id: task.parent_id().map(TaskId::into_inner),
        name: task.name().to_owned(),
        description: task.description().map(str::to_owned),
        assignee_id: task.assignee_id().map(UserId::into_inner),
        priority: task.priority().as_str().to_owned(),
        percent_complete: percent_to_column(task.percent_complete()),
        start_date: task.start_date(),
        due_date: task.due_date(),
        updated_at: task.updated_at(),
    }
}

pub(super) fn order_row_to_entry(row: TaskOrderRow) -> TaskStoreResult<OrderEntry> {
    Ok(OrderEntry {
        task_id: TaskId::from_uuid(row.id),
        status: TaskStatus::try_from(row.status.as_str())?,
        gantt_order: rank_from_column(row.gantt_order)?,
        board_order: rank_from_column(row.board_order)?,
    })
}

pub(super) fn order_changeset(
    change: &OrderChange,
    updated_at: DateTime<Utc>,
) -> TaskStoreResult<TaskOrderChangeset> {
    Ok(TaskOrderChangeset {
        status: change.status.map(|status| status.as_str().to_owned()),
        gantt_order: change.gantt_order.map(rank_to_column).transpose()?,
        board_order: change.board_order.map(rank_to_column).transpose()?,
        updated_at,
    })
}

pub(super) fn organization_to_row(organization: &Organization) -> OrganizationRow {
    OrganizationRow {
        id: organization.id().into_inner(),
        name: organization.name().to_owned(),
        slug: organization.slug().to_owned(),
        created_at: organization.created_at(),
    }
}

pub(super) fn row_to_organization(row: OrganizationRow) -> Organization {
    Organization::from_persisted(
        OrganizationId::from_uuid(row.id),
        row.name,
        row.slug,
        row.created_at,
    )
}

pub(super) fn project_to_row(project: &Project) -> ProjectRow {
    ProjectRow {
        id: project.id().into_inner(),
        organization_id: project.organization_id().into_inner(),
        name: project.name().to_owned(),
        description: project.description().map(str::to_owned),
        status: project.status().as_str().to_owned(),
        start_date: project.start_date(),
        end_date: project.end_date(),
        created_at: project.created_at(),
        updated_at: project.updated_at(),
    }
}

pub(super) fn row_to_project(row: ProjectRow) -> TaskStoreResult<Project> {
    let status = ProjectStatus::try_from(row.status.as_str())?;
    Ok(Project::from_persisted(PersistedProjectData {
        id: ProjectId::from_uuid(row.id),
        organization_id: OrganizationId::from_uuid(row.organization_id),
        name: row.name,
        description: row.description,
        status,
        start_date: row.start_date,
        end_date: row.end_date,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}

pub(super) fn dependency_to_row(dependency: &TaskDependency) -> DependencyRow {
    DependencyRow {
        id: dependency.id().into_inner(),
        task_id: dependency.task_id().into_inner(),
        dependent_task_id: dependency.dependent_task_id().into_inner(),
        dependency_type: dependency.dependency_type().as_str().to_owned(),
        created_at: dependency.created_at(),
    }
}

pub(super) fn row_to_dependency(row: DependencyRow) -> TaskStoreResult<TaskDependency> {
    let dependency_type = DependencyType::try_from(row.dependency_type.as_str())?;
    let edge = NewDependency::new(
        TaskId::from_uuid(row.task_id),
        TaskId::from_uuid(row.dependent_task_id),
    )
    .with_type(dependency_type);
    Ok(TaskDependency::from_parts(
        DependencyId::from_uuid(row.id),
        edge,
        row.created_at,
    ))
}

pub(super) fn grant_to_row(grant: &PermissionGrant) -> PermissionRow {
    PermissionRow {
        id: grant.id.into_inner(),
        user_id: grant.user_id.into_inner(),
        resource_type: grant.resource.resource_type().to_owned(),
        resource_id: grant.resource.resource_id(),
        permission_level: grant.level.as_str().to_owned(),
        granted_by: grant.granted_by.map(UserId::into_inner),
        created_at: grant.created_at,
    }
}

pub(super) fn row_to_grant(row: PermissionRow) -> TaskStoreResult<PermissionGrant> {
    Ok(PermissionGrant {
        id: PermissionId::from_uuid(row.id),
        user_id: UserId::from_uuid(row.user_id),
        resource: ResourceRef::from_stored(&row.resource_type, row.resource_id)?,
        level: PermissionLevel::try_from(row.permission_level.as_str())?,
        granted_by: row.granted_by.map(UserId::from_uuid),
        created_at: row.created_at,
    })
}

pub(super) fn shared_link_to_row(link: &SharedLink) -> TaskStoreResult<SharedLinkRow> {
    let permissions =
        serde_json::to_value(link.permissions()).map_err(TaskStoreError::persistence)?;
    Ok(SharedLinkRow {
        id: link.id().into_inner(),
        token: link.token().to_owned(),
        resource_type: link.resource().resource_type().to_owned(),
        resource_id: link.resource().resource_id(),
        creator_id: link.creator_id().map(UserId::into_inner),
        expires_at: link.expires_at(),
        permissions,
        max_uses: link
            .max_uses()
            .map(i32::try_from)
            .transpose()
            .map_err(TaskStoreError::persistence)?,
        use_count: i32::try_from(link.use_count()).map_err(TaskStoreError::persistence)?,
        created_at: link.created_at(),
    })
}

pub(super) fn row_to_shared_link(row: SharedLinkRow) -> TaskStoreResult<SharedLink> {
    let permissions: LinkPermissions =
        serde_json::from_value(row.permissions).map_err(TaskStoreError::persistence)?;
    Ok(SharedLink::from_persisted(PersistedSharedLinkData {
        id: SharedLinkId::from_uuid(row.id),
        token: row.token,
        resource: ResourceRef::from_stored(&row.resource_type, row.resource_id)?,
        creator_id: row.creator_id.map(UserId::from_uuid),
        expires_at: row.expires_at,
        permissions,
        max_uses: row
            .max_uses
            .map(u32::try_from)
            .transpose()
            .map_err(TaskStoreError::persistence)?,
        use_count: u32::try_from(row.use_count).map_err(TaskStoreError::persistence)?,
        created_at: row.created_at,
    }))
}

pub(super) fn notification_to_row(notification: &ExternalNotification) -> NotificationRow {
    NotificationRow {
        id: notification.id.into_inner(),
        task_id: notification.task_id.into_inner(),
        recipient_email: notification.recipient_email.clone(),
        recipient_name: notification.recipient_name.clone(),
        subject: notification.subject.clone(),
        content: notification.content.clone(),
        status: notification.status.as_str().to_owned(),
        notification_type: notification.notification_type.as_str().to_owned(),
        created_at: notification.created_at,
    }
}

pub(super) fn row_to_notification(row: NotificationRow) -> TaskStoreResult<ExternalNotification> {
    Ok(ExternalNotification {
        id: NotificationId::from_uuid(row.id),
        task_id: TaskId::from_uuid(row.task_id),
        recipient_email: row.recipient_email,
        recipient_name: row.recipient_name,
        subject: row.subject,
        content: row.content,
        status: NotificationStatus::try_from(row.status.as_str())?,
        notification_type: NotificationType::try_from(row.notification_type.as_str())?,
        created_at: row.created_at,
    })
}
