//! Loads the facts the access policy needs for one actor.

use super::{
    conversion::row_to_grant,
    models::{MembershipRow, PermissionRow},
    schema::{organization_members, permissions, projects},
};
use crate::task::{
    domain::{
        AccessContext, AccessFacts, MemberRole, OrganizationId, PermissionGrant, PermissionLevel,
        ProjectId, Task, UserId,
    },
    ports::TaskStoreResult,
};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use std::collections::HashMap;

/// Memberships and grants of one user, loaded once per transaction.
#[derive(Debug, Clone)]
pub(super) struct Viewer {
    user_id: UserId,
    roles: HashMap<OrganizationId, MemberRole>,
    grants: Vec<PermissionGrant>,
}

impl Viewer {
    pub(super) fn load(connection: &mut PgConnection, user_id: UserId) -> TaskStoreResult<Self> {
        let membership_rows = organization_members::table
            .filter(organization_members::user_id.eq(user_id.into_inner()))
            .select(MembershipRow::as_select())
            .load::<MembershipRow>(connection)?;
        let mut roles = HashMap::with_capacity(membership_rows.len());
        for row in membership_rows {
            roles.insert(
                OrganizationId::from_uuid(row.organization_id),
                MemberRole::try_from(row.role.as_str())?,
            );
        }
        let grants = permissions::table
            .filter(permissions::user_id.eq(user_id.into_inner()))
            .select(PermissionRow::as_select())
            .load::<PermissionRow>(connection)?
            .into_iter()
            .map(row_to_grant)
            .collect::<TaskStoreResult<Vec<_>>>()?;
        Ok(Self {
            user_id,
            roles,
            grants,
        })
    }

    pub(super) fn task_facts(&self, task: &Task, organization_id: OrganizationId) -> AccessFacts {
        AccessFacts::for_task(
            self.user_id,
            task,
            self.roles.get(&organization_id).copied(),
            &self.grants,
        )
    }

    pub(super) fn project_facts(
        &self,
        project_id: ProjectId,
        organization_id: OrganizationId,
    ) -> AccessFacts {
        AccessFacts::for_project(
            self.user_id,
            project_id,
            self.roles.get(&organization_id).copied(),
            &self.grants,
        )
    }
}

/// What an [`AccessContext`] may see inside one transaction.
#[derive(Debug, Clone)]
pub(super) enum Visibility {
    Everything,
    Limited(Viewer),
}

impl Visibility {
    pub(super) fn load(
        connection: &mut PgConnection,
        access: &AccessContext,
    ) -> TaskStoreResult<Self> {
        match access.actor() {
            None => Ok(Self::Everything),
            Some(user_id) => Ok(Self::Limited(Viewer::load(connection, user_id)?)),
        }
    }

    pub(super) fn sees_task(&self, task: &Task, organization_id: OrganizationId) -> bool {
        match self {
            Self::Everything => true,
            Self::Limited(viewer) => viewer
                .task_facts(task, organization_id)
                .allows(PermissionLevel::Read),
        }
    }

    pub(super) fn sees_project(
        &self,
        project_id: ProjectId,
        organization_id: OrganizationId,
    ) -> bool {
        match self {
            Self::Everything => true,
            Self::Limited(viewer) => viewer
                .project_facts(project_id, organization_id)
                .allows(PermissionLevel::Read),
        }
    }
}

/// Returns the organization owning `project_id`, if the project exists.
pub(super) fn project_organization(
    connection: &mut PgConnection,
    project_id: ProjectId,
) -> TaskStoreResult<Option<OrganizationId>> {
    let organization = projects::table
        .filter(projects::id.eq(project_id.into_inner()))
        .select(projects::organization_id)
        .first::<uuid::Uuid>(connection)
        .optional()?;
    Ok(organization.map(OrganizationId::from_uuid))
}
