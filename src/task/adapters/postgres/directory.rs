//! [`ProjectDirectory`] and [`Authorizer`] over `PostgreSQL`.

use super::{
    PostgresTaskStore,
    conversion::{grant_to_row, organization_to_row, project_to_row, row_to_project, row_to_task},
    locks::{ORGANIZATION_SLUG_KEY, lock_keys},
    models::{MembershipRow, ProjectRow, TaskRow},
    schema::{organization_members, organizations, permissions, projects, tasks},
    store::visible_project,
    visibility::{Viewer, Visibility, project_organization},
};
use crate::task::{
    domain::{
        AccessContext, Membership, NewProject, Organization, OrganizationId, PermissionGrant,
        PermissionId, PermissionLevel, Project, ProjectId, ResourceRef, UserId, slugify,
        unique_slug,
    },
    ports::{Authorizer, ProjectDirectory, TaskStoreError, TaskStoreResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use mockable::Clock;
use std::collections::HashSet;
use uuid::Uuid;

#[async_trait]
impl<C> ProjectDirectory for PostgresTaskStore<C>
where
    C: Clock + Send + Sync + 'static,
{
    async fn create_organization(&self, name: &str) -> TaskStoreResult<Organization> {
        let requested = name.to_owned();
        self.run_blocking(move |connection, clock| {
            connection.transaction::<_, TaskStoreError, _>(|tx| {
                insert_organization(tx, &requested, &requested, clock)
            })
        })
        .await
    }

    async fn add_member(&self, membership: Membership) -> TaskStoreResult<()> {
        self.run_blocking(move |connection, clock| {
            ensure_organization(connection, membership.organization_id)?;
            let row = MembershipRow {
                organization_id: membership.organization_id.into_inner(),
                user_id: membership.user_id.into_inner(),
                role: membership.role.as_str().to_owned(),
                created_at: clock.utc(),
            };
            diesel::insert_into(organization_members::table)
                .values(&row)
                .on_conflict((
                    organization_members::organization_id,
                    organization_members::user_id,
                ))
                .do_update()
                .set(organization_members::role.eq(&row.role))
                .execute(connection)?;
            Ok(())
        })
        .await
    }

    async fn create_project(&self, request: NewProject) -> TaskStoreResult<Project> {
        self.run_blocking(move |connection, clock| {
            ensure_organization(connection, request.organization_id())?;
            let project = Project::create(request, clock);
            diesel::insert_into(projects::table)
                .values(&project_to_row(&project))
                .execute(connection)?;
            Ok(project)
        })
        .await
    }

    async fn find_project(
        &self,
        access: &AccessContext,
        project_id: ProjectId,
    ) -> TaskStoreResult<Option<Project>> {
        let actor = *access;
        self.run_blocking(move |connection, _clock| {
            let visibility = Visibility::load(connection, &actor)?;
            match visible_project(connection, &visibility, project_id) {
                Ok(_) => {}
                Err(TaskStoreError::ProjectNotFound(_)) => return Ok(None),
                Err(err) => return Err(err),
            }
            projects::table
                .find(project_id.into_inner())
                .select(ProjectRow::as_select())
                .first::<ProjectRow>(connection)
                .optional()?
                .map(row_to_project)
                .transpose()
        })
        .await
    }

    async fn grant_permission(
        &self,
        user_id: UserId,
        resource: ResourceRef,
        level: PermissionLevel,
        granted_by: Option<UserId>,
    ) -> TaskStoreResult<PermissionGrant> {
        self.run_blocking(move |connection, clock| {
            connection.transaction::<_, TaskStoreError, _>(|tx| {
                ensure_resource(tx, resource)?;
                diesel::delete(
                    permissions::table
                        .filter(permissions::user_id.eq(user_id.into_inner()))
                        .filter(permissions::resource_type.eq(resource.resource_type()))
                        .filter(permissions::resource_id.eq(resource.resource_id())),
                )
                .execute(tx)?;
                let grant = PermissionGrant {
                    id: PermissionId::new(),
                    user_id,
                    resource,
                    level,
                    granted_by,
                    created_at: clock.utc(),
                };
                diesel::insert_into(permissions::table)
                    .values(&grant_to_row(&grant))
                    .execute(tx)?;
                Ok(grant)
            })
        })
        .await
    }
}

#[async_trait]
impl<C> Authorizer for PostgresTaskStore<C>
where
    C: Clock + Send + Sync + 'static,
{
    async fn authorize(
        &self,
        user_id: UserId,
        resource: ResourceRef,
        level: PermissionLevel,
    ) -> TaskStoreResult<bool> {
        self.run_blocking(move |connection, _clock| {
            let viewer = Viewer::load(connection, user_id)?;
            let facts = match resource {
                ResourceRef::Project(project_id) => project_organization(connection, project_id)?
                    .map(|organization_id| viewer.project_facts(project_id, organization_id)),
                ResourceRef::Task(task_id) => {
                    let row = tasks::table
                        .find(task_id.into_inner())
                        .select(TaskRow::as_select())
                        .first::<TaskRow>(connection)
                        .optional()?;
                    match row {
                        None => None,
                        Some(found) => {
                            let task = row_to_task(found)?;
                            project_organization(connection, task.project_id())?
                                .map(|organization_id| viewer.task_facts(&task, organization_id))
                        }
                    }
                }
            };
            Ok(facts.is_some_and(|found| found.allows(level)))
        })
        .await
    }
}

/// Inserts an organization whose slug is derived from `slug_source` and
/// de-duplicated against existing slugs.
pub(super) fn insert_organization(
    connection: &mut PgConnection,
    name: &str,
    slug_source: &str,
    clock: &impl Clock,
) -> TaskStoreResult<Organization> {
    lock_keys(connection, [ORGANIZATION_SLUG_KEY.to_owned()])?;
    let base = slugify(slug_source);
    let taken: HashSet<String> = organizations::table
        .filter(organizations::slug.like(format!("{base}%")))
        .select(organizations::slug)
        .load::<String>(connection)?
        .into_iter()
        .collect();
    let slug = unique_slug(slug_source, |candidate| taken.contains(candidate));
    let organization = Organization::new(name, slug, clock)?;
    diesel::insert_into(organizations::table)
        .values(&organization_to_row(&organization))
        .execute(connection)?;
    Ok(organization)
}

fn ensure_organization(
    connection: &mut PgConnection,
    organization_id: OrganizationId,
) -> TaskStoreResult<()> {
    let found = organizations::table
        .find(organization_id.into_inner())
        .select(organizations::id)
        .first::<Uuid>(connection)
        .optional()?;
    found
        .map(|_| ())
        .ok_or(TaskStoreError::OrganizationNotFound(organization_id))
}

fn ensure_resource(connection: &mut PgConnection, resource: ResourceRef) -> TaskStoreResult<()> {
    match resource {
        ResourceRef::Project(project_id) => project_organization(connection, project_id)?
            .map(|_| ())
            .ok_or(TaskStoreError::ProjectNotFound(project_id)),
        ResourceRef::Task(task_id) => tasks::table
            .find(task_id.into_inner())
            .select(tasks::id)
            .first::<Uuid>(connection)
            .optional()?
            .map(|_| ())
            .ok_or(TaskStoreError::TaskNotFound(task_id)),
    }
}
