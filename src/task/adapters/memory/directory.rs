//! [`ProjectDirectory`] and [`Authorizer`] over the in-memory state.

use super::InMemoryTaskStore;
use crate::task::{
    domain::{
        AccessContext, Membership, NewProject, Organization, PermissionGrant, PermissionId,
        PermissionLevel, Project, ProjectId, ResourceRef, UserId, unique_slug,
    },
    ports::{Authorizer, ProjectDirectory, TaskStoreError, TaskStoreResult},
};
use async_trait::async_trait;
use mockable::Clock;

#[async_trait]
impl<C> ProjectDirectory for InMemoryTaskStore<C>
where
    C: Clock + Send + Sync,
{
    async fn create_organization(&self, name: &str) -> TaskStoreResult<Organization> {
        let mut state = self.write()?;
        let slug = unique_slug(name, |candidate| {
            state
                .organizations
                .values()
                .any(|organization| organization.slug() == candidate)
        });
        let organization = Organization::new(name, slug, self.clock.as_ref())?;
        state
            .organizations
            .insert(organization.id(), organization.clone());
        Ok(organization)
    }

    async fn add_member(&self, membership: Membership) -> TaskStoreResult<()> {
        let mut state = self.write()?;
        if !state
            .organizations
            .contains_key(&membership.organization_id)
        {
            return Err(TaskStoreError::OrganizationNotFound(
                membership.organization_id,
            ));
        }
        state.memberships.insert(
            (membership.organization_id, membership.user_id),
            membership.role,
        );
        Ok(())
    }

    async fn create_project(&self, request: NewProject) -> TaskStoreResult<Project> {
        let mut state = self.write()?;
        let organization_id = request.organization_id();
        if !state.organizations.contains_key(&organization_id) {
            return Err(TaskStoreError::OrganizationNotFound(organization_id));
        }
        let project = Project::create(request, self.clock.as_ref());
        state.projects.insert(project.id(), project.clone());
        Ok(project)
    }

    async fn find_project(
        &self,
        access: &AccessContext,
        project_id: ProjectId,
    ) -> TaskStoreResult<Option<Project>> {
        let state = self.read()?;
        Ok(state.visible_project(access, project_id).ok().cloned())
    }

    async fn grant_permission(
        &self,
        user_id: UserId,
        resource: ResourceRef,
        level: PermissionLevel,
        granted_by: Option<UserId>,
    ) -> TaskStoreResult<PermissionGrant> {
        let mut state = self.write()?;
        state.resource_exists(resource)?;
        let grant = PermissionGrant {
            id: PermissionId::new(),
            user_id,
            resource,
            level,
            granted_by,
            created_at: self.clock.utc(),
        };
        state
            .grants
            .retain(|existing| !(existing.user_id == user_id && existing.resource == resource));
        state.grants.push(grant.clone());
        Ok(grant)
    }
}

#[async_trait]
impl<C> Authorizer for InMemoryTaskStore<C>
where
    C: Clock + Send + Sync,
{
    async fn authorize(
        &self,
        user_id: UserId,
        resource: ResourceRef,
        level: PermissionLevel,
    ) -> TaskStoreResult<bool> {
        let state = self.read()?;
        let facts = match resource {
            ResourceRef::Project(project_id) => state
                .projects
                .get(&project_id)
                .map(|project| state.project_facts(user_id, project)),
            ResourceRef::Task(task_id) => state
                .tasks
                .get(&task_id)
                .map(|task| state.task_facts(user_id, task)),
        };
        Ok(facts.is_some_and(|found| found.allows(level)))
    }
}
