//! Tenancy port: organizations, memberships, projects and grants.

use super::TaskStoreResult;
use crate::task::domain::{
    AccessContext, Membership, NewProject, Organization, PermissionGrant, PermissionLevel,
    Project, ProjectId, ResourceRef, UserId,
};
use async_trait::async_trait;

/// Organization and project directory.
#[async_trait]
pub trait ProjectDirectory: Send + Sync {
    /// Creates an organization, de-duplicating its slug.
    ///
    /// # Errors
    ///
    /// Returns a domain error for a blank name.
    async fn create_organization(&self, name: &str) -> TaskStoreResult<Organization>;

    /// Adds or replaces a membership.
    ///
    /// # Errors
    ///
    /// Returns [`super::TaskStoreError::OrganizationNotFound`] for an unknown
    /// organization.
    async fn add_member(&self, membership: Membership) -> TaskStoreResult<()>;

    /// Creates a project.
    ///
    /// # Errors
    ///
    /// Returns [`super::TaskStoreError::OrganizationNotFound`] for an unknown
    /// organization.
    async fn create_project(&self, request: NewProject) -> TaskStoreResult<Project>;

    /// Finds a project visible to `access`.
    async fn find_project(
        &self,
        access: &AccessContext,
        project_id: ProjectId,
    ) -> TaskStoreResult<Option<Project>>;

    /// Grants `level` on `resource` to `user_id`, replacing an earlier grant
    /// for the same pair.
    ///
    /// # Errors
    ///
    /// Returns a not-found error when the resource does not exist.
    async fn grant_permission(
        &self,
        user_id: UserId,
        resource: ResourceRef,
        level: PermissionLevel,
        granted_by: Option<UserId>,
    ) -> TaskStoreResult<PermissionGrant>;
}
