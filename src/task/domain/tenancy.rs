//! Organizations, memberships and projects.

use super::{OrganizationId, ParseTokenError, ProjectId, TaskDomainError, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// A tenant owning projects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    id: OrganizationId,
    name: String,
    slug: String,
    created_at: DateTime<Utc>,
}

impl Organization {
    /// Creates an organization with an already de-duplicated slug.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyOrganizationName`] for a blank name.
    pub fn new(
        name: &str,
        slug: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<Self, TaskDomainError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(TaskDomainError::EmptyOrganizationName);
        }
        Ok(Self {
            id: OrganizationId::new(),
            name: trimmed.to_owned(),
            slug: slug.into(),
            created_at: clock.utc(),
        })
    }

    /// Reconstructs an organization from storage.
    #[must_use]
    pub const fn from_persisted(
        id: OrganizationId,
        name: String,
        slug: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            slug,
            created_at,
        }
    }

    /// Returns the identifier.
    #[must_use]
    pub const fn id(&self) -> OrganizationId {
        self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the unique URL slug.
    #[must_use]
    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Lowercases `name` and joins its alphanumeric runs with `-`.
#[must_use]
pub fn slugify(name: &str) -> String {
    name.split(|ch: char| !ch.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// Derives a slug for `name` that `is_taken` does not report, appending
/// `-1`, `-2`, and so on until one is free.
#[must_use]
pub fn unique_slug(name: &str, is_taken: impl Fn(&str) -> bool) -> String {
    let base = slugify(name);
    if !is_taken(&base) {
        return base;
    }
    (1_u32..)
        .map(|counter| format!("{base}-{counter}"))
        .find(|candidate| !is_taken(candidate))
        .unwrap_or(base)
}

/// Role of a user inside an organization.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    /// Full control over the organization's projects.
    Admin,
    /// Can read and edit.
    #[default]
    Member,
    /// Read-only access.
    Viewer,
}

impl MemberRole {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Member => "member",
            Self::Viewer => "viewer",
        }
    }
}

impl TryFrom<&str> for MemberRole {
    type Error = ParseTokenError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "admin" => Ok(Self::Admin),
            "member" => Ok(Self::Member),
            "viewer" => Ok(Self::Viewer),
            _ => Err(ParseTokenError::new("member role", value)),
        }
    }
}

/// A user's membership in an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Membership {
    /// Organization joined.
    pub organization_id: OrganizationId,
    /// Member.
    pub user_id: UserId,
    /// Role held.
    pub role: MemberRole,
}

/// Lifecycle stage of a project.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    /// Being planned.
    #[default]
    Planning,
    /// In progress.
    Active,
    /// Paused.
    OnHold,
    /// Finished.
    Completed,
    /// Archived.
    Archived,
}

impl ProjectStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Planning => "planning",
            Self::Active => "active",
            Self::OnHold => "on_hold",
            Self::Completed => "completed",
            Self::Archived => "archived",
        }
    }
}

impl TryFrom<&str> for ProjectStatus {
    type Error = ParseTokenError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "planning" => Ok(Self::Planning),
            "active" => Ok(Self::Active),
            "on_hold" => Ok(Self::OnHold),
            "completed" => Ok(Self::Completed),
            "archived" => Ok(Self::Archived),
            _ => Err(ParseTokenError::new("project status", value)),
        }
    }
}

/// A project owned by an organization; the scope of task orderings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    id: ProjectId,
    organization_id: OrganizationId,
    name: String,
    description: Option<String>,
    status: ProjectStatus,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedProjectData {
    /// Project identifier.
    pub id: ProjectId,
    /// Owning organization.
    pub organization_id: OrganizationId,
    /// Project name.
    pub name: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Lifecycle stage.
    pub status: ProjectStatus,
    /// Planned start.
    pub start_date: Option<NaiveDate>,
    /// Planned end.
    pub end_date: Option<NaiveDate>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Builds a project from a creation request.
    #[must_use]
    pub fn create(request: NewProject, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: ProjectId::new(),
            organization_id: request.organization_id,
            name: request.name,
            description: request.description,
            status: request.status,
            start_date: request.start_date,
            end_date: request.end_date,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a project from storage.
    #[must_use]
    pub fn from_persisted(data: PersistedProjectData) -> Self {
        Self {
            id: data.id,
            organization_id: data.organization_id,
            name: data.name,
            description: data.description,
            status: data.status,
            start_date: data.start_date,
            end_date: data.end_date,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the identifier.
    #[must_use]
    pub const fn id(&self) -> ProjectId {
        self.id
    }

    /// Returns the owning organization.
    #[must_use]
    pub const fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }

    /// Returns the name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the lifecycle stage.
    #[must_use]
    pub const fn status(&self) -> ProjectStatus {
        self.status
    }

    /// Returns the planned start.
    #[must_use]
    pub const fn start_date(&self) -> Option<NaiveDate> {
        self.start_date
    }

    /// Returns the planned end.
    #[must_use]
    pub const fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
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
}

/// Request payload for creating a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProject {
    organization_id: OrganizationId,
    name: String,
    description: Option<String>,
    status: ProjectStatus,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
}

impl NewProject {
    /// Creates a request in the `planning` stage.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyProjectName`] for a blank name.
    pub fn new(organization_id: OrganizationId, name: &str) -> Result<Self, TaskDomainError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(TaskDomainError::EmptyProjectName);
        }
        Ok(Self {
            organization_id,
            name: trimmed.to_owned(),
            description: None,
            status: ProjectStatus::default(),
            start_date: None,
            end_date: None,
        })
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the lifecycle stage.
    #[must_use]
    pub const fn with_status(mut self, status: ProjectStatus) -> Self {
        self.status = status;
        self
    }

    /// Sets the planned dates.
    #[must_use]
    pub const fn with_dates(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    /// Returns the owning organization.
    #[must_use]
    pub const fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }

    /// Returns the requested name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}
