//! Domain model for project planning.
//!
//! Tasks carry two dense orderings: a project-wide Gantt sequence and a
//! per-status board column sequence. The pure planner in [`ordering`] keeps
//! both gap-free; persistence concerns stay outside of the domain boundary.

mod access;
mod dependency;
mod error;
mod ids;
pub mod ordering;
mod plan;
mod rank;
mod sharing;
mod task;
mod tenancy;

pub use access::{AccessContext, AccessFacts, PermissionGrant, PermissionLevel, ResourceRef};
pub use dependency::{
    DependencyGuard, DependencyRuleViolation, DependencyType, NewDependency, TaskDependency,
};
pub use error::{ParseTokenError, TaskDomainError};
pub use ids::{
    DependencyId, NotificationId, OrganizationId, PermissionId, ProjectId, SharedLinkId, TaskId,
    UserId,
};
pub use ordering::{
    OrderChange, OrderEdit, OrderEntry, OrderPlan, OrderingError, Placement, ProjectOrdering,
};
pub use plan::{
    DEFAULT_PLAN_PROMPT, DependencyDraft, DroppedReferences, InvalidPlanError, MalformedPlanError,
    PlanDraft,
    PlanImportReport, PlanImportSettings, PlanProject, PreparedPlan, PreparedTask, TaskDraft,
    backfill_names, is_generic_name, leading_clause, parse_plan_date, plan_status,
    truncate_on_word,
};
pub use rank::Rank;
pub use sharing::{
    ExternalNotification, LinkAction, LinkPermissions, NotificationStatus, NotificationType,
    PersistedSharedLinkData, SHARE_LINK_MAX_USES, SHARE_LINK_TTL_DAYS, ShareRecipient,
    SharedLink,
};
pub use task::{
    NewTask, PercentComplete, PersistedTaskData, Priority, Task, TaskChanges, TaskStatus,
};
pub use tenancy::{
    MemberRole, Membership, NewProject, Organization, PersistedProjectData, Project,
    ProjectStatus, slugify, unique_slug,
};
