//! In-memory store for planning tests.
//!
//! Every operation takes the single state lock, so each mutation is one
//! serialized unit exactly like a transaction in the `PostgreSQL` adapter.

mod directory;
mod store;

use crate::task::{
    domain::{
        AccessContext, AccessFacts, ExternalNotification, MemberRole, OrderEntry, OrderPlan,
        Organization, OrganizationId, PermissionGrant, PermissionLevel, Project, ProjectId,
        ProjectOrdering, ResourceRef, SharedLink, Task, TaskDependency, TaskId, UserId,
    },
    ports::{TaskStoreError, TaskStoreResult},
};
use mockable::Clock;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Thread-safe in-memory implementation of the store, directory and
/// authorizer ports.
#[derive(Debug, Clone)]
pub struct InMemoryTaskStore<C> {
    state: Arc<RwLock<PlanningState>>,
    clock: Arc<C>,
}

#[derive(Debug, Clone, Default)]
struct PlanningState {
    organizations: HashMap<OrganizationId, Organization>,
    memberships: HashMap<(OrganizationId, UserId), MemberRole>,
    projects: HashMap<ProjectId, Project>,
    tasks: HashMap<TaskId, Task>,
    dependencies: Vec<TaskDependency>,
    grants: Vec<PermissionGrant>,
    shared_links: Vec<SharedLink>,
    notifications: Vec<ExternalNotification>,
}

impl<C> InMemoryTaskStore<C>
where
    C: Clock + Send + Sync,
{
    /// Creates an empty store.
    #[must_use]
    pub fn new(clock: Arc<C>) -> Self {
        Self {
            state: Arc::new(RwLock::new(PlanningState::default())),
            clock,
        }
    }

    fn read(&self) -> TaskStoreResult<RwLockReadGuard<'_, PlanningState>> {
        self.state
            .read()
            .map_err(|err| TaskStoreError::persistence(std::io::Error::other(err.to_string())))
    }

    fn write(&self) -> TaskStoreResult<RwLockWriteGuard<'_, PlanningState>> {
        self.state
            .write()
            .map_err(|err| TaskStoreError::persistence(std::io::Error::other(err.to_string())))
    }
}

impl PlanningState {
    fn membership(&self, user_id: UserId, organization_id: OrganizationId) -> Option<MemberRole> {
        self.memberships.get(&(organization_id, user_id)).copied()
    }

    fn task_facts(&self, user_id: UserId, task: &Task) -> AccessFacts {
        let membership = self
            .projects
            .get(&task.project_id())
            .and_then(|project| self.membership(user_id, project.organization_id()));
        AccessFacts::for_task(user_id, task, membership, &self.grants)
    }

    fn project_facts(&self, user_id: UserId, project: &Project) -> AccessFacts {
        let membership = self.membership(user_id, project.organization_id());
        AccessFacts::for_project(user_id, project.id(), membership, &self.grants)
    }

    fn task_visible(&self, access: &AccessContext, task: &Task) -> bool {
        access.actor().is_none_or(|user_id| {
            self.task_facts(user_id, task)
                .allows(PermissionLevel::Read)
        })
    }

    fn project_visible(&self, access: &AccessContext, project: &Project) -> bool {
        access.actor().is_none_or(|user_id| {
            self.project_facts(user_id, project)
                .allows(PermissionLevel::Read)
        })
    }

    fn visible_task(&self, access: &AccessContext, task_id: TaskId) -> TaskStoreResult<&Task> {
        self.tasks
            .get(&task_id)
            .filter(|task| self.task_visible(access, task))
            .ok_or(TaskStoreError::TaskNotFound(task_id))
    }

    fn visible_project(
        &self,
        access: &AccessContext,
        project_id: ProjectId,
    ) -> TaskStoreResult<&Project> {
        self.projects
            .get(&project_id)
            .filter(|project| self.project_visible(access, project))
            .ok_or(TaskStoreError::ProjectNotFound(project_id))
    }

    fn project_tasks(&self, project_id: ProjectId) -> impl Iterator<Item = &Task> {
        self.tasks
            .values()
            .filter(move |task| task.project_id() == project_id)
    }

    fn ordering(&self, project_id: ProjectId) -> ProjectOrdering {
        ProjectOrdering::new(self.project_tasks(project_id).map(order_entry))
    }

    fn apply_order_plan(&mut self, plan: &OrderPlan, clock: &impl Clock) {
        for change in plan.changes() {
            if let Some(task) = self.tasks.get_mut(&change.task_id) {
                let status = change.status.unwrap_or_else(|| task.status());
                let gantt_order = change.gantt_order.unwrap_or_else(|| task.gantt_order());
                let board_order = change.board_order.unwrap_or_else(|| task.board_order());
                task.set_ordering(status, gantt_order, board_order, clock);
            }
        }
    }

    fn sorted_visible(
        &self,
        access: &AccessContext,
        keep: impl Fn(&Task) -> bool,
        mut compare: impl FnMut(&Task, &Task) -> std::cmp::Ordering,
    ) -> Vec<Task> {
        let mut rows: Vec<Task> = self
            .tasks
            .values()
            .filter(|task| keep(task) && self.task_visible(access, task))
            .cloned()
            .collect();
        rows.sort_by(|left, right| compare(left, right));
        rows
    }

    fn resource_exists(&self, resource: ResourceRef) -> TaskStoreResult<()> {
        match resource {
            ResourceRef::Project(project_id) if !self.projects.contains_key(&project_id) => {
                Err(TaskStoreError::ProjectNotFound(project_id))
            }
            ResourceRef::Task(task_id) if !self.tasks.contains_key(&task_id) => {
                Err(TaskStoreError::TaskNotFound(task_id))
            }
            _ => Ok(()),
        }
    }
}

const fn order_entry(task: &Task) -> OrderEntry {
    OrderEntry {
        task_id: task.id(),
        status: task.status(),
        gantt_order: task.gantt_order(),
        board_order: task.board_order(),
    }
}

fn by_gantt(left: &Task, right: &Task) -> std::cmp::Ordering {
    left.gantt_order().cmp(&right.gantt_order())
}

fn by_board(left: &Task, right: &Task) -> std::cmp::Ordering {
    (left.status(), left.board_order()).cmp(&(right.status(), right.board_order()))
}
