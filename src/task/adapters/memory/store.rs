//! [`TaskStore`] over the in-memory state.

use super::{InMemoryTaskStore, PlanningState, by_board, by_gantt};
use crate::task::{
    domain::{
        AccessContext, DependencyGuard, DependencyId, ExternalNotification, LinkAction,
        NewDependency, NewProject, NewTask, Organization, OrganizationId, OrderingError, PlanImportReport,
        PreparedPlan, Project, ProjectId, ProjectStatus, ResourceRef, ShareRecipient, SharedLink,
        Task, TaskChanges, TaskDependency, TaskId, TaskStatus, unique_slug,
    },
    ports::{ReorderRequest, ReorderTarget, TaskStore, TaskStoreError, TaskStoreResult},
};
use async_trait::async_trait;
use mockable::Clock;

#[async_trait]
impl<C> TaskStore for InMemoryTaskStore<C>
where
    C: Clock + Send + Sync,
{
    async fn create_task(
        &self,
        access: &AccessContext,
        request: NewTask,
    ) -> TaskStoreResult<Task> {
        let mut state = self.write()?;
        let project_id = request.project_id();
        state.visible_project(access, project_id)?;
        if let Some(parent_id) = request.parent_id() {
            ensure_parent_in_project(&state, parent_id, project_id)?;
        }
        let placement = state.ordering(project_id).insert(
            request.id(),
            request.status(),
            request.gantt_order(),
            request.board_order(),
        );
        state.apply_order_plan(&placement.plan, self.clock.as_ref());
        let task = Task::create(
            request,
            placement.gantt_order,
            placement.board_order,
            self.clock.as_ref(),
        );
        state.tasks.insert(task.id(), task.clone());
        Ok(task)
    }

    async fn update_task(
        &self,
        access: &AccessContext,
        task_id: TaskId,
        changes: TaskChanges,
    ) -> TaskStoreResult<Task> {
        let mut state = self.write()?;
        let mut task = state.visible_task(access, task_id)?.clone();
        if let Some(Some(parent_id)) = changes.parent_id() {
            ensure_parent_in_project(&state, parent_id, task.project_id())?;
        }
        task.apply_fields(&changes, self.clock.as_ref())?;
        let edit = changes.order_edit();
        let plan = if edit.is_empty() {
            None
        } else {
            Some(
                state
                    .ordering(task.project_id())
                    .apply_edit(task_id, edit)
                    .map_err(|_| TaskStoreError::TaskNotFound(task_id))?,
            )
        };
        state.tasks.insert(task_id, task);
        if let Some(order_plan) = plan {
            state.apply_order_plan(&order_plan, self.clock.as_ref());
        }
        state
            .tasks
            .get(&task_id)
            .cloned()
            .ok_or(TaskStoreError::TaskNotFound(task_id))
    }

    async fn delete_task(&self, access: &AccessContext, task_id: TaskId) -> TaskStoreResult<()> {
        let mut state = self.write()?;
        let project_id = state.visible_task(access, task_id)?.project_id();
        let plan = state
            .ordering(project_id)
            .remove(task_id)
            .map_err(|_| TaskStoreError::TaskNotFound(task_id))?;
        state.tasks.remove(&task_id);
        state.apply_order_plan(&plan, self.clock.as_ref());
        for task in state.tasks.values_mut() {
            if task.parent_id() == Some(task_id) {
                task.detach_from_parent(self.clock.as_ref());
            }
        }
        let resource = ResourceRef::Task(task_id);
        state.dependencies.retain(|edge| !edge.touches(task_id));
        state.grants.retain(|grant| grant.resource != resource);
        state.shared_links.retain(|link| link.resource() != resource);
        state
            .notifications
            .retain(|notification| notification.task_id != task_id);
        Ok(())
    }

    async fn find_task(
        &self,
        access: &AccessContext,
        task_id: TaskId,
    ) -> TaskStoreResult<Option<Task>> {
        let state = self.read()?;
        Ok(state.visible_task(access, task_id).ok().cloned())
    }

    async fn list_gantt(
        &self,
        access: &AccessContext,
        project_id: ProjectId,
    ) -> TaskStoreResult<Vec<Task>> {
        let state = self.read()?;
        Ok(state.sorted_visible(access, |task| task.project_id() == project_id, by_gantt))
    }

    async fn list_board_column(
        &self,
        access: &AccessContext,
        project_id: ProjectId,
        status: TaskStatus,
    ) -> TaskStoreResult<Vec<Task>> {
        let state = self.read()?;
        Ok(state.sorted_visible(
            access,
            |task| task.project_id() == project_id && task.status() == status,
            by_board,
        ))
    }

    async fn list_board(
        &self,
        access: &AccessContext,
        project_id: ProjectId,
    ) -> TaskStoreResult<Vec<Task>> {
        let state = self.read()?;
        Ok(state.sorted_visible(access, |task| task.project_id() == project_id, by_board))
    }

    async fn list_subtasks(
        &self,
        access: &AccessContext,
        parent_id: TaskId,
    ) -> TaskStoreResult<Vec<Task>> {
        let state = self.read()?;
        Ok(state.sorted_visible(access, |task| task.parent_id() == Some(parent_id), by_gantt))
    }

    async fn reorder(
        &self,
        access: &AccessContext,
        request: ReorderRequest,
    ) -> TaskStoreResult<Vec<Task>> {
        let mut state = self.write()?;
        let ReorderRequest {
            project_id,
            task_id,
            target,
        } = request;
        let current_status = state
            .tasks
            .get(&task_id)
            .filter(|task| task.project_id() == project_id)
            .map(Task::status)
            .ok_or(TaskStoreError::TaskNotInProject {
                task_id,
                project_id,
            })?;
        let final_status = match target {
            ReorderTarget::Gantt { .. } => None,
            ReorderTarget::Board { status, .. } => Some(status.unwrap_or(current_status)),
        };
        let in_scope = |task: &Task| match final_status {
            None => true,
            Some(status) => task.status() == current_status || task.status() == status,
        };
        let hidden = state
            .project_tasks(project_id)
            .any(|task| in_scope(task) && !state.task_visible(access, task));
        if hidden {
            return Err(TaskStoreError::ScopeNotVisible(project_id));
        }
        let ordering = state.ordering(project_id);
        let plan = match target {
            ReorderTarget::Gantt { position } => ordering.move_in_gantt(task_id, position),
            ReorderTarget::Board { position, status } => {
                ordering.move_on_board(task_id, position, status)
            }
        }
        .map_err(|OrderingError::TaskNotInScope(missing)| TaskStoreError::TaskNotInProject {
            task_id: missing,
            project_id,
        })?;
        state.apply_order_plan(&plan, self.clock.as_ref());
        let scope = match final_status {
            None => state.sorted_visible(
                &AccessContext::Bypass,
                |task| task.project_id() == project_id,
                by_gantt,
            ),
            Some(status) => state.sorted_visible(
                &AccessContext::Bypass,
                |task| task.project_id() == project_id && task.status() == status,
                by_board,
            ),
        };
        Ok(scope)
    }

    async fn add_dependency(
        &self,
        access: &AccessContext,
        edge: NewDependency,
    ) -> TaskStoreResult<TaskDependency> {
        let mut state = self.write()?;
        state.visible_task(access, edge.task_id)?;
        state.visible_task(access, edge.dependent_task_id)?;
        DependencyGuard::check(&edge, |from, to| {
            state
                .dependencies
                .iter()
                .any(|existing| existing.task_id() == from && existing.dependent_task_id() == to)
        })?;
        let dependency = TaskDependency::from_parts(DependencyId::new(), edge, self.clock.utc());
        state.dependencies.push(dependency.clone());
        Ok(dependency)
    }

    async fn remove_dependency(
        &self,
        access: &AccessContext,
        dependency_id: DependencyId,
    ) -> TaskStoreResult<()> {
        let mut state = self.write()?;
        let predecessor = state
            .dependencies
            .iter()
            .find(|edge| edge.id() == dependency_id)
            .map(TaskDependency::task_id)
            .ok_or(TaskStoreError::DependencyNotFound(dependency_id))?;
        state
            .visible_task(access, predecessor)
            .map_err(|_| TaskStoreError::DependencyNotFound(dependency_id))?;
        state.dependencies.retain(|edge| edge.id() != dependency_id);
        Ok(())
    }

    async fn list_dependencies(
        &self,
        access: &AccessContext,
        task_id: TaskId,
    ) -> TaskStoreResult<Vec<TaskDependency>> {
        let state = self.read()?;
        state.visible_task(access, task_id)?;
        Ok(state
            .dependencies
            .iter()
            .filter(|edge| edge.touches(task_id))
            .cloned()
            .collect())
    }

    async fn replace_plan(
        &self,
        access: &AccessContext,
        plan: &PreparedPlan,
    ) -> TaskStoreResult<PlanImportReport> {
        let mut state = self.write()?;
        let mut next = state.clone();
        next.notifications.clear();
        next.grants
            .retain(|grant| !matches!(grant.resource, ResourceRef::Task(_)));
        next.shared_links
            .retain(|link| !matches!(link.resource(), ResourceRef::Task(_)));
        next.dependencies.clear();
        next.tasks.clear();
        let (project_id, project_created) =
            find_or_create_plan_project(&mut next, plan, self.clock.as_ref())?;
        let tasks = plan.materialize(project_id, access.actor(), self.clock.as_ref())?;
        let task_ids: Vec<TaskId> = tasks.iter().map(Task::id).collect();
        for task in tasks {
            next.tasks.insert(task.id(), task);
        }
        let created_at = self.clock.utc();
        next.dependencies = plan
            .edges
            .iter()
            .map(|edge| TaskDependency::from_parts(DependencyId::new(), *edge, created_at))
            .collect();
        let report = PlanImportReport {
            project_id,
            project_created,
            task_ids,
            dependency_count: next.dependencies.len(),
            dropped: plan.dropped,
        };
        *state = next;
        Ok(report)
    }

    async fn share_task(
        &self,
        access: &AccessContext,
        task_id: TaskId,
        recipient: ShareRecipient,
    ) -> TaskStoreResult<SharedLink> {
        let mut state = self.write()?;
        let task = state.visible_task(access, task_id)?.clone();
        let link = SharedLink::for_task(&task, self.clock.as_ref());
        let notification = ExternalNotification::task_share(&task, &recipient, self.clock.as_ref());
        state.shared_links.push(link.clone());
        state.notifications.push(notification);
        Ok(link)
    }

    async fn find_shared_link(&self, token: &str) -> TaskStoreResult<Option<SharedLink>> {
        let state = self.read()?;
        Ok(state
            .shared_links
            .iter()
            .find(|link| link.token() == token)
            .cloned())
    }

    async fn redeem_shared_link(
        &self,
        token: &str,
        action: LinkAction,
    ) -> TaskStoreResult<Option<SharedLink>> {
        let mut state = self.write()?;
        let now = self.clock.utc();
        let redeemed = state
            .shared_links
            .iter_mut()
            .find(|link| link.token() == token)
            .filter(|link| link.allows(action, now))
            .map(|link| {
                link.record_use();
                link.clone()
            });
        Ok(redeemed)
    }

    async fn list_notifications(
        &self,
        access: &AccessContext,
        task_id: TaskId,
    ) -> TaskStoreResult<Vec<ExternalNotification>> {
        let state = self.read()?;
        state.visible_task(access, task_id)?;
        Ok(state
            .notifications
            .iter()
            .filter(|notification| notification.task_id == task_id)
            .cloned()
            .collect())
    }
}

fn ensure_parent_in_project(
    state: &PlanningState,
    parent_id: TaskId,
    project_id: ProjectId,
) -> TaskStoreResult<()> {
    let same_project = state
        .tasks
        .get(&parent_id)
        .is_some_and(|parent| parent.project_id() == project_id);
    if same_project {
        Ok(())
    } else {
        Err(TaskStoreError::ParentNotInProject {
            parent_id,
            project_id,
        })
    }
}

fn find_or_create_plan_project(
    state: &mut PlanningState,
    plan: &PreparedPlan,
    clock: &impl Clock,
) -> TaskStoreResult<(ProjectId, bool)> {
    if let Some(existing) = state
        .projects
        .values()
        .filter(|project| project.name() == plan.project.name)
        .min_by_key(|project| project.created_at())
    {
        return Ok((existing.id(), false));
    }
    let oldest = state
        .organizations
        .values()
        .min_by_key(|organization| organization.created_at())
        .map(Organization::id);
    let organization_id = match oldest {
        Some(found) => found,
        None => create_fallback_organization(state, plan, clock)?,
    };
    let request = NewProject::new(organization_id, &plan.project.name)?
        .with_description(plan.project.description.as_str())
        .with_status(ProjectStatus::Active)
        .with_dates(Some(plan.project.start_date), Some(plan.project.end_date));
    let project = Project::create(request, clock);
    let project_id = project.id();
    state.projects.insert(project_id, project);
    Ok((project_id, true))
}

fn create_fallback_organization(
    state: &mut PlanningState,
    plan: &PreparedPlan,
    clock: &impl Clock,
) -> TaskStoreResult<OrganizationId> {
    let slug = unique_slug(&plan.project.fallback_organization_slug, |candidate| {
        state
            .organizations
            .values()
            .any(|organization| organization.slug() == candidate)
    });
    let organization = Organization::new(&plan.project.fallback_organization_name, slug, clock)?;
    let organization_id = organization.id();
    state.organizations.insert(organization_id, organization);
    Ok(organization_id)
}
