//! [`TaskStore`] over `PostgreSQL`.

use super::{
    PostgresTaskStore,
    conversion::{
        dependency_to_row, fields_changeset, notification_to_row, order_changeset,
        order_row_to_entry, project_to_row, row_to_dependency, row_to_notification,
        row_to_shared_link, row_to_task, shared_link_to_row, task_to_row,
    },
    directory::insert_organization,
    locks::{
        PLAN_IMPORT_KEY, board_key, board_keys, dependency_key, gantt_key, lock_keys,
        lock_tasks_for_import, lock_tasks_for_write, set_actor_context,
    },
    models::{
        DependencyRow, NotificationRow, ProjectRow, SharedLinkRow, TaskOrderRow, TaskRow,
    },
    schema::{
        external_notifications, organizations, permissions, projects, shared_links,
        task_dependencies, tasks,
    },
    visibility::{Visibility, project_organization},
};
use crate::task::{
    domain::{
        AccessContext, DependencyGuard, DependencyId, DependencyRuleViolation,
        ExternalNotification, LinkAction, NewDependency, NewProject, NewTask, OrderPlan,
        OrderingError, OrganizationId, PlanImportReport, PreparedPlan, Project, ProjectId,
        ProjectOrdering, ProjectStatus, ResourceRef, ShareRecipient, SharedLink, Task,
        TaskChanges, TaskDependency, TaskId, TaskStatus,
    },
    ports::{ReorderRequest, ReorderTarget, TaskStore, TaskStoreError, TaskStoreResult},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};
use mockable::Clock;
use uuid::Uuid;

const DEPENDENCY_PAIR_CONSTRAINT: &str = "task_dependencies_pair_unique";

#[async_trait]
impl<C> TaskStore for PostgresTaskStore<C>
where
    C: Clock + Send + Sync + 'static,
{
    async fn create_task(
        &self,
        access: &AccessContext,
        request: NewTask,
    ) -> TaskStoreResult<Task> {
        let actor = *access;
        self.run_blocking(move |connection, clock| {
            connection.transaction::<_, TaskStoreError, _>(|tx| {
                set_actor_context(tx, &actor)?;
                lock_tasks_for_write(tx)?;
                let visibility = Visibility::load(tx, &actor)?;
                let project_id = request.project_id();
                visible_project(tx, &visibility, project_id)?;
                if let Some(parent_id) = request.parent_id() {
                    ensure_parent_in_project(tx, parent_id, project_id)?;
                }
                lock_keys(
                    tx,
                    [
                        gantt_key(project_id),
                        board_key(project_id, request.status()),
                    ],
                )?;
                let placement = load_ordering(tx, project_id)?.insert(
                    request.id(),
                    request.status(),
                    request.gantt_order(),
                    request.board_order(),
                );
                apply_order_plan(tx, &placement.plan, clock.utc())?;
                let task = Task::create(
                    request,
                    placement.gantt_order,
                    placement.board_order,
                    clock,
                );
                diesel::insert_into(tasks::table)
                    .values(&task_to_row(&task)?)
                    .execute(tx)?;
                Ok(task)
            })
        })
        .await
    }

    async fn update_task(
        &self,
        access: &AccessContext,
        task_id: TaskId,
        changes: TaskChanges,
    ) -> TaskStoreResult<Task> {
        let actor = *access;
        self.run_blocking(move |connection, clock| {
            connection.transaction::<_, TaskStoreError, _>(|tx| {
                set_actor_context(tx, &actor)?;
                lock_tasks_for_write(tx)?;
                let visibility = Visibility::load(tx, &actor)?;
                let original = visible_task(tx, &visibility, task_id)?;
                let project_id = original.project_id();
                if let Some(Some(parent_id)) = changes.parent_id() {
                    ensure_parent_in_project(tx, parent_id, project_id)?;
                }
                let edit = changes.order_edit();
                if !edit.is_empty() {
                    lock_project_orders(tx, project_id, true)?;
                }
                let mut edited =
                    load_task(tx, task_id)?.ok_or(TaskStoreError::TaskNotFound(task_id))?;
                edited.apply_fields(&changes, clock)?;
                diesel::update(tasks::table.find(task_id.into_inner()))
                    .set(&fields_changeset(&edited))
                    .execute(tx)?;
                if !edit.is_empty() {
                    let plan = load_ordering(tx, project_id)?
                        .apply_edit(task_id, edit)
                        .map_err(|_| TaskStoreError::TaskNotFound(task_id))?;
                    apply_order_plan(tx, &plan, clock.utc())?;
                }
                load_task(tx, task_id)?.ok_or(TaskStoreError::TaskNotFound(task_id))
            })
        })
        .await
    }

    async fn delete_task(&self, access: &AccessContext, task_id: TaskId) -> TaskStoreResult<()> {
        let actor = *access;
        self.run_blocking(move |connection, clock| {
            connection.transaction::<_, TaskStoreError, _>(|tx| {
                set_actor_context(tx, &actor)?;
                lock_tasks_for_write(tx)?;
                let visibility = Visibility::load(tx, &actor)?;
                let task = visible_task(tx, &visibility, task_id)?;
                let project_id = task.project_id();
                lock_project_orders(tx, project_id, true)?;
                let plan = load_ordering(tx, project_id)?
                    .remove(task_id)
                    .map_err(|_| TaskStoreError::TaskNotFound(task_id))?;
                let now = clock.utc();
                diesel::update(tasks::table.filter(tasks::parent_id.eq(task_id.into_inner())))
                    .set((
                        tasks::parent_id.eq(None::<Uuid>),
                        tasks::updated_at.eq(now),
                    ))
                    .execute(tx)?;
                delete_task_resources(tx, task_id)?;
                diesel::delete(tasks::table.find(task_id.into_inner())).execute(tx)?;
                apply_order_plan(tx, &plan, now)?;
                Ok(())
            })
        })
        .await
    }

    async fn find_task(
        &self,
        access: &AccessContext,
        task_id: TaskId,
    ) -> TaskStoreResult<Option<Task>> {
        let actor = *access;
        self.run_blocking(move |connection, _clock| {
            let visibility = Visibility::load(connection, &actor)?;
            match visible_task(connection, &visibility, task_id) {
                Ok(task) => Ok(Some(task)),
                Err(TaskStoreError::TaskNotFound(_)) => Ok(None),
                Err(err) => Err(err),
            }
        })
        .await
    }

    async fn list_gantt(
        &self,
        access: &AccessContext,
        project_id: ProjectId,
    ) -> TaskStoreResult<Vec<Task>> {
        let actor = *access;
        self.run_blocking(move |connection, _clock| {
            let visibility = Visibility::load(connection, &actor)?;
            let rows = tasks::table
                .filter(tasks::project_id.eq(project_id.into_inner()))
                .order(tasks::gantt_order.asc())
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)?;
            visible_rows(connection, &visibility, project_id, rows)
        })
        .await
    }

    async fn list_board_column(
        &self,
        access: &AccessContext,
        project_id: ProjectId,
        status: TaskStatus,
    ) -> TaskStoreResult<Vec<Task>> {
        let actor = *access;
        self.run_blocking(move |connection, _clock| {
            let visibility = Visibility::load(connection, &actor)?;
            let rows = tasks::table
                .filter(tasks::project_id.eq(project_id.into_inner()))
                .filter(tasks::status.eq(status.as_str()))
                .order(tasks::board_order.asc())
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)?;
            visible_rows(connection, &visibility, project_id, rows)
        })
        .await
    }

    async fn list_board(
        &self,
        access: &AccessContext,
        project_id: ProjectId,
    ) -> TaskStoreResult<Vec<Task>> {
        let actor = *access;
        self.run_blocking(move |connection, _clock| {
            let visibility = Visibility::load(connection, &actor)?;
            let rows = tasks::table
                .filter(tasks::project_id.eq(project_id.into_inner()))
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)?;
            let mut board = visible_rows(connection, &visibility, project_id, rows)?;
            board.sort_by_key(|task| (task.status(), task.board_order()));
            Ok(board)
        })
        .await
    }

    async fn list_subtasks(
        &self,
        access: &AccessContext,
        parent_id: TaskId,
    ) -> TaskStoreResult<Vec<Task>> {
        let actor = *access;
        self.run_blocking(move |connection, _clock| {
            let parent_project = tasks::table
                .find(parent_id.into_inner())
                .select(tasks::project_id)
                .first::<Uuid>(connection)
                .optional()?;
            let Some(project_uuid) = parent_project else {
                return Ok(Vec::new());
            };
            let visibility = Visibility::load(connection, &actor)?;
            let rows = tasks::table
                .filter(tasks::parent_id.eq(parent_id.into_inner()))
                .order(tasks::gantt_order.asc())
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)?;
            visible_rows(
                connection,
                &visibility,
                ProjectId::from_uuid(project_uuid),
                rows,
            )
        })
        .await
    }

    async fn reorder(
        &self,
        access: &AccessContext,
        request: ReorderRequest,
    ) -> TaskStoreResult<Vec<Task>> {
        let actor = *access;
        self.run_blocking(move |connection, clock| {
            connection.transaction::<_, TaskStoreError, _>(|tx| {
                set_actor_context(tx, &actor)?;
                lock_tasks_for_write(tx)?;
                reorder_in_transaction(tx, &actor, request, clock.utc())
            })
        })
        .await
    }

    async fn add_dependency(
        &self,
        access: &AccessContext,
        edge: NewDependency,
    ) -> TaskStoreResult<TaskDependency> {
        let actor = *access;
        self.run_blocking(move |connection, clock| {
            connection.transaction::<_, TaskStoreError, _>(|tx| {
                set_actor_context(tx, &actor)?;
                let visibility = Visibility::load(tx, &actor)?;
                visible_task(tx, &visibility, edge.task_id)?;
                visible_task(tx, &visibility, edge.dependent_task_id)?;
                lock_keys(tx, [dependency_key(edge.task_id, edge.dependent_task_id)])?;
                let existing = edges_between(tx, edge.task_id, edge.dependent_task_id)?;
                DependencyGuard::check(&edge, |from, to| {
                    existing.iter().any(|pair| *pair == (from, to))
                })?;
                let dependency = TaskDependency::from_parts(DependencyId::new(), edge, clock.utc());
                diesel::insert_into(task_dependencies::table)
                    .values(&dependency_to_row(&dependency))
                    .execute(tx)
                    .map_err(|err| match err {
                        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                            if is_constraint(info.as_ref(), DEPENDENCY_PAIR_CONSTRAINT) =>
                        {
                            TaskStoreError::DependencyRule(DependencyRuleViolation::Duplicate)
                        }
                        _ => TaskStoreError::from(err),
                    })?;
                Ok(dependency)
            })
        })
        .await
    }

    async fn remove_dependency(
        &self,
        access: &AccessContext,
        dependency_id: DependencyId,
    ) -> TaskStoreResult<()> {
        let actor = *access;
        self.run_blocking(move |connection, _clock| {
            connection.transaction::<_, TaskStoreError, _>(|tx| {
                set_actor_context(tx, &actor)?;
                let predecessor = task_dependencies::table
                    .find(dependency_id.into_inner())
                    .select(task_dependencies::task_id)
                    .first::<Uuid>(tx)
                    .optional()?
                    .ok_or(TaskStoreError::DependencyNotFound(dependency_id))?;
                let visibility = Visibility::load(tx, &actor)?;
                visible_task(tx, &visibility, TaskId::from_uuid(predecessor))
                    .map_err(|_| TaskStoreError::DependencyNotFound(dependency_id))?;
                diesel::delete(task_dependencies::table.find(dependency_id.into_inner()))
                    .execute(tx)?;
                Ok(())
            })
        })
        .await
    }

    async fn list_dependencies(
        &self,
        access: &AccessContext,
        task_id: TaskId,
    ) -> TaskStoreResult<Vec<TaskDependency>> {
        let actor = *access;
        self.run_blocking(move |connection, _clock| {
            let visibility = Visibility::load(connection, &actor)?;
            visible_task(connection, &visibility, task_id)?;
            task_dependencies::table
                .filter(
                    task_dependencies::task_id
                        .eq(task_id.into_inner())
                        .or(task_dependencies::dependent_task_id.eq(task_id.into_inner())),
                )
                .order(task_dependencies::created_at.asc())
                .select(DependencyRow::as_select())
                .load::<DependencyRow>(connection)?
                .into_iter()
                .map(row_to_dependency)
                .collect()
        })
        .await
    }

    async fn replace_plan(
        &self,
        access: &AccessContext,
        plan: &PreparedPlan,
    ) -> TaskStoreResult<PlanImportReport> {
        let actor = *access;
        let prepared = plan.clone();
        self.run_blocking(move |connection, clock| {
            connection.transaction::<_, TaskStoreError, _>(|tx| {
                set_actor_context(tx, &actor)?;
                lock_keys(tx, [PLAN_IMPORT_KEY.to_owned()])?;
                lock_tasks_for_import(tx)?;
                clear_planning_rows(tx)?;
                let (project_id, project_created) =
                    find_or_create_plan_project(tx, &prepared, clock)?;
                let materialized = prepared.materialize(project_id, actor.actor(), clock)?;
                let task_rows = materialized
                    .iter()
                    .map(task_to_row)
                    .collect::<TaskStoreResult<Vec<_>>>()?;
                if !task_rows.is_empty() {
                    diesel::insert_into(tasks::table)
                        .values(&task_rows)
                        .execute(tx)?;
                }
                let created_at = clock.utc();
                let dependency_rows: Vec<DependencyRow> = prepared
                    .edges
                    .iter()
                    .map(|edge| {
                        dependency_to_row(&TaskDependency::from_parts(
                            DependencyId::new(),
                            *edge,
                            created_at,
                        ))
                    })
                    .collect();
                if !dependency_rows.is_empty() {
                    diesel::insert_into(task_dependencies::table)
                        .values(&dependency_rows)
                        .execute(tx)?;
                }
                Ok(PlanImportReport {
                    project_id,
                    project_created,
                    task_ids: materialized.iter().map(Task::id).collect(),
                    dependency_count: dependency_rows.len(),
                    dropped: prepared.dropped,
                })
            })
        })
        .await
    }

    async fn share_task(
        &self,
        access: &AccessContext,
        task_id: TaskId,
        recipient: ShareRecipient,
    ) -> TaskStoreResult<SharedLink> {
        let actor = *access;
        self.run_blocking(move |connection, clock| {
            connection.transaction::<_, TaskStoreError, _>(|tx| {
                set_actor_context(tx, &actor)?;
                let visibility = Visibility::load(tx, &actor)?;
                let task = visible_task(tx, &visibility, task_id)?;
                let link = SharedLink::for_task(&task, clock);
                let notification = ExternalNotification::task_share(&task, &recipient, clock);
                diesel::insert_into(shared_links::table)
                    .values(&shared_link_to_row(&link)?)
                    .execute(tx)?;
                diesel::insert_into(external_notifications::table)
                    .values(&notification_to_row(&notification))
                    .execute(tx)?;
                Ok(link)
            })
        })
        .await
    }

    async fn find_shared_link(&self, token: &str) -> TaskStoreResult<Option<SharedLink>> {
        let lookup = token.to_owned();
        self.run_blocking(move |connection, _clock| {
            shared_links::table
                .filter(shared_links::token.eq(lookup))
                .select(SharedLinkRow::as_select())
                .first::<SharedLinkRow>(connection)
                .optional()?
                .map(row_to_shared_link)
                .transpose()
        })
        .await
    }

    async fn redeem_shared_link(
        &self,
        token: &str,
        action: LinkAction,
    ) -> TaskStoreResult<Option<SharedLink>> {
        let lookup = token.to_owned();
        self.run_blocking(move |connection, clock| {
            connection.transaction::<_, TaskStoreError, _>(|tx| {
                let row = shared_links::table
                    .filter(shared_links::token.eq(lookup))
                    .select(SharedLinkRow::as_select())
                    .for_update()
                    .first::<SharedLinkRow>(tx)
                    .optional()?;
                let Some(found) = row else {
                    return Ok(None);
                };
                let mut link = row_to_shared_link(found)?;
                if !link.allows(action, clock.utc()) {
                    return Ok(None);
                }
                link.record_use();
                let use_count =
                    i32::try_from(link.use_count()).map_err(TaskStoreError::persistence)?;
                diesel::update(shared_links::table.find(link.id().into_inner()))
                    .set(shared_links::use_count.eq(use_count))
                    .execute(tx)?;
                Ok(Some(link))
            })
        })
        .await
    }

    async fn list_notifications(
        &self,
        access: &AccessContext,
        task_id: TaskId,
    ) -> TaskStoreResult<Vec<ExternalNotification>> {
        let actor = *access;
        self.run_blocking(move |connection, _clock| {
            let visibility = Visibility::load(connection, &actor)?;
            visible_task(connection, &visibility, task_id)?;
            external_notifications::table
                .filter(external_notifications::task_id.eq(task_id.into_inner()))
                .order(external_notifications::created_at.asc())
                .select(NotificationRow::as_select())
                .load::<NotificationRow>(connection)?
                .into_iter()
                .map(row_to_notification)
                .collect()
        })
        .await
    }
}

fn reorder_in_transaction(
    tx: &mut PgConnection,
    access: &AccessContext,
    request: ReorderRequest,
    now: DateTime<Utc>,
) -> TaskStoreResult<Vec<Task>> {
    let ReorderRequest {
        project_id,
        task_id,
        target,
    } = request;
    let observed = tasks::table
        .filter(tasks::id.eq(task_id.into_inner()))
        .filter(tasks::project_id.eq(project_id.into_inner()))
        .select(tasks::id)
        .first::<Uuid>(tx)
        .optional()?;
    if observed.is_none() {
        return Err(TaskStoreError::TaskNotInProject {
            task_id,
            project_id,
        });
    }
    let columns = match target {
        ReorderTarget::Gantt { .. } => {
            lock_keys(tx, [gantt_key(project_id)])?;
            None
        }
        ReorderTarget::Board { status, .. } => {
            lock_project_orders(tx, project_id, false)?;
            let current = locked_status(tx, task_id)?;
            Some((current, status.unwrap_or(current)))
        }
    };
    let final_status = columns.map(|(_, target_status)| target_status);
    let in_scope = |task: &Task| {
        columns.is_none_or(|(current, target_status)| {
            task.status() == current || task.status() == target_status
        })
    };
    let visibility = Visibility::load(tx, access)?;
    if let Visibility::Limited(_) = visibility {
        let organization_id = project_organization(tx, project_id)?
            .ok_or(TaskStoreError::ProjectNotFound(project_id))?;
        let hidden = load_project_tasks(tx, project_id)?
            .iter()
            .any(|task| in_scope(task) && !visibility.sees_task(task, organization_id));
        if hidden {
            return Err(TaskStoreError::ScopeNotVisible(project_id));
        }
    }
    let ordering = load_ordering(tx, project_id)?;
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
    apply_order_plan(tx, &plan, now)?;
    let mut scope: Vec<Task> = load_project_tasks(tx, project_id)?
        .into_iter()
        .filter(|task| final_status.is_none_or(|status| task.status() == status))
        .collect();
    if final_status.is_some() {
        scope.sort_by_key(Task::board_order);
    } else {
        scope.sort_by_key(Task::gantt_order);
    }
    Ok(scope)
}

/// Locks every board column of the project, and the Gantt chart when
/// `with_gantt` is set, in one sorted pass.
fn lock_project_orders(
    tx: &mut PgConnection,
    project_id: ProjectId,
    with_gantt: bool,
) -> TaskStoreResult<()> {
    let gantt = with_gantt.then(|| gantt_key(project_id));
    lock_keys(tx, board_keys(project_id).chain(gantt))
}

fn locked_status(tx: &mut PgConnection, task_id: TaskId) -> TaskStoreResult<TaskStatus> {
    let stored = tasks::table
        .find(task_id.into_inner())
        .select(tasks::status)
        .first::<String>(tx)
        .optional()?
        .ok_or(TaskStoreError::TaskNotFound(task_id))?;
    Ok(TaskStatus::try_from(stored.as_str())?)
}

fn load_task(connection: &mut PgConnection, task_id: TaskId) -> TaskStoreResult<Option<Task>> {
    tasks::table
        .find(task_id.into_inner())
        .select(TaskRow::as_select())
        .first::<TaskRow>(connection)
        .optional()?
        .map(row_to_task)
        .transpose()
}

fn load_project_tasks(
    connection: &mut PgConnection,
    project_id: ProjectId,
) -> TaskStoreResult<Vec<Task>> {
    tasks::table
        .filter(tasks::project_id.eq(project_id.into_inner()))
        .select(TaskRow::as_select())
        .load::<TaskRow>(connection)?
        .into_iter()
        .map(row_to_task)
        .collect()
}

fn visible_task(
    connection: &mut PgConnection,
    visibility: &Visibility,
    task_id: TaskId,
) -> TaskStoreResult<Task> {
    let task = load_task(connection, task_id)?.ok_or(TaskStoreError::TaskNotFound(task_id))?;
    if let Visibility::Limited(_) = visibility {
        let organization_id = project_organization(connection, task.project_id())?
            .ok_or(TaskStoreError::TaskNotFound(task_id))?;
        if !visibility.sees_task(&task, organization_id) {
            return Err(TaskStoreError::TaskNotFound(task_id));
        }
    }
    Ok(task)
}

pub(super) fn visible_project(
    connection: &mut PgConnection,
    visibility: &Visibility,
    project_id: ProjectId,
) -> TaskStoreResult<OrganizationId> {
    let organization_id = project_organization(connection, project_id)?
        .ok_or(TaskStoreError::ProjectNotFound(project_id))?;
    if visibility.sees_project(project_id, organization_id) {
        Ok(organization_id)
    } else {
        Err(TaskStoreError::ProjectNotFound(project_id))
    }
}

fn visible_rows(
    connection: &mut PgConnection,
    visibility: &Visibility,
    project_id: ProjectId,
    rows: Vec<TaskRow>,
) -> TaskStoreResult<Vec<Task>> {
    let loaded = rows
        .into_iter()
        .map(row_to_task)
        .collect::<TaskStoreResult<Vec<_>>>()?;
    if let Visibility::Everything = visibility {
        return Ok(loaded);
    }
    let Some(organization_id) = project_organization(connection, project_id)? else {
        return Ok(Vec::new());
    };
    Ok(loaded
        .into_iter()
        .filter(|task| visibility.sees_task(task, organization_id))
        .collect())
}

fn ensure_parent_in_project(
    connection: &mut PgConnection,
    parent_id: TaskId,
    project_id: ProjectId,
) -> TaskStoreResult<()> {
    let parent_project = tasks::table
        .find(parent_id.into_inner())
        .select(tasks::project_id)
        .first::<Uuid>(connection)
        .optional()?;
    if parent_project == Some(project_id.into_inner()) {
        Ok(())
    } else {
        Err(TaskStoreError::ParentNotInProject {
            parent_id,
            project_id,
        })
    }
}

fn load_ordering(
    connection: &mut PgConnection,
    project_id: ProjectId,
) -> TaskStoreResult<ProjectOrdering> {
    let entries = tasks::table
        .filter(tasks::project_id.eq(project_id.into_inner()))
        .select(TaskOrderRow::as_select())
        .load::<TaskOrderRow>(connection)?
        .into_iter()
        .map(order_row_to_entry)
        .collect::<TaskStoreResult<Vec<_>>>()?;
    Ok(ProjectOrdering::new(entries))
}

fn apply_order_plan(
    connection: &mut PgConnection,
    plan: &OrderPlan,
    updated_at: DateTime<Utc>,
) -> TaskStoreResult<()> {
    for change in plan.changes() {
        diesel::update(tasks::table.find(change.task_id.into_inner()))
            .set(&order_changeset(change, updated_at)?)
            .execute(connection)?;
    }
    Ok(())
}

fn edges_between(
    connection: &mut PgConnection,
    first: TaskId,
    second: TaskId,
) -> TaskStoreResult<Vec<(TaskId, TaskId)>> {
    let forward = task_dependencies::task_id
        .eq(first.into_inner())
        .and(task_dependencies::dependent_task_id.eq(second.into_inner()));
    let backward = task_dependencies::task_id
        .eq(second.into_inner())
        .and(task_dependencies::dependent_task_id.eq(first.into_inner()));
    let pairs = task_dependencies::table
        .filter(forward.or(backward))
        .select((
            task_dependencies::task_id,
            task_dependencies::dependent_task_id,
        ))
        .load::<(Uuid, Uuid)>(connection)?;
    Ok(pairs
        .into_iter()
        .map(|(from, to)| (TaskId::from_uuid(from), TaskId::from_uuid(to)))
        .collect())
}

fn delete_task_resources(connection: &mut PgConnection, task_id: TaskId) -> TaskStoreResult<()> {
    let resource = ResourceRef::Task(task_id);
    diesel::delete(
        permissions::table
            .filter(permissions::resource_type.eq(resource.resource_type()))
            .filter(permissions::resource_id.eq(resource.resource_id())),
    )
    .execute(connection)?;
    diesel::delete(
        shared_links::table
            .filter(shared_links::resource_type.eq(resource.resource_type()))
            .filter(shared_links::resource_id.eq(resource.resource_id())),
    )
    .execute(connection)?;
    Ok(())
}

/// Removes every task together with the rows hanging off tasks.
fn clear_planning_rows(connection: &mut PgConnection) -> TaskStoreResult<()> {
    let task_type = ResourceRef::TASK_TYPE;
    diesel::delete(external_notifications::table).execute(connection)?;
    diesel::delete(permissions::table.filter(permissions::resource_type.eq(task_type)))
        .execute(connection)?;
    diesel::delete(shared_links::table.filter(shared_links::resource_type.eq(task_type)))
        .execute(connection)?;
    diesel::delete(task_dependencies::table).execute(connection)?;
    diesel::delete(tasks::table).execute(connection)?;
    Ok(())
}

fn find_or_create_plan_project(
    connection: &mut PgConnection,
    plan: &PreparedPlan,
    clock: &impl Clock,
) -> TaskStoreResult<(ProjectId, bool)> {
    let existing = projects::table
        .filter(projects::name.eq(&plan.project.name))
        .order(projects::created_at.asc())
        .select(ProjectRow::as_select())
        .first::<ProjectRow>(connection)
        .optional()?;
    if let Some(row) = existing {
        return Ok((ProjectId::from_uuid(row.id), false));
    }
    let oldest = organizations::table
        .order(organizations::created_at.asc())
        .select(organizations::id)
        .first::<Uuid>(connection)
        .optional()?;
    let organization_id = match oldest {
        Some(found) => OrganizationId::from_uuid(found),
        None => insert_organization(
            connection,
            &plan.project.fallback_organization_name,
            &plan.project.fallback_organization_slug,
            clock,
        )?
        .id(),
    };
    let request = NewProject::new(organization_id, &plan.project.name)?
        .with_description(plan.project.description.as_str())
        .with_status(ProjectStatus::Active)
        .with_dates(Some(plan.project.start_date), Some(plan.project.end_date));
    let project = Project::create(request, clock);
    diesel::insert_into(projects::table)
        .values(&project_to_row(&project))
        .execute(connection)?;
    Ok((project.id(), true))
}

fn is_constraint(info: &dyn DatabaseErrorInformation, name: &str) -> bool {
    info.constraint_name()
        .is_some_and(|constraint| constraint == name)
}
