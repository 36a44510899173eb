//! Tenancy, grants and the authorized board.

use std::sync::Arc;

use rstest::rstest;
use taskboard::task::{
    domain::{
        AccessContext, MemberRole, Membership, NewTask, PermissionLevel, Project, ResourceRef,
        TaskStatus, UserId,
    },
    ports::{ProjectDirectory, ReorderRequest, TaskStore, TaskStoreError},
    services::{AuthorizedBoard, BoardCommandError, OrderingEngine, TaskService},
};

use crate::in_memory::helpers::{BYPASS, TestStore, names, new_project, seed, store};

const TODO: TaskStatus = TaskStatus::Todo;

async fn join(store: &TestStore, project: &Project, role: MemberRole) -> UserId {
    let user_id = UserId::new();
    store
        .add_member(Membership {
            organization_id: project.organization_id(),
            user_id,
            role,
        })
        .await
        .expect("membership should be stored");
    user_id
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn members_see_their_organization_only(store: Arc<TestStore>) {
    let project = new_project(&store, "Acme", "Launch").await;
    let other = new_project(&store, "Globex", "Migration").await;
    let service = TaskService::new(Arc::clone(&store));
    seed(&service, &project, &[("Ours", TODO)]).await;
    seed(&service, &other, &[("Theirs", TODO)]).await;
    let member = AccessContext::Actor(join(&store, &project, MemberRole::Viewer).await);

    let ours = service
        .gantt(&member, project.id())
        .await
        .expect("listing should succeed");
    let theirs = service
        .gantt(&member, other.id())
        .await
        .expect("listing should succeed");
    let hidden_project = store
        .find_project(&member, other.id())
        .await
        .expect("lookup should succeed");

    assert_eq!(names(&ours), vec!["Ours"]);
    assert!(theirs.is_empty());
    assert!(hidden_project.is_none());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn task_grants_reveal_a_single_task(store: Arc<TestStore>) {
    let project = new_project(&store, "Acme", "Launch").await;
    let service = TaskService::new(Arc::clone(&store));
    let ids = seed(&service, &project, &[("Shared", TODO), ("Private", TODO)]).await;
    let guest = UserId::new();
    store
        .grant_permission(guest, ResourceRef::Task(ids[0]), PermissionLevel::Read, None)
        .await
        .expect("grant should be stored");
    let access = AccessContext::Actor(guest);

    let listed = service
        .gantt(&access, project.id())
        .await
        .expect("listing should succeed");
    let private = service
        .find_task(&access, ids[1])
        .await
        .expect("lookup should succeed");

    assert_eq!(names(&listed), vec!["Shared"]);
    assert!(private.is_none());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn assignees_see_tasks_outside_their_organizations(store: Arc<TestStore>) {
    let project = new_project(&store, "Acme", "Launch").await;
    let service = TaskService::new(Arc::clone(&store));
    let contractor = UserId::new();
    let request = NewTask::new(project.id(), "Audit")
        .expect("valid task request")
        .with_assignee(contractor);
    let task = service
        .create_task(&BYPASS, request)
        .await
        .expect("task creation should succeed");

    let found = service
        .find_task(&AccessContext::Actor(contractor), task.id())
        .await
        .expect("lookup should succeed");

    assert_eq!(found.map(|visible| visible.id()), Some(task.id()));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn actor_reorders_need_the_whole_scope_visible(store: Arc<TestStore>) {
    let project = new_project(&store, "Acme", "Launch").await;
    let service = TaskService::new(Arc::clone(&store));
    let ids = seed(&service, &project, &[("Shared", TODO), ("Private", TODO)]).await;
    let guest = UserId::new();
    store
        .grant_permission(guest, ResourceRef::Task(ids[0]), PermissionLevel::Write, None)
        .await
        .expect("grant should be stored");

    let result = store
        .reorder(
            &AccessContext::Actor(guest),
            ReorderRequest::gantt(project.id(), ids[0], 1),
        )
        .await;

    assert!(matches!(
        result,
        Err(TaskStoreError::ScopeNotVisible(project_id)) if project_id == project.id()
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn board_commands_follow_roles_and_project_grants(store: Arc<TestStore>) {
    let project = new_project(&store, "Acme", "Launch").await;
    let service = TaskService::new(Arc::clone(&store));
    let ids = seed(&service, &project, &[("T1", TODO), ("T2", TODO)]).await;
    let viewer = join(&store, &project, MemberRole::Viewer).await;
    let collaborator = UserId::new();
    store
        .grant_permission(
            collaborator,
            ResourceRef::Project(project.id()),
            PermissionLevel::Write,
            None,
        )
        .await
        .expect("grant should be stored");
    let board = AuthorizedBoard::new(OrderingEngine::new(Arc::clone(&store)), Arc::clone(&store));

    let refused = board
        .reorder_board(viewer, project.id(), ids[1], 0, None)
        .await;
    let accepted = board
        .reorder_board(collaborator, project.id(), ids[1], 0, None)
        .await
        .expect("write grant allows reordering");

    assert!(matches!(
        refused,
        Err(BoardCommandError::Forbidden { user_id, .. }) if user_id == viewer
    ));
    assert_eq!(names(accepted.tasks()), vec!["T2", "T1"]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn grants_on_missing_resources_are_refused(store: Arc<TestStore>) {
    let project = new_project(&store, "Acme", "Launch").await;
    let service = TaskService::new(Arc::clone(&store));
    let ids = seed(&service, &project, &[("Doomed", TODO)]).await;
    service
        .delete_task(&BYPASS, ids[0])
        .await
        .expect("delete should succeed");

    let result = store
        .grant_permission(UserId::new(), ResourceRef::Task(ids[0]), PermissionLevel::Read, None)
        .await;

    assert!(matches!(result, Err(TaskStoreError::TaskNotFound(task_id)) if task_id == ids[0]));
}
