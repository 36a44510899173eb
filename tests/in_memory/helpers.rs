//! Shared test helpers for in-memory store integration tests.

use std::sync::Arc;

use mockable::DefaultClock;
use rstest::fixture;
use taskboard::task::{
    adapters::memory::InMemoryTaskStore,
    domain::{AccessContext, NewProject, NewTask, Project, Rank, Task, TaskId, TaskStatus},
    ports::ProjectDirectory,
    services::TaskService,
};

/// Store type used across in-memory tests.
pub type TestStore = InMemoryTaskStore<DefaultClock>;

/// Access context for set-up steps that run outside any user.
pub const BYPASS: AccessContext = AccessContext::Bypass;

/// Provides a fresh in-memory store for each test.
#[fixture]
pub fn store() -> Arc<TestStore> {
    Arc::new(InMemoryTaskStore::new(Arc::new(DefaultClock)))
}

/// Creates an organization and one project inside it.
pub async fn new_project(store: &TestStore, organization: &str, project: &str) -> Project {
    let created = store
        .create_organization(organization)
        .await
        .expect("organization creation should succeed");
    let request = NewProject::new(created.id(), project).expect("valid project request");
    store
        .create_project(request)
        .await
        .expect("project creation should succeed")
}

/// Creates one task per `(name, status)` pair, in order.
pub async fn seed(
    service: &TaskService<TestStore>,
    project: &Project,
    tasks: &[(&str, TaskStatus)],
) -> Vec<TaskId> {
    let mut ids = Vec::with_capacity(tasks.len());
    for (name, status) in tasks {
        let request = NewTask::new(project.id(), *name)
            .expect("valid task request")
            .with_status(*status);
        let task = service
            .create_task(&BYPASS, request)
            .await
            .expect("task creation should succeed");
        ids.push(task.id());
    }
    ids
}

/// Returns task names in slice order.
pub fn names(tasks: &[Task]) -> Vec<&str> {
    tasks.iter().map(Task::name).collect()
}

/// Returns the Gantt positions in slice order.
pub fn gantt_ranks(tasks: &[Task]) -> Vec<u32> {
    tasks.iter().map(Task::gantt_order).map(Rank::value).collect()
}

/// Returns the board positions in slice order.
pub fn board_ranks(tasks: &[Task]) -> Vec<u32> {
    tasks.iter().map(Task::board_order).map(Rank::value).collect()
}

/// Asserts a slice of ranks reads `1..=len`.
pub fn assert_dense(ranks: &[u32]) {
    let expected: Vec<u32> = (1..=u32::try_from(ranks.len()).expect("small scope")).collect();
    assert_eq!(ranks, expected.as_slice(), "ordering should be dense");
}
