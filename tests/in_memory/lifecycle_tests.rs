//! Creation, edits and deletion keeping both orderings dense.

use std::sync::Arc;

use rstest::rstest;
use taskboard::task::{
    domain::{NewTask, PercentComplete, Priority, Rank, TaskChanges, TaskStatus},
    services::{DependencyService, TaskService},
};

use crate::in_memory::helpers::{
    BYPASS, TestStore, assert_dense, board_ranks, gantt_ranks, names, new_project, seed, store,
};

const TODO: TaskStatus = TaskStatus::Todo;

fn rank(value: i64) -> Rank {
    Rank::new(value).expect("positive rank")
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn explicit_ranks_insert_between_existing_tasks(store: Arc<TestStore>) {
    let project = new_project(&store, "Acme", "Launch").await;
    let service = TaskService::new(Arc::clone(&store));
    seed(&service, &project, &[("T1", TODO), ("T2", TODO), ("T3", TODO)]).await;

    let request = NewTask::new(project.id(), "Urgent")
        .expect("valid task request")
        .with_gantt_order(rank(2))
        .with_board_order(Rank::FIRST);
    let created = service
        .create_task(&BYPASS, request)
        .await
        .expect("task creation should succeed");
    let gantt = service
        .gantt(&BYPASS, project.id())
        .await
        .expect("listing should succeed");
    let todo = service
        .board_column(&BYPASS, project.id(), TODO)
        .await
        .expect("listing should succeed");

    assert_eq!(created.gantt_order(), rank(2));
    assert_eq!(names(&gantt), vec!["T1", "Urgent", "T2", "T3"]);
    assert_eq!(gantt_ranks(&gantt), vec![1, 2, 3, 4]);
    assert_eq!(names(&todo), vec!["Urgent", "T1", "T2", "T3"]);
    assert_eq!(board_ranks(&todo), vec![1, 2, 3, 4]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn oversized_ranks_are_clamped_to_append(store: Arc<TestStore>) {
    let project = new_project(&store, "Acme", "Launch").await;
    let service = TaskService::new(Arc::clone(&store));
    seed(&service, &project, &[("T1", TODO)]).await;

    let request = NewTask::new(project.id(), "Later")
        .expect("valid task request")
        .with_gantt_order(rank(40));
    let created = service
        .create_task(&BYPASS, request)
        .await
        .expect("task creation should succeed");

    assert_eq!(created.gantt_order(), rank(2));
    assert_eq!(created.board_order(), rank(2));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn gantt_edits_shift_neighbours(store: Arc<TestStore>) {
    let project = new_project(&store, "Acme", "Launch").await;
    let service = TaskService::new(Arc::clone(&store));
    let ids = seed(
        &service,
        &project,
        &[("T1", TODO), ("T2", TODO), ("T3", TODO), ("T4", TODO)],
    )
    .await;

    let edited = service
        .update_task(&BYPASS, ids[3], TaskChanges::new().with_gantt_order(rank(1)))
        .await
        .expect("update should succeed");
    let gantt = service
        .gantt(&BYPASS, project.id())
        .await
        .expect("listing should succeed");

    assert_eq!(edited.gantt_order(), Rank::FIRST);
    assert_eq!(names(&gantt), vec!["T4", "T1", "T2", "T3"]);
    assert_dense(&gantt_ranks(&gantt));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn status_edits_move_between_columns(store: Arc<TestStore>) {
    let project = new_project(&store, "Acme", "Launch").await;
    let service = TaskService::new(Arc::clone(&store));
    let ids = seed(
        &service,
        &project,
        &[
            ("T1", TODO),
            ("T2", TODO),
            ("R1", TaskStatus::Review),
            ("R2", TaskStatus::Review),
        ],
    )
    .await;

    let moved = service
        .update_task(
            &BYPASS,
            ids[1],
            TaskChanges::new().with_status(TaskStatus::Review),
        )
        .await
        .expect("update should succeed");
    let todo = service
        .board_column(&BYPASS, project.id(), TODO)
        .await
        .expect("listing should succeed");
    let review = service
        .board_column(&BYPASS, project.id(), TaskStatus::Review)
        .await
        .expect("listing should succeed");

    assert_eq!(moved.status(), TaskStatus::Review);
    assert_eq!(names(&todo), vec!["T1"]);
    assert_eq!(names(&review), vec!["R1", "T2", "R2"]);
    assert_dense(&board_ranks(&review));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn plain_field_edits_keep_positions(store: Arc<TestStore>) {
    let project = new_project(&store, "Acme", "Launch").await;
    let service = TaskService::new(Arc::clone(&store));
    let ids = seed(&service, &project, &[("T1", TODO), ("T2", TODO)]).await;

    let edited = service
        .update_task(
            &BYPASS,
            ids[1],
            TaskChanges::new()
                .with_name("Write release notes")
                .with_priority(Priority::Urgent)
                .with_percent_complete(PercentComplete::new(60).expect("valid percent")),
        )
        .await
        .expect("update should succeed");

    assert_eq!(edited.name(), "Write release notes");
    assert_eq!(edited.priority(), Priority::Urgent);
    assert_eq!(edited.percent_complete().value(), 60);
    assert_eq!(edited.gantt_order(), rank(2));
    assert_eq!(edited.board_order(), rank(2));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn subtasks_list_in_gantt_order(store: Arc<TestStore>) {
    let project = new_project(&store, "Acme", "Launch").await;
    let service = TaskService::new(Arc::clone(&store));
    let ids = seed(&service, &project, &[("Epic", TODO)]).await;
    for name in ["Story B", "Story A"] {
        let request = NewTask::new(project.id(), name)
            .expect("valid task request")
            .with_parent(ids[0]);
        service
            .create_task(&BYPASS, request)
            .await
            .expect("task creation should succeed");
    }

    let subtasks = service
        .subtasks(&BYPASS, ids[0])
        .await
        .expect("listing should succeed");

    assert_eq!(names(&subtasks), vec!["Story B", "Story A"]);
    assert!(subtasks.iter().all(|task| task.parent_id() == Some(ids[0])));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deleting_from_the_middle_closes_both_gaps(store: Arc<TestStore>) {
    let project = new_project(&store, "Acme", "Launch").await;
    let service = TaskService::new(Arc::clone(&store));
    let dependencies = DependencyService::new(Arc::clone(&store));
    let ids = seed(
        &service,
        &project,
        &[("T1", TODO), ("T2", TaskStatus::Done), ("T3", TODO), ("T4", TaskStatus::Done)],
    )
    .await;
    dependencies
        .add_dependency(&BYPASS, ids[1], ids[3], None)
        .await
        .expect("edge should be added");

    service
        .delete_task(&BYPASS, ids[1])
        .await
        .expect("delete should succeed");

    let gantt = service
        .gantt(&BYPASS, project.id())
        .await
        .expect("listing should succeed");
    let done = service
        .board_column(&BYPASS, project.id(), TaskStatus::Done)
        .await
        .expect("listing should succeed");
    let edges = dependencies
        .dependencies_of(&BYPASS, ids[3])
        .await
        .expect("listing should succeed");
    assert_eq!(names(&gantt), vec!["T1", "T3", "T4"]);
    assert_dense(&gantt_ranks(&gantt));
    assert_eq!(names(&done), vec!["T4"]);
    assert_eq!(board_ranks(&done), vec![1]);
    assert!(edges.is_empty());
}
