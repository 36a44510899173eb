//! Gantt and board reordering through the ordering engine.

use std::sync::Arc;

use rstest::rstest;
use taskboard::task::{
    domain::{ProjectId, TaskStatus},
    services::{OrderingEngine, ReorderOutcome, ReorderRejection, TaskService},
};

use crate::in_memory::helpers::{
    BYPASS, TestStore, assert_dense, board_ranks, gantt_ranks, names, new_project, seed, store,
};

const TODO: TaskStatus = TaskStatus::Todo;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn gantt_move_to_the_front_shifts_the_rest_down(store: Arc<TestStore>) {
    let project = new_project(&store, "Acme", "Launch").await;
    let service = TaskService::new(Arc::clone(&store));
    let ids = seed(&service, &project, &[("T1", TODO), ("T2", TODO), ("T3", TODO)]).await;
    let engine = OrderingEngine::new(Arc::clone(&store));

    let outcome = engine
        .reorder_gantt(project.id(), ids[2], 0)
        .await
        .expect("reorder should succeed");

    assert!(outcome.is_reordered());
    assert_eq!(names(outcome.tasks()), vec!["T3", "T1", "T2"]);
    assert_eq!(gantt_ranks(outcome.tasks()), vec![1, 2, 3]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn gantt_positions_past_the_end_append(store: Arc<TestStore>) {
    let project = new_project(&store, "Acme", "Launch").await;
    let service = TaskService::new(Arc::clone(&store));
    let ids = seed(&service, &project, &[("T1", TODO), ("T2", TODO), ("T3", TODO)]).await;
    let engine = OrderingEngine::new(Arc::clone(&store));

    let outcome = engine
        .reorder_gantt(project.id(), ids[0], 42)
        .await
        .expect("reorder should succeed");

    assert_eq!(names(outcome.tasks()), vec!["T2", "T3", "T1"]);
    assert_dense(&gantt_ranks(outcome.tasks()));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn same_column_move_leaves_other_columns_alone(store: Arc<TestStore>) {
    let project = new_project(&store, "Acme", "Launch").await;
    let service = TaskService::new(Arc::clone(&store));
    let ids = seed(
        &service,
        &project,
        &[
            ("A", TODO),
            ("B", TODO),
            ("C", TaskStatus::Done),
        ],
    )
    .await;
    let engine = OrderingEngine::new(Arc::clone(&store));

    let outcome = engine
        .reorder_board(project.id(), ids[1], 0, Some(TODO))
        .await
        .expect("reorder should succeed");
    let done = service
        .board_column(&BYPASS, project.id(), TaskStatus::Done)
        .await
        .expect("listing should succeed");

    assert_eq!(names(outcome.tasks()), vec!["B", "A"]);
    assert_eq!(board_ranks(outcome.tasks()), vec![1, 2]);
    assert_eq!(names(&done), vec!["C"]);
    assert_eq!(board_ranks(&done), vec![1]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn column_change_into_an_empty_column(store: Arc<TestStore>) {
    let project = new_project(&store, "Acme", "Launch").await;
    let service = TaskService::new(Arc::clone(&store));
    let ids = seed(&service, &project, &[("X", TODO), ("Y", TODO), ("Z", TODO)]).await;
    let engine = OrderingEngine::new(Arc::clone(&store));

    let outcome = engine
        .reorder_board(project.id(), ids[1], 1, Some(TaskStatus::Done))
        .await
        .expect("reorder should succeed");
    let todo = service
        .board_column(&BYPASS, project.id(), TODO)
        .await
        .expect("listing should succeed");

    assert_eq!(names(outcome.tasks()), vec!["Y"]);
    assert_eq!(outcome.tasks()[0].status(), TaskStatus::Done);
    assert_eq!(board_ranks(outcome.tasks()), vec![1]);
    assert_eq!(names(&todo), vec!["X", "Z"]);
    assert_eq!(board_ranks(&todo), vec![1, 2]);
}

#[rstest]
#[case(1, vec!["Y", "D1", "D2"])]
#[case(2, vec!["D1", "Y", "D2"])]
#[case(3, vec!["D1", "D2", "Y"])]
#[case(7, vec!["D1", "D2", "Y"])]
#[case(0, vec!["Y", "D1", "D2"])]
#[tokio::test(flavor = "multi_thread")]
async fn column_change_slots_are_one_based(
    store: Arc<TestStore>,
    #[case] slot: usize,
    #[case] expected: Vec<&str>,
) {
    let project = new_project(&store, "Acme", "Launch").await;
    let service = TaskService::new(Arc::clone(&store));
    let ids = seed(
        &service,
        &project,
        &[
            ("Y", TODO),
            ("D1", TaskStatus::Done),
            ("D2", TaskStatus::Done),
        ],
    )
    .await;
    let engine = OrderingEngine::new(Arc::clone(&store));

    let outcome = engine
        .reorder_board(project.id(), ids[0], slot, Some(TaskStatus::Done))
        .await
        .expect("reorder should succeed");

    assert_eq!(names(outcome.tasks()), expected);
    assert_dense(&board_ranks(outcome.tasks()));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn board_moves_do_not_touch_the_gantt_sequence(store: Arc<TestStore>) {
    let project = new_project(&store, "Acme", "Launch").await;
    let service = TaskService::new(Arc::clone(&store));
    let ids = seed(&service, &project, &[("T1", TODO), ("T2", TODO), ("T3", TODO)]).await;
    let engine = OrderingEngine::new(Arc::clone(&store));

    engine
        .reorder_board(project.id(), ids[2], 0, None)
        .await
        .expect("reorder should succeed");
    let gantt = service
        .gantt(&BYPASS, project.id())
        .await
        .expect("listing should succeed");

    assert_eq!(names(&gantt), vec!["T1", "T2", "T3"]);
    assert_eq!(gantt_ranks(&gantt), vec![1, 2, 3]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rejected_board_moves_return_the_requested_column(store: Arc<TestStore>) {
    let project = new_project(&store, "Acme", "Launch").await;
    let elsewhere = new_project(&store, "Globex", "Migration").await;
    let service = TaskService::new(Arc::clone(&store));
    seed(&service, &project, &[("Kept", TaskStatus::Review)]).await;
    let foreign = seed(&service, &elsewhere, &[("Foreign", TODO)]).await;
    let engine = OrderingEngine::new(Arc::clone(&store));

    let outcome = engine
        .reorder_board(project.id(), foreign[0], 0, Some(TaskStatus::Review))
        .await
        .expect("rejection is not an error");

    match outcome {
        ReorderOutcome::Rejected { reason, ordering } => {
            assert_eq!(reason, ReorderRejection::TaskNotInProject);
            assert_eq!(names(&ordering), vec!["Kept"]);
        }
        ReorderOutcome::Reordered(_) => panic!("foreign task should be rejected"),
    }
    let foreign_task = service
        .find_task(&BYPASS, foreign[0])
        .await
        .expect("lookup should succeed")
        .expect("task should still exist");
    assert_eq!(foreign_task.status(), TODO);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn long_move_sequences_keep_both_orderings_dense(store: Arc<TestStore>) {
    let project = new_project(&store, "Acme", "Launch").await;
    let service = TaskService::new(Arc::clone(&store));
    let ids = seed(
        &service,
        &project,
        &[
            ("A", TaskStatus::Backlog),
            ("B", TODO),
            ("C", TODO),
            ("D", TaskStatus::InProgress),
            ("E", TaskStatus::Review),
            ("F", TaskStatus::Done),
        ],
    )
    .await;
    let engine = OrderingEngine::new(Arc::clone(&store));
    let statuses = [
        TaskStatus::Backlog,
        TODO,
        TaskStatus::InProgress,
        TaskStatus::Review,
        TaskStatus::Done,
    ];

    let moves = ids
        .iter()
        .cycle()
        .zip(statuses.iter().cycle())
        .zip([0_usize, 6, 3, 1, 5, 2, 4].iter().cycle())
        .zip([0_usize, 2, 1, 3].iter().cycle())
        .take(24);

    for (((task_id, status), gantt_position), board_position) in moves {
        engine
            .reorder_gantt(project.id(), *task_id, *gantt_position)
            .await
            .expect("gantt move should succeed");
        engine
            .reorder_board(project.id(), *task_id, *board_position, Some(*status))
            .await
            .expect("board move should succeed");
    }

    let gantt = service
        .gantt(&BYPASS, project.id())
        .await
        .expect("listing should succeed");
    assert_eq!(gantt.len(), ids.len());
    assert_dense(&gantt_ranks(&gantt));
    for status in statuses {
        let column = service
            .board_column(&BYPASS, project.id(), status)
            .await
            .expect("listing should succeed");
        assert_dense(&board_ranks(&column));
    }
}

/// Name, column and both ranks of every task on the board.
async fn snapshot(
    service: &TaskService<TestStore>,
    project_id: ProjectId,
) -> Vec<(String, TaskStatus, u32, u32)> {
    service
        .board(&BYPASS, project_id)
        .await
        .expect("listing should succeed")
        .iter()
        .map(|task| {
            (
                task.name().to_owned(),
                task.status(),
                task.gantt_order().value(),
                task.board_order().value(),
            )
        })
        .collect()
}

#[rstest]
#[case::gantt_forward(false, 0, 3)]
#[case::gantt_backward(false, 3, 1)]
#[case::board_forward(true, 1, 2)]
#[case::board_backward(true, 3, 0)]
#[tokio::test(flavor = "multi_thread")]
async fn moves_there_and_back_restore_the_board(
    store: Arc<TestStore>,
    #[case] on_board: bool,
    #[case] task: usize,
    #[case] target: usize,
) {
    let project = new_project(&store, "Acme", "Launch").await;
    let service = TaskService::new(Arc::clone(&store));
    let ids = seed(
        &service,
        &project,
        &[
            ("A", TODO),
            ("B", TODO),
            ("Shipped", TaskStatus::Done),
            ("C", TODO),
        ],
    )
    .await;
    let engine = OrderingEngine::new(Arc::clone(&store));
    let before = snapshot(&service, project.id()).await;
    let moving = ids[task];
    let home = service
        .find_task(&BYPASS, moving)
        .await
        .expect("lookup should succeed")
        .expect("task should exist");

    let (there, back) = if on_board {
        let slot = home.board_order().index();
        let there = engine
            .reorder_board(project.id(), moving, target, Some(TODO))
            .await;
        let back = engine
            .reorder_board(project.id(), moving, slot, Some(TODO))
            .await;
        (there, back)
    } else {
        let slot = home.gantt_order().index();
        let there = engine.reorder_gantt(project.id(), moving, target).await;
        let back = engine.reorder_gantt(project.id(), moving, slot).await;
        (there, back)
    };

    assert!(there.expect("move should succeed").is_reordered());
    assert!(back.expect("move should succeed").is_reordered());
    assert_eq!(snapshot(&service, project.id()).await, before);
}
