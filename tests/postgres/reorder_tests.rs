//! Gantt and board moves against `PostgreSQL`.

use std::sync::Arc;

use rstest::rstest;
use taskboard::task::{
    domain::{NewTask, Task, TaskChanges, TaskStatus},
    services::{OrderingEngine, ReorderOutcome, ReorderRejection, TaskService},
};

use crate::postgres::helpers::{
    BYPASS, BoxError, PgContext, context, is_dense, names, new_project, seed,
};

const TODO: TaskStatus = TaskStatus::Todo;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn gantt_move_to_the_front(
    #[future] context: Result<PgContext, BoxError>,
) -> Result<(), BoxError> {
    let ctx = context.await?;
    let project = new_project(&ctx.store, "Acme", "Launch").await?;
    let ids = seed(&ctx.service, &project, &[("T1", TODO), ("T2", TODO), ("T3", TODO)]).await?;
    let engine = OrderingEngine::new(Arc::clone(&ctx.store));

    let outcome = engine.reorder_gantt(project.id(), ids[2], 0).await?;
    let stored = ctx.service.gantt(&BYPASS, project.id()).await?;

    assert!(outcome.is_reordered());
    assert_eq!(names(outcome.tasks()), vec!["T3", "T1", "T2"]);
    assert_eq!(names(&stored), vec!["T3", "T1", "T2"]);
    assert!(is_dense(stored.iter().map(Task::gantt_order)));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn board_move_within_a_column(
    #[future] context: Result<PgContext, BoxError>,
) -> Result<(), BoxError> {
    let ctx = context.await?;
    let project = new_project(&ctx.store, "Acme", "Launch").await?;
    let ids = seed(
        &ctx.service,
        &project,
        &[("A", TODO), ("B", TODO), ("C", TaskStatus::Done)],
    )
    .await?;
    let engine = OrderingEngine::new(Arc::clone(&ctx.store));

    let outcome = engine
        .reorder_board(project.id(), ids[1], 0, Some(TODO))
        .await?;
    let done = ctx
        .service
        .board_column(&BYPASS, project.id(), TaskStatus::Done)
        .await?;

    assert_eq!(names(outcome.tasks()), vec!["B", "A"]);
    assert!(is_dense(outcome.tasks().iter().map(Task::board_order)));
    assert_eq!(names(&done), vec!["C"]);
    assert_eq!(done[0].board_order().value(), 1);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn board_move_into_an_empty_column(
    #[future] context: Result<PgContext, BoxError>,
) -> Result<(), BoxError> {
    let ctx = context.await?;
    let project = new_project(&ctx.store, "Acme", "Launch").await?;
    let ids = seed(&ctx.service, &project, &[("X", TODO), ("Y", TODO), ("Z", TODO)]).await?;
    let engine = OrderingEngine::new(Arc::clone(&ctx.store));

    let outcome = engine
        .reorder_board(project.id(), ids[1], 1, Some(TaskStatus::Done))
        .await?;
    let todo = ctx.service.board_column(&BYPASS, project.id(), TODO).await?;

    assert_eq!(names(outcome.tasks()), vec!["Y"]);
    assert_eq!(outcome.tasks()[0].status(), TaskStatus::Done);
    assert_eq!(outcome.tasks()[0].board_order().value(), 1);
    assert_eq!(names(&todo), vec!["X", "Z"]);
    assert!(is_dense(todo.iter().map(Task::board_order)));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn foreign_tasks_are_rejected_without_changes(
    #[future] context: Result<PgContext, BoxError>,
) -> Result<(), BoxError> {
    let ctx = context.await?;
    let project = new_project(&ctx.store, "Acme", "Launch").await?;
    let other = new_project(&ctx.store, "Globex", "Migration").await?;
    seed(&ctx.service, &project, &[("T1", TODO), ("T2", TODO)]).await?;
    let foreign = seed(&ctx.service, &other, &[("Foreign", TODO)]).await?;
    let engine = OrderingEngine::new(Arc::clone(&ctx.store));

    let outcome = engine.reorder_gantt(project.id(), foreign[0], 0).await?;

    let ReorderOutcome::Rejected { reason, ordering } = outcome else {
        return Err("foreign task should be rejected".into());
    };
    assert_eq!(reason, ReorderRejection::TaskNotInProject);
    assert_eq!(names(&ordering), vec!["T1", "T2"]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_moves_keep_orderings_dense(
    #[future] context: Result<PgContext, BoxError>,
) -> Result<(), BoxError> {
    let ctx = context.await?;
    let project = new_project(&ctx.store, "Acme", "Launch").await?;
    let ids = seed(
        &ctx.service,
        &project,
        &[
            ("T1", TODO),
            ("T2", TODO),
            ("T3", TaskStatus::InProgress),
            ("T4", TODO),
            ("T5", TaskStatus::Review),
            ("T6", TODO),
        ],
    )
    .await?;
    let statuses = [TODO, TaskStatus::InProgress, TaskStatus::Review, TaskStatus::Done];

    let mut handles = Vec::new();
    for (task_id, status) in ids.iter().copied().zip(statuses.iter().copied().cycle()) {
        let worker = OrderingEngine::new(Arc::clone(&ctx.store));
        let project_id = project.id();
        handles.push(tokio::spawn(async move {
            worker.reorder_gantt(project_id, task_id, 0).await?;
            worker
                .reorder_board(project_id, task_id, 1, Some(status))
                .await
        }));
    }
    for handle in handles {
        handle.await??;
    }

    let gantt = ctx.service.gantt(&BYPASS, project.id()).await?;
    assert_eq!(gantt.len(), ids.len());
    assert!(is_dense(gantt.iter().map(Task::gantt_order)));
    for status in statuses {
        let column = ctx
            .service
            .board_column(&BYPASS, project.id(), status)
            .await?;
        assert!(
            is_dense(column.iter().map(Task::board_order)),
            "column {status:?} should be dense"
        );
    }
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn gantt_moves_status_edits_and_creates_interleave(
    #[future] context: Result<PgContext, BoxError>,
) -> Result<(), BoxError> {
    let ctx = context.await?;
    let project = new_project(&ctx.store, "Acme", "Launch").await?;
    let ids = seed(
        &ctx.service,
        &project,
        &[("T1", TODO), ("T2", TODO), ("T3", TODO), ("T4", TODO)],
    )
    .await?;
    let statuses = [
        TaskStatus::InProgress,
        TaskStatus::Review,
        TaskStatus::Done,
        TaskStatus::Backlog,
    ];

    let mut handles = Vec::new();
    for (task_id, status) in ids.iter().copied().zip(statuses) {
        let store = Arc::clone(&ctx.store);
        let project_id = project.id();
        handles.push(tokio::spawn(async move {
            let engine = OrderingEngine::new(Arc::clone(&store));
            let service = TaskService::new(store);
            for column in [status, TODO, status] {
                engine.reorder_gantt(project_id, task_id, 0).await?;
                service
                    .update_task(&BYPASS, task_id, TaskChanges::new().with_status(column))
                    .await?;
                let extra = NewTask::new(project_id, format!("Extra {}", column.as_str()))?
                    .with_status(column);
                service.create_task(&BYPASS, extra).await?;
            }
            Ok::<(), BoxError>(())
        }));
    }
    for handle in handles {
        handle.await??;
    }

    let gantt = ctx.service.gantt(&BYPASS, project.id()).await?;
    assert_eq!(gantt.len(), ids.len() * 4);
    assert!(is_dense(gantt.iter().map(Task::gantt_order)));
    for status in TaskStatus::ALL {
        let column = ctx
            .service
            .board_column(&BYPASS, project.id(), status)
            .await?;
        assert!(
            is_dense(column.iter().map(Task::board_order)),
            "column {status:?} should be dense"
        );
    }
    Ok(())
}
