//! Destructive plan replacement against `PostgreSQL`.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::DefaultClock;
use rstest::rstest;
use taskboard::task::{
    domain::{
        DependencyRuleViolation, InvalidPlanError, NewTask, PlanDraft, PlanImportSettings, Task,
        TaskStatus,
    },
    ports::{PlanProducer, PlanProducerError},
    services::{DependencyService, PlanImportError, PlanImportService, TaskService},
};

use crate::postgres::helpers::{
    BYPASS, BoxError, PgContext, TestStore, context, is_dense, names, new_project, seed,
};

struct CannedPlan(&'static str);

#[async_trait]
impl PlanProducer for CannedPlan {
    async fn produce_plan(&self, _prompt: &str) -> Result<PlanDraft, PlanProducerError> {
        Ok(PlanDraft::from_json_str(self.0)?)
    }
}

fn importer(
    ctx: &PgContext,
    payload: &'static str,
) -> PlanImportService<TestStore, CannedPlan, DefaultClock> {
    PlanImportService::new(
        Arc::clone(&ctx.store),
        Arc::new(CannedPlan(payload)),
        Arc::new(DefaultClock),
        PlanImportSettings::default(),
    )
}

const RELEASE_PLAN: &str = r#"{
    "tasks": [
        {"name": "Specify", "status": "done"},
        {"name": "Build", "status": "in-progress", "parent_id": 1},
        {"name": "Release", "parent_id": 7}
    ],
    "dependencies": [
        {"from": 1, "to": 2},
        {"from": 2, "to": 3, "type": "finish_to_finish"},
        {"from": 3, "to": 5}
    ]
}"#;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn plans_replace_every_task(
    #[future] context: Result<PgContext, BoxError>,
) -> Result<(), BoxError> {
    let ctx = context.await?;
    let existing = new_project(&ctx.store, "Acme", "Launch").await?;
    seed(&ctx.service, &existing, &[("Old work", TaskStatus::Todo)]).await?;

    let report = importer(&ctx, RELEASE_PLAN)
        .generate_plan(&BYPASS, "Release")
        .await?;
    let gantt = ctx.service.gantt(&BYPASS, report.project_id).await?;
    let old = ctx.service.gantt(&BYPASS, existing.id()).await?;
    let edges = DependencyService::new(Arc::clone(&ctx.store))
        .dependencies_of(&BYPASS, report.task_ids[1])
        .await?;

    assert!(old.is_empty());
    assert_eq!(names(&gantt), vec!["Specify", "Build", "Release"]);
    assert!(is_dense(gantt.iter().map(Task::gantt_order)));
    assert_eq!(gantt[1].status(), TaskStatus::InProgress);
    assert_eq!(gantt[1].parent_id(), Some(gantt[0].id()));
    assert_eq!(gantt[2].parent_id(), None);
    assert_eq!(report.dependency_count, 2);
    assert_eq!(report.dropped.parents, 1);
    assert_eq!(report.dropped.dangling_dependencies, 1);
    assert_eq!(edges.len(), 2);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn repeated_imports_reuse_the_generated_project(
    #[future] context: Result<PgContext, BoxError>,
) -> Result<(), BoxError> {
    let ctx = context.await?;
    let service = importer(&ctx, RELEASE_PLAN);

    let first = service.generate_plan(&BYPASS, "Release").await?;
    let second = service.generate_plan(&BYPASS, "Release").await?;
    let gantt = ctx.service.gantt(&BYPASS, second.project_id).await?;

    assert!(first.project_created);
    assert!(!second.project_created);
    assert_eq!(first.project_id, second.project_id);
    assert_eq!(gantt.len(), 3);
    assert!(first.task_ids.iter().all(|id| !second.task_ids.contains(id)));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn malformed_plans_leave_the_board_untouched(
    #[future] context: Result<PgContext, BoxError>,
) -> Result<(), BoxError> {
    let ctx = context.await?;
    let project = new_project(&ctx.store, "Acme", "Launch").await?;
    seed(&ctx.service, &project, &[("Keep me", TaskStatus::Todo)]).await?;

    let result = importer(&ctx, r#"{"dependencies": []}"#)
        .generate_plan(&BYPASS, "Release")
        .await;
    let gantt = ctx.service.gantt(&BYPASS, project.id()).await?;

    assert!(matches!(
        result,
        Err(PlanImportError::Producer(PlanProducerError::Malformed(_)))
    ));
    assert_eq!(names(&gantt), vec!["Keep me"]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn refused_plan_edges_leave_the_board_untouched(
    #[future] context: Result<PgContext, BoxError>,
) -> Result<(), BoxError> {
    let ctx = context.await?;
    let project = new_project(&ctx.store, "Acme", "Launch").await?;
    seed(&ctx.service, &project, &[("Keep me", TaskStatus::Todo)]).await?;
    let cyclic = r#"{
        "tasks": [{"name": "Specify"}, {"name": "Build"}],
        "dependencies": [{"from": 1, "to": 2}, {"from": 2, "to": 1}]
    }"#;

    let result = importer(&ctx, cyclic).generate_plan(&BYPASS, "Release").await;
    let gantt = ctx.service.gantt(&BYPASS, project.id()).await?;

    assert!(matches!(
        result,
        Err(PlanImportError::Invalid(InvalidPlanError::DependencyRule {
            violation: DependencyRuleViolation::DirectCycle,
            ..
        }))
    ));
    assert_eq!(names(&gantt), vec!["Keep me"]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn creates_racing_an_import_keep_the_reused_project_dense(
    #[future] context: Result<PgContext, BoxError>,
) -> Result<(), BoxError> {
    let ctx = context.await?;
    let first = importer(&ctx, RELEASE_PLAN)
        .generate_plan(&BYPASS, "Release")
        .await?;
    let project_id = first.project_id;

    let mut creators = Vec::new();
    for round in 0..6 {
        let service = TaskService::new(Arc::clone(&ctx.store));
        creators.push(tokio::spawn(async move {
            let request = NewTask::new(project_id, format!("Late task {round}"))?;
            service.create_task(&BYPASS, request).await?;
            Ok::<(), BoxError>(())
        }));
    }
    let second = importer(&ctx, RELEASE_PLAN)
        .generate_plan(&BYPASS, "Release")
        .await?;
    for creator in creators {
        creator.await??;
    }

    let gantt = ctx.service.gantt(&BYPASS, project_id).await?;
    assert_eq!(second.project_id, project_id);
    assert!(gantt.len() >= second.task_ids.len());
    assert!(is_dense(gantt.iter().map(Task::gantt_order)));
    for status in TaskStatus::ALL {
        let column = ctx.service.board_column(&BYPASS, project_id, status).await?;
        assert!(
            is_dense(column.iter().map(Task::board_order)),
            "column {status:?} should be dense"
        );
    }
    Ok(())
}
