//! Destructive plan replacement over the in-memory store.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::DefaultClock;
use rstest::rstest;
use taskboard::task::{
    domain::{
        AccessContext, DependencyRuleViolation, DependencyType, InvalidPlanError, LinkAction,
        PermissionLevel, PlanDraft, PlanImportSettings, ResourceRef, TaskStatus, UserId,
    },
    ports::{PlanProducer, PlanProducerError, ProjectDirectory},
    services::{DependencyService, PlanImportError, PlanImportService, TaskService},
};

use crate::in_memory::helpers::{
    BYPASS, TestStore, assert_dense, board_ranks, gantt_ranks, names, new_project, seed, store,
};

/// Producer answering every prompt with the same JSON payload.
struct CannedPlan(&'static str);

#[async_trait]
impl PlanProducer for CannedPlan {
    async fn produce_plan(&self, _prompt: &str) -> Result<PlanDraft, PlanProducerError> {
        Ok(PlanDraft::from_json_str(self.0)?)
    }
}

type Importer = PlanImportService<TestStore, CannedPlan, DefaultClock>;

fn importer(store: &Arc<TestStore>, payload: &'static str) -> Importer {
    PlanImportService::new(
        Arc::clone(store),
        Arc::new(CannedPlan(payload)),
        Arc::new(DefaultClock),
        PlanImportSettings::default(),
    )
}

const LAUNCH_PLAN: &str = r#"{
    "tasks": [
        {"name": "Research", "status": "completed", "progress": 100},
        {"name": "Design", "status": "in_progress", "parent_id": 1},
        {"name": "Build", "priority": "high", "start_date": "2026-11-02", "due_date": "2026-11-20"},
        {"name": "Task 4", "description": "Ship the beta to early adopters. Collect feedback."}
    ],
    "dependencies": [
        {"from": 1, "to": 2},
        {"from": 2, "to": 3, "type": "start_to_start"},
        {"from": 3, "to": 9}
    ]
}"#;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn generated_plans_land_in_a_fresh_project(store: Arc<TestStore>) {
    let existing = new_project(&store, "Acme", "Launch").await;
    let service = TaskService::new(Arc::clone(&store));
    seed(&service, &existing, &[("Old work", TaskStatus::Todo)]).await;
    let actor = UserId::new();

    let report = importer(&store, LAUNCH_PLAN)
        .generate_plan(&AccessContext::Actor(actor), "Beta launch")
        .await
        .expect("import should succeed");

    assert!(report.project_created);
    assert_eq!(report.task_ids.len(), 4);
    assert_eq!(report.dependency_count, 2);
    assert_eq!(report.dropped.dangling_dependencies, 1);
    let project = store
        .find_project(&BYPASS, report.project_id)
        .await
        .expect("lookup should succeed")
        .expect("imported project should exist");
    assert_eq!(project.name(), "AI Generated Project: Beta launch");
    assert_eq!(project.organization_id(), existing.organization_id());
    let old = service
        .gantt(&BYPASS, existing.id())
        .await
        .expect("listing should succeed");
    assert!(old.is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn imported_tasks_are_ordered_and_normalized(store: Arc<TestStore>) {
    let actor = UserId::new();
    let service = TaskService::new(Arc::clone(&store));

    let report = importer(&store, LAUNCH_PLAN)
        .generate_plan(&AccessContext::Actor(actor), "Beta launch")
        .await
        .expect("import should succeed");
    let gantt = service
        .gantt(&BYPASS, report.project_id)
        .await
        .expect("listing should succeed");
    let todo = service
        .board_column(&BYPASS, report.project_id, TaskStatus::Todo)
        .await
        .expect("listing should succeed");

    assert_eq!(
        names(&gantt),
        vec!["Research", "Design", "Build", "Ship the beta to early adopters"]
    );
    assert_dense(&gantt_ranks(&gantt));
    assert_eq!(gantt[0].status(), TaskStatus::Done);
    assert_eq!(gantt[1].status(), TaskStatus::InProgress);
    assert_eq!(gantt[1].parent_id(), Some(gantt[0].id()));
    assert_eq!(names(&todo), vec!["Build", "Ship the beta to early adopters"]);
    assert_eq!(board_ranks(&todo), vec![1, 2]);
    assert!(gantt.iter().all(|task| task.creator_id() == Some(actor)));
    assert!(gantt.iter().all(|task| task.assignee_id() == Some(actor)));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn imported_edges_keep_their_types(store: Arc<TestStore>) {
    let dependencies = DependencyService::new(Arc::clone(&store));

    let report = importer(&store, LAUNCH_PLAN)
        .generate_plan(&BYPASS, "Beta launch")
        .await
        .expect("import should succeed");
    let edges = dependencies
        .dependencies_of(&BYPASS, report.task_ids[2])
        .await
        .expect("listing should succeed");

    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].task_id(), report.task_ids[1]);
    assert_eq!(edges[0].dependent_task_id(), report.task_ids[2]);
    assert_eq!(edges[0].dependency_type(), DependencyType::StartToStart);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn imports_without_organizations_create_the_default_one(store: Arc<TestStore>) {
    let report = importer(&store, r#"{"tasks": [], "dependencies": []}"#)
        .replace_plan(&BYPASS, &PlanDraft::default(), None)
        .await
        .expect("import should succeed");
    let project = store
        .find_project(&BYPASS, report.project_id)
        .await
        .expect("lookup should succeed")
        .expect("imported project should exist");

    assert!(report.project_created);
    assert!(report.task_ids.is_empty());
    assert_eq!(project.name(), "AI Generated Project: AI Generated Project");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn imports_clear_task_grants_and_shares(store: Arc<TestStore>) {
    let project = new_project(&store, "Acme", "Launch").await;
    let service = TaskService::new(Arc::clone(&store));
    let ids = seed(&service, &project, &[("Old work", TaskStatus::Todo)]).await;
    let guest = UserId::new();
    store
        .grant_permission(
            guest,
            ResourceRef::Project(project.id()),
            PermissionLevel::Read,
            None,
        )
        .await
        .expect("grant should be stored");
    let link = service
        .share_task(&BYPASS, ids[0], "ada@example.com", None)
        .await
        .expect("share should succeed");

    importer(&store, LAUNCH_PLAN)
        .generate_plan(&BYPASS, "Beta launch")
        .await
        .expect("import should succeed");
    let redeemed = service
        .redeem_link(link.token(), LinkAction::View)
        .await
        .expect("redeem should succeed");
    let still_visible = store
        .find_project(&AccessContext::Actor(guest), project.id())
        .await
        .expect("lookup should succeed");

    assert!(redeemed.is_none());
    assert!(still_visible.is_some());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unusable_payloads_abort_before_deleting(store: Arc<TestStore>) {
    let project = new_project(&store, "Acme", "Launch").await;
    let service = TaskService::new(Arc::clone(&store));
    seed(&service, &project, &[("Keep me", TaskStatus::Todo)]).await;

    let result = importer(&store, r#"{"tasks": []}"#)
        .generate_plan(&BYPASS, "Anything")
        .await;
    let gantt = service
        .gantt(&BYPASS, project.id())
        .await
        .expect("listing should succeed");

    assert!(matches!(
        result,
        Err(PlanImportError::Producer(PlanProducerError::Malformed(_)))
    ));
    assert_eq!(names(&gantt), vec!["Keep me"]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn refused_plan_edges_abort_before_deleting(store: Arc<TestStore>) {
    let project = new_project(&store, "Acme", "Launch").await;
    let service = TaskService::new(Arc::clone(&store));
    seed(&service, &project, &[("Keep me", TaskStatus::Todo)]).await;
    let cyclic = r#"{
        "tasks": [{"name": "Research"}, {"name": "Design"}],
        "dependencies": [{"from": 1, "to": 2}, {"from": 2, "to": 1}]
    }"#;

    let result = importer(&store, cyclic)
        .generate_plan(&BYPASS, "Beta launch")
        .await;
    let gantt = service
        .gantt(&BYPASS, project.id())
        .await
        .expect("listing should succeed");

    assert!(matches!(
        result,
        Err(PlanImportError::Invalid(InvalidPlanError::DependencyRule {
            violation: DependencyRuleViolation::DirectCycle,
            ..
        }))
    ));
    assert_eq!(names(&gantt), vec!["Keep me"]);
}
