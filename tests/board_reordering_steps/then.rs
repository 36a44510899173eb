//! Then steps for board reordering BDD scenarios.

use super::world::{BYPASS, BoardWorld, run_async, split_names};
use eyre::{WrapErr, eyre};
use rstest_bdd_macros::then;
use taskboard::task::{
    domain::{DependencyRuleViolation, InvalidPlanError, ProjectId, Rank, Task, TaskStatus},
    services::{PlanImportError, ReorderOutcome},
};

fn check_names(label: &str, tasks: &[Task], expected: &str) -> Result<(), eyre::Report> {
    let actual: Vec<&str> = tasks.iter().map(Task::name).collect();
    if actual == split_names(expected) {
        Ok(())
    } else {
        Err(eyre!("expected {label} to read {expected}, found {actual:?}"))
    }
}

fn check_dense(label: &str, ranks: impl IntoIterator<Item = Rank>) -> Result<(), eyre::Report> {
    let values: Vec<u32> = ranks.into_iter().map(Rank::value).collect();
    if values.iter().zip(1_u32..).all(|(value, expected)| *value == expected) {
        Ok(())
    } else {
        Err(eyre!("{label} ranks are not dense: {values:?}"))
    }
}

fn gantt(world: &BoardWorld, project_id: ProjectId) -> Result<Vec<Task>, eyre::Report> {
    run_async(world.service.gantt(&BYPASS, project_id)).wrap_err("list gantt")
}

#[then(r#"the Gantt order reads "{names}""#)]
fn gantt_reads(world: &BoardWorld, names: String) -> Result<(), eyre::Report> {
    let tasks = gantt(world, world.project()?.id())?;
    check_names("gantt", &tasks, &names)?;
    check_dense("gantt", tasks.iter().map(Task::gantt_order))
}

#[then(r#"the "{status}" column reads "{names}""#)]
fn column_reads(world: &BoardWorld, status: String, names: String) -> Result<(), eyre::Report> {
    let column = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre!("invalid status in scenario: {err}"))?;
    let tasks = run_async(
        world
            .service
            .board_column(&BYPASS, world.project()?.id(), column),
    )
    .wrap_err("list column")?;
    check_names(&status, &tasks, &names)?;
    check_dense(&status, tasks.iter().map(Task::board_order))
}

#[then("the move is rejected")]
fn move_rejected(world: &BoardWorld) -> Result<(), eyre::Report> {
    match world.last_outcome {
        Some(ReorderOutcome::Rejected { .. }) => Ok(()),
        Some(ReorderOutcome::Reordered(_)) => Err(eyre!("expected the move to be rejected")),
        None => Err(eyre!("no move was attempted")),
    }
}

#[then(r#"the imported project lists "{names}""#)]
fn imported_project_lists(world: &BoardWorld, names: String) -> Result<(), eyre::Report> {
    let report = world
        .last_import
        .as_ref()
        .ok_or_else(|| eyre!("no plan was imported"))?;
    let tasks = gantt(world, report.project_id)?;
    check_names("imported gantt", &tasks, &names)
}

#[then("the old project is empty")]
fn old_project_empty(world: &BoardWorld) -> Result<(), eyre::Report> {
    let tasks = gantt(world, world.project()?.id())?;
    if tasks.is_empty() {
        Ok(())
    } else {
        Err(eyre!("expected no tasks, found {}", tasks.len()))
    }
}

#[then("{written} edge was written and {dropped} dangling dependency was dropped")]
fn edges_resolved(world: &BoardWorld, written: usize, dropped: usize) -> Result<(), eyre::Report> {
    let report = world
        .last_import
        .as_ref()
        .ok_or_else(|| eyre!("no plan was imported"))?;
    if report.dependency_count == written && report.dropped.dangling_dependencies == dropped {
        Ok(())
    } else {
        Err(eyre!(
            "expected {written} written and {dropped} dropped, found {:?} with {} written",
            report.dropped,
            report.dependency_count
        ))
    }
}

#[then("the plan is refused as circular")]
fn plan_refused(world: &BoardWorld) -> Result<(), eyre::Report> {
    match &world.import_error {
        Some(PlanImportError::Invalid(InvalidPlanError::DependencyRule {
            violation: DependencyRuleViolation::DirectCycle,
            ..
        })) => Ok(()),
        Some(other) => Err(eyre!("expected a circular plan error, found {other}")),
        None => Err(eyre!("expected the plan to be refused")),
    }
}
