//! Transaction-scoped advisory locks and session context.

use crate::task::{
    domain::{AccessContext, ProjectId, TaskId, TaskStatus},
    ports::TaskStoreResult,
};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::sql_types::Text;
use std::collections::BTreeSet;

/// Serializes plan imports against each other.
pub(super) const PLAN_IMPORT_KEY: &str = "plan-import";

/// Serializes organization slug allocation.
pub(super) const ORGANIZATION_SLUG_KEY: &str = "organization-slug";

pub(super) fn gantt_key(project_id: ProjectId) -> String {
    format!("gantt:{project_id}")
}

pub(super) fn board_key(project_id: ProjectId, status: TaskStatus) -> String {
    format!("board:{project_id}:{}", status.as_str())
}

/// Keys of every board column in the project.
pub(super) fn board_keys(project_id: ProjectId) -> impl Iterator<Item = String> {
    TaskStatus::ALL
        .into_iter()
        .map(move |status| board_key(project_id, status))
}

/// Both directions of an edge share one key.
pub(super) fn dependency_key(first: TaskId, second: TaskId) -> String {
    let (low, high) = if first.into_inner() <= second.into_inner() {
        (first, second)
    } else {
        (second, first)
    };
    format!("dependency:{low}:{high}")
}

/// Acquires every key in lexical order.
pub(super) fn lock_keys(
    connection: &mut PgConnection,
    keys: impl IntoIterator<Item = String>,
) -> TaskStoreResult<()> {
    let ordered: BTreeSet<String> = keys.into_iter().collect();
    for key in ordered {
        diesel::sql_query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind::<Text, _>(key)
            .execute(connection)?;
    }
    Ok(())
}

/// Takes the lock every ordering writer holds on `tasks` before it reads.
///
/// Writers do not block each other; a plan import waits for them and they
/// wait for it.
pub(super) fn lock_tasks_for_write(connection: &mut PgConnection) -> TaskStoreResult<()> {
    diesel::sql_query("LOCK TABLE tasks IN ROW EXCLUSIVE MODE").execute(connection)?;
    Ok(())
}

/// Excludes every ordering writer until the import commits.
pub(super) fn lock_tasks_for_import(connection: &mut PgConnection) -> TaskStoreResult<()> {
    diesel::sql_query("LOCK TABLE tasks IN SHARE ROW EXCLUSIVE MODE").execute(connection)?;
    Ok(())
}

/// Exposes the acting user to triggers as `app.current_user_id`.
///
/// `SET` does not accept bind parameters; the value is a hyphenated UUID.
pub(super) fn set_actor_context(
    connection: &mut PgConnection,
    access: &AccessContext,
) -> TaskStoreResult<()> {
    if let Some(user_id) = access.actor() {
        diesel::sql_query(format!("SET LOCAL app.current_user_id = '{user_id}'"))
            .execute(connection)?;
    }
    Ok(())
}
