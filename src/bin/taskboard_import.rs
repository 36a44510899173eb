//! Replaces every task with a plan read from a JSON file.
//!
//! Usage:
//!
//! ```text
//! taskboard-import <plan-path> [prompt]
//! ```
//!
//! The file must hold an object with `tasks` and `dependencies` arrays:
//!
//! ```json
//! {
//!   "tasks": [
//!     {"name": "Design schema", "status": "todo", "progress": 0},
//!     {"name": "Write migrations", "parent_id": 1}
//!   ],
//!   "dependencies": [{"from": 1, "to": 2, "type": "finish_to_start"}]
//! }
//! ```
//!
//! The prompt names the target project and defaults to
//! `"AI Generated Project"`. Configuration comes from `TASKBOARD_*`
//! environment variables.

use async_trait::async_trait;
use diesel::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use mockable::DefaultClock;
use std::path::PathBuf;
use std::sync::Arc;
use taskboard::config::{ConfigError, TaskboardConfig};
use taskboard::task::{
    adapters::postgres::PostgresTaskStore,
    domain::{AccessContext, DEFAULT_PLAN_PROMPT, PlanDraft},
    ports::{PlanProducer, PlanProducerError},
    services::{PlanImportError, PlanImportService},
};
use taskboard::telemetry::{TelemetryError, init_tracing};
use thiserror::Error;
use tracing::info;

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur during an import run.
#[derive(Debug, Error)]
enum ImportError {
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error("failed to build connection pool: {0}")]
    Pool(#[source] diesel::r2d2::PoolError),
    #[error(transparent)]
    Import(#[from] PlanImportError),
}

/// Reads the plan from a file instead of asking a model.
struct FilePlanProducer {
    path: PathBuf,
}

#[async_trait]
impl PlanProducer for FilePlanProducer {
    async fn produce_plan(&self, _prompt: &str) -> Result<PlanDraft, PlanProducerError> {
        let path = self.path.clone();
        let payload = tokio::task::spawn_blocking(move || {
            std::fs::read_to_string(&path).map_err(|err| {
                PlanProducerError::Unavailable(format!("{}: {err}", path.display()))
            })
        })
        .await
        .map_err(|err| PlanProducerError::Unavailable(format!("plan read task failed: {err}")))??;
        Ok(PlanDraft::from_json_str(&payload)?)
    }
}

struct ImportArgs {
    plan_path: PathBuf,
    prompt: String,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<ImportArgs, ImportError> {
    let _program = args.next();
    let plan_path = args
        .next()
        .map(PathBuf::from)
        .ok_or_else(|| ImportError::InvalidArgs("missing plan path argument".to_owned()))?;
    let prompt = args
        .next()
        .unwrap_or_else(|| DEFAULT_PLAN_PROMPT.to_owned());
    if let Some(extra) = args.next() {
        return Err(ImportError::InvalidArgs(format!(
            "unexpected extra argument: {extra}"
        )));
    }
    Ok(ImportArgs { plan_path, prompt })
}

async fn run(args: ImportArgs) -> Result<(), ImportError> {
    let config = TaskboardConfig::from_env()?;
    init_tracing(&config.log_filter)?;

    let manager = ConnectionManager::<PgConnection>::new(config.database_url.as_str());
    let pool = Pool::builder()
        .max_size(config.pool_size)
        .build(manager)
        .map_err(ImportError::Pool)?;
    let clock = Arc::new(DefaultClock);
    let store = Arc::new(PostgresTaskStore::new(pool, Arc::clone(&clock)));
    let producer = Arc::new(FilePlanProducer {
        path: args.plan_path,
    });
    let service = PlanImportService::new(store, producer, clock, config.plan_settings());

    let report = service
        .generate_plan(&AccessContext::Bypass, &args.prompt)
        .await?;
    info!(
        project = %report.project_id,
        tasks = report.task_ids.len(),
        dependencies = report.dependency_count,
        "import finished"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let args = parse_args(std::env::args())?;
    run(args).await.map_err(Into::into)
}

#[cfg(test)]
#[expect(
    clippy::expect_used,
    reason = "Test code uses expect for assertion clarity"
)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn plan_files_are_read_off_the_runtime() {
        let path = std::env::temp_dir()
            .join(format!("taskboard-plan-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            r#"{"tasks": [{"name": "Design schema"}], "dependencies": []}"#,
        )
        .expect("plan file should be written");
        let producer = FilePlanProducer { path: path.clone() };

        let draft = producer.produce_plan("Roadmap").await;
        std::fs::remove_file(&path).expect("plan file should be removed");

        let tasks = draft.expect("plan should parse").tasks;
        assert_eq!(tasks.len(), 1);
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn missing_plan_files_are_unavailable() {
        let producer = FilePlanProducer {
            path: PathBuf::from("/nonexistent/taskboard-plan.json"),
        };

        let result = producer.produce_plan("Roadmap").await;

        assert!(matches!(result, Err(PlanProducerError::Unavailable(_))));
    }

    #[rstest]
    fn extra_arguments_are_refused() {
        let args = ["taskboard-import", "plan.json", "Roadmap", "extra"].map(str::to_owned);
        let result = parse_args(args.into_iter());
        assert!(matches!(result, Err(ImportError::InvalidArgs(_))));
    }
}
