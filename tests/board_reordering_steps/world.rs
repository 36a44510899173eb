//! Shared world state for board reordering BDD scenarios.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use eyre::eyre;
use mockable::DefaultClock;
use rstest::fixture;
use taskboard::task::{
    adapters::memory::InMemoryTaskStore,
    domain::{AccessContext, PlanDraft, PlanImportReport, PlanImportSettings, Project, TaskId},
    ports::{PlanProducer, PlanProducerError},
    services::{
        OrderingEngine, PlanImportError, PlanImportService, ReorderOutcome, TaskService,
    },
};

/// Store type used by the BDD world.
pub type TestStore = InMemoryTaskStore<DefaultClock>;

/// Access context for steps that act outside any user.
pub const BYPASS: AccessContext = AccessContext::Bypass;

/// Producer replaying a JSON payload chosen by the scenario.
pub struct ScriptedPlan(pub String);

#[async_trait]
impl PlanProducer for ScriptedPlan {
    async fn produce_plan(&self, _prompt: &str) -> Result<PlanDraft, PlanProducerError> {
        Ok(PlanDraft::from_json_str(&self.0)?)
    }
}

/// Scenario world for board reordering behaviour tests.
pub struct BoardWorld {
    pub store: Arc<TestStore>,
    pub service: TaskService<TestStore>,
    pub engine: OrderingEngine<TestStore>,
    pub project: Option<Project>,
    pub tasks: HashMap<String, TaskId>,
    pub last_outcome: Option<ReorderOutcome>,
    pub last_import: Option<PlanImportReport>,
    pub import_error: Option<PlanImportError>,
}

impl BoardWorld {
    /// Creates a world over an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        let store = Arc::new(InMemoryTaskStore::new(Arc::new(DefaultClock)));
        Self {
            service: TaskService::new(Arc::clone(&store)),
            engine: OrderingEngine::new(Arc::clone(&store)),
            store,
            project: None,
            tasks: HashMap::new(),
            last_outcome: None,
            last_import: None,
            import_error: None,
        }
    }

    /// Returns the project created by the background step.
    pub fn project(&self) -> Result<&Project, eyre::Report> {
        self.project
            .as_ref()
            .ok_or_else(|| eyre!("missing project in scenario world"))
    }

    /// Looks up a seeded task by name.
    pub fn task_id(&self, name: &str) -> Result<TaskId, eyre::Report> {
        self.tasks
            .get(name)
            .copied()
            .ok_or_else(|| eyre!("unknown task {name} in scenario world"))
    }

    /// Builds an importer that answers with `payload`.
    #[must_use]
    pub fn importer(
        &self,
        payload: String,
    ) -> PlanImportService<TestStore, ScriptedPlan, DefaultClock> {
        PlanImportService::new(
            Arc::clone(&self.store),
            Arc::new(ScriptedPlan(payload)),
            Arc::new(DefaultClock),
            PlanImportSettings::default(),
        )
    }
}

impl Default for BoardWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> BoardWorld {
    BoardWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

/// Splits a comma-separated step argument into trimmed names.
#[must_use]
pub fn split_names(list: &str) -> Vec<&str> {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .collect()
}
