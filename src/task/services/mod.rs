//! Application services for planning orchestration.

mod board;
mod dependencies;
mod ordering;
mod plan_import;
mod tasks;

pub use board::{AuthorizedBoard, BoardCommandError, BoardCommandResult};
pub use dependencies::{DependencyService, DependencyServiceError, DependencyServiceResult};
pub use ordering::{
    OrderingEngine, OrderingEngineError, OrderingEngineResult, ReorderOutcome, ReorderRejection,
};
pub use plan_import::{PlanImportError, PlanImportResult, PlanImportService};
pub use tasks::{TaskService, TaskServiceError, TaskServiceResult};
