//! Port contracts for project planning.
//!
//! Ports define infrastructure-agnostic interfaces used by planning services.

pub mod authorizer;
pub mod directory;
pub mod planner;
pub mod store;

pub use authorizer::Authorizer;
pub use directory::ProjectDirectory;
pub use planner::{PlanProducer, PlanProducerError};
pub use store::{ReorderRequest, ReorderTarget, TaskStore, TaskStoreError, TaskStoreResult};

#[cfg(test)]
pub use authorizer::MockAuthorizer;
#[cfg(test)]
pub use planner::MockPlanProducer;
