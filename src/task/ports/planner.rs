//! Port for the collaborator that turns a prompt into a plan draft.

use crate::task::domain::{MalformedPlanError, PlanDraft};
use async_trait::async_trait;
use thiserror::Error;

/// Errors returned by plan producers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlanProducerError {
    /// The producer answered with an unusable payload.
    #[error(transparent)]
    Malformed(#[from] MalformedPlanError),

    /// The producer could not be reached or refused the request.
    #[error("plan producer unavailable: {0}")]
    Unavailable(String),
}

/// Produces structured plan drafts from free-form prompts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlanProducer: Send + Sync {
    /// Produces a draft for `prompt`.
    ///
    /// # Errors
    ///
    /// Returns [`PlanProducerError`] when no usable draft is available.
    async fn produce_plan(&self, prompt: &str) -> Result<PlanDraft, PlanProducerError>;
}
