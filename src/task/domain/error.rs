//! Error types for task domain validation and parsing.

use super::TaskId;
use thiserror::Error;

/// Errors returned while constructing or changing domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task name is empty after trimming.
    #[error("task name must not be empty")]
    EmptyTaskName,

    /// The project name is empty after trimming.
    #[error("project name must not be empty")]
    EmptyProjectName,

    /// The organization name is empty after trimming.
    #[error("organization name must not be empty")]
    EmptyOrganizationName,

    /// The completion percentage is outside `0..=100`.
    #[error("percent complete {0} is outside 0..=100")]
    InvalidPercentComplete(i64),

    /// Order positions are 1-based.
    #[error("order position {0} is invalid, positions start at 1")]
    InvalidRank(i64),

    /// A task cannot be its own parent.
    #[error("task {0} cannot be its own parent")]
    SelfParent(TaskId),

    /// The recipient address is not a plausible email address.
    #[error("invalid email address '{0}'")]
    InvalidEmail(String),
}

/// Error returned while parsing a persisted or user-supplied token into one
/// of the fixed domain enums.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct ParseTokenError {
    /// Name of the enum being parsed.
    pub kind: &'static str,
    /// Rejected input.
    pub value: String,
}

impl ParseTokenError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}
