//! Dense 1-based order positions.

use super::TaskDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 1-based position inside a dense ordering scope.
///
/// Both the project-wide Gantt sequence and each board column use ranks
/// `1..=N` with no gaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Rank(u32);

impl Rank {
    /// The first position of every scope.
    pub const FIRST: Self = Self(1);

    /// Creates a validated rank.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidRank`] when the value is below 1 or
    /// does not fit the persisted integer column.
    pub fn new(value: i64) -> Result<Self, TaskDomainError> {
        if value < 1 || value > i64::from(i32::MAX) {
            return Err(TaskDomainError::InvalidRank(value));
        }
        u32::try_from(value)
            .map(Self)
            .map_err(|_| TaskDomainError::InvalidRank(value))
    }

    /// Returns the rank for a 0-based index into an ordered sequence.
    #[must_use]
    pub fn from_index(index: usize) -> Self {
        let one_based = index.saturating_add(1);
        Self(u32::try_from(one_based).unwrap_or(u32::MAX))
    }

    /// Returns the rank that would append after `count` existing members.
    #[must_use]
    pub fn after_count(count: usize) -> Self {
        Self::from_index(count)
    }

    /// Returns the 0-based index this rank denotes.
    #[must_use]
    pub fn index(self) -> usize {
        usize::try_from(self.0.saturating_sub(1)).unwrap_or(usize::MAX)
    }

    /// Returns the underlying numeric value.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl TryFrom<i64> for Rank {
    type Error = TaskDomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rank> for i64 {
    fn from(rank: Rank) -> Self {
        Self::from(rank.0)
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
