//! Authorization port consulted once per command by the calling layer.

use super::TaskStoreResult;
use crate::task::domain::{PermissionLevel, ResourceRef, UserId};
use async_trait::async_trait;

/// Decides whether a user may act on a resource.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// Returns `true` when `user_id` holds at least `level` on `resource`.
    ///
    /// # Errors
    ///
    /// Returns a persistence error when the access facts cannot be loaded.
    async fn authorize(
        &self,
        user_id: UserId,
        resource: ResourceRef,
        level: PermissionLevel,
    ) -> TaskStoreResult<bool>;
}
