//! Identifier newtypes for the planning domain.
//!
//! Every persisted row is keyed by a UUID; wrapping each key in its own type
//! keeps task, project and user identifiers from being mixed up at call
//! sites.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the wrapped UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl AsRef<Uuid> for $name {
            fn as_ref(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_identifier!(
    /// Unique identifier for a task row.
    TaskId
);

uuid_identifier!(
    /// Unique identifier for a project, the owning scope of tasks.
    ProjectId
);

uuid_identifier!(
    /// Unique identifier for an organization (tenant).
    OrganizationId
);

uuid_identifier!(
    /// Unique identifier for an application user.
    UserId
);

uuid_identifier!(
    /// Unique identifier for a task dependency edge.
    DependencyId
);

uuid_identifier!(
    /// Unique identifier for a permission grant.
    PermissionId
);

uuid_identifier!(
    /// Unique identifier for a shared link.
    SharedLinkId
);

uuid_identifier!(
    /// Unique identifier for an outbound notification.
    NotificationId
);
