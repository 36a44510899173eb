//! View links for external recipients and the notifications announcing them.

use super::{
    NotificationId, ParseTokenError, ResourceRef, SharedLinkId, Task, TaskDomainError, TaskId,
    UserId,
};
use chrono::{DateTime, Duration, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Days a freshly shared task link stays valid.
pub const SHARE_LINK_TTL_DAYS: i64 = 7;

/// Redemptions allowed per shared task link.
pub const SHARE_LINK_MAX_USES: u32 = 10;

/// Actions a shared link can allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkAction {
    /// Open the resource read-only.
    View,
    /// Change the resource.
    Edit,
}

/// Actions granted by a shared link, persisted as a JSON object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkPermissions {
    /// Viewing is allowed.
    #[serde(default)]
    pub view: bool,
    /// Editing is allowed.
    #[serde(default)]
    pub edit: bool,
}

impl LinkPermissions {
    /// View-only permissions.
    pub const VIEW_ONLY: Self = Self {
        view: true,
        edit: false,
    };

    /// Returns `true` when `action` is granted.
    #[must_use]
    pub const fn permits(self, action: LinkAction) -> bool {
        match action {
            LinkAction::View => self.view,
            LinkAction::Edit => self.edit,
        }
    }
}

/// A tokenized link giving outside users access to one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedLink {
    id: SharedLinkId,
    token: String,
    resource: ResourceRef,
    creator_id: Option<UserId>,
    expires_at: Option<DateTime<Utc>>,
    permissions: LinkPermissions,
    max_uses: Option<u32>,
    use_count: u32,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedSharedLinkData {
    /// Link identifier.
    pub id: SharedLinkId,
    /// Opaque lookup token.
    pub token: String,
    /// Shared resource.
    pub resource: ResourceRef,
    /// User who shared it.
    pub creator_id: Option<UserId>,
    /// Expiry instant.
    pub expires_at: Option<DateTime<Utc>>,
    /// Granted actions.
    pub permissions: LinkPermissions,
    /// Redemption limit.
    pub max_uses: Option<u32>,
    /// Redemptions so far.
    pub use_count: u32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl SharedLink {
    /// Creates a view-only link for a task, valid for seven days and ten
    /// uses.
    #[must_use]
    pub fn for_task(task: &Task, clock: &impl Clock) -> Self {
        let now = clock.utc();
        Self {
            id: SharedLinkId::new(),
            token: Uuid::new_v4().simple().to_string(),
            resource: ResourceRef::Task(task.id()),
            creator_id: task.creator_id(),
            expires_at: Some(now + Duration::days(SHARE_LINK_TTL_DAYS)),
            permissions: LinkPermissions::VIEW_ONLY,
            max_uses: Some(SHARE_LINK_MAX_USES),
            use_count: 0,
            created_at: now,
        }
    }

    /// Reconstructs a link from storage.
    #[must_use]
    pub fn from_persisted(data: PersistedSharedLinkData) -> Self {
        Self {
            id: data.id,
            token: data.token,
            resource: data.resource,
            creator_id: data.creator_id,
            expires_at: data.expires_at,
            permissions: data.permissions,
            max_uses: data.max_uses,
            use_count: data.use_count,
            created_at: data.created_at,
        }
    }

    /// Returns the identifier.
    #[must_use]
    pub const fn id(&self) -> SharedLinkId {
        self.id
    }

    /// Returns the lookup token.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Returns the shared resource.
    #[must_use]
    pub const fn resource(&self) -> ResourceRef {
        self.resource
    }

    /// Returns the sharing user, if known.
    #[must_use]
    pub const fn creator_id(&self) -> Option<UserId> {
        self.creator_id
    }

    /// Returns the expiry instant.
    #[must_use]
    pub const fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Returns the granted actions.
    #[must_use]
    pub const fn permissions(&self) -> LinkPermissions {
        self.permissions
    }

    /// Returns the redemption limit.
    #[must_use]
    pub const fn max_uses(&self) -> Option<u32> {
        self.max_uses
    }

    /// Returns the number of redemptions so far.
    #[must_use]
    pub const fn use_count(&self) -> u32 {
        self.use_count
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns `true` once the expiry instant has passed.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at < now)
    }

    /// Returns `true` while the link is unexpired and under its use limit.
    #[must_use]
    pub fn valid_for_use(&self, now: DateTime<Utc>) -> bool {
        let under_limit = self.max_uses.is_none_or(|limit| self.use_count < limit);
        !self.is_expired(now) && under_limit
    }

    /// Returns `true` when the link is usable and grants `action`.
    #[must_use]
    pub fn allows(&self, action: LinkAction, now: DateTime<Utc>) -> bool {
        self.valid_for_use(now) && self.permissions.permits(action)
    }

    /// Counts one redemption.
    pub const fn record_use(&mut self) {
        self.use_count = self.use_count.saturating_add(1);
    }
}

/// Delivery state of an outbound notification.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    /// Queued for delivery.
    #[default]
    Pending,
    /// Handed to the mail system.
    Sent,
    /// Confirmed delivered.
    Delivered,
    /// Opened by the recipient.
    Read,
    /// Delivery failed.
    Failed,
}

impl NotificationStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Delivered => "delivered",
            Self::Read => "read",
            Self::Failed => "failed",
        }
    }
}

impl TryFrom<&str> for NotificationStatus {
    type Error = ParseTokenError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "sent" => Ok(Self::Sent),
            "delivered" => Ok(Self::Delivered),
            "read" => Ok(Self::Read),
            "failed" => Ok(Self::Failed),
            _ => Err(ParseTokenError::new("notification status", value)),
        }
    }
}

/// Reason a notification was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    /// The task was assigned.
    TaskAssignment,
    /// The task changed.
    TaskUpdate,
    /// The task is due soon.
    TaskReminder,
    /// The task was shared.
    TaskShare,
    /// The task was completed.
    TaskCompletion,
}

impl NotificationType {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TaskAssignment => "task_assignment",
            Self::TaskUpdate => "task_update",
            Self::TaskReminder => "task_reminder",
            Self::TaskShare => "task_share",
            Self::TaskCompletion => "task_completion",
        }
    }
}

impl TryFrom<&str> for NotificationType {
    type Error = ParseTokenError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "task_assignment" => Ok(Self::TaskAssignment),
            "task_update" => Ok(Self::TaskUpdate),
            "task_reminder" => Ok(Self::TaskReminder),
            "task_share" => Ok(Self::TaskShare),
            "task_completion" => Ok(Self::TaskCompletion),
            _ => Err(ParseTokenError::new("notification type", value)),
        }
    }
}

/// A message queued for an external recipient about a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalNotification {
    /// Notification identifier.
    pub id: NotificationId,
    /// Task the message is about.
    pub task_id: TaskId,
    /// Recipient address.
    pub recipient_email: String,
    /// Recipient display name.
    pub recipient_name: Option<String>,
    /// Subject line.
    pub subject: String,
    /// Message body.
    pub content: String,
    /// Delivery state.
    pub status: NotificationStatus,
    /// Reason for the message.
    pub notification_type: NotificationType,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl ExternalNotification {
    /// Builds the pending notification announcing a shared task.
    #[must_use]
    pub fn task_share(task: &Task, recipient: &ShareRecipient, clock: &impl Clock) -> Self {
        Self {
            id: NotificationId::new(),
            task_id: task.id(),
            recipient_email: recipient.email.clone(),
            recipient_name: recipient.name.clone(),
            subject: format!("Task shared with you: {}", task.name()),
            content: "You have been invited to view a task. Click the link to access it."
                .to_owned(),
            status: NotificationStatus::Pending,
            notification_type: NotificationType::TaskShare,
            created_at: clock.utc(),
        }
    }
}

/// Validated recipient of a shared task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareRecipient {
    email: String,
    name: Option<String>,
}

impl ShareRecipient {
    /// Validates the recipient address.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidEmail`] unless the address has a
    /// non-empty local part and a dotted domain.
    pub fn new(email: &str, name: Option<String>) -> Result<Self, TaskDomainError> {
        let trimmed = email.trim();
        let plausible = trimmed.split_once('@').is_some_and(|(local, domain)| {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }) && !trimmed.chars().any(char::is_whitespace);
        if !plausible {
            return Err(TaskDomainError::InvalidEmail(email.to_owned()));
        }
        Ok(Self {
            email: trimmed.to_owned(),
            name: name.filter(|value| !value.trim().is_empty()),
        })
    }

    /// Returns the address.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Returns the display name, if given.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}
