//! Notification records.
//!
//! All notifications live in one flat collection and are filtered by
//! recipient on read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{NotificationId, PostId, UserId};
use super::ports::StorageKey;
use super::post::AuthorSnapshot;
use super::record_store::Record;

/// What the notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// Someone liked a post.
    Like,
    /// Someone commented on a post.
    Comment,
    /// Someone followed the recipient.
    Follow,
    /// Someone mentioned the recipient.
    Mention,
    /// A followed creator published a reel.
    Reel,
}

/// Request to create a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    /// Who receives it.
    pub recipient_id: UserId,
    /// Kind of event.
    pub kind: NotificationKind,
    /// Who triggered it, snapshotted.
    pub from: AuthorSnapshot,
    /// Human-readable summary.
    pub content: String,
    /// Post the event refers to, if any.
    pub related_post_id: Option<PostId>,
}

/// A stored notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    id: NotificationId,
    recipient_id: UserId,
    #[serde(rename = "type")]
    kind: NotificationKind,
    from_user_id: UserId,
    from_name: String,
    from_username: String,
    #[serde(default)]
    from_avatar: String,
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    related_post_id: Option<PostId>,
    #[serde(default)]
    read: bool,
    created_at: DateTime<Utc>,
}

impl Notification {
    pub(crate) fn from_request(request: NewNotification, created_at: DateTime<Utc>) -> Self {
        let NewNotification {
            recipient_id,
            kind,
            from,
            content,
            related_post_id,
        } = request;
        Self {
            id: NotificationId::random(),
            recipient_id,
            kind,
            from_user_id: from.user_id,
            from_name: from.name,
            from_username: from.username,
            from_avatar: from.avatar,
            content,
            related_post_id,
            read: false,
            created_at,
        }
    }

    /// Notification identifier.
    pub fn id(&self) -> &NotificationId {
        &self.id
    }

    /// Recipient.
    pub fn recipient_id(&self) -> &UserId {
        &self.recipient_id
    }

    /// Kind of event.
    pub fn kind(&self) -> NotificationKind {
        self.kind
    }

    /// Triggering user.
    pub fn from_user_id(&self) -> &UserId {
        &self.from_user_id
    }

    /// Triggering user's display name at the time.
    pub fn from_name(&self) -> &str {
        self.from_name.as_str()
    }

    /// Triggering user's username at the time.
    pub fn from_username(&self) -> &str {
        self.from_username.as_str()
    }

    /// Triggering user's avatar at the time.
    pub fn from_avatar(&self) -> &str {
        self.from_avatar.as_str()
    }

    /// Summary text.
    pub fn content(&self) -> &str {
        self.content.as_str()
    }

    /// Related post, if any.
    pub fn related_post_id(&self) -> Option<&PostId> {
        self.related_post_id.as_ref()
    }

    /// Whether the recipient has seen it.
    pub fn is_read(&self) -> bool {
        self.read
    }

    /// Creation time.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Mark as read; returns `false` when it already was.
    pub(crate) fn mark_read(&mut self) -> bool {
        !std::mem::replace(&mut self.read, true)
    }
}

impl Record for Notification {
    const KEY: StorageKey = StorageKey::Notifications;
    type Id = NotificationId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
