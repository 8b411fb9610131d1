//! Posts, comments and attached media.
//!
//! Author display fields on posts and comments are snapshots taken when the
//! record is created. Later profile edits do not rewrite them.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::cause::CauseId;
use super::ids::{CommentId, PostId, UserId};
use super::ports::StorageKey;
use super::record_store::Record;
use super::user::User;

/// Display fields copied from a user at the moment they act.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorSnapshot {
    /// Acting user.
    pub user_id: UserId,
    /// Username at the time.
    pub username: String,
    /// Display name at the time.
    pub name: String,
    /// Avatar URI at the time.
    pub avatar: String,
}

impl AuthorSnapshot {
    /// Capture `user`'s current display fields.
    pub fn of(user: &User) -> Self {
        Self {
            user_id: user.id().clone(),
            username: user.username().to_string(),
            name: user.name().to_owned(),
            avatar: user.avatar().to_owned(),
        }
    }
}

/// Kind of attached media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// A still image.
    Image,
    /// A video clip.
    Video,
}

impl MediaType {
    /// Classify a MIME type; anything other than `image/*` or `video/*` is
    /// rejected.
    ///
    /// # Examples
    /// ```
    /// use causeway_store::domain::MediaType;
    ///
    /// assert_eq!(MediaType::from_content_type("video/mp4"), Some(MediaType::Video));
    /// assert_eq!(MediaType::from_content_type("application/pdf"), None);
    /// ```
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let (top_level, _) = content_type.split_once('/')?;
        match top_level {
            "image" => Some(Self::Image),
            "video" => Some(Self::Video),
            _ => None,
        }
    }
}

/// Media attached to a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    /// Stable URI from the media uploader, or an external URL.
    pub url: String,
    /// Image or video.
    #[serde(rename = "type")]
    pub kind: MediaType,
}

/// A comment on a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    id: CommentId,
    user_id: UserId,
    username: String,
    name: String,
    text: String,
    created_at: DateTime<Utc>,
}

impl Comment {
    pub(crate) fn new(author: AuthorSnapshot, text: String, created_at: DateTime<Utc>) -> Self {
        let AuthorSnapshot {
            user_id,
            username,
            name,
            ..
        } = author;
        Self {
            id: CommentId::random(),
            user_id,
            username,
            name,
            text,
            created_at,
        }
    }

    /// Comment identifier.
    pub fn id(&self) -> &CommentId {
        &self.id
    }

    /// Commenter.
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Commenter's username at the time.
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Commenter's display name at the time.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Comment body.
    pub fn text(&self) -> &str {
        self.text.as_str()
    }

    /// Creation time.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Like status after a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeState {
    /// Whether the user now likes the post.
    pub liked: bool,
    /// Total likes on the post.
    pub like_count: usize,
}

/// A post in a cause feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    id: PostId,
    author_id: UserId,
    username: String,
    name: String,
    #[serde(default)]
    avatar: String,
    content: String,
    cause: CauseId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    media: Option<Media>,
    #[serde(default)]
    likes: BTreeSet<UserId>,
    #[serde(default)]
    comments: Vec<Comment>,
    created_at: DateTime<Utc>,
}

impl Post {
    pub(crate) fn new(
        author: AuthorSnapshot,
        content: String,
        cause: CauseId,
        media: Option<Media>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let AuthorSnapshot {
            user_id,
            username,
            name,
            avatar,
        } = author;
        Self {
            id: PostId::random(),
            author_id: user_id,
            username,
            name,
            avatar,
            content,
            cause,
            media,
            likes: BTreeSet::new(),
            comments: Vec::new(),
            created_at,
        }
    }

    /// Post identifier.
    pub fn id(&self) -> &PostId {
        &self.id
    }

    /// Author's user id.
    pub fn author_id(&self) -> &UserId {
        &self.author_id
    }

    /// Author's username when the post was created.
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Author's display name when the post was created.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Author's avatar when the post was created.
    pub fn avatar(&self) -> &str {
        self.avatar.as_str()
    }

    /// Trimmed body text.
    pub fn content(&self) -> &str {
        self.content.as_str()
    }

    /// Cause the post belongs to.
    pub fn cause(&self) -> &CauseId {
        &self.cause
    }

    /// Attached media, if any.
    pub fn media(&self) -> Option<&Media> {
        self.media.as_ref()
    }

    /// Users who like the post.
    pub fn likes(&self) -> &BTreeSet<UserId> {
        &self.likes
    }

    /// Comments in insertion order.
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// Creation time.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub(crate) fn toggle_like(&mut self, user: &UserId) -> LikeState {
        let liked = if self.likes.remove(user) {
            false
        } else {
            self.likes.insert(user.clone());
            true
        };
        LikeState {
            liked,
            like_count: self.likes.len(),
        }
    }

    pub(crate) fn push_comment(&mut self, comment: Comment) {
        self.comments.push(comment);
    }
}

impl Record for Post {
    const KEY: StorageKey = StorageKey::Posts;
    type Id = PostId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Criteria for [`crate::domain::ContentService::list_posts`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostFilter {
    /// Exact cause match.
    pub cause: Option<CauseId>,
    /// Exact match on the post's snapshotted username.
    pub author_username: Option<String>,
}

impl PostFilter {
    /// Only posts in `cause`.
    pub fn by_cause(cause: CauseId) -> Self {
        Self {
            cause: Some(cause),
            author_username: None,
        }
    }

    /// Only posts created under `username`.
    pub fn by_author(username: impl Into<String>) -> Self {
        Self {
            cause: None,
            author_username: Some(username.into()),
        }
    }

    /// Return `true` when `post` satisfies every set criterion.
    pub fn matches(&self, post: &Post) -> bool {
        let cause_ok = self.cause.as_ref().is_none_or(|cause| post.cause() == cause);
        let author_ok = self
            .author_username
            .as_deref()
            .is_none_or(|username| post.username() == username);
        cause_ok && author_ok
    }
}
