//! Live stream records and the pre-live draft.
//!
//! A stream moves `setup -> live -> ended`. The setup stage is a
//! [`StreamDraft`] held by the caller and never persisted; once live, the
//! [`LiveStream`] record is stored and only ever moves forward.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::cause::CauseId;
use super::ids::{StreamId, UserId};
use super::ports::StorageKey;
use super::post::AuthorSnapshot;
use super::record_store::Record;

/// Thumbnail used when the host does not supply one.
pub const DEFAULT_THUMBNAIL_URL: &str =
    "https://images.unsplash.com/photo-1604122435792-3ebf65d2dd05?q=80&w=500";

/// Host-supplied stream details, not yet validated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamSetup {
    /// Stream title; must not be blank.
    pub title: String,
    /// Optional longer description.
    pub description: Option<String>,
    /// Optional cause id; must be catalogued when present.
    pub cause: Option<String>,
    /// Optional thumbnail URI.
    pub thumbnail_url: Option<String>,
}

impl StreamSetup {
    /// Setup with only a title.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// A validated stream that has not gone live yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamDraft {
    pub(crate) id: StreamId,
    pub(crate) host: AuthorSnapshot,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) cause: Option<CauseId>,
    pub(crate) thumbnail_url: String,
}

impl StreamDraft {
    /// Identifier the stream will keep once live.
    pub fn id(&self) -> &StreamId {
        &self.id
    }

    /// Host's user id.
    pub fn host_id(&self) -> &UserId {
        &self.host.user_id
    }

    /// Trimmed title.
    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    /// Cause, if any.
    pub fn cause(&self) -> Option<&CauseId> {
        self.cause.as_ref()
    }

    /// Thumbnail URI, defaulted when none was given.
    pub fn thumbnail_url(&self) -> &str {
        self.thumbnail_url.as_str()
    }
}

/// Lifecycle stage of a stored stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamState {
    /// Broadcasting.
    Live,
    /// Finished; terminal.
    Ended,
}

/// A stored live stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveStream {
    id: StreamId,
    host_user_id: UserId,
    host_username: String,
    #[serde(default)]
    host_avatar: String,
    title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    thumbnail_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cause: Option<CauseId>,
    #[serde(default)]
    viewers: u32,
    is_live: bool,
    started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ended_at: Option<DateTime<Utc>>,
}

impl LiveStream {
    pub(crate) fn go_live(draft: StreamDraft, started_at: DateTime<Utc>) -> Self {
        let StreamDraft {
            id,
            host,
            title,
            description,
            cause,
            thumbnail_url,
        } = draft;
        Self {
            id,
            host_user_id: host.user_id,
            host_username: host.username,
            host_avatar: host.avatar,
            title,
            description,
            thumbnail_url,
            cause,
            viewers: 0,
            is_live: true,
            started_at,
            ended_at: None,
        }
    }

    /// Stream identifier.
    pub fn id(&self) -> &StreamId {
        &self.id
    }

    /// Host's user id.
    pub fn host_user_id(&self) -> &UserId {
        &self.host_user_id
    }

    /// Host's username when the stream started.
    pub fn host_username(&self) -> &str {
        self.host_username.as_str()
    }

    /// Host's avatar when the stream started.
    pub fn host_avatar(&self) -> &str {
        self.host_avatar.as_str()
    }

    /// Title.
    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    /// Description, if any.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Thumbnail URI.
    pub fn thumbnail_url(&self) -> &str {
        self.thumbnail_url.as_str()
    }

    /// Cause, if any.
    pub fn cause(&self) -> Option<&CauseId> {
        self.cause.as_ref()
    }

    /// Advisory viewer count.
    pub fn viewers(&self) -> u32 {
        self.viewers
    }

    /// Whether the stream is broadcasting.
    pub fn is_live(&self) -> bool {
        self.is_live
    }

    /// Lifecycle stage.
    pub fn state(&self) -> StreamState {
        if self.is_live {
            StreamState::Live
        } else {
            StreamState::Ended
        }
    }

    /// Start time.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// End time, once ended.
    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    /// End the stream; returns `false` when it had already ended.
    pub(crate) fn end(&mut self, ended_at: DateTime<Utc>) -> bool {
        if !self.is_live {
            return false;
        }
        self.is_live = false;
        self.ended_at = Some(ended_at);
        true
    }

    pub(crate) fn viewer_joined(&mut self) {
        self.viewers = self.viewers.saturating_add(1);
    }

    pub(crate) fn viewer_left(&mut self) {
        self.viewers = self.viewers.saturating_sub(1);
    }
}

impl Record for LiveStream {
    const KEY: StorageKey = StorageKey::LiveStreams;
    type Id = StreamId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
