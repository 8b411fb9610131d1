//! Domain primitives, aggregates and services.
//!
//! Purpose: define the strongly typed records the store persists and the
//! services that are the only sanctioned way to change them. Services take
//! an explicit [`Session`] where the signed-in user matters and write through
//! [`RecordStore::update`] so every read-modify-write runs under its
//! collection's lock.
//!
//! Public surface:
//! - Error / ErrorCode: service error payload and stable identifier.
//! - RecordStore: typed collections over a [`ports::StorageMedium`].
//! - IdentityService, SocialGraphService, GraphAudit, ContentService,
//!   NotificationService, LiveSessionService: the operations.

pub mod auth;
pub mod cause;
pub mod content_service;
pub mod creator_stats;
pub mod error;
pub mod graph_audit;
pub mod identity_service;
pub mod ids;
pub mod live_session_service;
pub mod live_stream;
pub mod notification;
pub mod notification_service;
pub mod ports;
pub mod post;
pub mod record_store;
pub mod session;
pub mod social_graph_service;
pub mod user;

mod slug;

pub use self::auth::{
    LoginCredentials, LoginValidationError, Registration, RegistrationValidationError,
};
pub use self::cause::{Cause, CauseId, CauseIdValidationError, find_cause, list_causes};
pub use self::content_service::ContentService;
pub use self::creator_stats::CreatorStats;
pub use self::error::{DomainError, Error, ErrorCode, ErrorValidationError};
pub use self::graph_audit::{GraphAudit, GraphViolation, ReconcileReport};
pub use self::identity_service::{IdentityService, VERIFICATION_CODE_LEN};
pub use self::ids::{CommentId, IdValidationError, NotificationId, PostId, StreamId, UserId};
pub use self::live_session_service::LiveSessionService;
pub use self::live_stream::{
    DEFAULT_THUMBNAIL_URL, LiveStream, StreamDraft, StreamSetup, StreamState,
};
pub use self::notification::{NewNotification, Notification, NotificationKind};
pub use self::notification_service::NotificationService;
pub use self::post::{
    AuthorSnapshot, Comment, LikeState, Media, MediaType, Post, PostFilter,
};
pub use self::record_store::{Mutation, Record, RecordStore, RecordStoreError};
pub use self::session::Session;
pub use self::social_graph_service::{FollowOutcome, SocialGraphService, UnfollowOutcome};
pub use self::user::{
    NotificationPreferences, PrivacySettings, ProfileUpdate, SettingsUpdate, User, UserRecord,
    UserSettings, Username, UsernameValidationError, default_avatar_url,
};
