//! User data model.
//!
//! [`User`] is the password-free projection handed to callers and persisted
//! as the `currentUser` snapshot. [`UserRecord`] is what the `users`
//! collection stores: the same fields plus the password.
//!
//! Relationship sets (`followingUsers`, `subscribers`, `followingCauses`)
//! can only be changed from inside the crate, so the follow pair is always
//! written by the social graph service.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::cause::CauseId;
use super::ids::UserId;
use super::record_store::Record;
use super::ports::StorageKey;

/// Validation errors returned by [`Username::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsernameValidationError {
    /// The username was empty or whitespace only.
    Empty,
}

impl fmt::Display for UsernameValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "username must not be empty"),
        }
    }
}

impl std::error::Error for UsernameValidationError {}

/// Unique, case-sensitive handle shown as `@username`.
///
/// Any non-blank text is accepted and kept exactly as given, so hyphens,
/// apostrophes, spaces and non-ASCII letters all survive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Validate and construct a [`Username`].
    ///
    /// # Examples
    /// ```
    /// use causeway_store::domain::Username;
    ///
    /// assert!(Username::new("alice-smith").is_ok());
    /// assert!(Username::new("   ").is_err());
    /// ```
    pub fn new(username: impl Into<String>) -> Result<Self, UsernameValidationError> {
        Self::from_owned(username.into())
    }

    fn from_owned(username: String) -> Result<Self, UsernameValidationError> {
        if username.trim().is_empty() {
            return Err(UsernameValidationError::Empty);
        }
        Ok(Self(username))
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

impl TryFrom<String> for Username {
    type Error = UsernameValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Per-kind notification switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[expect(
    clippy::struct_excessive_bools,
    reason = "each flag is an independent user toggle"
)]
pub struct NotificationPreferences {
    /// Someone liked one of the user's posts.
    pub likes: bool,
    /// Someone commented on one of the user's posts.
    pub comments: bool,
    /// Someone followed the user.
    pub new_followers: bool,
    /// Someone mentioned the user.
    pub mentions: bool,
    /// Someone sent the user a direct message.
    pub direct_messages: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            likes: true,
            comments: true,
            new_followers: true,
            mentions: true,
            direct_messages: true,
        }
    }
}

/// Account visibility switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivacySettings {
    /// Only approved followers see posts.
    pub private_account: bool,
    /// Others can see the user's activity.
    pub show_activity: bool,
    /// Others may tag the user.
    pub allow_tagging: bool,
}

impl Default for PrivacySettings {
    fn default() -> Self {
        Self {
            private_account: false,
            show_activity: true,
            allow_tagging: true,
        }
    }
}

/// User preferences. Missing fields in stored data take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserSettings {
    /// Accent theme name.
    pub theme: String,
    /// Interface language code.
    pub language: String,
    /// Whether dark mode is on.
    pub dark_mode: bool,
    /// Notification switches.
    pub notification_preferences: NotificationPreferences,
    /// Privacy switches.
    pub privacy: PrivacySettings,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            theme: "purple".to_owned(),
            language: "en".to_owned(),
            dark_mode: false,
            notification_preferences: NotificationPreferences::default(),
            privacy: PrivacySettings::default(),
        }
    }
}

impl UserSettings {
    /// Shallow-merge `update` over the current settings.
    ///
    /// Nested groups are replaced whole when present.
    pub fn apply(&mut self, update: SettingsUpdate) {
        let SettingsUpdate {
            theme,
            language,
            dark_mode,
            notification_preferences,
            privacy,
        } = update;
        if let Some(theme) = theme {
            self.theme = theme;
        }
        if let Some(language) = language {
            self.language = language;
        }
        if let Some(dark_mode) = dark_mode {
            self.dark_mode = dark_mode;
        }
        if let Some(preferences) = notification_preferences {
            self.notification_preferences = preferences;
        }
        if let Some(privacy) = privacy {
            self.privacy = privacy;
        }
    }
}

/// Partial settings update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsUpdate {
    /// New theme.
    pub theme: Option<String>,
    /// New language.
    pub language: Option<String>,
    /// New dark mode flag.
    pub dark_mode: Option<bool>,
    /// Replacement notification switches.
    pub notification_preferences: Option<NotificationPreferences>,
    /// Replacement privacy switches.
    pub privacy: Option<PrivacySettings>,
}

/// Partial profile update; `None` leaves a field untouched.
///
/// Relationship sets are deliberately absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileUpdate {
    /// New display name.
    pub name: Option<String>,
    /// New username; must stay unique.
    pub username: Option<String>,
    /// New bio.
    pub bio: Option<String>,
    /// New avatar URI.
    pub avatar: Option<String>,
    /// Replacement interest tags.
    pub interests: Option<BTreeSet<String>>,
}

impl ProfileUpdate {
    /// Return `true` when the update changes nothing.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.username.is_none()
            && self.bio.is_none()
            && self.avatar.is_none()
            && self.interests.is_none()
    }
}

/// Avatar generated from the display name when the user has not set one.
///
/// # Examples
/// ```
/// use causeway_store::domain::default_avatar_url;
///
/// assert_eq!(
///     default_avatar_url("Ada Lovelace"),
///     "https://ui-avatars.com/api/?name=Ada+Lovelace&background=random",
/// );
/// ```
pub fn default_avatar_url(name: &str) -> String {
    format!(
        "https://ui-avatars.com/api/?name={}&background=random",
        name.replace(' ', "+")
    )
}

/// Application user, without credentials.
///
/// ## Invariants
/// - `name` is non-empty once trimmed.
/// - The user's own id never appears in `following_users` or `subscribers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    id: UserId,
    username: Username,
    name: String,
    #[serde(default)]
    bio: String,
    #[serde(default)]
    avatar: String,
    #[serde(default)]
    following_causes: BTreeSet<CauseId>,
    #[serde(default)]
    following_users: BTreeSet<UserId>,
    #[serde(default)]
    subscribers: BTreeSet<UserId>,
    #[serde(default)]
    interests: BTreeSet<String>,
    #[serde(default)]
    completed_tutorial: bool,
    #[serde(default)]
    email_verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    settings: UserSettings,
}

impl User {
    /// Build a freshly registered user with default settings and empty sets.
    pub fn new(
        id: UserId,
        username: Username,
        name: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let name = name.into();
        let avatar = default_avatar_url(&name);
        Self {
            id,
            username,
            name,
            bio: String::new(),
            avatar,
            following_causes: BTreeSet::new(),
            following_users: BTreeSet::new(),
            subscribers: BTreeSet::new(),
            interests: BTreeSet::new(),
            completed_tutorial: false,
            email_verified: false,
            created_at: Some(created_at),
            settings: UserSettings::default(),
        }
    }

    /// Stable user identifier.
    pub fn id(&self) -> &UserId {
        &self.id
    }

    /// Unique handle.
    pub fn username(&self) -> &Username {
        &self.username
    }

    /// Display name.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Free-form bio.
    pub fn bio(&self) -> &str {
        self.bio.as_str()
    }

    /// Avatar URI.
    pub fn avatar(&self) -> &str {
        self.avatar.as_str()
    }

    /// Causes the user follows.
    pub fn following_causes(&self) -> &BTreeSet<CauseId> {
        &self.following_causes
    }

    /// Users this user follows.
    pub fn following_users(&self) -> &BTreeSet<UserId> {
        &self.following_users
    }

    /// Users following this user.
    pub fn subscribers(&self) -> &BTreeSet<UserId> {
        &self.subscribers
    }

    /// Interest tags.
    pub fn interests(&self) -> &BTreeSet<String> {
        &self.interests
    }

    /// Whether onboarding has been completed.
    pub fn completed_tutorial(&self) -> bool {
        self.completed_tutorial
    }

    /// Whether the email verification step has been passed.
    pub fn email_verified(&self) -> bool {
        self.email_verified
    }

    /// Registration time; absent for users stored before it was recorded.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    /// User preferences.
    pub fn settings(&self) -> &UserSettings {
        &self.settings
    }

    /// Mutable access to preferences.
    pub fn settings_mut(&mut self) -> &mut UserSettings {
        &mut self.settings
    }

    /// Replace the display name. Blank names are ignored and `false` is
    /// returned.
    pub fn set_name(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if name.trim().is_empty() {
            return false;
        }
        self.name = name;
        true
    }

    /// Replace the bio.
    pub fn set_bio(&mut self, bio: impl Into<String>) {
        self.bio = bio.into();
    }

    /// Replace the avatar URI.
    pub fn set_avatar(&mut self, avatar: impl Into<String>) {
        self.avatar = avatar.into();
    }

    /// Replace the interest tags.
    pub fn set_interests(&mut self, interests: BTreeSet<String>) {
        self.interests = interests;
    }

    pub(crate) fn set_username(&mut self, username: Username) {
        self.username = username;
    }

    pub(crate) fn mark_tutorial_completed(&mut self) {
        self.completed_tutorial = true;
    }

    pub(crate) fn mark_email_verified(&mut self) {
        self.email_verified = true;
    }

    pub(crate) fn follow_cause(&mut self, cause: CauseId) -> bool {
        self.following_causes.insert(cause)
    }

    pub(crate) fn unfollow_cause(&mut self, cause: &CauseId) -> bool {
        self.following_causes.remove(cause)
    }

    /// Add `target` to `followingUsers`; refuses the user's own id.
    pub(crate) fn add_following(&mut self, target: &UserId) -> bool {
        if *target == self.id {
            return false;
        }
        self.following_users.insert(target.clone())
    }

    pub(crate) fn remove_following(&mut self, target: &UserId) -> bool {
        self.following_users.remove(target)
    }

    /// Add `follower` to `subscribers`; refuses the user's own id.
    pub(crate) fn add_subscriber(&mut self, follower: &UserId) -> bool {
        if *follower == self.id {
            return false;
        }
        self.subscribers.insert(follower.clone())
    }

    pub(crate) fn remove_subscriber(&mut self, follower: &UserId) -> bool {
        self.subscribers.remove(follower)
    }

    pub(crate) fn following_users_mut(&mut self) -> &mut BTreeSet<UserId> {
        &mut self.following_users
    }

    pub(crate) fn subscribers_mut(&mut self) -> &mut BTreeSet<UserId> {
        &mut self.subscribers
    }
}

/// Stored form of a user: the public fields plus the password.
///
/// Passwords are kept as given; the store makes no security claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(flatten)]
    user: User,
    #[serde(default)]
    password: String,
}

impl UserRecord {
    /// Pair a user with the password they registered with.
    pub fn new(user: User, password: impl Into<String>) -> Self {
        Self {
            user,
            password: password.into(),
        }
    }

    /// The password-free user.
    pub fn user(&self) -> &User {
        &self.user
    }

    pub(crate) fn user_mut(&mut self) -> &mut User {
        &mut self.user
    }

    /// Discard the password.
    pub fn into_user(self) -> User {
        self.user
    }

    pub(crate) fn password_matches(&self, candidate: &str) -> bool {
        self.password == candidate
    }
}

impl Record for UserRecord {
    const KEY: StorageKey = StorageKey::Users;
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        self.user.id()
    }
}
