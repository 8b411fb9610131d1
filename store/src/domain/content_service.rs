//! Content domain service: posts, likes, comments, feeds and creator stats.
//!
//! Likes and comments on another user's post fan out a notification to the
//! author, subject to the author's notification preferences. The post write
//! happens first; a failed notification is logged and never undoes it.

use std::collections::BTreeSet;
use std::sync::Arc;

use mockable::Clock;
use tracing::{debug, info, warn};

use super::Error;
use super::cause::{CauseId, is_known_cause};
use super::creator_stats::CreatorStats;
use super::ids::{PostId, UserId};
use super::live_stream::LiveStream;
use super::notification::{NewNotification, NotificationKind};
use super::notification_service::NotificationService;
use super::ports::{MediaUpload, MediaUploader, UploadError};
use super::post::{AuthorSnapshot, Comment, LikeState, Media, MediaType, Post, PostFilter};
use super::record_store::{Mutation, RecordStore};
use super::user::{User, UserRecord};

const LIKE_NOTIFICATION_TEXT: &str = "liked your post";
const COMMENT_NOTIFICATION_TEXT: &str = "commented on your post";

/// Posts, reactions and the feeds built from them.
#[derive(Clone)]
pub struct ContentService {
    store: Arc<RecordStore>,
    clock: Arc<dyn Clock>,
    notifications: NotificationService,
}

impl ContentService {
    /// Create a new service; reaction notifications go through
    /// `notifications`.
    pub fn new(
        store: Arc<RecordStore>,
        clock: Arc<dyn Clock>,
        notifications: NotificationService,
    ) -> Self {
        Self {
            store,
            clock,
            notifications,
        }
    }

    /// Publish a post by `author` in `cause`.
    ///
    /// `content` is trimmed. Fails with `InvalidRequest` for blank content or
    /// an unknown cause, and `NotFound` for an unknown author.
    pub fn create_post(
        &self,
        author: &UserId,
        content: &str,
        cause: &str,
        media: Option<Media>,
    ) -> Result<Post, Error> {
        let (content, cause) = validate_post(content, cause)?;
        let author = self.require_user(author)?;
        self.insert_post(&author, content, cause, media)
    }

    /// Upload `upload` through `uploader` and publish it as the post's
    /// media.
    ///
    /// Post fields are validated before anything is uploaded, so a rejected
    /// post leaves no orphaned blob behind.
    pub fn create_post_with_upload(
        &self,
        author: &UserId,
        content: &str,
        cause: &str,
        uploader: &dyn MediaUploader,
        upload: &MediaUpload,
    ) -> Result<Post, Error> {
        let (content, cause) = validate_post(content, cause)?;
        let author = self.require_user(author)?;
        let kind = MediaType::from_content_type(&upload.content_type).ok_or_else(|| {
            Error::invalid_request(format!(
                "unsupported media type: {}",
                upload.content_type
            ))
        })?;
        let url = uploader.upload(upload).map_err(map_upload_error)?;
        self.insert_post(&author, content, cause, Some(Media { url, kind }))
    }

    /// Posts matching `filter`, newest first. Posts with equal timestamps
    /// keep their insertion order.
    pub fn list_posts(&self, filter: &PostFilter) -> Result<Vec<Post>, Error> {
        let mut posts: Vec<Post> = self
            .store
            .get_all::<Post>()?
            .into_iter()
            .filter(|post| filter.matches(post))
            .collect();
        newest_first(&mut posts);
        Ok(posts)
    }

    /// Posts in the causes `user` follows plus `general`, newest first.
    ///
    /// Falls back to every post when the user follows no cause or nothing
    /// matches, so a new user never sees an empty feed while content exists.
    pub fn home_feed(&self, user: &UserId) -> Result<Vec<Post>, Error> {
        let user = self.require_user(user)?;
        let mut posts = self.store.get_all::<Post>()?;
        newest_first(&mut posts);
        if user.following_causes().is_empty() {
            return Ok(posts);
        }

        let mut causes: BTreeSet<CauseId> = user.following_causes().clone();
        causes.insert(CauseId::general());
        let followed: Vec<Post> = posts
            .iter()
            .filter(|post| causes.contains(post.cause()))
            .cloned()
            .collect();
        if followed.is_empty() {
            debug!(user_id = %user.id(), "home feed falling back to all posts");
            return Ok(posts);
        }
        Ok(followed)
    }

    /// Look up a post by id.
    pub fn get_post(&self, id: &PostId) -> Result<Option<Post>, Error> {
        Ok(self.store.find_by_id::<Post>(id)?)
    }

    /// Add `user`'s like to `post`, or remove it when already present.
    ///
    /// Only a new like on someone else's post notifies the author.
    pub fn toggle_like(&self, post: &PostId, user: &UserId) -> Result<LikeState, Error> {
        let liker = self.require_user(user)?;
        let (state, author_id) = self.store.update::<Post, _, Error, _>(|posts| {
            let entry = find_post_mut(posts, post)?;
            let state = entry.toggle_like(user);
            Ok(Mutation::Changed((state, entry.author_id().clone())))
        })?;

        info!(
            post_id = %post,
            user_id = %user,
            liked = state.liked,
            like_count = state.like_count,
            "toggled like"
        );
        if state.liked && author_id != *user {
            self.notify_author(&author_id, &liker, NotificationKind::Like, post);
        }
        Ok(state)
    }

    /// Append a comment by `user` to `post`.
    ///
    /// `text` is trimmed and must not be blank. Commenting on someone else's
    /// post notifies the author.
    pub fn add_comment(&self, post: &PostId, user: &UserId, text: &str) -> Result<Comment, Error> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::invalid_request("comment must not be empty"));
        }
        let commenter = self.require_user(user)?;
        let comment = Comment::new(
            AuthorSnapshot::of(&commenter),
            text.to_owned(),
            self.clock.utc(),
        );

        let author_id = self.store.update::<Post, _, Error, _>(|posts| {
            let entry = find_post_mut(posts, post)?;
            entry.push_comment(comment.clone());
            Ok(Mutation::Changed(entry.author_id().clone()))
        })?;

        info!(post_id = %post, user_id = %user, comment_id = %comment.id(), "added comment");
        if author_id != *user {
            self.notify_author(&author_id, &commenter, NotificationKind::Comment, post);
        }
        Ok(comment)
    }

    /// Aggregate counts over everything `user` has published.
    pub fn creator_stats(&self, user: &UserId) -> Result<CreatorStats, Error> {
        let creator = self.require_user(user)?;
        let posts = self.store.get_all::<Post>()?;
        let streams = self.store.get_all::<LiveStream>()?;
        Ok(CreatorStats::tally(&creator, &posts, &streams))
    }

    fn insert_post(
        &self,
        author: &User,
        content: String,
        cause: CauseId,
        media: Option<Media>,
    ) -> Result<Post, Error> {
        let post = Post::new(
            AuthorSnapshot::of(author),
            content,
            cause,
            media,
            self.clock.utc(),
        );
        let stored = post.clone();
        self.store.update::<Post, _, Error, _>(|posts| {
            posts.push(stored);
            Ok(Mutation::Changed(()))
        })?;
        info!(
            post_id = %post.id(),
            user_id = %author.id(),
            cause = %post.cause(),
            "created post"
        );
        Ok(post)
    }

    fn require_user(&self, id: &UserId) -> Result<User, Error> {
        self.store
            .find_by_id::<UserRecord>(id)?
            .map(UserRecord::into_user)
            .ok_or_else(|| Error::not_found(format!("user {id} not found")))
    }

    fn notify_author(&self, author: &UserId, actor: &User, kind: NotificationKind, post: &PostId) {
        let recipient = match self.store.find_by_id::<UserRecord>(author) {
            Ok(Some(record)) => record.into_user(),
            Ok(None) => {
                debug!(post_id = %post, user_id = %author, "post author no longer exists");
                return;
            }
            Err(error) => {
                warn!(post_id = %post, user_id = %author, error = %error, "failed to load post author");
                return;
            }
        };
        let content = match kind {
            NotificationKind::Comment => COMMENT_NOTIFICATION_TEXT,
            _ => LIKE_NOTIFICATION_TEXT,
        };
        let request = NewNotification {
            recipient_id: recipient.id().clone(),
            kind,
            from: AuthorSnapshot::of(actor),
            content: content.to_owned(),
            related_post_id: Some(post.clone()),
        };
        if let Err(error) = self.notifications.notify_if_enabled(&recipient, request) {
            warn!(
                post_id = %post,
                user_id = %actor.id(),
                error = %error,
                "failed to record post notification"
            );
        }
    }
}

fn validate_post(content: &str, cause: &str) -> Result<(String, CauseId), Error> {
    let content = content.trim();
    if content.is_empty() {
        return Err(Error::invalid_request("post content must not be empty"));
    }
    let cause = CauseId::new(cause)
        .ok()
        .filter(is_known_cause)
        .ok_or_else(|| Error::invalid_request(format!("unknown cause: {cause}")))?;
    Ok((content.to_owned(), cause))
}

fn find_post_mut<'a>(posts: &'a mut [Post], id: &PostId) -> Result<&'a mut Post, Error> {
    posts
        .iter_mut()
        .find(|post| post.id() == id)
        .ok_or_else(|| Error::not_found(format!("post {id} not found")))
}

fn newest_first(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
}

fn map_upload_error(error: UploadError) -> Error {
    match error {
        UploadError::EmptyFile { .. } | UploadError::InvalidContentType { .. } => {
            Error::invalid_request(error.to_string())
        }
        UploadError::Storage { .. } => {
            warn!(error = %error, "media upload failed");
            Error::internal(error.to_string())
        }
    }
}

#[cfg(test)]
#[path = "content_service_tests.rs"]
mod tests;
