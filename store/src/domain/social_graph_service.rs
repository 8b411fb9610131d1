//! Social graph domain service.
//!
//! Owns every change to `followingUsers`, `subscribers` and
//! `followingCauses`. A follow or unfollow writes both halves of the pair in
//! a single read-modify-write of the `users` collection, so readers never
//! observe one side without the other:
//!
//! `B ∈ A.followingUsers ⇔ A ∈ B.subscribers`
//!
//! Subscribing is the same relationship as following; the `subscribe_*`
//! methods are aliases kept for callers that use that vocabulary.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::Error;
use super::cause::{CauseId, is_known_cause};
use super::identity_service::find_user_mut;
use super::ids::UserId;
use super::notification::{NewNotification, NotificationKind};
use super::notification_service::NotificationService;
use super::post::AuthorSnapshot;
use super::record_store::{Mutation, RecordStore};
use super::session::Session;
use super::user::{User, UserRecord};

/// Result of [`SocialGraphService::follow_user`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    /// A new edge was created.
    Followed,
    /// The edge already existed; nothing changed.
    AlreadyFollowing,
}

/// Result of [`SocialGraphService::unfollow_user`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnfollowOutcome {
    /// An edge (or half of one) was removed.
    Unfollowed,
    /// There was nothing to remove.
    NotFollowing,
}

const FOLLOW_NOTIFICATION_TEXT: &str = "started following you";

/// Follow/subscribe relationships between users, and cause follows.
#[derive(Clone)]
pub struct SocialGraphService {
    store: Arc<RecordStore>,
    notifications: NotificationService,
}

impl SocialGraphService {
    /// Create a new service; follow notifications go through
    /// `notifications`.
    pub fn new(store: Arc<RecordStore>, notifications: NotificationService) -> Self {
        Self {
            store,
            notifications,
        }
    }

    /// Add `cause` to `user`'s followed causes. Idempotent.
    ///
    /// Fails with `InvalidRequest` when `cause` is not catalogued and
    /// `NotFound` when `user` does not exist.
    pub fn follow_cause(
        &self,
        session: &mut Session,
        user: &UserId,
        cause: &str,
    ) -> Result<User, Error> {
        let cause = CauseId::new(cause)
            .ok()
            .filter(is_known_cause)
            .ok_or_else(|| Error::invalid_request(format!("unknown cause: {cause}")))?;

        let updated = self.store.update::<UserRecord, _, Error, _>(|users| {
            let entry = find_user_mut(users, user)?;
            if entry.follow_cause(cause.clone()) {
                Ok(Mutation::Changed(entry.clone()))
            } else {
                Ok(Mutation::Unchanged(entry.clone()))
            }
        })?;
        info!(user_id = %user, cause = %cause, "followed cause");
        session.refresh(&self.store, &updated)?;
        Ok(updated)
    }

    /// Remove `cause` from `user`'s followed causes.
    ///
    /// Unknown or unfollowed causes are a no-op, and so is an unknown
    /// `user`, which yields `None` with nothing written.
    pub fn unfollow_cause(
        &self,
        session: &mut Session,
        user: &UserId,
        cause: &str,
    ) -> Result<Option<User>, Error> {
        let Ok(cause) = CauseId::new(cause) else {
            debug!(user_id = %user, cause = cause, "ignoring malformed cause on unfollow");
            return Ok(self
                .store
                .find_by_id::<UserRecord>(user)?
                .map(UserRecord::into_user));
        };

        let updated = self.store.update::<UserRecord, _, Error, _>(|users| {
            let Ok(entry) = find_user_mut(users, user) else {
                return Ok(Mutation::Unchanged(None));
            };
            if entry.unfollow_cause(&cause) {
                Ok(Mutation::Changed(Some(entry.clone())))
            } else {
                Ok(Mutation::Unchanged(Some(entry.clone())))
            }
        })?;
        let Some(updated) = updated else {
            debug!(user_id = %user, "ignoring cause unfollow for unknown user");
            return Ok(None);
        };
        info!(user_id = %user, cause = %cause, "unfollowed cause");
        session.refresh(&self.store, &updated)?;
        Ok(Some(updated))
    }

    /// Make `actor` follow `target`.
    ///
    /// Self-follows fail with `SelfFollowRejected` and write nothing.
    /// Missing users fail with `NotFound`. Following twice is a no-op that
    /// returns [`FollowOutcome::AlreadyFollowing`]; a half-written edge left
    /// by older data is completed rather than reported as existing.
    pub fn follow_user(
        &self,
        session: &mut Session,
        actor: &UserId,
        target: &UserId,
    ) -> Result<FollowOutcome, Error> {
        if actor == target {
            warn!(user_id = %actor, "self-follow rejected");
            return Err(Error::self_follow_rejected("users cannot follow themselves"));
        }

        let (outcome, actor_user, target_user) =
            self.store.update::<UserRecord, _, Error, _>(|users| {
                require_present(users, target)?;
                let actor_entry = find_user_mut(users, actor)?;
                let added_following = actor_entry.add_following(target);
                let actor_user = actor_entry.clone();

                let target_entry = find_user_mut(users, target)?;
                let added_subscriber = target_entry.add_subscriber(actor);
                let target_user = target_entry.clone();

                if added_following || added_subscriber {
                    Ok(Mutation::Changed((
                        FollowOutcome::Followed,
                        actor_user,
                        target_user,
                    )))
                } else {
                    Ok(Mutation::Unchanged((
                        FollowOutcome::AlreadyFollowing,
                        actor_user,
                        target_user,
                    )))
                }
            })?;

        if outcome == FollowOutcome::AlreadyFollowing {
            debug!(user_id = %actor, target_id = %target, "already following");
            return Ok(outcome);
        }

        info!(user_id = %actor, target_id = %target, "followed user");
        session.refresh(&self.store, &actor_user)?;
        session.refresh(&self.store, &target_user)?;
        self.send_follow_notification(&actor_user, &target_user);
        Ok(outcome)
    }

    /// Make `actor` stop following `target`.
    ///
    /// Removes whichever halves of the edge exist. Unknown users and absent
    /// edges are silent no-ops.
    pub fn unfollow_user(
        &self,
        session: &mut Session,
        actor: &UserId,
        target: &UserId,
    ) -> Result<UnfollowOutcome, Error> {
        let touched = self.store.update::<UserRecord, _, Error, _>(|users| {
            let mut touched = Vec::new();
            for record in users.iter_mut() {
                let user = record.user_mut();
                let removed = if user.id() == actor {
                    user.remove_following(target)
                } else if user.id() == target {
                    user.remove_subscriber(actor)
                } else {
                    false
                };
                if removed {
                    touched.push(user.clone());
                }
            }
            if touched.is_empty() {
                Ok(Mutation::Unchanged(touched))
            } else {
                Ok(Mutation::Changed(touched))
            }
        })?;

        if touched.is_empty() {
            debug!(user_id = %actor, target_id = %target, "nothing to unfollow");
            return Ok(UnfollowOutcome::NotFollowing);
        }

        info!(user_id = %actor, target_id = %target, "unfollowed user");
        for user in &touched {
            session.refresh(&self.store, user)?;
        }
        Ok(UnfollowOutcome::Unfollowed)
    }

    /// Alias of [`Self::follow_user`].
    pub fn subscribe_to_user(
        &self,
        session: &mut Session,
        actor: &UserId,
        target: &UserId,
    ) -> Result<FollowOutcome, Error> {
        self.follow_user(session, actor, target)
    }

    /// Alias of [`Self::unfollow_user`].
    pub fn unsubscribe_from_user(
        &self,
        session: &mut Session,
        actor: &UserId,
        target: &UserId,
    ) -> Result<UnfollowOutcome, Error> {
        self.unfollow_user(session, actor, target)
    }

    fn send_follow_notification(&self, actor: &User, target: &User) {
        let request = NewNotification {
            recipient_id: target.id().clone(),
            kind: NotificationKind::Follow,
            from: AuthorSnapshot::of(actor),
            content: FOLLOW_NOTIFICATION_TEXT.to_owned(),
            related_post_id: None,
        };
        // The edge is already written; a failed notification must not undo it.
        if let Err(error) = self.notifications.notify_if_enabled(target, request) {
            warn!(
                user_id = %actor.id(),
                target_id = %target.id(),
                error = %error,
                "failed to record follow notification"
            );
        }
    }
}

fn require_present(users: &[UserRecord], id: &UserId) -> Result<(), Error> {
    if users.iter().any(|record| record.user().id() == id) {
        Ok(())
    } else {
        Err(Error::not_found(format!("user {id} not found")))
    }
}

#[cfg(test)]
#[path = "social_graph_service_tests.rs"]
mod tests;
