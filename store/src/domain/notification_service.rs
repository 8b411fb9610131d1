//! Notification domain service.
//!
//! Creation is unconditional here; callers that fire notifications on
//! behalf of another user's action go through
//! [`NotificationService::notify_if_enabled`], which honours the
//! recipient's notification preferences.

use std::sync::Arc;

use mockable::Clock;
use tracing::{debug, info};

use super::Error;
use super::ids::{NotificationId, UserId};
use super::notification::{NewNotification, Notification, NotificationKind};
use super::record_store::{Mutation, RecordStore};
use super::user::{NotificationPreferences, User};

/// Return `true` when `preferences` allow notifications of `kind`.
pub(crate) fn preference_allows(preferences: &NotificationPreferences, kind: NotificationKind) -> bool {
    match kind {
        NotificationKind::Like => preferences.likes,
        NotificationKind::Comment => preferences.comments,
        NotificationKind::Follow => preferences.new_followers,
        NotificationKind::Mention => preferences.mentions,
        NotificationKind::Reel => true,
    }
}

/// Creates, lists and acknowledges notifications.
#[derive(Clone)]
pub struct NotificationService {
    store: Arc<RecordStore>,
    clock: Arc<dyn Clock>,
}

impl NotificationService {
    /// Create a service over `store`, stamping records with `clock`.
    pub fn new(store: Arc<RecordStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Append a notification for `request.recipient_id`.
    pub fn create_notification(&self, request: NewNotification) -> Result<Notification, Error> {
        let notification = Notification::from_request(request, self.clock.utc());
        let stored = notification.clone();
        self.store.update::<Notification, _, Error, _>(|all| {
            all.push(stored);
            Ok(Mutation::Changed(()))
        })?;
        info!(
            notification_id = %notification.id(),
            user_id = %notification.recipient_id(),
            kind = ?notification.kind(),
            "created notification"
        );
        Ok(notification)
    }

    /// Create the notification unless the recipient has switched its kind
    /// off. Returns `None` when suppressed.
    pub(crate) fn notify_if_enabled(
        &self,
        recipient: &User,
        request: NewNotification,
    ) -> Result<Option<Notification>, Error> {
        let preferences = &recipient.settings().notification_preferences;
        if !preference_allows(preferences, request.kind) {
            debug!(
                user_id = %recipient.id(),
                kind = ?request.kind,
                "recipient disabled this notification kind"
            );
            return Ok(None);
        }
        self.create_notification(request).map(Some)
    }

    /// Notifications addressed to `user`, newest first.
    pub fn list_notifications(&self, user: &UserId) -> Result<Vec<Notification>, Error> {
        let mut mine: Vec<Notification> = self
            .store
            .get_all::<Notification>()?
            .into_iter()
            .filter(|notification| notification.recipient_id() == user)
            .collect();
        mine.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(mine)
    }

    /// Mark one of `user`'s notifications as read.
    ///
    /// Marking an already read notification succeeds without a write.
    /// Fails with `NotFound` when `id` does not exist or belongs to another
    /// recipient.
    pub fn mark_read(&self, user: &UserId, id: &NotificationId) -> Result<Notification, Error> {
        self.store.update::<Notification, _, Error, _>(|all| {
            let notification = all
                .iter_mut()
                .find(|candidate| candidate.id() == id && candidate.recipient_id() == user)
                .ok_or_else(|| Error::not_found(format!("notification {id} not found")))?;
            if notification.mark_read() {
                Ok(Mutation::Changed(notification.clone()))
            } else {
                Ok(Mutation::Unchanged(notification.clone()))
            }
        })
    }

    /// Number of unread notifications addressed to `user`.
    pub fn unread_count(&self, user: &UserId) -> Result<usize, Error> {
        Ok(self
            .store
            .get_all::<Notification>()?
            .iter()
            .filter(|notification| notification.recipient_id() == user && !notification.is_read())
            .count())
    }
}
